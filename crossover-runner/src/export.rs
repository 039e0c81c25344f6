//! Report export: JSON and CSV artifacts for external charting and analysis.
//!
//! - **JSON**: the full `BacktestReport`, round-trippable, schema versioned
//! - **CSV**: the per-period series and the trade markers
//!
//! Persisted reports carry a `schema_version`; newer versions are rejected
//! on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::runner::{BacktestReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize a report to pretty JSON.
pub fn export_json(report: &BacktestReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize BacktestReport to JSON")
}

/// Deserialize a report from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<BacktestReport> {
    let report: BacktestReport =
        serde_json::from_str(json).context("failed to deserialize BacktestReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn optional(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Export the per-period series.
///
/// Columns: timestamp, price, short_ma, long_ma, signal, position, return,
/// strategy_return, baseline_balance, strategy_balance. `signal` is 1 while
/// invested, 0 in cash. Returns are empty at the first period.
pub fn export_series_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "price",
        "short_ma",
        "long_ma",
        "signal",
        "position",
        "return",
        "strategy_return",
        "baseline_balance",
        "strategy_balance",
    ])?;
    for row in &report.rows {
        wtr.write_record([
            row.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            row.price.to_string(),
            row.short_ma.to_string(),
            row.long_ma.to_string(),
            row.holding.as_unit().to_string(),
            row.position.value().to_string(),
            optional(row.asset_return),
            optional(row.strategy_return),
            format!("{:.2}", row.baseline_balance),
            format!("{:.2}", row.strategy_balance),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Export the entry and exit markers.
///
/// Columns: index, timestamp, kind (`buy` or `sell`), level.
pub fn export_markers_csv(report: &BacktestReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["index", "timestamp", "kind", "level"])?;
    for marker in &report.markers {
        let kind = if marker.change.value() > 0 { "buy" } else { "sell" };
        wtr.write_record([
            marker.index.to_string(),
            marker.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            kind.to_string(),
            marker.level.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a run.
///
/// Creates `{symbol}_{run id prefix}/` under `output_dir` containing
/// `report.json`, `series.csv` and `markers.csv`. Rerunning an identical
/// config overwrites the same directory.
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &BacktestReport, output_dir: &Path) -> Result<PathBuf> {
    let id_prefix: String = report.run_id.chars().take(12).collect();
    let run_dir = output_dir.join(format!("{}_{}", report.symbol, id_prefix));
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let write = |name: &str, contents: String| -> Result<()> {
        let path = run_dir.join(name);
        std::fs::write(&path, contents)
            .with_context(|| format!("failed to write {}", path.display()))
    };
    write("report.json", export_json(report)?)?;
    write("series.csv", export_series_csv(report)?)?;
    write("markers.csv", export_markers_csv(report)?)?;

    info!(dir = %run_dir.display(), "saved artifacts");
    Ok(run_dir)
}

/// Load a report from an artifact directory's `report.json`.
pub fn load_artifacts(run_dir: &Path) -> Result<BacktestReport> {
    let path = run_dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
