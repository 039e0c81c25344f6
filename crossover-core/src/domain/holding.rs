//! Holding state and position transitions.

use serde::{Deserialize, Serialize};

/// What the strategy holds during a period.
///
/// `InCash` is the initial state: before any crossover the portfolio is flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Holding {
    #[default]
    InCash,
    InAsset,
}

impl Holding {
    /// 1 when invested, 0 when in cash.
    pub fn as_unit(self) -> i8 {
        match self {
            Holding::InCash => 0,
            Holding::InAsset => 1,
        }
    }

    pub fn is_invested(self) -> bool {
        self == Holding::InAsset
    }

    /// The transition from `previous` into `self`.
    pub fn transition_from(self, previous: Holding) -> PositionChange {
        match (previous, self) {
            (Holding::InCash, Holding::InAsset) => PositionChange::Entry,
            (Holding::InAsset, Holding::InCash) => PositionChange::Exit,
            _ => PositionChange::Hold,
        }
    }
}

/// Transition marker between consecutive holding states.
///
/// Serialized as the integers -1, 0, +1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum PositionChange {
    /// Asset → cash.
    Exit,
    #[default]
    Hold,
    /// Cash → asset.
    Entry,
}

impl PositionChange {
    pub fn value(self) -> i8 {
        match self {
            PositionChange::Exit => -1,
            PositionChange::Hold => 0,
            PositionChange::Entry => 1,
        }
    }

    pub fn is_transition(self) -> bool {
        self != PositionChange::Hold
    }
}

impl From<PositionChange> for i8 {
    fn from(change: PositionChange) -> Self {
        change.value()
    }
}

impl TryFrom<i8> for PositionChange {
    type Error = String;

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(PositionChange::Exit),
            0 => Ok(PositionChange::Hold),
            1 => Ok(PositionChange::Entry),
            other => Err(format!("position change must be -1, 0 or 1, got {other}")),
        }
    }
}
