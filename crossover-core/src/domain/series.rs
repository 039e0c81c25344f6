//! TimeSeries — an ordered, immutable, timestamp-indexed container.
//!
//! The index is shared (`Arc<[NaiveDateTime]>`) between an input series and
//! every series derived from it, so alignment checks at component boundaries
//! are usually a pointer comparison.

use std::sync::Arc;

use chrono::NaiveDateTime;

use crate::error::{CoreError, Misalignment};

/// Values paired with a strictly increasing timestamp index.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeries<T> {
    index: Arc<[NaiveDateTime]>,
    values: Vec<T>,
}

/// A series of prices, one observation per period.
pub type PriceSeries = TimeSeries<f64>;

impl<T> TimeSeries<T> {
    /// Build a series from an index and values of equal length.
    ///
    /// Fails with `LengthMismatch` if the lengths differ and with
    /// `UnorderedIndex` if any timestamp is not strictly after its predecessor.
    pub fn new(index: Vec<NaiveDateTime>, values: Vec<T>) -> Result<Self, CoreError> {
        if index.len() != values.len() {
            return Err(CoreError::LengthMismatch {
                context: "series construction",
                detail: Misalignment::Length {
                    left: index.len(),
                    right: values.len(),
                },
            });
        }
        if let Some(pos) = index.windows(2).position(|w| w[1] <= w[0]) {
            return Err(CoreError::UnorderedIndex { index: pos + 1 });
        }
        Ok(Self {
            index: index.into(),
            values,
        })
    }

    /// Build a series from `(timestamp, value)` pairs in order.
    pub fn from_points<I>(points: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (NaiveDateTime, T)>,
    {
        let (index, values): (Vec<_>, Vec<_>) = points.into_iter().unzip();
        Self::new(index, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn index(&self) -> &[NaiveDateTime] {
        &self.index
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        self.values.get(i)
    }

    pub fn timestamp(&self, i: usize) -> Option<NaiveDateTime> {
        self.index.get(i).copied()
    }

    pub fn first(&self) -> Option<&T> {
        self.values.first()
    }

    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    /// Iterate `(timestamp, &value)` pairs in index order.
    pub fn iter(&self) -> impl Iterator<Item = (NaiveDateTime, &T)> + '_ {
        self.index.iter().copied().zip(self.values.iter())
    }

    /// Check that `other` has exactly the same index as `self`.
    ///
    /// `context` names the component boundary and ends up in the error message.
    pub fn ensure_aligned<U>(
        &self,
        other: &TimeSeries<U>,
        context: &'static str,
    ) -> Result<(), CoreError> {
        if Arc::ptr_eq(&self.index, &other.index) {
            return Ok(());
        }
        if self.len() != other.len() {
            return Err(CoreError::LengthMismatch {
                context,
                detail: Misalignment::Length {
                    left: self.len(),
                    right: other.len(),
                },
            });
        }
        match self
            .index
            .iter()
            .zip(other.index.iter())
            .position(|(a, b)| a != b)
        {
            Some(position) => Err(CoreError::LengthMismatch {
                context,
                detail: Misalignment::Timestamp { position },
            }),
            None => Ok(()),
        }
    }

    /// A new series on the same index with the given values.
    ///
    /// Callers inside the crate always produce exactly one value per index entry.
    pub(crate) fn with_values<U>(&self, values: Vec<U>) -> TimeSeries<U> {
        debug_assert_eq!(values.len(), self.index.len());
        TimeSeries {
            index: Arc::clone(&self.index),
            values,
        }
    }

    /// Element-wise transform into a new series on the same index.
    pub fn map<U, F>(&self, f: F) -> TimeSeries<U>
    where
        F: FnMut(&T) -> U,
    {
        self.with_values(self.values.iter().map(f).collect())
    }

    /// The first `len` entries as a new series (used for prefix/look-ahead checks).
    pub fn prefix(&self, len: usize) -> TimeSeries<T>
    where
        T: Clone,
    {
        let len = len.min(self.len());
        TimeSeries {
            index: self.index[..len].into(),
            values: self.values[..len].to_vec(),
        }
    }
}

impl<'a, T> IntoIterator for &'a TimeSeries<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

/// Daily timestamps starting at `start`, one per value. Handy for tests and
/// for feeding bare price lists into the pipeline.
pub fn daily_series(start: chrono::NaiveDate, values: &[f64]) -> PriceSeries {
    let midnight = start.and_time(chrono::NaiveTime::default());
    let index = (0..values.len())
        .map(|i| midnight + chrono::Duration::days(i as i64))
        .collect();
    TimeSeries {
        index,
        values: values.to_vec(),
    }
}
