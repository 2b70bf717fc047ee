use std::fmt;

use super::UNBOUNDED_SIZE;

/// A value somewhere in the closed range `[min, max]`.
///
/// # Invariants
///
/// - `max > min` (singleton ranges are [`SingleNumberValue`][super::SingleNumberValue]s)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct NumberFromIntervalValue {
    min_inclusive: i64,
    max_inclusive: i64,
}

impl NumberFromIntervalValue {
    /// # Panics
    ///
    /// Panics if `max_inclusive <= min_inclusive`.
    pub fn new(min_inclusive: i64, max_inclusive: i64) -> Self {
        assert!(
            max_inclusive > min_inclusive,
            "Interval [{}, {}] must contain at least two values",
            min_inclusive,
            max_inclusive
        );
        Self {
            min_inclusive,
            max_inclusive,
        }
    }

    pub fn min_inclusive(&self) -> i64 {
        self.min_inclusive
    }

    pub fn max_inclusive(&self) -> i64 {
        self.max_inclusive
    }

    pub fn contains_long(&self, value: i64) -> bool {
        self.min_inclusive <= value && value <= self.max_inclusive
    }

    pub fn abstraction_size(&self) -> u64 {
        let size = self.max_inclusive as i128 - self.min_inclusive as i128 + 1;
        u64::try_from(size).unwrap_or(UNBOUNDED_SIZE)
    }

    /// Intersection with another interval, as `(min, max)` bounds; `None` if disjoint.
    pub fn intersect(&self, other: &NumberFromIntervalValue) -> Option<(i64, i64)> {
        let min = self.min_inclusive.max(other.min_inclusive);
        let max = self.max_inclusive.min(other.max_inclusive);
        (min <= max).then_some((min, max))
    }
}

impl fmt::Display for NumberFromIntervalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.min_inclusive, self.max_inclusive)
    }
}
