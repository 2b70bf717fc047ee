use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use log::trace;

use super::SingleNumberValue;
use crate::factory::AbstractValueFactory;
use crate::utils::OptionalBool;
use crate::value::AbstractValue;

/// Maximum number of elements tracked by a [`NumberFromSetValue`].
pub const MAX_SIZE: usize = 30;

/// A value that is exactly one of a small explicit set of ints.
///
/// # Invariants
///
/// - Elements are sorted and distinct
/// - `1 <= len <= MAX_SIZE`
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NumberFromSetValue(Arc<[i32]>);

impl NumberFromSetValue {
    /// # Panics
    ///
    /// Panics if `values` is empty or larger than [`MAX_SIZE`].
    pub(crate) fn from_sorted(values: Vec<i32>) -> Self {
        assert!(!values.is_empty(), "Number set must not be empty");
        assert!(
            values.len() <= MAX_SIZE,
            "Number set exceeds {} elements",
            MAX_SIZE
        );
        debug_assert!(values.windows(2).all(|w| w[0] < w[1]), "Number set must be sorted");
        NumberFromSetValue(Arc::from(values))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the elements in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = i32> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[i32] {
        &self.0
    }

    pub fn contains_int(&self, value: i32) -> bool {
        self.0.binary_search(&value).is_ok()
    }

    pub fn abstraction_size(&self) -> u64 {
        self.0.len() as u64
    }

    pub fn min_inclusive(&self) -> i64 {
        self.0[0] as i64
    }

    pub fn max_inclusive(&self) -> i64 {
        self.0[self.0.len() - 1] as i64
    }

    pub fn is_subset_of(&self, sorted_values: &[i32]) -> OptionalBool {
        OptionalBool::of(self.iter().all(|v| sorted_values.binary_search(&v).is_ok()))
    }

    /// Starts a builder seeded with the elements of this set.
    pub fn instance_builder(&self) -> NumberFromSetBuilder {
        NumberFromSetBuilder::from_set(self)
    }
}

impl fmt::Display for NumberFromSetValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, v) in self.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "}}")
    }
}

/// Incremental construction of a [`NumberFromSetValue`].
///
/// Once more than [`MAX_SIZE`] distinct elements have been added, the builder
/// is permanently [`Overflowed`][NumberFromSetBuilder::Overflowed] and all
/// further additions are ignored.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum NumberFromSetBuilder {
    Building(BTreeSet<i32>),
    Overflowed,
}

impl Default for NumberFromSetBuilder {
    fn default() -> Self {
        NumberFromSetBuilder::new()
    }
}

impl NumberFromSetBuilder {
    pub fn new() -> Self {
        NumberFromSetBuilder::Building(BTreeSet::new())
    }

    /// Seeds the builder with an exact number.
    ///
    /// Numbers outside the `i32` range cannot be tracked and overflow immediately.
    pub fn from_single(single: &SingleNumberValue) -> Self {
        let mut builder = NumberFromSetBuilder::new();
        builder.add_long(single.value());
        builder
    }

    pub fn from_set(set: &NumberFromSetValue) -> Self {
        NumberFromSetBuilder::Building(set.iter().collect())
    }

    pub fn is_overflowed(&self) -> bool {
        matches!(self, NumberFromSetBuilder::Overflowed)
    }

    pub fn len(&self) -> Option<usize> {
        match self {
            NumberFromSetBuilder::Building(values) => Some(values.len()),
            NumberFromSetBuilder::Overflowed => None,
        }
    }

    pub fn add_int(&mut self, value: i32) -> &mut Self {
        if let NumberFromSetBuilder::Building(values) = self {
            values.insert(value);
            if values.len() > MAX_SIZE {
                trace!("number set builder overflowed at {}", value);
                *self = NumberFromSetBuilder::Overflowed;
            }
        }
        self
    }

    pub fn add_long(&mut self, value: i64) -> &mut Self {
        match i32::try_from(value) {
            Ok(value) => self.add_int(value),
            Err(_) => {
                *self = NumberFromSetBuilder::Overflowed;
                self
            }
        }
    }

    pub fn add_ints(&mut self, set: &NumberFromSetValue) -> &mut Self {
        for value in set.iter() {
            if self.is_overflowed() {
                break;
            }
            self.add_int(value);
        }
        self
    }

    /// Finishes the builder.
    ///
    /// Returns an exact number for one element, a set for `2..=MAX_SIZE`
    /// elements, `Unknown` once overflowed, and `Bottom` if nothing was added.
    pub fn build(self, factory: &AbstractValueFactory) -> AbstractValue {
        match self {
            NumberFromSetBuilder::Overflowed => AbstractValue::Unknown,
            NumberFromSetBuilder::Building(values) => match values.len() {
                0 => AbstractValue::Bottom,
                1 => {
                    let value = values.into_iter().next().unwrap_or_default();
                    factory.create_single_number_value(value as i64).into()
                }
                _ => AbstractValue::NumberFromSet(NumberFromSetValue::from_sorted(
                    values.into_iter().collect(),
                )),
            },
        }
    }
}
