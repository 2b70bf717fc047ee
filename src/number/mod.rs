//! Numeric abstractions.
//!
//! Four encodings of what is known about an integer value:
//!
//! | Encoding | Concretization | Precision |
//! |----------|----------------|-----------|
//! | [`SingleNumberValue`] | exactly one value | exact |
//! | [`DefiniteBitsNumberValue`] | all ints matching a set/unset bit pattern | conservative |
//! | [`NumberFromIntervalValue`] | all values in `[min, max]` | exact |
//! | [`NumberFromSetValue`] | an explicit set of at most [`MAX_SIZE`] ints | exact |
//!
//! [`NumberAbstraction`] is a borrowed view unifying the four behind one contract,
//! so that containment and overlap queries can be answered without knowing which
//! encoding a value uses.

mod bits;
mod interval;
mod set;

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

pub use bits::DefiniteBitsNumberValue;
pub use interval::NumberFromIntervalValue;
pub use set::{NumberFromSetBuilder, NumberFromSetValue, MAX_SIZE};

use crate::utils::{hash_ptr, OptionalBool};

/// Abstraction size reported when the concretization is unbounded.
pub const UNBOUNDED_SIZE: u64 = u64::MAX;

/// An exact numeric constant, holding the raw 64 bits of the value.
///
/// Instances are interned by the [`AbstractValueFactory`][crate::factory::AbstractValueFactory],
/// so equality and hashing are by identity.
#[derive(Clone)]
pub struct SingleNumberValue(Arc<i64>);

impl SingleNumberValue {
    pub(crate) fn new(value: i64) -> Self {
        SingleNumberValue(Arc::new(value))
    }

    /// Returns the raw bits of the value.
    pub fn value(&self) -> i64 {
        *self.0
    }

    pub fn int_value(&self) -> i32 {
        *self.0 as i32
    }

    pub fn long_value(&self) -> i64 {
        *self.0
    }

    pub fn float_value(&self) -> f32 {
        f32::from_bits(*self.0 as u32)
    }

    pub fn double_value(&self) -> f64 {
        f64::from_bits(*self.0 as u64)
    }

    pub fn boolean_value(&self) -> bool {
        debug_assert!(self.is_zero() || self.is_true(), "not a boolean: {}", self.value());
        !self.is_zero()
    }

    pub fn is_zero(&self) -> bool {
        *self.0 == 0
    }

    pub fn is_true(&self) -> bool {
        *self.0 == 1
    }

    pub fn is_false(&self) -> bool {
        self.is_zero()
    }

    /// Bits set in the 32-bit interpretation of this value.
    pub fn definitely_set_int_bits(&self) -> u32 {
        self.int_value() as u32
    }

    /// Bits unset in the 32-bit interpretation of this value.
    pub fn definitely_unset_int_bits(&self) -> u32 {
        !self.definitely_set_int_bits()
    }

    /// Checks if both handles point to the same interned instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SingleNumberValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SingleNumberValue {}

impl Hash for SingleNumberValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ptr(&self.0, state)
    }
}

impl fmt::Debug for SingleNumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SingleNumberValue({})", self.value())
    }
}

impl fmt::Display for SingleNumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Borrowed view over any numeric abstraction.
#[derive(Debug, Copy, Clone)]
pub enum NumberAbstraction<'a> {
    Single(&'a SingleNumberValue),
    DefiniteBits(&'a DefiniteBitsNumberValue),
    Interval(&'a NumberFromIntervalValue),
    Set(&'a NumberFromSetValue),
}

impl NumberAbstraction<'_> {
    /// Checks if `value` may be in the concretization.
    ///
    /// Exact for every encoding except definite bits, which may over-approximate.
    pub fn maybe_contains_int(&self, value: i32) -> bool {
        match self {
            NumberAbstraction::Single(single) => single.value() == value as i64,
            NumberAbstraction::DefiniteBits(bits) => bits.maybe_contains_int(value),
            NumberAbstraction::Interval(interval) => interval.contains_long(value as i64),
            NumberAbstraction::Set(set) => set.contains_int(value),
        }
    }

    /// Number of concrete values described, [`UNBOUNDED_SIZE`] if too large to count.
    pub fn abstraction_size(&self) -> u64 {
        match self {
            NumberAbstraction::Single(_) => 1,
            NumberAbstraction::DefiniteBits(bits) => bits.abstraction_size(),
            NumberAbstraction::Interval(interval) => interval.abstraction_size(),
            NumberAbstraction::Set(set) => set.abstraction_size(),
        }
    }

    pub fn min_inclusive(&self) -> i64 {
        match self {
            NumberAbstraction::Single(single) => single.value(),
            NumberAbstraction::DefiniteBits(bits) => bits.min_inclusive(),
            NumberAbstraction::Interval(interval) => interval.min_inclusive(),
            NumberAbstraction::Set(set) => set.min_inclusive(),
        }
    }

    /// Checks whether every member is in `sorted_values`.
    ///
    /// Decided for exact singles and sets only.
    pub fn is_subset_of(&self, sorted_values: &[i32]) -> OptionalBool {
        match self {
            NumberAbstraction::Single(single) => {
                let value = single.value();
                OptionalBool::of(
                    i32::try_from(value).is_ok_and(|v| sorted_values.binary_search(&v).is_ok()),
                )
            }
            NumberAbstraction::Set(set) => set.is_subset_of(sorted_values),
            NumberAbstraction::DefiniteBits(_) | NumberAbstraction::Interval(_) => {
                OptionalBool::Unknown
            }
        }
    }

    /// Conservative overlap test: `false` only if the concretizations are disjoint.
    pub fn may_overlap_with(&self, other: &NumberAbstraction<'_>) -> bool {
        use NumberAbstraction::*;

        match (*self, *other) {
            // No precise rule for bit patterns.
            (DefiniteBits(_), _) | (_, DefiniteBits(_)) => true,
            (Single(a), Single(b)) => a.value() == b.value(),
            (Single(a), Interval(b)) | (Interval(b), Single(a)) => b.contains_long(a.value()),
            (Single(a), Set(b)) | (Set(b), Single(a)) => {
                i32::try_from(a.value()).is_ok_and(|v| b.contains_int(v))
            }
            (Interval(a), Interval(b)) => {
                a.min_inclusive() <= b.max_inclusive() && b.min_inclusive() <= a.max_inclusive()
            }
            (Interval(a), Set(b)) | (Set(b), Interval(a)) => {
                b.iter().any(|v| a.contains_long(v as i64))
            }
            (Set(a), Set(b)) => {
                let (smaller, larger) = if a.len() <= b.len() { (a, b) } else { (b, a) };
                smaller.iter().any(|v| larger.contains_int(v))
            }
        }
    }
}
