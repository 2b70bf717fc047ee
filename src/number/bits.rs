use std::fmt;

use super::SingleNumberValue;

/// Known-bits abstraction over 32-bit integers.
///
/// Every bit position is either definitely set, definitely unset, or unknown.
///
/// # Invariants
///
/// - `definitely_set_bits & definitely_unset_bits == 0`
/// - At least one bit is unknown (fully known patterns are [`SingleNumberValue`]s)
/// - At least one bit is known (no knowledge at all is `Unknown`)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct DefiniteBitsNumberValue {
    definitely_set_bits: u32,
    definitely_unset_bits: u32,
}

impl DefiniteBitsNumberValue {
    /// Creates a new bit abstraction.
    ///
    /// Use [`AbstractValueFactory::create_definite_bits_number_value`][crate::factory::AbstractValueFactory::create_definite_bits_number_value]
    /// to get the collapsing behavior for degenerate masks.
    ///
    /// # Panics
    ///
    /// Panics if some bit is both set and unset.
    pub(crate) fn new(definitely_set_bits: u32, definitely_unset_bits: u32) -> Self {
        assert_eq!(
            definitely_set_bits & definitely_unset_bits,
            0,
            "Bits cannot be both set and unset"
        );
        Self {
            definitely_set_bits,
            definitely_unset_bits,
        }
    }

    pub fn definitely_set_int_bits(&self) -> u32 {
        self.definitely_set_bits
    }

    pub fn definitely_unset_int_bits(&self) -> u32 {
        self.definitely_unset_bits
    }

    /// Mask of positions whose value is known.
    pub fn known_bits(&self) -> u32 {
        self.definitely_set_bits | self.definitely_unset_bits
    }

    pub fn maybe_contains_int(&self, value: i32) -> bool {
        let value = value as u32;
        (value & self.definitely_set_bits) == self.definitely_set_bits
            && (value & self.definitely_unset_bits) == 0
    }

    /// `2^k` where `k` is the number of unknown bits.
    pub fn abstraction_size(&self) -> u64 {
        1u64 << self.known_bits().count_zeros()
    }

    /// Bit patterns alone do not bound the value from below.
    pub fn min_inclusive(&self) -> i64 {
        i32::MIN as i64
    }

    /// Joined masks with another bit abstraction: keeps only bits both agree on.
    pub fn join_bits(&self, other: &DefiniteBitsNumberValue) -> (u32, u32) {
        (
            self.definitely_set_bits & other.definitely_set_bits,
            self.definitely_unset_bits & other.definitely_unset_bits,
        )
    }

    /// Joined masks with an exact number, viewed as a fully known bit pattern.
    pub fn join_single(&self, single: &SingleNumberValue) -> (u32, u32) {
        (
            self.definitely_set_bits & single.definitely_set_int_bits(),
            self.definitely_unset_bits & single.definitely_unset_int_bits(),
        )
    }
}

impl fmt::Display for DefiniteBitsNumberValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bits(set={:#x}, unset={:#x})",
            self.definitely_set_bits, self.definitely_unset_bits
        )
    }
}
