//! Canonicalizing constructors for abstract values.
//!
//! The [`AbstractValueFactory`] owns the interning tables for every variant whose
//! equality is by identity: numbers (by value), strings (by content), class
//! literals (by type), array-length object states (by length), and boxed
//! booleans. One factory is shared by all optimization workers of a compilation
//! session.
//!
//! # Concurrency
//!
//! Each table is a [`DashMap`]. Lookup-or-insert goes through the `entry` API, so
//! concurrent callers interning the same key always receive the same instance.
//! Entries are never mutated or removed once published.
//!
//! # Example
//!
//! ```
//! use absval::factory::AbstractValueFactory;
//!
//! let factory = AbstractValueFactory::new();
//! let a = factory.create_single_number_value(42);
//! let b = factory.create_single_number_value(42);
//! assert!(a.ptr_eq(&b));
//!
//! // All 32 bits known: collapses to the exact number.
//! let exact = factory.create_definite_bits_number_value(5, !5);
//! assert!(exact.is_single_number());
//! ```

use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use dashmap::DashMap;
use log::trace;

use crate::naming::NameComputation;
use crate::number::{
    DefiniteBitsNumberValue, NumberFromIntervalValue, NumberFromSetBuilder, SingleNumberValue,
};
use crate::object_state::{EnumValuesObjectState, KnownLengthArrayState, ObjectState};
use crate::single::{
    SingleBoxedPrimitiveValue, SingleConstClassValue, SingleFieldValue,
    SingleItemBasedStringValue, SingleStringValue,
};
use crate::types::{FieldRef, ItemReference, PrimitiveKind, TypeRef};
use crate::value::{AbstractValue, KnownLengthArrayValue, NullOrAbstractValue, StatefulObjectValue};

/// Sizes of the interning tables.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub struct FactoryStats {
    pub numbers: usize,
    pub strings: usize,
    pub const_classes: usize,
    pub array_length_states: usize,
}

pub struct AbstractValueFactory {
    number_values: DashMap<i64, SingleNumberValue>,
    string_values: DashMap<Arc<str>, SingleStringValue>,
    const_class_values: DashMap<TypeRef, SingleConstClassValue>,
    known_array_length_states: DashMap<i32, KnownLengthArrayState>,
    boxed_true: SingleBoxedPrimitiveValue,
    boxed_false: SingleBoxedPrimitiveValue,
}

impl AbstractValueFactory {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a factory with tables pre-sized for `2^bits` entries each.
    pub fn with_capacity(bits: usize) -> Self {
        assert!(bits <= 31, "Capacity bits should be in the range 0..=31");

        let capacity = if bits == 0 { 0 } else { 1 << bits };

        Self {
            number_values: DashMap::with_capacity(capacity),
            string_values: DashMap::with_capacity(capacity),
            const_class_values: DashMap::with_capacity(capacity),
            known_array_length_states: DashMap::with_capacity(capacity),
            boxed_true: SingleBoxedPrimitiveValue::new(PrimitiveKind::Boolean, 1),
            boxed_false: SingleBoxedPrimitiveValue::new(PrimitiveKind::Boolean, 0),
        }
    }

    pub fn stats(&self) -> FactoryStats {
        FactoryStats {
            numbers: self.number_values.len(),
            strings: self.string_values.len(),
            const_classes: self.const_class_values.len(),
            array_length_states: self.known_array_length_states.len(),
        }
    }
}

impl Default for AbstractValueFactory {
    fn default() -> Self {
        AbstractValueFactory::new()
    }
}

impl fmt::Debug for AbstractValueFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stats = self.stats();
        f.debug_struct("AbstractValueFactory")
            .field("numbers", &stats.numbers)
            .field("strings", &stats.strings)
            .field("const_classes", &stats.const_classes)
            .field("array_length_states", &stats.array_length_states)
            .finish()
    }
}

/// Get-or-insert with a lock-free fast path for already published entries.
fn intern<K, V>(table: &DashMap<K, V>, key: K, create: impl FnOnce() -> V) -> V
where
    K: Hash + Eq,
    V: Clone,
{
    if let Some(existing) = table.get(&key) {
        return existing.value().clone();
    }
    table.entry(key).or_insert_with(create).value().clone()
}

impl AbstractValueFactory {
    pub fn create_single_number_value(&self, value: i64) -> SingleNumberValue {
        intern(&self.number_values, value, || {
            trace!("intern number {}", value);
            SingleNumberValue::new(value)
        })
    }

    pub fn create_single_string_value(&self, content: &str) -> SingleStringValue {
        if let Some(existing) = self.string_values.get(content) {
            return existing.value().clone();
        }
        intern(&self.string_values, Arc::from(content), || {
            trace!("intern string {:?}", content);
            SingleStringValue::new(content)
        })
    }

    pub fn create_single_const_class_value(&self, ty: TypeRef) -> SingleConstClassValue {
        intern(&self.const_class_values, ty.clone(), || {
            trace!("intern const-class {}", ty);
            SingleConstClassValue::new(ty)
        })
    }

    pub fn create_null_value(&self) -> AbstractValue {
        AbstractValue::SingleNull
    }

    /// The value of static field `field`, optionally with a snapshot of the object it holds.
    pub fn create_single_field_value(&self, field: FieldRef, state: ObjectState) -> SingleFieldValue {
        SingleFieldValue::new(field, state, false)
    }

    /// The enum constant stored in `field`.
    pub fn create_single_enum_value(&self, field: FieldRef, state: ObjectState) -> SingleFieldValue {
        SingleFieldValue::new(field, state, true)
    }

    /// A boxed primitive; booleans are canonical.
    pub fn create_single_boxed_primitive_value(
        &self,
        kind: PrimitiveKind,
        raw_bits: i64,
    ) -> SingleBoxedPrimitiveValue {
        match kind {
            PrimitiveKind::Boolean => {
                debug_assert!(raw_bits == 0 || raw_bits == 1, "not a boolean: {}", raw_bits);
                if raw_bits != 0 {
                    self.boxed_true.clone()
                } else {
                    self.boxed_false.clone()
                }
            }
            kind => SingleBoxedPrimitiveValue::new(kind, raw_bits),
        }
    }

    pub fn create_single_item_based_string_value(
        &self,
        reference: ItemReference,
        name_computation: Arc<dyn NameComputation>,
    ) -> SingleItemBasedStringValue {
        SingleItemBasedStringValue::new(reference, name_computation)
    }

    /// Creates a bit abstraction, collapsing degenerate masks.
    ///
    /// - all 32 bits known: the exact number
    /// - no bit known: `Unknown`
    ///
    /// # Panics
    ///
    /// Panics if some bit is both set and unset.
    pub fn create_definite_bits_number_value(
        &self,
        definitely_set_bits: u32,
        definitely_unset_bits: u32,
    ) -> AbstractValue {
        assert_eq!(
            definitely_set_bits & definitely_unset_bits,
            0,
            "Bits cannot be both set and unset"
        );
        if definitely_set_bits | definitely_unset_bits == u32::MAX {
            return self
                .create_single_number_value(definitely_set_bits as i32 as i64)
                .into();
        }
        if definitely_set_bits == 0 && definitely_unset_bits == 0 {
            return AbstractValue::Unknown;
        }
        DefiniteBitsNumberValue::new(definitely_set_bits, definitely_unset_bits).into()
    }

    /// Creates an interval, collapsing `[v, v]` to the exact number.
    ///
    /// # Panics
    ///
    /// Panics if `max_inclusive < min_inclusive`.
    pub fn create_number_from_interval_value(
        &self,
        min_inclusive: i64,
        max_inclusive: i64,
    ) -> AbstractValue {
        if min_inclusive == max_inclusive {
            return self.create_single_number_value(min_inclusive).into();
        }
        NumberFromIntervalValue::new(min_inclusive, max_inclusive).into()
    }

    /// Creates the most precise set abstraction of `values`.
    ///
    /// Exceeding [`MAX_SIZE`][crate::number::MAX_SIZE] distinct values gives `Unknown`.
    pub fn create_number_from_set_value(&self, values: impl IntoIterator<Item = i32>) -> AbstractValue {
        let mut builder = NumberFromSetBuilder::new();
        for value in values {
            builder.add_int(value);
        }
        builder.build(self)
    }

    pub fn create_known_length_array_state(&self, length: i32) -> KnownLengthArrayState {
        intern(&self.known_array_length_states, length, || {
            trace!("intern array length {}", length);
            KnownLengthArrayState::new(length)
        })
    }

    /// Creates the per-ordinal state of an enum's `values()` array.
    ///
    /// # Panics
    ///
    /// Panics if `states` is empty.
    pub fn create_enum_values_object_state(&self, states: Vec<ObjectState>) -> ObjectState {
        ObjectState::EnumValues(EnumValuesObjectState::new(states))
    }

    pub fn create_known_length_array_value(&self, length: i32) -> AbstractValue {
        KnownLengthArrayValue::new(length).into()
    }

    pub fn create_stateful_object_value(&self, state: ObjectState) -> AbstractValue {
        StatefulObjectValue::create(state)
    }

    pub fn create_null_or_abstract_value(&self, value: AbstractValue) -> AbstractValue {
        NullOrAbstractValue::create(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_numbers_are_interned() {
        let factory = AbstractValueFactory::new();
        let a = factory.create_single_number_value(-17);
        let b = factory.create_single_number_value(-17);
        let c = factory.create_single_number_value(17);
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
        assert_eq!(factory.stats().numbers, 2);
    }

    #[test]
    fn test_strings_and_classes_are_interned() {
        let factory = AbstractValueFactory::new();
        let s1 = factory.create_single_string_value("hello");
        let s2 = factory.create_single_string_value(&String::from("hello"));
        assert!(s1.ptr_eq(&s2));

        let c1 = factory.create_single_const_class_value(TypeRef::class("a.B"));
        let c2 = factory.create_single_const_class_value(TypeRef::new("La/B;"));
        assert!(c1.ptr_eq(&c2));
        assert_eq!(factory.stats().strings, 1);
        assert_eq!(factory.stats().const_classes, 1);
    }

    #[test]
    fn test_boxed_booleans_are_canonical() {
        let factory = AbstractValueFactory::new();
        let t1 = factory.create_single_boxed_primitive_value(PrimitiveKind::Boolean, 1);
        let t2 = factory.create_single_boxed_primitive_value(PrimitiveKind::Boolean, 1);
        let f = factory.create_single_boxed_primitive_value(PrimitiveKind::Boolean, 0);
        assert!(t1.ptr_eq(&t2));
        assert!(!t1.ptr_eq(&f));

        let i1 = factory.create_single_boxed_primitive_value(PrimitiveKind::Int, 1);
        let i2 = factory.create_single_boxed_primitive_value(PrimitiveKind::Int, 1);
        assert_eq!(i1, i2);
        assert_ne!(i1, t1);
    }

    #[test]
    fn test_definite_bits_collapse() {
        let factory = AbstractValueFactory::new();

        let exact = factory.create_definite_bits_number_value(0xFFFF_FFFE, 0x1);
        assert_eq!(exact, factory.create_single_number_value(-2).into());

        assert!(factory.create_definite_bits_number_value(0, 0).is_unknown());

        let partial = factory.create_definite_bits_number_value(0x4, 0xFFFF_FFF8);
        let bits = partial.as_definite_bits_number().expect("expected bits");
        assert_eq!(bits.definitely_set_int_bits(), 0x4);
        assert_eq!(bits.definitely_unset_int_bits(), 0xFFFF_FFF8);
    }

    #[test]
    #[should_panic(expected = "Bits cannot be both set and unset")]
    fn test_definite_bits_overlap_panics() {
        AbstractValueFactory::new().create_definite_bits_number_value(1, 1);
    }

    #[test]
    fn test_interval_collapse() {
        let factory = AbstractValueFactory::new();
        assert!(factory.create_number_from_interval_value(3, 3).is_single_number());
        assert!(factory.create_number_from_interval_value(3, 4).is_number_from_interval());
    }

    #[test]
    fn test_number_set_creation() {
        let factory = AbstractValueFactory::new();
        assert!(factory.create_number_from_set_value([1]).is_single_number());
        assert!(factory.create_number_from_set_value([1, 2]).is_number_from_set());
        assert!(factory.create_number_from_set_value(0..100).is_unknown());
    }

    #[test]
    fn test_with_capacity() {
        let factory = AbstractValueFactory::with_capacity(4);
        factory.create_known_length_array_state(0);
        factory.create_known_length_array_state(0);
        assert_eq!(factory.stats().array_length_states, 1);
        assert!(format!("{:?}", factory).contains("array_length_states: 1"));
    }
}
