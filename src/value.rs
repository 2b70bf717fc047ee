//! The abstract value lattice.
//!
//! ```text
//!                         Unknown (⊤)
//!                              │
//!   NullOr(x)  DefiniteBits  Interval  NumberFromSet  StatefulObject  KnownLengthArray
//!      │             │                      │
//!  null, x      SingleNumber           SingleNumber   ...   (exact constants)
//!                              │
//!                         Bottom (⊥)
//! ```
//!
//! [`AbstractValue`] is a closed sum type: every classification and join site
//! matches exhaustively on it. Cheap variants (`Bottom`, `Unknown`, `SingleNull`)
//! carry no payload; the rest hold reference-counted payloads, so cloning a value
//! never copies its contents.

use std::fmt;
use std::sync::Arc;

use crate::number::{
    DefiniteBitsNumberValue, NumberAbstraction, NumberFromIntervalValue, NumberFromSetValue,
    SingleNumberValue, UNBOUNDED_SIZE,
};
use crate::object_state::ObjectState;
use crate::single::{
    SingleBoxedPrimitiveValue, SingleConstClassValue, SingleFieldValue,
    SingleItemBasedStringValue, SingleStringValue,
};

/// A compile-time summary of the runtime values a program quantity can take.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum AbstractValue {
    /// No information yet; identity of join.
    #[default]
    Bottom,
    /// No useful fact; absorbing element of join.
    Unknown,
    SingleNumber(SingleNumberValue),
    SingleString(SingleStringValue),
    SingleNull,
    SingleConstClass(SingleConstClassValue),
    SingleField(SingleFieldValue),
    SingleBoxedPrimitive(SingleBoxedPrimitiveValue),
    SingleItemBasedString(SingleItemBasedStringValue),
    DefiniteBitsNumber(DefiniteBitsNumberValue),
    NumberFromInterval(NumberFromIntervalValue),
    NumberFromSet(NumberFromSetValue),
    NullOr(NullOrAbstractValue),
    StatefulObject(StatefulObjectValue),
    KnownLengthArray(KnownLengthArrayValue),
}

impl AbstractValue {
    pub fn bottom() -> Self {
        AbstractValue::Bottom
    }

    pub fn unknown() -> Self {
        AbstractValue::Unknown
    }

    pub fn null() -> Self {
        AbstractValue::SingleNull
    }

    pub fn is_bottom(&self) -> bool {
        matches!(self, AbstractValue::Bottom)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AbstractValue::Unknown)
    }

    /// Anything but `Unknown` carries information.
    pub fn is_non_trivial(&self) -> bool {
        !self.is_unknown()
    }

    /// Checks if the concretization has exactly one element.
    ///
    /// Holds for exact numbers, exact strings and enum constants.
    pub fn is_single_value(&self) -> bool {
        match self {
            AbstractValue::SingleNumber(_) | AbstractValue::SingleString(_) => true,
            AbstractValue::SingleField(value) => value.is_enum(),
            _ => false,
        }
    }

    pub fn is_single_number(&self) -> bool {
        matches!(self, AbstractValue::SingleNumber(_))
    }

    pub fn as_single_number(&self) -> Option<&SingleNumberValue> {
        match self {
            AbstractValue::SingleNumber(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_single_string(&self) -> bool {
        matches!(self, AbstractValue::SingleString(_))
    }

    pub fn as_single_string(&self) -> Option<&SingleStringValue> {
        match self {
            AbstractValue::SingleString(value) => Some(value),
            _ => None,
        }
    }

    /// Checks if this is the exact `null` constant.
    pub fn is_null(&self) -> bool {
        matches!(self, AbstractValue::SingleNull)
    }

    pub fn is_single_const_class(&self) -> bool {
        matches!(self, AbstractValue::SingleConstClass(_))
    }

    pub fn as_single_const_class(&self) -> Option<&SingleConstClassValue> {
        match self {
            AbstractValue::SingleConstClass(value) => Some(value),
            _ => None,
        }
    }

    /// Checks if this is a field value, including enum constants.
    pub fn is_single_field(&self) -> bool {
        matches!(self, AbstractValue::SingleField(_))
    }

    pub fn as_single_field(&self) -> Option<&SingleFieldValue> {
        match self {
            AbstractValue::SingleField(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_single_enum(&self) -> bool {
        self.as_single_enum().is_some()
    }

    pub fn as_single_enum(&self) -> Option<&SingleFieldValue> {
        self.as_single_field().filter(|value| value.is_enum())
    }

    pub fn is_single_boxed_primitive(&self) -> bool {
        matches!(self, AbstractValue::SingleBoxedPrimitive(_))
    }

    pub fn as_single_boxed_primitive(&self) -> Option<&SingleBoxedPrimitiveValue> {
        match self {
            AbstractValue::SingleBoxedPrimitive(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_single_item_based_string(&self) -> bool {
        matches!(self, AbstractValue::SingleItemBasedString(_))
    }

    pub fn as_single_item_based_string(&self) -> Option<&SingleItemBasedStringValue> {
        match self {
            AbstractValue::SingleItemBasedString(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_definite_bits_number(&self) -> bool {
        matches!(self, AbstractValue::DefiniteBitsNumber(_))
    }

    pub fn as_definite_bits_number(&self) -> Option<&DefiniteBitsNumberValue> {
        match self {
            AbstractValue::DefiniteBitsNumber(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_number_from_interval(&self) -> bool {
        matches!(self, AbstractValue::NumberFromInterval(_))
    }

    pub fn as_number_from_interval(&self) -> Option<&NumberFromIntervalValue> {
        match self {
            AbstractValue::NumberFromInterval(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_number_from_set(&self) -> bool {
        matches!(self, AbstractValue::NumberFromSet(_))
    }

    pub fn as_number_from_set(&self) -> Option<&NumberFromSetValue> {
        match self {
            AbstractValue::NumberFromSet(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_null_or_abstract_value(&self) -> bool {
        matches!(self, AbstractValue::NullOr(_))
    }

    pub fn as_null_or_abstract_value(&self) -> Option<&NullOrAbstractValue> {
        match self {
            AbstractValue::NullOr(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_stateful_object(&self) -> bool {
        matches!(self, AbstractValue::StatefulObject(_))
    }

    pub fn as_stateful_object(&self) -> Option<&StatefulObjectValue> {
        match self {
            AbstractValue::StatefulObject(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_known_length_array(&self) -> bool {
        matches!(self, AbstractValue::KnownLengthArray(_))
    }

    pub fn as_known_length_array(&self) -> Option<&KnownLengthArrayValue> {
        match self {
            AbstractValue::KnownLengthArray(value) => Some(value),
            _ => None,
        }
    }

    /// Checks if this is an exact number or a non-constant numeric abstraction.
    pub fn is_constant_or_non_constant_number(&self) -> bool {
        self.as_number_abstraction().is_some()
    }

    pub fn as_number_abstraction(&self) -> Option<NumberAbstraction<'_>> {
        match self {
            AbstractValue::SingleNumber(value) => Some(NumberAbstraction::Single(value)),
            AbstractValue::DefiniteBitsNumber(value) => Some(NumberAbstraction::DefiniteBits(value)),
            AbstractValue::NumberFromInterval(value) => Some(NumberAbstraction::Interval(value)),
            AbstractValue::NumberFromSet(value) => Some(NumberAbstraction::Set(value)),
            _ => None,
        }
    }

    /// Checks if per-bit knowledge is available (exact numbers and bit abstractions).
    pub fn has_definitely_set_and_unset_bits_information(&self) -> bool {
        self.definite_bits().is_some()
    }

    /// Returns `(definitely_set, definitely_unset)` bit masks, if available.
    pub fn definite_bits(&self) -> Option<(u32, u32)> {
        match self {
            AbstractValue::SingleNumber(value) => Some((
                value.definitely_set_int_bits(),
                value.definitely_unset_int_bits(),
            )),
            AbstractValue::DefiniteBitsNumber(value) => Some((
                value.definitely_set_int_bits(),
                value.definitely_unset_int_bits(),
            )),
            _ => None,
        }
    }

    /// Checks if `value` may be a concrete value of this abstraction.
    ///
    /// Non-numeric abstractions answer `true` (except `Bottom`).
    pub fn maybe_contains_int(&self, value: i32) -> bool {
        match self.as_number_abstraction() {
            Some(number) => number.maybe_contains_int(value),
            None => !self.is_bottom(),
        }
    }

    /// Number of concrete values described, [`UNBOUNDED_SIZE`] if unknown or too large.
    ///
    /// Exact constants count as one; `NullOr` adds one for `null`.
    pub fn abstraction_size(&self) -> u64 {
        match self {
            AbstractValue::Bottom => 0,
            AbstractValue::SingleString(_)
            | AbstractValue::SingleNull
            | AbstractValue::SingleConstClass(_)
            | AbstractValue::SingleBoxedPrimitive(_)
            | AbstractValue::SingleItemBasedString(_) => 1,
            AbstractValue::SingleField(value) if value.is_enum() => 1,
            AbstractValue::NullOr(value) => {
                value.non_null_value().abstraction_size().saturating_add(1)
            }
            _ => match self.as_number_abstraction() {
                Some(number) => number.abstraction_size(),
                None => UNBOUNDED_SIZE,
            },
        }
    }

    pub fn is_definitely_null(&self) -> bool {
        matches!(self, AbstractValue::Bottom | AbstractValue::SingleNull)
    }

    pub fn is_definitely_not_null(&self) -> bool {
        match self {
            AbstractValue::Bottom
            | AbstractValue::SingleString(_)
            | AbstractValue::SingleConstClass(_)
            | AbstractValue::SingleBoxedPrimitive(_)
            | AbstractValue::SingleItemBasedString(_)
            | AbstractValue::StatefulObject(_)
            | AbstractValue::KnownLengthArray(_) => true,
            AbstractValue::SingleField(value) => value.is_enum(),
            _ => false,
        }
    }

    pub fn is_maybe_null(&self) -> bool {
        !self.is_definitely_not_null()
    }

    /// Returns the object snapshot carried by this value, `Empty` if none.
    pub fn object_state(&self) -> &ObjectState {
        static EMPTY: ObjectState = ObjectState::Empty;
        match self {
            AbstractValue::SingleField(value) => value.object_state(),
            AbstractValue::StatefulObject(value) => value.object_state(),
            _ => &EMPTY,
        }
    }
}

impl fmt::Display for AbstractValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbstractValue::Bottom => write!(f, "⊥"),
            AbstractValue::Unknown => write!(f, "⊤"),
            AbstractValue::SingleNumber(value) => write!(f, "{}", value),
            AbstractValue::SingleString(value) => write!(f, "{}", value),
            AbstractValue::SingleNull => write!(f, "null"),
            AbstractValue::SingleConstClass(value) => write!(f, "{}", value),
            AbstractValue::SingleField(value) => write!(f, "{}", value),
            AbstractValue::SingleBoxedPrimitive(value) => write!(f, "{}", value),
            AbstractValue::SingleItemBasedString(value) => write!(f, "{}", value),
            AbstractValue::DefiniteBitsNumber(value) => write!(f, "{}", value),
            AbstractValue::NumberFromInterval(value) => write!(f, "{}", value),
            AbstractValue::NumberFromSet(value) => write!(f, "{}", value),
            AbstractValue::NullOr(value) => write!(f, "null | {}", value.non_null_value()),
            AbstractValue::StatefulObject(value) => write!(f, "object {}", value.object_state()),
            AbstractValue::KnownLengthArray(value) => write!(f, "array(length={})", value.length()),
        }
    }
}

macro_rules! impl_from_variant {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for AbstractValue {
                fn from(value: $ty) -> Self {
                    AbstractValue::$variant(value)
                }
            }
        )*
    };
}

impl_from_variant! {
    SingleNumberValue => SingleNumber,
    SingleStringValue => SingleString,
    SingleConstClassValue => SingleConstClass,
    SingleFieldValue => SingleField,
    SingleBoxedPrimitiveValue => SingleBoxedPrimitive,
    SingleItemBasedStringValue => SingleItemBasedString,
    DefiniteBitsNumberValue => DefiniteBitsNumber,
    NumberFromIntervalValue => NumberFromInterval,
    NumberFromSetValue => NumberFromSet,
    KnownLengthArrayValue => KnownLengthArray,
}

/// Either `null` or a value satisfying the wrapped abstraction.
///
/// # Invariants
///
/// The wrapped value is never `Bottom`, `Unknown`, `null`, or another `NullOr`.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NullOrAbstractValue(Arc<AbstractValue>);

impl NullOrAbstractValue {
    /// Wraps `value`, normalizing the cases that need no wrapper.
    pub fn create(value: AbstractValue) -> AbstractValue {
        match value {
            AbstractValue::Bottom
            | AbstractValue::Unknown
            | AbstractValue::SingleNull
            | AbstractValue::NullOr(_) => value,
            value => AbstractValue::NullOr(NullOrAbstractValue(Arc::new(value))),
        }
    }

    pub fn non_null_value(&self) -> &AbstractValue {
        &self.0
    }
}

/// A non-null object whose fields match a snapshot.
///
/// # Invariants
///
/// The snapshot is never empty.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct StatefulObjectValue(ObjectState);

impl StatefulObjectValue {
    /// Returns `Unknown` for an empty snapshot.
    pub fn create(state: ObjectState) -> AbstractValue {
        if state.is_empty() {
            AbstractValue::Unknown
        } else {
            AbstractValue::StatefulObject(StatefulObjectValue(state))
        }
    }

    pub fn object_state(&self) -> &ObjectState {
        &self.0
    }
}

/// A non-null array of a known length.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct KnownLengthArrayValue {
    length: i32,
}

impl KnownLengthArrayValue {
    /// # Panics
    ///
    /// Panics if `length` is negative.
    pub fn new(length: i32) -> Self {
        assert!(length >= 0, "Array length must be non-negative");
        Self { length }
    }

    pub fn length(&self) -> i32 {
        self.length
    }
}
