//! Structural snapshots of constant objects.
//!
//! An [`ObjectState`] records what is known about the fields of an object
//! that is itself described by a field value, a stateful object value, or an
//! enum constant. Unlike the interned single values, object states are compared
//! structurally.

use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::types::FieldRef;
use crate::utils::hash_ptr;
use crate::value::AbstractValue;

/// What is known about the fields of an object.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Default)]
pub enum ObjectState {
    /// Nothing is known.
    #[default]
    Empty,
    /// Abstract values for some instance fields.
    NonEmpty(NonEmptyObjectState),
    /// The object is an array of a known length.
    KnownLengthArray(KnownLengthArrayState),
    /// The object is the `values()` array of an enum, with one state per ordinal.
    EnumValues(EnumValuesObjectState),
}

impl ObjectState {
    pub fn empty() -> Self {
        ObjectState::Empty
    }

    pub fn builder() -> ObjectStateBuilder {
        ObjectStateBuilder::default()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ObjectState::Empty)
    }

    /// Returns the abstract value of `field`, or `Unknown` if nothing is recorded.
    pub fn abstract_field_value(&self, field: &FieldRef) -> AbstractValue {
        match self {
            ObjectState::NonEmpty(state) => state.abstract_field_value(field),
            _ => AbstractValue::Unknown,
        }
    }

    /// Calls `f` for every recorded field value.
    pub fn for_each_field_value(&self, mut f: impl FnMut(&FieldRef, &AbstractValue)) {
        if let ObjectState::NonEmpty(state) = self {
            for (field, value) in state.iter() {
                f(field, value);
            }
        }
    }

    pub fn known_array_length(&self) -> Option<i32> {
        match self {
            ObjectState::KnownLengthArray(state) => Some(state.length()),
            _ => None,
        }
    }

    pub fn as_non_empty(&self) -> Option<&NonEmptyObjectState> {
        match self {
            ObjectState::NonEmpty(state) => Some(state),
            _ => None,
        }
    }

    pub fn as_enum_values(&self) -> Option<&EnumValuesObjectState> {
        match self {
            ObjectState::EnumValues(state) => Some(state),
            _ => None,
        }
    }
}

impl fmt::Display for ObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectState::Empty => write!(f, "{{}}"),
            ObjectState::NonEmpty(state) => write!(f, "{}", state),
            ObjectState::KnownLengthArray(state) => write!(f, "array(length={})", state.length()),
            ObjectState::EnumValues(state) => {
                write!(f, "enum[")?;
                for (i, s) in state.iter().enumerate() {
                    if i != 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", s)?;
                }
                write!(f, "]")
            }
        }
    }
}

/// Field values of an object, keyed by field.
///
/// # Invariants
///
/// - The map is non-empty
/// - No value is `Unknown` (unknown fields are absent)
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct NonEmptyObjectState(Arc<BTreeMap<FieldRef, AbstractValue>>);

impl NonEmptyObjectState {
    /// # Panics
    ///
    /// Panics if `state` is empty.
    pub(crate) fn new(state: BTreeMap<FieldRef, AbstractValue>) -> Self {
        assert!(!state.is_empty(), "Non-empty object state must have at least one field");
        debug_assert!(state.values().all(|v| !v.is_unknown()));
        NonEmptyObjectState(Arc::new(state))
    }

    pub fn abstract_field_value(&self, field: &FieldRef) -> AbstractValue {
        self.0.get(field).cloned().unwrap_or(AbstractValue::Unknown)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldRef, &AbstractValue)> {
        self.0.iter()
    }
}

impl fmt::Display for NonEmptyObjectState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (field, value)) in self.0.iter().enumerate() {
            if i != 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", field.name(), value)?;
        }
        write!(f, "}}")
    }
}

/// Length of an array object. Interned by length.
#[derive(Clone)]
pub struct KnownLengthArrayState(Arc<i32>);

impl KnownLengthArrayState {
    pub(crate) fn new(length: i32) -> Self {
        assert!(length >= 0, "Array length must be non-negative");
        KnownLengthArrayState(Arc::new(length))
    }

    pub fn length(&self) -> i32 {
        *self.0
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for KnownLengthArrayState {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for KnownLengthArrayState {}

impl Hash for KnownLengthArrayState {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ptr(&self.0, state)
    }
}

impl fmt::Debug for KnownLengthArrayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KnownLengthArrayState({})", self.length())
    }
}

/// Per-ordinal states of an enum's instances.
///
/// # Invariants
///
/// - At least one ordinal
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct EnumValuesObjectState(Arc<[ObjectState]>);

impl EnumValuesObjectState {
    /// # Panics
    ///
    /// Panics if `states` is empty.
    pub(crate) fn new(states: Vec<ObjectState>) -> Self {
        assert!(!states.is_empty(), "Enum values state must have at least one ordinal");
        EnumValuesObjectState(Arc::from(states))
    }

    /// Returns the state of the instance with the given ordinal, `Empty` if out of range.
    pub fn object_state_for_ordinal(&self, ordinal: i32) -> ObjectState {
        usize::try_from(ordinal)
            .ok()
            .and_then(|i| self.0.get(i))
            .cloned()
            .unwrap_or(ObjectState::Empty)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ObjectState> {
        self.0.iter()
    }
}

/// Accumulates field values into an [`ObjectState`].
#[derive(Debug, Clone, Default)]
pub struct ObjectStateBuilder {
    state: BTreeMap<FieldRef, AbstractValue>,
}

impl ObjectStateBuilder {
    /// Records the value of `field`. `Unknown` values are not stored.
    pub fn record_field_value(&mut self, field: FieldRef, value: AbstractValue) -> &mut Self {
        if value.is_unknown() {
            self.state.remove(&field);
        } else {
            self.state.insert(field, value);
        }
        self
    }

    pub fn build(self) -> ObjectState {
        if self.state.is_empty() {
            ObjectState::Empty
        } else {
            ObjectState::NonEmpty(NonEmptyObjectState::new(self.state))
        }
    }
}
