//! Exact constants other than plain numbers.
//!
//! Strings and class literals are interned by the factory and compare by identity.
//! Field values, boxed primitives and deferred strings are compared structurally.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::factory::AbstractValueFactory;
use crate::naming::NameComputation;
use crate::number::SingleNumberValue;
use crate::object_state::ObjectState;
use crate::rewrite::Renaming;
use crate::types::{FieldRef, ItemReference, PrimitiveKind, TypeRef};
use crate::utils::hash_ptr;

/// An exact string constant. Interned by content.
#[derive(Clone)]
pub struct SingleStringValue(Arc<str>);

impl SingleStringValue {
    pub(crate) fn new(content: &str) -> Self {
        SingleStringValue(Arc::from(content))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SingleStringValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SingleStringValue {}

impl Hash for SingleStringValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ptr(&self.0, state)
    }
}

impl fmt::Debug for SingleStringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SingleStringValue({:?})", self.as_str())
    }
}

impl fmt::Display for SingleStringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.as_str())
    }
}

/// An exact class literal (`Foo.class`). Interned by type.
#[derive(Clone)]
pub struct SingleConstClassValue(Arc<TypeRef>);

impl SingleConstClassValue {
    pub(crate) fn new(ty: TypeRef) -> Self {
        SingleConstClassValue(Arc::new(ty))
    }

    pub fn ty(&self) -> &TypeRef {
        &self.0
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SingleConstClassValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for SingleConstClassValue {}

impl Hash for SingleConstClassValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        hash_ptr(&self.0, state)
    }
}

impl fmt::Debug for SingleConstClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SingleConstClassValue({})", self.ty())
    }
}

impl fmt::Display for SingleConstClassValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.class", self.ty().java_name())
    }
}

#[derive(Debug, Eq, PartialEq, Hash)]
struct FieldValueData {
    field: FieldRef,
    state: ObjectState,
    is_enum: bool,
}

/// The value currently stored in a static field.
///
/// Optionally carries a snapshot of the object the field holds. Enum constants
/// are the [`is_enum`][SingleFieldValue::is_enum] sub-case: the field's value
/// is one fixed instance, so the abstraction denotes exactly one object.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct SingleFieldValue(Arc<FieldValueData>);

impl SingleFieldValue {
    pub(crate) fn new(field: FieldRef, state: ObjectState, is_enum: bool) -> Self {
        SingleFieldValue(Arc::new(FieldValueData {
            field,
            state,
            is_enum,
        }))
    }

    pub fn field(&self) -> &FieldRef {
        &self.0.field
    }

    pub fn object_state(&self) -> &ObjectState {
        &self.0.state
    }

    /// Checks if a snapshot of the referenced object is present.
    pub fn has_object_state(&self) -> bool {
        !self.0.state.is_empty()
    }

    pub fn is_enum(&self) -> bool {
        self.0.is_enum
    }
}

impl fmt::Display for SingleFieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_enum() {
            write!(f, "enum ")?;
        }
        write!(f, "{}", self.field())?;
        if self.has_object_state() {
            write!(f, " {}", self.object_state())?;
        }
        Ok(())
    }
}

#[derive(Debug, Eq, PartialEq, Hash)]
struct BoxedData {
    kind: PrimitiveKind,
    raw_bits: i64,
}

/// A boxed wrapper object (`Integer`, `Boolean`, ...) holding a known primitive.
///
/// Boxed booleans are canonical (`Boolean.TRUE` / `Boolean.FALSE`); the other
/// kinds are compared by kind and raw bits.
#[derive(Debug, Clone)]
pub struct SingleBoxedPrimitiveValue(Arc<BoxedData>);

impl SingleBoxedPrimitiveValue {
    pub(crate) fn new(kind: PrimitiveKind, raw_bits: i64) -> Self {
        SingleBoxedPrimitiveValue(Arc::new(BoxedData { kind, raw_bits }))
    }

    pub fn kind(&self) -> PrimitiveKind {
        self.0.kind
    }

    pub fn raw_bits(&self) -> i64 {
        self.0.raw_bits
    }

    pub fn boxed_type(&self) -> TypeRef {
        self.kind().boxed_type()
    }

    /// The primitive held by the box.
    pub fn unboxed_value(&self, factory: &AbstractValueFactory) -> SingleNumberValue {
        factory.create_single_number_value(self.raw_bits())
    }

    /// The cached `Boolean.TRUE` / `Boolean.FALSE` field for boxed booleans.
    pub fn boolean_constant_field(&self) -> Option<FieldRef> {
        if self.kind() != PrimitiveKind::Boolean {
            return None;
        }
        let boxed = self.boxed_type();
        let name = if self.raw_bits() != 0 { "TRUE" } else { "FALSE" };
        Some(FieldRef::new(boxed.clone(), name, boxed))
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for SingleBoxedPrimitiveValue {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || self.0 == other.0
    }
}

impl Eq for SingleBoxedPrimitiveValue {}

impl Hash for SingleBoxedPrimitiveValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl fmt::Display for SingleBoxedPrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bits = self.raw_bits();
        match self.kind() {
            PrimitiveKind::Boolean => write!(f, "Boolean({})", bits != 0),
            PrimitiveKind::Char => match char::from_u32(bits as u32) {
                Some(c) => write!(f, "Character({:?})", c),
                None => write!(f, "Character({})", bits),
            },
            PrimitiveKind::Float => write!(f, "Float({})", f32::from_bits(bits as u32)),
            PrimitiveKind::Double => write!(f, "Double({})", f64::from_bits(bits as u64)),
            kind => write!(f, "{}({})", kind.boxed_type().simple_name(), bits),
        }
    }
}

/// A string derived from a program item's final name.
///
/// Two values are equal iff they use the same item and the identical naming
/// strategy object.
#[derive(Debug, Clone)]
pub struct SingleItemBasedStringValue {
    reference: ItemReference,
    name_computation: Arc<dyn NameComputation>,
}

impl SingleItemBasedStringValue {
    pub(crate) fn new(reference: ItemReference, name_computation: Arc<dyn NameComputation>) -> Self {
        Self {
            reference,
            name_computation,
        }
    }

    pub fn reference(&self) -> &ItemReference {
        &self.reference
    }

    pub fn name_computation(&self) -> &Arc<dyn NameComputation> {
        &self.name_computation
    }

    /// Computes the final text under `renaming`.
    pub fn resolve(&self, renaming: &dyn Renaming) -> String {
        self.name_computation.compute_name(&self.reference, renaming)
    }

    fn name_computation_addr(&self) -> *const () {
        Arc::as_ptr(&self.name_computation) as *const ()
    }
}

impl PartialEq for SingleItemBasedStringValue {
    fn eq(&self, other: &Self) -> bool {
        self.reference == other.reference
            && self.name_computation_addr() == other.name_computation_addr()
    }
}

impl Eq for SingleItemBasedStringValue {}

impl Hash for SingleItemBasedStringValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.reference.hash(state);
        (self.name_computation_addr() as usize).hash(state);
    }
}

impl fmt::Display for SingleItemBasedStringValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name({}, {:?})", self.reference, self.name_computation)
    }
}
