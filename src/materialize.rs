//! Turning single-value abstractions back into code.
//!
//! An exact constant can replace the computation that produced it, provided the
//! replacement is legal at the use site. [`ConstantValue`] is a borrowed view over
//! every materializable variant, answering two questions:
//!
//! - can the value be rebuilt here ([`is_materializable_in_context`]) or
//!   anywhere ([`is_materializable_in_all_contexts`])?
//! - which operations rebuild it ([`materialize`])?
//!
//! Symbol resolution and code emission belong to the surrounding optimizer and are
//! reached through the [`SymbolAccess`] and [`InstructionEmitter`] traits.
//!
//! [`is_materializable_in_context`]: ConstantValue::is_materializable_in_context
//! [`is_materializable_in_all_contexts`]: ConstantValue::is_materializable_in_all_contexts
//! [`materialize`]: ConstantValue::materialize

use log::debug;

use crate::number::SingleNumberValue;
use crate::single::{
    SingleBoxedPrimitiveValue, SingleConstClassValue, SingleFieldValue,
    SingleItemBasedStringValue, SingleStringValue,
};
use crate::types::{FieldRef, MethodRef, PrimitiveKind, TypeElement, TypeRef};
use crate::value::AbstractValue;

/// Accessibility queries answered by the optimizer's class hierarchy.
///
/// Unresolvable items are neither accessible nor public.
pub trait SymbolAccess {
    fn is_type_accessible_from(&self, ty: &TypeRef, context: &TypeRef) -> bool;
    fn is_type_public(&self, ty: &TypeRef) -> bool;
    fn is_field_accessible_from(&self, field: &FieldRef, context: &TypeRef) -> bool;
    fn is_field_public(&self, field: &FieldRef) -> bool;
}

/// Low-level operations that produce a fresh value.
pub trait InstructionEmitter {
    type Value;

    /// Loads a primitive constant from its raw bits.
    fn const_number(&mut self, raw_bits: i64, kind: PrimitiveKind) -> Self::Value;
    fn const_string(&mut self, content: &str) -> Self::Value;
    /// Loads a string whose text is fixed after renaming.
    fn const_item_based_string(&mut self, value: &SingleItemBasedStringValue) -> Self::Value;
    fn const_null(&mut self) -> Self::Value;
    fn const_class(&mut self, ty: &TypeRef) -> Self::Value;
    fn static_get(&mut self, field: &FieldRef) -> Self::Value;
    fn invoke_static(&mut self, method: &MethodRef, arguments: Vec<Self::Value>) -> Self::Value;
}

/// A value known to be exactly one runtime constant.
#[derive(Debug, Copy, Clone)]
pub enum ConstantValue<'a> {
    Number(&'a SingleNumberValue),
    String(&'a SingleStringValue),
    Null,
    ConstClass(&'a SingleConstClassValue),
    Field(&'a SingleFieldValue),
    BoxedPrimitive(&'a SingleBoxedPrimitiveValue),
    ItemBasedString(&'a SingleItemBasedStringValue),
}

impl AbstractValue {
    /// Views this value as a single materializable constant.
    pub fn as_constant(&self) -> Option<ConstantValue<'_>> {
        let constant = match self {
            AbstractValue::SingleNumber(value) => ConstantValue::Number(value),
            AbstractValue::SingleString(value) => ConstantValue::String(value),
            AbstractValue::SingleNull => ConstantValue::Null,
            AbstractValue::SingleConstClass(value) => ConstantValue::ConstClass(value),
            AbstractValue::SingleField(value) => ConstantValue::Field(value),
            AbstractValue::SingleBoxedPrimitive(value) => ConstantValue::BoxedPrimitive(value),
            AbstractValue::SingleItemBasedString(value) => ConstantValue::ItemBasedString(value),
            _ => return None,
        };
        Some(constant)
    }
}

impl<'a> ConstantValue<'a> {
    /// Checks if the value can be rebuilt by code inside `context`.
    pub fn is_materializable_in_context(&self, access: &dyn SymbolAccess, context: &TypeRef) -> bool {
        match self {
            ConstantValue::ConstClass(value) => {
                let base = value.ty().base_type();
                base.is_primitive() || access.is_type_accessible_from(&base, context)
            }
            ConstantValue::Field(value) => access.is_field_accessible_from(value.field(), context),
            _ => true,
        }
    }

    /// Checks if the value can be rebuilt by code anywhere in the program.
    pub fn is_materializable_in_all_contexts(&self, access: &dyn SymbolAccess) -> bool {
        match self {
            ConstantValue::ConstClass(value) => {
                let base = value.ty().base_type();
                base.is_primitive() || access.is_type_public(&base)
            }
            ConstantValue::Field(value) => access.is_field_public(value.field()),
            _ => true,
        }
    }

    /// Checks if [`materialize`][Self::materialize] emits exactly one operation.
    ///
    /// Boxed booleans read a cached wrapper field; other boxed kinds need a
    /// constant load followed by a boxing call.
    pub fn has_single_materializing_instruction(&self) -> bool {
        match self {
            ConstantValue::BoxedPrimitive(value) => value.kind() == PrimitiveKind::Boolean,
            _ => true,
        }
    }

    /// Emits the operations that rebuild this value as `ty` inside `context`.
    ///
    /// The caller must have checked [`is_materializable_in_context`][Self::is_materializable_in_context].
    /// A number materialized at a reference type must be zero and becomes `null`.
    pub fn materialize<E: InstructionEmitter>(
        &self,
        emitter: &mut E,
        access: &dyn SymbolAccess,
        context: &TypeRef,
        ty: &TypeElement,
    ) -> E::Value {
        debug_assert!(
            self.is_materializable_in_context(access, context),
            "{} is not materializable in {}",
            self,
            context
        );
        debug!("materialize {} as {} in {}", self, ty, context);

        match *self {
            ConstantValue::Number(value) => match ty.primitive_kind() {
                Some(kind) => emitter.const_number(value.value(), kind),
                None => {
                    debug_assert!(value.is_zero(), "non-zero number {} at reference type {}", value, ty);
                    emitter.const_null()
                }
            },
            ConstantValue::String(value) => emitter.const_string(value.as_str()),
            ConstantValue::Null => emitter.const_null(),
            ConstantValue::ConstClass(value) => emitter.const_class(value.ty()),
            ConstantValue::Field(value) => emitter.static_get(value.field()),
            ConstantValue::BoxedPrimitive(value) => match value.boolean_constant_field() {
                Some(field) => emitter.static_get(&field),
                None => {
                    let unboxed = emitter.const_number(value.raw_bits(), value.kind());
                    emitter.invoke_static(&value.kind().box_method(), vec![unboxed])
                }
            },
            ConstantValue::ItemBasedString(value) => emitter.const_item_based_string(value),
        }
    }
}

impl std::fmt::Display for ConstantValue<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConstantValue::Number(value) => write!(f, "{}", value),
            ConstantValue::String(value) => write!(f, "{}", value),
            ConstantValue::Null => write!(f, "null"),
            ConstantValue::ConstClass(value) => write!(f, "{}", value),
            ConstantValue::Field(value) => write!(f, "{}", value),
            ConstantValue::BoxedPrimitive(value) => write!(f, "{}", value),
            ConstantValue::ItemBasedString(value) => write!(f, "{}", value),
        }
    }
}
