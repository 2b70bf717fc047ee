//! Rewriting abstract values under a renaming of program items.
//!
//! When classes, fields or methods are renamed (minification, class merging,
//! enum unboxing), every stored abstract value must be rewritten to refer to
//! the new items. Rewriting is a pure transform: the input is never modified,
//! and values that mention no items are returned as-is.

use std::collections::BTreeMap;

use log::debug;

use crate::factory::AbstractValueFactory;
use crate::object_state::{NonEmptyObjectState, ObjectState};
use crate::types::{FieldRef, ItemReference, MethodRef, TypeRef};
use crate::value::{AbstractValue, NullOrAbstractValue, StatefulObjectValue};

/// A substitution of program items, supplied by the optimizer.
pub trait Renaming {
    fn rename_type(&self, ty: &TypeRef) -> TypeRef {
        ty.clone()
    }

    /// Defaults to renaming the holder and field type, keeping the name.
    fn rename_field(&self, field: &FieldRef) -> FieldRef {
        FieldRef {
            holder: self.rename_type(&field.holder),
            name: field.name.clone(),
            ty: self.rename_type(&field.ty),
        }
    }

    fn rename_method(&self, method: &MethodRef) -> MethodRef {
        MethodRef {
            holder: self.rename_type(&method.holder),
            name: method.name.clone(),
            proto: method.proto.clone(),
        }
    }

    /// If `field` holds an enum constant whose enum was erased to plain ints,
    /// returns the int that now stands for it.
    ///
    /// A `null` reference to an erased enum becomes `0`.
    fn erased_enum_value(&self, _field: &FieldRef) -> Option<i32> {
        None
    }

    fn rename_item(&self, reference: &ItemReference) -> ItemReference {
        match reference {
            ItemReference::Type(ty) => ItemReference::Type(self.rename_type(ty)),
            ItemReference::Field(field) => ItemReference::Field(self.rename_field(field)),
            ItemReference::Method(method) => ItemReference::Method(self.rename_method(method)),
        }
    }
}

/// Renames nothing.
#[derive(Debug, Copy, Clone, Default)]
pub struct IdentityRenaming;

impl Renaming for IdentityRenaming {}

impl AbstractValue {
    /// Rewrites all item references in this value under `renaming`.
    pub fn rewritten(&self, factory: &AbstractValueFactory, renaming: &dyn Renaming) -> AbstractValue {
        match self {
            AbstractValue::Bottom
            | AbstractValue::Unknown
            | AbstractValue::SingleNull
            | AbstractValue::SingleNumber(_)
            | AbstractValue::SingleString(_)
            | AbstractValue::SingleBoxedPrimitive(_)
            | AbstractValue::DefiniteBitsNumber(_)
            | AbstractValue::NumberFromInterval(_)
            | AbstractValue::NumberFromSet(_)
            | AbstractValue::KnownLengthArray(_) => self.clone(),
            AbstractValue::SingleConstClass(value) => {
                let ty = renaming.rename_type(value.ty());
                if &ty == value.ty() {
                    self.clone()
                } else {
                    factory.create_single_const_class_value(ty).into()
                }
            }
            AbstractValue::SingleField(value) => {
                if let Some(ordinal) = renaming.erased_enum_value(value.field()) {
                    debug!("rewrite: {} erased to {}", value.field(), ordinal);
                    return factory.create_single_number_value(ordinal as i64).into();
                }
                let field = renaming.rename_field(value.field());
                let state = value.object_state().rewritten(factory, renaming);
                if value.is_enum() {
                    factory.create_single_enum_value(field, state).into()
                } else {
                    factory.create_single_field_value(field, state).into()
                }
            }
            AbstractValue::SingleItemBasedString(value) => factory
                .create_single_item_based_string_value(
                    renaming.rename_item(value.reference()),
                    value.name_computation().clone(),
                )
                .into(),
            AbstractValue::NullOr(value) => {
                let inner = value.non_null_value().rewritten(factory, renaming);
                match inner.as_single_number() {
                    Some(number) => factory.create_number_from_set_value([0, number.int_value()]),
                    None => NullOrAbstractValue::create(inner),
                }
            }
            AbstractValue::StatefulObject(value) => {
                StatefulObjectValue::create(value.object_state().rewritten(factory, renaming))
            }
        }
    }
}

impl ObjectState {
    /// Rewrites field keys and nested values under `renaming`.
    ///
    /// Nested values that become `Unknown` are dropped.
    pub fn rewritten(&self, factory: &AbstractValueFactory, renaming: &dyn Renaming) -> ObjectState {
        match self {
            ObjectState::Empty | ObjectState::KnownLengthArray(_) => self.clone(),
            ObjectState::NonEmpty(state) => {
                let rewritten: BTreeMap<_, _> = state
                    .iter()
                    .map(|(field, value)| {
                        (renaming.rename_field(field), value.rewritten(factory, renaming))
                    })
                    .filter(|(_, value)| !value.is_unknown())
                    .collect();
                if rewritten.is_empty() {
                    ObjectState::Empty
                } else {
                    ObjectState::NonEmpty(NonEmptyObjectState::new(rewritten))
                }
            }
            ObjectState::EnumValues(state) => factory.create_enum_values_object_state(
                state.iter().map(|s| s.rewritten(factory, renaming)).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use test_log::test;

    #[derive(Default)]
    struct MapRenaming {
        types: HashMap<TypeRef, TypeRef>,
        erased: HashMap<FieldRef, i32>,
    }

    impl Renaming for MapRenaming {
        fn rename_type(&self, ty: &TypeRef) -> TypeRef {
            self.types.get(ty).cloned().unwrap_or_else(|| ty.clone())
        }

        fn erased_enum_value(&self, field: &FieldRef) -> Option<i32> {
            self.erased.get(field).copied()
        }
    }

    #[test]
    fn test_identity_renaming_preserves_values() {
        let factory = AbstractValueFactory::new();
        let class: AbstractValue = factory.create_single_const_class_value(TypeRef::class("a.B")).into();
        let number: AbstractValue = factory.create_single_number_value(1).into();
        assert_eq!(class.rewritten(&factory, &IdentityRenaming), class);
        assert_eq!(number.rewritten(&factory, &IdentityRenaming), number);
    }

    #[test]
    fn test_const_class_renamed() {
        let factory = AbstractValueFactory::new();
        let mut renaming = MapRenaming::default();
        renaming.types.insert(TypeRef::class("a.B"), TypeRef::class("x.Y"));

        let class: AbstractValue = factory.create_single_const_class_value(TypeRef::class("a.B")).into();
        let rewritten = class.rewritten(&factory, &renaming);
        assert_eq!(
            rewritten,
            factory.create_single_const_class_value(TypeRef::class("x.Y")).into()
        );
        // Original is untouched.
        assert_eq!(class.as_single_const_class().map(|c| c.ty().clone()), Some(TypeRef::class("a.B")));
    }

    #[test]
    fn test_field_value_renamed_with_state() {
        let factory = AbstractValueFactory::new();
        let mut renaming = MapRenaming::default();
        renaming.types.insert(TypeRef::class("a.Holder"), TypeRef::class("a.H"));

        let inner = FieldRef::new(TypeRef::class("a.Holder"), "x", TypeRef::new("I"));
        let mut builder = ObjectState::builder();
        builder.record_field_value(inner, factory.create_single_number_value(3).into());
        let field = FieldRef::new(TypeRef::class("a.Holder"), "INSTANCE", TypeRef::class("a.Holder"));
        let value: AbstractValue = factory.create_single_field_value(field, builder.build()).into();

        let rewritten = value.rewritten(&factory, &renaming);
        let field_value = rewritten.as_single_field().expect("expected a field value");
        assert_eq!(field_value.field().holder, TypeRef::class("a.H"));
        assert_eq!(field_value.field().ty, TypeRef::class("a.H"));

        let renamed_inner = FieldRef::new(TypeRef::class("a.H"), "x", TypeRef::new("I"));
        assert_eq!(
            field_value.object_state().abstract_field_value(&renamed_inner),
            factory.create_single_number_value(3).into()
        );
    }

    #[test]
    fn test_erased_enum_becomes_number() {
        let factory = AbstractValueFactory::new();
        let field = FieldRef::new(TypeRef::class("a.Color"), "GREEN", TypeRef::class("a.Color"));
        let mut renaming = MapRenaming::default();
        renaming.erased.insert(field.clone(), 2);

        let value: AbstractValue = factory.create_single_enum_value(field, ObjectState::Empty).into();
        let rewritten = value.rewritten(&factory, &renaming);
        assert_eq!(rewritten, factory.create_single_number_value(2).into());

        // The erased null is 0, so the nullable reference is a plain int.
        let wrapped = NullOrAbstractValue::create(value);
        let rewritten = wrapped.rewritten(&factory, &renaming);
        assert!(!rewritten.is_null_or_abstract_value());
        assert_eq!(rewritten, factory.create_number_from_set_value([0, 2]));

        let first = FieldRef::new(TypeRef::class("a.Color"), "RED", TypeRef::class("a.Color"));
        renaming.erased.insert(first.clone(), 0);
        let wrapped = NullOrAbstractValue::create(
            factory.create_single_enum_value(first, ObjectState::Empty).into(),
        );
        assert_eq!(
            wrapped.rewritten(&factory, &renaming),
            factory.create_single_number_value(0).into()
        );
    }

    #[test]
    fn test_enum_values_state_rewritten_per_ordinal() {
        let factory = AbstractValueFactory::new();
        let mut renaming = MapRenaming::default();
        renaming.types.insert(TypeRef::class("a.E"), TypeRef::class("b.E"));

        let f = FieldRef::new(TypeRef::class("a.E"), "code", TypeRef::new("I"));
        let mut builder = ObjectState::builder();
        builder.record_field_value(f, factory.create_single_number_value(10).into());
        let state = factory.create_enum_values_object_state(vec![builder.build(), ObjectState::Empty]);

        let rewritten = state.rewritten(&factory, &renaming);
        let values = rewritten.as_enum_values().expect("expected enum values");
        assert_eq!(values.len(), 2);
        let renamed = FieldRef::new(TypeRef::class("b.E"), "code", TypeRef::new("I"));
        assert_eq!(
            values.object_state_for_ordinal(0).abstract_field_value(&renamed),
            factory.create_single_number_value(10).into()
        );
    }
}
