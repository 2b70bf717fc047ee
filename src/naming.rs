//! Naming strategies for strings whose text depends on later renaming.
//!
//! A reflective lookup like `Foo.class.getSimpleName()` evaluates to a string
//! that is only known once the final name of `Foo` has been decided. Such strings
//! are represented as a program item plus a [`NameComputation`] that turns the
//! renamed item into text.

use std::fmt;

use crate::rewrite::Renaming;
use crate::types::{ItemReference, TypeRef};

/// Computes the text of a deferred string from a (renamed) item.
pub trait NameComputation: fmt::Debug + Send + Sync {
    fn compute_name(&self, reference: &ItemReference, renaming: &dyn Renaming) -> String;
}

/// Which of the reflective class-name accessors is being modeled.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ClassNameMapping {
    /// `Class.getName()`: binary name, arrays keep their descriptor form.
    Name,
    /// `Class.getSimpleName()`.
    SimpleName,
    /// `Class.getTypeName()`: binary name, arrays as `T[]`.
    TypeName,
    /// `Class.getCanonicalName()`: nested classes separated by `.`.
    CanonicalName,
}

impl ClassNameMapping {
    pub fn map(self, ty: &TypeRef) -> String {
        match self {
            ClassNameMapping::Name if ty.is_array() => ty.descriptor().replace('/', "."),
            ClassNameMapping::Name | ClassNameMapping::TypeName => ty.java_name(),
            ClassNameMapping::SimpleName => ty.simple_name(),
            ClassNameMapping::CanonicalName => ty.java_name().replace('$', "."),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ClassNameComputation {
    pub mapping: ClassNameMapping,
}

impl ClassNameComputation {
    pub fn new(mapping: ClassNameMapping) -> Self {
        Self { mapping }
    }
}

impl NameComputation for ClassNameComputation {
    fn compute_name(&self, reference: &ItemReference, renaming: &dyn Renaming) -> String {
        let ty = match reference {
            ItemReference::Type(ty) => ty,
            ItemReference::Field(field) => &field.holder,
            ItemReference::Method(method) => &method.holder,
        };
        self.mapping.map(&renaming.rename_type(ty))
    }
}

/// The (renamed) name of a field or method; types fall back to their binary name.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
pub struct FieldNameComputation;

impl NameComputation for FieldNameComputation {
    fn compute_name(&self, reference: &ItemReference, renaming: &dyn Renaming) -> String {
        match reference {
            ItemReference::Field(field) => renaming.rename_field(field).name().to_string(),
            ItemReference::Method(method) => renaming.rename_method(method).name().to_string(),
            ItemReference::Type(ty) => renaming.rename_type(ty).java_name(),
        }
    }
}
