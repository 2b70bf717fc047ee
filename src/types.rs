//! Program items referenced by abstract values.
//!
//! These are lightweight, cheaply clonable handles for types, fields and methods.
//! The surrounding optimizer owns the real definitions; the lattice only needs
//! to name them, compare them, and pass them back to collaborators
//! (accessibility checks, renaming, code emission).
use std::fmt;
use std::sync::Arc;

/// A type, identified by its JVM-style descriptor (e.g. `I`, `Ljava/lang/String;`, `[J`).
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TypeRef(Arc<str>);

impl TypeRef {
    /// Creates a new type reference from a descriptor.
    ///
    /// # Panics
    ///
    /// Panics if `descriptor` is empty.
    pub fn new(descriptor: &str) -> Self {
        assert!(!descriptor.is_empty(), "Type descriptor must not be empty");
        TypeRef(Arc::from(descriptor))
    }

    /// Creates a class type from a binary name such as `java.lang.String`.
    pub fn class(binary_name: &str) -> Self {
        TypeRef::new(&format!("L{};", binary_name.replace('.', "/")))
    }

    pub fn descriptor(&self) -> &str {
        &self.0
    }

    pub fn is_primitive(&self) -> bool {
        PrimitiveKind::from_descriptor(&self.0).is_some()
    }

    pub fn is_array(&self) -> bool {
        self.0.starts_with('[')
    }

    pub fn is_class(&self) -> bool {
        self.0.starts_with('L')
    }

    /// Returns the element type with all array dimensions stripped.
    pub fn base_type(&self) -> TypeRef {
        let stripped = self.0.trim_start_matches('[');
        if stripped.len() == self.0.len() {
            self.clone()
        } else {
            TypeRef::new(stripped)
        }
    }

    /// Returns the number of array dimensions.
    pub fn dimensions(&self) -> usize {
        self.0.len() - self.0.trim_start_matches('[').len()
    }

    /// Returns the source-level name, e.g. `java.lang.String`, `int`, `int[][]`.
    pub fn java_name(&self) -> String {
        let dims = self.dimensions();
        let base = &self.0[dims..];
        let mut name = match PrimitiveKind::from_descriptor(base) {
            Some(kind) => kind.java_name().to_string(),
            None if base == "V" => "void".to_string(),
            None => base
                .trim_start_matches('L')
                .trim_end_matches(';')
                .replace('/', "."),
        };
        for _ in 0..dims {
            name.push_str("[]");
        }
        name
    }

    /// Returns the name of the class without its package and outer classes.
    pub fn simple_name(&self) -> String {
        let name = self.java_name();
        let tail = name.rsplit('.').next().unwrap_or(&name);
        tail.rsplit('$').next().unwrap_or(tail).to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TypeRef {
    fn from(descriptor: &str) -> Self {
        TypeRef::new(descriptor)
    }
}

/// A reference to a field: holder type, name and field type.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldRef {
    pub holder: TypeRef,
    pub name: Arc<str>,
    pub ty: TypeRef,
}

impl FieldRef {
    pub fn new(holder: TypeRef, name: &str, ty: TypeRef) -> Self {
        Self {
            holder,
            name: Arc::from(name),
            ty,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}:{}", self.holder, self.name, self.ty)
    }
}

/// A reference to a method: holder type, name and prototype descriptor.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct MethodRef {
    pub holder: TypeRef,
    pub name: Arc<str>,
    pub proto: Arc<str>,
}

impl MethodRef {
    pub fn new(holder: TypeRef, name: &str, proto: &str) -> Self {
        Self {
            holder,
            name: Arc::from(name),
            proto: Arc::from(proto),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}{}", self.holder, self.name, self.proto)
    }
}

/// Any program item a deferred string can be computed from.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ItemReference {
    Type(TypeRef),
    Field(FieldRef),
    Method(MethodRef),
}

impl fmt::Display for ItemReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemReference::Type(ty) => write!(f, "{}", ty),
            ItemReference::Field(field) => write!(f, "{}", field),
            ItemReference::Method(method) => write!(f, "{}", method),
        }
    }
}

/// Primitive kinds of the target virtual machine.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveKind {
    pub const ALL: [PrimitiveKind; 8] = [
        PrimitiveKind::Boolean,
        PrimitiveKind::Byte,
        PrimitiveKind::Char,
        PrimitiveKind::Short,
        PrimitiveKind::Int,
        PrimitiveKind::Long,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    pub fn from_descriptor(descriptor: &str) -> Option<Self> {
        let kind = match descriptor {
            "Z" => PrimitiveKind::Boolean,
            "B" => PrimitiveKind::Byte,
            "C" => PrimitiveKind::Char,
            "S" => PrimitiveKind::Short,
            "I" => PrimitiveKind::Int,
            "J" => PrimitiveKind::Long,
            "F" => PrimitiveKind::Float,
            "D" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }

    pub fn descriptor(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "Z",
            PrimitiveKind::Byte => "B",
            PrimitiveKind::Char => "C",
            PrimitiveKind::Short => "S",
            PrimitiveKind::Int => "I",
            PrimitiveKind::Long => "J",
            PrimitiveKind::Float => "F",
            PrimitiveKind::Double => "D",
        }
    }

    pub fn java_name(self) -> &'static str {
        match self {
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Byte => "byte",
            PrimitiveKind::Char => "char",
            PrimitiveKind::Short => "short",
            PrimitiveKind::Int => "int",
            PrimitiveKind::Long => "long",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// Number of bits in the value representation.
    pub fn bit_width(self) -> u32 {
        match self {
            PrimitiveKind::Boolean => 1,
            PrimitiveKind::Byte => 8,
            PrimitiveKind::Char | PrimitiveKind::Short => 16,
            PrimitiveKind::Int | PrimitiveKind::Float => 32,
            PrimitiveKind::Long | PrimitiveKind::Double => 64,
        }
    }

    /// Long and double occupy two registers.
    pub fn is_wide(self) -> bool {
        matches!(self, PrimitiveKind::Long | PrimitiveKind::Double)
    }

    pub fn to_type(self) -> TypeRef {
        TypeRef::new(self.descriptor())
    }

    /// The wrapper class used when this primitive is boxed.
    pub fn boxed_type(self) -> TypeRef {
        let name = match self {
            PrimitiveKind::Boolean => "java/lang/Boolean",
            PrimitiveKind::Byte => "java/lang/Byte",
            PrimitiveKind::Char => "java/lang/Character",
            PrimitiveKind::Short => "java/lang/Short",
            PrimitiveKind::Int => "java/lang/Integer",
            PrimitiveKind::Long => "java/lang/Long",
            PrimitiveKind::Float => "java/lang/Float",
            PrimitiveKind::Double => "java/lang/Double",
        };
        TypeRef::new(&format!("L{};", name))
    }

    /// The static `valueOf` factory method on the wrapper class.
    pub fn box_method(self) -> MethodRef {
        let boxed = self.boxed_type();
        let proto = format!("({}){}", self.descriptor(), boxed.descriptor());
        MethodRef::new(boxed, "valueOf", &proto)
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.java_name())
    }
}

/// The static type a join is performed at.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum TypeElement {
    Primitive(PrimitiveKind),
    Reference(TypeRef),
}

impl TypeElement {
    pub fn int() -> Self {
        TypeElement::Primitive(PrimitiveKind::Int)
    }

    pub fn reference(descriptor: &str) -> Self {
        TypeElement::Reference(TypeRef::new(descriptor))
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeElement::Primitive(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeElement::Reference(_))
    }

    /// Checks if this is exactly the 32-bit `int` type.
    pub fn is_int(&self) -> bool {
        matches!(self, TypeElement::Primitive(PrimitiveKind::Int))
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            TypeElement::Primitive(kind) => Some(*kind),
            TypeElement::Reference(_) => None,
        }
    }
}

impl From<&TypeRef> for TypeElement {
    fn from(ty: &TypeRef) -> Self {
        match PrimitiveKind::from_descriptor(ty.descriptor()) {
            Some(kind) => TypeElement::Primitive(kind),
            None => TypeElement::Reference(ty.clone()),
        }
    }
}

impl fmt::Display for TypeElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeElement::Primitive(kind) => write!(f, "{}", kind),
            TypeElement::Reference(ty) => write!(f, "{}", ty.java_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names() {
        let string = TypeRef::class("java.lang.String");
        assert_eq!(string.descriptor(), "Ljava/lang/String;");
        assert_eq!(string.java_name(), "java.lang.String");
        assert_eq!(string.simple_name(), "String");

        let inner = TypeRef::new("Lcom/example/Outer$Inner;");
        assert_eq!(inner.java_name(), "com.example.Outer$Inner");
        assert_eq!(inner.simple_name(), "Inner");

        let matrix = TypeRef::new("[[I");
        assert!(matrix.is_array());
        assert_eq!(matrix.dimensions(), 2);
        assert_eq!(matrix.base_type(), TypeRef::new("I"));
        assert_eq!(matrix.java_name(), "int[][]");
    }

    #[test]
    #[should_panic(expected = "Type descriptor must not be empty")]
    fn test_empty_descriptor_panics() {
        TypeRef::new("");
    }

    #[test]
    fn test_primitive_boxing() {
        let method = PrimitiveKind::Int.box_method();
        assert_eq!(method.holder.descriptor(), "Ljava/lang/Integer;");
        assert_eq!(method.name(), "valueOf");
        assert_eq!(&*method.proto, "(I)Ljava/lang/Integer;");

        for kind in PrimitiveKind::ALL {
            assert_eq!(PrimitiveKind::from_descriptor(kind.descriptor()), Some(kind));
            assert!(kind.to_type().is_primitive());
        }
        assert!(PrimitiveKind::Long.is_wide());
        assert!(!PrimitiveKind::Float.is_wide());
    }

    #[test]
    fn test_type_element() {
        assert!(TypeElement::int().is_int());
        assert!(!TypeElement::Primitive(PrimitiveKind::Short).is_int());
        assert!(TypeElement::reference("Ljava/lang/Object;").is_reference());
        assert_eq!(TypeElement::from(&TypeRef::new("J")), TypeElement::Primitive(PrimitiveKind::Long));
    }
}
