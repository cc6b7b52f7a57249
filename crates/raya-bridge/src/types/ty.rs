//! Core host type descriptors
//!
//! A [`Type`] is a cheap-to-clone handle to an immutable [`TypeInfo`]. Named
//! types are nominal: every [`TypeBuilder::build`] mints a distinct type, and
//! two builds under the same name never compare equal. The name is only used
//! for display. Unnamed types are structural.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::func::{FnSig, MethodDesc, Receiver};
use super::record::{FieldDesc, RecordType};

/// Integer width for signed and unsigned host integers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    /// 8 bits
    W8,
    /// 16 bits
    W16,
    /// 32 bits
    W32,
    /// 64 bits
    W64,
    /// Platform word (64 bits on every supported target)
    Word,
}

impl IntWidth {
    /// Truncate a signed value to this width, sign-extending the result
    #[inline]
    pub fn wrap_signed(self, v: i64) -> i64 {
        match self {
            IntWidth::W8 => v as i8 as i64,
            IntWidth::W16 => v as i16 as i64,
            IntWidth::W32 => v as i32 as i64,
            IntWidth::W64 | IntWidth::Word => v,
        }
    }

    /// Truncate an unsigned value to this width
    #[inline]
    pub fn wrap_unsigned(self, v: u64) -> u64 {
        match self {
            IntWidth::W8 => v as u8 as u64,
            IntWidth::W16 => v as u16 as u64,
            IntWidth::W32 => v as u32 as u64,
            IntWidth::W64 | IntWidth::Word => v,
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            IntWidth::W8 => "8",
            IntWidth::W16 => "16",
            IntWidth::W32 => "32",
            IntWidth::W64 => "64",
            IntWidth::Word => "",
        }
    }
}

/// Floating point width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    /// Single precision
    F32,
    /// Double precision
    F64,
}

impl FloatWidth {
    /// Round a double to this width
    #[inline]
    pub fn round(self, v: f64) -> f64 {
        match self {
            FloatWidth::F32 => v as f32 as f64,
            FloatWidth::F64 => v,
        }
    }
}

/// Interface type: the set of method names a value must expose
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InterfaceType {
    /// Required method names
    pub methods: Vec<String>,
}

impl InterfaceType {
    /// Whether this is the empty interface (`any`)
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Underlying shape of a host type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Boolean
    Bool,
    /// Signed integer
    Int(IntWidth),
    /// Unsigned integer
    Uint(IntWidth),
    /// Floating point
    Float(FloatWidth),
    /// Complex number (never convertible to a script value)
    Complex(FloatWidth),
    /// UTF-8 string
    String,
    /// Dynamically sized sequence
    Slice(Type),
    /// Fixed-size array
    Array(Type, usize),
    /// Hash map
    Map(Type, Type),
    /// Record with declared fields
    Record(RecordType),
    /// Function
    Func(FnSig),
    /// Pointer to a value
    Pointer(Type),
    /// Interface (dynamic container for any conforming value)
    Interface(InterfaceType),
    /// Channel (never convertible to a script value)
    Chan(Type),
}

impl TypeKind {
    /// Short name of the kind family
    pub fn family(&self) -> &'static str {
        match self {
            TypeKind::Bool => "bool",
            TypeKind::Int(_) => "int",
            TypeKind::Uint(_) => "uint",
            TypeKind::Float(_) => "float",
            TypeKind::Complex(_) => "complex",
            TypeKind::String => "string",
            TypeKind::Slice(_) => "slice",
            TypeKind::Array(_, _) => "array",
            TypeKind::Map(_, _) => "map",
            TypeKind::Record(_) => "struct",
            TypeKind::Func(_) => "func",
            TypeKind::Pointer(_) => "ptr",
            TypeKind::Interface(_) => "interface",
            TypeKind::Chan(_) => "chan",
        }
    }
}

/// Immutable type metadata behind a [`Type`]
pub struct TypeInfo {
    /// Declaration identity of a named type; zero for structural types
    id: u64,
    name: Option<String>,
    kind: TypeKind,
    methods: Vec<MethodDesc>,
}

static NEXT_TYPE_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a host type descriptor
#[derive(Clone)]
pub struct Type(Arc<TypeInfo>);

impl Type {
    fn from_kind(kind: TypeKind) -> Self {
        Type(Arc::new(TypeInfo {
            id: 0,
            name: None,
            kind,
            methods: Vec::new(),
        }))
    }

    /// `bool`
    pub fn bool() -> Self {
        Self::from_kind(TypeKind::Bool)
    }

    /// `int`
    pub fn int() -> Self {
        Self::from_kind(TypeKind::Int(IntWidth::Word))
    }

    /// `int8`
    pub fn int8() -> Self {
        Self::from_kind(TypeKind::Int(IntWidth::W8))
    }

    /// `int16`
    pub fn int16() -> Self {
        Self::from_kind(TypeKind::Int(IntWidth::W16))
    }

    /// `int32`
    pub fn int32() -> Self {
        Self::from_kind(TypeKind::Int(IntWidth::W32))
    }

    /// `int64`
    pub fn int64() -> Self {
        Self::from_kind(TypeKind::Int(IntWidth::W64))
    }

    /// `uint`
    pub fn uint() -> Self {
        Self::from_kind(TypeKind::Uint(IntWidth::Word))
    }

    /// `uint8`
    pub fn uint8() -> Self {
        Self::from_kind(TypeKind::Uint(IntWidth::W8))
    }

    /// `uint16`
    pub fn uint16() -> Self {
        Self::from_kind(TypeKind::Uint(IntWidth::W16))
    }

    /// `uint32`
    pub fn uint32() -> Self {
        Self::from_kind(TypeKind::Uint(IntWidth::W32))
    }

    /// `uint64`
    pub fn uint64() -> Self {
        Self::from_kind(TypeKind::Uint(IntWidth::W64))
    }

    /// `float32`
    pub fn float32() -> Self {
        Self::from_kind(TypeKind::Float(FloatWidth::F32))
    }

    /// `float64`
    pub fn float64() -> Self {
        Self::from_kind(TypeKind::Float(FloatWidth::F64))
    }

    /// `complex64`
    pub fn complex64() -> Self {
        Self::from_kind(TypeKind::Complex(FloatWidth::F32))
    }

    /// `complex128`
    pub fn complex128() -> Self {
        Self::from_kind(TypeKind::Complex(FloatWidth::F64))
    }

    /// `string`
    pub fn string() -> Self {
        Self::from_kind(TypeKind::String)
    }

    /// `[]elem`
    pub fn slice(elem: Type) -> Self {
        Self::from_kind(TypeKind::Slice(elem))
    }

    /// `[len]elem`
    pub fn array(elem: Type, len: usize) -> Self {
        Self::from_kind(TypeKind::Array(elem, len))
    }

    /// `map[key]value`
    pub fn map(key: Type, value: Type) -> Self {
        Self::from_kind(TypeKind::Map(key, value))
    }

    /// `*elem`
    pub fn pointer(elem: Type) -> Self {
        Self::from_kind(TypeKind::Pointer(elem))
    }

    /// `chan elem`
    pub fn chan(elem: Type) -> Self {
        Self::from_kind(TypeKind::Chan(elem))
    }

    /// Function type with the given parameter and result types
    pub fn func(params: Vec<Type>, results: Vec<Type>) -> Self {
        Self::from_kind(TypeKind::Func(FnSig::new(params, results)))
    }

    /// Interface requiring the given method names
    pub fn interface<I, S>(methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_kind(TypeKind::Interface(InterfaceType {
            methods: methods.into_iter().map(Into::into).collect(),
        }))
    }

    /// The empty interface
    pub fn any() -> Self {
        Self::from_kind(TypeKind::Interface(InterfaceType::default()))
    }

    /// Anonymous record type
    pub fn record(fields: Vec<FieldDesc>) -> Self {
        Self::from_kind(TypeKind::Record(RecordType::new(fields)))
    }

    /// Start building a named type with the given underlying kind
    pub fn named(name: impl Into<String>, kind: TypeKind) -> TypeBuilder {
        TypeBuilder {
            name: name.into(),
            kind,
            methods: Vec::new(),
        }
    }

    /// Declared name, if this is a named type
    pub fn name(&self) -> Option<&str> {
        self.0.name.as_deref()
    }

    /// Underlying kind
    pub fn kind(&self) -> &TypeKind {
        &self.0.kind
    }

    /// Methods declared directly on this (named) type
    pub fn methods(&self) -> &[MethodDesc] {
        &self.0.methods
    }

    /// Element type of slices, arrays, maps (value), pointers, and channels
    pub fn elem(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Slice(elem)
            | TypeKind::Array(elem, _)
            | TypeKind::Pointer(elem)
            | TypeKind::Chan(elem)
            | TypeKind::Map(_, elem) => Some(elem),
            _ => None,
        }
    }

    /// Record layout, if this is a record type
    pub fn as_record(&self) -> Option<&RecordType> {
        match self.kind() {
            TypeKind::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Pointee type, if this is a pointer type
    pub fn as_pointer(&self) -> Option<&Type> {
        match self.kind() {
            TypeKind::Pointer(elem) => Some(elem),
            _ => None,
        }
    }

    /// Function signature, if this is a function type
    pub fn as_func(&self) -> Option<&FnSig> {
        match self.kind() {
            TypeKind::Func(sig) => Some(sig),
            _ => None,
        }
    }

    /// Whether values of this type may be nil
    pub fn is_nilable(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Slice(_)
                | TypeKind::Map(_, _)
                | TypeKind::Pointer(_)
                | TypeKind::Func(_)
                | TypeKind::Interface(_)
                | TypeKind::Chan(_)
        )
    }

    /// Whether this is an integer or floating point type
    pub fn is_numeric(&self) -> bool {
        matches!(
            self.kind(),
            TypeKind::Int(_) | TypeKind::Uint(_) | TypeKind::Float(_)
        )
    }

    /// Whether this is an interface type
    pub fn is_interface(&self) -> bool {
        matches!(self.kind(), TypeKind::Interface(_))
    }

    /// `*self`
    pub fn pointer_to(&self) -> Type {
        Type::pointer(self.clone())
    }

    /// Whether both handles point at the same descriptor
    pub fn ptr_eq(&self, other: &Type) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Whether a method of this name is callable on a value of this type
    ///
    /// Value types see their value-receiver methods; pointer types see every
    /// method declared on the pointee.
    pub fn has_method(&self, name: &str) -> bool {
        match self.kind() {
            TypeKind::Pointer(elem) => elem.methods().iter().any(|m| m.name == name),
            TypeKind::Interface(iface) => iface.methods.iter().any(|m| m == name),
            _ => self
                .methods()
                .iter()
                .any(|m| m.name == name && m.receiver == Receiver::Value),
        }
    }

    /// Whether values of this type satisfy the interface
    pub fn implements(&self, iface: &InterfaceType) -> bool {
        iface.methods.iter().all(|name| self.has_method(name))
    }

    /// Whether a value of this type can be converted to `dest`
    pub fn convertible_to(&self, dest: &Type) -> bool {
        if self == dest {
            return true;
        }
        match (self.kind(), dest.kind()) {
            (_, TypeKind::Interface(iface)) => self.implements(iface),
            (TypeKind::String, TypeKind::String) => true,
            (TypeKind::Pointer(from), TypeKind::Pointer(to)) => from.kind() == to.kind(),
            _ if self.is_numeric() && dest.is_numeric() => true,
            (from, to) => from == to,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        match (self.0.id, other.0.id) {
            (0, 0) => self.0.kind == other.0.kind,
            (a, b) => a == b,
        }
    }
}

impl Eq for Type {}

impl Hash for Type {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self.0.id {
            0 => {
                0u8.hash(state);
                self.0.kind.hash(state);
            }
            id => {
                1u8.hash(state);
                id.hash(state);
            }
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Type({})", self)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(name) = &self.0.name {
            return f.write_str(name);
        }
        match self.kind() {
            TypeKind::Bool => f.write_str("bool"),
            TypeKind::Int(w) => write!(f, "int{}", w.suffix()),
            TypeKind::Uint(w) => write!(f, "uint{}", w.suffix()),
            TypeKind::Float(FloatWidth::F32) => f.write_str("float32"),
            TypeKind::Float(FloatWidth::F64) => f.write_str("float64"),
            TypeKind::Complex(FloatWidth::F32) => f.write_str("complex64"),
            TypeKind::Complex(FloatWidth::F64) => f.write_str("complex128"),
            TypeKind::String => f.write_str("string"),
            TypeKind::Slice(elem) => write!(f, "[]{}", elem),
            TypeKind::Array(elem, len) => write!(f, "[{}]{}", len, elem),
            TypeKind::Map(key, value) => write!(f, "map[{}]{}", key, value),
            TypeKind::Pointer(elem) => write!(f, "*{}", elem),
            TypeKind::Chan(elem) => write!(f, "chan {}", elem),
            TypeKind::Func(sig) => write!(f, "func{}", sig),
            TypeKind::Interface(iface) if iface.is_empty() => f.write_str("any"),
            TypeKind::Interface(iface) => write!(f, "interface {{ {} }}", iface.methods.join("; ")),
            TypeKind::Record(record) => {
                f.write_str("struct {")?;
                for (i, field) in record.fields.iter().enumerate() {
                    let sep = if i == 0 { " " } else { "; " };
                    write!(f, "{}{} {}", sep, field.name, field.ty)?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// Builder for named types and their declared methods
pub struct TypeBuilder {
    name: String,
    kind: TypeKind,
    methods: Vec<MethodDesc>,
}

impl TypeBuilder {
    /// Declare a method on the type
    pub fn method(mut self, method: MethodDesc) -> Self {
        self.methods.retain(|m| m.name != method.name);
        self.methods.push(method);
        self
    }

    /// Finish the type
    ///
    /// Each call declares a new type, distinct from every other build even
    /// under the same name.
    pub fn build(self) -> Type {
        Type(Arc::new(TypeInfo {
            id: NEXT_TYPE_ID.fetch_add(1, Ordering::Relaxed),
            name: Some(self.name),
            kind: self.kind,
            methods: self.methods,
        }))
    }
}

impl From<TypeBuilder> for Type {
    fn from(builder: TypeBuilder) -> Self {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_structural_identity_for_unnamed_types() {
        assert_eq!(Type::slice(Type::string()), Type::slice(Type::string()));
        assert_ne!(Type::slice(Type::string()), Type::slice(Type::int()));
        assert_ne!(Type::array(Type::string(), 2), Type::array(Type::string(), 3));
    }

    #[test]
    fn test_named_types_are_nominal() {
        let names = Type::named("Names", TypeKind::Slice(Type::string())).build();
        assert_ne!(names, Type::slice(Type::string()));
        assert_eq!(names, names.clone());
        assert_ne!(
            names,
            Type::named("Names", TypeKind::Slice(Type::string())).build(),
            "a second declaration under the same name is a different type"
        );
        assert_eq!(names.pointer_to(), names.pointer_to());
        assert!(
            names.convertible_to(&Type::slice(Type::string())),
            "identical underlying types convert"
        );
    }

    #[test]
    fn test_display_renders_structure() {
        let ty = Type::map(Type::string(), Type::slice(Type::pointer(Type::int32())));
        assert_eq!(ty.to_string(), "map[string][]*int32");
        assert_eq!(Type::array(Type::uint8(), 4).to_string(), "[4]uint8");
        assert_eq!(Type::any().to_string(), "any");
        assert_eq!(
            Type::func(vec![Type::string(), Type::int()], vec![Type::bool()]).to_string(),
            "func(string, int) bool"
        );
    }

    #[test]
    fn test_numeric_conversions() {
        assert!(Type::float64().convertible_to(&Type::uint8()));
        assert!(Type::int().convertible_to(&Type::float32()));
        assert!(!Type::string().convertible_to(&Type::int()));
        assert!(!Type::complex128().convertible_to(&Type::float64()));
    }

    #[test]
    fn test_width_truncation() {
        assert_eq!(IntWidth::W8.wrap_signed(300), 44);
        assert_eq!(IntWidth::W8.wrap_signed(-129), 127);
        assert_eq!(IntWidth::W16.wrap_unsigned(70_000), 4_464);
        assert_eq!(FloatWidth::F32.round(0.1), 0.1f32 as f64);
    }
}
