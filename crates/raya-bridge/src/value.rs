//! Typed host values
//!
//! A [`Value`] pairs a [`Type`] with its data. Composite data (slices,
//! arrays, maps, records) lives in shared cells: cloning a `Value` aliases
//! the same storage, which is what lets proxies mutate host data in place.
//! Setters follow host assignment semantics and copy records and fixed
//! arrays on the way in (see [`Value::assign_copy`]).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{FieldDefault, HostFnBody, Type, TypeKind};

/// Shared, interior-mutable storage for composite data
pub type Shared<T> = Rc<RefCell<T>>;

fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// Hashable form of a scalar map key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MapKey {
    /// Boolean key
    Bool(bool),
    /// Signed integer key
    Int(i64),
    /// Unsigned integer key
    Uint(u64),
    /// Float key, by normalized bit pattern
    Float(u64),
    /// String key
    Str(String),
}

impl MapKey {
    /// Derive the key for a host value
    pub fn from_value(value: &Value) -> BridgeResult<Self> {
        match &value.data {
            Data::Bool(b) => Ok(MapKey::Bool(*b)),
            Data::Int(i) => Ok(MapKey::Int(*i)),
            Data::Uint(u) => Ok(MapKey::Uint(*u)),
            Data::Float(f) => Ok(MapKey::Float(normalize_float(*f).to_bits())),
            Data::Str(s) => Ok(MapKey::Str(s.clone())),
            Data::Interface(inner) => MapKey::from_value(inner),
            _ => Err(BridgeError::unsupported(format!("map key of type {}", value.ty))),
        }
    }
}

fn normalize_float(f: f64) -> f64 {
    if f == 0.0 {
        0.0
    } else {
        f
    }
}

type MapData = FxHashMap<MapKey, (Value, Value)>;

#[derive(Clone)]
pub(crate) enum Data {
    Nil,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    Complex(f64, f64),
    Str(String),
    Slice(Shared<Vec<Value>>),
    Array(Shared<Vec<Value>>),
    Map(Shared<MapData>),
    Record(Shared<Vec<Value>>),
    Func(Rc<HostFnBody>),
    Pointer(Shared<Value>),
    Interface(Box<Value>),
    Chan(Shared<Vec<Value>>),
}

/// A host value with its full type
#[derive(Clone)]
pub struct Value {
    ty: Type,
    pub(crate) data: Data,
}

impl Value {
    fn new(ty: Type, data: Data) -> Self {
        Self { ty, data }
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    /// The nil value of a nilable type
    pub fn nil(ty: &Type) -> BridgeResult<Self> {
        if ty.is_nilable() {
            Ok(Self::new(ty.clone(), Data::Nil))
        } else {
            Err(BridgeError::conversion("nil", ty))
        }
    }

    /// The zero value of a type
    pub fn zero(ty: &Type) -> Self {
        let data = match ty.kind() {
            TypeKind::Bool => Data::Bool(false),
            TypeKind::Int(_) => Data::Int(0),
            TypeKind::Uint(_) => Data::Uint(0),
            TypeKind::Float(_) => Data::Float(0.0),
            TypeKind::Complex(_) => Data::Complex(0.0, 0.0),
            TypeKind::String => Data::Str(String::new()),
            TypeKind::Array(elem, len) => {
                Data::Array(shared((0..*len).map(|_| Value::zero(elem)).collect()))
            }
            TypeKind::Record(record) => Data::Record(shared(
                record.fields.iter().map(|f| Value::zero(&f.ty)).collect(),
            )),
            TypeKind::Slice(_)
            | TypeKind::Map(_, _)
            | TypeKind::Func(_)
            | TypeKind::Pointer(_)
            | TypeKind::Interface(_)
            | TypeKind::Chan(_) => Data::Nil,
        };
        Self::new(ty.clone(), data)
    }

    /// A boolean of the given boolean type
    pub fn from_bool(ty: &Type, b: bool) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Bool => Ok(Self::new(ty.clone(), Data::Bool(b))),
            _ => Err(BridgeError::conversion("bool", ty)),
        }
    }

    /// A number of the given numeric type, narrowed without range checks
    pub fn from_f64(ty: &Type, n: f64) -> BridgeResult<Self> {
        let data = match ty.kind() {
            TypeKind::Int(w) => Data::Int(w.wrap_signed(n as i64)),
            TypeKind::Uint(w) => Data::Uint(w.wrap_unsigned(float_to_u64(n))),
            TypeKind::Float(w) => Data::Float(w.round(n)),
            _ => return Err(BridgeError::conversion("float64", ty)),
        };
        Ok(Self::new(ty.clone(), data))
    }

    /// A signed integer of the given numeric type
    pub fn from_i64(ty: &Type, i: i64) -> BridgeResult<Self> {
        let data = match ty.kind() {
            TypeKind::Int(w) => Data::Int(w.wrap_signed(i)),
            TypeKind::Uint(w) => Data::Uint(w.wrap_unsigned(i as u64)),
            TypeKind::Float(w) => Data::Float(w.round(i as f64)),
            _ => return Err(BridgeError::conversion("int64", ty)),
        };
        Ok(Self::new(ty.clone(), data))
    }

    /// An unsigned integer of the given numeric type
    pub fn from_u64(ty: &Type, u: u64) -> BridgeResult<Self> {
        let data = match ty.kind() {
            TypeKind::Int(w) => Data::Int(w.wrap_signed(u as i64)),
            TypeKind::Uint(w) => Data::Uint(w.wrap_unsigned(u)),
            TypeKind::Float(w) => Data::Float(w.round(u as f64)),
            _ => return Err(BridgeError::conversion("uint64", ty)),
        };
        Ok(Self::new(ty.clone(), data))
    }

    /// A string of the given string type
    pub fn from_string(ty: &Type, s: impl Into<String>) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::String => Ok(Self::new(ty.clone(), Data::Str(s.into()))),
            _ => Err(BridgeError::conversion("string", ty)),
        }
    }

    /// A complex number of the given complex type
    pub fn complex(ty: &Type, re: f64, im: f64) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Complex(w) => Ok(Self::new(ty.clone(), Data::Complex(w.round(re), w.round(im)))),
            _ => Err(BridgeError::conversion("complex128", ty)),
        }
    }

    /// A slice of the given slice type
    pub fn slice_of(ty: &Type, items: Vec<Value>) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Slice(elem) => {
                let items = assign_all(items, elem)?;
                Ok(Self::new(ty.clone(), Data::Slice(shared(items))))
            }
            _ => Err(BridgeError::conversion("[]", ty)),
        }
    }

    /// A fixed-size array of the given array type
    pub fn array_of(ty: &Type, items: Vec<Value>) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Array(elem, len) => {
                if items.len() != *len {
                    return Err(BridgeError::SizeMismatch {
                        ty: ty.to_string(),
                        expected: *len,
                        found: items.len(),
                    });
                }
                let items = assign_all(items, elem)?;
                Ok(Self::new(ty.clone(), Data::Array(shared(items))))
            }
            _ => Err(BridgeError::conversion("array", ty)),
        }
    }

    /// A map of the given map type
    pub fn map_of(ty: &Type, entries: Vec<(Value, Value)>) -> BridgeResult<Self> {
        if !matches!(ty.kind(), TypeKind::Map(_, _)) {
            return Err(BridgeError::conversion("map", ty));
        }
        let map = Self::new(ty.clone(), Data::Map(shared(FxHashMap::default())));
        for (key, value) in entries {
            map.map_insert(key, value)?;
        }
        Ok(map)
    }

    /// A record of the given record type, fields in declaration order
    pub fn record_of(ty: &Type, fields: Vec<Value>) -> BridgeResult<Self> {
        let record = ty
            .as_record()
            .ok_or_else(|| BridgeError::conversion("struct", ty))?;
        if fields.len() != record.len() {
            return Err(BridgeError::SizeMismatch {
                ty: ty.to_string(),
                expected: record.len(),
                found: fields.len(),
            });
        }
        let fields = fields
            .into_iter()
            .zip(&record.fields)
            .map(|(value, field)| value.assign_to(&field.ty))
            .collect::<BridgeResult<Vec<_>>>()?;
        Ok(Self::new(ty.clone(), Data::Record(shared(fields))))
    }

    /// A host function of the given function type
    pub fn func<F>(ty: &Type, body: F) -> BridgeResult<Self>
    where
        F: Fn(&[Value]) -> BridgeResult<Vec<Value>> + 'static,
    {
        match ty.kind() {
            TypeKind::Func(_) => Ok(Self::new(ty.clone(), Data::Func(Rc::new(body)))),
            _ => Err(BridgeError::conversion("func", ty)),
        }
    }

    /// An empty buffered channel of the given channel type
    pub fn chan(ty: &Type) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Chan(_) => Ok(Self::new(ty.clone(), Data::Chan(shared(Vec::new())))),
            _ => Err(BridgeError::conversion("chan", ty)),
        }
    }

    /// A fresh pointer holding `value`
    ///
    /// Composite pointees keep sharing their storage with `value`.
    pub fn pointer_to(value: Value) -> Self {
        Self::new(value.ty.pointer_to(), Data::Pointer(shared(value)))
    }

    /// Box a value into an interface type
    pub fn interface(ty: &Type, value: Value) -> BridgeResult<Self> {
        match ty.kind() {
            TypeKind::Interface(iface) => {
                let inner = if value.ty.is_interface() {
                    match value.data {
                        Data::Interface(inner) => *inner,
                        _ => return Ok(Self::new(ty.clone(), Data::Nil)),
                    }
                } else {
                    value
                };
                if !inner.ty.implements(iface) {
                    return Err(BridgeError::conversion(&inner.ty, ty));
                }
                Ok(Self::new(ty.clone(), Data::Interface(Box::new(inner))))
            }
            _ => Err(BridgeError::conversion(&value.ty, ty)),
        }
    }

    /// The value of a field default, converted to the field type
    pub fn from_default(ty: &Type, default: &FieldDefault) -> BridgeResult<Self> {
        match default {
            FieldDefault::Bool(b) => Self::from_bool(ty, *b),
            FieldDefault::Number(n) => Self::from_f64(ty, *n),
            FieldDefault::Str(s) => Self::from_string(ty, s.clone()),
        }
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// The value's type
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// The value's underlying kind
    pub fn kind(&self) -> &TypeKind {
        self.ty.kind()
    }

    /// Whether this is a nil slice, map, pointer, func, interface, or chan
    pub fn is_nil(&self) -> bool {
        matches!(self.data, Data::Nil)
    }

    /// Whether the value lives in shared storage and can have its address
    /// taken without copying
    pub fn is_addressable(&self) -> bool {
        matches!(
            self.data,
            Data::Slice(_) | Data::Array(_) | Data::Map(_) | Data::Record(_)
        )
    }

    /// Whether two values alias the same storage
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (&self.data, &other.data) {
            (Data::Slice(a), Data::Slice(b))
            | (Data::Array(a), Data::Array(b))
            | (Data::Record(a), Data::Record(b))
            | (Data::Chan(a), Data::Chan(b)) => Rc::ptr_eq(a, b),
            (Data::Map(a), Data::Map(b)) => Rc::ptr_eq(a, b),
            (Data::Pointer(a), Data::Pointer(b)) => Rc::ptr_eq(a, b),
            (Data::Func(a), Data::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match &self.data {
            Data::Bool(b) => Some(*b),
            Data::Interface(inner) => inner.as_bool(),
            _ => None,
        }
    }

    /// Signed integer payload (any integer kind)
    pub fn as_i64(&self) -> Option<i64> {
        match &self.data {
            Data::Int(i) => Some(*i),
            Data::Uint(u) => Some(*u as i64),
            Data::Interface(inner) => inner.as_i64(),
            _ => None,
        }
    }

    /// Unsigned integer payload (any integer kind)
    pub fn as_u64(&self) -> Option<u64> {
        match &self.data {
            Data::Uint(u) => Some(*u),
            Data::Int(i) => Some(*i as u64),
            Data::Interface(inner) => inner.as_u64(),
            _ => None,
        }
    }

    /// Numeric payload widened to a double (any numeric kind)
    pub fn as_f64(&self) -> Option<f64> {
        match &self.data {
            Data::Float(f) => Some(*f),
            Data::Int(i) => Some(*i as f64),
            Data::Uint(u) => Some(*u as f64),
            Data::Interface(inner) => inner.as_f64(),
            _ => None,
        }
    }

    /// String payload
    pub fn as_str(&self) -> Option<&str> {
        match &self.data {
            Data::Str(s) => Some(s.as_str()),
            Data::Interface(inner) => inner.as_str(),
            _ => None,
        }
    }

    /// The value held by a pointer or interface; `None` when nil or not
    /// indirect
    pub fn elem(&self) -> Option<Value> {
        match &self.data {
            Data::Pointer(cell) => Some(cell.borrow().clone()),
            Data::Interface(inner) => Some((**inner).clone()),
            _ => None,
        }
    }

    /// Pointer to this value
    ///
    /// Addressable values keep sharing storage with the pointer; for anything
    /// else this returns `None`.
    pub fn addr(&self) -> Option<Value> {
        if self.is_addressable() {
            Some(Value::pointer_to(self.clone()))
        } else {
            None
        }
    }

    /// Store through a pointer
    pub fn set_elem(&self, value: Value) -> BridgeResult<()> {
        match (&self.data, self.ty.kind()) {
            (Data::Pointer(cell), TypeKind::Pointer(elem)) => {
                let value = value.assign_to(elem)?;
                *cell.borrow_mut() = value;
                Ok(())
            }
            _ => Err(BridgeError::conversion(&self.ty, "pointer")),
        }
    }

    // ========================================================================
    // Sequences
    // ========================================================================

    /// Element, entry, or field count; zero for nil composites
    pub fn len(&self) -> usize {
        match &self.data {
            Data::Slice(items) | Data::Array(items) | Data::Record(items) | Data::Chan(items) => {
                items.borrow().len()
            }
            Data::Map(map) => map.borrow().len(),
            Data::Str(s) => s.len(),
            Data::Interface(inner) => inner.len(),
            _ => 0,
        }
    }

    /// Whether [`len`](Self::len) is zero
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at a 0-based position of a slice or array
    pub fn index(&self, i: usize) -> BridgeResult<Value> {
        match &self.data {
            Data::Slice(items) | Data::Array(items) => {
                let items = items.borrow();
                items.get(i).cloned().ok_or(BridgeError::IndexOutOfRange {
                    index: i as i64 + 1,
                    len: items.len(),
                })
            }
            Data::Nil if matches!(self.kind(), TypeKind::Slice(_)) => {
                Err(BridgeError::IndexOutOfRange {
                    index: i as i64 + 1,
                    len: 0,
                })
            }
            _ => Err(BridgeError::shape("slice or array", &self.ty)),
        }
    }

    /// Assign the element at a 0-based position of a slice or array
    pub fn set_index(&self, i: usize, value: Value) -> BridgeResult<()> {
        let elem = self
            .ty
            .elem()
            .ok_or_else(|| BridgeError::shape("slice or array", &self.ty))?;
        match &self.data {
            Data::Slice(items) | Data::Array(items) => {
                let value = value.assign_to(elem)?;
                let mut items = items.borrow_mut();
                let len = items.len();
                let slot = items.get_mut(i).ok_or(BridgeError::IndexOutOfRange {
                    index: i as i64 + 1,
                    len,
                })?;
                *slot = value;
                Ok(())
            }
            _ => Err(BridgeError::shape("slice or array", &self.ty)),
        }
    }

    /// Snapshot of the elements of a slice or array
    pub fn to_vec(&self) -> Vec<Value> {
        match &self.data {
            Data::Slice(items) | Data::Array(items) => items.borrow().clone(),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // Maps
    // ========================================================================

    /// Look up a map entry
    pub fn map_get(&self, key: &Value) -> BridgeResult<Option<Value>> {
        match &self.data {
            Data::Map(map) => {
                let key = MapKey::from_value(key)?;
                Ok(map.borrow().get(&key).map(|(_, v)| v.clone()))
            }
            Data::Nil if matches!(self.kind(), TypeKind::Map(_, _)) => Ok(None),
            _ => Err(BridgeError::shape("map", &self.ty)),
        }
    }

    /// Insert or replace a map entry
    pub fn map_insert(&self, key: Value, value: Value) -> BridgeResult<()> {
        let (key_ty, value_ty) = match self.kind() {
            TypeKind::Map(k, v) => (k, v),
            _ => return Err(BridgeError::shape("map", &self.ty)),
        };
        match &self.data {
            Data::Map(map) => {
                let key = key.assign_to(key_ty)?;
                let value = value.assign_to(value_ty)?;
                let hashed = MapKey::from_value(&key)?;
                map.borrow_mut().insert(hashed, (key, value));
                Ok(())
            }
            _ => Err(BridgeError::runtime(format!(
                "assignment to entry in nil map of type {}",
                self.ty
            ))),
        }
    }

    /// Remove a map entry, returning its value
    pub fn map_remove(&self, key: &Value) -> BridgeResult<Option<Value>> {
        match &self.data {
            Data::Map(map) => {
                let key = MapKey::from_value(key)?;
                Ok(map.borrow_mut().remove(&key).map(|(_, v)| v))
            }
            Data::Nil if matches!(self.kind(), TypeKind::Map(_, _)) => Ok(None),
            _ => Err(BridgeError::shape("map", &self.ty)),
        }
    }

    /// Snapshot of the entries of a map, in unspecified order
    pub fn map_entries(&self) -> Vec<(Value, Value)> {
        match &self.data {
            Data::Map(map) => map.borrow().values().cloned().collect(),
            _ => Vec::new(),
        }
    }

    // ========================================================================
    // Records
    // ========================================================================

    /// Field at a declaration position
    pub fn field_at(&self, i: usize) -> BridgeResult<Value> {
        match &self.data {
            Data::Record(fields) => fields.borrow().get(i).cloned().ok_or_else(|| {
                BridgeError::field_not_found(&self.ty, format!("#{}", i))
            }),
            _ => Err(BridgeError::shape("struct", &self.ty)),
        }
    }

    /// Field by host name
    pub fn field(&self, name: &str) -> BridgeResult<Value> {
        let i = self.field_position(name)?;
        self.field_at(i)
    }

    /// Assign the field at a declaration position
    pub fn set_field_at(&self, i: usize, value: Value) -> BridgeResult<()> {
        let record = self
            .ty
            .as_record()
            .ok_or_else(|| BridgeError::shape("struct", &self.ty))?;
        let field = record
            .fields
            .get(i)
            .ok_or_else(|| BridgeError::field_not_found(&self.ty, format!("#{}", i)))?;
        match &self.data {
            Data::Record(fields) => {
                let value = value.assign_to(&field.ty)?;
                fields.borrow_mut()[i] = value;
                Ok(())
            }
            _ => Err(BridgeError::shape("struct", &self.ty)),
        }
    }

    /// Assign a field by host name
    pub fn set_field(&self, name: &str, value: Value) -> BridgeResult<()> {
        let i = self.field_position(name)?;
        self.set_field_at(i, value)
    }

    fn field_position(&self, name: &str) -> BridgeResult<usize> {
        self.ty
            .as_record()
            .ok_or_else(|| BridgeError::shape("struct", &self.ty))?
            .field_index(name)
            .ok_or_else(|| BridgeError::field_not_found(&self.ty, name))
    }

    // ========================================================================
    // Functions
    // ========================================================================

    /// Call a host function value
    pub fn call(&self, args: &[Value]) -> BridgeResult<Vec<Value>> {
        let sig = self
            .ty
            .as_func()
            .ok_or_else(|| BridgeError::shape("func", &self.ty))?;
        if args.len() != sig.arity() {
            return Err(BridgeError::ArityMismatch {
                name: self.ty.to_string(),
                expected: sig.arity(),
                got: args.len(),
            });
        }
        match &self.data {
            Data::Func(body) => body(args),
            _ => Err(BridgeError::runtime(format!("call of nil function {}", self.ty))),
        }
    }

    // ========================================================================
    // Assignment and conversion
    // ========================================================================

    /// Copy with host assignment semantics
    ///
    /// Records and fixed arrays are copied element by element; slices, maps,
    /// pointers, and functions keep aliasing their storage.
    pub fn assign_copy(&self) -> Value {
        match &self.data {
            Data::Record(fields) => Self::new(
                self.ty.clone(),
                Data::Record(shared(fields.borrow().iter().map(Value::assign_copy).collect())),
            ),
            Data::Array(items) => Self::new(
                self.ty.clone(),
                Data::Array(shared(items.borrow().iter().map(Value::assign_copy).collect())),
            ),
            _ => self.clone(),
        }
    }

    /// Prepare this value for storage in a slot of type `dest`
    ///
    /// Identical types are copied in and interface slots box the value.
    pub fn assign_to(self, dest: &Type) -> BridgeResult<Value> {
        if self.ty == *dest {
            return Ok(self.assign_copy());
        }
        if dest.is_interface() {
            return Value::interface(dest, self.assign_copy());
        }
        Err(BridgeError::conversion(&self.ty, dest))
    }

    /// Convert to another type following host conversion rules
    ///
    /// Numeric kinds convert with narrowing, string kinds retype, values
    /// with identical underlying types retype while sharing storage, and any
    /// value converts to an interface it implements.
    pub fn convert(&self, dest: &Type) -> BridgeResult<Value> {
        if self.ty == *dest {
            return Ok(self.clone());
        }
        if !self.ty.convertible_to(dest) {
            return Err(BridgeError::conversion(&self.ty, dest));
        }
        if dest.is_interface() {
            return Value::interface(dest, self.clone());
        }
        match &self.data {
            Data::Int(i) => Value::from_i64(dest, *i),
            Data::Uint(u) => Value::from_u64(dest, *u),
            Data::Float(f) => Value::from_f64(dest, *f),
            _ => Ok(Self::new(dest.clone(), self.data.clone())),
        }
    }
}

fn assign_all(items: Vec<Value>, elem: &Type) -> BridgeResult<Vec<Value>> {
    items.into_iter().map(|v| v.assign_to(elem)).collect()
}

fn float_to_u64(n: f64) -> u64 {
    if n < 0.0 {
        (n as i64) as u64
    } else {
        n as u64
    }
}

// ============================================================================
// Conversions from Rust primitives
// ============================================================================

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(Type::bool(), Data::Bool(b))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::new(Type::int32(), Data::Int(i as i64))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::new(Type::int64(), Data::Int(i))
    }
}

impl From<u32> for Value {
    fn from(u: u32) -> Self {
        Value::new(Type::uint32(), Data::Uint(u as u64))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::new(Type::uint64(), Data::Uint(u))
    }
}

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::new(Type::float32(), Data::Float(f as f64))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::new(Type::float64(), Data::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(Type::string(), Data::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(Type::string(), Data::Str(s))
    }
}

/// Structural equality: same type and equal contents, looking through
/// shared storage. Functions compare by identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.data, &other.data) {
            (Data::Nil, Data::Nil) => true,
            (Data::Bool(a), Data::Bool(b)) => a == b,
            (Data::Int(a), Data::Int(b)) => a == b,
            (Data::Uint(a), Data::Uint(b)) => a == b,
            (Data::Float(a), Data::Float(b)) => a == b,
            (Data::Complex(ar, ai), Data::Complex(br, bi)) => ar == br && ai == bi,
            (Data::Str(a), Data::Str(b)) => a == b,
            (Data::Slice(a), Data::Slice(b))
            | (Data::Array(a), Data::Array(b))
            | (Data::Record(a), Data::Record(b))
            | (Data::Chan(a), Data::Chan(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Data::Map(a), Data::Map(b)) => {
                Rc::ptr_eq(a, b) || {
                    let (a, b) = (a.borrow(), b.borrow());
                    a.len() == b.len()
                        && a.iter()
                            .all(|(k, (_, v))| b.get(k).map(|(_, w)| v == w).unwrap_or(false))
                }
            }
            (Data::Pointer(a), Data::Pointer(b)) => Rc::ptr_eq(a, b) || *a.borrow() == *b.borrow(),
            (Data::Interface(a), Data::Interface(b)) => a == b,
            (Data::Func(a), Data::Func(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.ty, self)
    }
}

/// Renders like the host's default formatting verb: `[a b]`, `{a b}`,
/// `map[k:v]`, `&{...}`, `<nil>`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Data::Nil => f.write_str("<nil>"),
            Data::Bool(b) => write!(f, "{}", b),
            Data::Int(i) => write!(f, "{}", i),
            Data::Uint(u) => write!(f, "{}", u),
            Data::Float(x) => f.write_str(&crate::convert::format_number(*x)),
            Data::Complex(re, im) => write!(f, "({}{:+}i)", re, im),
            Data::Str(s) => f.write_str(s),
            Data::Slice(items) | Data::Array(items) | Data::Chan(items) => {
                write_list(f, "[", &items.borrow(), "]")
            }
            Data::Record(fields) => write_list(f, "{", &fields.borrow(), "}"),
            Data::Map(map) => {
                let mut entries: Vec<String> = map
                    .borrow()
                    .values()
                    .map(|(k, v)| format!("{}:{}", k, v))
                    .collect();
                entries.sort();
                write!(f, "map[{}]", entries.join(" "))
            }
            Data::Pointer(cell) => {
                let inner = cell.borrow();
                if inner.is_addressable() {
                    write!(f, "&{}", inner)
                } else {
                    write!(f, "{:p}", Rc::as_ptr(cell))
                }
            }
            Data::Interface(inner) => write!(f, "{}", inner),
            Data::Func(body) => write!(f, "{:p}", Rc::as_ptr(body) as *const ()),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, open: &str, items: &[Value], close: &str) -> fmt::Result {
    f.write_str(open)?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(" ")?;
        }
        write!(f, "{}", item)?;
    }
    f.write_str(close)
}
