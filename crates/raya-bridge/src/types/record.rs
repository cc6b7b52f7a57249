//! Declarative record layouts
//!
//! Each record field carries its host name, its type, and one external key
//! per tag namespace. A namespace selects which naming convention governs
//! the mapping between fields and table keys, so one record can be exposed
//! under several independent conventions.

use std::hash::{Hash, Hasher};

use super::ty::Type;

/// Scalar default applied to a field missing from a decoded table
#[derive(Debug, Clone)]
pub enum FieldDefault {
    /// Boolean default
    Bool(bool),
    /// Numeric default (converted to the field's numeric type)
    Number(f64),
    /// String default
    Str(String),
}

impl PartialEq for FieldDefault {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (FieldDefault::Bool(a), FieldDefault::Bool(b)) => a == b,
            (FieldDefault::Number(a), FieldDefault::Number(b)) => a.to_bits() == b.to_bits(),
            (FieldDefault::Str(a), FieldDefault::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for FieldDefault {}

impl Hash for FieldDefault {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            FieldDefault::Bool(b) => (0u8, b).hash(state),
            FieldDefault::Number(n) => (1u8, n.to_bits()).hash(state),
            FieldDefault::Str(s) => (2u8, s).hash(state),
        }
    }
}

/// A single record field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldDesc {
    /// Host field name
    pub name: String,
    /// Field type
    pub ty: Type,
    /// `(namespace, tag)` pairs, e.g. `("script", "name,omitempty")`
    pub tags: Vec<(String, String)>,
    /// Whether script code may see the field by name through a proxy
    pub exported: bool,
    /// Default used when a decoded table omits the field
    pub default: Option<FieldDefault>,
}

impl FieldDesc {
    /// Create an exported field with no tags
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            tags: Vec::new(),
            exported: true,
            default: None,
        }
    }

    /// Attach a tag in the given namespace
    pub fn tag(mut self, namespace: impl Into<String>, tag: impl Into<String>) -> Self {
        let namespace = namespace.into();
        self.tags.retain(|(ns, _)| *ns != namespace);
        self.tags.push((namespace, tag.into()));
        self
    }

    /// Hide the field from proxy field access
    pub fn private(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Set the default applied when a decoded table omits the field
    pub fn with_default(mut self, default: FieldDefault) -> Self {
        self.default = Some(default);
        self
    }

    /// Raw tag string for a namespace
    pub fn tag_for(&self, namespace: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, tag)| tag.as_str())
    }

    /// External key for a namespace
    ///
    /// The key is the tag text before the first comma. A tag of `-` hides the
    /// field; an empty key falls back to the field name.
    pub fn key_for(&self, namespace: &str) -> Option<&str> {
        let tag = self.tag_for(namespace)?;
        let key = tag.split(',').next().unwrap_or("");
        match key {
            "-" => None,
            "" => Some(self.name.as_str()),
            key => Some(key),
        }
    }
}

/// Record layout
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RecordType {
    /// Fields in declaration order
    pub fields: Vec<FieldDesc>,
}

impl RecordType {
    /// Create a record layout
    pub fn new(fields: Vec<FieldDesc>) -> Self {
        Self { fields }
    }

    /// Position of a field by host name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Field by host name
    pub fn field(&self, name: &str) -> Option<&FieldDesc> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Number of fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
