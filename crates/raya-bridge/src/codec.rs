//! Struct codec
//!
//! Maps between the tagged fields of a record type and the string keys of a
//! table, for one tag namespace. Codecs are immutable once built and are
//! shared through [`CodecCache`], keyed by `(record type, tag name)`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{FieldDefault, Type, TypeKind};
use crate::value::Value;

/// A record field visible under a tag namespace
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Host field name
    pub name: String,
    /// External key (the tag string)
    pub key: String,
    /// Field type
    pub ty: Type,
    /// Declaration position in the record
    pub index: usize,
    /// Default applied when a decoded table omits the field
    pub default: Option<FieldDefault>,
}

/// Tag-driven mapping for one record type
#[derive(Debug)]
pub struct StructCodec {
    ty: Type,
    tag: String,
    fields: Vec<FieldDescriptor>,
    by_key: FxHashMap<String, usize>,
    by_name: FxHashMap<String, usize>,
}

impl StructCodec {
    /// Build a codec for a record type (or pointer to one)
    ///
    /// Private fields and fields without a key in `tag` are left out.
    pub fn new(ty: &Type, tag: &str) -> BridgeResult<Self> {
        let ty = match ty.kind() {
            TypeKind::Pointer(elem) => elem.clone(),
            _ => ty.clone(),
        };
        let record = ty
            .as_record()
            .ok_or_else(|| BridgeError::shape("struct", &ty))?;

        let mut fields = Vec::new();
        let mut by_key = FxHashMap::default();
        let mut by_name = FxHashMap::default();
        for (index, field) in record.fields.iter().enumerate() {
            if !field.exported {
                continue;
            }
            let key = match field.key_for(tag) {
                Some(key) => key.to_string(),
                None => continue,
            };
            let slot = fields.len();
            by_key.insert(key.clone(), slot);
            by_name.insert(field.name.clone(), slot);
            fields.push(FieldDescriptor {
                name: field.name.clone(),
                key,
                ty: field.ty.clone(),
                index,
                default: field.default.clone(),
            });
        }

        Ok(Self {
            ty,
            tag: tag.to_string(),
            fields,
            by_key,
            by_name,
        })
    }

    /// The record type this codec maps
    pub fn record_type(&self) -> &Type {
        &self.ty
    }

    /// The tag namespace this codec reads
    pub fn tag_name(&self) -> &str {
        &self.tag
    }

    /// Tagged fields in declaration order
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Field addressed by an external key
    pub fn field_for_tag(&self, key: &str) -> BridgeResult<&FieldDescriptor> {
        self.by_key
            .get(key)
            .map(|&slot| &self.fields[slot])
            .ok_or_else(|| BridgeError::field_not_found(&self.ty, key))
    }

    /// External key of a host field
    pub fn tag_for_field(&self, name: &str) -> BridgeResult<&str> {
        self.by_name
            .get(name)
            .map(|&slot| self.fields[slot].key.as_str())
            .ok_or_else(|| BridgeError::field_not_found(&self.ty, name))
    }

    /// Flatten a record (or pointer to one) into `(key, field value)` pairs
    pub fn struct_to_map(&self, value: &Value) -> BridgeResult<Vec<(String, Value)>> {
        let record = match value.kind() {
            TypeKind::Pointer(_) => value
                .elem()
                .ok_or_else(|| BridgeError::conversion("nil", &self.ty))?,
            _ => value.clone(),
        };
        if *record.ty() != self.ty {
            return Err(BridgeError::conversion(record.ty(), &self.ty));
        }
        self.fields
            .iter()
            .map(|field| Ok((field.key.clone(), record.field_at(field.index)?)))
            .collect()
    }

    /// Build a record from `(key, value)` pairs
    ///
    /// Values must already have their field's type. Untouched fields take
    /// their declared default, or the zero value.
    pub fn map_to_struct(&self, entries: Vec<(String, Value)>) -> BridgeResult<Value> {
        let record = Value::zero(&self.ty);
        let mut seen = vec![false; self.fields.len()];
        for (key, value) in entries {
            let slot = *self
                .by_key
                .get(&key)
                .ok_or_else(|| BridgeError::field_not_found(&self.ty, key.as_str()))?;
            let field = &self.fields[slot];
            record.set_field_at(field.index, value)?;
            seen[slot] = true;
        }
        for (field, _) in self.fields.iter().zip(&seen).filter(|(_, seen)| !**seen) {
            if let Some(default) = &field.default {
                record.set_field_at(field.index, Value::from_default(&field.ty, default)?)?;
            }
        }
        Ok(record)
    }
}

// ============================================================================
// Cache
// ============================================================================

static GLOBAL: Lazy<Arc<CodecCache>> = Lazy::new(|| Arc::new(CodecCache::new()));

/// Thread-safe cache of struct codecs keyed by `(record type, tag name)`
pub struct CodecCache {
    codecs: RwLock<FxHashMap<(Type, String), Arc<StructCodec>>>,
    builds: AtomicUsize,
}

impl CodecCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            codecs: RwLock::new(FxHashMap::default()),
            builds: AtomicUsize::new(0),
        }
    }

    /// The process-wide cache
    pub fn global() -> Arc<CodecCache> {
        GLOBAL.clone()
    }

    /// Codec for `(ty, tag)`, building it on first use
    pub fn get(&self, ty: &Type, tag: &str) -> BridgeResult<Arc<StructCodec>> {
        let key = (ty.clone(), tag.to_string());
        if let Some(codec) = self.codecs.read().get(&key) {
            return Ok(codec.clone());
        }

        let mut codecs = self.codecs.write();
        // Another thread may have built it while we waited for the lock
        if let Some(codec) = codecs.get(&key) {
            return Ok(codec.clone());
        }
        let codec = Arc::new(StructCodec::new(ty, tag)?);
        self.builds.fetch_add(1, Ordering::Relaxed);
        log::debug!(
            "built struct codec for {} under tag '{}' ({} fields)",
            ty,
            tag,
            codec.fields.len()
        );
        codecs.insert(key, codec.clone());
        Ok(codec)
    }

    /// Number of cached codecs
    pub fn len(&self) -> usize {
        self.codecs.read().len()
    }

    /// Whether no codec has been cached
    pub fn is_empty(&self) -> bool {
        self.codecs.read().is_empty()
    }

    /// Number of codecs built over the cache's lifetime
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Default for CodecCache {
    fn default() -> Self {
        Self::new()
    }
}
