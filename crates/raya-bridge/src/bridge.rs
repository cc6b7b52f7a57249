//! Bridge facade
//!
//! [`Bridge`] owns the configuration and the two caches and exposes every
//! conversion as a method. It is cheap to clone; clones share the caches.

use std::sync::Arc;

use crate::codec::CodecCache;
use crate::config::BridgeConfig;
use crate::deep;
use crate::error::BridgeResult;
use crate::methodset::MethodSetCache;
use crate::proxy;
use crate::script::{ScriptValue, TableRef};
use crate::types::Type;
use crate::value::Value;

/// Entry point for host/script value conversion
///
/// # Example
///
/// ```ignore
/// let bridge = Bridge::default();
/// let names = Value::slice_of(&Type::slice(Type::string()), vec!["foo".into()])?;
///
/// // Copy out
/// let table = bridge.native_to_script(&names, None)?;
///
/// // Or share by reference
/// let handle = bridge.wrap(&names)?;
/// handle.set_index(1.0.into(), "bar".into())?;
/// assert_eq!(names.index(0)?.as_str(), Some("bar"));
/// ```
#[derive(Clone)]
pub struct Bridge {
    config: Arc<BridgeConfig>,
    methods: Arc<MethodSetCache>,
    codecs: Arc<CodecCache>,
}

impl Bridge {
    /// Create a bridge backed by the process-wide caches
    pub fn new(config: BridgeConfig) -> Self {
        Self::with_caches(config, MethodSetCache::global(), CodecCache::global())
    }

    /// Create a bridge with its own caches
    pub fn with_caches(
        config: BridgeConfig,
        methods: Arc<MethodSetCache>,
        codecs: Arc<CodecCache>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            methods,
            codecs,
        }
    }

    /// Create a bridge with fresh private caches
    pub fn isolated(config: BridgeConfig) -> Self {
        Self::with_caches(
            config,
            Arc::new(MethodSetCache::new()),
            Arc::new(CodecCache::new()),
        )
    }

    /// Active configuration
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Method-set cache used by this bridge
    pub fn methods(&self) -> &Arc<MethodSetCache> {
        &self.methods
    }

    /// Struct-codec cache used by this bridge
    pub fn codecs(&self) -> &Arc<CodecCache> {
        &self.codecs
    }

    fn tag<'a>(&'a self, tag: Option<&'a str>) -> &'a str {
        tag.unwrap_or(&self.config.tag_name)
    }

    // ========================================================================
    // Deep conversion
    // ========================================================================

    /// Copy a host value into plain script data
    ///
    /// Records are keyed by their field tags in `tag` (or the configured
    /// default namespace).
    pub fn native_to_script(&self, value: &Value, tag: Option<&str>) -> BridgeResult<ScriptValue> {
        deep::native_to_script(self, value, self.tag(tag))
    }

    /// Decode a script value into a fresh host value of type `dest`
    pub fn script_to_native(
        &self,
        script: &ScriptValue,
        dest: &Type,
        tag: Option<&str>,
    ) -> BridgeResult<Value> {
        deep::script_to_native(self, script, dest, self.tag(tag))
    }

    /// Copy a record (or pointer to one) into a table keyed by field tags
    pub fn record_to_table(&self, value: &Value, tag: Option<&str>) -> BridgeResult<TableRef> {
        deep::record_to_table(self, value, self.tag(tag))
    }

    /// Decode a string-keyed table into a record of type `dest` (or a
    /// pointer to a fresh record when `dest` is a pointer type)
    pub fn table_to_record(
        &self,
        table: &TableRef,
        dest: &Type,
        tag: Option<&str>,
    ) -> BridgeResult<Value> {
        deep::table_to_record(self, table, dest, self.tag(tag))
    }

    // ========================================================================
    // Proxying
    // ========================================================================

    /// Expose a host value by reference
    ///
    /// Scalars are copied; records, slices, arrays, and maps become handles;
    /// functions become callable thunks.
    pub fn wrap(&self, value: &Value) -> BridgeResult<ScriptValue> {
        proxy::wrap(self, value)
    }

    /// Convert `value` to `ty`, then wrap it
    pub fn wrap_as(&self, value: &Value, ty: &Type) -> BridgeResult<ScriptValue> {
        proxy::wrap_as(self, value, ty)
    }

    /// Resolve a handle or scalar against `dest` without deep decoding
    pub fn unwrap(&self, script: &ScriptValue, dest: &Type) -> BridgeResult<Value> {
        proxy::unwrap(script, dest)
    }

    /// Table of callables bound to `value`, one per method in its method set
    pub fn method_table(&self, value: &Value) -> TableRef {
        proxy::method_table(self, value)
    }

    /// Call a script function with host arguments
    ///
    /// Arguments are wrapped; results are checked against `result_types`
    /// and decoded in order.
    pub fn call_script(
        &self,
        func: &ScriptValue,
        args: &[Value],
        result_types: &[Type],
    ) -> BridgeResult<Vec<Value>> {
        proxy::call_script(self, func, args, result_types, &self.config.tag_name)
    }
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(BridgeConfig::default())
    }
}

impl std::fmt::Debug for Bridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("config", &self.config)
            .field("method_sets", &self.methods.len())
            .field("codecs", &self.codecs.len())
            .finish()
    }
}
