//! Method sets and the process-wide method-set cache
//!
//! A [`MethodSet`] is the dispatch table of script-callable thunks for one
//! host type. Sets are built lazily on first use of a type, never
//! invalidated, and shared immutably across every handle of that type.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::bridge::Bridge;
use crate::error::BridgeResult;
use crate::proxy::{method_thunk, Thunk};
use crate::script::ScriptValue;
use crate::types::{FnSig, MethodDesc, Receiver, Type, TypeKind};
use crate::value::Value;

/// A callable method in a set
#[derive(Clone)]
pub struct MethodEntry {
    /// Method name
    pub name: String,
    /// Declared receiver kind
    pub receiver: Receiver,
    /// Signature, excluding the receiver
    pub sig: FnSig,
    thunk: Thunk,
}

impl MethodEntry {
    fn new(method: &MethodDesc) -> Self {
        Self {
            name: method.name.clone(),
            receiver: method.receiver,
            sig: method.sig.clone(),
            thunk: method_thunk(method),
        }
    }

    /// Invoke the method on `bound` with script arguments
    ///
    /// The receiver is adjusted to the declared receiver kind; results come
    /// back wrapped.
    pub fn call(
        &self,
        bridge: &Bridge,
        bound: &Value,
        args: &[ScriptValue],
    ) -> BridgeResult<Vec<ScriptValue>> {
        (self.thunk)(bridge, bound, args)
    }
}

impl std::fmt::Debug for MethodEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} {}{}", self.receiver, self.name, self.sig)
    }
}

/// Dispatch table for one host type, sorted by method name
#[derive(Debug)]
pub struct MethodSet {
    ty: Type,
    entries: Vec<MethodEntry>,
    by_name: FxHashMap<String, usize>,
}

impl MethodSet {
    /// Build the method set of `ty`
    ///
    /// Pointer types get every method declared on the pointee. Other types
    /// get their value-receiver methods merged with their pointer-receiver
    /// methods, pointer receivers taking precedence on a name clash.
    pub fn build(ty: &Type) -> Self {
        let mut merged: FxHashMap<&str, &MethodDesc> = FxHashMap::default();
        match ty.kind() {
            TypeKind::Pointer(elem) => {
                for method in elem.methods() {
                    merged.insert(&method.name, method);
                }
            }
            _ => {
                for receiver in [Receiver::Value, Receiver::Pointer] {
                    for method in ty.methods().iter().filter(|m| m.receiver == receiver) {
                        merged.insert(&method.name, method);
                    }
                }
            }
        }

        let mut entries: Vec<MethodEntry> = merged.values().map(|m| MethodEntry::new(m)).collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        let by_name = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        Self {
            ty: ty.clone(),
            entries,
            by_name,
        }
    }

    /// The type this set belongs to
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    /// Method by name
    pub fn get(&self, name: &str) -> Option<&MethodEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Whether the set contains `name`
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Methods sorted by name
    pub fn iter(&self) -> impl Iterator<Item = &MethodEntry> {
        self.entries.iter()
    }

    /// Method names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    /// Number of methods
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the type exposes no methods
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

static GLOBAL: Lazy<Arc<MethodSetCache>> = Lazy::new(|| Arc::new(MethodSetCache::new()));

/// Thread-safe cache of method sets keyed by type
///
/// Readers take the shared lock; a miss takes the exclusive lock, checks
/// again, and builds. Building never runs script code, so holding the lock
/// while building cannot deadlock.
pub struct MethodSetCache {
    sets: RwLock<FxHashMap<Type, Arc<MethodSet>>>,
    builds: AtomicUsize,
}

impl MethodSetCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self {
            sets: RwLock::new(FxHashMap::default()),
            builds: AtomicUsize::new(0),
        }
    }

    /// The process-wide cache
    pub fn global() -> Arc<MethodSetCache> {
        GLOBAL.clone()
    }

    /// Method set for `ty`, building it on first use
    pub fn get(&self, ty: &Type) -> Arc<MethodSet> {
        if let Some(set) = self.sets.read().get(ty) {
            return set.clone();
        }

        let mut sets = self.sets.write();
        if let Some(set) = sets.get(ty) {
            return set.clone();
        }
        let set = Arc::new(MethodSet::build(ty));
        self.builds.fetch_add(1, Ordering::Relaxed);
        log::debug!("built method set for {} ({} methods)", ty, set.len());
        sets.insert(ty.clone(), set.clone());
        set
    }

    /// Whether a set for `ty` has been built
    pub fn contains(&self, ty: &Type) -> bool {
        self.sets.read().contains_key(ty)
    }

    /// Number of cached sets
    pub fn len(&self) -> usize {
        self.sets.read().len()
    }

    /// Whether no set has been cached
    pub fn is_empty(&self) -> bool {
        self.sets.read().is_empty()
    }

    /// Number of sets built over the cache's lifetime
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}

impl Default for MethodSetCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn noop(_: &Value, _: &[Value]) -> BridgeResult<Vec<Value>> {
        Ok(vec![])
    }

    static COUNTER: Lazy<Type> = Lazy::new(|| {
        Type::named("Counter", TypeKind::Record(Default::default()))
            .method(MethodDesc::value("Get", vec![], vec![], noop))
            .method(MethodDesc::pointer("Incr", vec![], vec![], noop))
            .method(MethodDesc::value("Describe", vec![], vec![], noop))
            .build()
    });

    fn counter_type() -> Type {
        COUNTER.clone()
    }

    #[test]
    fn test_value_type_sees_both_receiver_kinds() {
        let set = MethodSet::build(&counter_type());
        assert_eq!(set.names(), vec!["Describe", "Get", "Incr"]);
        assert_eq!(set.get("Incr").map(|m| m.receiver), Some(Receiver::Pointer));
    }

    #[test]
    fn test_pointer_type_sees_all_pointee_methods() {
        let set = MethodSet::build(&counter_type().pointer_to());
        assert_eq!(set.len(), 3);
        assert!(set.contains("Get"));
    }

    #[test]
    fn test_unnamed_types_have_empty_sets() {
        assert!(MethodSet::build(&Type::slice(Type::string())).is_empty());
    }

    #[test]
    fn test_cache_is_idempotent() {
        let cache = MethodSetCache::new();
        let a = cache.get(&counter_type());
        let b = cache.get(&counter_type());
        assert!(Arc::ptr_eq(&a, &b), "second lookup must return the cached set");
        assert_eq!(cache.builds(), 1);
        assert_eq!(cache.len(), 1);

        cache.get(&counter_type().pointer_to());
        assert_eq!(cache.builds(), 2, "pointer type has its own entry");
    }

    #[test]
    fn test_concurrent_lookups_build_once() {
        let cache = Arc::new(MethodSetCache::new());
        let ty = counter_type();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let ty = ty.clone();
                thread::spawn(move || cache.get(&ty).len())
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), 3);
        }
        assert_eq!(cache.builds(), 1);
    }
}
