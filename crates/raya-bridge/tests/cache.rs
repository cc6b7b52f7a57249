use std::sync::Arc;
use std::thread;

use once_cell::sync::Lazy;
use raya_bridge::{
    Bridge, BridgeConfig, CodecCache, FieldDesc, MethodDesc, MethodSetCache, RecordType,
    ScriptValue, TableRef, Type, TypeKind, Value,
};

static COUNTER: Lazy<Type> = Lazy::new(|| {
    Type::named(
        "Counter",
        TypeKind::Record(RecordType::new(vec![
            FieldDesc::new("N", Type::int()).tag("script", "n")
        ])),
    )
    .method(MethodDesc::value("Get", vec![], vec![Type::int()], |this, _| {
        Ok(vec![this.field("N")?])
    }))
    .method(MethodDesc::pointer("Inc", vec![], vec![], |this, _| {
        if let Some(counter) = this.elem() {
            let n = counter.field("N")?.as_i64().unwrap_or(0);
            counter.set_field("N", Value::from_i64(&Type::int(), n + 1)?)?;
        }
        Ok(vec![])
    }))
    .build()
});

fn counter_type() -> Type {
    COUNTER.clone()
}

#[test]
fn test_method_set_built_once_per_type() {
    let bridge = Bridge::isolated(BridgeConfig::default());
    let counter = Value::zero(&counter_type());

    for _ in 0..5 {
        let handle = bridge.wrap(&counter).unwrap();
        handle.call_method("Inc", &[]).unwrap();
    }

    assert_eq!(counter.field("N").unwrap().as_i64(), Some(5));
    assert_eq!(bridge.methods().builds(), 1, "one build for five handles");
    assert!(bridge.methods().contains(&counter_type()));
}

#[test]
fn test_method_set_for_pointer_type_is_separate() {
    let cache = MethodSetCache::new();
    let value_set = cache.get(&counter_type());
    let pointer_set = cache.get(&counter_type().pointer_to());

    assert_eq!(value_set.names(), vec!["Get", "Inc"]);
    assert_eq!(pointer_set.names(), vec!["Get", "Inc"]);
    assert_eq!(cache.len(), 2);
    assert!(Arc::ptr_eq(&value_set, &cache.get(&counter_type())));
}

#[test]
fn test_codec_built_once_per_type_and_tag() {
    let bridge = Bridge::isolated(BridgeConfig::default());
    let counter = Value::zero(&counter_type());

    for _ in 0..3 {
        let table = bridge.record_to_table(&counter, None).unwrap();
        bridge.table_to_record(&table, &counter_type(), None).unwrap();
    }
    assert_eq!(bridge.codecs().builds(), 1);

    bridge.record_to_table(&counter, Some("json")).unwrap();
    assert_eq!(bridge.codecs().builds(), 2, "a new tag builds a new codec");
    assert_eq!(bridge.codecs().len(), 2);
}

#[test]
fn test_isolated_bridges_do_not_share_caches() {
    let a = Bridge::isolated(BridgeConfig::default());
    let b = Bridge::isolated(BridgeConfig::default());
    a.wrap(&Value::zero(&counter_type())).unwrap();

    assert_eq!(a.methods().len(), 1);
    assert!(b.methods().is_empty());

    let shared = a.clone();
    assert!(Arc::ptr_eq(shared.methods(), a.methods()), "clones share caches");
}

#[test]
fn test_caches_are_shared_across_threads() {
    let methods = Arc::new(MethodSetCache::new());
    let codecs = Arc::new(CodecCache::new());
    let ty = counter_type();

    thread::scope(|s| {
        for _ in 0..8 {
            let methods = methods.clone();
            let codecs = codecs.clone();
            let ty = ty.clone();
            s.spawn(move || {
                for _ in 0..100 {
                    assert!(methods.get(&ty).contains("Inc"));
                    assert_eq!(codecs.get(&ty, "script").unwrap().fields().len(), 1);
                }
            });
        }
    });

    assert_eq!(methods.builds(), 1);
    assert_eq!(codecs.builds(), 1);
}

#[test]
fn test_same_named_declarations_get_their_own_entries() {
    let bridge = Bridge::default();

    let point_x = Type::named(
        "Point",
        TypeKind::Record(RecordType::new(vec![
            FieldDesc::new("X", Type::int()).tag("script", "x")
        ])),
    )
    .build();
    let point_y = Type::named(
        "Point",
        TypeKind::Record(RecordType::new(vec![
            FieldDesc::new("Y", Type::string()).tag("script", "y")
        ])),
    )
    .build();
    assert_ne!(point_x, point_y);

    let table = TableRef::new();
    table.set_str("x", 1.0.into());
    let first = bridge.table_to_record(&table, &point_x, None).unwrap();
    assert_eq!(first.field("X").unwrap().as_i64(), Some(1));

    let table = TableRef::new();
    table.set_str("y", "hello".into());
    let second = bridge.table_to_record(&table, &point_y, None).unwrap();
    assert_eq!(
        second.field("Y").unwrap().as_str(),
        Some("hello"),
        "the second Point decodes with its own fields"
    );

    let widget = |method: &'static str| {
        Type::named("Widget", TypeKind::Record(RecordType::new(vec![])))
            .method(MethodDesc::value(method, vec![], vec![Type::string()], move |_, _| {
                Ok(vec![Value::from(method)])
            }))
            .build()
    };
    let widget_a = widget("A");
    let widget_b = widget("B");

    let a = bridge.wrap(&Value::zero(&widget_a)).unwrap();
    let b = bridge.wrap(&Value::zero(&widget_b)).unwrap();
    assert_eq!(a.call_method("A", &[]).unwrap(), vec![ScriptValue::from("A")]);
    assert!(
        b.index(&"B".into()).unwrap().as_function().is_some(),
        "the second Widget resolves its own method"
    );
    assert!(b.index(&"A".into()).is_err());

    let set_a = bridge.methods().get(&widget_a);
    let set_b = bridge.methods().get(&widget_b);
    assert!(!Arc::ptr_eq(&set_a, &set_b));
    assert_eq!(set_b.names(), vec!["B"]);
}
