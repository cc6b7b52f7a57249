use std::cell::RefCell;
use std::rc::Rc;

use once_cell::sync::Lazy;
use raya_bridge::{
    Bridge, BridgeError, FieldDesc, MethodDesc, RecordType, ScriptFunction, ScriptValue,
    TableRef, Type, TypeKind, Value,
};

/// `StringSlice []string` with `Get(int) string` and `(*StringSlice) Set(int, string)`
static STRING_SLICE: Lazy<Type> = Lazy::new(|| {
    Type::named("StringSlice", TypeKind::Slice(Type::string()))
        .method(MethodDesc::value(
            "Get",
            vec![Type::int()],
            vec![Type::string()],
            |this, args| {
                let i = args[0].as_i64().unwrap_or(0) as usize;
                Ok(vec![this.index(i)?])
            },
        ))
        .method(MethodDesc::pointer(
            "Set",
            vec![Type::int(), Type::string()],
            vec![],
            |this, args| {
                let i = args[0].as_i64().unwrap_or(0) as usize;
                let slice = this
                    .elem()
                    .ok_or_else(|| BridgeError::runtime("nil receiver"))?;
                slice.set_index(i, args[1].clone())?;
                Ok(vec![])
            },
        ))
        .build()
});

fn string_slice_type() -> Type {
    STRING_SLICE.clone()
}

/// `blah { name string; Color int32 }` with `Name() string` and
/// `(*blah) SetName(string)`
static BLAH: Lazy<Type> = Lazy::new(|| {
    Type::named(
        "blah",
        TypeKind::Record(RecordType::new(vec![
            FieldDesc::new("name", Type::string()).private(),
            FieldDesc::new("Color", Type::int32()),
        ])),
    )
    .method(MethodDesc::value(
        "Name",
        vec![],
        vec![Type::string()],
        |this, _| Ok(vec![this.field("name")?]),
    ))
    .method(MethodDesc::pointer(
        "SetName",
        vec![Type::string()],
        vec![],
        |this, args| {
            let record = this
                .elem()
                .ok_or_else(|| BridgeError::runtime("nil receiver"))?;
            record.set_field("name", args[0].clone())?;
            Ok(vec![])
        },
    ))
    .build()
});

fn blah_type() -> Type {
    BLAH.clone()
}

fn blah(name: &str, color: i32) -> Value {
    Value::record_of(&blah_type(), vec![name.into(), color.into()]).unwrap()
}

// ============================================================================
// Sequences
// ============================================================================

#[test]
fn test_slice_methods_use_host_indexing() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    let got = val.call_method("Get", &[0.0.into()]).unwrap();
    assert_eq!(got, vec![ScriptValue::from("foo")]);

    val.call_method("Set", &[0.0.into(), "bar".into()]).unwrap();
    assert_eq!(
        slice.index(0).unwrap().as_str(),
        Some("bar"),
        "pointer-receiver method mutates the original slice"
    );
}

#[test]
fn test_slice_index_is_one_based() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into(), "bar".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    assert_eq!(val.index(&1.0.into()).unwrap(), ScriptValue::from("foo"));
    assert_eq!(val.index(&2.0.into()).unwrap(), ScriptValue::from("bar"));
    assert_eq!(val.len().unwrap(), 2);

    val.set_index(1.0.into(), "baz".into()).unwrap();
    assert_eq!(slice.index(0).unwrap().as_str(), Some("baz"));
    assert_eq!(
        val.call_method("Get", &[0.0.into()]).unwrap(),
        vec![ScriptValue::from("baz")],
        "writes through the handle are visible to methods"
    );
}

#[test]
fn test_slice_index_out_of_range() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    assert_eq!(
        val.index(&2.0.into()).unwrap_err(),
        BridgeError::IndexOutOfRange { index: 2, len: 1 }
    );
    assert_eq!(
        val.set_index(0.0.into(), "x".into()).unwrap_err(),
        BridgeError::IndexOutOfRange { index: 0, len: 1 }
    );
}

#[test]
fn test_slice_unknown_name_is_not_found() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec![]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    assert_eq!(
        val.index(&"Missing".into()).unwrap_err(),
        BridgeError::field_not_found("StringSlice", "Missing")
    );
}

#[test]
fn test_slice_set_rejects_wrong_element_shape() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    assert!(val.set_index(1.0.into(), 5.0.into()).is_err());
    assert_eq!(slice.index(0).unwrap().as_str(), Some("foo"));
}

#[test]
fn test_array_handle_writes_back() {
    let bridge = Bridge::default();
    let ty = Type::array(Type::int(), 2);
    let array = Value::array_of(
        &ty,
        vec![Value::zero(&Type::int()), Value::zero(&Type::int())],
    )
    .unwrap();
    let val = bridge.wrap(&array).unwrap();

    val.set_index(2.0.into(), 7.0.into()).unwrap();
    assert_eq!(val.index(&2.0.into()).unwrap(), ScriptValue::Number(7.0));
    assert_eq!(
        val.as_handle().unwrap().value().index(1).unwrap().as_i64(),
        Some(7)
    );
}

// ============================================================================
// Records
// ============================================================================

#[test]
fn test_record_fields_and_methods() {
    let bridge = Bridge::default();
    let original = blah("foo", 123);
    let val = bridge.wrap(&original.addr().unwrap()).unwrap();

    assert_eq!(val.index(&"Color".into()).unwrap(), ScriptValue::Number(123.0));
    assert_eq!(
        val.call_method("Name", &[]).unwrap(),
        vec![ScriptValue::from("foo")]
    );

    val.call_method("SetName", &["bar".into()]).unwrap();
    assert_eq!(
        original.field("name").unwrap().as_str(),
        Some("bar"),
        "pointer-receiver method mutates the original record"
    );
    assert_eq!(
        val.call_method("Name", &[]).unwrap(),
        vec![ScriptValue::from("bar")]
    );
}

#[test]
fn test_record_field_assignment() {
    let bridge = Bridge::default();
    let original = blah("foo", 1);
    let val = bridge.wrap(&original).unwrap();

    val.set_index("Color".into(), 42.0.into()).unwrap();
    assert_eq!(original.field("Color").unwrap().as_i64(), Some(42));
    assert_eq!(original.field("Color").unwrap().ty(), &Type::int32());
}

#[test]
fn test_record_private_field_is_hidden() {
    let bridge = Bridge::default();
    let val = bridge.wrap(&blah("foo", 1)).unwrap();

    assert_eq!(
        val.index(&"name".into()).unwrap_err(),
        BridgeError::field_not_found("blah", "name")
    );
    assert!(matches!(
        val.set_index("name".into(), "bar".into()),
        Err(BridgeError::FieldNotFound { .. })
    ));
    assert!(matches!(
        val.index(&1.0.into()),
        Err(BridgeError::ShapeMismatch { .. })
    ));
}

#[test]
fn test_nested_records_are_handles() {
    let inner_ty = Type::named(
        "Inner",
        TypeKind::Record(RecordType::new(vec![FieldDesc::new("N", Type::int())])),
    )
    .build();
    let outer_ty = Type::record(vec![FieldDesc::new("Inner", inner_ty.clone())]);
    let outer = Value::record_of(&outer_ty, vec![Value::zero(&inner_ty)]).unwrap();

    let bridge = Bridge::default();
    let val = bridge.wrap(&outer).unwrap();
    let inner = val.index(&"Inner".into()).unwrap();
    assert_eq!(inner.type_name(), "userdata");

    inner.set_index("N".into(), 9.0.into()).unwrap();
    let n = outer.field("Inner").unwrap().field("N").unwrap();
    assert_eq!(n.as_i64(), Some(9), "nested handle aliases the outer record");
}

#[test]
fn test_each_wrap_is_a_fresh_handle() {
    let bridge = Bridge::default();
    let original = blah("foo", 1);
    let a = bridge.wrap(&original).unwrap();
    let b = bridge.wrap(&original).unwrap();

    assert!(!a.as_handle().unwrap().ptr_eq(b.as_handle().unwrap()));
    a.set_index("Color".into(), 5.0.into()).unwrap();
    assert_eq!(b.index(&"Color".into()).unwrap(), ScriptValue::Number(5.0));
}

// ============================================================================
// Maps
// ============================================================================

#[test]
fn test_map_handle_get_set_delete() {
    let bridge = Bridge::default();
    let ty = Type::map(Type::string(), Type::int());
    let map = Value::map_of(&ty, vec![]).unwrap();
    let val = bridge.wrap(&map).unwrap();

    val.set_index("a".into(), 1.0.into()).unwrap();
    assert_eq!(val.index(&"a".into()).unwrap(), ScriptValue::Number(1.0));
    assert!(val.index(&"missing".into()).unwrap().is_nil());
    assert_eq!(val.len().unwrap(), 1);
    assert_eq!(
        map.map_get(&"a".into()).unwrap().and_then(|v| v.as_i64()),
        Some(1)
    );

    val.set_index("a".into(), ScriptValue::Nil).unwrap();
    assert!(map.map_get(&"a".into()).unwrap().is_none(), "nil deletes the key");
}

#[test]
fn test_map_methods_shadow_keys() {
    let ty = Type::named("Counts", TypeKind::Map(Type::string(), Type::int()))
        .method(MethodDesc::value(
            "Total",
            vec![],
            vec![Type::int()],
            |this, _| {
                let total: i64 = this
                    .map_entries()
                    .iter()
                    .filter_map(|(_, v)| v.as_i64())
                    .sum();
                Value::from_i64(&Type::int(), total).map(|v| vec![v])
            },
        ))
        .build();
    let map = Value::map_of(
        &ty,
        vec![
            ("Total".into(), Value::from_i64(&Type::int(), 100).unwrap()),
            ("b".into(), Value::from_i64(&Type::int(), 2).unwrap()),
        ],
    )
    .unwrap();

    let bridge = Bridge::default();
    let val = bridge.wrap(&map).unwrap();
    assert_eq!(
        val.call_method("Total", &[]).unwrap(),
        vec![ScriptValue::Number(102.0)]
    );
    assert_eq!(val.index(&"b".into()).unwrap(), ScriptValue::Number(2.0));
}

// ============================================================================
// tostring
// ============================================================================

#[test]
fn test_tostring_prefers_string_method() {
    let ty = Type::named(
        "Point",
        TypeKind::Record(RecordType::new(vec![
            FieldDesc::new("X", Type::int()),
            FieldDesc::new("Y", Type::int()),
        ])),
    )
    .method(MethodDesc::value(
        "String",
        vec![],
        vec![Type::string()],
        |this, _| {
            let x = this.field("X")?;
            let y = this.field("Y")?;
            Ok(vec![format!("({}, {})", x, y).into()])
        },
    ))
    .build();
    let point = Value::record_of(
        &ty,
        vec![
            Value::from_i64(&Type::int(), 1).unwrap(),
            Value::from_i64(&Type::int(), 2).unwrap(),
        ],
    )
    .unwrap();

    let bridge = Bridge::default();
    let val = bridge.wrap(&point).unwrap();
    assert_eq!(val.to_display_string().unwrap(), "(1, 2)");
}

#[test]
fn test_tostring_fallback() {
    let bridge = Bridge::default();
    let val = bridge.wrap(&blah("foo", 7)).unwrap();
    assert_eq!(val.to_display_string().unwrap(), "blah({foo 7})");

    let names = Type::named("Names", TypeKind::Slice(Type::string())).build();
    let slice = Value::slice_of(&names, vec!["a".into(), "b".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();
    assert_eq!(val.to_display_string().unwrap(), "Names([a b])");
}

// ============================================================================
// Functions
// ============================================================================

#[test]
fn test_wrapped_function_decodes_args_and_wraps_results() {
    let error = Type::named("error", TypeKind::Interface(Default::default())).build();
    let ty = Type::func(
        vec![Type::string(), Type::int(), Type::slice(Type::string())],
        vec![Type::int(), Type::slice(Type::bool()), error.clone()],
    );

    let seen: Rc<RefCell<Option<(String, i64, Vec<String>)>>> = Rc::new(RefCell::new(None));
    let captured = seen.clone();
    let func = Value::func(&ty, move |args| {
        let names = args[2]
            .to_vec()
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        *captured.borrow_mut() = Some((
            args[0].as_str().unwrap_or_default().to_string(),
            args[1].as_i64().unwrap_or_default(),
            names,
        ));
        Ok(vec![
            Value::from_i64(&Type::int(), 5)?,
            Value::slice_of(&Type::slice(Type::bool()), vec![true.into(), false.into()])?,
            Value::nil(&error)?,
        ])
    })
    .unwrap();

    let bridge = Bridge::default();
    let wrapped = bridge.wrap(&func).unwrap();
    assert_eq!(wrapped.type_name(), "function");

    let names = TableRef::from_seq(vec!["a".into(), "b".into()]);
    let results = wrapped
        .call(&["hi".into(), 3.0.into(), names.into()])
        .unwrap();

    assert_eq!(
        *seen.borrow(),
        Some(("hi".to_string(), 3, vec!["a".to_string(), "b".to_string()]))
    );
    assert_eq!(results.len(), 3);
    assert_eq!(results[0], ScriptValue::Number(5.0));
    assert_eq!(results[1].index(&1.0.into()).unwrap(), ScriptValue::Bool(true));
    assert_eq!(results[1].index(&2.0.into()).unwrap(), ScriptValue::Bool(false));
    assert!(results[2].is_nil());
}

#[test]
fn test_wrapped_function_arity_mismatch_skips_call() {
    let calls = Rc::new(RefCell::new(0));
    let counter = calls.clone();
    let ty = Type::func(vec![Type::string()], vec![]);
    let func = Value::func(&ty, move |_| {
        *counter.borrow_mut() += 1;
        Ok(vec![])
    })
    .unwrap();

    let bridge = Bridge::default();
    let wrapped = bridge.wrap(&func).unwrap();
    let err = wrapped.call(&[]).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::ArityMismatch {
            expected: 1,
            got: 0,
            ..
        }
    ));
    assert_eq!(*calls.borrow(), 0, "host function must not run");
}

#[test]
fn test_method_arity_mismatch() {
    let bridge = Bridge::default();
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    let err = val.call_method("Set", &[0.0.into()]).unwrap_err();
    assert!(matches!(
        err,
        BridgeError::ArityMismatch {
            expected: 2,
            got: 1,
            ..
        }
    ));
    assert_eq!(slice.index(0).unwrap().as_str(), Some("foo"));
}

// ============================================================================
// Unwrap
// ============================================================================

#[test]
fn test_unwrap_handles() {
    let bridge = Bridge::default();
    let original = blah("foo", 1);
    let val = bridge.wrap(&original).unwrap();

    let same = bridge.unwrap(&val, &blah_type()).unwrap();
    assert!(same.ptr_eq(&original));

    let ptr = bridge.unwrap(&val, &blah_type().pointer_to()).unwrap();
    assert!(ptr.elem().unwrap().ptr_eq(&original));

    let boxed = bridge.unwrap(&val, &Type::any()).unwrap();
    assert!(boxed.elem().unwrap().ptr_eq(&original));

    assert!(matches!(
        bridge.unwrap(&val, &string_slice_type()),
        Err(BridgeError::IncompatibleHandle { .. })
    ));
}

#[test]
fn test_unwrap_converts_between_identical_layouts() {
    let bridge = Bridge::default();
    let names = Type::slice(Type::string());
    let slice = Value::slice_of(&string_slice_type(), vec!["foo".into()]).unwrap();
    let val = bridge.wrap(&slice).unwrap();

    let plain = bridge.unwrap(&val, &names).unwrap();
    assert_eq!(plain.ty(), &names);
    assert!(plain.ptr_eq(&slice), "conversion retypes without copying");
}

#[test]
fn test_unwrap_scalars_and_nil() {
    let bridge = Bridge::default();
    assert_eq!(
        bridge.unwrap(&"x".into(), &Type::string()).unwrap().as_str(),
        Some("x")
    );
    assert_eq!(
        bridge.unwrap(&3.0.into(), &Type::uint8()).unwrap().as_u64(),
        Some(3)
    );
    assert!(bridge
        .unwrap(&ScriptValue::Nil, &Type::map(Type::string(), Type::int()))
        .unwrap()
        .is_nil());
    assert!(matches!(
        bridge.unwrap(&TableRef::new().into(), &Type::slice(Type::int())),
        Err(BridgeError::ShapeMismatch { .. })
    ));
}

// ============================================================================
// wrap_as, method tables, script calls
// ============================================================================

#[test]
fn test_wrap_as_uses_target_methods() {
    let bridge = Bridge::default();
    let plain = Value::slice_of(&Type::slice(Type::string()), vec!["foo".into()]).unwrap();

    let val = bridge.wrap_as(&plain, &string_slice_type()).unwrap();
    assert_eq!(
        val.call_method("Get", &[0.0.into()]).unwrap(),
        vec![ScriptValue::from("foo")]
    );

    assert!(matches!(
        bridge.wrap_as(&plain, &Type::int()),
        Err(BridgeError::Conversion { .. })
    ));
}

#[test]
fn test_method_table_binds_receiver() {
    let bridge = Bridge::default();
    let original = blah("foo", 1);
    let table = bridge.method_table(&original);

    assert_eq!(table.len(), 2);
    let set_name = table.get_str("SetName");
    set_name.call(&["bar".into()]).unwrap();
    assert_eq!(original.field("name").unwrap().as_str(), Some("bar"));

    let name = table.get_str("Name").call(&[]).unwrap();
    assert_eq!(name, vec![ScriptValue::from("bar")]);
}

#[test]
fn test_call_script_round_trip() {
    let add = ScriptFunction::new("add", 2, 1, |args| {
        let a = args[0].as_number().unwrap_or_default();
        let b = args[1].as_number().unwrap_or_default();
        Ok(vec![ScriptValue::Number(a + b)])
    });

    let bridge = Bridge::default();
    let results = bridge
        .call_script(
            &add.clone().into(),
            &[Value::from(2i64), Value::from(40i64)],
            &[Type::int()],
        )
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].as_i64(), Some(42));

    let err = bridge
        .call_script(
            &add.into(),
            &[Value::from(1i64), Value::from(1i64)],
            &[Type::int(), Type::int()],
        )
        .unwrap_err();
    assert_eq!(
        err,
        BridgeError::ResultCount {
            name: "add".to_string(),
            expected: 2,
            got: 1,
        }
    );
}

#[test]
fn test_call_script_receives_handles() {
    let rename = ScriptFunction::new("rename", 1, 0, |args| {
        args[0].call_method("SetName", &["renamed".into()])?;
        Ok(vec![])
    });

    let bridge = Bridge::default();
    let original = blah("foo", 1);
    bridge
        .call_script(&rename.into(), &[original.addr().unwrap()], &[])
        .unwrap();
    assert_eq!(original.field("name").unwrap().as_str(), Some("renamed"));
}
