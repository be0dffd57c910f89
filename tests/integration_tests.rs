use arson::{
    arson, decode, encode, encode_pretty, to_value, Array, Buffer, Number, Object, Pattern,
    PatternFlags, Value, ValueMap, ValueSet,
};
use chrono::{TimeZone, Utc};
use serde::Serialize;

#[derive(Serialize)]
struct User {
    id: u32,
    name: String,
    active: bool,
    tags: Vec<String>,
}

#[derive(Serialize)]
struct Product {
    sku: String,
    price: f64,
    quantity: u32,
}

#[derive(Serialize)]
struct Order {
    order_id: u32,
    customer: User,
    items: Vec<Product>,
    total: f64,
}

fn round_trip(value: &Value) -> Value {
    let text = encode(value).unwrap();
    println!("encoded: {}", text);
    decode(&text).unwrap()
}

fn sparse(slots: &[Option<i64>]) -> Value {
    Value::Array(Array::from_slots(
        slots.iter().map(|slot| slot.map(Value::from)).collect(),
    ))
}

#[test]
fn test_primitive_values() {
    for value in [
        Value::from(0),
        Value::from(1234),
        Value::from(true),
        Value::from(false),
        Value::from("asdf"),
        Value::from(""),
        Value::Null,
        Value::Undefined,
    ] {
        assert_eq!(round_trip(&value), value);
    }
}

#[test]
fn test_non_finite_numbers() {
    assert_eq!(round_trip(&Value::from(f64::NAN)), Value::Number(Number::NaN));
    assert_eq!(
        round_trip(&Value::from(f64::INFINITY)),
        Value::Number(Number::Infinity)
    );
    assert_eq!(
        round_trip(&Value::from(f64::NEG_INFINITY)),
        Value::Number(Number::NegativeInfinity)
    );
}

#[test]
fn test_undefined_property_is_kept() {
    let back = round_trip(&arson!({ "foo": undefined }));
    let object = back.as_object().unwrap();
    assert!(object.contains_key("foo"));
    assert_eq!(object.get("foo"), Some(Value::Undefined));
}

#[test]
fn test_sparse_arrays() {
    let cases: Vec<Vec<Option<i64>>> = vec![
        vec![None],
        vec![None, None],
        vec![None, None, None],
        vec![Some(1), None, Some(3)],
        vec![Some(1), None, Some(3), None, Some(4)],
        vec![Some(1), None, Some(3), None, Some(4), None],
    ];

    for slots in cases {
        let back = round_trip(&sparse(&slots));
        let array = back.as_array().unwrap();
        assert_eq!(array.len(), slots.len(), "length of {slots:?}");
        for (index, slot) in slots.iter().enumerate() {
            match slot {
                Some(n) => assert_eq!(array.get(index), Some(Value::from(*n))),
                None => assert!(array.is_hole(index), "slot {index} of {slots:?}"),
            }
        }
    }
}

#[test]
fn test_hole_is_not_undefined() {
    let array = Array::new();
    array.push_hole();
    array.push(Value::Undefined);

    let back = round_trip(&Value::Array(array));
    let back = back.as_array().unwrap();
    assert!(back.is_hole(0));
    assert!(!back.is_hole(1));
    assert_eq!(back.get(1), Some(Value::Undefined));
}

#[test]
fn test_circular_reference() {
    let obj = Object::new();
    obj.insert("self", obj.clone());
    let original = Value::Object(obj);

    let result = round_trip(&original);
    assert!(!result.ptr_eq(&original));
    assert!(result.get("self").unwrap().ptr_eq(&result));
}

#[test]
fn test_repeated_references() {
    let b = arson!({ "foo": 42 });
    let a = Object::new();
    a.insert("x", b.clone());
    a.insert("y", b);

    let result = round_trip(&Value::Object(a));
    let x = result.get("x").unwrap();
    assert!(x.ptr_eq(&result.get("y").unwrap()));
    assert_eq!(x.get("foo"), Some(Value::from(42)));
}

#[test]
fn test_mutual_cycle_through_array() {
    let parent = Object::new();
    let children = Array::new();
    let child = Object::new();
    child.insert("parent", parent.clone());
    children.push(child);
    parent.insert("children", children);

    let result = round_trip(&Value::Object(parent));
    let child = result.get("children").unwrap().at(0).unwrap();
    assert!(child.get("parent").unwrap().ptr_eq(&result));
}

#[test]
fn test_object_standing_in_for_a_global_scope() {
    let scope = Object::new();
    scope.insert("global", scope.clone());
    scope.insert("version", "1.0");
    scope.insert("env", arson!({ "HOME": "/root", "CI": true }));

    let copy = round_trip(&Value::Object(scope));
    assert!(copy.get("global").unwrap().ptr_eq(&copy));
    assert_eq!(copy.get("env").unwrap().get("CI"), Some(Value::Bool(true)));
}

#[test]
fn test_self_containing_set() {
    let set = Value::set([]);
    set.downcast_mut::<ValueSet>().unwrap().insert(set.clone());

    let back = round_trip(&set);
    let elements = back.downcast_ref::<ValueSet>().unwrap();
    assert_eq!(elements.len(), 1);
    assert!(elements.iter().next().unwrap().ptr_eq(&back));
}

#[test]
fn test_map_with_object_keys() {
    let key = arson!({ "id": 1 });
    let map = Value::map([
        (key.clone(), Value::from("by object")),
        (Value::from("plain"), key),
    ]);

    let back = round_trip(&map);
    let back = back.downcast_ref::<ValueMap>().unwrap();
    assert_eq!(back.len(), 2);

    let (first_key, first_value) = back.iter().next().unwrap();
    assert_eq!(first_value, &Value::from("by object"));
    assert!(back.get(&Value::from("plain")).unwrap().ptr_eq(first_key));
}

#[test]
fn test_pattern_flags_survive() {
    let flags = PatternFlags {
        ignore_case: true,
        global: true,
        ..Default::default()
    };
    let original = Value::pattern(Pattern::with_flags("ab+c", flags).unwrap());

    let back = round_trip(&original);
    let pattern = back.downcast_ref::<Pattern>().unwrap();
    assert_eq!(pattern.source(), "ab+c");
    assert!(pattern.flags().ignore_case);
    assert!(pattern.flags().global);
    assert!(!pattern.flags().multiline);
    assert!(pattern.is_match("xABBCx"));
}

#[test]
fn test_date_instant_is_exact() {
    let instant = Utc.timestamp_opt(1_234_567_890, 987_654_321).unwrap();
    let back = round_trip(&Value::date(instant));
    assert_eq!(*back.downcast_ref::<chrono::DateTime<Utc>>().unwrap(), instant);
}

#[test]
fn test_shared_buffer_keeps_identity() {
    let buffer = Value::buffer(vec![1, 2, 3, 250]);
    let root = Value::array([buffer.clone(), buffer]);

    let back = round_trip(&root);
    let first = back.at(0).unwrap();
    assert!(first.ptr_eq(&back.at(1).unwrap()));
    assert_eq!(
        first.downcast_ref::<Buffer>().unwrap().as_slice(),
        &[1, 2, 3, 250]
    );
}

#[test]
fn test_nested_struct_via_to_value() {
    let order = Order {
        order_id: 12345,
        customer: User {
            id: 123,
            name: "Alice".to_string(),
            active: true,
            tags: vec!["vip".to_string()],
        },
        items: vec![
            Product {
                sku: "WIDGET-001".to_string(),
                price: 29.99,
                quantity: 2,
            },
            Product {
                sku: "GADGET-002".to_string(),
                price: 49.99,
                quantity: 1,
            },
        ],
        total: 109.97,
    };

    let back = round_trip(&to_value(&order).unwrap());
    assert_eq!(back.get("order_id"), Some(Value::from(12345)));
    assert_eq!(
        back.get("customer").unwrap().get("name"),
        Some(Value::from("Alice"))
    );
    let items = back.get("items").unwrap();
    assert_eq!(items.as_array().unwrap().len(), 2);
    assert_eq!(items.at(1).unwrap().get("price"), Some(Value::from(49.99)));
    assert_eq!(back.get("total"), Some(Value::from(109.97)));
}

#[test]
fn test_to_value_bytes_become_buffer() {
    #[derive(Serialize)]
    struct Blob<'a> {
        #[serde(with = "serde_bytes_shim")]
        data: &'a [u8],
    }

    mod serde_bytes_shim {
        pub fn serialize<S: serde::Serializer>(data: &&[u8], s: S) -> Result<S::Ok, S::Error> {
            s.serialize_bytes(data)
        }
    }

    let value = to_value(&Blob { data: b"raw" }).unwrap();
    let back = round_trip(&value);
    let data = back.get("data").unwrap();
    assert_eq!(data.downcast_ref::<Buffer>().unwrap().as_slice(), b"raw");
}

#[test]
fn test_deep_linked_list_does_not_overflow() {
    let head = Object::new();
    let mut tail = head.clone();
    for i in 0..1_000 {
        let next = Object::new();
        tail.insert("value", i);
        tail.insert("next", next.clone());
        tail = next;
    }
    tail.insert("next", Value::Null);

    let back = round_trip(&Value::Object(head));
    let mut node = back;
    let mut count = 0;
    while let Some(next) = node.get("next") {
        if next.is_null() {
            break;
        }
        count += 1;
        node = next;
    }
    assert_eq!(count, 1_000);
}

#[test]
fn test_pretty_output_decodes() {
    let value = arson!({ "list": [1, _, "three"], "flag": false });
    let text = encode_pretty(&value).unwrap();
    assert!(text.lines().count() > 1);

    let back = decode(&text).unwrap();
    let list = back.get("list").unwrap();
    assert!(list.as_array().unwrap().is_hole(1));
    assert_eq!(list.at(2), Some(Value::from("three")));
}
