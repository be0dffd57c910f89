//! Property-based tests for the round-trip guarantees.
//!
//! Generated trees are compared structurally; graph-specific properties
//! (sharing, cycles, holes) are checked on generated shapes as well.

use arson::{decode, encode, Array, Number, Object, Value};
use proptest::prelude::*;

/// Structural comparison that ignores identity.
fn same_shape(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Array(x), Value::Array(y)) => {
            let (x, y) = (x.to_vec(), y.to_vec());
            x.len() == y.len()
                && x.iter().zip(&y).all(|pair| match pair {
                    (Some(p), Some(q)) => same_shape(p, q),
                    (None, None) => true,
                    _ => false,
                })
        }
        (Value::Object(x), Value::Object(y)) => {
            let (x, y) = (x.entries().clone(), y.entries().clone());
            x.len() == y.len()
                && x.iter().zip(y.iter()).all(|((kx, vx), (ky, vy))| {
                    kx == ky && same_shape(vx, vy)
                })
        }
        _ => a == b,
    }
}

fn roundtrip(value: &Value) -> Value {
    let text = encode(value).unwrap();
    decode(&text).unwrap()
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_map(Value::from),
        ".*".prop_map(Value::from),
    ]
}

fn tree() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 64, 6, |inner| {
        prop_oneof![
            prop::collection::vec(proptest::option::of(inner.clone()), 0..6)
                .prop_map(|slots| Value::Array(Array::from_slots(slots))),
            prop::collection::vec(("[a-z]{0,4}", inner), 0..6).prop_map(|entries| {
                let object = Object::new();
                for (key, value) in entries {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_scalar(value in scalar()) {
        prop_assert_eq!(roundtrip(&value), value);
    }

    #[test]
    fn prop_i64(n in any::<i64>()) {
        let back = roundtrip(&Value::from(n));
        prop_assert_eq!(back.as_number(), Some(Number::Integer(n)));
    }

    #[test]
    fn prop_f64_keeps_float_kind(f in any::<f64>()) {
        let back = roundtrip(&Value::from(f));
        prop_assert_eq!(&back, &Value::from(f));
        if f.is_finite() {
            prop_assert!(back.as_number().unwrap().is_float());
        }
    }

    #[test]
    fn prop_tree(value in tree()) {
        let back = roundtrip(&value);
        prop_assert!(same_shape(&value, &back), "{:?} decoded differently", value);
    }

    #[test]
    fn prop_sparse_array(slots in prop::collection::vec(proptest::option::of(any::<i32>()), 0..24)) {
        let array = Array::from_slots(slots.iter().map(|slot| slot.map(Value::from)).collect());
        let back = roundtrip(&Value::Array(array));
        let back = back.as_array().unwrap();
        prop_assert_eq!(back.len(), slots.len());
        for (index, slot) in slots.iter().enumerate() {
            prop_assert_eq!(back.is_hole(index), slot.is_none());
        }
    }

    #[test]
    fn prop_shared_child_stays_shared(copies in 2usize..8, key in "[a-z]{1,6}") {
        let child = Value::object([(key.as_str(), Value::from(1))]);
        let root = Value::array(std::iter::repeat(child).take(copies));

        let back = roundtrip(&root);
        let first = back.at(0).unwrap();
        for index in 1..copies {
            prop_assert!(first.ptr_eq(&back.at(index).unwrap()));
        }
    }

    #[test]
    fn prop_cycle_length(len in 1usize..16) {
        // A ring of `len` objects, each pointing at the next.
        let nodes: Vec<Object> = (0..len).map(|_| Object::new()).collect();
        for (index, node) in nodes.iter().enumerate() {
            node.insert("next", nodes[(index + 1) % len].clone());
        }

        let back = roundtrip(&Value::Object(nodes[0].clone()));
        let mut node = back.clone();
        for _ in 0..len {
            node = node.get("next").unwrap();
        }
        prop_assert!(node.ptr_eq(&back));
    }
}
