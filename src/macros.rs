/// Builds a [`Value`](crate::Value) from a JSON-like literal.
///
/// `undefined`, `null`, `true` and `false` are keywords, `_` inside an array
/// is a hole, and any other expression goes through `Value::from`.
///
/// # Examples
///
/// ```rust
/// use arson::{arson, Value};
///
/// let value = arson!({
///     "name": "Alice",
///     "tags": ["a", _, "c"],
///     "missing": undefined
/// });
///
/// assert_eq!(value.get("name"), Some(Value::from("Alice")));
/// assert!(value.get("tags").unwrap().as_array().unwrap().is_hole(1));
/// assert_eq!(value.get("missing"), Some(Value::Undefined));
/// ```
#[macro_export]
macro_rules! arson {
    (undefined) => {
        $crate::Value::Undefined
    };

    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array($crate::Array::new())
    };

    ([ $($tt:tt)+ ]) => {
        $crate::Value::Array($crate::Array::from_slots($crate::arson!(@array [] $($tt)+)))
    };

    ({}) => {
        $crate::Value::Object($crate::Object::new())
    };

    ({ $($tt:tt)+ }) => {{
        let object = $crate::Object::new();
        $crate::arson!(@object object $($tt)+);
        $crate::Value::Object(object)
    }};

    // Array elements, one at a time. `_` is a hole.
    (@array [$($slots:expr,)*]) => {
        ::std::vec![$($slots,)*]
    };

    (@array [$($slots:expr,)*] _ $(, $($rest:tt)*)?) => {
        $crate::arson!(@array [$($slots,)* ::std::option::Option::None,] $($($rest)*)?)
    };

    (@array [$($slots:expr,)*] - $n:literal $(, $($rest:tt)*)?) => {
        $crate::arson!(
            @array [$($slots,)* ::std::option::Option::Some($crate::Value::from(-$n)),]
            $($($rest)*)?
        )
    };

    (@array [$($slots:expr,)*] $elem:tt $(, $($rest:tt)*)?) => {
        $crate::arson!(
            @array [$($slots,)* ::std::option::Option::Some($crate::arson!($elem)),]
            $($($rest)*)?
        )
    };

    // Object properties, one at a time.
    (@object $object:ident) => {};

    (@object $object:ident $key:literal : - $n:literal $(, $($rest:tt)*)?) => {
        $object.insert($key, $crate::Value::from(-$n));
        $crate::arson!(@object $object $($($rest)*)?);
    };

    (@object $object:ident $key:literal : $value:tt $(, $($rest:tt)*)?) => {
        $object.insert($key, $crate::arson!($value));
        $crate::arson!(@object $object $($($rest)*)?);
    };

    ($s:expr) => {
        $crate::Value::from($s)
    };
}

#[cfg(test)]
mod tests {
    use crate::{Number, Value};

    #[test]
    fn test_arson_macro_primitives() {
        assert_eq!(arson!(undefined), Value::Undefined);
        assert_eq!(arson!(null), Value::Null);
        assert_eq!(arson!(true), Value::Bool(true));
        assert_eq!(arson!(false), Value::Bool(false));
        assert_eq!(arson!(42), Value::Number(Number::Integer(42)));
        assert_eq!(arson!(3.5), Value::Number(Number::Float(3.5)));
        assert_eq!(arson!("hello"), Value::String("hello".to_string()));
    }

    #[test]
    fn test_arson_macro_arrays() {
        assert!(arson!([]).as_array().unwrap().is_empty());

        let arr = arson!([1, _, 3]);
        let array = arr.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array.get(0), Some(Value::from(1)));
        assert!(array.is_hole(1));
        assert_eq!(array.get(2), Some(Value::from(3)));
    }

    #[test]
    fn test_arson_macro_negative_literals() {
        let arr = arson!([-1, _, -2.5, 3]);
        let array = arr.as_array().unwrap();
        assert_eq!(array.get(0), Some(Value::from(-1)));
        assert!(array.is_hole(1));
        assert_eq!(array.get(2), Some(Value::from(-2.5)));
        assert_eq!(array.get(3), Some(Value::from(3)));

        let obj = arson!({"a": -1, "b": [-7], "c": 2,});
        assert_eq!(obj.get("a"), Some(Value::from(-1)));
        assert_eq!(obj.get("b").unwrap().at(0), Some(Value::from(-7)));
        assert_eq!(obj.get("c"), Some(Value::from(2)));
    }

    #[test]
    fn test_arson_macro_objects() {
        assert!(arson!({}).as_object().unwrap().is_empty());

        let obj = arson!({
            "name": "Alice",
            "age": 30,
            "nested": { "ok": true }
        });

        let object = obj.as_object().unwrap();
        assert_eq!(object.len(), 3);
        assert_eq!(object.get("name"), Some(Value::from("Alice")));
        assert_eq!(object.get("age"), Some(Value::from(30)));
        assert_eq!(obj.get("nested").unwrap().get("ok"), Some(Value::Bool(true)));
    }
}
