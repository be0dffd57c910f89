//! In-memory value graph.
//!
//! This module provides the [`Value`] enum, the graph that [`encode`](crate::encode)
//! flattens and [`decode`](crate::decode) rebuilds.
//!
//! ## Core Types
//!
//! - [`Value`]: undefined, null, bool, number, string, array, object or exotic value
//! - [`Number`]: integers, floats and the non-finite values (Infinity, -Infinity, NaN)
//! - [`Array`], [`Object`], [`Exotic`]: shared handles to compound values
//!
//! ## Identity
//!
//! Compound values are reference-counted handles with interior mutability.
//! Cloning a handle clones the reference, not the contents, so two paths in a
//! graph can reach the same node and a node can reach itself:
//!
//! ```rust
//! use arson::{Object, Value};
//!
//! let obj = Object::new();
//! obj.insert("self", Value::Object(obj.clone()));
//!
//! let root = Value::Object(obj);
//! assert!(root.get("self").unwrap().ptr_eq(&root));
//! ```
//!
//! Equality follows the same rule: primitives compare by value (NaN equals
//! NaN), compound values compare by identity. Two structurally equal but
//! distinct objects are different values.

use crate::builtins::{Buffer, Pattern, ValueMap, ValueSet};
use crate::Map;
use chrono::{DateTime, Utc};
use std::any::{Any, TypeId};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

/// A node of a value graph.
///
/// # Examples
///
/// ```rust
/// use arson::{Number, Value};
///
/// let undefined = Value::Undefined;
/// let num = Value::Number(Number::Integer(42));
/// let text = Value::from("hello");
///
/// assert!(undefined.is_undefined());
/// assert!(num.is_number());
/// assert!(text.is_string());
/// ```
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Array),
    Object(Object),
    Exotic(Exotic),
}

/// A numeric value that can be an integer, float, or one of the non-finite values.
///
/// Integers and floats stay distinct through a round trip: `Integer(2)` is
/// written as `2` and `Float(2.0)` as `2.0`.
///
/// # Examples
///
/// ```rust
/// use arson::Number;
///
/// let integer = Number::Integer(42);
/// let infinity = Number::from(f64::INFINITY);
///
/// assert!(integer.is_integer());
/// assert_eq!(integer.as_i64(), Some(42));
/// assert_eq!(infinity, Number::Infinity);
/// assert_eq!(Number::from(f64::NAN), Number::NaN);
/// ```
#[derive(Clone, Copy, Debug)]
pub enum Number {
    Integer(i64),
    Float(f64),
    Infinity,
    NegativeInfinity,
    NaN,
}

/// Hashable identity of a number: NaN equals NaN and -0.0 equals 0.0.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum NumberKey {
    Integer(i64),
    Float(u64),
    Infinity,
    NegativeInfinity,
    NaN,
}

impl Number {
    /// Returns `true` if this is an integer value.
    #[inline]
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(self, Number::Integer(_))
    }

    /// Returns `true` if this is a floating-point value.
    #[inline]
    #[must_use]
    pub const fn is_float(&self) -> bool {
        matches!(self, Number::Float(_))
    }

    /// Returns `true` for integers and finite floats.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Number;
    ///
    /// assert!(Number::Integer(1).is_finite());
    /// assert!(!Number::NaN.is_finite());
    /// assert!(!Number::Float(f64::INFINITY).is_finite());
    /// ```
    #[inline]
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Float(f) => f.is_finite(),
            _ => false,
        }
    }

    /// Converts this number to an `i64` if possible.
    ///
    /// Returns `Some(i64)` for integers and floats with no fractional part
    /// that fit in i64 range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Number;
    ///
    /// assert_eq!(Number::Integer(42).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.0).as_i64(), Some(42));
    /// assert_eq!(Number::Float(42.5).as_i64(), None);
    /// assert_eq!(Number::Infinity.as_i64(), None);
    /// ```
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Number::Integer(i) => Some(*i),
            Number::Float(f) => {
                if f.fract() == 0.0 && *f >= i64::MIN as f64 && *f <= i64::MAX as f64 {
                    Some(*f as i64)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Converts this number to an `f64`.
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Integer(i) => *i as f64,
            Number::Float(f) => *f,
            Number::Infinity => f64::INFINITY,
            Number::NegativeInfinity => f64::NEG_INFINITY,
            Number::NaN => f64::NAN,
        }
    }

    pub(crate) fn key(&self) -> NumberKey {
        match *self {
            Number::Integer(i) => NumberKey::Integer(i),
            Number::Float(f) if f.is_nan() => NumberKey::NaN,
            Number::Float(f) if f == f64::INFINITY => NumberKey::Infinity,
            Number::Float(f) if f == f64::NEG_INFINITY => NumberKey::NegativeInfinity,
            // -0.0 and 0.0 are the same number
            Number::Float(f) if f == 0.0 => NumberKey::Float(0f64.to_bits()),
            Number::Float(f) => NumberKey::Float(f.to_bits()),
            Number::Infinity => NumberKey::Infinity,
            Number::NegativeInfinity => NumberKey::NegativeInfinity,
            Number::NaN => NumberKey::NaN,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Number {}

impl Hash for Number {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(i) => write!(f, "{}", i),
            Number::Float(fl) => write!(f, "{}", fl),
            Number::Infinity => write!(f, "Infinity"),
            Number::NegativeInfinity => write!(f, "-Infinity"),
            Number::NaN => write!(f, "NaN"),
        }
    }
}

macro_rules! number_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Number {
                fn from(value: $ty) -> Self {
                    Number::Integer(value as i64)
                }
            }
        )*
    };
}

number_from_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Number {
    fn from(value: u64) -> Self {
        if value <= i64::MAX as u64 {
            Number::Integer(value as i64)
        } else {
            Number::Float(value as f64)
        }
    }
}

impl From<f32> for Number {
    fn from(value: f32) -> Self {
        Number::from(value as f64)
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        if value.is_nan() {
            Number::NaN
        } else if value == f64::INFINITY {
            Number::Infinity
        } else if value == f64::NEG_INFINITY {
            Number::NegativeInfinity
        } else {
            Number::Float(value)
        }
    }
}

/// Shared handle to a possibly sparse sequence.
///
/// Each slot is either `Some(value)` or a hole (`None`). A hole is not the
/// same as [`Value::Undefined`]: it survives a round trip as a gap.
///
/// # Examples
///
/// ```rust
/// use arson::{Array, Value};
///
/// let array = Array::with_holes(3);
/// array.set(1, Value::from(3));
///
/// assert_eq!(array.len(), 3);
/// assert!(array.is_hole(0));
/// assert_eq!(array.get(1), Some(Value::from(3)));
/// ```
#[derive(Clone, Default)]
pub struct Array(Rc<RefCell<Vec<Option<Value>>>>);

impl Array {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an array from explicit slots, `None` marking a hole.
    #[must_use]
    pub fn from_slots(slots: Vec<Option<Value>>) -> Self {
        Array(Rc::new(RefCell::new(slots)))
    }

    /// Creates an array of `len` holes.
    #[must_use]
    pub fn with_holes(len: usize) -> Self {
        Self::from_slots(vec![None; len])
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns the value at `index`, or `None` for a hole or an index past the end.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.borrow().get(index).cloned().flatten()
    }

    /// Returns `true` if `index` is inside the array and holds no value.
    #[must_use]
    pub fn is_hole(&self, index: usize) -> bool {
        matches!(self.0.borrow().get(index), Some(None))
    }

    pub fn push(&self, value: impl Into<Value>) {
        self.0.borrow_mut().push(Some(value.into()));
    }

    pub fn push_hole(&self) {
        self.0.borrow_mut().push(None);
    }

    /// Stores `value` at `index`, growing the array with holes if needed.
    pub fn set(&self, index: usize, value: impl Into<Value>) {
        let mut slots = self.0.borrow_mut();
        if index >= slots.len() {
            slots.resize(index + 1, None);
        }
        slots[index] = Some(value.into());
    }

    /// Borrows the slots for inspection.
    pub fn slots(&self) -> Ref<'_, Vec<Option<Value>>> {
        self.0.borrow()
    }

    /// Copies the slots out of the array.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Option<Value>> {
        self.0.borrow().clone()
    }

    pub(crate) fn replace(&self, slots: Vec<Option<Value>>) {
        *self.0.borrow_mut() = slots;
    }

    /// Returns `true` if both handles point at the same array.
    #[must_use]
    pub fn ptr_eq(&self, other: &Array) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: the array may contain itself.
        match self.0.try_borrow() {
            Ok(slots) => write!(f, "Array(len {}) @{:#x}", slots.len(), self.addr()),
            Err(_) => write!(f, "Array(<borrowed>) @{:#x}", self.addr()),
        }
    }
}

impl From<Vec<Value>> for Array {
    fn from(values: Vec<Value>) -> Self {
        Array::from_slots(values.into_iter().map(Some).collect())
    }
}

impl FromIterator<Value> for Array {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Array::from_slots(iter.into_iter().map(Some).collect())
    }
}

/// Shared handle to a plain object.
#[derive(Clone, Default)]
pub struct Object(Rc<RefCell<Map>>);

impl Object {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_map(map: Map) -> Self {
        Object(Rc::new(RefCell::new(map)))
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.0.borrow().get(key).cloned()
    }

    /// Inserts a property, returning the previous value for the key.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.borrow_mut().insert(key.into(), value.into())
    }

    pub fn remove(&self, key: &str) -> Option<Value> {
        self.0.borrow_mut().remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.borrow().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Returns the keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().keys().cloned().collect()
    }

    /// Borrows the properties for inspection.
    pub fn entries(&self) -> Ref<'_, Map> {
        self.0.borrow()
    }

    pub(crate) fn replace(&self, map: Map) {
        *self.0.borrow_mut() = map;
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(map) => {
                let keys: Vec<&str> = map.keys().map(String::as_str).collect();
                write!(f, "Object({:?}) @{:#x}", keys, self.addr())
            }
            Err(_) => write!(f, "Object(<borrowed>) @{:#x}", self.addr()),
        }
    }
}

/// Anything that can live behind an [`Exotic`] handle.
///
/// Implemented for every `'static` type with a `Debug` impl.
pub trait ExoticObject: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any + fmt::Debug> ExoticObject for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

struct ExoticCell<T: ?Sized> {
    type_id: TypeId,
    type_name: &'static str,
    value: RefCell<T>,
}

/// Shared handle to a value of an arbitrary Rust type.
///
/// Exotic values are written as tagged entries by the first registered
/// [`TypeHandler`](crate::TypeHandler) that claims them.
///
/// # Examples
///
/// ```rust
/// use arson::Exotic;
///
/// let handle = Exotic::new(vec![1u8, 2, 3]);
/// assert!(handle.is::<Vec<u8>>());
/// assert_eq!(handle.downcast_ref::<Vec<u8>>().unwrap().len(), 3);
///
/// handle.downcast_mut::<Vec<u8>>().unwrap().push(4);
/// assert_eq!(*handle.downcast_ref::<Vec<u8>>().unwrap(), vec![1, 2, 3, 4]);
/// ```
#[derive(Clone)]
pub struct Exotic(Rc<ExoticCell<dyn ExoticObject>>);

impl Exotic {
    pub fn new<T: ExoticObject>(value: T) -> Self {
        let cell: Rc<ExoticCell<dyn ExoticObject>> = Rc::new(ExoticCell {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: RefCell::new(value),
        });
        Exotic(cell)
    }

    /// Returns `true` if the handle holds a `T`.
    #[must_use]
    pub fn is<T: Any>(&self) -> bool {
        self.0.type_id == TypeId::of::<T>()
    }

    /// The Rust type name of the held value, for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.0.type_name
    }

    /// Borrows the held value as a `T`.
    ///
    /// Returns `None` if the value is not a `T` or is mutably borrowed.
    pub fn downcast_ref<T: Any>(&self) -> Option<Ref<'_, T>> {
        if !self.is::<T>() {
            return None;
        }
        let borrowed = self.0.value.try_borrow().ok()?;
        Ref::filter_map(borrowed, |value| value.as_any().downcast_ref::<T>()).ok()
    }

    /// Mutably borrows the held value as a `T`.
    ///
    /// Returns `None` if the value is not a `T` or is already borrowed.
    pub fn downcast_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        if !self.is::<T>() {
            return None;
        }
        let borrowed = self.0.value.try_borrow_mut().ok()?;
        RefMut::filter_map(borrowed, |value| value.as_any_mut().downcast_mut::<T>()).ok()
    }

    /// Returns `true` if both handles point at the same value.
    #[must_use]
    pub fn ptr_eq(&self, other: &Exotic) -> bool {
        self.addr() == other.addr()
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for Exotic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Exotic<{}> @{:#x}", self.0.type_name, self.addr())
    }
}

impl Value {
    /// Creates an array value from dense elements.
    pub fn array<I: IntoIterator<Item = Value>>(elements: I) -> Value {
        Value::Array(elements.into_iter().collect())
    }

    /// Creates an object value from key-value pairs.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Value;
    ///
    /// let point = Value::object([("x", Value::from(1)), ("y", Value::from(2))]);
    /// assert_eq!(point.get("y"), Some(Value::from(2)));
    /// ```
    pub fn object<K, I>(entries: I) -> Value
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let map = entries.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Value::Object(Object::from_map(map))
    }

    /// Wraps any `'static + Debug` Rust value as an exotic value.
    pub fn exotic<T: ExoticObject>(value: T) -> Value {
        Value::Exotic(Exotic::new(value))
    }

    /// Creates a byte buffer value.
    pub fn buffer(bytes: impl Into<Vec<u8>>) -> Value {
        Value::exotic(Buffer::from(bytes.into()))
    }

    /// Creates a point-in-time value.
    pub fn date(instant: DateTime<Utc>) -> Value {
        Value::exotic(instant)
    }

    /// Creates a pattern-matcher value.
    pub fn pattern(pattern: Pattern) -> Value {
        Value::exotic(pattern)
    }

    /// Creates a hash-map value from key-value pairs.
    pub fn map<I: IntoIterator<Item = (Value, Value)>>(entries: I) -> Value {
        Value::exotic(entries.into_iter().collect::<ValueMap>())
    }

    /// Creates a hash-set value from elements.
    pub fn set<I: IntoIterator<Item = Value>>(elements: I) -> Value {
        Value::exotic(elements.into_iter().collect::<ValueSet>())
    }

    #[inline]
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    #[must_use]
    pub const fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    #[inline]
    #[must_use]
    pub const fn is_exotic(&self) -> bool {
        matches!(self, Value::Exotic(_))
    }

    /// Returns `true` for arrays, objects and exotic values.
    #[inline]
    #[must_use]
    pub const fn is_compound(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_) | Value::Exotic(_))
    }

    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// If the value is an i64 integer or a whole-number float, returns it.
    #[inline]
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub fn as_exotic(&self) -> Option<&Exotic> {
        match self {
            Value::Exotic(exotic) => Some(exotic),
            _ => None,
        }
    }

    /// Borrows an exotic value as a `T`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::{Buffer, Value};
    ///
    /// let value = Value::buffer(vec![1, 2, 3]);
    /// assert_eq!(value.downcast_ref::<Buffer>().unwrap().as_slice(), &[1, 2, 3]);
    /// assert!(Value::from(1).downcast_ref::<Buffer>().is_none());
    /// ```
    pub fn downcast_ref<T: Any>(&self) -> Option<Ref<'_, T>> {
        self.as_exotic()?.downcast_ref::<T>()
    }

    /// Mutably borrows an exotic value as a `T`.
    pub fn downcast_mut<T: Any>(&self) -> Option<RefMut<'_, T>> {
        self.as_exotic()?.downcast_mut::<T>()
    }

    /// Looks up a property of an object value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.as_object()?.get(key)
    }

    /// Looks up an element of an array value. Holes read as `None`.
    #[must_use]
    pub fn at(&self, index: usize) -> Option<Value> {
        self.as_array()?.get(index)
    }

    /// Returns `true` if both values are the same compound node.
    ///
    /// Primitives never share identity, so this is `false` for them.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Array(a), Value::Array(b)) => a.ptr_eq(b),
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Exotic(a), Value::Exotic(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            _ => self.ptr_eq(other),
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Undefined | Value::Null => {}
            Value::Bool(b) => b.hash(state),
            Value::Number(n) => n.hash(state),
            Value::String(s) => s.hash(state),
            Value::Array(a) => a.addr().hash(state),
            Value::Object(o) => o.addr().hash(state),
            Value::Exotic(e) => e.addr().hash(state),
        }
    }
}

// TryFrom implementations for extracting values from Value
impl TryFrom<Value> for i64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_i64()
            .ok_or_else(|| crate::Error::custom(format!("expected integer, found {:?}", value)))
    }
}

impl TryFrom<Value> for f64 {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        value
            .as_f64()
            .ok_or_else(|| crate::Error::custom(format!("expected number, found {:?}", value)))
    }
}

impl TryFrom<Value> for bool {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            _ => Err(crate::Error::custom(format!(
                "expected bool, found {:?}",
                value
            ))),
        }
    }
}

impl TryFrom<Value> for String {
    type Error = crate::Error;

    fn try_from(value: Value) -> crate::Result<Self> {
        match value {
            Value::String(s) => Ok(s),
            _ => Err(crate::Error::custom(format!(
                "expected string, found {:?}",
                value
            ))),
        }
    }
}

// From implementations for creating Value from primitives
impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

macro_rules! value_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Number(Number::from(value))
                }
            }
        )*
    };
}

value_from_number!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl From<Number> for Value {
    fn from(value: Number) -> Self {
        Value::Number(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(Array::from(value))
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(Object::from_map(value))
    }
}

impl From<Array> for Value {
    fn from(value: Array) -> Self {
        Value::Array(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}

impl From<Exotic> for Value {
    fn from(value: Exotic) -> Self {
        Value::Exotic(value)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(value: DateTime<Utc>) -> Self {
        Value::date(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_primitive_equality_is_by_value() {
        assert_eq!(Value::from("a"), Value::from("a"));
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
        assert_eq!(Value::from(0.0), Value::from(-0.0));
        assert_ne!(Value::from(1), Value::from(1.0));
        assert_ne!(Value::Null, Value::Undefined);
    }

    #[test]
    fn test_compound_equality_is_by_identity() {
        let a = Value::object([("x", Value::from(1))]);
        let b = Value::object([("x", Value::from(1))]);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert!(a.ptr_eq(&a.clone()));
        assert!(!Value::from(1).ptr_eq(&Value::from(1)));
    }

    #[test]
    fn test_hash_matches_equality() {
        let shared = Value::array([Value::from(1)]);
        let mut set = HashSet::new();
        set.insert(shared.clone());
        set.insert(shared);
        set.insert(Value::array([Value::from(1)]));
        set.insert(Value::from(f64::NAN));
        set.insert(Value::Number(Number::NaN));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_non_finite_floats_normalize() {
        assert_eq!(Number::from(f64::INFINITY), Number::Infinity);
        assert!(matches!(Number::from(f64::NEG_INFINITY), Number::NegativeInfinity));
        assert!(matches!(Number::from(f64::NAN), Number::NaN));
        assert_eq!(Number::Float(f64::NAN), Number::NaN);
    }

    #[test]
    fn test_array_holes() {
        let array = Array::new();
        array.push(1);
        array.push_hole();
        array.set(4, Value::Undefined);

        assert_eq!(array.len(), 5);
        assert!(array.is_hole(1));
        assert!(array.is_hole(3));
        assert!(!array.is_hole(4));
        assert_eq!(array.get(4), Some(Value::Undefined));
        assert_eq!(array.get(1), None);
        assert!(!array.is_hole(10));
    }

    #[test]
    fn test_self_referential_object_debug_terminates() {
        let obj = Object::new();
        obj.insert("self", obj.clone());
        let rendered = format!("{:?}", Value::Object(obj));
        assert!(rendered.contains("self"));
    }

    #[test]
    fn test_exotic_downcast() {
        #[derive(Debug, PartialEq)]
        struct Celsius(f64);

        let value = Value::exotic(Celsius(21.5));
        assert!(value.as_exotic().unwrap().is::<Celsius>());
        assert_eq!(*value.downcast_ref::<Celsius>().unwrap(), Celsius(21.5));
        assert!(value.downcast_ref::<String>().is_none());
        assert!(value
            .as_exotic()
            .unwrap()
            .type_name()
            .ends_with("Celsius"));
    }

    #[test]
    fn test_exotic_borrow_conflict_is_none() {
        let value = Exotic::new(String::from("x"));
        let _guard = value.downcast_mut::<String>().unwrap();
        assert!(value.downcast_ref::<String>().is_none());
    }

    #[test]
    fn test_tryfrom() {
        assert_eq!(i64::try_from(Value::from(42)).unwrap(), 42);
        assert_eq!(f64::try_from(Value::from(42)).unwrap(), 42.0);
        assert!(bool::try_from(Value::from(1)).is_err());
        assert_eq!(String::try_from(Value::from("hi")).unwrap(), "hi");
    }

    #[test]
    fn test_from_option() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::from(3));
    }
}
