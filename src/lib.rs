//! # arson
//!
//! Encode arbitrary value graphs, including cycles, shared references,
//! sparse arrays and exotic types, as plain JSON.
//!
//! ## How it works
//!
//! JSON can only describe trees. `arson` flattens a graph into a *table*: a
//! JSON array where every distinct node is stored once and children are
//! referred to by their index in the table. Entry 0 is the root.
//!
//! ```text
//! value                    table
//! {self: <itself>}         [{"self":0}]
//! [1, <hole>, 3]           [[1,-2,2],1,3]
//! NaN                      -3
//! ```
//!
//! Five negative integers are reserved for values JSON cannot spell:
//! `-1` undefined, `-2` an array hole, `-3` NaN, `-4` +Infinity and
//! `-5` -Infinity.
//!
//! ## Key Features
//!
//! - **Identity preserving**: a node reachable along two paths decodes as one node
//! - **Cycle safe**: self-references round-trip, with no recursion on deep graphs
//! - **Sparse arrays**: holes stay holes, distinct from `undefined`
//! - **Extensible**: register your own types next to the built-in `Buffer`,
//!   `Date`, `RegExp`, `Map` and `Set`
//!
//! ## Quick Start
//!
//! ```rust
//! use arson::{arson, decode, encode, Value};
//!
//! let shared = arson!({ "id": 7 });
//! let root = Value::array([shared.clone(), shared]);
//!
//! let text = encode(&root).unwrap();
//! assert_eq!(text, r#"[[1,1],{"id":2},7]"#);
//!
//! let back = decode(&text).unwrap();
//! assert!(back.at(0).unwrap().ptr_eq(&back.at(1).unwrap()));
//! ```
//!
//! ### Custom types
//!
//! ```rust
//! use arson::{decode, encode, register_type, FnHandler, Reconstruction, Value};
//!
//! #[derive(Debug, PartialEq)]
//! struct Point(i64, i64);
//!
//! register_type(
//!     "Point",
//!     FnHandler::new(
//!         |value| {
//!             let p = value.downcast_ref::<Point>()?;
//!             Some(vec![Value::from(p.0), Value::from(p.1)])
//!         },
//!         || {
//!             Reconstruction::immediate(|args| {
//!                 let x = args.first().and_then(Value::as_i64).unwrap_or_default();
//!                 let y = args.get(1).and_then(Value::as_i64).unwrap_or_default();
//!                 Ok(Value::exotic(Point(x, y)))
//!             })
//!         },
//!     ),
//! )
//! .unwrap();
//!
//! let text = encode(&Value::exotic(Point(3, 4))).unwrap();
//! assert_eq!(text, r#"[["Point",1,2],3,4]"#);
//! assert_eq!(*decode(&text).unwrap().downcast_ref::<Point>().unwrap(), Point(3, 4));
//! ```
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade and installs no logger. Fallbacks
//! (an exotic value no type claims, an unknown type tag) are logged at `warn`.

mod de;
mod intern;

pub mod builtins;
pub mod error;
pub mod macros;
pub mod map;
pub mod options;
pub mod registry;
pub mod ser;
pub mod table;
pub mod value;

pub use builtins::{Buffer, Pattern, PatternFlags, ValueMap, ValueSet};
pub use error::{Error, Result};
pub use map::Map;
pub use options::{Options, UnknownTypes};
pub use registry::{FnHandler, FnHandlerBuilder, Reconstruction, Registry, TypeHandler};
pub use ser::ValueSerializer;
pub use table::{Cell, Document, Entry, Sentinel};
pub use value::{Array, Exotic, ExoticObject, Number, Object, Value};

use serde::Serialize;
use std::io;

/// Encodes a value graph as a compact table using the global registry.
///
/// # Examples
///
/// ```rust
/// use arson::{encode, Value};
///
/// assert_eq!(encode(&Value::from("asdf")).unwrap(), r#"["asdf"]"#);
/// assert_eq!(encode(&Value::Undefined).unwrap(), "-1");
/// ```
///
/// # Errors
///
/// Returns an error if the table cannot be written as JSON.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode(value: &Value) -> Result<String> {
    registry::snapshot().encode(value)
}

/// Encodes a value graph as a pretty-printed table.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_pretty(value: &Value) -> Result<String> {
    encode_with_options(value, &Options::pretty())
}

#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_with_options(value: &Value, options: &Options) -> Result<String> {
    registry::snapshot().encode_with_options(value, options)
}

/// Encodes a value graph straight into a writer.
///
/// # Examples
///
/// ```rust
/// use arson::{encode_to_writer, Value};
///
/// let mut buffer = Vec::new();
/// encode_to_writer(&mut buffer, &Value::from(true)).unwrap();
/// assert_eq!(buffer, b"[true]");
/// ```
///
/// # Errors
///
/// Returns [`Error::Io`] if writing fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn encode_to_writer<W>(writer: W, value: &Value) -> Result<()>
where
    W: io::Write,
{
    let document = registry::snapshot().tabulate(value);
    serde_json::to_writer(writer, &document)?;
    Ok(())
}

/// Decodes a table back into a value graph using the global registry.
///
/// # Examples
///
/// ```rust
/// use arson::decode;
///
/// let value = decode(r#"[{"foo":-1}]"#).unwrap();
/// assert!(value.get("foo").unwrap().is_undefined());
/// ```
///
/// # Errors
///
/// Returns [`Error::Syntax`] for text that is not JSON and
/// [`Error::InvalidEncoding`] or [`Error::InvalidSentinel`] for JSON that is
/// not a table.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode(text: &str) -> Result<Value> {
    decode_with_options(text, &Options::default())
}

#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_with_options(text: &str, options: &Options) -> Result<Value> {
    registry::snapshot().decode_with_options(text, options)
}

/// Decodes a table from UTF-8 bytes.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_slice(bytes: &[u8]) -> Result<Value> {
    let document: Document = serde_json::from_slice(bytes)?;
    registry::snapshot().detabulate(&document, &Options::default())
}

/// Decodes a table from an I/O stream.
///
/// # Examples
///
/// ```rust
/// use arson::decode_reader;
/// use std::io::Cursor;
///
/// let value = decode_reader(Cursor::new(b"[[1,-2,2],1,3]")).unwrap();
/// assert_eq!(value.as_array().unwrap().len(), 3);
/// ```
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn decode_reader<R>(reader: R) -> Result<Value>
where
    R: io::Read,
{
    let document: Document = serde_json::from_reader(reader)?;
    registry::snapshot().detabulate(&document, &Options::default())
}

/// Registers a type in the global registry.
///
/// Register types during start-up; a name that is already registered keeps
/// its place in the claim order and gets the new handler.
///
/// # Errors
///
/// Returns [`Error::InvalidHandler`] for an empty name.
pub fn register_type<H>(name: &str, handler: H) -> Result<()>
where
    H: TypeHandler + 'static,
{
    registry::global_mut().register(name, handler)?;
    Ok(())
}

/// Converts any `T: Serialize` to a [`Value`].
///
/// # Examples
///
/// ```rust
/// use arson::to_value;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32 }
///
/// let value = to_value(&Point { x: 1, y: 2 }).unwrap();
/// assert_eq!(value.get("y").and_then(|v| v.as_i64()), Some(2));
/// ```
///
/// # Errors
///
/// Returns [`Error::UnsupportedType`] for map keys that cannot be object keys.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value>
where
    T: ?Sized + Serialize,
{
    ser::to_value(value)
}
