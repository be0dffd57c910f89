//! Table encoding.
//!
//! This module turns a [`Value`] graph into a [`Document`] and writes it out
//! as JSON. It also provides [`ValueSerializer`], which builds a [`Value`]
//! from any `T: Serialize`.
//!
//! ## Overview
//!
//! Encoding drains the [`Interner`] worklist, turning each node into one
//! entry:
//!
//! - **Scalars** (null, bool, finite number, string) are copied verbatim
//! - **Claimed values** become tagged entries `[name, cell, ...]`
//! - **Plain arrays** become arrays of cells, holes written as `-2`
//! - **Plain objects** become records of cells
//!
//! ```rust
//! use arson::{encode, Object, Value};
//!
//! let obj = Object::new();
//! obj.insert("self", obj.clone());
//! assert_eq!(encode(&Value::Object(obj)).unwrap(), r#"[{"self":0}]"#);
//!
//! assert_eq!(encode(&Value::from(f64::NAN)).unwrap(), "-3");
//! ```

use crate::intern::Interner;
use crate::table::{Cell, Document, Entry};
use crate::{Error, Map, Number, Options, Registry, Result, Value};
use indexmap::IndexMap;
use serde::{ser, Serialize};

/// Drives one encode: owns the interner and the entries produced so far.
pub(crate) struct Tabulator<'a> {
    registry: &'a Registry,
    interner: Interner,
}

impl<'a> Tabulator<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Tabulator {
            registry,
            interner: Interner::new(),
        }
    }

    pub(crate) fn run(mut self, root: &Value) -> Document {
        let root = self.interner.index_of(root);
        if root.is_sentinel() {
            return Document::Sentinel(root);
        }

        let mut entries = Vec::new();
        while let Some(node) = self.interner.next_node() {
            entries.push(self.encode_node(&node));
        }
        log::debug!("tabulated value graph into {} entries", entries.len());
        Document::Table(entries)
    }

    fn encode_node(&mut self, node: &Value) -> Entry {
        match node {
            Value::Null => Entry::Null,
            Value::Bool(b) => Entry::Bool(*b),
            Value::Number(n) => Entry::Number(*n),
            Value::String(s) => Entry::String(s.clone()),
            Value::Undefined => unreachable!("sentinel values never reach the worklist"),
            compound => {
                if let Some((name, args)) = self.registry.claim(compound) {
                    let name = name.to_string();
                    let args = args.iter().map(|arg| self.interner.index_of(arg)).collect();
                    return Entry::Tagged { name, args };
                }
                match compound {
                    Value::Array(array) => {
                        let slots = array.to_vec();
                        let cells = slots
                            .iter()
                            .map(|slot| match slot {
                                Some(value) => self.interner.index_of(value),
                                None => Cell::ARRAY_HOLE,
                            })
                            .collect();
                        Entry::Array(cells)
                    }
                    Value::Object(object) => {
                        let properties: Vec<(String, Value)> = object
                            .entries()
                            .iter()
                            .map(|(key, value)| (key.clone(), value.clone()))
                            .collect();
                        let cells = properties
                            .into_iter()
                            .map(|(key, value)| (key, self.interner.index_of(&value)))
                            .collect();
                        Entry::Record(cells)
                    }
                    other => {
                        log::warn!(
                            "no registered type claims {:?}, writing it as an empty object",
                            other
                        );
                        Entry::Record(IndexMap::new())
                    }
                }
            }
        }
    }
}

/// Writes a document as JSON text, compact or pretty per `options`.
pub(crate) fn write_document(document: &Document, options: &Options) -> Result<String> {
    if !options.pretty {
        return Ok(serde_json::to_string(document)?);
    }

    let indent = vec![b' '; options.indent];
    let mut output = Vec::with_capacity(256);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut output, formatter);
    document.serialize(&mut serializer)?;
    String::from_utf8(output).map_err(Error::custom)
}

/// Builds a [`Value`] from any `T: Serialize`.
///
/// Structs and maps become objects, sequences and tuples become arrays,
/// byte slices become [`Buffer`](crate::Buffer) values, and enum variants
/// with data use the externally tagged form `{"Variant": data}`.
pub struct ValueSerializer;

pub struct SerializeVec {
    vec: Vec<Value>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    map: Map,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

fn tagged(variant: &'static str, value: Value) -> Value {
    Value::object([(variant, value)])
}

impl ser::Serializer for ValueSerializer {
    type Ok = Value;
    type Error = Error;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<Value> {
        Ok(Value::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i16(self, v: i16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i32(self, v: i32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_i64(self, v: i64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u8(self, v: u8) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u16(self, v: u16) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u32(self, v: u32) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_u64(self, v: u64) -> Result<Value> {
        Ok(Value::from(v))
    }

    fn serialize_f32(self, v: f32) -> Result<Value> {
        Ok(Value::Number(Number::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<Value> {
        Ok(Value::Number(Number::from(v)))
    }

    fn serialize_char(self, v: char) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<Value> {
        Ok(Value::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Value> {
        Ok(Value::buffer(v))
    }

    fn serialize_none(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_some<T>(self, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Value> {
        Ok(Value::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<Value> {
        Ok(Value::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Value>
    where
        T: ?Sized + Serialize,
    {
        Ok(tagged(variant, to_value(value)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len.unwrap_or(0), None))
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(len, Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(to_value(value)?);
        Ok(())
    }

    fn finish(self) -> Value {
        let array = Value::from(self.vec);
        match self.variant {
            Some(variant) => tagged(variant, array),
            None => array,
        }
    }
}

impl SerializeMap {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeMap {
            map: Map::with_capacity(capacity),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> Value {
        let object = Value::from(self.map);
        match self.variant {
            Some(variant) => tagged(variant, object),
            None => object,
        }
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match to_value(key)? {
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) if n.is_finite() => n.to_string(),
            other => {
                return Err(Error::unsupported_type(&format!(
                    "map key {:?}: object keys must be strings, numbers or booleans",
                    other
                )))
            }
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| Error::custom("serialize_value called without serialize_key"))?;
        self.map.insert(key, to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = Value;
    type Error = Error;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.map.insert(key.to_string(), to_value(value)?);
        Ok(())
    }

    fn end(self) -> Result<Value> {
        Ok(self.finish())
    }
}

pub(crate) fn to_value<T: Serialize + ?Sized>(value: &T) -> Result<Value> {
    value.serialize(ValueSerializer)
}
