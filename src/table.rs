//! The flat table that a value graph is written as.
//!
//! A [`Document`] is either a bare negative [`Cell`] (the whole value is one
//! sentinel scalar) or an array of [`Entry`] values. Entry 0 is the root.
//!
//! ```text
//! value                          table
//! {self: <itself>}               [{"self":0}]
//! [1, <hole>, 3]                 [[1,-2,2],1,3]
//! NaN                            -3
//! Set {<itself>}                 [["Set",0]]
//! ```
//!
//! Cells are non-negative table indices or one of five reserved negative
//! sentinels. Arrays whose first element is a string are tagged entries;
//! every other array holds integer cells.

use crate::{Error, Number, Result, Value};
use indexmap::IndexMap;
use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Unexpected, Visitor};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;

/// A slot inside an entry: a table index or a sentinel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell(i64);

impl Cell {
    pub const UNDEFINED: Cell = Cell(-1);
    pub const ARRAY_HOLE: Cell = Cell(-2);
    pub const NAN: Cell = Cell(-3);
    pub const POS_INFINITY: Cell = Cell(-4);
    pub const NEG_INFINITY: Cell = Cell(-5);

    #[must_use]
    pub fn index(index: usize) -> Cell {
        Cell(index as i64)
    }

    #[must_use]
    pub const fn from_raw(raw: i64) -> Cell {
        Cell(raw)
    }

    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// The table index this cell points at, or `None` for a sentinel.
    #[must_use]
    pub fn as_index(self) -> Option<usize> {
        usize::try_from(self.0).ok()
    }

    #[must_use]
    pub const fn is_sentinel(self) -> bool {
        self.0 < 0
    }
}

/// The meaning of a negative cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sentinel {
    Undefined,
    ArrayHole,
    NaN,
    PosInfinity,
    NegInfinity,
}

impl Sentinel {
    #[must_use]
    pub const fn cell(self) -> Cell {
        match self {
            Sentinel::Undefined => Cell::UNDEFINED,
            Sentinel::ArrayHole => Cell::ARRAY_HOLE,
            Sentinel::NaN => Cell::NAN,
            Sentinel::PosInfinity => Cell::POS_INFINITY,
            Sentinel::NegInfinity => Cell::NEG_INFINITY,
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidSentinel`] for any cell that is not one of the
    /// five reserved values, including non-negative indices.
    pub fn from_cell(cell: Cell) -> Result<Sentinel> {
        match cell {
            Cell::UNDEFINED => Ok(Sentinel::Undefined),
            Cell::ARRAY_HOLE => Ok(Sentinel::ArrayHole),
            Cell::NAN => Ok(Sentinel::NaN),
            Cell::POS_INFINITY => Ok(Sentinel::PosInfinity),
            Cell::NEG_INFINITY => Ok(Sentinel::NegInfinity),
            other => Err(Error::InvalidSentinel(other.raw())),
        }
    }

    /// The sentinel a value is written as, if it cannot be a table entry.
    #[must_use]
    pub fn of(value: &Value) -> Option<Sentinel> {
        match value {
            Value::Undefined => Some(Sentinel::Undefined),
            Value::Number(n) if !n.is_finite() => {
                if n.as_f64().is_nan() {
                    Some(Sentinel::NaN)
                } else if n.as_f64() > 0.0 {
                    Some(Sentinel::PosInfinity)
                } else {
                    Some(Sentinel::NegInfinity)
                }
            }
            _ => None,
        }
    }

    /// The scalar this sentinel stands for. A hole outside an array reads
    /// as `Undefined`.
    #[must_use]
    pub fn into_value(self) -> Value {
        match self {
            Sentinel::Undefined | Sentinel::ArrayHole => Value::Undefined,
            Sentinel::NaN => Value::Number(Number::NaN),
            Sentinel::PosInfinity => Value::Number(Number::Infinity),
            Sentinel::NegInfinity => Value::Number(Number::NegativeInfinity),
        }
    }
}

/// One element of a table.
#[derive(Clone, Debug, PartialEq)]
pub enum Entry {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    /// A plain array, holes written as [`Cell::ARRAY_HOLE`].
    Array(Vec<Cell>),
    /// A plain object.
    Record(IndexMap<String, Cell>),
    /// An exotic value: the registered type name and its argument cells.
    Tagged { name: String, args: Vec<Cell> },
}

/// A whole encoded value.
#[derive(Clone, Debug, PartialEq)]
pub enum Document {
    /// The root itself is a sentinel scalar.
    Sentinel(Cell),
    Table(Vec<Entry>),
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_i64(self.0)
    }
}

impl Serialize for Entry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Entry::Null => serializer.serialize_unit(),
            Entry::Bool(b) => serializer.serialize_bool(*b),
            Entry::Number(Number::Integer(i)) => serializer.serialize_i64(*i),
            Entry::Number(n) => serializer.serialize_f64(n.as_f64()),
            Entry::String(s) => serializer.serialize_str(s),
            Entry::Array(cells) => {
                let mut seq = serializer.serialize_seq(Some(cells.len()))?;
                for cell in cells {
                    seq.serialize_element(cell)?;
                }
                seq.end()
            }
            Entry::Record(cells) => {
                let mut map = serializer.serialize_map(Some(cells.len()))?;
                for (key, cell) in cells {
                    map.serialize_entry(key, cell)?;
                }
                map.end()
            }
            Entry::Tagged { name, args } => {
                let mut seq = serializer.serialize_seq(Some(args.len() + 1))?;
                seq.serialize_element(name)?;
                for cell in args {
                    seq.serialize_element(cell)?;
                }
                seq.end()
            }
        }
    }
}

impl Serialize for Document {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Document::Sentinel(cell) => cell.serialize(serializer),
            Document::Table(entries) => {
                let mut seq = serializer.serialize_seq(Some(entries.len()))?;
                for entry in entries {
                    seq.serialize_element(entry)?;
                }
                seq.end()
            }
        }
    }
}

struct CellVisitor;

impl<'de> Visitor<'de> for CellVisitor {
    type Value = Cell;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an integer cell")
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Cell, E> {
        Ok(Cell(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Cell, E> {
        i64::try_from(value)
            .map(Cell)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_i64(CellVisitor)
    }
}

/// First element of an array entry, which decides between a tagged entry
/// and a plain array.
enum Head {
    Name(String),
    Cell(Cell),
}

impl<'de> Deserialize<'de> for Head {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct HeadVisitor;

        impl<'de> Visitor<'de> for HeadVisitor {
            type Value = Head;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a type name or an integer cell")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Head, E> {
                CellVisitor.visit_i64(value).map(Head::Cell)
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Head, E> {
                CellVisitor.visit_u64(value).map(Head::Cell)
            }

            fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Head, E> {
                Ok(Head::Name(value.to_string()))
            }

            fn visit_string<E: de::Error>(self, value: String) -> std::result::Result<Head, E> {
                Ok(Head::Name(value))
            }
        }

        deserializer.deserialize_any(HeadVisitor)
    }
}

impl<'de> Deserialize<'de> for Entry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntryVisitor;

        impl<'de> Visitor<'de> for EntryVisitor {
            type Value = Entry;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a table entry")
            }

            fn visit_bool<E>(self, value: bool) -> std::result::Result<Entry, E> {
                Ok(Entry::Bool(value))
            }

            fn visit_i64<E>(self, value: i64) -> std::result::Result<Entry, E> {
                Ok(Entry::Number(Number::Integer(value)))
            }

            fn visit_u64<E>(self, value: u64) -> std::result::Result<Entry, E> {
                Ok(Entry::Number(Number::from(value)))
            }

            fn visit_f64<E>(self, value: f64) -> std::result::Result<Entry, E> {
                Ok(Entry::Number(Number::Float(value)))
            }

            fn visit_str<E>(self, value: &str) -> std::result::Result<Entry, E> {
                Ok(Entry::String(value.to_string()))
            }

            fn visit_string<E>(self, value: String) -> std::result::Result<Entry, E> {
                Ok(Entry::String(value))
            }

            fn visit_unit<E>(self) -> std::result::Result<Entry, E> {
                Ok(Entry::Null)
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Entry, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let head = seq.next_element::<Head>()?;
                let mut cells = Vec::with_capacity(seq.size_hint().unwrap_or(0) + 1);
                if let Some(Head::Cell(cell)) = head {
                    cells.push(cell);
                }
                while let Some(cell) = seq.next_element::<Cell>()? {
                    cells.push(cell);
                }
                Ok(match head {
                    Some(Head::Name(name)) => Entry::Tagged { name, args: cells },
                    _ => Entry::Array(cells),
                })
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Entry, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut cells = IndexMap::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, cell)) = map.next_entry::<String, Cell>()? {
                    cells.insert(key, cell);
                }
                Ok(Entry::Record(cells))
            }
        }

        deserializer.deserialize_any(EntryVisitor)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a table array or a negative sentinel integer")
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Document, E> {
                if value < 0 {
                    Ok(Document::Sentinel(Cell(value)))
                } else {
                    Err(E::invalid_value(Unexpected::Signed(value), &self))
                }
            }

            fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Document, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut entries = Vec::with_capacity(seq.size_hint().unwrap_or(0));
                while let Some(entry) = seq.next_element::<Entry>()? {
                    entries.push(entry);
                }
                Ok(Document::Table(entries))
            }
        }

        deserializer.deserialize_any(DocumentVisitor)
    }
}
