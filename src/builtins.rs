//! Built-in exotic types.
//!
//! | Wire name | Rust type            | Arguments                          |
//! |-----------|----------------------|------------------------------------|
//! | `Buffer`  | [`Buffer`]           | `[base64 text, "base64"]`          |
//! | `Date`    | `DateTime<Utc>`      | `[RFC 3339 text]`                  |
//! | `RegExp`  | [`Pattern`]          | `[source]` or `[source, flags]`    |
//! | `Map`     | [`ValueMap`]         | `[key, value]` pair arrays         |
//! | `Set`     | [`ValueSet`]         | the elements                       |
//!
//! Buffers, dates and patterns are immutable and rebuilt in one step. Maps
//! and sets publish an empty placeholder first and are filled once the rest
//! of the table is decoded, so they can contain themselves.

use crate::registry::{Reconstruction, TypeHandler};
use crate::{Error, Result, Value};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use indexmap::{IndexMap, IndexSet};
use regex::{Regex, RegexBuilder};
use std::fmt;
use std::sync::Arc;

/// A raw byte buffer.
///
/// # Examples
///
/// ```rust
/// use arson::{decode, encode, Buffer, Value};
///
/// let value = Value::buffer(b"hi".to_vec());
/// let text = encode(&value).unwrap();
/// assert_eq!(text, r#"[["Buffer",1,2],"aGk=","base64"]"#);
///
/// let back = decode(&text).unwrap();
/// assert_eq!(back.downcast_ref::<Buffer>().unwrap().as_slice(), b"hi");
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Buffer(Vec<u8>);

impl Buffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u8>> for Buffer {
    fn from(bytes: Vec<u8>) -> Self {
        Buffer(bytes)
    }
}

impl From<&[u8]> for Buffer {
    fn from(bytes: &[u8]) -> Self {
        Buffer(bytes.to_vec())
    }
}

impl AsRef<[u8]> for Buffer {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Pattern flags, written in the order `i`, `m`, `g`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PatternFlags {
    pub ignore_case: bool,
    pub multiline: bool,
    pub global: bool,
}

impl PatternFlags {
    /// Parses a flags text such as `"gi"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Reconstruct`] for any character other than `i`, `m`
    /// or `g`.
    pub fn parse(flags: &str) -> Result<Self> {
        let mut parsed = PatternFlags::default();
        for flag in flags.chars() {
            match flag {
                'i' => parsed.ignore_case = true,
                'm' => parsed.multiline = true,
                'g' => parsed.global = true,
                other => {
                    return Err(Error::reconstruct(
                        "RegExp",
                        format!("unsupported flag {other:?}"),
                    ))
                }
            }
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        !(self.ignore_case || self.multiline || self.global)
    }
}

impl fmt::Display for PatternFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ignore_case {
            f.write_str("i")?;
        }
        if self.multiline {
            f.write_str("m")?;
        }
        if self.global {
            f.write_str("g")?;
        }
        Ok(())
    }
}

/// A compiled pattern matcher that remembers its source and flags.
///
/// `global` does not change matching; it is kept so it survives a round
/// trip.
///
/// # Examples
///
/// ```rust
/// use arson::{Pattern, PatternFlags};
///
/// let flags = PatternFlags { ignore_case: true, ..Default::default() };
/// let pattern = Pattern::with_flags("^ab+c$", flags).unwrap();
/// assert!(pattern.is_match("ABBC"));
/// assert_eq!(pattern.to_string(), "/^ab+c$/i");
/// ```
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    flags: PatternFlags,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self> {
        Self::with_flags(source, PatternFlags::default())
    }

    /// # Errors
    ///
    /// Returns [`Error::Reconstruct`] if `source` does not compile.
    pub fn with_flags(source: &str, flags: PatternFlags) -> Result<Self> {
        let regex = RegexBuilder::new(source)
            .case_insensitive(flags.ignore_case)
            .multi_line(flags.multiline)
            .build()
            .map_err(|err| Error::reconstruct("RegExp", err))?;
        Ok(Pattern {
            source: source.to_string(),
            flags,
            regex,
        })
    }

    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[must_use]
    pub fn flags(&self) -> PatternFlags {
        self.flags
    }

    #[must_use]
    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.regex.is_match(text)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.flags == other.flags
    }
}

impl Eq for Pattern {}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

/// An insertion-ordered hash map keyed by [`Value`].
///
/// Keys follow [`Value`] equality: primitives by value, compound values by
/// identity.
#[derive(Clone, Debug, Default)]
pub struct ValueMap(IndexMap<Value, Value>);

impl ValueMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: Value, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    #[must_use]
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &Value) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> indexmap::map::Iter<'_, Value, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> indexmap::map::Keys<'_, Value, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> indexmap::map::Values<'_, Value, Value> {
        self.0.values()
    }
}

impl FromIterator<(Value, Value)> for ValueMap {
    fn from_iter<T: IntoIterator<Item = (Value, Value)>>(iter: T) -> Self {
        ValueMap(iter.into_iter().collect())
    }
}

/// An insertion-ordered hash set of [`Value`] elements.
#[derive(Clone, Debug, Default)]
pub struct ValueSet(IndexSet<Value>);

impl ValueSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an element, returning `false` if it was already present.
    pub fn insert(&mut self, value: Value) -> bool {
        self.0.insert(value)
    }

    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.0.contains(value)
    }

    pub fn remove(&mut self, value: &Value) -> bool {
        self.0.shift_remove(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> indexmap::set::Iter<'_, Value> {
        self.0.iter()
    }
}

impl FromIterator<Value> for ValueSet {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        ValueSet(iter.into_iter().collect())
    }
}

fn text_arg<'a>(type_name: &str, args: &'a [Value], index: usize) -> Result<&'a str> {
    args.get(index)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::reconstruct(type_name, format!("argument {index} must be text")))
}

struct BufferHandler;

impl TypeHandler for BufferHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        let buffer = value.downcast_ref::<Buffer>()?;
        Some(vec![
            Value::from(STANDARD.encode(buffer.as_slice())),
            Value::from("base64"),
        ])
    }

    fn reconstruct(&self) -> Reconstruction {
        Reconstruction::immediate(|args| {
            let data = text_arg("Buffer", &args, 0)?;
            let encoding = args.get(1).and_then(Value::as_str).unwrap_or("utf8");
            let bytes = match encoding {
                "base64" => STANDARD
                    .decode(data)
                    .map_err(|err| Error::reconstruct("Buffer", err))?,
                "utf8" | "utf-8" => data.as_bytes().to_vec(),
                other => {
                    return Err(Error::reconstruct(
                        "Buffer",
                        format!("unsupported encoding {other:?}"),
                    ))
                }
            };
            Ok(Value::buffer(bytes))
        })
    }
}

struct DateHandler;

impl DateHandler {
    fn format(instant: &DateTime<Utc>) -> String {
        let precision = if instant.timestamp_subsec_nanos() % 1_000_000 == 0 {
            SecondsFormat::Millis
        } else {
            SecondsFormat::AutoSi
        };
        instant.to_rfc3339_opts(precision, true)
    }

    fn parse(arg: Option<&Value>) -> Result<DateTime<Utc>> {
        match arg {
            Some(Value::String(text)) => DateTime::parse_from_rfc3339(text)
                .map(|instant| instant.with_timezone(&Utc))
                .map_err(|err| Error::reconstruct("Date", format!("{text:?}: {err}"))),
            Some(Value::Number(millis)) => millis
                .as_i64()
                .and_then(DateTime::from_timestamp_millis)
                .ok_or_else(|| Error::reconstruct("Date", format!("{millis} is out of range"))),
            _ => Err(Error::reconstruct(
                "Date",
                "expected an RFC 3339 text or milliseconds since the epoch",
            )),
        }
    }
}

impl TypeHandler for DateHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        let instant = value.downcast_ref::<DateTime<Utc>>()?;
        Some(vec![Value::from(Self::format(&instant))])
    }

    fn reconstruct(&self) -> Reconstruction {
        Reconstruction::immediate(|args| Ok(Value::date(Self::parse(args.first())?)))
    }
}

struct PatternHandler;

impl TypeHandler for PatternHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        let pattern = value.downcast_ref::<Pattern>()?;
        let mut args = vec![Value::from(pattern.source())];
        if !pattern.flags().is_empty() {
            args.push(Value::from(pattern.flags().to_string()));
        }
        Some(args)
    }

    fn reconstruct(&self) -> Reconstruction {
        Reconstruction::immediate(|args| {
            let source = text_arg("RegExp", &args, 0)?;
            let flags = match args.get(1) {
                Some(Value::String(flags)) => PatternFlags::parse(flags)?,
                _ => PatternFlags::default(),
            };
            Ok(Value::pattern(Pattern::with_flags(source, flags)?))
        })
    }
}

struct MapHandler;

impl TypeHandler for MapHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        let map = value.downcast_ref::<ValueMap>()?;
        Some(
            map.iter()
                .map(|(key, value)| Value::array([key.clone(), value.clone()]))
                .collect(),
        )
    }

    fn reconstruct(&self) -> Reconstruction {
        let placeholder = Value::exotic(ValueMap::new());
        let target = placeholder.clone();
        Reconstruction::deferred(placeholder, move |args| {
            let mut map = target
                .downcast_mut::<ValueMap>()
                .ok_or_else(|| Error::reconstruct("Map", "placeholder is already borrowed"))?;
            for pair in args {
                let Value::Array(pair) = pair else {
                    return Err(Error::reconstruct("Map", "entries must be [key, value] arrays"));
                };
                let key = pair.get(0).unwrap_or_default();
                let value = pair.get(1).unwrap_or_default();
                map.insert(key, value);
            }
            Ok(())
        })
    }

    fn release(&self, placeholder: &Value) {
        if let Some(mut map) = placeholder.downcast_mut::<ValueMap>() {
            map.clear();
        }
    }
}

struct SetHandler;

impl TypeHandler for SetHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        let set = value.downcast_ref::<ValueSet>()?;
        Some(set.iter().cloned().collect())
    }

    fn reconstruct(&self) -> Reconstruction {
        let placeholder = Value::exotic(ValueSet::new());
        let target = placeholder.clone();
        Reconstruction::deferred(placeholder, move |args| {
            let mut set = target
                .downcast_mut::<ValueSet>()
                .ok_or_else(|| Error::reconstruct("Set", "placeholder is already borrowed"))?;
            for element in args {
                set.insert(element);
            }
            Ok(())
        })
    }

    fn release(&self, placeholder: &Value) {
        if let Some(mut set) = placeholder.downcast_mut::<ValueSet>() {
            set.clear();
        }
    }
}

/// The built-in handlers in claim order.
pub(crate) fn handlers() -> Vec<(&'static str, Arc<dyn TypeHandler>)> {
    vec![
        ("Buffer", Arc::new(BufferHandler)),
        ("Date", Arc::new(DateHandler)),
        ("RegExp", Arc::new(PatternHandler)),
        ("Map", Arc::new(MapHandler)),
        ("Set", Arc::new(SetHandler)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn build(handler: &dyn TypeHandler, args: Vec<Value>) -> Result<Value> {
        match handler.reconstruct() {
            Reconstruction::Immediate(build) => build(args),
            Reconstruction::Deferred { placeholder, fill } => {
                fill(args)?;
                Ok(placeholder)
            }
        }
    }

    #[test]
    fn test_buffer_arguments() {
        let args = BufferHandler
            .deconstruct(&Value::buffer(vec![0, 255, 7]))
            .unwrap();
        assert_eq!(args, vec![Value::from("AP8H"), Value::from("base64")]);

        let rebuilt = build(&BufferHandler, args).unwrap();
        assert_eq!(rebuilt.downcast_ref::<Buffer>().unwrap().as_slice(), &[0, 255, 7]);
    }

    #[test]
    fn test_buffer_utf8_and_bad_input() {
        let rebuilt = build(&BufferHandler, vec![Value::from("hey"), Value::from("utf8")]).unwrap();
        assert_eq!(rebuilt.downcast_ref::<Buffer>().unwrap().as_slice(), b"hey");

        let err = build(&BufferHandler, vec![Value::from("!!"), Value::from("base64")]).unwrap_err();
        assert!(matches!(err, Error::Reconstruct { type_name, .. } if type_name == "Buffer"));

        let err = build(&BufferHandler, vec![Value::from("00"), Value::from("hex")]).unwrap_err();
        assert!(err.to_string().contains("hex"));
    }

    #[test]
    fn test_date_formats() {
        let millis = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let args = DateHandler.deconstruct(&Value::date(millis)).unwrap();
        assert_eq!(args, vec![Value::from("2023-11-14T22:13:20.123Z")]);

        let nanos = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let args = DateHandler.deconstruct(&Value::date(nanos)).unwrap();
        let rebuilt = build(&DateHandler, args).unwrap();
        assert_eq!(*rebuilt.downcast_ref::<DateTime<Utc>>().unwrap(), nanos);
    }

    #[test]
    fn test_date_from_millis() {
        let rebuilt = build(&DateHandler, vec![Value::from(0)]).unwrap();
        assert_eq!(
            rebuilt.downcast_ref::<DateTime<Utc>>().unwrap().timestamp(),
            0
        );
        assert!(build(&DateHandler, vec![Value::from("yesterday")]).is_err());
        assert!(build(&DateHandler, vec![]).is_err());
    }

    #[test]
    fn test_pattern_flags_order() {
        let flags = PatternFlags::parse("gmi").unwrap();
        assert_eq!(flags.to_string(), "img");
        assert!(PatternFlags::parse("").unwrap().is_empty());
        assert!(PatternFlags::parse("x").is_err());

        let pattern = Pattern::with_flags("a.c", PatternFlags::parse("gi").unwrap()).unwrap();
        let args = PatternHandler.deconstruct(&Value::pattern(pattern)).unwrap();
        assert_eq!(args, vec![Value::from("a.c"), Value::from("ig")]);

        let plain = Pattern::new("x+").unwrap();
        let args = PatternHandler.deconstruct(&Value::pattern(plain)).unwrap();
        assert_eq!(args, vec![Value::from("x+")]);
    }

    #[test]
    fn test_pattern_rebuild() {
        let rebuilt = build(&PatternHandler, vec![Value::from("^a"), Value::from("im")]).unwrap();
        let pattern = rebuilt.downcast_ref::<Pattern>().unwrap();
        assert!(pattern.is_match("x\nA"));
        assert!(pattern.flags().multiline);

        assert!(build(&PatternHandler, vec![Value::from("(")]).is_err());
    }

    #[test]
    fn test_map_pairs() {
        let key = Value::object([("id", Value::from(1))]);
        let map = Value::map([(key.clone(), Value::from("one")), (Value::from(2), Value::Null)]);
        let args = MapHandler.deconstruct(&map).unwrap();
        assert_eq!(args.len(), 2);
        assert!(args[0].at(0).unwrap().ptr_eq(&key));

        let rebuilt = build(&MapHandler, args).unwrap();
        let rebuilt = rebuilt.downcast_ref::<ValueMap>().unwrap();
        assert_eq!(rebuilt.get(&key), Some(&Value::from("one")));
        assert_eq!(rebuilt.get(&Value::from(2)), Some(&Value::Null));
    }

    #[test]
    fn test_map_rejects_non_pairs() {
        let err = build(&MapHandler, vec![Value::from(1)]).unwrap_err();
        assert!(matches!(err, Error::Reconstruct { type_name, .. } if type_name == "Map"));
    }

    #[test]
    fn test_set_fill_keeps_order() {
        let rebuilt = build(
            &SetHandler,
            vec![Value::from("b"), Value::from("a"), Value::from("b")],
        )
        .unwrap();
        let set = rebuilt.downcast_ref::<ValueSet>().unwrap();
        let elements: Vec<_> = set.iter().cloned().collect();
        assert_eq!(elements, vec![Value::from("b"), Value::from("a")]);
    }

    #[test]
    fn test_handlers_ignore_foreign_values() {
        let plain = Value::object([("a", Value::Null)]);
        for (_, handler) in handlers() {
            assert!(handler.deconstruct(&plain).is_none());
            assert!(handler.deconstruct(&Value::from(1)).is_none());
        }
    }
}
