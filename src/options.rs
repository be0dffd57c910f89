//! Configuration options for encoding and decoding.
//!
//! - [`Options`]: output layout and decoding policy
//! - [`UnknownTypes`]: what to do with a tagged entry whose type is not registered
//!
//! ## Examples
//!
//! ```rust
//! use arson::{encode_with_options, Options, Value};
//!
//! let value = Value::array([Value::from(1), Value::from(2)]);
//!
//! let text = encode_with_options(&value, &Options::new()).unwrap();
//! assert_eq!(text, "[[1,2],1,2]");
//!
//! let pretty = encode_with_options(&value, &Options::pretty().with_indent(4)).unwrap();
//! assert!(pretty.starts_with("[\n    [\n"));
//! ```

/// Policy for tagged entries naming a type the registry does not know.
///
/// # Examples
///
/// ```rust
/// use arson::{decode_with_options, Error, Options, UnknownTypes};
///
/// let text = r#"[["Widget",1],"knob"]"#;
///
/// let lenient = decode_with_options(text, &Options::new()).unwrap();
/// assert_eq!(lenient.at(0).unwrap().as_str(), Some("knob"));
///
/// let strict = Options::new().with_unknown_types(UnknownTypes::Reject);
/// assert!(matches!(
///     decode_with_options(text, &strict),
///     Err(Error::UnknownType(name)) if name == "Widget"
/// ));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum UnknownTypes {
    /// Decode the arguments as a plain array and log a warning.
    #[default]
    PlainArray,
    /// Fail with [`Error::UnknownType`](crate::Error::UnknownType).
    Reject,
}

/// Configuration for encoding and decoding.
///
/// `pretty` and `indent` only affect encoding, `unknown_types` only affects
/// decoding.
#[derive(Clone, Debug)]
pub struct Options {
    pub pretty: bool,
    pub indent: usize,
    pub unknown_types: UnknownTypes,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            pretty: false,
            indent: 2,
            unknown_types: UnknownTypes::default(),
        }
    }
}

impl Options {
    /// Creates default options (compact output, 2-space indent, lenient decoding).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::{Options, UnknownTypes};
    ///
    /// let options = Options::new();
    /// assert_eq!(options.indent, 2);
    /// assert!(!options.pretty);
    /// assert_eq!(options.unknown_types, UnknownTypes::PlainArray);
    /// ```
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates options for pretty-printed output with newlines and indentation.
    #[must_use]
    pub fn pretty() -> Self {
        Options {
            pretty: true,
            ..Default::default()
        }
    }

    /// Sets the indentation size (number of spaces per level).
    ///
    /// Default is 2. Only affects pretty-printed output.
    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_unknown_types(mut self, policy: UnknownTypes) -> Self {
        self.unknown_types = policy;
        self
    }
}
