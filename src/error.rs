//! Error types for table encoding and decoding.
//!
//! ## Error Categories
//!
//! - **Registry misuse**: a handler registered without its functions or under an empty name
//! - **Malformed tables**: the JSON parsed, but its shape is not a table this codec produced
//! - **Invalid sentinels**: a negative cell outside the five reserved values
//! - **Syntax errors**: the text is not JSON at all, with line/column information
//! - **Reconstruction failures**: a registered type rejected its arguments
//!
//! ## Examples
//!
//! ```rust
//! use arson::{decode, Error};
//!
//! let result = decode("{\"not\": \"a table\"}");
//! assert!(matches!(result, Err(Error::InvalidEncoding(_))));
//!
//! let result = decode("[[0, -9]]");
//! assert!(matches!(result, Err(Error::InvalidSentinel(-9))));
//! ```

use std::fmt;
use thiserror::Error;

/// Represents all possible errors that can occur while encoding or decoding.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// IO error during reading or writing
    #[error("IO error: {0}")]
    Io(String),

    /// The input is not well-formed JSON
    #[error("Syntax error at line {line}, column {col}: {msg}")]
    Syntax { line: usize, col: usize, msg: String },

    /// The input is JSON but not a table
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// A negative cell that is not one of the reserved sentinels
    #[error("Invalid sentinel cell {0}: the table was not produced by a compatible encoder")]
    InvalidSentinel(i64),

    /// A type handler could not be registered
    #[error("Invalid handler: {0}")]
    InvalidHandler(String),

    /// A tagged entry names a type that is not registered
    #[error("Unknown type {0:?}: no handler is registered under that name")]
    UnknownType(String),

    /// A registered type failed to rebuild a value from its arguments
    #[error("Cannot reconstruct {type_name}: {msg}")]
    Reconstruct { type_name: String, msg: String },

    /// Unsupported type for value conversion
    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// Custom error
    #[error("Error: {0}")]
    Custom(String),
}

impl Error {
    /// Creates a syntax error with line and column information.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Error;
    ///
    /// let err = Error::syntax(10, 5, "expected value");
    /// assert!(err.to_string().contains("line 10"));
    /// ```
    pub fn syntax(line: usize, col: usize, msg: &str) -> Self {
        Error::Syntax {
            line,
            col,
            msg: msg.to_string(),
        }
    }

    /// Creates an error for JSON that does not have the shape of a table.
    pub fn invalid_encoding<T: fmt::Display>(msg: T) -> Self {
        Error::InvalidEncoding(msg.to_string())
    }

    /// Creates an error for a rejected handler registration.
    pub fn invalid_handler(msg: &str) -> Self {
        Error::InvalidHandler(msg.to_string())
    }

    /// Creates an error raised by a type handler while rebuilding a value.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Error;
    ///
    /// let err = Error::reconstruct("Date", "not an RFC 3339 timestamp");
    /// assert!(err.to_string().contains("Date"));
    /// ```
    pub fn reconstruct<T: fmt::Display>(type_name: &str, msg: T) -> Self {
        Error::Reconstruct {
            type_name: type_name.to_string(),
            msg: msg.to_string(),
        }
    }

    /// Creates an unsupported type error for values that have no graph form.
    pub fn unsupported_type(msg: &str) -> Self {
        Error::UnsupportedType(msg.to_string())
    }

    /// Creates a custom error with a display message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use arson::Error;
    ///
    /// let err = Error::custom("something went wrong");
    /// assert!(err.to_string().contains("something went wrong"));
    /// ```
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }

    /// Creates an I/O error for reading/writing failures.
    pub fn io(msg: &str) -> Self {
        Error::Io(msg.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        use serde_json::error::Category;

        match err.classify() {
            Category::Syntax | Category::Eof => {
                Error::syntax(err.line(), err.column(), &err.to_string())
            }
            Category::Data => Error::InvalidEncoding(err.to_string()),
            Category::Io => Error::Io(err.to_string()),
        }
    }
}

impl serde::ser::Error for Error {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Error::Custom(msg.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
