//! Type registry for exotic values.
//!
//! A [`Registry`] is an ordered mapping from a type name to a
//! [`TypeHandler`]. When a compound value is encoded, each handler's
//! [`deconstruct`](TypeHandler::deconstruct) is tried in registration order and
//! the first one that claims the value decides its tagged entry. On decode, the
//! tag name selects the handler whose [`reconstruct`](TypeHandler::reconstruct)
//! rebuilds the value.
//!
//! ## Reconstruction
//!
//! Immutable types cannot exist before their arguments are known, so they
//! return [`Reconstruction::Immediate`]. Container types return
//! [`Reconstruction::Deferred`] with an empty placeholder that is published
//! before its contents are decoded, which is what allows a set to contain
//! itself.
//!
//! ## Examples
//!
//! ```rust
//! use arson::{FnHandler, Reconstruction, Registry, Value};
//!
//! #[derive(Debug)]
//! struct Celsius(f64);
//!
//! let handler = FnHandler::builder()
//!     .deconstruct(|value| {
//!         let c = value.downcast_ref::<Celsius>()?;
//!         Some(vec![Value::from(c.0)])
//!     })
//!     .reconstruct(|| {
//!         Reconstruction::immediate(|args| {
//!             let degrees = args.first().and_then(Value::as_f64).unwrap_or_default();
//!             Ok(Value::exotic(Celsius(degrees)))
//!         })
//!     })
//!     .build()
//!     .unwrap();
//!
//! let mut registry = Registry::with_builtins();
//! registry.register("Celsius", handler).unwrap();
//!
//! let text = registry.encode(&Value::exotic(Celsius(21.5))).unwrap();
//! let back = registry.decode(&text).unwrap();
//! assert_eq!(back.downcast_ref::<Celsius>().unwrap().0, 21.5);
//! ```

use crate::builtins;
use crate::de::Detabulator;
use crate::options::Options;
use crate::ser::{write_document, Tabulator};
use crate::table::Document;
use crate::{Error, Result, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

type BuildFn = Box<dyn FnOnce(Vec<Value>) -> Result<Value>>;
type FillFn = Box<dyn FnOnce(Vec<Value>) -> Result<()>>;

/// How a registered type rebuilds a value during decoding.
pub enum Reconstruction {
    /// No placeholder is possible: build the value once its arguments are resolved.
    Immediate(BuildFn),
    /// Publish `placeholder` now and call `fill` with the arguments once
    /// every other entry has been rebuilt.
    Deferred { placeholder: Value, fill: FillFn },
}

impl Reconstruction {
    pub fn immediate<F>(build: F) -> Self
    where
        F: FnOnce(Vec<Value>) -> Result<Value> + 'static,
    {
        Reconstruction::Immediate(Box::new(build))
    }

    pub fn deferred<F>(placeholder: Value, fill: F) -> Self
    where
        F: FnOnce(Vec<Value>) -> Result<()> + 'static,
    {
        Reconstruction::Deferred {
            placeholder,
            fill: Box::new(fill),
        }
    }
}

impl fmt::Debug for Reconstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reconstruction::Immediate(_) => f.write_str("Immediate"),
            Reconstruction::Deferred { placeholder, .. } => f
                .debug_struct("Deferred")
                .field("placeholder", placeholder)
                .finish_non_exhaustive(),
        }
    }
}

/// Deconstruct/reconstruct capability for one exotic type.
///
/// The top-level [`encode`](crate::encode) and [`decode`](crate::decode)
/// work on a snapshot of the global registry, so a handler may call
/// [`register_type`](crate::register_type) or encode nested values itself.
/// Types registered that way apply to the next call, not the running one.
pub trait TypeHandler: Send + Sync {
    /// Returns the construction arguments if `value` belongs to this type.
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>>;

    /// Starts rebuilding a value of this type.
    fn reconstruct(&self) -> Reconstruction;

    /// Empties a deferred placeholder after the decode that published it
    /// failed.
    ///
    /// Containers that can hold themselves should drop their contents here,
    /// otherwise the partially rebuilt cycle is never freed. The default does
    /// nothing.
    fn release(&self, _placeholder: &Value) {}
}

type DeconstructFn = dyn Fn(&Value) -> Option<Vec<Value>> + Send + Sync;
type ReconstructFn = dyn Fn() -> Reconstruction + Send + Sync;

/// A [`TypeHandler`] made of two closures.
pub struct FnHandler {
    deconstruct: Box<DeconstructFn>,
    reconstruct: Box<ReconstructFn>,
}

impl FnHandler {
    pub fn new<D, R>(deconstruct: D, reconstruct: R) -> Self
    where
        D: Fn(&Value) -> Option<Vec<Value>> + Send + Sync + 'static,
        R: Fn() -> Reconstruction + Send + Sync + 'static,
    {
        FnHandler {
            deconstruct: Box::new(deconstruct),
            reconstruct: Box::new(reconstruct),
        }
    }

    #[must_use]
    pub fn builder() -> FnHandlerBuilder {
        FnHandlerBuilder::default()
    }
}

impl TypeHandler for FnHandler {
    fn deconstruct(&self, value: &Value) -> Option<Vec<Value>> {
        (self.deconstruct)(value)
    }

    fn reconstruct(&self) -> Reconstruction {
        (self.reconstruct)()
    }
}

impl fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler").finish_non_exhaustive()
    }
}

/// Builder for [`FnHandler`]; both closures are required.
///
/// # Examples
///
/// ```rust
/// use arson::{Error, FnHandler};
///
/// let result = FnHandler::builder().deconstruct(|_| None).build();
/// assert!(matches!(result, Err(Error::InvalidHandler(_))));
/// ```
#[derive(Default)]
pub struct FnHandlerBuilder {
    deconstruct: Option<Box<DeconstructFn>>,
    reconstruct: Option<Box<ReconstructFn>>,
}

impl FnHandlerBuilder {
    #[must_use]
    pub fn deconstruct<D>(mut self, deconstruct: D) -> Self
    where
        D: Fn(&Value) -> Option<Vec<Value>> + Send + Sync + 'static,
    {
        self.deconstruct = Some(Box::new(deconstruct));
        self
    }

    #[must_use]
    pub fn reconstruct<R>(mut self, reconstruct: R) -> Self
    where
        R: Fn() -> Reconstruction + Send + Sync + 'static,
    {
        self.reconstruct = Some(Box::new(reconstruct));
        self
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidHandler`] if either closure is missing.
    pub fn build(self) -> Result<FnHandler> {
        match (self.deconstruct, self.reconstruct) {
            (Some(deconstruct), Some(reconstruct)) => Ok(FnHandler {
                deconstruct,
                reconstruct,
            }),
            (None, _) => Err(Error::invalid_handler("missing deconstruct function")),
            (_, None) => Err(Error::invalid_handler("missing reconstruct function")),
        }
    }
}

/// Ordered mapping from type name to handler.
///
/// Use [`Registry::with_builtins`] for an isolated registry, or the process
/// wide one through [`global`] and [`register_type`](crate::register_type).
#[derive(Clone, Default)]
pub struct Registry {
    handlers: IndexMap<String, Arc<dyn TypeHandler>>,
}

impl Registry {
    /// Creates a registry with no types, not even the built-ins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in types, in the order
    /// `Buffer`, `Date`, `RegExp`, `Map`, `Set`.
    #[must_use]
    pub fn with_builtins() -> Self {
        let handlers = builtins::handlers()
            .into_iter()
            .map(|(name, handler)| (name.to_string(), handler))
            .collect();
        Registry { handlers }
    }

    /// Registers `handler` under `name`.
    ///
    /// Re-registering a name replaces its handler and keeps its position in
    /// the claim order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidHandler`] for an empty name; the registry is
    /// left unchanged.
    pub fn register<H>(&mut self, name: impl Into<String>, handler: H) -> Result<&mut Self>
    where
        H: TypeHandler + 'static,
    {
        self.register_shared(name, Arc::new(handler))
    }

    /// Registers an already shared handler under `name`.
    pub fn register_shared(
        &mut self,
        name: impl Into<String>,
        handler: Arc<dyn TypeHandler>,
    ) -> Result<&mut Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_handler("type name must not be empty"));
        }
        if self.handlers.insert(name.clone(), handler).is_some() {
            log::debug!("replaced handler for type {name:?}");
        }
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn TypeHandler>> {
        self.handlers.get(name)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Type names in claim order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Finds the first handler, in registration order, that claims `value`.
    #[must_use]
    pub fn claim(&self, value: &Value) -> Option<(&str, Vec<Value>)> {
        self.handlers
            .iter()
            .find_map(|(name, handler)| Some((name.as_str(), handler.deconstruct(value)?)))
    }

    /// Flattens `value` into a table without writing it out.
    #[must_use]
    pub fn tabulate(&self, value: &Value) -> Document {
        Tabulator::new(self).run(value)
    }

    /// Rebuilds a value graph from a parsed table.
    pub fn detabulate(&self, document: &Document, options: &Options) -> Result<Value> {
        Detabulator::new(self, options).run(document)
    }

    pub fn encode(&self, value: &Value) -> Result<String> {
        self.encode_with_options(value, &Options::default())
    }

    pub fn encode_with_options(&self, value: &Value, options: &Options) -> Result<String> {
        write_document(&self.tabulate(value), options)
    }

    pub fn decode(&self, text: &str) -> Result<Value> {
        self.decode_with_options(text, &Options::default())
    }

    pub fn decode_with_options(&self, text: &str, options: &Options) -> Result<Value> {
        let document: Document = serde_json::from_str(text)?;
        self.detabulate(&document, options)
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

static GLOBAL: LazyLock<RwLock<Registry>> =
    LazyLock::new(|| RwLock::new(Registry::with_builtins()));

/// Read access to the process-wide registry.
pub fn global() -> RwLockReadGuard<'static, Registry> {
    GLOBAL.read().unwrap_or_else(PoisonError::into_inner)
}

/// A copy of the process-wide registry, taken without holding its lock
/// beyond the copy. Handlers are shared, not cloned.
pub(crate) fn snapshot() -> Registry {
    global().clone()
}

/// Write access to the process-wide registry.
///
/// Register types during start-up, before encoding or decoding begins.
pub fn global_mut() -> RwLockWriteGuard<'static, Registry> {
    GLOBAL.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim_everything(tag: &'static str) -> FnHandler {
        FnHandler::new(
            move |value| value.is_object().then(|| vec![Value::from(tag)]),
            || Reconstruction::immediate(|mut args| Ok(args.remove(0))),
        )
    }

    #[test]
    fn test_builtins_order() {
        let registry = Registry::with_builtins();
        let names: Vec<_> = registry.names().collect();
        assert_eq!(names, vec!["Buffer", "Date", "RegExp", "Map", "Set"]);
    }

    #[test]
    fn test_first_registered_claim_wins() {
        let mut registry = Registry::new();
        registry
            .register("First", claim_everything("first"))
            .unwrap()
            .register("Second", claim_everything("second"))
            .unwrap();

        let (name, args) = registry.claim(&Value::object([("a", Value::Null)])).unwrap();
        assert_eq!(name, "First");
        assert_eq!(args, vec![Value::from("first")]);
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut registry = Registry::new();
        registry.register("A", claim_everything("a1")).unwrap();
        registry.register("B", claim_everything("b")).unwrap();
        registry.register("A", claim_everything("a2")).unwrap();

        assert_eq!(registry.len(), 2);
        let (name, args) = registry.claim(&Value::object([("k", Value::Null)])).unwrap();
        assert_eq!(name, "A");
        assert_eq!(args, vec![Value::from("a2")]);
    }

    #[test]
    fn test_empty_name_rejected_without_mutation() {
        let mut registry = Registry::new();
        let err = registry.register("", claim_everything("x")).unwrap_err();
        assert!(matches!(err, Error::InvalidHandler(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_builder_requires_both_closures() {
        let missing_reconstruct = FnHandler::builder().deconstruct(|_| None).build();
        assert!(matches!(missing_reconstruct, Err(Error::InvalidHandler(msg)) if msg.contains("reconstruct")));

        let missing_deconstruct = FnHandler::builder()
            .reconstruct(|| Reconstruction::immediate(|_| Ok(Value::Null)))
            .build();
        assert!(matches!(missing_deconstruct, Err(Error::InvalidHandler(msg)) if msg.contains("deconstruct")));
    }

    #[test]
    fn test_unclaimed_value() {
        let registry = Registry::with_builtins();
        assert!(registry.claim(&Value::object([("a", Value::Null)])).is_none());
        assert!(registry.claim(&Value::exotic(17u32)).is_none());
    }
}
