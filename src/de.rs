//! Table decoding.
//!
//! This module rebuilds a [`Value`] graph from a parsed [`Document`].
//!
//! ## Overview
//!
//! Every entry gets a slot that is filled the first time the entry is read.
//! Rebuilding runs in four passes so that cycles resolve without recursion
//! through containers:
//!
//! 1. **Allocate**: visit every entry. Scalars resolve to themselves, plain
//!    arrays and records get an empty shell, deferred types publish their
//!    placeholder and immutable types are built from their arguments at once.
//! 2. **Resolve**: read the argument cells of every deferred type.
//! 3. **Fill shells**: copy the cells of plain arrays and records into their
//!    shells.
//! 4. **Fill containers**: hand each deferred type its arguments.
//!
//! Every cell is checked before anything is allocated. If a later pass still
//! fails, the shells and placeholders built so far are emptied so that no
//! reference cycle outlives the error.
//!
//! ```rust
//! use arson::decode;
//!
//! let value = decode(r#"[{"self":0}]"#).unwrap();
//! assert!(value.get("self").unwrap().ptr_eq(&value));
//!
//! let sparse = decode("[[1,-2,2],1,3]").unwrap();
//! assert!(sparse.as_array().unwrap().is_hole(1));
//! ```

use crate::registry::{Reconstruction, TypeHandler};
use crate::table::{Cell, Document, Entry, Sentinel};
use crate::{Array, Error, Map, Object, Options, Registry, Result, UnknownTypes, Value};
use std::sync::Arc;

type FillFn = Box<dyn FnOnce(Vec<Value>) -> Result<()>>;

#[derive(Debug)]
enum Slot {
    Unresolved,
    /// An immutable entry whose arguments are being resolved.
    Pending,
    Resolved(Value),
}

/// A deferred type waiting for its arguments.
struct Container {
    args: Vec<Cell>,
    fill: FillFn,
}

pub(crate) struct Detabulator<'a> {
    registry: &'a Registry,
    options: &'a Options,
    slots: Vec<Slot>,
    shells: Vec<usize>,
    containers: Vec<Container>,
    /// Every published placeholder with the handler that made it.
    placeholders: Vec<(Arc<dyn TypeHandler>, Value)>,
}

impl<'a> Detabulator<'a> {
    pub(crate) fn new(registry: &'a Registry, options: &'a Options) -> Self {
        Detabulator {
            registry,
            options,
            slots: Vec::new(),
            shells: Vec::new(),
            containers: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    pub(crate) fn run(mut self, document: &Document) -> Result<Value> {
        let entries = match document {
            Document::Sentinel(cell) => return Ok(Sentinel::from_cell(*cell)?.into_value()),
            Document::Table(entries) => entries.as_slice(),
        };
        if entries.is_empty() {
            return Err(Error::invalid_encoding("the table has no entries"));
        }
        check_cells(entries)?;
        self.slots = entries.iter().map(|_| Slot::Unresolved).collect();

        match self.rebuild(entries) {
            Ok(value) => Ok(value),
            Err(err) => {
                self.release();
                Err(err)
            }
        }
    }

    fn rebuild(&mut self, entries: &[Entry]) -> Result<Value> {
        for index in 0..entries.len() {
            self.value_at(entries, index)?;
        }
        log::trace!(
            "allocated {} entries: {} shells, {} containers",
            entries.len(),
            self.shells.len(),
            self.containers.len()
        );

        let containers = std::mem::take(&mut self.containers);
        let mut filled = Vec::with_capacity(containers.len());
        for container in containers {
            let args = self.values_of(entries, &container.args)?;
            filled.push((container.fill, args));
        }
        log::trace!("resolved arguments of {} containers", filled.len());

        let shells = std::mem::take(&mut self.shells);
        for &index in &shells {
            self.fill_shell(entries, index)?;
        }
        log::trace!("filled {} shells", shells.len());

        for (fill, args) in filled {
            fill(args)?;
        }

        log::debug!("rebuilt value graph from {} entries", entries.len());
        self.value_at(entries, 0)
    }

    /// Empties every container allocated by a decode that failed.
    fn release(&mut self) {
        for (handler, placeholder) in self.placeholders.drain(..) {
            handler.release(&placeholder);
        }
        for slot in &self.slots {
            match slot {
                Slot::Resolved(Value::Array(array)) => array.replace(Vec::new()),
                Slot::Resolved(Value::Object(object)) => object.replace(Map::new()),
                _ => {}
            }
        }
        log::debug!("released {} partially rebuilt entries", self.slots.len());
    }

    /// Returns the value for entry `index`, allocating it on first use.
    fn value_at(&mut self, entries: &[Entry], index: usize) -> Result<Value> {
        match self.slots.get(index) {
            None => {
                return Err(Error::invalid_encoding(format!(
                    "cell {index} points past the end of a table of {} entries",
                    entries.len()
                )))
            }
            Some(Slot::Resolved(value)) => return Ok(value.clone()),
            Some(Slot::Pending) => {
                return Err(Error::invalid_encoding(format!(
                    "entry {index} depends on itself through immutable types"
                )))
            }
            Some(Slot::Unresolved) => {}
        }

        let value = match &entries[index] {
            Entry::Null => Value::Null,
            Entry::Bool(b) => Value::Bool(*b),
            Entry::Number(n) => Value::Number(*n),
            Entry::String(s) => Value::String(s.clone()),
            Entry::Array(_) => self.shell(index, Value::Array(Array::new())),
            Entry::Record(_) => self.shell(index, Value::Object(Object::new())),
            Entry::Tagged { name, args } => self.tagged(entries, index, name, args)?,
        };
        self.slots[index] = Slot::Resolved(value.clone());
        Ok(value)
    }

    fn tagged(
        &mut self,
        entries: &[Entry],
        index: usize,
        name: &str,
        args: &[Cell],
    ) -> Result<Value> {
        let registry = self.registry;
        let Some(handler) = registry.get(name) else {
            return match self.options.unknown_types {
                UnknownTypes::Reject => Err(Error::UnknownType(name.to_string())),
                UnknownTypes::PlainArray => {
                    log::warn!("no type registered as {name:?}, decoding entry {index} as an array");
                    Ok(self.shell(index, Value::Array(Array::new())))
                }
            };
        };

        match handler.reconstruct() {
            Reconstruction::Deferred { placeholder, fill } => {
                self.placeholders.push((Arc::clone(handler), placeholder.clone()));
                self.containers.push(Container {
                    args: args.to_vec(),
                    fill,
                });
                Ok(placeholder)
            }
            Reconstruction::Immediate(build) => {
                self.slots[index] = Slot::Pending;
                let args = self.values_of(entries, args)?;
                build(args)
            }
        }
    }

    fn shell(&mut self, index: usize, shell: Value) -> Value {
        self.shells.push(index);
        shell
    }

    fn value_of(&mut self, entries: &[Entry], cell: Cell) -> Result<Value> {
        match cell.as_index() {
            Some(index) => self.value_at(entries, index),
            None => Ok(Sentinel::from_cell(cell)?.into_value()),
        }
    }

    fn values_of(&mut self, entries: &[Entry], cells: &[Cell]) -> Result<Vec<Value>> {
        cells.iter().map(|&cell| self.value_of(entries, cell)).collect()
    }

    fn fill_shell(&mut self, entries: &[Entry], index: usize) -> Result<()> {
        let shell = self.value_at(entries, index)?;
        match (&entries[index], &shell) {
            (Entry::Array(cells), Value::Array(array))
            | (Entry::Tagged { args: cells, .. }, Value::Array(array)) => {
                let mut slots = Vec::with_capacity(cells.len());
                for &cell in cells {
                    if cell == Cell::ARRAY_HOLE {
                        slots.push(None);
                    } else {
                        slots.push(Some(self.value_of(entries, cell)?));
                    }
                }
                array.replace(slots);
            }
            (Entry::Record(cells), Value::Object(object)) => {
                let mut map = Map::with_capacity(cells.len());
                for (key, &cell) in cells {
                    if cell == Cell::ARRAY_HOLE {
                        continue;
                    }
                    map.insert(key.clone(), self.value_of(entries, cell)?);
                }
                object.replace(map);
            }
            (entry, shell) => {
                return Err(Error::custom(format!(
                    "entry {index} ({entry:?}) was allocated as {shell:?}"
                )))
            }
        }
        Ok(())
    }
}

/// Rejects sentinels out of range and indices past the end of the table.
fn check_cells(entries: &[Entry]) -> Result<()> {
    let check = |cell: Cell| -> Result<()> {
        match cell.as_index() {
            Some(index) if index >= entries.len() => Err(Error::invalid_encoding(format!(
                "cell {index} points past the end of a table of {} entries",
                entries.len()
            ))),
            Some(_) => Ok(()),
            None => Sentinel::from_cell(cell).map(|_| ()),
        }
    };
    for entry in entries {
        match entry {
            Entry::Array(cells) | Entry::Tagged { args: cells, .. } => {
                cells.iter().try_for_each(|&cell| check(cell))?;
            }
            Entry::Record(cells) => cells.values().try_for_each(|&cell| check(cell))?,
            _ => {}
        }
    }
    Ok(())
}
