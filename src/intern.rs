//! Assigns table indices to the nodes of a value graph.
//!
//! Compound values are keyed by identity, primitives by value. Nodes are
//! kept in an append-only arena that doubles as a FIFO worklist: a cursor
//! walks the arena while encoding appends newly discovered children behind
//! it, so every reachable node is visited exactly once and no recursion is
//! involved.

use crate::table::{Cell, Sentinel};
use crate::value::NumberKey;
use crate::Value;
use std::collections::HashMap;

#[derive(Debug, PartialEq, Eq, Hash)]
enum PrimitiveKey {
    Null,
    Bool(bool),
    Number(NumberKey),
    String(String),
}

#[derive(Debug, Default)]
pub(crate) struct Interner {
    nodes: Vec<Value>,
    primitives: HashMap<PrimitiveKey, usize>,
    compounds: HashMap<usize, usize>,
    cursor: usize,
}

impl Interner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Returns the cell for `value`, appending it to the worklist if unseen.
    pub(crate) fn index_of(&mut self, value: &Value) -> Cell {
        if let Some(sentinel) = Sentinel::of(value) {
            return sentinel.cell();
        }

        let index = match value {
            Value::Array(array) => self.compound(array.addr(), value),
            Value::Object(object) => self.compound(object.addr(), value),
            Value::Exotic(exotic) => self.compound(exotic.addr(), value),
            Value::Null => self.primitive(PrimitiveKey::Null, value),
            Value::Bool(b) => self.primitive(PrimitiveKey::Bool(*b), value),
            Value::Number(n) => self.primitive(PrimitiveKey::Number(n.key()), value),
            Value::String(s) => self.primitive(PrimitiveKey::String(s.clone()), value),
            Value::Undefined => return Cell::UNDEFINED,
        };
        Cell::index(index)
    }

    /// Takes the next node to encode, in discovery order.
    pub(crate) fn next_node(&mut self) -> Option<Value> {
        let node = self.nodes.get(self.cursor)?.clone();
        self.cursor += 1;
        Some(node)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    fn compound(&mut self, addr: usize, value: &Value) -> usize {
        // The arena holds a clone of every handle, so addresses stay unique
        // for as long as the interner lives.
        if let Some(&index) = self.compounds.get(&addr) {
            return index;
        }
        let index = self.push(value);
        self.compounds.insert(addr, index);
        index
    }

    fn primitive(&mut self, key: PrimitiveKey, value: &Value) -> usize {
        if let Some(&index) = self.primitives.get(&key) {
            return index;
        }
        let index = self.push(value);
        self.primitives.insert(key, index);
        index
    }

    fn push(&mut self, value: &Value) -> usize {
        self.nodes.push(value.clone());
        self.nodes.len() - 1
    }
}
