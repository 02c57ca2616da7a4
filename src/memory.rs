use std::collections::BTreeMap;

pub type Value = i64;
pub type Address = usize;

/// Addressable memory cells of the machine.
///
/// AM0 writes cells anywhere, AM1 uses the cells as a runtime stack that
/// grows contiguously from address 1.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Memory {
    /// Written cells, sorted by address
    cells: BTreeMap<Address, Value>,
}

impl Memory {
    /// Upper bound on the number of cells the runtime stack may grow to
    pub const CAPACITY: usize = 1 << 24;

    /// Reads a cell, `None` if it was never written
    pub fn read(&self, address: Address) -> Option<Value> {
        self.cells.get(&address).copied()
    }

    /// Writes a cell
    pub fn write(&mut self, address: Address, value: Value) {
        self.cells.insert(address, value);
    }

    /// Checks whether a cell was written
    pub fn contains(&self, address: Address) -> bool {
        self.cells.contains_key(&address)
    }

    /// Number of written cells. For a runtime stack this is the address of its top.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Appends a cell on top of the runtime stack and returns its address
    pub fn push(&mut self, value: Value) -> Address {
        let address = self.cells.len() + 1;
        self.cells.insert(address, value);
        address
    }

    /// Drops every runtime stack cell above `len`
    pub fn truncate(&mut self, len: usize) {
        self.cells.retain(|address, _| *address <= len);
    }

    /// Iterates over the written cells in address order
    pub fn iter(&self) -> impl Iterator<Item = (Address, Value)> + '_ {
        self.cells.iter().map(|(address, value)| (*address, *value))
    }

    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.cells.values().copied()
    }

    pub fn clear(&mut self) {
        self.cells.clear();
    }
}

/// Operand stack holding transient computation values
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// Removes the top value, `None` on an empty stack
    pub fn pop(&mut self) -> Option<Value> {
        self.values.pop()
    }

    /// Reads a value without consuming it. `depth` 0 is the top.
    pub fn peek(&self, depth: usize) -> Option<Value> {
        self.values
            .len()
            .checked_sub(depth + 1)
            .map(|index| self.values[index])
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Values from bottom to top
    pub fn as_slice(&self) -> &[Value] {
        &self.values
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

impl From<Vec<Value>> for Stack {
    fn from(values: Vec<Value>) -> Self {
        Self { values }
    }
}

impl From<Vec<Value>> for Memory {
    /// Builds a runtime stack with `values` at addresses 1, 2, ...
    fn from(values: Vec<Value>) -> Self {
        let mut memory = Self::default();
        for value in values {
            memory.push(value);
        }
        memory
    }
}
