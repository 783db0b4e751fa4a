//! Run-scoped key-value memory for strategies.
//!
//! The engine creates one `StrategyMemory` per run and hands it to the
//! strategy on every bar, so state such as a trailing-stop level survives
//! between bars without the strategy holding mutable state of its own.

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MemoryValue {
    Number(f64),
    Flag(bool),
    Text(String),
}

impl From<f64> for MemoryValue {
    fn from(value: f64) -> Self {
        MemoryValue::Number(value)
    }
}

impl From<bool> for MemoryValue {
    fn from(value: bool) -> Self {
        MemoryValue::Flag(value)
    }
}

impl From<&str> for MemoryValue {
    fn from(value: &str) -> Self {
        MemoryValue::Text(value.to_string())
    }
}

impl From<String> for MemoryValue {
    fn from(value: String) -> Self {
        MemoryValue::Text(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StrategyMemory {
    entries: BTreeMap<String, MemoryValue>,
}

impl StrategyMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<MemoryValue>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&MemoryValue> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<MemoryValue> {
        self.entries.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Numeric entry; `None` when absent or of another type.
    pub fn number(&self, key: &str) -> Option<f64> {
        match self.entries.get(key) {
            Some(MemoryValue::Number(v)) => Some(*v),
            _ => None,
        }
    }

    /// Boolean entry; `false` when absent or of another type.
    pub fn flag(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some(MemoryValue::Flag(true)))
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        match self.entries.get(key) {
            Some(MemoryValue::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }
}
