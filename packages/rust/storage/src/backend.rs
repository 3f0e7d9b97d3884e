//! Slot backends: where serialized slot values physically live.
//!
//! A backend stores opaque strings under fully-qualified keys. Everything
//! about envelopes, schema versions, and subscribers lives in [`crate::Store`].
//! The persistent backend is [`crate::LibsqlBackend`].

use std::collections::BTreeMap;

use dealdesk_shared::Result;

/// Storage for serialized slot values.
pub trait SlotBackend {
    /// Raw contents of `key`, or `None` when the slot was never written.
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the full contents of `key`.
    fn save(&mut self, key: &str, contents: &str) -> Result<()>;

    /// Delete `key`. Returns whether it existed.
    fn remove(&mut self, key: &str) -> Result<bool>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>>;

    /// Human-readable backend name for tracing.
    fn name(&self) -> &str;
}

/// In-process backend. Nothing survives the process.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    slots: BTreeMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw slot, bypassing the store (used to stage legacy or corrupt data).
    pub fn with_slot(mut self, key: impl Into<String>, contents: impl Into<String>) -> Self {
        self.slots.insert(key.into(), contents.into());
        self
    }
}

impl SlotBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn save(&mut self, key: &str, contents: &str) -> Result<()> {
        self.slots.insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<bool> {
        Ok(self.slots.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.slots.keys().cloned().collect())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
