//! Persistent key-value store for DealDesk.
//!
//! The [`Store`] holds named slots, each a whole JSON value wrapped in a
//! versioned [`SlotEnvelope`], and notifies in-process subscribers when a
//! slot is written.
//!
//! **Guarantees:**
//! - `write` replaces the full value of one slot; there are no partial writes.
//! - `read` never fails: missing, unreadable, corrupt, or newer-schema slots
//!   yield the caller's default and a warning.
//! - `mutate` never overwrites a slot that exists but cannot be decoded; it
//!   reports a `Storage` error and leaves the stored value alone.
//! - There is NO atomicity across slots. A change that writes two slots can be
//!   interrupted between the writes and leave them inconsistent.

mod backend;
mod database;
mod migrations;

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use dealdesk_shared::{CURRENT_SCHEMA_VERSION, DealDeskError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

pub use backend::{MemoryBackend, SlotBackend};
pub use database::LibsqlBackend;

/// Namespace applied when none is configured.
pub const DEFAULT_NAMESPACE: &str = "dealdesk";

/// On-disk wrapper around every slot value.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotEnvelope {
    pub schema_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
    pub data: Value,
}

/// Handle returned by [`Store::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&Value)>;

/// Key-value store over a [`SlotBackend`].
pub struct Store {
    backend: Box<dyn SlotBackend>,
    namespace: String,
    subscribers: HashMap<String, Vec<(SubscriptionId, Subscriber)>>,
    next_subscription: u64,
}

impl Store {
    /// Wrap a backend with the given key namespace.
    ///
    /// The namespace prefixes every key, so it obeys the same alphabet.
    pub fn new(backend: Box<dyn SlotBackend>, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_name("namespace", &namespace)?;
        Ok(Self::assemble(backend, namespace))
    }

    /// Ephemeral store backed by process memory.
    pub fn in_memory() -> Self {
        Self::assemble(Box::new(MemoryBackend::new()), DEFAULT_NAMESPACE.to_string())
    }

    /// Store persisted in the libSQL database at `path`.
    pub fn open_database(path: &Path, namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        validate_name("namespace", &namespace)?;
        let backend = LibsqlBackend::open(path)?;
        Ok(Self::assemble(Box::new(backend), namespace))
    }

    fn assemble(backend: Box<dyn SlotBackend>, namespace: String) -> Self {
        debug!(backend = backend.name(), %namespace, "store opened");
        Self {
            backend,
            namespace,
            subscribers: HashMap::new(),
            next_subscription: 0,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Read a slot, falling back to `default` when it is missing or unusable.
    pub fn read<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.load_typed(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "slot unusable, using default");
                default
            }
        }
    }

    /// [`Store::read`] with `T::default()` as the fallback.
    pub fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.read(key, T::default())
    }

    /// Whether a slot has been written (regardless of whether it parses).
    pub fn contains(&self, key: &str) -> bool {
        validate_name("slot key", key).is_ok()
            && matches!(self.backend.load(&self.qualify(key)), Ok(Some(_)))
    }

    /// Keys written in this store's namespace, without the namespace prefix.
    pub fn keys(&self) -> Result<Vec<String>> {
        let prefix = format!("{}.", self.namespace);
        Ok(self
            .backend
            .keys()?
            .into_iter()
            .filter_map(|key| key.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }

    /// Decoded value of a slot. Unlike [`Store::read`], a slot that exists
    /// but cannot be decoded is an error rather than a default.
    fn load_typed<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(envelope) = self.load_envelope(key)? else {
            return Ok(None);
        };
        serde_json::from_value(envelope.data).map(Some).map_err(|e| {
            DealDeskError::Storage(format!("slot '{key}' does not match expected shape: {e}"))
        })
    }

    fn load_envelope(&self, key: &str) -> Result<Option<SlotEnvelope>> {
        validate_name("slot key", key)?;
        let Some(raw) = self.backend.load(&self.qualify(key))? else {
            return Ok(None);
        };
        let value: Value = serde_json::from_str(&raw)
            .map_err(|e| DealDeskError::Storage(format!("corrupt slot '{key}': {e}")))?;
        migrations::upgrade(value).map(Some)
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Serialize and store the full value of a slot, then notify subscribers.
    pub fn write<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<()> {
        validate_name("slot key", key)?;
        let envelope = SlotEnvelope {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Some(Utc::now()),
            data: serde_json::to_value(value)?,
        };
        let contents = serde_json::to_string(&envelope)?;
        self.backend.save(&self.qualify(key), &contents)?;
        debug!(key, bytes = contents.len(), "slot written");

        self.notify(key, &envelope.data);
        Ok(())
    }

    /// Read-modify-write one slot as a single mutation.
    ///
    /// `default` seeds a slot that does not exist yet. A slot that exists but
    /// is corrupt, mis-shaped, or from a newer schema fails with `Storage`
    /// before `f` runs. The slot is written only when `f` returns `Ok`; on
    /// error nothing is stored and subscribers are not notified.
    pub fn mutate<T, R, F>(&mut self, key: &str, default: T, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(&mut T) -> Result<R>,
    {
        let mut value = match self.load_typed(key) {
            Ok(Some(value)) => value,
            Ok(None) => default,
            Err(e) => {
                warn!(key, error = %e, "refusing to overwrite unusable slot");
                return Err(e);
            }
        };
        let outcome = f(&mut value)?;
        self.write(key, &value)?;
        Ok(outcome)
    }

    /// Delete a slot. Subscribers receive `null`.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        validate_name("slot key", key)?;
        let existed = self.backend.remove(&self.qualify(key))?;
        if existed {
            debug!(key, "slot removed");
            self.notify(key, &Value::Null);
        }
        Ok(existed)
    }

    // -----------------------------------------------------------------------
    // Subscriptions
    // -----------------------------------------------------------------------

    /// Call `observer` with the new raw value after every write to `key`.
    pub fn subscribe<F>(&mut self, key: &str, observer: F) -> SubscriptionId
    where
        F: FnMut(&Value) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers
            .entry(key.to_string())
            .or_default()
            .push((id, Box::new(observer)));
        id
    }

    /// Typed variant of [`Store::subscribe`]. Values that do not deserialize
    /// into `T` are skipped with a warning.
    pub fn watch<T, F>(&mut self, key: &str, mut observer: F) -> SubscriptionId
    where
        T: DeserializeOwned,
        F: FnMut(T) + 'static,
    {
        let watched = key.to_string();
        self.subscribe(key, move |value| {
            match serde_json::from_value::<T>(value.clone()) {
                Ok(typed) => observer(typed),
                Err(e) => warn!(key = %watched, error = %e, "watcher skipped undecodable value"),
            }
        })
    }

    /// Drop a subscription. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for observers in self.subscribers.values_mut() {
            let before = observers.len();
            observers.retain(|(sid, _)| *sid != id);
            if observers.len() != before {
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, key: &str) -> usize {
        self.subscribers.get(key).map_or(0, Vec::len)
    }

    /// Drop every subscription (session teardown).
    pub fn clear_subscribers(&mut self) {
        self.subscribers.clear();
    }

    fn notify(&mut self, key: &str, value: &Value) {
        if let Some(observers) = self.subscribers.get_mut(key) {
            for (_, observer) in observers.iter_mut() {
                observer(value);
            }
        }
    }

    fn qualify(&self, key: &str) -> String {
        format!("{}.{key}", self.namespace)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("backend", &self.backend.name())
            .field("namespace", &self.namespace)
            .field("subscribed_keys", &self.subscribers.len())
            .finish()
    }
}

/// Keys and namespaces are restricted to `[A-Za-z0-9._-]+`, and may not be
/// made only of dots.
fn validate_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DealDeskError::validation(format!("{what} must not be empty")));
    }
    if let Some(bad) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(DealDeskError::validation(format!(
            "{what} '{name}' contains invalid character '{bad}'"
        )));
    }
    if name.chars().all(|c| c == '.') {
        return Err(DealDeskError::validation(format!("{what} '{name}' is not a name")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use serde_json::json;
    use uuid::Uuid;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Row {
        id: u32,
        label: String,
    }

    fn rows() -> Vec<Row> {
        vec![
            Row {
                id: 1,
                label: "one".into(),
            },
            Row {
                id: 2,
                label: "two".into(),
            },
        ]
    }

    fn seeded(key: &str, contents: &str) -> Store {
        let backend = MemoryBackend::new().with_slot(format!("{DEFAULT_NAMESPACE}.{key}"), contents);
        Store::new(Box::new(backend), DEFAULT_NAMESPACE).expect("valid namespace")
    }

    fn temp_db() -> std::path::PathBuf {
        std::env::temp_dir().join(format!("dealdesk_store_{}.db", Uuid::now_v7()))
    }

    #[test]
    fn write_then_read_roundtrip() {
        let mut store = Store::in_memory();
        store.write("rows", &rows()).expect("write");

        let read: Vec<Row> = store.read("rows", Vec::new());
        assert_eq!(read, rows());
    }

    #[test]
    fn missing_slot_yields_default() {
        let store = Store::in_memory();
        let read: Vec<Row> = store.read("rows", vec![Row {
            id: 9,
            label: "fallback".into(),
        }]);
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, 9);
        assert!(!store.contains("rows"));
    }

    #[test]
    fn corrupt_slot_yields_default() {
        let store = seeded("rows", "{not json");
        let read: Vec<Row> = store.read_or_default("rows");
        assert!(read.is_empty());
        assert!(store.contains("rows"));
    }

    #[test]
    fn wrong_shape_yields_default() {
        let store = seeded("rows", r#"{"schemaVersion":1,"data":{"unexpected":true}}"#);
        let read: Vec<Row> = store.read_or_default("rows");
        assert!(read.is_empty());
    }

    #[test]
    fn newer_schema_yields_default() {
        let store = seeded("rows", r#"{"schemaVersion":42,"data":[]}"#);
        let read: Vec<Row> = store.read("rows", rows());
        assert_eq!(read, rows());
    }

    #[test]
    fn legacy_bare_array_is_upgraded() {
        let store = seeded("rows", r#"[{"id":1,"label":"one"},{"id":2,"label":"two"}]"#);
        let read: Vec<Row> = store.read_or_default("rows");
        assert_eq!(read, rows());
    }

    #[test]
    fn legacy_fixture_is_upgraded() {
        let fixture = std::fs::read_to_string("../../../fixtures/json/contacts.v0.fixture.json")
            .expect("read fixture");
        let store = seeded("contacts", &fixture);
        let read: Vec<Value> = store.read_or_default("contacts");
        assert_eq!(read.len(), 3);
        assert_eq!(read[0]["email"], "amara@harbourcap.example");
    }

    #[test]
    fn written_blob_carries_schema_version() {
        let mut store = Store::in_memory();
        store.write("rows", &rows()).unwrap();
        let envelope = store.load_envelope("rows").unwrap().expect("present");
        assert_eq!(envelope.schema_version, CURRENT_SCHEMA_VERSION);
        assert!(envelope.saved_at.is_some());
    }

    #[test]
    fn invalid_keys_are_rejected() {
        let mut store = Store::in_memory();
        assert!(store.write("../escape", &1).is_err());
        assert!(store.write("", &1).is_err());
        assert_eq!(store.read("../escape", 7), 7);
    }

    #[test]
    fn subscribers_see_every_write() {
        let mut store = Store::in_memory();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe("counter", move |value| sink.borrow_mut().push(value.clone()));

        store.write("counter", &1).unwrap();
        store.write("counter", &2).unwrap();
        store.write("other", &3).unwrap();

        assert_eq!(*seen.borrow(), vec![json!(1), json!(2)]);
    }

    #[test]
    fn multiple_observers_stay_in_sync() {
        let mut store = Store::in_memory();
        let a = Rc::new(RefCell::new(Vec::<Row>::new()));
        let b = Rc::new(RefCell::new(Vec::<Row>::new()));
        let (sink_a, sink_b) = (Rc::clone(&a), Rc::clone(&b));
        store.watch("rows", move |v: Vec<Row>| *sink_a.borrow_mut() = v);
        store.watch("rows", move |v: Vec<Row>| *sink_b.borrow_mut() = v);

        store.write("rows", &rows()).unwrap();
        assert_eq!(*a.borrow(), rows());
        assert_eq!(*a.borrow(), *b.borrow());
        assert_eq!(store.subscriber_count("rows"), 2);
    }

    #[test]
    fn unsubscribe_stops_notifications() {
        let mut store = Store::in_memory();
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        let id = store.subscribe("k", move |_| *sink.borrow_mut() += 1);

        store.write("k", &1).unwrap();
        assert!(store.unsubscribe(id));
        assert!(!store.unsubscribe(id));
        store.write("k", &2).unwrap();

        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn remove_notifies_null() {
        let mut store = Store::in_memory();
        store.write("k", &1).unwrap();
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        store.subscribe("k", move |v| *sink.borrow_mut() = Some(v.clone()));

        assert!(store.remove("k").unwrap());
        assert_eq!(*seen.borrow(), Some(Value::Null));
        assert!(!store.remove("k").unwrap());
    }

    #[test]
    fn mutate_writes_only_on_success() {
        let mut store = Store::in_memory();
        store.write("rows", &rows()).unwrap();

        let len = store
            .mutate("rows", Vec::<Row>::new(), |rows| {
                rows.retain(|r| r.id != 1);
                Ok(rows.len())
            })
            .expect("mutate");
        assert_eq!(len, 1);

        let failed: Result<()> = store.mutate("rows", Vec::<Row>::new(), |rows| {
            rows.clear();
            Err(DealDeskError::validation("abort"))
        });
        assert!(failed.is_err());

        let read: Vec<Row> = store.read_or_default("rows");
        assert_eq!(read.len(), 1);
        assert_eq!(read[0].id, 2);
    }

    #[test]
    fn mutate_refuses_corrupt_slot() {
        let mut store = seeded("rows", "{not json");
        let result = store.mutate("rows", Vec::<Row>::new(), |rows| {
            rows.push(Row {
                id: 3,
                label: "three".into(),
            });
            Ok(())
        });

        assert!(matches!(result, Err(DealDeskError::Storage(_))));
        assert!(store.load_envelope("rows").is_err(), "corrupt blob left in place");
    }

    #[test]
    fn mutate_refuses_mismatched_rows() {
        let raw = r#"{"schemaVersion":1,"data":[{"id":1,"label":"one"},{"id":"two","label":"two"}]}"#;
        let mut store = seeded("rows", raw);
        let hits = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&hits);
        store.subscribe("rows", move |_| *sink.borrow_mut() += 1);

        let result = store.mutate("rows", Vec::<Row>::new(), |rows| {
            rows.clear();
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(*hits.borrow(), 0);

        let envelope = store.load_envelope("rows").unwrap().expect("present");
        assert_eq!(envelope.data.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn mutate_refuses_newer_schema() {
        let mut store = seeded("rows", r#"{"schemaVersion":42,"data":[]}"#);
        let result = store.mutate("rows", Vec::<Row>::new(), |_| Ok(()));
        assert!(result.is_err());
    }

    #[test]
    fn mutate_seeds_missing_slot_with_default() {
        let mut store = Store::in_memory();
        store
            .mutate("rows", rows(), |rows| {
                rows.truncate(1);
                Ok(())
            })
            .expect("mutate");
        assert_eq!(store.read_or_default::<Vec<Row>>("rows").len(), 1);
    }

    #[test]
    fn invalid_namespaces_are_rejected() {
        for namespace in ["", "../outside", "..", "a/b", "work space"] {
            assert!(
                Store::new(Box::new(MemoryBackend::new()), namespace).is_err(),
                "namespace {namespace:?} accepted"
            );
        }
        assert!(Store::new(Box::new(MemoryBackend::new()), "client-a.v2").is_ok());
    }

    #[test]
    fn invalid_namespace_opens_nothing() {
        let path = temp_db();
        assert!(Store::open_database(&path, "../outside").is_err());
        assert!(!path.exists());
    }

    #[test]
    fn database_store_survives_reopen() {
        let path = temp_db();
        {
            let mut store = Store::open_database(&path, "dealdesk").expect("open");
            store.write("rows", &rows()).expect("write");
            assert_eq!(store.backend_name(), "libsql");
        }
        let store = Store::open_database(&path, "dealdesk").expect("reopen");
        assert_eq!(store.read::<Vec<Row>>("rows", Vec::new()), rows());
        assert_eq!(store.keys().unwrap(), vec!["rows".to_string()]);
    }

    #[test]
    fn namespaces_are_isolated() {
        let path = temp_db();
        let mut work = Store::open_database(&path, "work").expect("open work");
        let personal = Store::open_database(&path, "personal").expect("open personal");

        work.write("rows", &rows()).unwrap();
        assert!(personal.read_or_default::<Vec<Row>>("rows").is_empty());
        assert!(personal.keys().unwrap().is_empty());
        assert_eq!(work.keys().unwrap(), vec!["rows".to_string()]);
    }
}
