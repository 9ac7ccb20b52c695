use crate::config::{FlushPolicy, PlannerConfig};
use crate::document::Document;
use crate::error::{PlannerError, Result};
use crate::schema::DocPath;
use crate::storage::Storage;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// The main entry point for planner data.
///
/// Owns the single planner document in memory and mirrors it to one entry
/// of a [`Storage`] backend. Construct it once per session and hand it to
/// every consumer by reference.
pub struct PlannerStore<S: Storage> {
    storage: S,
    key: String,
    policy: FlushPolicy,
    doc: Document,
    dirty: bool,
}

/// Input accepted by [`PlannerStore::import_data`]: exported text or an already-parsed value
#[derive(Debug, Clone)]
pub enum ImportPayload {
    Text(String),
    Value(Value),
}

impl From<&str> for ImportPayload {
    fn from(text: &str) -> Self {
        ImportPayload::Text(text.to_string())
    }
}

impl From<String> for ImportPayload {
    fn from(text: String) -> Self {
        ImportPayload::Text(text)
    }
}

impl From<Value> for ImportPayload {
    fn from(value: Value) -> Self {
        ImportPayload::Value(value)
    }
}

impl<S: Storage> PlannerStore<S> {
    /// Open a store with the default configuration.
    pub fn open(storage: S) -> Self {
        Self::with_config(storage, &PlannerConfig::default())
    }

    /// Open a store, loading whatever the backend holds under the configured key.
    /// Missing, unreadable, or corrupt data yields the default skeleton.
    pub fn with_config(storage: S, config: &PlannerConfig) -> Self {
        let doc = read_persisted(&storage, &config.storage_key);
        PlannerStore {
            storage,
            key: config.storage_key.clone(),
            policy: config.flush,
            doc,
            dirty: false,
        }
    }

    /// Read the value at a dotted path. The empty path returns the whole document.
    pub fn get(&self, path: impl Into<DocPath>) -> Option<Value> {
        self.doc.get(&path.into())
    }

    /// Borrow the value at a path inside a namespace without cloning.
    pub fn lookup(&self, path: &DocPath) -> Option<&Value> {
        self.doc.lookup(path)
    }

    /// Write `value` at a dotted path, stamp `lastModified`, and persist
    /// (immediately, or on the next flush under [`FlushPolicy::Deferred`]).
    ///
    /// Storage failures are logged, not returned: the value stays in memory
    /// and the store remains dirty until a later write lands.
    pub fn set(&mut self, path: impl Into<DocPath>, value: impl Into<Value>) -> Result<()> {
        let path = path.into();
        self.doc.set(&path, value.into())?;
        self.doc.touch();
        self.dirty = true;
        self.after_write();
        Ok(())
    }

    /// Start a batch of writes that land together with a single stamp and flush.
    pub fn batch(&mut self) -> Batch<'_, S> {
        Batch {
            store: self,
            ops: Vec::new(),
        }
    }

    /// The full document snapshot
    pub fn get_all(&self) -> &Document {
        &self.doc
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.doc.last_modified
    }

    /// Delete the persisted document. Later reads see the default skeleton.
    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_item(&self.key)?;
        self.doc = Document::default();
        self.dirty = false;
        log::info!("Cleared planner data under '{}'", self.key);
        Ok(())
    }

    /// Pretty-printed JSON of the whole document
    pub fn export_data(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.doc)?)
    }

    /// Replace the whole document with imported data.
    ///
    /// Returns `false` and leaves the current document untouched when the
    /// payload isn't a well-formed planner document.
    pub fn import_data(&mut self, payload: impl Into<ImportPayload>) -> bool {
        match self.try_import(payload) {
            Ok(()) => true,
            Err(e) => {
                log::error!("Import failed: {e}");
                false
            }
        }
    }

    /// Like [`PlannerStore::import_data`], but reports why an import was rejected.
    pub fn try_import(&mut self, payload: impl Into<ImportPayload>) -> Result<()> {
        let value = match payload.into() {
            ImportPayload::Text(text) => serde_json::from_str(&text)
                .map_err(|e| PlannerError::ImportValidation(e.to_string()))?,
            ImportPayload::Value(value) => value,
        };
        let mut incoming = Document::from_value(value)?;

        // Keep the stamp moving forward even if the import carries an older one
        incoming.last_modified = incoming.last_modified.max(self.doc.last_modified);
        incoming.touch();

        self.doc = incoming;
        self.dirty = true;
        self.after_write();
        Ok(())
    }

    /// Write the in-memory document to storage if it has unsaved changes.
    pub fn flush(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let serialized = serde_json::to_string(&self.doc)?;
        self.storage.set_item(&self.key, &serialized)?;
        self.dirty = false;
        log::debug!(
            "Flushed planner document ({} bytes) to '{}'",
            serialized.len(),
            self.key
        );
        Ok(())
    }

    /// Whether there are edits not yet in storage
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Discard in-memory state and re-read the persisted document.
    pub fn reload(&mut self) {
        self.doc = read_persisted(&self.storage, &self.key);
        self.dirty = false;
    }

    pub fn policy(&self) -> FlushPolicy {
        self.policy
    }

    pub fn storage_key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    fn after_write(&mut self) {
        if self.policy == FlushPolicy::Immediate {
            if let Err(e) = self.flush() {
                log::error!("Failed to write planner data to '{}': {e}", self.key);
            }
        }
    }
}

/// Writes applied all-or-nothing: if any path is rejected, none land.
pub struct Batch<'a, S: Storage> {
    store: &'a mut PlannerStore<S>,
    ops: Vec<(DocPath, Value)>,
}

impl<S: Storage> Batch<'_, S> {
    pub fn set(&mut self, path: impl Into<DocPath>, value: impl Into<Value>) -> &mut Self {
        self.ops.push((path.into(), value.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every queued write, stamp once, and persist once.
    pub fn execute(self) -> Result<()> {
        if self.ops.is_empty() {
            return Ok(());
        }
        let mut staged = self.store.doc.clone();
        for (path, value) in self.ops {
            staged.set(&path, value)?;
        }
        staged.touch();
        self.store.doc = staged;
        self.store.dirty = true;
        self.store.after_write();
        Ok(())
    }
}

fn read_persisted<S: Storage>(storage: &S, key: &str) -> Document {
    let raw = match storage.get_item(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Document::default(),
        Err(e) => {
            log::warn!("Planner storage unavailable, starting empty: {e}");
            return Document::default();
        }
    };

    let parsed = serde_json::from_str::<Value>(&raw)
        .map_err(|e| PlannerError::StorageCorrupt(e.to_string()))
        .and_then(|value| {
            Document::from_value(value).map_err(|e| PlannerError::StorageCorrupt(e.to_string()))
        });

    match parsed {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("Failed to read planner data under '{key}', starting empty: {e}");
            Document::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{FileStorage, MemoryStorage};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn memory_store() -> PlannerStore<MemoryStorage> {
        PlannerStore::open(MemoryStorage::new())
    }

    #[test]
    fn test_fresh_store_is_skeleton() {
        let store = memory_store();
        assert_eq!(store.get_all(), &Document::default());
        assert_eq!(store.get("version"), Some(json!(1)));
        assert_eq!(store.get("plan"), Some(json!({})));
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let mut store = memory_store();
        let cases = vec![
            ("plan.section1.mission", json!("Help small creators")),
            ("checklist.week1.setupDiscord", json!(true)),
            ("financials.months.3.subRevenue", json!(125.5)),
            ("deepDive.targets.platforms", json!(["Twitch", "YouTube"])),
            ("templates.bio", Value::Null),
        ];
        for (path, value) in cases {
            store.set(path, value.clone()).unwrap();
            assert_eq!(store.get(path), Some(value), "path {path}");
        }
    }

    #[test]
    fn test_get_through_string_is_none() {
        let mut store = memory_store();
        store.set("plan.a.b", "text").unwrap();
        assert_eq!(store.get("plan.a.b.c"), None);
    }

    #[test]
    fn test_empty_path_returns_whole_document() {
        let mut store = memory_store();
        store.set("plan.x", 1).unwrap();
        let whole = store.get("").unwrap();
        assert_eq!(whole["plan"], json!({ "x": 1 }));
        assert_eq!(whole["version"], json!(1));
    }

    #[test]
    fn test_set_writes_through_and_stamps() {
        let mut store = memory_store();
        store.set("plan.section1.brandName", "NovaByte").unwrap();

        let first = store.last_modified().unwrap();
        assert!(!store.is_dirty());

        let raw = store.storage().get_item("influencerPlanner").unwrap().unwrap();
        let persisted: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted["plan"]["section1"]["brandName"], json!("NovaByte"));

        store.set("plan.section1.tagline", "Pixels with purpose").unwrap();
        assert!(store.last_modified().unwrap() > first);
    }

    #[test]
    fn test_rejected_set_changes_nothing() {
        let mut store = memory_store();
        store.set("plan.x", 1).unwrap();
        let before = store.get_all().clone();

        assert!(store.set("lastModified", "2020-01-01T00:00:00Z").is_err());
        assert!(store.set("version", "one").is_err());
        assert_eq!(store.get_all(), &before);
    }

    #[test]
    fn test_corrupt_persisted_data_falls_back_to_skeleton() {
        let mut storage = MemoryStorage::new();
        storage.set_item("influencerPlanner", "{not json").unwrap();
        let store = PlannerStore::open(storage);
        assert_eq!(store.get_all(), &Document::default());

        let mut storage = MemoryStorage::new();
        storage.set_item("influencerPlanner", "\"just a string\"").unwrap();
        let store = PlannerStore::open(storage);
        assert_eq!(store.get_all(), &Document::default());
    }

    #[test]
    fn test_write_failure_is_non_fatal() {
        let mut store = PlannerStore::open(MemoryStorage::with_quota(400));
        store.set("plan.short", "ok").unwrap();
        assert!(!store.is_dirty());

        let big = "x".repeat(500);
        store.set("plan.long", big.clone()).unwrap();

        // In memory, not durable
        assert_eq!(store.get("plan.long"), Some(json!(big)));
        assert!(store.is_dirty());
        let raw = store.storage().get_item("influencerPlanner").unwrap().unwrap();
        assert!(!raw.contains("xxxx"));
    }

    #[test]
    fn test_deferred_policy_waits_for_flush() {
        let config = PlannerConfig {
            flush: FlushPolicy::Deferred,
            ..PlannerConfig::default()
        };
        let mut store = PlannerStore::with_config(MemoryStorage::new(), &config);
        store.set("plan.a", 1).unwrap();
        store.set("plan.b", 2).unwrap();

        assert!(store.is_dirty());
        assert_eq!(store.storage().get_item("influencerPlanner").unwrap(), None);

        store.flush().unwrap();
        assert!(!store.is_dirty());
        assert!(store.storage().get_item("influencerPlanner").unwrap().is_some());
    }

    #[test]
    fn test_clear_removes_persisted_document() {
        let mut store = memory_store();
        store.set("plan.a", 1).unwrap();
        store.clear().unwrap();

        assert_eq!(store.get("plan.a"), None);
        assert_eq!(store.get_all(), &Document::default());
        assert_eq!(store.storage().get_item("influencerPlanner").unwrap(), None);
    }

    #[test]
    fn test_export_is_pretty_json() {
        let mut store = memory_store();
        store.set("plan.a", 1).unwrap();
        let text = store.export_data().unwrap();
        assert!(text.contains("\n  \"plan\": {\n    \"a\": 1\n  }"));
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut source = memory_store();
        source.set("plan.section1.mission", "Grow").unwrap();
        source.set("calendar.2026-10-12.rows.0_0.timeStart", "09:00").unwrap();
        source.set("scratch.note", "kept").unwrap();
        let exported = source.export_data().unwrap();

        let mut target = memory_store();
        assert!(target.import_data(exported.as_str()));

        let mut expected = source.get_all().clone();
        let mut actual = target.get_all().clone();
        expected.last_modified = None;
        actual.last_modified = None;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_import_accepts_parsed_value() {
        let mut store = memory_store();
        assert!(store.import_data(json!({ "version": 1, "plan": { "a": "b" } })));
        assert_eq!(store.get("plan.a"), Some(json!("b")));
        assert!(store.last_modified().is_some());
    }

    #[test]
    fn test_import_rejects_bad_payloads_without_mutation() {
        let mut store = memory_store();
        store.set("plan.keep", "me").unwrap();
        store.flush().unwrap();
        let before = store.get_all().clone();
        let persisted = store.storage().get_item(store.storage_key()).unwrap();
        assert!(persisted.is_some());

        assert!(!store.import_data("\"bare string\""));
        assert!(!store.import_data("null"));
        assert!(!store.import_data(Value::Null));
        assert!(!store.import_data(json!("text")));
        assert!(!store.import_data("{ broken"));

        assert_eq!(store.get_all(), &before);
        let err = store.try_import(json!(42)).unwrap_err();
        assert!(matches!(err, PlannerError::ImportValidation(_)));
        store.flush().unwrap();
        assert_eq!(store.storage().get_item(store.storage_key()).unwrap(), persisted);
    }

    #[test]
    fn test_import_never_moves_stamp_backwards() {
        let mut store = memory_store();
        store.set("plan.a", 1).unwrap();
        let before = store.last_modified().unwrap();

        store
            .try_import(json!({ "lastModified": "2001-01-01T00:00:00.000Z" }))
            .unwrap();
        assert!(store.last_modified().unwrap() > before);
    }

    #[test]
    fn test_batch_is_all_or_nothing() {
        let mut store = memory_store();
        store.set("plan.a", 1).unwrap();

        let mut batch = store.batch();
        batch.set("plan.b", 2).set("lastModified", "nope");
        assert!(batch.execute().is_err());
        assert_eq!(store.get("plan.b"), None);

        let mut batch = store.batch();
        batch.set("plan.b", 2).set("plan.c", 3);
        assert_eq!(batch.len(), 2);
        batch.execute().unwrap();
        assert_eq!(store.get("plan.c"), Some(json!(3)));
    }

    #[test]
    fn test_file_backed_store_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        {
            let mut store = PlannerStore::open(FileStorage::open(tmp.path()).unwrap());
            store.set("plan.section1.mission", "Persist me").unwrap();
        }
        let store = PlannerStore::open(FileStorage::open(tmp.path()).unwrap());
        assert_eq!(store.get("plan.section1.mission"), Some(json!("Persist me")));
    }

    #[test]
    fn test_reload_discards_unflushed_edits() {
        let config = PlannerConfig {
            flush: FlushPolicy::Deferred,
            ..PlannerConfig::default()
        };
        let mut store = PlannerStore::with_config(MemoryStorage::new(), &config);
        store.set("plan.a", 1).unwrap();
        store.flush().unwrap();
        store.set("plan.a", 2).unwrap();

        store.reload();
        assert_eq!(store.get("plan.a"), Some(json!(1)));
        assert!(!store.is_dirty());
    }
}
