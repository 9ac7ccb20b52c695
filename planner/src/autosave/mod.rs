// Debounced field capture: typing schedules a write, blur commits it

use crate::config::PlannerConfig;
use crate::error::Result;
use crate::schema::DocPath;
use crate::storage::Storage;
use crate::store::PlannerStore;
use serde_json::{Number, Value};
use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(300);

struct Pending<V> {
    value: V,
    deadline: Instant,
}

/// Per-key pending values with deadlines.
///
/// Scheduling a key again replaces its value and pushes its deadline out, so
/// only the last value scheduled for a key is ever delivered. The owner polls
/// with [`Debouncer::take_due`]; nothing here runs on its own.
pub struct Debouncer<K, V> {
    delay: Duration,
    pending: HashMap<K, Pending<V>>,
}

impl<K: Eq + Hash + Clone, V> Debouncer<K, V> {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: HashMap::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule(&mut self, key: K, value: V, now: Instant) {
        let deadline = now + self.delay;
        self.pending.insert(key, Pending { value, deadline });
    }

    pub fn cancel(&mut self, key: &K) -> Option<V> {
        self.pending.remove(key).map(|p| p.value)
    }

    /// Remove and return every entry whose deadline is at or before `now`,
    /// earliest deadline first.
    pub fn take_due(&mut self, now: Instant) -> Vec<(K, V)> {
        let due: Vec<K> = self
            .pending
            .iter()
            .filter(|(_, p)| p.deadline <= now)
            .map(|(k, _)| k.clone())
            .collect();
        self.drain_keys(due)
    }

    /// Remove and return everything still pending.
    pub fn take_all(&mut self) -> Vec<(K, V)> {
        let keys: Vec<K> = self.pending.keys().cloned().collect();
        self.drain_keys(keys)
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending.values().map(|p| p.deadline).min()
    }

    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    fn drain_keys(&mut self, keys: Vec<K>) -> Vec<(K, V)> {
        let mut drained: Vec<(K, Pending<V>)> = keys
            .into_iter()
            .filter_map(|k| self.pending.remove(&k).map(|p| (k, p)))
            .collect();
        drained.sort_by_key(|(_, p)| p.deadline);
        drained.into_iter().map(|(k, p)| (k, p.value)).collect()
    }
}

/// A raw value captured from an input control
#[derive(Debug, Clone, PartialEq)]
pub enum FieldInput {
    Text(String),
    /// Contents of a number box, still as typed
    Number(String),
    Checkbox(bool),
}

impl FieldInput {
    /// The value stored for this input. An empty number box stores `""`;
    /// a number box holding something unparsable keeps the text.
    pub fn to_value(&self) -> Value {
        match self {
            FieldInput::Text(text) => Value::String(text.clone()),
            FieldInput::Checkbox(checked) => Value::Bool(*checked),
            FieldInput::Number(raw) => {
                let trimmed = raw.trim();
                if trimmed.is_empty() {
                    return Value::String(String::new());
                }
                match trimmed.parse::<f64>() {
                    Ok(n) if n.is_finite() => number_value(n),
                    _ => Value::String(raw.clone()),
                }
            }
        }
    }
}

fn number_value(n: f64) -> Value {
    if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
        Value::from(n as i64)
    } else {
        Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Debounced writes from form fields into a [`PlannerStore`]
pub struct AutoSave {
    queue: Debouncer<DocPath, Value>,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_DELAY)
    }
}

impl AutoSave {
    pub fn new(delay: Duration) -> Self {
        AutoSave {
            queue: Debouncer::new(delay),
        }
    }

    pub fn from_config(config: &PlannerConfig) -> Self {
        Self::new(config.debounce())
    }

    /// A keystroke: schedule the field's value to be written after the delay.
    pub fn on_input(&mut self, path: impl Into<DocPath>, input: &FieldInput, now: Instant) {
        self.queue.schedule(path.into(), input.to_value(), now);
    }

    /// Focus left the field: write now and drop anything pending for it.
    pub fn on_commit<S: Storage>(
        &mut self,
        store: &mut PlannerStore<S>,
        path: impl Into<DocPath>,
        input: &FieldInput,
    ) -> Result<DocPath> {
        let path = path.into();
        self.queue.cancel(&path);
        store.set(path.clone(), input.to_value())?;
        Ok(path)
    }

    /// Write every value whose delay has elapsed. Returns the paths written.
    pub fn tick<S: Storage>(&mut self, store: &mut PlannerStore<S>, now: Instant) -> Result<Vec<DocPath>> {
        let due = self.queue.take_due(now);
        write_all(store, due)
    }

    /// Write everything still pending, regardless of deadline.
    pub fn flush_pending<S: Storage>(&mut self, store: &mut PlannerStore<S>) -> Result<Vec<DocPath>> {
        let all = self.queue.take_all();
        write_all(store, all)
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.next_deadline()
    }
}

fn write_all<S: Storage>(store: &mut PlannerStore<S>, entries: Vec<(DocPath, Value)>) -> Result<Vec<DocPath>> {
    let mut written = Vec::with_capacity(entries.len());
    for (path, value) in entries {
        store.set(path.clone(), value)?;
        written.push(path);
    }
    if !written.is_empty() {
        log::debug!("Autosaved {} field(s)", written.len());
    }
    Ok(written)
}
