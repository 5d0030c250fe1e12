use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, trace};

/// A single remotely-settable value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Number(f64),
}

/// Remotely mutable key/value configuration.
///
/// Reads never block on the remote peer and never fail: a missing key, a
/// value of the wrong type or a disconnected store all yield the caller's
/// default.
pub trait ParameterStore: Send + Sync {
    fn get_number(&self, key: &str, default: f64) -> f64;

    fn get_bool(&self, key: &str, default: bool) -> bool;

    fn set_number(&self, key: &str, value: f64);

    fn set_bool(&self, key: &str, value: bool);

    /// Current values, for diagnostics
    fn snapshot(&self) -> BTreeMap<String, ParamValue> {
        BTreeMap::new()
    }

    /// Whether reads currently reflect the remote peer
    fn is_connected(&self) -> bool {
        true
    }
}

pub type SharedParameterStore = Arc<dyn ParameterStore>;

/// In-process parameter table shared by the capture loops and the HTTP
/// control routes
pub struct MemoryParameterStore {
    values: RwLock<HashMap<String, ParamValue>>,
    connected: AtomicBool,
    last_update: RwLock<Option<DateTime<Utc>>>,
}

impl MemoryParameterStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
            connected: AtomicBool::new(true),
            last_update: RwLock::new(None),
        }
    }

    /// Create a store pre-populated with values
    pub fn with_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, ParamValue)>,
        K: Into<String>,
    {
        let store = Self::new();
        for (key, value) in values {
            store.set(key.into(), value);
        }
        store
    }

    /// Mark the store as (dis)connected; while disconnected every read
    /// returns its default
    pub fn set_connected(&self, connected: bool) {
        let previous = self.connected.swap(connected, Ordering::Relaxed);
        if previous != connected {
            debug!(
                "Parameter store {}",
                if connected { "connected" } else { "disconnected" }
            );
        }
    }

    /// Time of the most recent write
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.read()
    }

    fn set(&self, key: String, value: ParamValue) {
        trace!("Parameter {} = {:?}", key, value);
        self.values.write().insert(key, value);
        *self.last_update.write() = Some(Utc::now());
    }

    fn get(&self, key: &str) -> Option<ParamValue> {
        if !self.connected.load(Ordering::Relaxed) {
            return None;
        }
        self.values.read().get(key).copied()
    }
}

impl Default for MemoryParameterStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ParameterStore for MemoryParameterStore {
    fn get_number(&self, key: &str, default: f64) -> f64 {
        match self.get(key) {
            Some(ParamValue::Number(value)) if value.is_finite() => value,
            Some(other) => {
                trace!("Parameter {} has unusable value {:?}, using default", key, other);
                default
            }
            None => default,
        }
    }

    fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key) {
            Some(ParamValue::Bool(value)) => value,
            Some(other) => {
                trace!("Parameter {} has unusable value {:?}, using default", key, other);
                default
            }
            None => default,
        }
    }

    fn set_number(&self, key: &str, value: f64) {
        self.set(key.to_string(), ParamValue::Number(value));
    }

    fn set_bool(&self, key: &str, value: bool) {
        self.set(key.to_string(), ParamValue::Bool(value));
    }

    fn snapshot(&self) -> BTreeMap<String, ParamValue> {
        self.values
            .read()
            .iter()
            .map(|(key, value)| (key.clone(), *value))
            .collect()
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}
