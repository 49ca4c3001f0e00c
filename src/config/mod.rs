use dashmap::DashMap;
use serde_json::Value;
use std::env;
use std::sync::Arc;

/// Per-component configuration store
///
/// Maps a component name to its raw config value. Cloning shares the
/// underlying map, so values written after registration are still seen
/// at install time.
#[derive(Clone, Debug, Default)]
pub struct ConfigStore {
    configs: Arc<DashMap<String, Value>>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configs from environment variables starting with `prefix`
    ///
    /// `APPX_DB='{"url": "..."}'` with prefix `APPX_` configures component
    /// `db`. Values that are not valid JSON are stored as strings.
    ///
    /// Keys are stored lowercased; [`get`](Self::get) falls back to the
    /// lowercased name, so `APPX_MYDB` also configures a component named
    /// `myDb`.
    pub fn from_env(prefix: &str) -> Self {
        Self::from_vars(prefix, env::vars())
    }

    pub(crate) fn from_vars<I>(prefix: &str, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let store = Self::default();
        for (key, raw) in vars {
            let Some(name) = key.strip_prefix(prefix) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
            store.set(name.to_lowercase(), value);
        }
        store
    }

    /// Config for `name`, or for its lowercased form if there is no exact match
    pub fn get(&self, name: &str) -> Option<Value> {
        self.configs
            .get(name)
            .or_else(|| self.configs.get(&name.to_lowercase()))
            .map(|v| v.clone())
    }

    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.configs.insert(name.into(), value);
    }

    pub fn remove(&self, name: &str) -> Option<Value> {
        self.configs.remove(name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.configs.contains_key(name) || self.configs.contains_key(&name.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
