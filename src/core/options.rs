use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Open-ended keyword options for a completion request.
///
/// Keys and values are forwarded verbatim to the backend request body
/// (`temperature`, `top_p`, `stop`, provider-specific extras, ...). The
/// generation layer never interprets them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenerationOptions(Map<String, Value>);

impl GenerationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an option. Returns `self` for chaining.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Merge `overrides` over these options. For a key present in both,
    /// the override wins.
    pub fn merged(&self, overrides: &GenerationOptions) -> GenerationOptions {
        let mut map = self.0.clone();
        for (key, value) in &overrides.0 {
            map.insert(key.clone(), value.clone());
        }
        GenerationOptions(map)
    }
}
