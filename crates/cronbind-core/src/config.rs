use std::collections::BTreeMap;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};

use crate::error::{CoreError, Result};

/// Flat, string-keyed application configuration.
///
/// Loaded from a TOML file with `CRONBIND_*` env var overrides and flattened
/// into dotted keys (`[schedule] cleanup = "..."` becomes `schedule.cleanup`).
/// The scheduler only ever needs `get(key) -> Option<&str>`: a schedule
/// declaration's cron source may name a property key, resolved at build time.
#[derive(Debug, Clone, Default)]
pub struct Properties {
    values: BTreeMap<String, String>,
}

impl Properties {
    /// Load properties from a TOML file with `CRONBIND_*` env overrides.
    ///
    /// A missing file is not an error — env vars alone are a valid source.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let merged: serde_json::Value = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("CRONBIND_").split("_"))
            .extract()
            .map_err(|e| CoreError::Config(e.to_string()))?;

        let mut values = BTreeMap::new();
        flatten("", &merged, &mut values);
        Ok(Self { values })
    }

    /// Build properties from explicit key/value pairs. Intended for tests and
    /// embedded hosts that manage configuration themselves.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            values: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Look up a property value by its dotted key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Number of known properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{home}/.cronbind/cronbind.toml")
}

/// Flatten nested config into dotted string keys. Scalars are rendered with
/// their natural textual form; arrays and nulls are skipped (a cron source
/// is always a scalar).
fn flatten(prefix: &str, value: &serde_json::Value, out: &mut BTreeMap<String, String>) {
    match value {
        serde_json::Value::Object(map) => {
            for (k, v) in map {
                let key = if prefix.is_empty() {
                    k.clone()
                } else {
                    format!("{prefix}.{k}")
                };
                flatten(&key, v, out);
            }
        }
        serde_json::Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        serde_json::Value::Number(n) => {
            out.insert(prefix.to_string(), n.to_string());
        }
        serde_json::Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        serde_json::Value::Array(_) | serde_json::Value::Null => {}
    }
}
