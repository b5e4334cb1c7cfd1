//! Per-model configuration overrides
//!
//! The `models` property holds a JSON document of the form
//!
//! ```json
//! { "noop": { "1.0": { "batchSize": 4, "maxWorkers": 1 },
//!             "*":   { "responseTimeout": 60 } } }
//! ```
//!
//! Lookups try the exact version first, then the `"*"` version entry, then
//! return the caller's default. Nothing here ever fails: malformed JSON
//! yields an empty table and values that do not coerce fall back to the
//! default.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::{debug, warn};
use tserve_core::TsError;

/// Version key that applies to every version of a model
pub const VERSION_WILDCARD: &str = "*";

type Settings = BTreeMap<String, Value>;

/// Parsed `(model, version, setting) -> value` table
#[derive(Debug, Clone, Default)]
pub struct ModelOverrides {
    models: BTreeMap<String, BTreeMap<String, Settings>>,
    parse_error: Option<String>,
}

impl ModelOverrides {
    /// Parse the JSON text of the `models` property
    pub fn parse(raw: &str) -> Self {
        if raw.trim().is_empty() {
            return Self::default();
        }
        let root: Value = match serde_json::from_str(raw) {
            Ok(root) => root,
            Err(e) => return Self::degraded(format!("models property is not valid JSON: {e}")),
        };
        let Value::Object(root) = root else {
            return Self::degraded("models property must be a JSON object".to_string());
        };

        let mut models = BTreeMap::new();
        for (model, versions) in root {
            let Value::Object(versions) = versions else {
                debug!("Skipping non-object override entry for model {}", model);
                continue;
            };
            let mut parsed = BTreeMap::new();
            for (version, settings) in versions {
                match settings {
                    Value::Object(settings) => {
                        parsed.insert(version, settings.into_iter().collect());
                    }
                    _ => debug!("Skipping non-object override entry {}/{}", model, version),
                }
            }
            models.insert(model, parsed);
        }

        Self {
            models,
            parse_error: None,
        }
    }

    fn degraded(message: String) -> Self {
        let error = TsError::ParseDegraded(message);
        warn!("{}; per-model overrides disabled", error);
        Self {
            models: BTreeMap::new(),
            parse_error: Some(error.to_string()),
        }
    }

    /// Diagnostic recorded when the JSON could not be used
    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn model_names(&self) -> impl Iterator<Item = &str> {
        self.models.keys().map(String::as_str)
    }

    pub fn versions(&self, model: &str) -> Vec<&str> {
        self.models
            .get(model)
            .map(|v| v.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Raw JSON value for a setting, honouring the version wildcard
    pub fn raw(&self, model: &str, version: &str, setting: &str) -> Option<&Value> {
        let versions = self.models.get(model)?;
        versions
            .get(version)
            .and_then(|settings| settings.get(setting))
            .or_else(|| {
                versions
                    .get(VERSION_WILDCARD)
                    .and_then(|settings| settings.get(setting))
            })
    }

    /// Typed lookup; absent or uncoercible values yield `default`
    pub fn get<T: FromOverride>(&self, model: &str, version: &str, setting: &str, default: T) -> T {
        match self.raw(model, version, setting) {
            Some(value) => T::from_override(value).unwrap_or_else(|| {
                debug!(
                    "Override {}/{}/{} = {} does not coerce, using default",
                    model, version, setting, value
                );
                default
            }),
            None => default,
        }
    }
}

/// Coercion from a JSON override value
pub trait FromOverride: Sized {
    fn from_override(value: &Value) -> Option<Self>;
}

impl FromOverride for i64 {
    fn from_override(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromOverride for u64 {
    fn from_override(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

macro_rules! narrow_int {
    ($($ty:ty => $wide:ty),*) => {
        $(impl FromOverride for $ty {
            fn from_override(value: &Value) -> Option<Self> {
                <$wide>::from_override(value).and_then(|v| <$ty>::try_from(v).ok())
            }
        })*
    };
}

narrow_int!(i32 => i64, u32 => u64, usize => u64);

impl FromOverride for f64 {
    fn from_override(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromOverride for bool {
    fn from_override(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            Value::String(s) if s.trim().eq_ignore_ascii_case("true") => Some(true),
            Value::String(s) if s.trim().eq_ignore_ascii_case("false") => Some(false),
            _ => None,
        }
    }
}

impl FromOverride for String {
    fn from_override(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}
