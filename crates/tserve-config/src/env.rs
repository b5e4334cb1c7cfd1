//! Environment variable naming for the environment layer
//!
//! Every property key has exactly one variable: `TS_` followed by the key in
//! upper case (`allowed_urls` -> `TS_ALLOWED_URLS`).

use std::collections::BTreeMap;

use tracing::debug;

/// Prefix shared by all configuration variables
pub const ENV_PREFIX: &str = "TS_";

/// Variable that selects the properties file when no argument does
pub const CONFIG_FILE_VAR: &str = "TS_CONFIG_FILE";

/// Variable name for a property key
pub fn var_name(key: &str) -> String {
    format!("{ENV_PREFIX}{}", key.to_uppercase())
}

/// Property key for a variable name, if it carries the prefix
pub fn property_key(var: &str) -> Option<String> {
    let rest = var.strip_prefix(ENV_PREFIX)?;
    if rest.is_empty() || var == CONFIG_FILE_VAR {
        return None;
    }
    Some(rest.to_lowercase())
}

/// Collect the entries for keys accepted by `known`. Other `TS_*`
/// variables are skipped.
pub fn collect<I, F>(vars: I, known: F) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (String, String)>,
    F: Fn(&str) -> bool,
{
    vars.into_iter()
        .filter_map(|(name, value)| {
            let key = property_key(&name)?;
            if known(&key) {
                Some((key, value))
            } else {
                debug!("Ignoring {}: not a recognized configuration key", name);
                None
            }
        })
        .collect()
}

/// Snapshot of the process environment, skipping non-UTF-8 entries
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_name_mapping() {
        assert_eq!(var_name("allowed_urls"), "TS_ALLOWED_URLS");
        assert_eq!(var_name("enable_envvars_config"), "TS_ENABLE_ENVVARS_CONFIG");
    }

    #[test]
    fn test_property_key_mapping() {
        assert_eq!(property_key("TS_ALLOWED_URLS").as_deref(), Some("allowed_urls"));
        assert_eq!(property_key("TS_"), None);
        assert_eq!(property_key("PATH"), None);
        assert_eq!(property_key(CONFIG_FILE_VAR), None);
    }

    #[test]
    fn test_collect_keeps_empty_values() {
        let vars = vec![
            ("TS_KEYSTORE".to_string(), String::new()),
            ("HOME".to_string(), "/root".to_string()),
        ];
        let collected = collect(vars, |_| true);
        assert_eq!(collected.len(), 1);
        assert_eq!(collected["keystore"], "");
    }

    #[test]
    fn test_collect_skips_unknown_keys() {
        let vars = vec![
            ("TS_JOB_QUEUE_SIZE".to_string(), "75".to_string()),
            ("TS_FOO".to_string(), "bar".to_string()),
        ];
        let collected = collect(vars, |key| key == "job_queue_size");
        assert_eq!(collected.len(), 1);
        assert!(!collected.contains_key("foo"));
    }
}
