//! Recognized property keys and their built-in defaults

pub const INFERENCE_ADDRESS: &str = "inference_address";
pub const MANAGEMENT_ADDRESS: &str = "management_address";
pub const METRICS_ADDRESS: &str = "metrics_address";
pub const ENABLE_ENVVARS_CONFIG: &str = "enable_envvars_config";
pub const ALLOWED_URLS: &str = "allowed_urls";
pub const MODELS: &str = "models";
pub const LOAD_MODELS: &str = "load_models";
pub const MODEL_STORE: &str = "model_store";
pub const LOG_LOCATION: &str = "log_location";
pub const METRICS_LOCATION: &str = "metrics_location";
pub const METRICS_FORMAT: &str = "metrics_format";
pub const KEYSTORE: &str = "keystore";
pub const KEYSTORE_PASS: &str = "keystore_pass";
pub const KEYSTORE_TYPE: &str = "keystore_type";
pub const KEYSTORE_ALIAS: &str = "keystore_alias";
pub const PRIVATE_KEY_FILE: &str = "private_key_file";
pub const CERTIFICATE_FILE: &str = "certificate_file";
pub const DEFAULT_WORKERS_PER_MODEL: &str = "default_workers_per_model";
pub const JOB_QUEUE_SIZE: &str = "job_queue_size";
pub const DEFAULT_RESPONSE_TIMEOUT: &str = "default_response_timeout";

/// Compiled-in defaults, the lowest-precedence layer
pub const DEFAULTS: &[(&str, &str)] = &[
    (INFERENCE_ADDRESS, "http://127.0.0.1:8080"),
    (MANAGEMENT_ADDRESS, "http://127.0.0.1:8081"),
    (METRICS_ADDRESS, "http://127.0.0.1:8082"),
    (ENABLE_ENVVARS_CONFIG, "false"),
    (ALLOWED_URLS, crate::allowlist::DEFAULT_ALLOWED_URLS),
    (DEFAULT_WORKERS_PER_MODEL, "0"),
    (JOB_QUEUE_SIZE, "100"),
    (DEFAULT_RESPONSE_TIMEOUT, "120"),
    ("number_of_netty_threads", "0"),
    ("netty_client_threads", "0"),
    ("max_request_size", "6553500"),
    ("max_response_size", "6553500"),
    (LOG_LOCATION, "logs"),
    (METRICS_LOCATION, "logs"),
    (METRICS_FORMAT, "log"),
    ("enable_metrics_api", "true"),
    (MODEL_STORE, ""),
    (LOAD_MODELS, ""),
];

/// Recognized keys that have no default value
const OPTIONAL_KEYS: &[&str] = &[
    MODELS,
    KEYSTORE,
    KEYSTORE_PASS,
    KEYSTORE_TYPE,
    KEYSTORE_ALIAS,
    PRIVATE_KEY_FILE,
    CERTIFICATE_FILE,
];

/// Whether `key` is a setting this process knows about
pub fn is_recognized(key: &str) -> bool {
    DEFAULTS.iter().any(|(k, _)| *k == key) || OPTIONAL_KEYS.contains(&key)
}
