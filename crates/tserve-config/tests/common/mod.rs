//! Shared fixtures for tserve-config integration tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tserve_config::{PropertyResolver, StartupArgs};

/// Properties mirroring a typical test deployment with env vars disabled
pub const CONFIG_TEST_ENV: &str = r#"
# tserve test configuration
inference_address=https://127.0.0.1:8443
enable_envvars_config=false
job_queue_size=50
models={\
  "noop": {\
    "1.0": {\
        "defaultVersion": true,\
        "marName": "noop.mar",\
        "minWorkers": 1,\
        "maxWorkers": 1,\
        "batchSize": 4,\
        "maxBatchDelay": 100,\
        "responseTimeout": 120\
    }\
  },\
  "vgg16": {\
    "1.0": {\
        "defaultVersion": true,\
        "marName": "vgg16.mar",\
        "minWorkers": 1,\
        "maxWorkers": 4,\
        "batchSize": 8,\
        "maxBatchDelay": 100,\
        "responseTimeout": 120\
    }\
  }\
}
"#;

/// Scratch directory with a log location inside it
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn logs(&self) -> PathBuf {
        self.path().join("logs")
    }

    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    /// Args with logs and metrics kept inside the workspace
    pub fn args(&self) -> StartupArgs {
        StartupArgs::new()
            .with_models(["noop_v0.1"])
            .with_log_location(self.logs())
            .with_property("metrics_location", self.logs().display().to_string())
    }

    /// Resolver that never looks at the real environment or home directory
    pub fn resolver(&self, args: StartupArgs, env: &[(&str, &str)]) -> PropertyResolver {
        PropertyResolver::new(args)
            .with_env(
                env.iter()
                    .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                    .collect::<Vec<_>>(),
            )
            .with_search_dirs(vec![self.path().to_path_buf()])
    }

    /// PEM bundle with a fresh self-signed certificate and its key
    pub fn keystore(&self) -> PathBuf {
        let rcgen::CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let mut bundle = cert.pem();
        bundle.push_str(&signing_key.serialize_pem());
        self.write("keystore.pem", &bundle)
    }

    /// PKCS#12 store holding one key entry under `alias`
    pub fn pkcs12_keystore(&self, password: &str, alias: &str) -> PathBuf {
        let rcgen::CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        let certificate = p12_keystore::Certificate::from_der(cert.der().as_ref()).unwrap();
        let entry = p12_keystore::PrivateKeyChain::new(
            signing_key.serialize_der(),
            alias.as_bytes(),
            vec![certificate],
        );

        let mut keystore = p12_keystore::KeyStore::new();
        keystore.add_entry(alias, p12_keystore::KeyStoreEntry::PrivateKeyChain(entry));
        let path = self.path().join("keystore.p12");
        std::fs::write(&path, keystore.writer(password).write().unwrap()).unwrap();
        path
    }
}
