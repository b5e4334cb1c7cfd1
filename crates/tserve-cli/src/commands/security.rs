//! URL allowlist and TLS checks

use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing::debug;
use tserve_config::{ConfigManager, TlsSource};

/// Exit status 0 when the URL may be fetched, 1 otherwise
pub fn check_url(manager: &ConfigManager, url: &str) -> Result<ExitCode> {
    let allowlist = manager.url_allowlist();
    debug!("Checking {} against {:?}", url, allowlist.patterns());

    if let Some(error) = allowlist.parse_error() {
        eprintln!("allowed_urls is invalid ({error}); every URL is refused");
    }

    if manager.is_url_allowed(url) {
        println!("allowed: {url}");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("refused: {url}");
        Ok(ExitCode::FAILURE)
    }
}

pub fn tls(manager: &ConfigManager) -> Result<ExitCode> {
    let ctx = manager
        .tls_context()
        .context("failed to build TLS context")?;

    match ctx.source() {
        TlsSource::PemFiles {
            certificate,
            private_key,
        } => println!(
            "Source: certificate {} with key {}",
            certificate.display(),
            private_key.display()
        ),
        TlsSource::Keystore(path) => println!("Source: PEM keystore {}", path.display()),
        TlsSource::Pkcs12 { path, alias } => println!(
            "Source: PKCS12 keystore {} (alias {})",
            path.display(),
            alias.as_deref().unwrap_or("first key entry")
        ),
        TlsSource::SelfSigned => println!("Source: self-signed (no keystore configured)"),
    }
    println!("Certificates in chain: {}", ctx.certificate_chain().len());

    Ok(ExitCode::SUCCESS)
}
