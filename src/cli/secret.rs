//! Forum secret input for the operator CLI.
//!
//! Secrets are held in [`Zeroizing`] buffers so they are wiped once the
//! command that needed them returns.

use std::fs;
use std::path::{Path, PathBuf};
use zeroize::Zeroizing;

/// Where a forum secret is read from
#[derive(Debug)]
pub enum SecretSource {
    /// From --secret-file /path/to/secret (scripts, containers)
    File(PathBuf),
    /// From a masked terminal prompt
    Prompt,
}

/// Pick the secret source from CLI arguments
pub fn determine_secret_source(secret_file: Option<PathBuf>) -> SecretSource {
    match secret_file {
        Some(path) => SecretSource::File(path),
        None => SecretSource::Prompt,
    }
}

/// Read a forum secret.
///
/// File secrets lose their trailing line ending only; interior and leading
/// whitespace is part of the secret.
pub fn read_secret(
    source: SecretSource,
    prompt: Option<&str>,
) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    let secret = match source {
        SecretSource::File(path) => read_secret_file(&path)?,
        SecretSource::Prompt => {
            let prompt_msg = prompt.unwrap_or("Forum secret: ");
            Zeroizing::new(
                rpassword::prompt_password(prompt_msg)
                    .map_err(|e| format!("Failed to read secret from terminal: {}", e))?,
            )
        }
    };

    if secret.is_empty() {
        return Err("Secret cannot be empty".into());
    }

    Ok(secret)
}

fn read_secret_file(path: &Path) -> Result<Zeroizing<String>, Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("Secret file not found: {}", path.display()).into());
    }

    let raw = Zeroizing::new(
        fs::read_to_string(path).map_err(|e| format!("Failed to read secret file: {}", e))?,
    );

    Ok(Zeroizing::new(
        raw.trim_end_matches(&['\n', '\r'][..]).to_string(),
    ))
}
