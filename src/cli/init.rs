//! `concord init`: default config plus an empty ledger.

use super::config::{default_ledger_path, ConcordConfig};
use super::session::save_ledger;
use concord::ledger::Ledger;
use std::path::{Path, PathBuf};

pub fn execute(
    config_path: &Path,
    ledger_path: Option<PathBuf>,
    force: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger_path = if config_path.exists() {
        let config = ConcordConfig::load(config_path)?;
        println!("Using existing config: {}", config_path.display());
        config.ledger.path
    } else {
        let ledger_path = ledger_path.unwrap_or_else(|| default_ledger_path(config_path));
        ConcordConfig::create_default(config_path, &ledger_path)?;
        println!("Wrote config: {}", config_path.display());
        ledger_path
    };

    if ledger_path.exists() && !force {
        return Err(format!(
            "Ledger already exists at '{}' (use --force to replace it)",
            ledger_path.display()
        )
        .into());
    }

    save_ledger(&ledger_path, &Ledger::default())?;
    println!("Wrote empty ledger: {}", ledger_path.display());

    Ok(())
}
