//! File-backed ledger for one CLI invocation.
//!
//! A session loads the snapshot named by the config and writes it back after
//! a successful operation. Events are held in memory until that write
//! succeeds, so the event log never records an operation that is not on disk.

use super::config::ConcordConfig;
use concord::events::{EventSink, FanoutSink, JsonLinesSink, MemorySink, TracingSink};
use concord::ledger::Ledger;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct Session {
    config: ConcordConfig,
    ledger: Ledger,
    pending: MemorySink,
    sink: Arc<dyn EventSink>,
}

impl Session {
    /// Load config and ledger. Fails if either is missing.
    pub fn open(config_path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let config = ConcordConfig::load(config_path)?;
        let sink = build_sink(&config)?;
        let pending = MemorySink::new();
        let ledger = load_ledger(&config.ledger.path, Arc::new(pending.clone()))?;

        debug!(
            ledger = %config.ledger.path.display(),
            nonce = ledger.nonce(),
            "ledger loaded"
        );
        Ok(Self {
            config,
            ledger,
            pending,
            sink,
        })
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Persist the ledger snapshot, then publish the events it commits.
    /// On a failed write the pending events are discarded unpublished.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let saved = save_ledger(&self.config.ledger.path, &self.ledger);
        let events = self.pending.drain();
        saved?;

        for event in &events {
            self.sink.publish(event);
        }
        debug!(events = events.len(), "events published");
        Ok(())
    }
}

/// Tracing plus the optional JSON-lines event log.
pub fn build_sink(config: &ConcordConfig) -> Result<Arc<dyn EventSink>, Box<dyn std::error::Error>> {
    let mut fanout = FanoutSink::new().with(Arc::new(TracingSink));

    if let Some(log_path) = &config.events.log_path {
        if let Some(parent) = log_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create event log directory: {}", e))?;
        }
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map_err(|e| {
                format!(
                    "Failed to open event log '{}': {}",
                    log_path.display(),
                    e
                )
            })?;
        fanout = fanout.with(Arc::new(JsonLinesSink::new(file)));
    }

    Ok(Arc::new(fanout))
}

pub fn load_ledger(
    path: &Path,
    sink: Arc<dyn EventSink>,
) -> Result<Ledger, Box<dyn std::error::Error>> {
    let bytes = fs::read(path).map_err(|e| {
        format!(
            "Failed to read ledger '{}': {} (run `concord init` first)",
            path.display(),
            e
        )
    })?;

    let ledger = Ledger::from_snapshot(&bytes, sink)
        .map_err(|e| format!("Failed to load ledger '{}': {}", path.display(), e))?;

    Ok(ledger)
}

/// Write the snapshot via a temp file and rename, so a crash never leaves a
/// truncated ledger.
pub fn save_ledger(path: &Path, ledger: &Ledger) -> Result<(), Box<dyn std::error::Error>> {
    let bytes = ledger
        .to_snapshot()
        .map_err(|e| format!("Failed to encode ledger: {}", e))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create ledger directory: {}", e))?;
    }

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes)
        .map_err(|e| format!("Failed to write ledger '{}': {}", tmp.display(), e))?;
    fs::rename(&tmp, path)
        .map_err(|e| format!("Failed to replace ledger '{}': {}", path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use concord::identity::Address;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, with_event_log: bool) -> std::path::PathBuf {
        let mut config = ConcordConfig::new(dir.path().join("ledger.cbor"));
        if with_event_log {
            config.events.log_path = Some(dir.path().join("events.jsonl"));
        }
        let config_path = dir.path().join("config.toml");
        config.save(&config_path).unwrap();
        save_ledger(&config.ledger.path, &Ledger::default()).unwrap();
        config_path
    }

    #[test]
    fn test_open_mutate_save_reopen() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, false);

        let mut session = Session::open(&config_path).unwrap();
        let forum_id = session
            .ledger_mut()
            .create_forum(Address::from_label("alice"), "Alpha", "", b"pw", 1)
            .unwrap();
        session.save().unwrap();

        let reopened = Session::open(&config_path).unwrap();
        assert_eq!(reopened.ledger().forum(forum_id).unwrap().name(), "Alpha");
        assert!(!dir.path().join("ledger.tmp").exists());
    }

    #[test]
    fn test_events_appended_as_json_lines() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, true);

        let mut session = Session::open(&config_path).unwrap();
        session
            .ledger_mut()
            .create_forum(Address::from_label("alice"), "Alpha", "", b"pw", 1)
            .unwrap();
        let log_path = dir.path().join("events.jsonl");
        assert_eq!(fs::read_to_string(&log_path).unwrap(), "");

        session.save().unwrap();

        let log = fs::read_to_string(&log_path).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(lines.len(), 1);
        let value: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(value["type"], "ForumCreated");
    }

    #[test]
    fn test_failed_save_publishes_nothing() {
        let dir = TempDir::new().unwrap();
        let config_path = write_config(&dir, true);
        // A directory where the temp snapshot goes makes the write fail.
        fs::create_dir(dir.path().join("ledger.tmp")).unwrap();

        let mut session = Session::open(&config_path).unwrap();
        session
            .ledger_mut()
            .create_forum(Address::from_label("alice"), "Alpha", "", b"pw", 1)
            .unwrap();

        assert!(session.save().is_err());
        assert_eq!(
            fs::read_to_string(dir.path().join("events.jsonl")).unwrap(),
            ""
        );
        let reopened = Session::open(&config_path).unwrap();
        assert!(reopened.ledger().forums().next().is_none());
    }

    #[test]
    fn test_missing_ledger_mentions_init() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.toml");
        ConcordConfig::new(dir.path().join("absent.cbor"))
            .save(&config_path)
            .unwrap();

        let err = Session::open(&config_path).err().unwrap();
        assert!(err.to_string().contains("concord init"));
    }
}
