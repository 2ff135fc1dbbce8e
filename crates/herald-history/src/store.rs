use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;
use herald_core::types::CampaignResult;
use tracing::{debug, info, warn};

use crate::error::{HistoryError, Result};
use crate::state::{HistoryBucket, HistoryState};

/// Persistence seam for campaign history.
///
/// `load` never fails: a missing or unreadable history degrades to an empty
/// state. `record` is the read-modify-write cycle and must be serialized per
/// store so concurrent campaigns never lose each other's results.
pub trait HistoryStore: Send + Sync {
    /// Read the current state, or an empty one if nothing usable exists.
    fn load(&self) -> HistoryState;

    /// Persist `state` in full, replacing whatever was there.
    fn save(&self, state: &HistoryState) -> Result<()>;

    /// load → merge → save under the store's writer lock.
    ///
    /// Returns the merged state that was written.
    fn record(&self, result: &CampaignResult, bucket: HistoryBucket) -> Result<HistoryState>;

    /// Human-readable location for log and CLI output.
    fn describe(&self) -> String;
}

/// History kept as one JSON document on disk.
///
/// Writes go to `<path>.tmp` first and are renamed over the target, so a
/// crash mid-write leaves either the old or the new file, never a torn one.
/// A file that no longer parses is renamed to `<path>.corrupt-<ts>` on load.
pub struct JsonFileStore {
    path: PathBuf,
    /// Held across load+merge+save; one writer per store instance.
    writer: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    /// Move an unparseable history file to `<path>.corrupt-<ts>` so the next
    /// save does not destroy it. Returns where it went.
    fn quarantine(&self) -> Option<PathBuf> {
        let mut aside = self.path.clone().into_os_string();
        aside.push(format!(".corrupt-{}", Utc::now().format("%Y%m%dT%H%M%S%.3fZ")));
        let aside = PathBuf::from(aside);
        match std::fs::rename(&self.path, &aside) {
            Ok(()) => Some(aside),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "could not move corrupt history aside");
                None
            }
        }
    }

    fn io_err(&self, path: &Path, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ()> {
        // A panic while holding the lock leaves no partial state behind
        // (the file is replaced atomically), so poisoning is safe to ignore.
        self.writer.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for JsonFileStore {
    fn load(&self) -> HistoryState {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no history file yet, starting fresh");
                return HistoryState::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history file unreadable, starting fresh");
                return HistoryState::default();
            }
        };

        if raw.trim().is_empty() {
            warn!(path = %self.path.display(), "history file is empty, starting fresh");
            return HistoryState::default();
        }

        match serde_json::from_str::<HistoryState>(&raw) {
            Ok(mut state) => {
                state.recount();
                state
            }
            Err(e) => {
                let moved_to = self.quarantine();
                warn!(
                    path = %self.path.display(),
                    moved_to = ?moved_to,
                    error = %e,
                    "history file corrupt, starting fresh"
                );
                HistoryState::default()
            }
        }
    }

    fn save(&self, state: &HistoryState) -> Result<()> {
        let body = serde_json::to_string_pretty(state)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_err(parent, e))?;
        }

        let tmp = self.tmp_path();
        std::fs::write(&tmp, body).map_err(|e| self.io_err(&tmp, e))?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(self.io_err(&self.path, e));
        }

        debug!(path = %self.path.display(), "history saved");
        Ok(())
    }

    fn record(&self, result: &CampaignResult, bucket: HistoryBucket) -> Result<HistoryState> {
        let _guard = self.lock();
        let merged = self.load().merge(result.clone(), bucket);
        self.save(&merged)?;
        info!(
            path = %self.path.display(),
            campaign = %result.campaign_id,
            bucket = %bucket,
            total = merged.total(bucket),
            "campaign recorded in history"
        );
        Ok(merged)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// History that lives only as long as the process. Nothing touches disk.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<HistoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: HistoryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HistoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl HistoryStore for InMemoryStore {
    fn load(&self) -> HistoryState {
        self.lock().clone()
    }

    fn save(&self, state: &HistoryState) -> Result<()> {
        *self.lock() = state.clone();
        Ok(())
    }

    fn record(&self, result: &CampaignResult, bucket: HistoryBucket) -> Result<HistoryState> {
        let mut guard = self.lock();
        let merged = std::mem::take(&mut *guard).merge(result.clone(), bucket);
        *guard = merged.clone();
        Ok(merged)
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::tests::result;
    use herald_core::types::CampaignKind;
    use std::sync::Arc;

    fn store_in(dir: &tempfile::TempDir) -> JsonFileStore {
        JsonFileStore::new(dir.path().join("history.json"))
    }

    #[test]
    fn missing_file_loads_empty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let state = store_in(&dir).load();
        assert!(state.is_empty());
        assert_eq!(state.total_broadcasts, 0);
    }

    #[test]
    fn corrupt_file_loads_empty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "{ this is not json").unwrap();
        let state = store.load();
        assert_eq!(state, HistoryState::default());
    }

    #[test]
    fn corrupt_file_is_kept_aside_when_history_is_rewritten() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let damaged = r#"{"broadcastHistory":[ TRUNCATED"#;
        std::fs::write(store.path(), damaged).unwrap();

        let state = store
            .record(&result(CampaignKind::Progress, 1, 1), HistoryBucket::Broadcast)
            .unwrap();
        assert_eq!(state.total_broadcasts, 1);
        assert_eq!(store.load().total_broadcasts, 1);

        let aside: Vec<PathBuf> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("history.json.corrupt-"))
            })
            .collect();
        assert_eq!(aside.len(), 1);
        assert_eq!(std::fs::read_to_string(&aside[0]).unwrap(), damaged);
    }

    #[test]
    fn zero_byte_file_loads_empty_state() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        std::fs::write(store.path(), "").unwrap();
        assert!(store.load().is_empty());
    }

    #[test]
    fn round_trips_preserve_every_result() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut ids = Vec::new();

        for i in 0..5 {
            let r = result(CampaignKind::Progress, i % 3, 4);
            ids.push(r.campaign_id.clone());
            let state = store.load().merge(r, HistoryBucket::Broadcast);
            store.save(&state).unwrap();
        }
        store
            .record(&result(CampaignKind::Invitation, 2, 4), HistoryBucket::Invitation)
            .unwrap();

        let reloaded = store.load();
        let stored: Vec<&str> = reloaded
            .broadcast_history
            .iter()
            .map(|r| r.campaign_id.as_str())
            .collect();
        assert_eq!(stored, ids.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(reloaded.total_broadcasts, 5);
        assert_eq!(reloaded.total_invitations, 1);
        assert_eq!(reloaded.invitation_history.len(), 1);
    }

    #[test]
    fn save_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        store.save(&HistoryState::default()).unwrap();
        assert!(store.path().exists());
        assert!(!store.tmp_path().exists());
    }

    #[test]
    fn save_creates_missing_parent_dirs() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = JsonFileStore::new(dir.path().join("a/b/history.json"));
        store.save(&HistoryState::default()).unwrap();
        assert!(store.path().exists());
    }

    #[test]
    fn save_into_unwritable_location_reports_io_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        // A regular file where a directory is expected: fails even as root.
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let store = JsonFileStore::new(blocker.join("history.json"));

        let err = store
            .record(&result(CampaignKind::Progress, 1, 1), HistoryBucket::Broadcast)
            .unwrap_err();
        assert!(matches!(err, HistoryError::Io { .. }));
    }

    #[test]
    fn load_repairs_inconsistent_counters() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = store_in(&dir);
        let mut state =
            HistoryState::default().merge(result(CampaignKind::Lead, 1, 2), HistoryBucket::Lead);
        state.total_leads = 42;
        std::fs::write(store.path(), serde_json::to_string(&state).unwrap()).unwrap();
        assert_eq!(store.load().total_leads, 1);
    }

    #[test]
    fn concurrent_records_are_not_lost() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = Arc::new(store_in(&dir));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .record(&result(CampaignKind::Progress, 1, 2), HistoryBucket::Broadcast)
                        .unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(store.load().total_broadcasts, 8);
    }

    #[test]
    fn in_memory_store_accumulates() {
        let store = InMemoryStore::new();
        store
            .record(&result(CampaignKind::Progress, 1, 1), HistoryBucket::Broadcast)
            .unwrap();
        let state = store
            .record(&result(CampaignKind::Lead, 0, 1), HistoryBucket::Lead)
            .unwrap();
        assert_eq!(state.total_broadcasts, 1);
        assert_eq!(state.total_leads, 1);
        assert_eq!(store.load(), state);
        assert_eq!(store.describe(), "in-memory");
    }
}
