//! On-disk session store.
//!
//! A game lives in one directory: `game.json` holds the serialized
//! [`Session`], `orders.<faction>` files are the inputs for a turn, and
//! `report.<faction>` / `players.out` are the outputs. Opening the store
//! takes an advisory lock (`game.lock`, created exclusively, removed on
//! drop) so at most one writer ever holds a session; a stale lock from a
//! crashed run must be removed by the operator.
//!
//! Saving is all-or-nothing: the session is written to a temp file and
//! renamed over `game.json`, and the pipeline calls [`SessionStore::save`]
//! exactly once, after the last phase. An aborted turn leaves the previous
//! turn's state untouched.

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::game::session::Session;
use crate::rules::RuleSet;

const SESSION_FILE: &str = "game.json";
const SESSION_TEMP_FILE: &str = "game.json.new";
const LOCK_FILE: &str = "game.lock";

/// Failures at the persistence boundary.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no session found in {0}")]
    Missing(PathBuf),

    #[error("a session already exists in {0}")]
    Exists(PathBuf),

    #[error("session data is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("another process holds the session lock {0}")]
    Locked(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Removes the lock file when the store handle is dropped.
struct LockGuard {
    path: PathBuf,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}

/// Exclusive handle to one game directory.
pub struct SessionStore {
    dir: PathBuf,
    _lock: LockGuard,
}

impl SessionStore {
    /// Opens a game directory, creating it if needed, and acquires the
    /// single-writer lock.
    pub fn open(dir: impl Into<PathBuf>) -> Result<SessionStore, StoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        let lock_path = dir.join(LOCK_FILE);
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(_) => Ok(SessionStore {
                _lock: LockGuard { path: lock_path },
                dir,
            }),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::Locked(lock_path)),
            Err(e) => Err(e.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self) -> PathBuf {
        self.dir.join(SESSION_FILE)
    }

    /// Orders source for a faction, addressed by faction number.
    pub fn orders_path(&self, faction: u32) -> PathBuf {
        self.dir.join(format!("orders.{}", faction))
    }

    /// Report destination for a faction, addressed the same way.
    pub fn report_path(&self, faction: u32) -> PathBuf {
        self.dir.join(format!("report.{}", faction))
    }

    pub fn players_path(&self) -> PathBuf {
        self.dir.join("players.out")
    }

    /// Generates and persists a brand new world. Refuses to clobber an
    /// existing session.
    pub fn create(
        &self,
        name: &str,
        seed: u64,
        rules: &RuleSet,
    ) -> Result<Session, StoreError> {
        if self.session_path().exists() {
            return Err(StoreError::Exists(self.dir.clone()));
        }
        let session = Session::generate(name, seed, rules);
        self.save(&session)?;
        Ok(session)
    }

    pub fn load(&self) -> Result<Session, StoreError> {
        let file = match File::open(self.session_path()) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::Missing(self.dir.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_reader(BufReader::new(file))?;
        Ok(session)
    }

    /// Atomically replaces the persisted session.
    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let temp = self.dir.join(SESSION_TEMP_FILE);
        {
            let file = File::create(&temp)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, session)?;
            writer.flush()?;
        }
        fs::rename(&temp, self.session_path())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RuleSet {
        RuleSet::standard()
    }

    #[test]
    fn create_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let session = store.create("test", 12345, &rules()).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(session, loaded);
    }

    #[test]
    fn load_without_session_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        assert!(matches!(store.load(), Err(StoreError::Missing(_))));
    }

    #[test]
    fn create_refuses_to_clobber() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        store.create("test", 1, &rules()).unwrap();
        assert!(matches!(
            store.create("test", 2, &rules()),
            Err(StoreError::Exists(_))
        ));
    }

    #[test]
    fn corrupt_session_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        fs::write(dir.path().join(SESSION_FILE), b"not json").unwrap();
        assert!(matches!(store.load(), Err(StoreError::Corrupt(_))));
    }

    #[test]
    fn second_opener_is_locked_out() {
        let dir = tempfile::tempdir().unwrap();
        let _store = SessionStore::open(dir.path()).unwrap();
        assert!(matches!(
            SessionStore::open(dir.path()),
            Err(StoreError::Locked(_))
        ));
    }

    #[test]
    fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        {
            let _store = SessionStore::open(dir.path()).unwrap();
        }
        assert!(SessionStore::open(dir.path()).is_ok());
    }

    #[test]
    fn save_replaces_previous_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        let mut session = store.create("test", 7, &rules()).unwrap();
        session.advance_month();
        store.save(&session).unwrap();
        let loaded = store.load().unwrap();
        assert_eq!(loaded.turn, 1);
    }

    #[test]
    fn paths_are_addressed_by_faction() {
        let dir = tempfile::tempdir().unwrap();
        let store = SessionStore::open(dir.path()).unwrap();
        assert!(store.orders_path(3).ends_with("orders.3"));
        assert!(store.report_path(3).ends_with("report.3"));
    }
}
