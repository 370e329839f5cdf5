// SPDX-FileCopyrightText: 2026 Coachbot Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JSON ledger files with atomic replacement and per-file write locks.
//!
//! Reads never fail: a missing file is an empty ledger, and an unreadable or
//! corrupt file is logged and treated as empty. Entries that do not parse are
//! left out of the loaded ledger but written back untouched by
//! [`LedgerStore::update`]. Writes go through a temp file
//! in the same directory followed by a rename, so a reader never observes a
//! half-written ledger. Read-modify-write cycles on the same path are
//! serialized within the process by [`LedgerStore::update`].

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use tracing::{debug, warn};

use coachbot_core::{CoachError, JobScope, LedgerKind};

use crate::model::{LedgerEntry, LedgerFile};
use crate::path::ledger_path;

/// Result of reading a ledger file, keeping "absent" apart from "broken".
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(LedgerFile),
    Missing,
    Unavailable(CoachError),
}

impl LoadOutcome {
    /// The ledger contents, empty unless the file was read successfully.
    pub fn into_ledger(self) -> LedgerFile {
        match self {
            LoadOutcome::Loaded(ledger) => ledger,
            LoadOutcome::Missing | LoadOutcome::Unavailable(_) => LedgerFile::new(),
        }
    }
}

/// Handle on the ledger files under one state directory.
#[derive(Debug)]
pub struct LedgerStore {
    state_dir: PathBuf,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl LedgerStore {
    pub fn new(state_dir: impl Into<PathBuf>) -> Self {
        Self {
            state_dir: state_dir.into(),
            locks: DashMap::new(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    /// The file holding `kind` votes for `scope`.
    pub fn path_for(&self, kind: LedgerKind, scope: &JobScope) -> PathBuf {
        ledger_path(&self.state_dir, kind, scope)
    }

    /// Read a ledger, reporting whether it was present and parseable.
    ///
    /// Entries that are not objects of the expected shape are skipped with a
    /// warning rather than failing the whole file.
    pub fn try_load(&self, path: &Path) -> LoadOutcome {
        match read_raw(path) {
            Ok(Some(raw)) => LoadOutcome::Loaded(parse_entries(path, raw).0),
            Ok(None) => LoadOutcome::Missing,
            Err(e) => LoadOutcome::Unavailable(e),
        }
    }

    /// Read a ledger, treating anything but a readable file as empty.
    pub fn load(&self, path: &Path) -> LedgerFile {
        match self.try_load(path) {
            LoadOutcome::Unavailable(e) => {
                warn!(path = %path.display(), error = %e, "ledger unreadable, treating as empty");
                LedgerFile::new()
            }
            outcome => outcome.into_ledger(),
        }
    }

    /// Replace the ledger file atomically.
    ///
    /// Does not take the per-path lock; concurrent callers should go through
    /// [`LedgerStore::update`].
    pub fn save(&self, path: &Path, ledger: &LedgerFile) -> Result<(), CoachError> {
        let bytes = serde_json::to_vec_pretty(ledger).map_err(CoachError::storage)?;
        write_atomic(path, &bytes)?;
        debug!(path = %path.display(), entries = ledger.len(), "ledger saved");
        Ok(())
    }

    /// Load, mutate, and save one ledger while holding its in-process lock.
    ///
    /// Entries skipped on load are saved back as they were read, unless the
    /// mutation wrote an entry under the same key.
    pub fn update<T>(
        &self,
        path: &Path,
        mutate: impl FnOnce(&mut LedgerFile) -> T,
    ) -> Result<T, CoachError> {
        let lock = self.lock_for(path);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let (mut ledger, unparsed) = match read_raw(path) {
            Ok(Some(raw)) => parse_entries(path, raw),
            Ok(None) => (LedgerFile::new(), RawEntries::new()),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ledger unreadable, treating as empty");
                (LedgerFile::new(), RawEntries::new())
            }
        };
        let result = mutate(&mut ledger);

        if unparsed.is_empty() {
            self.save(path, &ledger)?;
        } else {
            let mut merged = unparsed;
            for (key, entry) in &ledger {
                let value = serde_json::to_value(entry).map_err(CoachError::storage)?;
                merged.insert(key.clone(), value);
            }
            let bytes = serde_json::to_vec_pretty(&merged).map_err(CoachError::storage)?;
            write_atomic(path, &bytes)?;
            debug!(path = %path.display(), entries = merged.len(), "ledger saved");
        }
        Ok(result)
    }

    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks.entry(path.to_path_buf()).or_default().clone()
    }
}

type RawEntries = BTreeMap<String, serde_json::Value>;

/// Raw entries of a ledger file; `None` when the file does not exist.
fn read_raw(path: &Path) -> Result<Option<RawEntries>, CoachError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CoachError::storage(e)),
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(CoachError::storage)
}

/// Split raw entries into parsed ones and the ones that did not fit the model.
fn parse_entries(path: &Path, raw: RawEntries) -> (LedgerFile, RawEntries) {
    let mut ledger = LedgerFile::new();
    let mut unparsed = RawEntries::new();
    for (key, value) in raw {
        match serde_json::from_value::<LedgerEntry>(value.clone()) {
            Ok(entry) => {
                ledger.insert(key, entry);
            }
            Err(e) => {
                warn!(path = %path.display(), key = %key, error = %e, "skipping malformed ledger entry");
                unparsed.insert(key, value);
            }
        }
    }
    (ledger, unparsed)
}

/// Write `bytes` to a uniquely named sibling temp file, then rename it over `path`.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), CoachError> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(CoachError::storage)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    let tmp = dir.join(format!(".{file_name}.{}.tmp", uuid::Uuid::new_v4()));

    let written = File::create(&tmp)
        .and_then(|mut file| {
            file.write_all(bytes)?;
            file.sync_all()
        })
        .and_then(|()| fs::rename(&tmp, path));

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp);
        return Err(CoachError::storage(e));
    }
    Ok(())
}
