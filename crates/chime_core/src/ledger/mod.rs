//! Firing ledger: minute-scoped at-most-once claims.
//!
//! # Responsibility
//! - Record which (bell, minute-slot) pairs have already fired.
//! - Provide the single cross-process serialization point of the engine.
//!
//! # Invariants
//! - `claim` is atomic across processes: of N concurrent claimants for the
//!   same (bell, slot), at most one observes `true`.
//! - A marker for minute M never suppresses the same bell at minute M+1.
//! - Markers outlive the claiming process; sweep is hygiene only and
//!   correctness never depends on it.

use crate::model::bell::BellId;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

static MARKER_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^bell_(\d+)_(\d{8}_\d{4})\.fired$").expect("valid marker regex"));

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Ledger storage failure. Claim races are not errors and surface as
/// `Ok(false)`.
#[derive(Debug)]
pub enum LedgerError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl Display for LedgerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "ledger I/O failure at `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for LedgerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Exclusive-claim contract for fired-bell markers.
///
/// Any implementation with atomic create-if-absent semantics conforms:
/// exclusive file creation, a database unique constraint, a distributed
/// lock. The engine only relies on the contract.
pub trait FiringLedger {
    /// Returns whether the marker for `(bell_id, minute_slot)` exists.
    fn has_fired(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool>;

    /// Atomically creates the marker if absent.
    ///
    /// Returns `true` for the first claimant, `false` when the marker was
    /// already present.
    fn claim(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool>;

    /// Removes markers whose slot sorts strictly before `current_slot`.
    ///
    /// Returns the number of markers removed.
    fn sweep_expired(&self, current_slot: &str) -> LedgerResult<usize>;
}

impl<T: FiringLedger + ?Sized> FiringLedger for &T {
    fn has_fired(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool> {
        (**self).has_fired(bell_id, minute_slot)
    }

    fn claim(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool> {
        (**self).claim(bell_id, minute_slot)
    }

    fn sweep_expired(&self, current_slot: &str) -> LedgerResult<usize> {
        (**self).sweep_expired(current_slot)
    }
}

/// Marker-file ledger: one `bell_<id>_<slot>.fired` file per claim.
///
/// The claim primitive is `O_CREAT|O_EXCL` file creation, which the
/// filesystem serializes across processes.
pub struct FileFiringLedger {
    dir: PathBuf,
}

impl FileFiringLedger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn marker_path(&self, bell_id: BellId, minute_slot: &str) -> PathBuf {
        self.dir.join(format!("bell_{bell_id}_{minute_slot}.fired"))
    }
}

impl FiringLedger for FileFiringLedger {
    fn has_fired(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool> {
        let path = self.marker_path(bell_id, minute_slot);
        match std::fs::metadata(&path) {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(LedgerError::Io { path, source: err }),
        }
    }

    fn claim(&self, bell_id: BellId, minute_slot: &str) -> LedgerResult<bool> {
        std::fs::create_dir_all(&self.dir).map_err(|err| LedgerError::Io {
            path: self.dir.clone(),
            source: err,
        })?;

        let path = self.marker_path(bell_id, minute_slot);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                // Marker existence is the claim; the content is best-effort
                // debugging aid only.
                let _ = file.write_all(b"fired\n");
                Ok(true)
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(LedgerError::Io { path, source: err }),
        }
    }

    fn sweep_expired(&self, current_slot: &str) -> LedgerResult<usize> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(0),
            Err(err) => {
                return Err(LedgerError::Io {
                    path: self.dir.clone(),
                    source: err,
                });
            }
        };

        let mut removed = 0;
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(_) => continue,
            };
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            let Some(captures) = MARKER_NAME_RE.captures(name) else {
                continue;
            };
            // Slot keys are zero-padded, so string order is time order.
            if &captures[2] < current_slot {
                match std::fs::remove_file(entry.path()) {
                    Ok(()) => removed += 1,
                    // A concurrent sweep already took it; nothing lost.
                    Err(err) if err.kind() == ErrorKind::NotFound => {}
                    Err(err) => {
                        return Err(LedgerError::Io {
                            path: entry.path(),
                            source: err,
                        });
                    }
                }
            }
        }

        Ok(removed)
    }
}
