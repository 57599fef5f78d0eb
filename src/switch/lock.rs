// ABOUTME: Lock files that keep switches and fleet state updates single-flight.
// ABOUTME: Uses atomic file creation with lock info stored under <state_dir>/locks/.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::types::EnvironmentPair;

use super::SwitchError;

const LOCKS_DIR: &str = "locks";

/// Scope recorded in the lock guarding the local fleet state file.
pub const STATE_LOCK_SCOPE: &str = "state";

/// Information about who holds a switch lock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Hostname of the machine that holds the lock.
    pub holder: String,
    /// Process ID of the lock holder.
    pub pid: u32,
    /// When the lock was acquired.
    pub started_at: DateTime<Utc>,
    /// Pair being switched, or `state` for the fleet state lock.
    pub pair: String,
}

impl LockInfo {
    /// Create new lock info for the current process.
    pub fn new(pair: &EnvironmentPair) -> Self {
        Self::for_scope(pair.key())
    }

    fn for_scope(scope: String) -> Self {
        Self {
            holder: gethostname::gethostname().to_string_lossy().into_owned(),
            pid: std::process::id(),
            started_at: Utc::now(),
            pair: scope,
        }
    }

    /// Check if this lock is stale (older than 1 hour).
    pub fn is_stale(&self) -> bool {
        let age = Utc::now() - self.started_at;
        age.num_hours() >= 1
    }

    /// Path to the lock file for a pair.
    pub fn lock_path(state_dir: &Path, pair: &EnvironmentPair) -> PathBuf {
        state_dir.join(LOCKS_DIR).join(format!("{}.lock", pair.key()))
    }

    /// Path to the lock guarding the fleet state file.
    pub fn state_lock_path(state_dir: &Path) -> PathBuf {
        state_dir
            .join(LOCKS_DIR)
            .join(format!("{STATE_LOCK_SCOPE}.lock"))
    }
}

/// A held switch lock that releases on drop.
#[derive(Debug)]
pub struct SwitchLock {
    path: PathBuf,
    released: bool,
}

impl SwitchLock {
    /// Acquire the switch lock for `pair`.
    ///
    /// Creation is atomic (create-new), so two processes cannot both win.
    /// Stale locks (>1 hour) and unreadable locks are broken with a warning;
    /// `force` breaks any lock.
    pub fn acquire(
        state_dir: &Path,
        pair: &EnvironmentPair,
        force: bool,
    ) -> Result<Self, SwitchError> {
        Self::acquire_at(LockInfo::lock_path(state_dir, pair), LockInfo::new(pair), force)
    }

    /// Acquire the lock guarding the fleet state file.
    ///
    /// Held by every command from loading the state to saving it, so runs
    /// that overlap cannot overwrite each other's changes.
    pub fn acquire_state(state_dir: &Path, force: bool) -> Result<Self, SwitchError> {
        Self::acquire_at(
            LockInfo::state_lock_path(state_dir),
            LockInfo::for_scope(STATE_LOCK_SCOPE.to_string()),
            force,
        )
    }

    fn acquire_at(path: PathBuf, info: LockInfo, force: bool) -> Result<Self, SwitchError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                SwitchError::lock_error(format!("failed to create lock directory: {e}"))
            })?;
        }

        let lock_json = serde_json::to_string(&info)
            .map_err(|e| SwitchError::lock_error(format!("failed to serialize lock: {e}")))?;

        if Self::try_create(&path, &lock_json)? {
            return Ok(Self {
                path,
                released: false,
            });
        }

        if !Self::should_break(&path, force)? {
            return match Self::read_info(&path) {
                Some(existing) => Err(SwitchError::LockHeld {
                    holder: existing.holder,
                    pid: existing.pid,
                    started_at: existing.started_at,
                }),
                None => Err(SwitchError::lock_error("lock held by another process")),
            };
        }

        tracing::debug!("Removing stale/forced lock at {}", path.display());
        let _ = std::fs::remove_file(&path);

        if !Self::try_create(&path, &lock_json)? {
            return Err(SwitchError::lock_error(
                "lock acquired by another process during break",
            ));
        }

        Ok(Self {
            path,
            released: false,
        })
    }

    /// Returns false if the lock file already exists.
    fn try_create(path: &Path, contents: &str) -> Result<bool, SwitchError> {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                file.write_all(contents.as_bytes())
                    .map_err(|e| SwitchError::lock_error(format!("failed to write lock: {e}")))?;
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(SwitchError::lock_error(format!(
                "failed to acquire lock: {e}"
            ))),
        }
    }

    fn read_info(path: &Path) -> Option<LockInfo> {
        let content = std::fs::read_to_string(path).ok()?;
        serde_json::from_str(&content).ok()
    }

    /// Check if an existing lock should be broken (stale, forced, or corrupted).
    fn should_break(path: &Path, force: bool) -> Result<bool, SwitchError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            // Released between our create attempt and now.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => {
                return Err(SwitchError::lock_error(format!(
                    "failed to read lock info: {e}"
                )));
            }
        };

        match serde_json::from_str::<LockInfo>(&content) {
            Ok(existing) => {
                if force {
                    tracing::warn!(
                        "Breaking lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else if existing.is_stale() {
                    tracing::warn!(
                        "Auto-breaking stale lock held by {} (pid {}) since {}",
                        existing.holder,
                        existing.pid,
                        existing.started_at
                    );
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            Err(_) => {
                tracing::warn!("Lock info corrupted, breaking lock");
                Ok(true)
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Release the lock.
    pub fn release(mut self) -> Result<(), SwitchError> {
        self.released = true;
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SwitchError::lock_error(format!(
                "failed to release lock: {e}"
            ))),
        }
    }
}

impl Drop for SwitchLock {
    fn drop(&mut self) {
        if !self.released {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FleetName;

    fn pair() -> EnvironmentPair {
        EnvironmentPair::new(
            FleetName::new("ci-blue").unwrap(),
            FleetName::new("ci-green").unwrap(),
        )
    }

    #[test]
    fn lock_info_creates_with_current_host_and_pid() {
        let info = LockInfo::new(&pair());

        assert_eq!(info.pair, "ci-blue-ci-green");
        assert_eq!(info.pid, std::process::id());
        assert!(!info.holder.is_empty());
    }

    #[test]
    fn lock_path_uses_state_dir() {
        assert_eq!(
            LockInfo::lock_path(Path::new("/srv/state"), &pair()),
            PathBuf::from("/srv/state/locks/ci-blue-ci-green.lock")
        );
    }

    #[test]
    fn state_lock_lives_next_to_pair_locks() {
        assert_eq!(
            LockInfo::state_lock_path(Path::new("/srv/state")),
            PathBuf::from("/srv/state/locks/state.lock")
        );
    }

    #[test]
    fn fresh_lock_is_not_stale() {
        assert!(!LockInfo::new(&pair()).is_stale());
    }

    #[test]
    fn old_lock_is_stale() {
        let mut info = LockInfo::new(&pair());
        info.started_at = Utc::now() - chrono::Duration::hours(2);
        assert!(info.is_stale());
    }
}
