use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde_json::Value;

use superagent_types::{Checkpoint, CheckpointId};

use crate::error::ExecutorError;

/// Directory and version-control names excluded from snapshots, matching
/// spec §4.4 ("excluding ignored paths such as version-control and cache
/// directories").
const IGNORED_DIR_NAMES: &[&str] = &[".git", "target", "node_modules", ".cache", "__pycache__"];

/// Copy-based filesystem snapshot backend (spec §9 Open Question: "An
/// implementer may substitute a true content-addressed or COW snapshot so
/// long as the rollback invariant in §8.3 holds"). Grounded on the shape
/// of the teacher's `SnapshotBackend` trait (`agent/src/snapshot/
/// backend.rs`) -- `track`/`restore` -- but backed by a plain recursive
/// copy under a temp root instead of a git commit, since git is not
/// guaranteed present in the execution sandbox.
pub struct SnapshotManager {
    worktree: PathBuf,
    enabled: bool,
    temp_root: PathBuf,
    snapshots: Mutex<HashMap<CheckpointId, PathBuf>>,
}

impl SnapshotManager {
    pub fn new(worktree: impl Into<PathBuf>, enabled: bool) -> Self {
        let worktree = worktree.into();
        Self {
            temp_root: std::env::temp_dir().join("superagent-snapshots"),
            worktree,
            enabled,
            snapshots: Mutex::new(HashMap::new()),
        }
    }

    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// Captures a checkpoint: the current environment snapshot, and, if
    /// filesystem snapshots are enabled, a copy of the worktree excluding
    /// ignored paths (spec §4.4 Phase 1 / "before every call except the
    /// first").
    pub async fn checkpoint(&self) -> Result<Checkpoint, ExecutorError> {
        let checkpoint_id = CheckpointId::generate();
        let env_snapshot: HashMap<String, String> = std::env::vars().collect();

        let filesystem_snapshot_ref = if self.enabled {
            let dest = self.temp_root.join(checkpoint_id.as_str());
            let worktree = self.worktree.clone();
            let dest_for_copy = dest.clone();
            tokio::task::spawn_blocking(move || copy_tree(&worktree, &dest_for_copy))
                .await
                .map_err(|e| ExecutorError::Snapshot(e.to_string()))??;
            self.snapshots.lock().insert(checkpoint_id.clone(), dest.clone());
            Some(dest.display().to_string())
        } else {
            None
        };

        Ok(Checkpoint {
            checkpoint_id,
            timestamp: time::OffsetDateTime::now_utc().unix_timestamp(),
            filesystem_snapshot_ref,
            env_snapshot,
            metadata: HashMap::<String, Value>::new(),
        })
    }

    /// Restores the worktree to exactly the state captured by `checkpoint`
    /// (spec §8 property 3: "the filesystem state after rollback is
    /// byte-identical to the state captured in the initial checkpoint").
    /// Removes the current tree contents (excluding ignored paths) before
    /// copying the snapshot back, so files created after the checkpoint do
    /// not survive rollback.
    pub async fn restore(&self, checkpoint: &Checkpoint) -> Result<(), ExecutorError> {
        let Some(snapshot_ref) = &checkpoint.filesystem_snapshot_ref else {
            return Ok(());
        };
        let snapshot_dir = PathBuf::from(snapshot_ref);
        let worktree = self.worktree.clone();
        tokio::task::spawn_blocking(move || {
            clear_tree(&worktree)?;
            copy_tree(&snapshot_dir, &worktree)
        })
        .await
        .map_err(|e| ExecutorError::Snapshot(e.to_string()))??;
        Ok(())
    }

    /// Discards the temp copy backing `checkpoint_id` without touching the
    /// worktree (spec §4.4 "Commit ... discard all snapshots").
    pub fn discard(&self, checkpoint_id: &CheckpointId) {
        if let Some(dir) = self.snapshots.lock().remove(checkpoint_id) {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    pub fn discard_all(&self, checkpoint_ids: &[CheckpointId]) {
        for id in checkpoint_ids {
            self.discard(id);
        }
    }
}

fn is_ignored(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| IGNORED_DIR_NAMES.contains(&name))
        .unwrap_or(false)
}

fn copy_tree(src: &Path, dst: &Path) -> Result<(), ExecutorError> {
    std::fs::create_dir_all(dst).map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
    if !src.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(src).map_err(|e| ExecutorError::Snapshot(e.to_string()))? {
        let entry = entry.map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        let path = entry.path();
        if is_ignored(&path) {
            continue;
        }
        let dest_path = dst.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        if file_type.is_dir() {
            copy_tree(&path, &dest_path)?;
        } else if file_type.is_file() {
            std::fs::copy(&path, &dest_path).map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        }
    }
    Ok(())
}

/// Removes everything under `root` except ignored directories, in
/// preparation for restoring a snapshot over it.
fn clear_tree(root: &Path) -> Result<(), ExecutorError> {
    if !root.exists() {
        return Ok(());
    }
    for entry in std::fs::read_dir(root).map_err(|e| ExecutorError::Snapshot(e.to_string()))? {
        let entry = entry.map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        let path = entry.path();
        if is_ignored(&path) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        if file_type.is_dir() {
            std::fs::remove_dir_all(&path).map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        } else {
            std::fs::remove_file(&path).map_err(|e| ExecutorError::Snapshot(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn checkpoint_and_restore_round_trips_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("a.txt");
        std::fs::write(&file_path, "one").unwrap();

        let manager = SnapshotManager::new(dir.path(), true);
        let checkpoint = manager.checkpoint().await.unwrap();

        std::fs::write(&file_path, "two").unwrap();
        std::fs::write(dir.path().join("new.txt"), "unexpected").unwrap();
        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "two");

        manager.restore(&checkpoint).await.unwrap();

        assert_eq!(std::fs::read_to_string(&file_path).unwrap(), "one");
        assert!(!dir.path().join("new.txt").exists());
        manager.discard(&checkpoint.checkpoint_id);
    }

    #[tokio::test]
    async fn disabled_snapshots_skip_filesystem_capture() {
        let dir = tempfile::tempdir().unwrap();
        let manager = SnapshotManager::new(dir.path(), false);
        let checkpoint = manager.checkpoint().await.unwrap();
        assert!(checkpoint.filesystem_snapshot_ref.is_none());
    }
}
