//! Checkpoint Store (spec.md §4.7): atomic per-session JSON snapshots and
//! resume-from-remainder loading.
//!
//! Grounded on the write-temp-then-rename pattern in
//! `other_examples/da088daf_andrey-moor-plan-forge__src-orchestrator-orchestration_state.rs.rs`'s
//! `OrchestrationState::save()`/`load()`, extended with the `.bak` copy
//! spec.md §4.7 asks for and a directory-scan `list()` for the checkpoint
//! browser endpoint.

use crate::core::types::{Checkpoint, ResearchPlan};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub struct CheckpointStore {
    root: PathBuf,
}

impl CheckpointStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn session_dir(&self, session_id: &str) -> PathBuf {
        self.root.join(session_id)
    }

    /// Write `checkpoint.json` atomically: serialize, write to `.tmp`,
    /// rename over the live file, then best-effort copy to `.bak`. Never
    /// leaves a partial JSON file on disk — a crash mid-write leaves
    /// either the old file or nothing, never a half-written one.
    pub fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let dir = self.session_dir(&checkpoint.session_id);
        std::fs::create_dir_all(&dir).context("failed to create session checkpoint directory")?;

        let live = dir.join("checkpoint.json");
        let tmp = dir.join("checkpoint.json.tmp");
        let bak = dir.join("checkpoint.json.bak");

        let json = serde_json::to_string_pretty(checkpoint).context("failed to serialize checkpoint")?;
        std::fs::write(&tmp, &json).context("failed to write temp checkpoint file")?;
        std::fs::rename(&tmp, &live).context("failed to rename checkpoint file into place")?;

        if let Err(e) = std::fs::copy(&live, &bak) {
            tracing::warn!("failed to write checkpoint backup copy: {}", e);
        }

        Ok(())
    }

    pub fn load(&self, session_id: &str) -> Result<Option<Checkpoint>> {
        let live = self.session_dir(session_id).join("checkpoint.json");
        if !live.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&live).context("failed to read checkpoint file")?;
        let checkpoint: Checkpoint = serde_json::from_str(&json).context("failed to parse checkpoint file")?;
        Ok(Some(checkpoint))
    }

    /// Scan the root for session subdirectories, parse each
    /// `checkpoint.json`, and return them sorted by `last_modified`
    /// descending. Corrupt entries are logged and skipped, not fatal.
    pub fn list(&self) -> Vec<Checkpoint> {
        let mut out = Vec::new();
        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return out;
        };
        for entry in entries.flatten() {
            if !entry.path().is_dir() {
                continue;
            }
            let session_id = entry.file_name().to_string_lossy().to_string();
            match self.load(&session_id) {
                Ok(Some(checkpoint)) => out.push(checkpoint),
                Ok(None) => {}
                Err(e) => tracing::warn!("skipping unreadable checkpoint for {}: {}", session_id, e),
            }
        }
        out.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        out
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Compute `remaining_points = plan - completed` for resumption
/// (spec.md §4.7). Flat-mode plans only; academic resumption scopes
/// remainder per-area in the orchestrator itself.
pub fn remaining_points(plan: &ResearchPlan, completed: &[String]) -> Vec<String> {
    plan.points
        .iter()
        .filter(|p| !completed.contains(p))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ResearchPlan;

    fn sample_checkpoint(session_id: &str) -> Checkpoint {
        Checkpoint {
            session_id: session_id.to_string(),
            user_query: "what is rust".to_string(),
            research_plan: ResearchPlan { points: vec!["p1".into(), "p2".into()], areas: vec![], plan_version: 1 },
            completed_dossiers: vec![],
            accumulated_learnings: vec![],
            remaining_points: vec!["p1".into(), "p2".into()],
            status: "started".to_string(),
            last_modified: chrono::Utc::now(),
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = std::env::temp_dir().join(format!("veritas-ckpt-test-{}", std::process::id()));
        let store = CheckpointStore::new(dir.clone());
        let checkpoint = sample_checkpoint("abc123");
        store.save(&checkpoint).unwrap();

        let loaded = store.load("abc123").unwrap().unwrap();
        assert_eq!(loaded.session_id, "abc123");
        assert_eq!(loaded.remaining_points.len(), 2);

        assert!(dir.join("abc123").join("checkpoint.json.bak").exists());
        assert!(!dir.join("abc123").join("checkpoint.json.tmp").exists());

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_session_loads_as_none() {
        let dir = std::env::temp_dir().join(format!("veritas-ckpt-missing-{}", std::process::id()));
        let store = CheckpointStore::new(dir.clone());
        assert!(store.load("nope").unwrap().is_none());
    }

    #[test]
    fn remaining_points_excludes_completed() {
        let plan = ResearchPlan { points: vec!["a".into(), "b".into(), "c".into()], areas: vec![], plan_version: 1 };
        let remaining = remaining_points(&plan, &["a".to_string()]);
        assert_eq!(remaining, vec!["b".to_string(), "c".to_string()]);
    }
}
