//! The run loop: guard, bracket, candidates, one file at a time

use super::action::choose_action;
use super::bracket::RunBracket;
use super::error::{FileError, WalkerError};
use super::postprocess::{extract_rewrite, normalize_summary};
use super::prompts::{
    rewrite_instruction, rewrite_messages, summarize_messages, FileMeta, PromptPool,
    SUMMARIZE_INSTRUCTION,
};
use crate::backend::BackendRouter;
use crate::core::config::{Config, RunMode};
use crate::core::host::hostname;
use crate::core::lock::RunGuard;
use crate::diff::unified_diff;
use crate::queue::{merge, pending_candidates, Candidate};
use crate::scanner::{extension_of, gather_candidates, load_payload, FileKind, PayloadError};
use crate::store::{ActionKind, ActionStatus, NewAction, Store, StoreError};
use crate::tracker::track;
use rand::Rng;
use std::path::Path;

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another instance holds the lock; nothing was recorded
    Skipped,
    Completed(RunReport),
}

/// Counters for one completed run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: i64,
    /// Candidates after queue/scan fan-in
    pub candidates: usize,
    /// Files that received an action row (ok or error)
    pub processed: usize,
    /// Action rows recorded with status error
    pub failed: usize,
    /// Files attempted without an action row (empty payload, read failure)
    pub skipped: usize,
}

enum FileOutcome {
    Recorded(ActionStatus),
    EmptyPayload,
}

/// Execute one run.
///
/// Returns `Skipped` when the run lock is busy. Once the run row exists it is
/// finished on every exit path, including store failures that abort the
/// loop.
pub async fn run<R: Rng>(
    config: &Config,
    router: &BackendRouter,
    rng: &mut R,
) -> Result<RunOutcome, WalkerError> {
    let guard = match RunGuard::try_acquire(&config.lockfile)? {
        Some(guard) => guard,
        None => {
            log::info!("Another CodeWalker run is active; exiting.");
            return Ok(RunOutcome::Skipped);
        }
    };

    let store = Store::open(&config.db_path)?;
    let snapshot = config.snapshot_json()?;
    let run_id = store.begin_run(&hostname(), std::process::id(), &snapshot)?;
    let bracket = RunBracket::new(&store, run_id, guard);
    log::debug!("Run {} started (db {})", run_id, config.db_path.display());

    let prompts = PromptPool::load(config.prompt_file.as_deref(), &config.rewrite_prompt);
    let walker = FileLoop {
        config,
        router,
        store: &store,
        run_id,
        prompts,
    };
    let report = walker.run(rng).await;

    drop(bracket);
    let report = report?;

    match store.counts() {
        Ok(counts) => log::debug!(
            "Store totals: {} files, {} runs, {} actions, {} summaries, {} rewrites, {} queued",
            counts.files,
            counts.runs,
            counts.actions,
            counts.summaries,
            counts.rewrites,
            counts.pending_queue
        ),
        Err(e) => log::debug!("Cannot read store totals: {}", e),
    }

    Ok(RunOutcome::Completed(report))
}

struct FileLoop<'a> {
    config: &'a Config,
    router: &'a BackendRouter,
    store: &'a Store,
    run_id: i64,
    prompts: PromptPool,
}

impl FileLoop<'_> {
    async fn run<R: Rng>(&self, rng: &mut R) -> Result<RunReport, StoreError> {
        let queued = pending_candidates(self.store)?;
        let candidates = match self.config.mode {
            RunMode::Queue => queued,
            RunMode::Cron => merge(queued, gather_candidates(self.config, rng)),
        };
        log::info!("Found {} candidate files", candidates.len());

        let limit = self.config.limit_per_run;
        let mut report = RunReport {
            run_id: self.run_id,
            candidates: candidates.len(),
            ..RunReport::default()
        };

        for candidate in &candidates {
            if report.processed >= limit {
                break;
            }

            match self.process(candidate, rng).await {
                Ok(FileOutcome::Recorded(status)) => {
                    report.processed += 1;
                    if status == ActionStatus::Error {
                        report.failed += 1;
                    }
                }
                Ok(FileOutcome::EmptyPayload) => {
                    log::debug!("Empty payload, skipping {}", candidate.path.display());
                    report.skipped += 1;
                }
                Err(FileError::Store(e)) => return Err(e),
                Err(e) => {
                    log::warn!("Skipping {}: {}", candidate.path.display(), e);
                    report.skipped += 1;
                }
            }

            for row in candidate.queue_rows() {
                self.store.mark_queue_done(row)?;
            }
        }

        log::info!("Processed {} files (limit {})", report.processed, limit);
        Ok(report)
    }

    async fn process<R: Rng>(
        &self,
        candidate: &Candidate,
        rng: &mut R,
    ) -> Result<FileOutcome, FileError> {
        let path = candidate.path.as_path();
        let ext = path
            .file_name()
            .and_then(|name| extension_of(&name.to_string_lossy()))
            .unwrap_or_default();
        let kind = FileKind::classify(self.config, &ext);

        let payload = load_payload(path, kind, self.config)?;
        if payload.trim().is_empty() {
            return Ok(FileOutcome::EmptyPayload);
        }

        let tracked = track(self.store, path, &ext)?;
        let action = choose_action(self.config, kind, rng);
        let meta = FileMeta {
            path,
            ext: &ext,
            size: tracked.size,
            modified: tracked.modified,
        };

        let (messages, prompt_text, original) = match action {
            ActionKind::Summarize => (
                summarize_messages(&meta, &payload),
                SUMMARIZE_INSTRUCTION.to_string(),
                None,
            ),
            ActionKind::Rewrite => {
                let original = read_original(path)?;
                let chosen = self.prompts.choose(rng);
                log::info!("Using rewrite prompt: {}", chosen);
                let instruction = rewrite_instruction(chosen);
                (
                    rewrite_messages(&meta, &payload, &instruction),
                    instruction,
                    Some(original),
                )
            }
        };

        log::info!("{} {}", action, path.display());
        let result = self.router.generate(&messages, &self.config.model).await;

        let backend_used = match &result {
            Ok(generation) => generation.backend.clone(),
            Err(_) => self.config.backend.to_string(),
        };
        let usage = result.as_ref().ok().and_then(|g| g.usage);
        let error_text = result.as_ref().err().map(|e| e.to_string());
        let status = if result.is_ok() {
            ActionStatus::Ok
        } else {
            ActionStatus::Error
        };

        let action_id = self.store.insert_action(&NewAction {
            run_id: self.run_id,
            file_id: tracked.file_id,
            kind: action,
            model: &self.config.model,
            backend_used: &backend_used,
            prompt_text: &prompt_text,
            content_hash: &tracked.content_hash,
            tokens_in: usage.and_then(|u| u.prompt_tokens),
            tokens_out: usage.and_then(|u| u.completion_tokens),
            status,
            error_text: error_text.as_deref(),
        })?;

        match result {
            Ok(generation) => match action {
                ActionKind::Summarize => {
                    self.store
                        .insert_summary(action_id, &normalize_summary(&generation.text))?;
                }
                ActionKind::Rewrite => {
                    let rewritten = extract_rewrite(&generation.text);
                    let label = path.display().to_string();
                    let diff = unified_diff(
                        original.as_deref().unwrap_or_default(),
                        rewritten,
                        &label,
                        &format!("{}.rewritten", label),
                    );
                    self.store.insert_rewrite(action_id, rewritten, &diff)?;
                }
            },
            Err(e) => log::warn!("Action failed for {}: {}", path.display(), e),
        }

        Ok(FileOutcome::Recorded(status))
    }
}

// Whole file, decoded permissively, as the left side of the rewrite diff
fn read_original(path: &Path) -> Result<String, PayloadError> {
    let bytes = std::fs::read(path).map_err(|source| PayloadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
