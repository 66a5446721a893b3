//! Run rows, locking, limits and backend failures

use super::run_completed;
use crate::common::{file_path_string, router, MockBackend, Workspace};
use codewalker::core::lock::RunGuard;
use codewalker::pipeline::{run, RunOutcome};
use codewalker::store::{ActionKind, ActionStatus};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[tokio::test]
async fn test_single_pass_summarizes_every_file() {
    let ws = Workspace::new();
    let files = [
        ws.write("app.py", "print('hello')\n"),
        ws.write("deploy.sh", "#!/bin/sh\necho deploy\n"),
        ws.write("logs/app.log", "INFO boot\nERROR disk full\n"),
    ];
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    let backend = MockBackend::answering("lmstudio");

    let report = run_completed(&config, &router(&[backend.clone()])).await;

    assert_eq!(report.candidates, 3);
    assert_eq!(report.processed, 3);
    assert_eq!(report.failed, 0);
    assert_eq!(backend.calls(), 3);

    let store = ws.store();
    let run = store.run(report.run_id).unwrap().unwrap();
    assert!(run.finished_at.is_some());
    assert_eq!(run.pid, std::process::id());

    let actions = store.actions_for_run(report.run_id).unwrap();
    assert_eq!(actions.len(), 3);
    for action in &actions {
        assert_eq!(action.kind, ActionKind::Summarize);
        assert_eq!(action.status, ActionStatus::Ok);
        assert_eq!(action.backend_used, "lmstudio");
        assert_eq!(action.model, config.model);
        assert_eq!(action.tokens_in, Some(12));
        assert_eq!(action.tokens_out, Some(34));
        assert_eq!(action.error_text, "");
        assert_eq!(action.content_hash.len(), 64);
        let summary = store.summary_for(action.id).unwrap().unwrap();
        assert!(summary.contains("file_purpose"));
    }

    for file in &files {
        let record = store.file_by_path(&file_path_string(file)).unwrap();
        assert!(record.is_some(), "missing file row for {}", file.display());
    }
    assert!(store.rewrite_for(actions[0].id).unwrap().is_none());
}

#[tokio::test]
async fn test_busy_lock_skips_without_recording() {
    let ws = Workspace::new();
    ws.write("app.py", "print('hello')\n");
    let config = ws.config();
    let backend = MockBackend::answering("lmstudio");

    let _held = RunGuard::try_acquire(&config.lockfile).unwrap().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let outcome = run(&config, &router(&[backend.clone()]), &mut rng)
        .await
        .unwrap();

    assert_eq!(outcome, RunOutcome::Skipped);
    assert_eq!(backend.calls(), 0);
    assert!(!config.db_path.exists());
}

#[tokio::test]
async fn test_lock_released_after_run() {
    let ws = Workspace::new();
    ws.write("app.py", "print('hello')\n");
    let config = ws.config();
    let backends = router(&[MockBackend::answering("lmstudio")]);

    let first = run_completed(&config, &backends).await;
    let second = run_completed(&config, &backends).await;
    assert_ne!(first.run_id, second.run_id);

    let counts = ws.store().counts().unwrap();
    assert_eq!(counts.runs, 2);
    assert_eq!(counts.files, 1);
    assert_eq!(counts.actions, 2);
}

#[tokio::test]
async fn test_all_backends_failing_records_errors_and_finishes() {
    let ws = Workspace::new();
    ws.write("app.py", "print('hello')\n");
    ws.write("worker.php", "<?php echo 1;\n");
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    let primary = MockBackend::failing("lmstudio");
    let secondary = MockBackend::failing("ollama");

    let report = run_completed(&config, &router(&[primary.clone(), secondary.clone()])).await;

    assert_eq!(report.processed, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(primary.calls(), 2);
    assert_eq!(secondary.calls(), 2);

    let store = ws.store();
    assert!(store.run(report.run_id).unwrap().unwrap().finished_at.is_some());
    for action in store.actions_for_run(report.run_id).unwrap() {
        assert_eq!(action.status, ActionStatus::Error);
        assert_eq!(action.backend_used, "auto");
        assert!(action.error_text.contains("lmstudio"), "{}", action.error_text);
        assert!(action.error_text.contains("ollama"), "{}", action.error_text);
        assert!(action.tokens_in.is_none());
        assert!(store.summary_for(action.id).unwrap().is_none());
    }
}

#[tokio::test]
async fn test_fallback_records_answering_backend() {
    let ws = Workspace::new();
    ws.write("app.py", "print('hello')\n");
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    let primary = MockBackend::failing("lmstudio");
    let secondary = MockBackend::answering("ollama");

    let report = run_completed(&config, &router(&[primary.clone(), secondary.clone()])).await;

    assert_eq!(report.failed, 0);
    assert_eq!(primary.calls(), 1);
    assert_eq!(secondary.calls(), 1);
    let actions = ws.store().actions_for_run(report.run_id).unwrap();
    assert_eq!(actions[0].backend_used, "ollama");
    assert_eq!(actions[0].status, ActionStatus::Ok);
}

#[tokio::test]
async fn test_limit_counts_processed_files_only() {
    let ws = Workspace::new();
    for i in 0..6 {
        ws.write(&format!("src/mod{}.py", i), &format!("value = {}\n", i));
    }
    ws.write("src/empty.py", "");
    ws.write("src/blank.sh", "   \n\n");
    let config = ws.config_with(|c| {
        c.limit_per_run = 2;
        c.percent_rewrite = 0;
    });
    let backend = MockBackend::answering("lmstudio");

    let report = run_completed(&config, &router(&[backend.clone()])).await;

    assert_eq!(report.candidates, 8);
    assert_eq!(report.processed, 2);
    assert_eq!(backend.calls(), 2);
    assert_eq!(ws.store().actions_for_run(report.run_id).unwrap().len(), 2);
}

#[tokio::test]
async fn test_run_row_keeps_config_snapshot() {
    let ws = Workspace::new();
    ws.write("app.py", "print('hello')\n");
    let config = ws.config_with(|c| {
        c.api_key = Some("sk-do-not-store".to_string());
        c.limit_per_run = 3;
    });

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let run = ws.store().run(report.run_id).unwrap().unwrap();
    let snapshot: serde_json::Value = serde_json::from_str(&run.config_json).unwrap();
    assert_eq!(snapshot["limit-per-run"], 3);
    assert!(!run.config_json.contains("sk-do-not-store"));
}
