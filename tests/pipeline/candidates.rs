//! Queue priority, queue-only mode and scan filters

use super::run_completed;
use crate::common::{file_path_string, router, MockBackend, Workspace};
use codewalker::core::config::RunMode;
use codewalker::store::QueueStatus;
use std::path::Path;

fn processed_paths(ws: &Workspace, run_id: i64) -> Vec<String> {
    let store = ws.store();
    let mut paths: Vec<String> = store
        .actions_for_run(run_id)
        .unwrap()
        .iter()
        .map(|a| {
            store
                .last_actions()
                .unwrap()
                .into_iter()
                .find(|l| l.action_id == a.id)
                .map(|l| l.path)
                .unwrap_or_default()
        })
        .collect();
    paths.sort();
    paths
}

fn relative(ws: &Workspace, path: &str) -> String {
    Path::new(path)
        .strip_prefix(&ws.root)
        .unwrap()
        .to_string_lossy()
        .into_owned()
}

#[tokio::test]
async fn test_queued_file_goes_first_and_is_marked_done() {
    let ws = Workspace::new();
    for i in 0..4 {
        ws.write(&format!("scan{}.py", i), "x = 1\n");
    }
    let queued = ws.write("wanted.py", "y = 2\n");
    let config = ws.config_with(|c| {
        c.limit_per_run = 1;
        c.percent_rewrite = 0;
    });
    let queued_path = file_path_string(&queued);
    assert!(ws
        .store()
        .enqueue(&queued_path, Some("operator"), Some("please"))
        .unwrap());

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    assert_eq!(report.candidates, 5);
    assert_eq!(report.processed, 1);
    assert_eq!(processed_paths(&ws, report.run_id), vec![queued_path.clone()]);

    let entry = ws.store().queue_entry(&queued_path).unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Done);
    assert!(ws.store().pending_queue().unwrap().is_empty());
}

#[tokio::test]
async fn test_queue_only_mode_skips_scan() {
    let ws = Workspace::new();
    ws.write("scanned.py", "x = 1\n");
    let config = ws.config_with(|c| c.mode = RunMode::Queue);
    let backend = MockBackend::answering("lmstudio");

    let report = run_completed(&config, &router(&[backend.clone()])).await;
    assert_eq!(report.candidates, 0);
    assert_eq!(report.processed, 0);
    assert_eq!(backend.calls(), 0);

    // Queue entries may point outside the scan root and at any extension
    let outside = ws.state_path("notes.txt");
    std::fs::create_dir_all(outside.parent().unwrap()).unwrap();
    std::fs::write(&outside, "remember the milk\n").unwrap();
    ws.store()
        .enqueue(&file_path_string(&outside), None, None)
        .unwrap();

    let report = run_completed(&config, &router(&[backend.clone()])).await;
    assert_eq!(report.processed, 1);
    assert_eq!(
        processed_paths(&ws, report.run_id),
        vec![file_path_string(&outside.canonicalize().unwrap())]
    );
}

#[tokio::test]
async fn test_missing_queued_file_stays_pending() {
    let ws = Workspace::new();
    let config = ws.config_with(|c| c.mode = RunMode::Queue);
    let missing = file_path_string(&ws.root.join("gone.py"));
    ws.store().enqueue(&missing, None, None).unwrap();

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    assert_eq!(report.candidates, 0);
    let entry = ws.store().queue_entry(&missing).unwrap().unwrap();
    assert_eq!(entry.status, QueueStatus::Pending);
}

#[tokio::test]
async fn test_scan_applies_type_dir_and_size_filters() {
    let ws = Workspace::new();
    ws.write("src/app.py", "print('ok')\n");
    ws.write("src/README.txt", "not an allowed type\n");
    ws.write("vendor/lib.py", "print('vendored')\n");
    ws.write("web/node_modules/pkg/index.php", "<?php\n");
    ws.write("big.py", &"#".repeat(4096));
    ws.write("ignored/skip.sh", "echo skip\n");
    ws.write(".gitignore", "# local\nignored/\n");
    let config = ws.config_with(|c| {
        c.max_filesize_kb = 1;
        c.percent_rewrite = 0;
    });

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let processed: Vec<String> = processed_paths(&ws, report.run_id)
        .iter()
        .map(|p| relative(&ws, p))
        .collect();
    assert_eq!(processed, vec!["src/app.py".to_string()]);
}

#[tokio::test]
async fn test_changed_content_updates_file_hash() {
    let ws = Workspace::new();
    let path = ws.write("app.py", "print(1)\n");
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    let backends = router(&[MockBackend::answering("lmstudio")]);

    run_completed(&config, &backends).await;
    let first = ws.store().file_by_path(&file_path_string(&path)).unwrap().unwrap();

    std::fs::write(&path, "print(2)\n").unwrap();
    run_completed(&config, &backends).await;
    let second = ws.store().file_by_path(&file_path_string(&path)).unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_ne!(first.last_content_hash, second.last_content_hash);
    assert_eq!(ws.store().counts().unwrap().actions, 2);
}

#[tokio::test]
async fn test_queued_alias_of_scanned_file_is_processed_once() {
    let ws = Workspace::new();
    let real = ws.write("sub/app.py", "print('once')\n");
    std::fs::create_dir_all(ws.root.join("other")).unwrap();
    let alias = format!("{}/other/../sub/app.py", ws.root.display());
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    ws.store().enqueue(&alias, None, None).unwrap();
    let backend = MockBackend::answering("lmstudio");

    let report = run_completed(&config, &router(&[backend.clone()])).await;

    assert_eq!(report.candidates, 1);
    assert_eq!(report.processed, 1);
    assert_eq!(backend.calls(), 1);
    assert_eq!(processed_paths(&ws, report.run_id), vec![file_path_string(&real)]);

    let store = ws.store();
    assert_eq!(store.counts().unwrap().files, 1);
    assert_eq!(
        store.queue_entry(&alias).unwrap().unwrap().status,
        QueueStatus::Done
    );
}

#[tokio::test]
async fn test_duplicate_queue_rows_share_one_action() {
    let ws = Workspace::new();
    let real = ws.write("app.py", "print('dup')\n");
    let direct = file_path_string(&real);
    let alias = format!("{}/./sub/../app.py", ws.root.display());
    std::fs::create_dir_all(ws.root.join("sub")).unwrap();
    let config = ws.config_with(|c| {
        c.mode = RunMode::Queue;
        c.percent_rewrite = 0;
    });
    let store = ws.store();
    store.enqueue(&direct, Some("ops"), None).unwrap();
    store.enqueue(&alias, Some("ops"), None).unwrap();
    drop(store);

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    assert_eq!(report.candidates, 1);
    assert_eq!(report.processed, 1);
    let store = ws.store();
    assert_eq!(store.actions_for_run(report.run_id).unwrap().len(), 1);
    for row in [&direct, &alias] {
        assert_eq!(
            store.queue_entry(row).unwrap().unwrap().status,
            QueueStatus::Done,
            "row {} still pending",
            row
        );
    }
}

#[tokio::test]
async fn test_queue_rows_done_after_failure_or_empty_payload() {
    let ws = Workspace::new();
    let failing = file_path_string(&ws.write("broken.py", "raise SystemExit\n"));
    let empty = file_path_string(&ws.write("empty.py", ""));
    let config = ws.config_with(|c| {
        c.mode = RunMode::Queue;
        c.percent_rewrite = 0;
    });
    let store = ws.store();
    store.enqueue(&failing, None, None).unwrap();
    store.enqueue(&empty, None, None).unwrap();
    drop(store);

    let report = run_completed(&config, &router(&[MockBackend::failing("lmstudio")])).await;

    assert_eq!(report.candidates, 2);
    assert_eq!(report.processed, 1);
    assert_eq!(report.failed, 1);
    assert_eq!(report.skipped, 1);

    let store = ws.store();
    assert!(store.pending_queue().unwrap().is_empty());
    assert_eq!(
        store.queue_entry(&failing).unwrap().unwrap().status,
        QueueStatus::Done
    );
    assert_eq!(
        store.queue_entry(&empty).unwrap().unwrap().status,
        QueueStatus::Done
    );
}
