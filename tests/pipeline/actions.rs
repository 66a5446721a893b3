//! Summaries, rewrites and payload shaping

use super::run_completed;
use crate::common::{router, MockBackend, Workspace};
use codewalker::pipeline::prompts::{REWRITE_INSTRUCTION_PREFIX, SUMMARIZE_INSTRUCTION};
use codewalker::store::{ActionKind, ActionStatus};
use std::fs;

const ORIGINAL: &str = "import os\n\ndef main():\n    print(os.getcwd())\n\nmain()\n";

#[tokio::test]
async fn test_rewrite_stores_proposal_and_leaves_original() {
    let ws = Workspace::new();
    let path = ws.write("tool.py", ORIGINAL);
    let config = ws.config_with(|c| c.percent_rewrite = 100);

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    assert_eq!(fs::read_to_string(&path).unwrap(), ORIGINAL);

    let store = ws.store();
    let actions = store.actions_for_run(report.run_id).unwrap();
    assert_eq!(actions.len(), 1);
    let action = &actions[0];
    assert_eq!(action.kind, ActionKind::Rewrite);
    assert_eq!(action.status, ActionStatus::Ok);
    assert!(action.prompt_text.starts_with(REWRITE_INSTRUCTION_PREFIX));
    assert!(action.prompt_text.ends_with(&config.rewrite_prompt));

    let rewrite = store.rewrite_for(action.id).unwrap().unwrap();
    assert_eq!(rewrite.rewritten_text, "print('rewritten')\n");

    let label = path.display().to_string();
    assert!(rewrite
        .diff_text
        .starts_with(&format!("--- {}\n+++ {}.rewritten\n@@ ", label, label)));
    assert!(rewrite.diff_text.contains("-import os"));
    assert!(rewrite.diff_text.contains("+print('rewritten')"));
    assert!(store.summary_for(action.id).unwrap().is_none());
}

#[tokio::test]
async fn test_percent_zero_never_rewrites() {
    let ws = Workspace::new();
    for i in 0..5 {
        ws.write(&format!("m{}.py", i), ORIGINAL);
    }
    let config = ws.config_with(|c| c.percent_rewrite = 0);

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let actions = ws.store().actions_for_run(report.run_id).unwrap();
    assert_eq!(actions.len(), 5);
    assert!(actions.iter().all(|a| a.kind == ActionKind::Summarize));
    assert!(actions.iter().all(|a| a.prompt_text == SUMMARIZE_INSTRUCTION));
}

#[tokio::test]
async fn test_summarize_only_actions_disable_rewrites() {
    let ws = Workspace::new();
    ws.write("tool.py", ORIGINAL);
    let config = ws.config_with(|c| {
        c.percent_rewrite = 100;
        c.actions = vec![ActionKind::Summarize];
    });

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let actions = ws.store().actions_for_run(report.run_id).unwrap();
    assert_eq!(actions[0].kind, ActionKind::Summarize);
}

#[tokio::test]
async fn test_logs_are_always_summarized() {
    let ws = Workspace::new();
    ws.write("var/app.log", "INFO start\nWARN slow query\n");
    let config = ws.config_with(|c| c.percent_rewrite = 100);

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let actions = ws.store().actions_for_run(report.run_id).unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].kind, ActionKind::Summarize);
}

#[tokio::test]
async fn test_non_json_summary_is_wrapped() {
    let ws = Workspace::new();
    ws.write("tool.py", ORIGINAL);
    let config = ws.config_with(|c| c.percent_rewrite = 0);
    let backend = MockBackend::answering("ollama").with_summary("Prints the working directory.");

    let report = run_completed(&config, &router(&[backend])).await;

    let store = ws.store();
    let action = &store.actions_for_run(report.run_id).unwrap()[0];
    let summary = store.summary_for(action.id).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&summary).unwrap();
    assert_eq!(value["raw"], "Prints the working directory.");
}

#[tokio::test]
async fn test_log_payload_is_tail_and_ignores_size_cap() {
    let ws = Workspace::new();
    let body: String = (0..5000).map(|i| format!("entry-{:05} ok\n", i)).collect();
    ws.write("big.log", &body);
    let config = ws.config_with(|c| {
        c.max_filesize_kb = 1;
        c.log_tail_lines = 10;
    });
    let backend = MockBackend::answering("lmstudio");

    let report = run_completed(&config, &router(&[backend.clone()])).await;

    assert_eq!(report.processed, 1);
    let prompts = backend.user_prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("entry-04999 ok"));
    assert!(prompts[0].contains("entry-04990 ok"));
    assert!(!prompts[0].contains("entry-04989 ok"));
    assert!(prompts[0].contains(&format!("Size: {} bytes", body.len())));
}

#[tokio::test]
async fn test_rewrite_prompt_comes_from_prompt_file() {
    let ws = Workspace::new();
    ws.write("tool.py", ORIGINAL);
    let prompt_file = ws.state_path("prompts.json");
    fs::create_dir_all(prompt_file.parent().unwrap()).unwrap();
    fs::write(&prompt_file, r#"{"prompts": [{"text": "Add type hints."}]}"#).unwrap();
    let config = ws.config_with(|c| {
        c.percent_rewrite = 100;
        c.prompt_file = Some(prompt_file.clone());
    });

    let report = run_completed(&config, &router(&[MockBackend::answering("lmstudio")])).await;

    let actions = ws.store().actions_for_run(report.run_id).unwrap();
    assert!(actions[0].prompt_text.ends_with("Add type hints."));
}

#[tokio::test]
async fn test_failed_rewrite_has_no_rewrite_row() {
    let ws = Workspace::new();
    ws.write("tool.py", ORIGINAL);
    let config = ws.config_with(|c| c.percent_rewrite = 100);

    let report = run_completed(&config, &router(&[MockBackend::failing("lmstudio")])).await;

    let store = ws.store();
    let action = &store.actions_for_run(report.run_id).unwrap()[0];
    assert_eq!(action.kind, ActionKind::Rewrite);
    assert_eq!(action.status, ActionStatus::Error);
    assert!(store.rewrite_for(action.id).unwrap().is_none());
}
