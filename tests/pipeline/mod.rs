mod actions;
mod candidates;
mod run_lifecycle;

use codewalker::backend::BackendRouter;
use codewalker::core::config::Config;
use codewalker::pipeline::{run, RunOutcome, RunReport};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Run once with a fixed seed and expect completion
pub async fn run_completed(config: &Config, router: &BackendRouter) -> RunReport {
    let mut rng = StdRng::seed_from_u64(7);
    match run(config, router, &mut rng).await.unwrap() {
        RunOutcome::Completed(report) => report,
        RunOutcome::Skipped => panic!("run was skipped"),
    }
}
