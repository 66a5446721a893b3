use super::cli::{self, Args, LoadedConfig};
use crate::backend::BackendRouter;
use crate::core::error_handling::log_error_with_context;
use crate::core::logging::init_logging;
use crate::core::version::{build_time, git_hash, version, APP_NAME};
use crate::pipeline::{self, RunOutcome};
use clap::Parser;
use std::io::IsTerminal;

/// Parse arguments, load configuration, set up logging and execute one run.
///
/// Returns the process exit code: 0 for a completed or skipped run, 1 for
/// invalid configuration or a run-level failure.
pub fn startup() -> i32 {
    let args = Args::parse();
    let use_color = std::io::stdout().is_terminal();

    let loaded = match cli::load(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            // No configuration means no log file yet; report with CLI flags only
            match init_logging(
                args.log_level.as_deref(),
                args.log_format.as_deref(),
                None,
                use_color,
            ) {
                Ok(()) => log_error_with_context(&e, "Configuration loading"),
                Err(_) => eprintln!("FATAL: {}", e),
            }
            return 1;
        }
    };

    let config = &loaded.config;
    if let Err(e) = init_logging(
        Some(config.log_level.as_str()),
        Some(config.log_format.as_str()),
        config.log_file.as_deref(),
        use_color,
    ) {
        eprintln!("FATAL: Cannot initialize logging: {}", e);
        return 1;
    }

    log_startup(&args, &loaded);

    let router = match BackendRouter::from_config(config) {
        Ok(router) => router,
        Err(e) => {
            log_error_with_context(&e, "Backend setup");
            return 1;
        }
    };
    log::debug!("Backend order: {}", router.names().join(", "));

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("FATAL: Cannot start async runtime: {}", e);
            return 1;
        }
    };

    let mut rng = rand::thread_rng();
    match runtime.block_on(pipeline::run(config, &router, &mut rng)) {
        Ok(RunOutcome::Skipped) => 0,
        Ok(RunOutcome::Completed(report)) => {
            log::info!(
                "Run {} finished: {} processed, {} failed, {} skipped",
                report.run_id,
                report.processed,
                report.failed,
                report.skipped
            );
            0
        }
        Err(e) => {
            log_error_with_context(&e, "Run");
            1
        }
    }
}

fn log_startup(args: &Args, loaded: &LoadedConfig) {
    let config = &loaded.config;
    log::info!(
        "Starting {} v{} ({}, built {}) | backend={} model={}",
        APP_NAME,
        version(),
        git_hash(),
        build_time(),
        config.backend,
        config.model
    );
    log::info!(
        "Scan root={} types={} limit={} rewrite={}% mode={}",
        config.root.display(),
        config.file_types.join(","),
        config.limit_per_run,
        if config.rewrite_enabled() {
            config.percent_rewrite
        } else {
            0
        },
        config.mode
    );

    match &loaded.source {
        Some(path) => log::debug!("Configuration file: {}", path.display()),
        None => log::debug!("No configuration file; using defaults"),
    }
    for path in &loaded.dotenv_files {
        log::debug!("Loaded environment from {}", path.display());
    }
    if !loaded.unknown_keys.is_empty() {
        log::debug!(
            "Ignoring unknown configuration keys: {}",
            loaded.unknown_keys.join(", ")
        );
    }
    if args.once {
        log::debug!("--once given; a single pass is the only mode");
    }
}
