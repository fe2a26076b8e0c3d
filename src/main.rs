//! tree-hasher - Parallel content fingerprinting of directory trees
//!
//! Entry point for the CLI application.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tree_hasher::config::{CliArgs, Command, HashConfig};
use tree_hasher::output::{discard_stale, read_artifact, write_artifact};
use tree_hasher::progress::{print_comparison, print_header, print_summary, ProgressReporter};
use tree_hasher::walker::{PipelineCoordinator, RunStats, SequentialWalker, WalkResult};
use tree_hasher::WalkerError;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = render_chain(&e);
            error!("{}", message);
            eprintln!("Error: {}", message);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Setup logging
    setup_logging(args.verbose)?;

    if let Some(Command::Compare { left, right }) = &args.command {
        return run_compare(left, right);
    }

    // Validate and create config
    let config = HashConfig::from_args(args).context("Invalid configuration")?;

    if config.show_progress {
        print_header(
            &config.root.display().to_string(),
            config.worker_count,
            config.chunk_size,
        );
    }

    let sequential = SequentialWalker::from_config(&config);
    let pipeline = PipelineCoordinator::from_config(&config);

    // Setup signal handler for graceful shutdown
    let tokens = [sequential.cancel_token(), pipeline.cancel_token()];
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupt received, shutting down...");
        for token in &tokens {
            token.fail(WalkerError::Interrupted);
        }
    })
    .context("Failed to set signal handler")?;

    let mut baseline = None;

    if config.mode.runs_sequential() {
        let stats = sequential.stats();
        // A failure here also invalidates what the parallel run would have written
        let result = run_strategy(
            "Sequential",
            &config.single_output,
            &config.outputs(),
            stats,
            config.show_progress,
            move || sequential.run(),
        )?;
        baseline = Some(result.hashes);
    }

    if config.mode.runs_parallel() {
        let stats = pipeline.stats();
        let result = run_strategy(
            "Parallel",
            &config.parallel_output,
            &[config.parallel_output.as_path()],
            stats,
            config.show_progress,
            move || pipeline.run(),
        )?;

        if let Some(baseline) = &baseline {
            let diff = baseline.diff(&result.hashes);
            if config.show_progress {
                print_comparison(
                    &config.single_output.display().to_string(),
                    &config.parallel_output.display().to_string(),
                    &diff,
                );
            }
            if !diff.is_empty() {
                return Err(mismatch(&diff).into());
            }
            info!(entries = result.hashes.len(), "Sequential and parallel mappings match");
        }
    }

    Ok(())
}

/// Run one strategy, then persist its mapping
///
/// The run happens on its own thread so the spinner can poll `stats`. A
/// failed run removes any artifact an earlier invocation left at the `stale`
/// paths.
fn run_strategy<F>(
    label: &str,
    output: &Path,
    stale: &[&Path],
    stats: Arc<RunStats>,
    show_progress: bool,
    f: F,
) -> Result<WalkResult>
where
    F: FnOnce() -> tree_hasher::Result<WalkResult> + Send + 'static,
{
    let outcome = if show_progress {
        let reporter = ProgressReporter::new();
        reporter.set_status(&format!("{} run starting...", label));

        let start = Instant::now();
        let handle = thread::Builder::new()
            .name(format!("{}-run", label.to_lowercase()))
            .spawn(f)
            .context("Failed to spawn run thread")?;

        while !handle.is_finished() {
            reporter.update(label, &stats.snapshot(start.elapsed()));
            thread::sleep(Duration::from_millis(100));
        }

        let outcome = handle
            .join()
            .map_err(|_| anyhow!("{} run thread panicked", label))?;
        match &outcome {
            Ok(_) => reporter.finish(&format!("{} run completed", label)),
            Err(_) => reporter.finish_and_clear(),
        }
        outcome
    } else {
        f()
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            discard_stale(stale);
            return Err(e).with_context(|| format!("{} run failed", label));
        }
    };

    write_artifact(output, &result.hashes)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if show_progress {
        print_summary(label, &result, &output.display().to_string());
    }

    Ok(result)
}

/// Compare two existing artifacts
fn run_compare(left: &Path, right: &Path) -> Result<()> {
    let left_hashes =
        read_artifact(left).with_context(|| format!("Failed to load {}", left.display()))?;
    let right_hashes =
        read_artifact(right).with_context(|| format!("Failed to load {}", right.display()))?;

    let diff = left_hashes.diff(&right_hashes);
    print_comparison(
        &left.display().to_string(),
        &right.display().to_string(),
        &diff,
    );

    if diff.is_empty() {
        Ok(())
    } else {
        Err(mismatch(&diff).into())
    }
}

fn mismatch(diff: &tree_hasher::HashDiff) -> WalkerError {
    WalkerError::Mismatch {
        only_left: diff.only_left.len(),
        only_right: diff.only_right.len(),
        mismatched: diff.mismatched.len(),
    }
}

/// Render an error and its causes on one line
///
/// Causes whose text already appears earlier in the chain are left out.
fn render_chain(err: &anyhow::Error) -> String {
    let mut out = String::new();
    for cause in err.chain() {
        let message = cause.to_string();
        if out.contains(&message) {
            continue;
        }
        if !out.is_empty() {
            out.push_str(": ");
        }
        out.push_str(&message);
    }
    out
}

fn setup_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("tree_hasher=debug,warn")
    } else {
        EnvFilter::new("tree_hasher=info,warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    Ok(())
}
