//! Configuration types for tree-hasher
//!
//! This module defines:
//! - CLI argument parsing using clap derive macros
//! - Runtime configuration with validation

use crate::content::DEFAULT_CHUNK_SIZE;
use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

/// Maximum reasonable worker count
pub const MAX_WORKERS: usize = 512;

/// Largest accepted read chunk (64 MiB)
pub const MAX_CHUNK_SIZE: usize = 64 * 1024 * 1024;

/// Fingerprint every file under a directory, sequentially and in parallel
#[derive(Parser, Debug, Clone)]
#[command(
    name = "tree-hasher",
    version,
    about = "Fingerprint every file under a directory, sequentially and in parallel",
    long_about = "Walks a directory tree and computes the MD5 of every regular file twice:\n\
                  once on a single thread and once with a bounded worker pool.\n\n\
                  Both mappings are written as JSON so they can be diffed; with the default\n\
                  mode the two are also compared in-process.",
    after_help = "EXAMPLES:\n    \
        tree-hasher --root ~/src\n    \
        tree-hasher --root /data -w 16 --mode parallel\n    \
        tree-hasher compare result_single.json result_parallels.json"
)]
pub struct CliArgs {
    /// Subcommand (compare)
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Root directory to hash
    #[arg(long, env = "GOPATH", default_value = ".", value_name = "DIR")]
    pub root: String,

    /// Number of hashing workers (also the queue capacity)
    #[arg(
        short = 'w',
        long,
        default_value_t = default_workers(),
        value_name = "NUM"
    )]
    pub workers: usize,

    /// Read buffer size per worker, in bytes
    #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE, value_name = "BYTES")]
    pub chunk_size: usize,

    /// Which strategies to run
    #[arg(long, value_enum, default_value_t = HashMode::Both)]
    pub mode: HashMode,

    /// Artifact for the sequential run
    #[arg(long, default_value = "result_single.json", value_name = "FILE")]
    pub single_output: PathBuf,

    /// Artifact for the parallel run
    #[arg(long, default_value = "result_parallels.json", value_name = "FILE")]
    pub parallel_output: PathBuf,

    /// Quiet mode - suppress progress output
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Subcommands
#[derive(clap::Subcommand, Debug, Clone)]
pub enum Command {
    /// Check that two artifacts hold the same mapping
    Compare {
        /// First artifact
        #[arg(value_name = "LEFT")]
        left: PathBuf,

        /// Second artifact
        #[arg(value_name = "RIGHT")]
        right: PathBuf,
    },
}

/// Which strategies a run executes
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HashMode {
    /// Sequential, then parallel, then compare
    Both,
    /// Sequential baseline only
    Sequential,
    /// Concurrent pipeline only
    Parallel,
}

impl HashMode {
    pub fn runs_sequential(self) -> bool {
        matches!(self, HashMode::Both | HashMode::Sequential)
    }

    pub fn runs_parallel(self) -> bool {
        matches!(self, HashMode::Both | HashMode::Parallel)
    }
}

fn default_workers() -> usize {
    num_cpus::get()
}

/// Validated runtime configuration
#[derive(Debug, Clone)]
pub struct HashConfig {
    /// Root of the tree
    pub root: PathBuf,

    /// Number of hashing workers
    pub worker_count: usize,

    /// Read chunk size
    pub chunk_size: usize,

    /// Strategies to run
    pub mode: HashMode,

    /// Sequential artifact path
    pub single_output: PathBuf,

    /// Parallel artifact path
    pub parallel_output: PathBuf,

    /// Show progress indicator
    pub show_progress: bool,

    /// Verbose logging
    pub verbose: bool,
}

impl HashConfig {
    /// Create and validate configuration from CLI arguments
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let root = args.root.trim();
        if root.is_empty() {
            return Err(ConfigError::EmptyRoot);
        }

        if args.workers == 0 || args.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                count: args.workers,
                max: MAX_WORKERS,
            });
        }

        if args.chunk_size == 0 || args.chunk_size > MAX_CHUNK_SIZE {
            return Err(ConfigError::InvalidChunkSize {
                size: args.chunk_size,
                max: MAX_CHUNK_SIZE,
            });
        }

        if args.mode.runs_sequential() {
            validate_output(&args.single_output)?;
        }
        if args.mode.runs_parallel() {
            validate_output(&args.parallel_output)?;
        }
        if args.mode == HashMode::Both && args.single_output == args.parallel_output {
            return Err(ConfigError::InvalidOutputPath {
                path: args.parallel_output.clone(),
                reason: "Both runs would write the same file".to_string(),
            });
        }

        Ok(Self {
            root: PathBuf::from(root),
            worker_count: args.workers,
            chunk_size: args.chunk_size,
            mode: args.mode,
            single_output: args.single_output,
            parallel_output: args.parallel_output,
            show_progress: !args.quiet,
            verbose: args.verbose,
        })
    }

    /// Artifact paths this configuration writes, in run order
    pub fn outputs(&self) -> Vec<&Path> {
        let mut outputs = Vec::with_capacity(2);
        if self.mode.runs_sequential() {
            outputs.push(self.single_output.as_path());
        }
        if self.mode.runs_parallel() {
            outputs.push(self.parallel_output.as_path());
        }
        outputs
    }
}

fn validate_output(path: &Path) -> Result<(), ConfigError> {
    if path.as_os_str().is_empty() {
        return Err(ConfigError::InvalidOutputPath {
            path: path.to_path_buf(),
            reason: "Path is empty".to_string(),
        });
    }

    if path.is_dir() {
        return Err(ConfigError::InvalidOutputPath {
            path: path.to_path_buf(),
            reason: "Path is a directory".to_string(),
        });
    }

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            return Err(ConfigError::InvalidOutputPath {
                path: path.to_path_buf(),
                reason: format!("Parent directory '{}' does not exist", parent.display()),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(extra: &[&str]) -> CliArgs {
        let mut argv = vec!["tree-hasher", "--root", "/data"];
        argv.extend_from_slice(extra);
        CliArgs::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = HashConfig::from_args(args(&[])).unwrap();
        assert_eq!(config.root, PathBuf::from("/data"));
        assert_eq!(config.worker_count, num_cpus::get());
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.mode, HashMode::Both);
        assert_eq!(config.single_output, PathBuf::from("result_single.json"));
        assert_eq!(config.parallel_output, PathBuf::from("result_parallels.json"));
        assert!(config.show_progress);
    }

    #[test]
    fn test_outputs_follow_mode() {
        let both = HashConfig::from_args(args(&[])).unwrap();
        assert_eq!(
            both.outputs(),
            vec![Path::new("result_single.json"), Path::new("result_parallels.json")]
        );

        let parallel = HashConfig::from_args(args(&["--mode", "parallel"])).unwrap();
        assert_eq!(parallel.outputs(), vec![Path::new("result_parallels.json")]);
    }

    #[test]
    fn test_invalid_worker_count() {
        let err = HashConfig::from_args(args(&["-w", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { count: 0, .. }));

        let err = HashConfig::from_args(args(&["-w", "100000"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWorkerCount { .. }));
    }

    #[test]
    fn test_invalid_chunk_size() {
        let err = HashConfig::from_args(args(&["--chunk-size", "0"])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidChunkSize { size: 0, .. }));
    }

    #[test]
    fn test_same_output_rejected_in_both_mode() {
        let err = HashConfig::from_args(args(&[
            "--single-output",
            "out.json",
            "--parallel-output",
            "out.json",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutputPath { .. }));

        let ok = HashConfig::from_args(args(&[
            "--mode",
            "parallel",
            "--single-output",
            "out.json",
            "--parallel-output",
            "out.json",
        ]));
        assert!(ok.is_ok());
    }

    #[test]
    fn test_missing_output_parent() {
        let err = HashConfig::from_args(args(&[
            "--parallel-output",
            "/definitely/not/here/out.json",
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOutputPath { .. }));
    }

    #[test]
    fn test_compare_subcommand() {
        let parsed = CliArgs::try_parse_from(["tree-hasher", "compare", "a.json", "b.json"]).unwrap();
        match parsed.command {
            Some(Command::Compare { left, right }) => {
                assert_eq!(left, PathBuf::from("a.json"));
                assert_eq!(right, PathBuf::from("b.json"));
            }
            None => panic!("expected compare subcommand"),
        }
    }

    #[test]
    fn test_mode_selection() {
        assert!(HashMode::Both.runs_sequential() && HashMode::Both.runs_parallel());
        assert!(!HashMode::Sequential.runs_parallel());
        assert!(!HashMode::Parallel.runs_sequential());
    }
}
