//! Run configuration from flags and environment.

use crate::cli::GenerateArgs;
use crate::gofmt::Gofmt;
use gox_generator::{GenerateOptions, GoFormatter, Verbatim, DEFAULT_RUNTIME_PACKAGE};
use std::sync::Arc;

/// Enables verbose output for every command.
pub const VERBOSE_ENV: &str = "GOX_VERBOSE";

/// Runtime package used when `--runtime` is not given.
pub const RUNTIME_ENV: &str = "GOX_RUNTIME";

/// Default number of parallel generation workers.
pub const DEFAULT_JOBS: usize = 4;

/// Settings shared by `generate` and the `go` proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub verbose: bool,
    pub runtime_package: String,
    pub jobs: usize,
    pub format: bool,
    pub timings: bool,
}

impl Config {
    /// Builds the configuration for the `go` proxy, which takes no gox flags.
    pub fn from_env() -> Self {
        Self {
            verbose: read_env_bool(VERBOSE_ENV).unwrap_or(false),
            runtime_package: runtime_from_env(),
            jobs: DEFAULT_JOBS,
            format: true,
            timings: false,
        }
    }

    /// Flags win over the environment.
    pub fn for_generate(args: &GenerateArgs) -> Self {
        Self {
            verbose: args.verbose || read_env_bool(VERBOSE_ENV).unwrap_or(false),
            runtime_package: args.runtime.clone().unwrap_or_else(runtime_from_env),
            jobs: args.jobs,
            format: !args.no_format,
            timings: args.timings,
        }
    }

    /// Generator options, with `gofmt` as the formatter when it is enabled and
    /// installed.
    pub fn generate_options(&self) -> GenerateOptions {
        let formatter: Arc<dyn GoFormatter> = if !self.format {
            Arc::new(Verbatim)
        } else if let Some(gofmt) = Gofmt::locate() {
            if self.verbose {
                eprintln!("Using {}", gofmt.path().display());
            }
            Arc::new(gofmt)
        } else {
            if self.verbose {
                eprintln!("Warning: gofmt not found in PATH, output is not formatted");
            }
            Arc::new(Verbatim)
        };

        GenerateOptions::default()
            .with_runtime_package(self.runtime_package.clone())
            .with_formatter(formatter)
    }
}

fn runtime_from_env() -> String {
    std::env::var(RUNTIME_ENV)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_RUNTIME_PACKAGE.to_string())
}

/// Parses a boolean environment flag; unset or unrecognized values are `None`.
pub fn read_env_bool(name: &str) -> Option<bool> {
    let value = std::env::var(name).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
