//! Running `go` commands with generated files supplied through an overlay.

use crate::config::Config;
use crate::discovery::{current_dir, find_gox_files, GOX_EXTENSION};
use crate::error::CliError;
use crate::orchestrator::{build_overlay, build_pool, generate_all, write_file, MapSink, OverlayPlan};
use crate::overlay::Overlay;
use crate::registry::SourceMapRegistry;
use crate::remap::remap_output;
use camino::{Utf8Path, Utf8PathBuf};
use globset::GlobSet;
use std::fs;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// `go` flags whose value is the following argument.
const FLAGS_WITH_VALUE: &[&str] = &[
    "-o",
    "-p",
    "-C",
    "-exec",
    "-ldflags",
    "-gcflags",
    "-asmflags",
    "-tags",
    "-mod",
    "-modfile",
    "-coverprofile",
    "-covermode",
    "-coverpkg",
    "-run",
    "-skip",
    "-bench",
    "-count",
    "-timeout",
];

/// A `go` command line split into the parts gox rewrites.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoInvocation {
    pub command: String,
    /// Flags and package names, in order.
    pub go_args: Vec<String>,
    /// Package paths, with `.gox` files replaced by their directory. Empty
    /// means `go`'s own default, the current package.
    pub paths: Vec<String>,
    /// For `go run`, everything after the package.
    pub program_args: Vec<String>,
}

impl GoInvocation {
    pub fn split(command: &str, args: &[String]) -> Self {
        let mut invocation = Self {
            command: command.to_string(),
            ..Self::default()
        };

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if command == "run" && !invocation.paths.is_empty() {
                invocation.program_args.extend_from_slice(&args[i..]);
                break;
            }

            if arg.starts_with('-') {
                invocation.go_args.push(arg.clone());
                let takes_value = FLAGS_WITH_VALUE.contains(&arg.as_str());
                if takes_value && args.get(i + 1).is_some_and(|next| !next.starts_with('-')) {
                    i += 1;
                    invocation.go_args.push(args[i].clone());
                }
            } else if is_path(arg) {
                invocation.paths.push(package_path(arg));
            } else {
                invocation.go_args.push(arg.clone());
            }
            i += 1;
        }

        invocation
    }

    /// Arguments for `go`, with the overlay flag right after the command.
    pub fn to_args(&self, overlay_file: &Utf8Path) -> Vec<String> {
        let mut args = vec![self.command.clone(), format!("-overlay={overlay_file}")];
        args.extend(self.go_args.iter().cloned());
        args.extend(self.paths.iter().cloned());
        args.extend(self.program_args.iter().cloned());
        args
    }
}

fn is_path(arg: &str) -> bool {
    arg == "." || arg.starts_with("./") || arg.starts_with('/') || arg.ends_with(GOX_EXTENSION)
}

/// A `.gox` file stands for its package directory, `./`-prefixed as
/// `go run` requires.
fn package_path(arg: &str) -> String {
    if !arg.ends_with(GOX_EXTENSION) {
        return arg.to_string();
    }
    let dir = Utf8Path::new(arg)
        .parent()
        .map(Utf8Path::as_str)
        .filter(|dir| !dir.is_empty())
        .unwrap_or(".");
    if dir == "." || dir.starts_with("./") || dir.starts_with('/') {
        dir.to_string()
    } else {
        format!("./{dir}")
    }
}

/// Generated files copied into the source tree, removed again on drop.
///
/// `go vet` does not read through overlays, so the files must exist on disk
/// while it runs. Files that already existed are left alone.
#[derive(Debug, Default)]
pub struct Materialized {
    created: Vec<Utf8PathBuf>,
}

impl Materialized {
    pub fn from_overlay(overlay: &Overlay) -> Self {
        let mut created = Vec::new();
        for (target, replacement) in &overlay.replace {
            let target = Utf8PathBuf::from(target);
            if target.exists() {
                continue;
            }
            if fs::copy(replacement, &target).is_ok() {
                created.push(target);
            }
        }
        Self { created }
    }

    pub fn paths(&self) -> &[Utf8PathBuf] {
        &self.created
    }
}

impl Drop for Materialized {
    fn drop(&mut self) {
        for path in &self.created {
            let _ = fs::remove_file(path);
        }
    }
}

fn find_go() -> Result<PathBuf, CliError> {
    which::which("go").map_err(|_| CliError::GoNotFound)
}

/// Runs `go <argv...>` with every `.gox` file under `./...` generated into
/// an overlay, and returns `go`'s exit code.
pub async fn run(argv: Vec<String>, config: &Config) -> Result<i32, CliError> {
    let Some((command, args)) = argv.split_first() else {
        return Ok(0);
    };
    let go = find_go()?;

    // Dependencies of the target package may be .gox files too.
    let files = find_gox_files(&["./...".to_string()], &GlobSet::empty())?;
    if files.is_empty() {
        let status = Command::new(&go)
            .arg(command)
            .args(args)
            .status()
            .await
            .map_err(|source| CliError::Process {
                program: "go".to_string(),
                source,
            })?;
        return Ok(status.code().unwrap_or(1));
    }
    if config.verbose {
        eprintln!("Found {} .gox file(s)", files.len());
    }

    let cwd = current_dir()?;
    let options = config.generate_options();
    let pool = build_pool(config.jobs)?;
    let generated = generate_all(&pool, &files, &options)?;

    let temp = tempfile::Builder::new()
        .prefix("gox-overlay-")
        .tempdir()
        .map_err(|source| CliError::Write {
            path: Utf8PathBuf::from("gox-overlay-*"),
            source,
        })?;
    let temp_root = Utf8PathBuf::try_from(temp.path().to_path_buf())
        .map_err(|e| CliError::NonUtf8Path(e.into_path_buf()))?;
    let generated_dir = temp_root.join("src");
    let overlay_file = temp_root.join("overlay.json");

    let registry = SourceMapRegistry::new();
    let plan = OverlayPlan {
        cwd: &cwd,
        temp_dir: &generated_dir,
        maps: MapSink::Registry(&registry),
        verbose: config.verbose,
    };
    let overlay = build_overlay(generated, &plan)?;
    write_file(&overlay_file, &overlay.to_json()?)?;
    if config.verbose {
        eprintln!(
            "Overlay {overlay_file}: {} file(s), {} source map path(s)",
            overlay.len(),
            registry.len()
        );
    }

    let materialized = Materialized::from_overlay(&overlay);
    if config.verbose && !materialized.paths().is_empty() {
        eprintln!("Wrote {} generated file(s) for this run", materialized.paths().len());
    }

    let invocation = GoInvocation::split(command, args);
    let go_args = invocation.to_args(&overlay_file);
    if config.verbose {
        eprintln!("go {}", go_args.join(" "));
    }

    let output = Command::new(&go)
        .args(&go_args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| CliError::Process {
            program: "go".to_string(),
            source,
        })?;

    if !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        eprint!("{}", remap_output(&stderr, &registry, &cwd));
    }

    drop(materialized);
    Ok(output.status.code().unwrap_or(1))
}
