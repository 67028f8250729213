//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, Parser, Subcommand};

/// Go with embedded markup.
///
/// Any command gox does not know itself (`build`, `run`, `test`, `vet`, ...)
/// is passed to `go` with the generated files supplied as a build overlay.
#[derive(Debug, Parser)]
#[command(name = "gox")]
#[command(version, about, long_about = None)]
#[command(allow_external_subcommands = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate .go files from .gox files
    Generate(GenerateArgs),

    /// Rewrite generated-file diagnostics read from stdin to .gox positions
    Remap(RemapArgs),

    /// Print version information
    Version,

    /// Proxy to `go` with a .gox overlay
    #[command(external_subcommand)]
    Go(Vec<String>),
}

#[derive(Debug, ClapArgs)]
pub struct GenerateArgs {
    /// Files, directories, or `dir/...` patterns
    #[arg(default_value = ".")]
    pub paths: Vec<String>,

    /// Output directory (default: next to each input)
    #[arg(short = 'o', long = "output")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Runtime package import path
    #[arg(long)]
    pub runtime: Option<String>,

    /// Number of parallel workers
    #[arg(short = 'j', long = "jobs", default_value_t = 4)]
    pub jobs: usize,

    /// Write generated files to a temp dir and print a go build overlay
    #[arg(long)]
    pub overlay: bool,

    /// Write the overlay JSON to this file instead of stdout
    #[arg(long = "overlay-file", requires = "overlay")]
    pub overlay_file: Option<Utf8PathBuf>,

    /// Skip gofmt
    #[arg(long = "no-format")]
    pub no_format: bool,

    /// Glob patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Print timing breakdowns
    #[arg(long)]
    pub timings: bool,
}

#[derive(Debug, ClapArgs)]
pub struct RemapArgs {
    /// Source map files written by `gox generate`
    #[arg(long = "map", required = true)]
    pub maps: Vec<Utf8PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generate_args(argv: &[&str]) -> GenerateArgs {
        match Args::parse_from(argv).command {
            Command::Generate(args) => args,
            other => panic!("expected generate, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_defaults() {
        let args = generate_args(&["gox", "generate"]);
        assert_eq!(args.paths, vec!["."]);
        assert_eq!(args.jobs, 4);
        assert!(args.output_dir.is_none());
        assert!(!args.overlay);
        assert!(!args.no_format);
        assert!(!args.verbose);
    }

    #[test]
    fn test_generate_flags() {
        let args = generate_args(&[
            "gox",
            "generate",
            "-o",
            "out",
            "--runtime",
            "example.com/ui",
            "-j",
            "8",
            "-v",
            "./views/...",
            "main.gox",
        ]);
        assert_eq!(args.paths, vec!["./views/...", "main.gox"]);
        assert_eq!(args.output_dir.as_deref().map(|p| p.as_str()), Some("out"));
        assert_eq!(args.runtime.as_deref(), Some("example.com/ui"));
        assert_eq!(args.jobs, 8);
        assert!(args.verbose);
    }

    #[test]
    fn test_overlay_file_requires_overlay() {
        assert!(Args::try_parse_from(["gox", "generate", "--overlay-file", "o.json"]).is_err());
        let args = generate_args(&["gox", "generate", "--overlay", "--overlay-file", "o.json"]);
        assert_eq!(
            args.overlay_file.as_deref().map(|p| p.as_str()),
            Some("o.json")
        );
    }

    #[test]
    fn test_unknown_commands_go_to_the_go_tool() {
        let args = Args::parse_from(["gox", "build", "-o", "app", "./cmd/app/"]);
        match args.command {
            Command::Go(argv) => assert_eq!(argv, vec!["build", "-o", "app", "./cmd/app/"]),
            other => panic!("expected proxy, got {other:?}"),
        }
    }

    #[test]
    fn test_remap_needs_a_map() {
        assert!(Args::try_parse_from(["gox", "remap"]).is_err());
        let args = Args::parse_from(["gox", "remap", "--map", "a_gox.go.map", "--map", "b.map"]);
        match args.command {
            Command::Remap(remap) => assert_eq!(remap.maps.len(), 2),
            other => panic!("expected remap, got {other:?}"),
        }
    }
}
