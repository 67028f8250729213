//! `gox generate`: discovery, parallel generation and output.

use crate::cli::GenerateArgs;
use crate::config::Config;
use crate::discovery::{absolute, current_dir, find_gox_files, ignore_set, output_path};
use crate::error::CliError;
use crate::overlay::Overlay;
use crate::registry::SourceMapRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use gox_generator::{generate, GenerateOptions};
use rayon::prelude::*;
use rayon::ThreadPool;
use source_map::SourceMap;
use std::fs;
use std::time::Instant;

/// One generated file, not yet written anywhere.
#[derive(Debug)]
pub struct Generated {
    pub input: Utf8PathBuf,
    pub code: String,
    pub source_map: SourceMap,
}

/// Where overlay source maps go.
pub enum MapSink<'a> {
    /// `<temp file>.map` next to each generated file.
    Files,
    /// Kept in memory for remapping `go` output.
    Registry(&'a SourceMapRegistry),
}

/// Layout of an overlay build.
pub struct OverlayPlan<'a> {
    pub cwd: &'a Utf8Path,
    pub temp_dir: &'a Utf8Path,
    pub maps: MapSink<'a>,
    pub verbose: bool,
}

/// Runs `gox generate`.
pub fn run(args: GenerateArgs) -> Result<(), CliError> {
    let config = Config::for_generate(&args);
    let total_start = Instant::now();

    let ignore = ignore_set(&args.ignore)?;
    let scan_start = Instant::now();
    let files = find_gox_files(&args.paths, &ignore)?;
    let scan_time = scan_start.elapsed();

    if files.is_empty() {
        eprintln!("No .gox files found");
        return Ok(());
    }
    if config.verbose {
        eprintln!("Found {} .gox file(s)", files.len());
    }

    let cwd = current_dir()?;
    let options = config.generate_options();
    let pool = build_pool(config.jobs)?;

    let generate_start = Instant::now();
    let written = if args.overlay {
        let generated = generate_all(&pool, &files, &options)?;
        let temp_dir = create_overlay_dir()?;
        if config.verbose {
            eprintln!("Using temp dir: {temp_dir}");
        }
        let plan = OverlayPlan {
            cwd: &cwd,
            temp_dir: &temp_dir,
            maps: MapSink::Files,
            verbose: config.verbose,
        };
        let overlay = build_overlay(generated, &plan)?;
        emit_overlay(&overlay, args.overlay_file.as_deref(), config.verbose)?;
        overlay.len()
    } else {
        write_outputs(&pool, &files, &options, args.output_dir.as_deref(), &cwd, config.verbose)?
    };
    let generate_time = generate_start.elapsed();

    if config.timings {
        eprintln!("=== gox timings ===");
        eprintln!("file scan: {:?} ({} files)", scan_time, files.len());
        eprintln!("generate: {:?} ({} jobs)", generate_time, config.jobs);
        eprintln!("total: {:?}", total_start.elapsed());
    }

    if config.verbose {
        eprintln!("Generated {written} file(s)");
    }
    Ok(())
}

pub fn build_pool(jobs: usize) -> Result<ThreadPool, CliError> {
    Ok(rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?)
}

/// Reads, parses and generates one file.
pub fn generate_file(input: &Utf8Path, options: &GenerateOptions) -> Result<Generated, CliError> {
    let source = fs::read_to_string(input).map_err(|source| CliError::Read {
        path: input.to_owned(),
        source,
    })?;

    let parsed = gox_parser::parse(input.as_str(), &source);
    if parsed.has_errors() {
        return Err(CliError::Parse(parsed.errors));
    }

    let result = generate(&parsed.document, options).map_err(|source| CliError::Generate {
        path: input.to_owned(),
        source,
    })?;
    if !result.errors.is_empty() {
        return Err(CliError::Parse(result.errors));
    }
    if let Some(err) = &result.format_error {
        eprintln!("Warning: {input}: not formatted: {err}");
    }

    Ok(Generated {
        input: input.to_owned(),
        code: result.code,
        source_map: result.source_map,
    })
}

/// Generates every file; all failures are reported before giving up.
pub fn generate_all(
    pool: &ThreadPool,
    files: &[Utf8PathBuf],
    options: &GenerateOptions,
) -> Result<Vec<Generated>, CliError> {
    let results: Vec<Result<Generated, CliError>> = pool.install(|| {
        files
            .par_iter()
            .map(|file| generate_file(file, options))
            .collect()
    });

    let mut generated = Vec::with_capacity(results.len());
    let mut failed = 0;
    for result in results {
        match result {
            Ok(file) => generated.push(file),
            Err(err) => {
                eprintln!("error: {err}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        return Err(CliError::FilesFailed { count: failed });
    }
    Ok(generated)
}

/// Writes `<name>_gox.go` and its `.map` for each file.
///
/// A failing file does not stop the others.
fn write_outputs(
    pool: &ThreadPool,
    files: &[Utf8PathBuf],
    options: &GenerateOptions,
    output_dir: Option<&Utf8Path>,
    cwd: &Utf8Path,
    verbose: bool,
) -> Result<usize, CliError> {
    if let Some(dir) = output_dir {
        create_dir(dir)?;
    }

    let results: Vec<Result<(), CliError>> = pool.install(|| {
        files
            .par_iter()
            .map(|input| {
                if verbose {
                    eprintln!("Processing {input}");
                }
                let Generated {
                    code,
                    mut source_map,
                    ..
                } = generate_file(input, options)?;

                let output = output_path(input, output_dir);
                source_map.set_files(absolute(cwd, input).as_str(), absolute(cwd, &output).as_str());
                write_file(&output, &code)?;

                let map_path = map_path(&output);
                let json = source_map.to_json().map_err(|source| CliError::SourceMap {
                    path: map_path.clone(),
                    source,
                })?;
                write_file(&map_path, &json)?;

                if verbose {
                    eprintln!("  -> {output}");
                    eprintln!("  -> {map_path}");
                }
                Ok(())
            })
            .collect()
    });

    let mut failed = 0;
    for result in &results {
        if let Err(err) = result {
            eprintln!("error: {err}");
            failed += 1;
        }
    }
    if failed > 0 {
        return Err(CliError::FilesFailed { count: failed });
    }
    Ok(results.len())
}

/// Writes generated files under `plan.temp_dir`, mirroring their paths
/// relative to `plan.cwd`, and returns the overlay pointing `go` at them.
pub fn build_overlay(generated: Vec<Generated>, plan: &OverlayPlan<'_>) -> Result<Overlay, CliError> {
    let mut overlay = Overlay::new();

    for Generated {
        input,
        code,
        mut source_map,
    } in generated
    {
        if plan.verbose {
            eprintln!("Processing {input}");
        }
        let input = absolute(plan.cwd, &input);
        let target = output_path(&input, None);
        source_map.set_files(input.as_str(), target.as_str());

        // Mirroring keeps same-named files from different packages apart.
        let relative = match target.strip_prefix(plan.cwd) {
            Ok(relative) => relative.to_owned(),
            Err(_) => Utf8PathBuf::from(target.file_name().unwrap_or(target.as_str())),
        };
        let temp_file = plan.temp_dir.join(relative);
        if let Some(parent) = temp_file.parent() {
            create_dir(parent)?;
        }
        write_file(&temp_file, &code)?;

        match plan.maps {
            MapSink::Files => {
                let map_path = map_path(&temp_file);
                let json = source_map.to_json().map_err(|source| CliError::SourceMap {
                    path: map_path.clone(),
                    source,
                })?;
                write_file(&map_path, &json)?;
            }
            MapSink::Registry(registry) => {
                registry.insert([target.clone(), temp_file.clone()], source_map);
            }
        }

        if plan.verbose {
            eprintln!("  {target} -> {temp_file}");
        }
        overlay.insert(target.as_str(), temp_file.as_str());
    }

    Ok(overlay)
}

fn emit_overlay(overlay: &Overlay, file: Option<&Utf8Path>, verbose: bool) -> Result<(), CliError> {
    let json = overlay.to_json()?;
    match file {
        Some(path) => {
            write_file(path, &json)?;
            if verbose {
                eprintln!("Overlay written to {path}");
            }
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Creates a temp dir that outlives this process, for `go` to read later.
fn create_overlay_dir() -> Result<Utf8PathBuf, CliError> {
    let dir = tempfile::Builder::new()
        .prefix("gox-overlay-")
        .tempdir()
        .map_err(|source| CliError::Write {
            path: Utf8PathBuf::from(std::env::temp_dir().to_string_lossy().as_ref()),
            source,
        })?
        .keep();
    Utf8PathBuf::try_from(dir).map_err(|e| CliError::NonUtf8Path(e.into_path_buf()))
}

pub fn map_path(generated: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{generated}.map"))
}

pub fn write_file(path: &Utf8Path, contents: &str) -> Result<(), CliError> {
    fs::write(path, contents).map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })
}

fn create_dir(path: &Utf8Path) -> Result<(), CliError> {
    fs::create_dir_all(path).map_err(|source| CliError::Write {
        path: path.to_owned(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::Position;
    use tempfile::TempDir;

    fn workspace() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        (temp, root)
    }

    #[test]
    fn test_generate_file() {
        let (_temp, root) = workspace();
        let input = root.join("page.gox");
        fs::write(&input, "package main\n\nvar v = <p>{x}</p>\n").unwrap();

        let generated = generate_file(&input, &GenerateOptions::default()).unwrap();
        assert_eq!(
            generated.code,
            "package main\n\nimport \"github.com/germtb/gox\"\n\nvar v = gox.Element(\"p\", nil,\n\tgox.V(x))\n"
        );
        assert_eq!(generated.source_map.source_file, input.as_str());
    }

    #[test]
    fn test_generate_file_reports_parse_errors() {
        let (_temp, root) = workspace();
        let input = root.join("bad.gox");
        fs::write(&input, "package main\n\nvar v = <a></b>\n").unwrap();

        match generate_file(&input, &GenerateOptions::default()) {
            Err(CliError::Parse(errors)) => {
                assert_eq!(errors.len(), 1);
                let message = errors[0].to_string();
                assert!(message.starts_with(&format!("{input}:3:")), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_file_reports_markup_errors_in_expressions() {
        let (_temp, root) = workspace();
        let input = root.join("list.gox");
        fs::write(&input, "package main\n\nvar v = <ul>{ok && <li>a</b>}</ul>\n").unwrap();

        match generate_file(&input, &GenerateOptions::default()) {
            Err(CliError::Parse(errors)) => {
                assert_eq!(errors.len(), 1);
                let message = errors[0].to_string();
                assert!(message.starts_with(&format!("{input}:3:")), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_all_reports_every_failure() {
        let (_temp, root) = workspace();
        let good = root.join("good.gox");
        fs::write(&good, "var v = <p/>\n").unwrap();
        let files = vec![good, root.join("missing.gox"), root.join("gone.gox")];

        let pool = build_pool(2).unwrap();
        let err = generate_all(&pool, &files, &GenerateOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::FilesFailed { count: 2 }));
    }

    #[test]
    fn test_build_overlay_mirrors_paths() {
        let (_temp, root) = workspace();
        let temp_dir = root.join("overlay");
        let registry = SourceMapRegistry::new();
        let mut map = SourceMap::new();
        map.add_mapping(Position::new(0, 0), Position::new(0, 0));

        let generated = vec![
            Generated {
                input: Utf8PathBuf::from("ui/card.gox"),
                code: "package ui\n".to_string(),
                source_map: map.clone(),
            },
            Generated {
                input: Utf8PathBuf::from("./card_test.gox"),
                code: "package main\n".to_string(),
                source_map: map,
            },
        ];
        let plan = OverlayPlan {
            cwd: &root,
            temp_dir: &temp_dir,
            maps: MapSink::Registry(&registry),
            verbose: false,
        };
        let overlay = build_overlay(generated, &plan).unwrap();

        let card_target = root.join("ui/card_gox.go");
        let card_temp = temp_dir.join("ui/card_gox.go");
        let test_target = root.join("card_gox_test.go");
        assert_eq!(
            overlay.replace.get(card_target.as_str()).map(String::as_str),
            Some(card_temp.as_str())
        );
        assert!(overlay.replace.contains_key(test_target.as_str()));
        assert_eq!(fs::read_to_string(&card_temp).unwrap(), "package ui\n");

        assert_eq!(registry.len(), 4);
        let map = registry.get(&card_temp).unwrap();
        assert_eq!(map.source_file, root.join("ui/card.gox").as_str());
        assert_eq!(map.target_file, card_target.as_str());
    }

    #[test]
    fn test_build_overlay_writes_map_files() {
        let (_temp, root) = workspace();
        let temp_dir = root.join("overlay");
        let plan = OverlayPlan {
            cwd: &root,
            temp_dir: &temp_dir,
            maps: MapSink::Files,
            verbose: false,
        };
        let generated = vec![Generated {
            input: root.join("page.gox"),
            code: "package main\n".to_string(),
            source_map: SourceMap::new(),
        }];
        build_overlay(generated, &plan).unwrap();

        let json = fs::read_to_string(temp_dir.join("page_gox.go.map")).unwrap();
        let map = SourceMap::from_json(&json).unwrap();
        assert_eq!(map.target_file, root.join("page_gox.go").as_str());
    }

    #[test]
    fn test_map_path() {
        assert_eq!(map_path(Utf8Path::new("ui/a_gox.go")).as_str(), "ui/a_gox.go.map");
    }
}
