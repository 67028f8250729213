//! Rewriting `go` diagnostics from generated files to `.gox` positions.

use crate::cli::RemapArgs;
use crate::discovery::{absolute, current_dir, is_generated_path};
use crate::error::CliError;
use crate::registry::SourceMapRegistry;
use camino::{Utf8Path, Utf8PathBuf};
use source_map::{Position, SourceMap};
use std::borrow::Cow;
use std::fs;
use std::io::{self, Read, Write};

/// A `path:line:col:message` diagnostic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub path: &'a str,
    /// 1-indexed.
    pub line: u32,
    /// 1-indexed.
    pub column: u32,
    /// Everything after the third colon, leading space included.
    pub message: &'a str,
}

/// Parses `file.go:line:col:message`.
///
/// The path may itself contain colons, so the rightmost `.go:` followed by
/// two numbers wins.
pub fn parse_location(line: &str) -> Option<Location<'_>> {
    let mut search_end = line.len();
    while let Some(idx) = line[..search_end].rfind(".go:") {
        if idx == 0 {
            return None;
        }
        let path_end = idx + ".go".len();
        if let Some(location) = parse_position(line, path_end) {
            return Some(location);
        }
        search_end = idx;
    }
    None
}

fn parse_position(line: &str, path_end: usize) -> Option<Location<'_>> {
    let rest = line[path_end..].strip_prefix(':')?;
    let (line_num, rest) = rest.split_once(':')?;
    let (column, message) = rest.split_once(':')?;
    Some(Location {
        path: &line[..path_end],
        line: parse_number(line_num)?,
        column: parse_number(column)?,
        message,
    })
}

fn parse_number(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Remaps one line, or returns it unchanged.
///
/// Only generated files with a registered map are rewritten. Relative paths
/// are resolved against `cwd`.
pub fn remap_line<'a>(line: &'a str, registry: &SourceMapRegistry, cwd: &Utf8Path) -> Cow<'a, str> {
    let Some(location) = parse_location(line) else {
        return Cow::Borrowed(line);
    };
    if !is_generated_path(location.path) {
        return Cow::Borrowed(line);
    }

    let path = Utf8Path::new(location.path);
    let Some(map) = registry
        .get(path)
        .or_else(|| registry.get(&absolute(cwd, path)))
    else {
        return Cow::Borrowed(line);
    };

    let target = Position::from_one_based(location.line, location.column);
    match map.source_position_from_target(target) {
        Some(source) => {
            let (line_num, column) = source.to_one_based();
            Cow::Owned(format!(
                "{}:{}:{}:{}",
                map.source_file, line_num, column, location.message
            ))
        }
        None => Cow::Borrowed(line),
    }
}

/// Remaps every line of captured tool output.
pub fn remap_output(output: &str, registry: &SourceMapRegistry, cwd: &Utf8Path) -> String {
    let mut result = String::with_capacity(output.len());
    for line in output.lines() {
        result.push_str(&remap_line(line, registry, cwd));
        result.push('\n');
    }
    result
}

/// Loads `.map` files into a registry under their generated file paths.
pub fn load_maps(paths: &[Utf8PathBuf], cwd: &Utf8Path) -> Result<SourceMapRegistry, CliError> {
    let registry = SourceMapRegistry::new();
    for path in paths {
        let json = fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.clone(),
            source,
        })?;
        let map = SourceMap::from_json(&json).map_err(|source| CliError::SourceMap {
            path: path.clone(),
            source,
        })?;

        let mut keys = Vec::new();
        if !map.target_file.is_empty() {
            keys.push(absolute(cwd, Utf8Path::new(&map.target_file)));
        }
        if let Some(generated) = path.as_str().strip_suffix(".map") {
            keys.push(absolute(cwd, Utf8Path::new(generated)));
        }
        registry.insert(keys, map);
    }
    Ok(registry)
}

/// `gox remap`: stdin to stdout.
pub fn run(args: RemapArgs) -> Result<(), CliError> {
    let cwd = current_dir()?;
    let registry = load_maps(&args.maps, &cwd)?;

    let mut input = String::new();
    io::stdin()
        .read_to_string(&mut input)
        .map_err(|source| CliError::Read {
            path: "<stdin>".into(),
            source,
        })?;

    let output = remap_output(&input, &registry, &cwd);
    io::stdout()
        .write_all(output.as_bytes())
        .map_err(|source| CliError::Write {
            path: "<stdout>".into(),
            source,
        })
}
