//! Finding `.gox` files and naming their outputs.

use crate::error::CliError;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::fs;
use walkdir::WalkDir;

pub const GOX_EXTENSION: &str = ".gox";

/// Suffix marking recursive paths, as in `go build ./...`.
const RECURSIVE_SUFFIX: &str = "/...";

/// Builds the ignore set from `--ignore` patterns.
pub fn ignore_set(patterns: &[String]) -> Result<GlobSet, CliError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// Directories a recursive walk never enters, matching `go`'s own `./...`.
pub fn skip_dir(name: &str) -> bool {
    name.starts_with('.')
        || name.starts_with('_')
        || matches!(name, "vendor" | "testdata" | "node_modules")
}

/// Expands command-line paths into `.gox` files.
///
/// `dir/...` walks recursively, a directory is scanned without descending,
/// and a `.gox` file is taken as is. Results keep argument order and are
/// sorted within each directory.
pub fn find_gox_files(paths: &[String], ignore: &GlobSet) -> Result<Vec<Utf8PathBuf>, CliError> {
    let mut files = Vec::new();

    for path in paths {
        if let Some(dir) = path.strip_suffix(RECURSIVE_SUFFIX) {
            let dir = if dir.is_empty() { "." } else { dir };
            walk(Utf8Path::new(dir), None, &mut files)?;
            continue;
        }

        let path = Utf8Path::new(path);
        let metadata = fs::metadata(path).map_err(|source| CliError::Read {
            path: path.to_owned(),
            source,
        })?;

        if metadata.is_dir() {
            walk(path, Some(1), &mut files)?;
        } else if path.as_str().ends_with(GOX_EXTENSION) {
            files.push(path.to_owned());
        }
    }

    files.retain(|file| !ignore.is_match(display_path(file).as_str()));
    Ok(files)
}

/// Collects `.gox` files under `dir`, at most `max_depth` levels down.
fn walk(
    dir: &Utf8Path,
    max_depth: Option<usize>,
    files: &mut Vec<Utf8PathBuf>,
) -> Result<(), CliError> {
    let mut walker = WalkDir::new(dir).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }
    let walker = walker
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry.file_type().is_dir()
                || !entry.file_name().to_str().is_some_and(skip_dir)
        });

    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = Utf8PathBuf::try_from(entry.into_path())
            .map_err(|e| CliError::NonUtf8Path(e.into_path_buf()))?;
        if path.as_str().ends_with(GOX_EXTENSION) {
            files.push(path);
        }
    }
    Ok(())
}

/// `foo.gox` becomes `foo_gox.go`; `foo_test.gox` becomes `foo_gox_test.go`
/// so `go test` still sees a test file.
pub fn output_path(input: &Utf8Path, output_dir: Option<&Utf8Path>) -> Utf8PathBuf {
    let file_name = input.file_name().unwrap_or(input.as_str());
    let base = file_name.strip_suffix(GOX_EXTENSION).unwrap_or(file_name);
    let output_name = match base.strip_suffix("_test") {
        Some(stem) => format!("{stem}_gox_test.go"),
        None => format!("{base}_gox.go"),
    };

    match output_dir {
        Some(dir) => dir.join(output_name),
        None => input
            .parent()
            .map_or_else(|| Utf8PathBuf::from(&output_name), |dir| dir.join(&output_name)),
    }
}

/// Whether a path names a generated file.
pub fn is_generated_path(path: &str) -> bool {
    path.ends_with("_gox.go") || path.ends_with("_gox_test.go")
}

/// Resolves `path` against `base` and removes `.` and `..` components.
pub fn absolute(base: &Utf8Path, path: &Utf8Path) -> Utf8PathBuf {
    let joined = if path.is_absolute() {
        path.to_owned()
    } else {
        base.join(path)
    };

    let mut clean = Utf8PathBuf::new();
    for component in joined.components() {
        match component {
            Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                clean.pop();
            }
            other => clean.push(other.as_str()),
        }
    }
    clean
}

/// The process working directory as a UTF-8 path.
pub fn current_dir() -> Result<Utf8PathBuf, CliError> {
    let dir = std::env::current_dir().map_err(|source| CliError::Read {
        path: Utf8PathBuf::from("."),
        source,
    })?;
    Utf8PathBuf::try_from(dir).map_err(|e| CliError::NonUtf8Path(e.into_path_buf()))
}

fn display_path(path: &Utf8Path) -> &Utf8Path {
    path.strip_prefix(".").unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(root: &Utf8Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, "package main\n").unwrap();
    }

    fn tree() -> (TempDir, Utf8PathBuf) {
        let temp = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp.path().to_path_buf()).unwrap();
        for file in [
            "main.gox",
            "main.go",
            "b.gox",
            "ui/card.gox",
            "ui/card_test.gox",
            "ui/deep/list.gox",
            ".hidden/x.gox",
            "_skip/y.gox",
            "vendor/v.gox",
            "testdata/t.gox",
            "node_modules/n.gox",
        ] {
            touch(&root, file);
        }
        (temp, root)
    }

    fn relative(root: &Utf8Path, files: &[Utf8PathBuf]) -> Vec<String> {
        files
            .iter()
            .map(|f| f.strip_prefix(root).unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_recursive_walk_skips_special_dirs() {
        let (_temp, root) = tree();
        let files = find_gox_files(&[format!("{root}/...")], &GlobSet::empty()).unwrap();
        assert_eq!(
            relative(&root, &files),
            vec![
                "b.gox",
                "main.gox",
                "ui/card.gox",
                "ui/card_test.gox",
                "ui/deep/list.gox"
            ]
        );
    }

    #[test]
    fn test_directory_is_not_recursive() {
        let (_temp, root) = tree();
        let files = find_gox_files(&[root.join("ui").to_string()], &GlobSet::empty()).unwrap();
        assert_eq!(relative(&root, &files), vec!["ui/card.gox", "ui/card_test.gox"]);

        let files = find_gox_files(&[root.to_string()], &GlobSet::empty()).unwrap();
        assert_eq!(relative(&root, &files), vec!["b.gox", "main.gox"]);
    }

    #[test]
    fn test_explicit_file_and_missing_path() {
        let (_temp, root) = tree();
        let file = root.join("ui/deep/list.gox").to_string();
        let files = find_gox_files(&[file], &GlobSet::empty()).unwrap();
        assert_eq!(relative(&root, &files), vec!["ui/deep/list.gox"]);

        let missing = root.join("nope").to_string();
        let err = find_gox_files(&[missing], &GlobSet::empty()).unwrap_err();
        assert!(matches!(err, CliError::Read { .. }));
    }

    #[test]
    fn test_ignore_patterns() {
        let (_temp, root) = tree();
        let ignore = ignore_set(&["**/*_test.gox".to_string(), "**/deep/**".to_string()]).unwrap();
        let files = find_gox_files(&[format!("{root}/...")], &ignore).unwrap();
        assert_eq!(
            relative(&root, &files),
            vec!["b.gox", "main.gox", "ui/card.gox"]
        );
        assert!(ignore_set(&["[".to_string()]).is_err());
    }

    #[test]
    fn test_output_path() {
        let cases = [
            ("foo.gox", None, "foo_gox.go"),
            ("ui/card.gox", None, "ui/card_gox.go"),
            ("ui/card_test.gox", None, "ui/card_gox_test.go"),
            ("ui/card.gox", Some("gen"), "gen/card_gox.go"),
            ("/abs/x_test.gox", Some("/out"), "/out/x_gox_test.go"),
        ];
        for (input, dir, expected) in cases {
            let out = output_path(Utf8Path::new(input), dir.map(Utf8Path::new));
            assert_eq!(out.as_str(), expected, "{input}");
        }
    }

    #[test]
    fn test_is_generated_path() {
        assert!(is_generated_path("./ui/card_gox.go"));
        assert!(is_generated_path("card_gox_test.go"));
        assert!(!is_generated_path("card.go"));
        assert!(!is_generated_path("gox.go"));
    }

    #[test]
    fn test_absolute_cleans_components() {
        let base = Utf8Path::new("/work/app");
        assert_eq!(absolute(base, Utf8Path::new("./ui/a_gox.go")).as_str(), "/work/app/ui/a_gox.go");
        assert_eq!(absolute(base, Utf8Path::new("../lib/b.go")).as_str(), "/work/lib/b.go");
        assert_eq!(absolute(base, Utf8Path::new("/etc/x.go")).as_str(), "/etc/x.go");
    }
}
