//! Integration tests for the `gox` binary.
//!
//! Each test builds a small project in a temp dir and runs the binary in it
//! with `--no-format`, so no Go toolchain is needed.

use pretty_assertions::assert_eq;
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

// ============================================================================
// TEST INFRASTRUCTURE
// ============================================================================

const CARD: &str = "package main

func Card(name string) gox.Node {
\treturn <p>{nme}</p>
}
";

const CARD_GENERATED: &str = "package main

import \"github.com/germtb/gox\"

func Card(name string) gox.Node {
\treturn gox.Element(\"p\", nil,
\t\tgox.V(nme))
}
";

fn gox_command(dir: &Path, args: &[&str]) -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_gox"));
    command
        .args(args)
        .current_dir(dir)
        .env_remove("GOX_VERBOSE")
        .env_remove("GOX_RUNTIME");
    command
}

fn gox(dir: &Path, args: &[&str]) -> Output {
    gox_command(dir, args).output().expect("failed to run gox")
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (path, contents) in files {
        let path = temp.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }
    temp
}

/// The working directory as the binary sees it.
fn canonical(dir: &Path) -> PathBuf {
    dir.canonicalize().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

// ============================================================================
// GENERATE
// ============================================================================

#[test]
fn test_generate_writes_go_file_and_map() {
    let temp = project(&[("views/card.gox", CARD), ("main.go", "package main\n")]);
    let output = gox(temp.path(), &["generate", "--no-format", "./..."]);
    assert!(output.status.success(), "{}", stderr(&output));

    let generated = fs::read_to_string(temp.path().join("views/card_gox.go")).unwrap();
    assert_eq!(generated, CARD_GENERATED);

    let map: Value = serde_json::from_str(
        &fs::read_to_string(temp.path().join("views/card_gox.go.map")).unwrap(),
    )
    .unwrap();
    let root = canonical(temp.path());
    assert_eq!(
        map["sourceFile"].as_str(),
        root.join("views/card.gox").to_str()
    );
    assert_eq!(
        map["targetFile"].as_str(),
        root.join("views/card_gox.go").to_str()
    );
    // `nme` on source line 3, column 12 is on generated line 6, column 8.
    assert_eq!(map["sourceToTarget"]["3"]["12"]["line"], 6);
    assert_eq!(map["sourceToTarget"]["3"]["12"]["column"], 8);
}

#[test]
fn test_generate_names_test_files_for_go_test() {
    let temp = project(&[
        ("page_test.gox", "package main\n\nvar v = <br/>\n"),
        ("page.gox", "package main\n\nvar w = <hr/>\n"),
    ]);
    let output = gox(temp.path(), &["generate", "--no-format"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(temp.path().join("page_gox_test.go").exists());
    assert!(temp.path().join("page_gox.go").exists());
    assert!(!temp.path().join("page_test_gox.go").exists());
}

#[test]
fn test_generate_into_output_dir_with_runtime() {
    let temp = project(&[("ui/card.gox", CARD)]);
    let output = gox(
        temp.path(),
        &[
            "generate",
            "--no-format",
            "-o",
            "gen",
            "--runtime",
            "example.com/ui/v2",
            "ui/card.gox",
        ],
    );
    assert!(output.status.success(), "{}", stderr(&output));

    let generated = fs::read_to_string(temp.path().join("gen/card_gox.go")).unwrap();
    assert!(generated.contains("import \"example.com/ui/v2\""));
    assert!(generated.contains("ui.Element(\"p\", nil,"));
    assert!(!temp.path().join("ui/card_gox.go").exists());
}

#[test]
fn test_parse_errors_fail_but_other_files_are_written() {
    let temp = project(&[
        ("bad.gox", "package main\n\nvar v = <a></b>\n"),
        ("good.gox", "package main\n\nvar v = <b/>\n"),
    ]);
    let output = gox(temp.path(), &["generate", "--no-format", "."]);
    assert_eq!(output.status.code(), Some(1));

    let stderr = stderr(&output);
    assert!(stderr.contains("bad.gox:3:"), "{stderr}");
    assert!(
        stderr.contains("mismatched closing tag: expected </a>, got </b>"),
        "{stderr}"
    );
    assert!(stderr.contains("gox: 1 file(s) failed"), "{stderr}");
    assert!(temp.path().join("good_gox.go").exists());
    assert!(!temp.path().join("bad_gox.go").exists());
}

#[test]
fn test_no_files_found() {
    let temp = project(&[("main.go", "package main\n")]);
    let output = gox(temp.path(), &["generate"]);
    assert!(output.status.success());
    assert!(stderr(&output).contains("No .gox files found"));
}

// ============================================================================
// OVERLAY
// ============================================================================

#[test]
fn test_overlay_leaves_source_tree_untouched() {
    let temp = project(&[("views/card.gox", CARD)]);
    let output = gox(temp.path(), &["generate", "--no-format", "--overlay", "./..."]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(!temp.path().join("views/card_gox.go").exists());

    let overlay: Value = serde_json::from_slice(&output.stdout).unwrap();
    let replace = overlay["Replace"].as_object().unwrap();
    assert_eq!(replace.len(), 1);

    let target = canonical(temp.path()).join("views/card_gox.go");
    let replacement = PathBuf::from(replace[target.to_str().unwrap()].as_str().unwrap());
    assert!(replacement.ends_with("views/card_gox.go"));
    assert_eq!(fs::read_to_string(&replacement).unwrap(), CARD_GENERATED);

    let mut map_path = replacement.clone().into_os_string();
    map_path.push(".map");
    assert!(Path::new(&map_path).exists());

    let overlay_dir = replacement.parent().and_then(Path::parent).unwrap();
    fs::remove_dir_all(overlay_dir).unwrap();
}

#[test]
fn test_overlay_file() {
    let temp = project(&[("card.gox", CARD)]);
    let output = gox(
        temp.path(),
        &["generate", "--no-format", "--overlay", "--overlay-file", "overlay.json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(output.stdout.is_empty());

    let overlay: Value =
        serde_json::from_str(&fs::read_to_string(temp.path().join("overlay.json")).unwrap())
            .unwrap();
    let replacement = overlay["Replace"]
        .as_object()
        .and_then(|replace| replace.values().next())
        .and_then(Value::as_str)
        .map(PathBuf::from)
        .unwrap();
    assert!(replacement.exists());
    fs::remove_dir_all(replacement.parent().unwrap()).unwrap();
}

// ============================================================================
// REMAP
// ============================================================================

#[test]
fn test_remap_rewrites_generated_positions() {
    let temp = project(&[("card.gox", CARD)]);
    let output = gox(temp.path(), &["generate", "--no-format", "card.gox"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let mut child = gox_command(temp.path(), &["remap", "--map", "card_gox.go.map"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"# example.com/app\n./card_gox.go:7:9: undefined: nme\nmain.go:1:1: other\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success(), "{}", stderr(&output));

    let source = canonical(temp.path()).join("card.gox");
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!(
            "# example.com/app\n{}:4:13: undefined: nme\nmain.go:1:1: other\n",
            source.display()
        )
    );
}

#[test]
fn test_version() {
    let temp = TempDir::new().unwrap();
    let output = gox(temp.path(), &["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), format!("gox {}", env!("CARGO_PKG_VERSION")));
}
