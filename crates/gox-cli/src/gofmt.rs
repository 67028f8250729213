//! `gofmt` as a [`GoFormatter`].

use gox_generator::{FormatError, GoFormatter};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Formats Go source by piping it through the `gofmt` binary.
#[derive(Debug, Clone)]
pub struct Gofmt {
    path: PathBuf,
}

impl Gofmt {
    /// Finds `gofmt` on PATH.
    pub fn locate() -> Option<Self> {
        which::which("gofmt").ok().map(|path| Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GoFormatter for Gofmt {
    fn format(&self, source: &str) -> Result<String, FormatError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| FormatError::Unavailable(format!("{}: {e}", self.path.display())))?;

        // gofmt reads all of stdin before writing anything.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(source.as_bytes())?;
        }
        let output = child.wait_with_output()?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FormatError::Rejected(stderr.trim().replace("<standard input>", "")));
        }
        String::from_utf8(output.stdout)
            .map_err(|e| FormatError::Rejected(format!("gofmt produced invalid UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gofmt_formats_valid_source() {
        let Some(gofmt) = Gofmt::locate() else {
            eprintln!("gofmt not installed, skipping");
            return;
        };
        let formatted = gofmt
            .format("package main\nfunc main(){\nx:=1\n_ = x}\n")
            .unwrap();
        assert!(formatted.contains("func main() {\n\tx := 1\n\t_ = x\n}\n"), "{formatted}");
    }

    #[test]
    fn test_gofmt_rejects_invalid_source() {
        let Some(gofmt) = Gofmt::locate() else {
            eprintln!("gofmt not installed, skipping");
            return;
        };
        let err = gofmt.format("package main\nfunc (\n").unwrap_err();
        assert!(matches!(err, FormatError::Rejected(_)), "{err:?}");
    }

    #[test]
    fn test_missing_binary_is_unavailable() {
        let gofmt = Gofmt {
            path: PathBuf::from("/nonexistent/gofmt"),
        };
        let err = gofmt.format("package main\n").unwrap_err();
        assert!(matches!(err, FormatError::Unavailable(_)), "{err:?}");
    }
}
