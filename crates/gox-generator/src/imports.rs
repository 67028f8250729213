//! Runtime import injection.

/// Generated code with the runtime import added.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ImportInjection {
    pub code: String,
    /// `(after_line, delta)` target line shifts, applied in order.
    pub shifts: Vec<(u32, u32)>,
}

/// Adds `import "<package>"` to `code`.
///
/// The path is added to an existing `import (...)` block, a single import is
/// converted into a block, or a new import is placed after the `package`
/// clause. Returns `None` if the path is already imported or the code has no
/// `package` clause.
pub(crate) fn insert_runtime_import(code: &str, package: &str) -> Option<ImportInjection> {
    let quoted = format!("\"{package}\"");
    if code.contains(&quoted) {
        return None;
    }

    let lines: Vec<(usize, &str)> = code
        .split_inclusive('\n')
        .scan(0, |offset, line| {
            let start = *offset;
            *offset += line.len();
            Some((start, line))
        })
        .collect();

    let package_line = lines.iter().position(|(_, line)| is_package_clause(line))?;
    let (package_start, package_text) = lines[package_line];
    if !package_text.ends_with('\n') {
        return None;
    }
    let after_package = package_start + package_text.len();

    let Some(import_line) = find_import(&lines, package_line + 1) else {
        let code = format!(
            "{}\nimport {quoted}\n{}",
            &code[..after_package],
            &code[after_package..]
        );
        return Some(ImportInjection {
            code,
            shifts: vec![(package_line as u32, 2)],
        });
    };

    let (line_start, line) = lines[import_line];
    let line_no = import_line as u32;
    let content = line.trim_end_matches(['\n', '\r']);
    let spec = content.trim_start()["import".len()..].trim();

    if let Some(inside) = spec.strip_prefix('(') {
        let paren = line_start + content.find('(')? + 1;
        let rest = inside.trim();
        let (insert, delta) = if rest.is_empty() || rest.starts_with("//") {
            (format!("\n\t{quoted}"), 1)
        } else {
            (format!("\n\t{quoted}\n"), 2)
        };
        return Some(ImportInjection {
            code: format!("{}{insert}{}", &code[..paren], &code[paren..]),
            shifts: vec![(line_no, delta)],
        });
    }

    let block = format!("import (\n\t{quoted}\n\t{spec}\n)");
    let content_end = line_start + content.len();
    Some(ImportInjection {
        code: format!("{}{block}{}", &code[..line_start], &code[content_end..]),
        // The original line lands on the third line of the block.
        shifts: vec![(line_no, 1), (line_no - 1, 2)],
    })
}

fn is_package_clause(line: &str) -> bool {
    line.strip_prefix("package")
        .is_some_and(|rest| rest.starts_with([' ', '\t']))
}

/// Finds an `import` declaration before any other declaration.
fn find_import(lines: &[(usize, &str)], from: usize) -> Option<usize> {
    let mut in_comment = false;
    for (index, (_, line)) in lines.iter().enumerate().skip(from) {
        let trimmed = line.trim();
        if in_comment {
            in_comment = !trimmed.contains("*/");
            continue;
        }
        if trimmed.is_empty() || trimmed.starts_with("//") {
            continue;
        }
        if trimmed.starts_with("/*") {
            in_comment = !trimmed.contains("*/");
            continue;
        }
        let is_import = trimmed
            .strip_prefix("import")
            .is_some_and(|rest| rest.starts_with([' ', '\t', '(']));
        return is_import.then_some(index);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PKG: &str = "github.com/germtb/gox";

    fn inject(code: &str) -> Option<(String, Vec<(u32, u32)>)> {
        insert_runtime_import(code, PKG).map(|i| (i.code, i.shifts))
    }

    #[test]
    fn test_fresh_import() {
        assert_eq!(
            inject("package main\n\nfunc f() {}\n"),
            Some((
                "package main\n\nimport \"github.com/germtb/gox\"\n\nfunc f() {}\n".to_string(),
                vec![(0, 2)]
            ))
        );
    }

    #[test]
    fn test_fresh_import_when_declaration_comes_first() {
        let (code, shifts) = inject("package main\n\nvar x = 1\n\nimport \"fmt\"\n").unwrap();
        assert!(code.starts_with("package main\n\nimport \"github.com/germtb/gox\"\n\nvar x"));
        assert_eq!(shifts, vec![(0, 2)]);
    }

    #[test]
    fn test_append_to_block() {
        assert_eq!(
            inject("package main\n\nimport (\n\t\"fmt\"\n)\n"),
            Some((
                "package main\n\nimport (\n\t\"github.com/germtb/gox\"\n\t\"fmt\"\n)\n".to_string(),
                vec![(2, 1)]
            ))
        );
    }

    #[test]
    fn test_append_to_one_line_block() {
        let (code, shifts) = inject("package main\nimport (\"fmt\")\n").unwrap();
        assert_eq!(
            code,
            "package main\nimport (\n\t\"github.com/germtb/gox\"\n\"fmt\")\n"
        );
        assert_eq!(shifts, vec![(1, 2)]);
    }

    #[test]
    fn test_single_import_becomes_block() {
        assert_eq!(
            inject("package main\n\nimport \"fmt\"\n\nfunc f() {}\n"),
            Some((
                "package main\n\nimport (\n\t\"github.com/germtb/gox\"\n\t\"fmt\"\n)\n\nfunc f() {}\n"
                    .to_string(),
                vec![(2, 1), (1, 2)]
            ))
        );
    }

    #[test]
    fn test_single_aliased_import() {
        let (code, _) = inject("package main\n// doc\nimport str \"strings\"\n").unwrap();
        assert_eq!(
            code,
            "package main\n// doc\nimport (\n\t\"github.com/germtb/gox\"\n\tstr \"strings\"\n)\n"
        );
    }

    #[test]
    fn test_already_imported() {
        assert_eq!(inject("package main\n\nimport \"github.com/germtb/gox\"\n"), None);
        assert_eq!(
            inject("package main\n\nimport (\n\tg \"github.com/germtb/gox\"\n)\n"),
            None
        );
    }

    #[test]
    fn test_without_package_clause() {
        assert_eq!(inject("x := gox.Text(\"a\")\n"), None);
        assert_eq!(inject("packages := 1\n"), None);
    }
}
