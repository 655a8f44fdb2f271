//! Architectural Enforcement Integration Tests
//!
//! Source scanners that keep the gateway inside its concurrency model:
//! - No OS threads; everything runs as tasks on the tokio runtime
//! - No sleeping; tasks only wait on I/O or channels
//! - No blocking I/O inside async functions
//! - No printing; all output goes through `tracing`
//!
//! Only production code is scanned. Inline test modules (everything from the
//! `#[cfg(test)] mod tests {` line to the end of the file) and test-only files
//! are skipped.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Source trees that make up the shipped gateway
pub const PRODUCTION_DIRS: &[&str] = &["gateway/core/src", "gateway/daemon/src"];

/// Files compiled only under `#[cfg(test)]`
const TEST_ONLY_FILES: &[&str] = &["test_support.rs", "tests.rs"];

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File, relative to the workspace root
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// The trimmed source line
    pub text: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root, two levels above this crate
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("..").join("..")
}

/// All production `.rs` files, relative to the workspace root
#[must_use]
pub fn production_sources() -> Vec<PathBuf> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(Result::ok)
        {
            let file = entry.path();
            if file.extension().and_then(|s| s.to_str()) != Some("rs") {
                continue;
            }
            let name = file.file_name().and_then(|s| s.to_str()).unwrap_or("");
            if TEST_ONLY_FILES.contains(&name) {
                continue;
            }
            files.push(file.strip_prefix(&root).unwrap_or(file).to_path_buf());
        }
    }

    files.sort();
    files
}

/// Strip a trailing `//` comment; doc comments become empty
///
/// A `//` inside a string or char literal (`"http://..."`) is code, not a
/// comment start.
#[must_use]
pub fn code_part(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut in_string = false;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if in_string => i += 1,
            b'"' => in_string = !in_string,
            b'\'' if !in_string => {
                // 'x' and '\x' are char literals; a lifetime has no closing quote
                if bytes.get(i + 1) == Some(&b'\\') {
                    if let Some(end) = bytes
                        .get(i + 3..)
                        .and_then(|rest| rest.iter().position(|&b| b == b'\''))
                    {
                        i += 3 + end;
                    }
                } else if bytes.get(i + 2) == Some(&b'\'') {
                    i += 2;
                }
            }
            b'/' if !in_string && bytes.get(i + 1) == Some(&b'/') => return &line[..i],
            _ => {}
        }
        i += 1;
    }
    line
}

/// Index of the `#[cfg(test)]` line opening an inline test module
///
/// A `#[cfg(test)]` on an out-of-line `mod foo;` declaration does not count.
/// Returns the line count when the file has no inline test module.
#[must_use]
pub fn production_end(lines: &[&str]) -> usize {
    lines
        .iter()
        .enumerate()
        .position(|(idx, line)| {
            line.trim_start().starts_with("#[cfg(test)]")
                && lines.get(idx + 1).is_some_and(|next| {
                    let next = next.trim();
                    next.starts_with("mod ") && next.ends_with('{')
                })
        })
        .unwrap_or(lines.len())
}

/// Whether the nearest enclosing `fn` above `idx` is `async`
#[must_use]
pub fn is_in_async_function(lines: &[&str], idx: usize) -> bool {
    for line in lines[..=idx].iter().rev() {
        let code = code_part(line);
        if let Some(pos) = code.find("fn ") {
            return code[..pos].contains("async");
        }
    }
    false
}

/// Scan every production file with `check`
///
/// `check` receives the file's lines and the index of a production line
/// and returns true when that line violates the rule.
pub fn scan<F>(check: F) -> Vec<Violation>
where
    F: Fn(&[&str], usize) -> bool,
{
    let root = workspace_root();
    let mut violations = Vec::new();

    for path in production_sources() {
        let Ok(content) = fs::read_to_string(root.join(&path)) else {
            continue;
        };
        let lines: Vec<&str> = content.lines().collect();

        for idx in 0..production_end(&lines) {
            if check(&lines, idx) {
                violations.push(Violation {
                    path: path.clone(),
                    line: idx + 1,
                    text: lines[idx].trim().to_string(),
                });
            }
        }
    }

    violations
}

/// Panic with a readable report if `violations` is not empty
pub fn assert_clean(rule: &str, violations: &[Violation]) {
    if violations.is_empty() {
        return;
    }
    let report: Vec<String> = violations.iter().map(|v| format!("  {v}")).collect();
    panic!(
        "\n{rule}: {} violation(s) in production code\n{}\n",
        violations.len(),
        report.join("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_sources_found() {
        let files = production_sources();
        assert!(files
            .iter()
            .any(|f| f.ends_with("gateway/core/src/aggregator.rs")));
        assert!(!files.iter().any(|f| f.ends_with("test_support.rs")));
    }

    #[test]
    fn test_production_end_stops_at_test_module() {
        let lines = ["fn a() {}", "", "#[cfg(test)]", "mod tests {", "}"];
        assert_eq!(production_end(&lines), 2);
        assert_eq!(production_end(&lines[..2]), 2);

        let lines = ["#[cfg(test)]", "mod test_support;", "fn main() {}"];
        assert_eq!(production_end(&lines), 3);
    }

    #[test]
    fn test_async_function_detection() {
        let lines = [
            "pub async fn run() {",
            "    work();",
            "}",
            "fn helper() {",
            "    // async fn in a comment",
            "    other();",
            "}",
        ];
        assert!(is_in_async_function(&lines, 1));
        assert!(!is_in_async_function(&lines, 5));
    }

    #[test]
    fn test_code_part_drops_comments() {
        assert_eq!(code_part("let x = 1; // sleep(1)"), "let x = 1; ");
        assert_eq!(code_part("/// docs"), "");
    }

    #[test]
    fn test_code_part_keeps_slashes_inside_literals() {
        let line = r#"let url = "http://x"; std::thread::spawn(f); // note"#;
        assert_eq!(
            code_part(line),
            r#"let url = "http://x"; std::thread::spawn(f); "#
        );
        assert_eq!(code_part(r#"f("a\"//b"); // c"#), r#"f("a\"//b"); "#);
        assert_eq!(code_part("let q = '\"'; g(\"//\"); // c"), "let q = '\"'; g(\"//\"); ");
        assert_eq!(code_part("let q = '\\''; // c"), "let q = '\\''; ");
        assert_eq!(code_part("fn f<'a>(s: &'a str) {} // c"), "fn f<'a>(s: &'a str) {} ");
    }
}
