//! Integration Test: Print Prohibition
//!
//! **Policy**: Gateway production code reports through `tracing`, never by
//! writing to stdout or stderr directly.

use architectural_enforcement::{assert_clean, code_part, scan};

const FORBIDDEN: &[&str] = &["println!(", "eprintln!(", "print!(", "eprint!(", "dbg!("];

#[test]
fn test_no_print_macros_in_production_code() {
    let violations = scan(|lines, idx| {
        let code = code_part(lines[idx]);
        FORBIDDEN.iter().any(|pattern| code.contains(pattern))
    });

    assert_clean("Direct printing (use tracing)", &violations);
}
