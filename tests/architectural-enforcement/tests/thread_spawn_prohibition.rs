//! Integration Test: Thread Spawn Prohibition
//!
//! **Policy**: All gateway work runs as tokio tasks on one runtime. No part
//! of the gateway starts OS threads or blocking-pool jobs of its own.

use architectural_enforcement::{assert_clean, code_part, scan};

const FORBIDDEN: &[&str] = &[
    "thread::spawn(",
    "thread::Builder",
    "spawn_blocking(",
    "block_in_place(",
];

#[test]
fn test_no_thread_spawn_in_production_code() {
    let violations = scan(|lines, idx| {
        let code = code_part(lines[idx]);
        FORBIDDEN.iter().any(|pattern| code.contains(pattern))
    });

    assert_clean("OS thread usage (use tokio::spawn)", &violations);
}
