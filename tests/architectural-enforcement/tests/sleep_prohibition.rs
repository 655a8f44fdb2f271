//! Integration Test: Sleep Prohibition
//!
//! **Policy**: Gateway production code never sleeps. Tasks wait on the
//! upstream socket, on channels, or on shutdown signals; pacing with a timer
//! would hold back every other session sharing the runtime.
//!
//! **Exceptions**: test code

use architectural_enforcement::{assert_clean, code_part, scan};

#[test]
fn test_no_sleep_in_production_code() {
    let violations = scan(|lines, idx| {
        let code = code_part(lines[idx]);
        code.contains("::sleep(") || code.contains(".sleep(")
    });

    assert_clean("Sleep calls (wait on I/O or channels instead)", &violations);
}
