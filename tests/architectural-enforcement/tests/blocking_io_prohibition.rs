//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: Async functions in gateway production code must not use
//! blocking I/O. Use `tokio::net`, `tokio::fs` and the async `reqwest` client.
//!
//! **Exceptions**: non-async functions (configuration is read before the
//! server starts), test code

use architectural_enforcement::{assert_clean, code_part, is_in_async_function, scan};

const FORBIDDEN: &[&str] = &[
    "std::fs::",
    "std::net::TcpStream",
    "std::net::TcpListener",
    "reqwest::blocking",
    "std::io::stdin",
];

#[test]
fn test_no_blocking_io_in_async_code() {
    let violations = scan(|lines, idx| {
        let code = code_part(lines[idx]);
        FORBIDDEN.iter().any(|pattern| code.contains(pattern)) && is_in_async_function(lines, idx)
    });

    assert_clean("Blocking I/O in async code", &violations);
}

#[test]
fn test_no_blocking_http_client_anywhere() {
    let violations = scan(|lines, idx| code_part(lines[idx]).contains("reqwest::blocking"));

    assert_clean("Blocking HTTP client", &violations);
}
