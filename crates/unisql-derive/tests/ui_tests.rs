//! UI tests for the derive macros using trybuild
//!
//! Valid records compile; misuse fails with a message pointing at the
//! offending tokens.

#[test]
fn ui_pass_tests() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/pass/*.rs");
}

#[test]
fn ui_fail_tests() {
    let t = trybuild::TestCases::new();
    t.compile_fail("tests/ui/fail/*.rs");
}
