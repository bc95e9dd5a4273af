#[test]
#[cfg_attr(
    miri,
    ignore = "trybuild launches subprocesses and is unsupported under miri"
)]
fn ui_derive_expansions() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/pass/*.rs");
    t.compile_fail("tests/ui/fail/*.rs");
}
