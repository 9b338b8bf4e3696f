mod common;

#[allow(unused_imports)]
use common::{CommandOutput, TestContext};

// Resolves the latest release against the real GitHub API.
#[test]
#[cfg(feature = "e2e")]
fn e2e_dry_run_resolves_latest_release() {
    let ctx = TestContext::new();

    let output: CommandOutput = ctx
        .cmd()
        .args(["--dry-run", "--profile=server"])
        .output()
        .expect("Failed to run amem-install")
        .into();

    output.assert_success();
    assert!(
        output
            .stdout
            .contains("https://github.com/agentralabs/agentic-memory/releases/download/")
            || output.stdout.contains("would run: cargo install"),
        "Expected a release URL or source fallback plan\nstdout: {}\nstderr: {}",
        output.stdout,
        output.stderr
    );
}
