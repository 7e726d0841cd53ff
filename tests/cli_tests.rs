// CLI: exit codes, output and miette diagnostics.
// Requires: assert_cmd, predicates crates in [dev-dependencies]

use assert_cmd::Command;
use predicates::{prelude::PredicateBooleanExt, str::contains};

fn metarule() -> Command {
    let mut cmd = Command::cargo_bin("metarule").unwrap();
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn tokens_lists_every_token() {
    metarule()
        .args(["tokens", "a -> 12"])
        .assert()
        .success()
        .stdout(contains("identifier").and(contains("'->'")).and(contains("end of input")));
}

#[test]
fn expr_prints_parenthesized_tree() {
    metarule()
        .args(["expr", "a - b + c"])
        .assert()
        .success()
        .stdout(contains("((a - b) + c)"));
}

#[test]
fn expr_evaluates_with_bindings() {
    metarule()
        .args(["expr", "12 - (97 - x) + 121", "--eval", "--var", "x=11"])
        .assert()
        .success()
        .stdout(contains("= 47"));
}

#[test]
fn expr_json_prints_match_tree() {
    metarule()
        .args(["expr", "a * b", "--json"])
        .assert()
        .success()
        .stdout(contains("\"Chain\""));
}

#[test]
fn expr_rejection_exits_nonzero() {
    metarule()
        .args(["expr", "a +"])
        .assert()
        .failure()
        .stdout(contains("rejected"));
}

#[test]
fn rule_prints_compiled_rule() {
    metarule()
        .args(["rule", "( $( $a:ident )* ) -> $body:expr"])
        .assert()
        .success()
        .stdout(contains("$body:@expression").and(contains("'->'")));
}

#[test]
fn match_prints_bindings() {
    metarule()
        .args([
            "match",
            "struct $name:ident { $( $field:ident : $ty:ident ; )* }",
            "struct point { x: i32; y: i32; }",
        ])
        .assert()
        .success()
        .stdout(
            contains("accepted")
                .and(contains("$field = x, y"))
                .and(contains("$name = point")),
        );
}

#[test]
fn match_rejection_exits_nonzero() {
    metarule()
        .args(["match", "struct $name:ident { }", "struct { }"])
        .assert()
        .failure()
        .stdout(contains("rejected"));
}

#[test]
fn lex_errors_render_miette_diagnostics() {
    metarule()
        .args(["expr", "a # b"])
        .assert()
        .failure()
        .stderr(contains("metarule::lex").or(contains("unexpected character")));
}

#[test]
fn eval_errors_render_miette_diagnostics() {
    metarule()
        .args(["expr", "1 / 0", "--eval"])
        .assert()
        .failure()
        .stderr(contains("division by zero"));
}

#[test]
fn depth_limit_is_configurable() {
    metarule()
        .args(["--max-depth", "3", "expr", "a"])
        .assert()
        .failure()
        .stdout(contains("rejected"));
}
