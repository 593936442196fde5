use assert_cmd::Command;
use predicates::str::contains;

fn cli() -> Command {
    Command::cargo_bin("artifortress-cli").expect("binary built")
}

#[test]
fn demo_walks_through_bootstrap_upload_and_publish() {
    cli()
        .arg("demo")
        .assert()
        .success()
        .stdout(contains("published version"))
        .stdout(contains("pending_outbox_count"));
}

#[test]
fn gc_dry_run_reports_counters_without_executing() {
    cli()
        .args(["gc"])
        .assert()
        .success()
        .stdout(contains("gc run:"))
        .stdout(contains("DryRun"));
}

#[test]
fn gc_execute_flag_runs_in_execute_mode() {
    cli()
        .args(["gc", "--execute"])
        .assert()
        .success()
        .stdout(contains("Execute"));
}

#[test]
fn ops_summary_emits_json_counters() {
    cli().arg("ops-summary").assert().success().stdout(contains("\"pending_outbox_count\""));
}

#[test]
fn reconcile_emits_json_report() {
    cli().arg("reconcile").assert().success().stdout(contains("\"orphan_blob_count\""));
}

#[test]
fn audit_lists_recorded_actions_for_the_seeded_tenant() {
    cli().arg("audit").assert().success().stdout(contains("repo.create"));
}

#[test]
fn audit_export_emits_jsonl() {
    cli().args(["audit", "--export"]).assert().success().stdout(contains("\"action\":\"repo.create\""));
}

#[test]
fn different_repo_key_flag_is_honored() {
    cli().args(["--repo-key", "other-lib", "gc"]).assert().success();
}
