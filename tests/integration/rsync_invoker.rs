#![cfg(unix)]

use backupy::config::OptionValue;
use backupy::{RsyncInvoker, RunOutcome, SyncInvoker};
use indexmap::IndexMap;
use std::path::Path;

use crate::helpers::write_fake_tool;

fn options() -> IndexMap<String, OptionValue> {
    IndexMap::from([
        ("--archive".to_owned(), OptionValue::Switch(true)),
        ("--exclude".to_owned(), OptionValue::Value("*.tmp".to_owned())),
        ("--delete".to_owned(), OptionValue::Value(String::new())),
        ("--dry-run".to_owned(), OptionValue::Switch(false)),
    ])
}

#[tokio::test]
async fn exit_zero_is_success_with_stdout_lines() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool = write_fake_tool(
        temp.path(),
        "fake-rsync",
        "for arg in \"$@\"; do echo \"$arg\"; done\necho 'ignored' >&2",
    );

    let invoker = RsyncInvoker::new(tool.display().to_string()).expect("invoker");
    let report = invoker
        .invoke("/home/a", Path::new("/mnt/b/a"), &options())
        .await;

    assert_eq!(report.outcome, RunOutcome::Success);
    assert_eq!(report.exit_code, Some(0));
    assert_eq!(
        report.output,
        vec!["--archive", "--exclude=*.tmp", "--delete", "/home/a", "/mnt/b/a"]
    );
}

#[tokio::test]
async fn non_zero_exit_is_failed_with_stderr_lines() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool = write_fake_tool(
        temp.path(),
        "fake-rsync",
        "echo 'progress' \necho 'rsync: change_dir failed' >&2\necho 'rsync error: some files' >&2\nexit 2",
    );

    let invoker = RsyncInvoker::new(tool.display().to_string()).expect("invoker");
    let report = invoker
        .invoke("/home/a", Path::new("/mnt/b/a"), &IndexMap::new())
        .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.exit_code, Some(2));
    assert_eq!(
        report.output,
        vec!["rsync: change_dir failed", "rsync error: some files"]
    );
    assert_eq!(invoker.tool_name(), "fake-rsync");
}

#[tokio::test]
async fn non_executable_tool_is_failed_not_error() {
    let temp = tempfile::tempdir().expect("tempdir");
    let path = temp.path().join("not-executable");
    std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("write");

    let invoker = RsyncInvoker::new(path.display().to_string()).expect("invoker");
    let report = invoker
        .invoke("/home/a", Path::new("/mnt/b/a"), &IndexMap::new())
        .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.exit_code, None);
    assert_eq!(report.output.len(), 1);
}

#[tokio::test]
async fn killed_tool_is_failed_without_exit_code() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool = write_fake_tool(temp.path(), "fake-rsync", "kill -9 $$");

    let invoker = RsyncInvoker::new(tool.display().to_string()).expect("invoker");
    let report = invoker
        .invoke("/home/a", Path::new("/mnt/b/a"), &IndexMap::new())
        .await;

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.exit_code, None);
    assert!(
        report.output.last().is_some_and(|l| l.contains("without an exit code")),
        "output was: {:?}",
        report.output
    );
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_stall() {
    let temp = tempfile::tempdir().expect("tempdir");
    let tool = write_fake_tool(
        temp.path(),
        "fake-rsync",
        "i=0\nwhile [ $i -lt 20000 ]; do echo \"out $i\"; echo \"err $i\" >&2; i=$((i+1)); done\nexit 1",
    );

    let invoker = RsyncInvoker::new(tool.display().to_string()).expect("invoker");
    let report = tokio::time::timeout(
        std::time::Duration::from_secs(60),
        invoker.invoke("/home/a", Path::new("/mnt/b/a"), &IndexMap::new()),
    )
    .await
    .expect("invoke finished");

    assert_eq!(report.outcome, RunOutcome::Failed);
    assert_eq!(report.output.len(), 20_000);
    assert_eq!(report.output[19_999], "err 19999");
}
