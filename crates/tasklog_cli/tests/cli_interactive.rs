use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("tasklog-{nanos}-{name}"))
}

fn run_interactive(name: &str, input: &str) -> std::process::Output {
    let dir = temp_dir(name);

    let mut child = Command::new(env!("CARGO_BIN_EXE_tasklog"))
        .env("TASKLOG_STORE_DIR", &dir)
        .env("TASKLOG_CONFIG_PATH", dir.join("config.json"))
        .env("TASKLOG_TODAY", "2024-06-10")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn interactive session");

    {
        let stdin = child.stdin.as_mut().expect("stdin");
        stdin
            .write_all(input.as_bytes())
            .expect("failed to write to stdin");
    }

    let output = child
        .wait_with_output()
        .expect("failed to read interactive output");

    std::fs::remove_dir_all(&dir).ok();
    output
}

#[test]
fn interactive_help_shows_usage() {
    let output = run_interactive("repl-help", "help\nexit\n");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage") || stdout.contains("USAGE"));
}

#[test]
fn interactive_invalid_command_keeps_running() {
    let output = run_interactive("repl-invalid", "nope\nstats --json\nexit\n");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("ERROR: invalid_input"));
    assert!(String::from_utf8_lossy(&output.stdout).contains("\"total\":0"));
}

#[test]
fn interactive_unterminated_quote_is_reported() {
    let output = run_interactive("repl-quote", "add \"oops\nexit\n");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unterminated quote"));
}

#[test]
fn interactive_filter_persists_between_lines() {
    let input = "add \"Write spec\"\nfilter last 7\nreport\nfilter clear\nreport\nquit\n";
    let output = run_interactive("repl-filter", input);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Filter: 最近 7 天 (2024-06-04 ~ 2024-06-10)"));
    assert!(stdout.contains("周报（2024年6月4日 ~ 2024年6月10日）"));
    assert!(stdout.contains("待完成任务（1）\n 1. Write spec"));
    assert!(stdout.contains("Filter: none"));
    assert!(stdout.contains("请先选择日期或最近 7 天筛选，再生成周报。"));
}

#[test]
fn interactive_ends_on_eof() {
    let output = run_interactive("repl-eof", "stats\n");
    assert!(output.status.success());
}

#[test]
fn interactive_preamble_override_applies_to_its_line() {
    let input = "add \"Write spec\"\n\
        report --last 7 --config-override preamble=CUSTOM --format prompt\n\
        report --last 7 --format prompt\n\
        exit\n";
    let output = run_interactive("repl-preamble", input);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("CUSTOM\n\n范围："));
    assert!(stdout.contains("你是一名UVM验证领域的专业写作助手"));
}

#[test]
fn interactive_filter_lists_configured_presets() {
    let input = "filter clear\nfilter clear --config-override quick_filters=5,14\nexit\n";
    let output = run_interactive("repl-presets", input);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("快速筛选: 最近 3 天 | 最近 7 天 | 最近 30 天"));
    assert!(stdout.contains("快速筛选: 最近 5 天 | 最近 14 天"));
}

#[test]
fn interactive_date_filter_shows_the_day() {
    let output = run_interactive("repl-date", "filter date 2024-06-01\nexit\n");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Filter: 2024年6月1日 (2024-06-01 ~ 2024-06-01)"));
}
