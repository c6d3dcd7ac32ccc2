use std::fs;
use std::process::{Command, Output};

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sb-cli"))
        .args(args)
        .env("SB_LOG", "off")
        .output()
        .expect("cli should execute")
}

fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn eval_file_prints_value_json() {
    let path = std::env::temp_dir().join(format!("scriptbridge-rs-cli-{}.rhai", std::process::id()));
    fs::write(&path, "let area = width * height;\n#{ area: area, unit: \"m2\" }")
        .expect("script should be written");

    let output = run(&[
        "eval",
        "--file",
        path.to_string_lossy().as_ref(),
        "--bind",
        "width=3",
        "--bind",
        "height=4",
    ]);
    let _ = fs::remove_file(&path);

    assert!(
        output.status.success(),
        "stdout:\n{}\nstderr:\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:OK");
    assert_eq!(lines[1], r#"VALUE_JSON:{"area":12,"unit":"m2"}"#);
}

#[test]
fn script_failure_prints_code_message_and_frames() {
    let output = run(&[
        "eval",
        "--code",
        "fn inner() { throw \"bad input\" }\nfn outer() { inner() }\nouter()",
        "--filename",
        "job.rhai",
    ]);
    assert_eq!(output.status.code(), Some(1));

    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:ERROR");
    assert_eq!(lines[1], "ERROR_CODE:EVAL_SCRIPT_FAILURE");
    assert_eq!(lines[2], r#"ERROR_MSG_JSON:"bad input""#);
    let frames = lines
        .iter()
        .filter(|line| line.starts_with("ERROR_FRAME:"))
        .collect::<Vec<_>>();
    assert_eq!(frames.len(), 3);
    assert!(frames.iter().all(|line| line.contains("job.rhai")));
    assert!(frames[2].contains("outer"));
}

#[test]
fn time_limit_reports_timeout() {
    let output = run(&["eval", "--code", "loop {}", "--time-limit-ms", "100"]);
    assert_eq!(output.status.code(), Some(1));
    let lines = stdout_lines(&output);
    assert_eq!(lines[0], "RESULT:ERROR");
    assert_eq!(lines[1], "ERROR_CODE:EVAL_TIMEOUT");
}

#[test]
fn invalid_binding_is_rejected_before_evaluation() {
    let output = run(&["eval", "--code", "1", "--bind", "size=not-json"]);
    assert_eq!(output.status.code(), Some(1));
    let lines = stdout_lines(&output);
    assert_eq!(lines[1], "ERROR_CODE:CLI_BIND_INVALID");
}

#[test]
fn backends_lists_registered_identifiers() {
    let output = run(&["backends"]);
    assert!(output.status.success());
    assert_eq!(
        stdout_lines(&output),
        vec!["RESULT:OK", "BACKEND:rhai", "BACKEND:rhai-raw"]
    );
}
