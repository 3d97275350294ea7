use std::io::Write;
use std::process::{Command, Output, Stdio};

fn cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_fbase85"))
}

fn run_with_stdin(args: &[&str], input: &[u8]) -> Output {
    let mut child = cmd()
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    {
        let mut stdin = child.stdin.take().unwrap();
        stdin.write_all(input).unwrap();
    }
    child.wait_with_output().unwrap()
}

#[test]
fn test_help() {
    let output = cmd().arg("--help").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage:"));
    assert!(stdout.contains("--decode"));
    assert!(stdout.contains("--ignore-garbage"));
    assert!(stdout.contains("--wrap"));
}

#[test]
fn test_version() {
    let output = cmd().arg("--version").output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("base85"));
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_encode_stdin() {
    let output = run_with_stdin(&[], b"Hello, World!");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"NM&qnZ!92JZ*pv8Ap");
}

#[test]
fn test_encode_empty_stdin() {
    let output = run_with_stdin(&[], b"");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn test_encode_wrap() {
    let output = run_with_stdin(&["-w", "3"], b"hello");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"Xk~\n0{Z\nv\n");
}

#[test]
fn test_decode_stdin() {
    let output = run_with_stdin(&["-d"], b"Xk~0{\nZv\n");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello");
}

#[test]
fn test_decode_ignore_garbage() {
    let output = run_with_stdin(&["-d", "-i"], b"Xk~0,{Zv\"");
    assert!(output.status.success());
    assert_eq!(output.stdout, b"hello");
}

#[test]
fn test_decode_invalid_character() {
    let output = run_with_stdin(&["--decode"], b"00\x010~");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("base85: invalid input: invalid character"));
    assert!(stderr.contains("position 2"));
    assert!(stderr.contains("00\\x010~"));
}

#[test]
fn test_decode_truncated_keeps_prior_output() {
    let output = run_with_stdin(&["-d"], b"Xk~0{0");
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(output.stdout, b"hell");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("truncated input"));
    assert!(stderr.contains("position 5"));
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let plain = dir.path().join("plain.bin");
    let data: Vec<u8> = (0..5000u32).map(|i| (i * 7 % 256) as u8).collect();
    std::fs::write(&plain, &data).unwrap();

    let encoded = cmd().arg(&plain).output().unwrap();
    assert!(encoded.status.success());
    assert_eq!(encoded.stdout.len(), 6250);

    let text = dir.path().join("plain.b85");
    std::fs::write(&text, &encoded.stdout).unwrap();
    let decoded = cmd().arg("-d").arg(&text).output().unwrap();
    assert!(decoded.status.success());
    assert_eq!(decoded.stdout, data);
}

#[test]
fn test_dash_reads_stdin() {
    let output = run_with_stdin(&["-"], &[0x4D]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"O#");
}

#[test]
fn test_diagnostics_use_gnu_name() {
    let output = run_with_stdin(&["-d"], b"0");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("base85: "));
    assert!(!stderr.contains("fbase85"));
}

#[test]
fn test_missing_file() {
    let output = cmd().arg("/nonexistent/input.b85").output().unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("base85: /nonexistent/input.b85: No such file or directory"));
}
