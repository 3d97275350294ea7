pub mod io;

/// Get the GNU-style tool name by stripping the 'f' prefix,
/// e.g. "fbase85" -> "base85".
#[inline]
pub fn gnu_name(binary_name: &str) -> &str {
    binary_name.strip_prefix('f').unwrap_or(binary_name)
}

/// Tool name for diagnostics, derived from argv[0] ("base85" for `fbase85`).
pub fn tool_name(default: &'static str) -> String {
    std::env::args_os()
        .next()
        .as_deref()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .map(|s| gnu_name(s).to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Reset SIGPIPE to default behavior (SIG_DFL) for GNU coreutils compatibility.
/// Rust sets SIGPIPE to SIG_IGN by default, but GNU tools are killed by SIGPIPE
/// (exit code 141 = 128 + 13). This must be called at the start of main().
#[inline]
pub fn reset_sigpipe() {
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

/// Format an IO error message without the "(os error N)" suffix,
/// e.g. "No such file or directory" rather than "... (os error 2)".
pub fn io_error_msg(e: &std::io::Error) -> String {
    match e.raw_os_error() {
        Some(raw) => {
            let msg = std::io::Error::from_raw_os_error(raw).to_string();
            msg.replace(&format!(" (os error {})", raw), "")
        }
        None => e.to_string(),
    }
}
