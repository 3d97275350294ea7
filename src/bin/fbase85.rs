use std::io::{self, Write};
use std::process;

use clap::Parser;

use base85_rs::base85::{self, Base85Error};
use base85_rs::common::io::{Input, open_input};
use base85_rs::common::{io_error_msg, reset_sigpipe, tool_name};

#[derive(Parser)]
#[command(
    name = "base85",
    about = "Base85 encode or decode FILE, or standard input, to standard output.",
    after_help = "With no FILE, or when FILE is -, read standard input.\n\n\
        The data are encoded with the RFC 1924 alphabet, compatible with Python's\n\
        base64.b85encode: a short final group of N bytes becomes N+1 characters,\n\
        and there is no 'z' abbreviation for zero groups.  When decoding, the\n\
        input may contain whitespace in addition to the 85 alphabet characters.\n\
        Use --ignore-garbage to attempt to recover from any other non-alphabet\n\
        bytes in the encoded stream.",
    version
)]
struct Cli {
    /// Decode data
    #[arg(short = 'd', long = "decode")]
    decode: bool,

    /// When decoding, ignore non-alphabet characters
    #[arg(short = 'i', long = "ignore-garbage")]
    ignore_garbage: bool,

    /// Wrap encoded lines after COLS characters.
    /// The default 0 disables line wrapping
    #[arg(short = 'w', long = "wrap", value_name = "COLS", default_value = "0")]
    wrap: usize,

    /// File to process (reads stdin if omitted or -)
    file: Option<String>,
}

/// Enlarge pipe buffers on Linux for higher throughput on the streaming paths.
#[cfg(target_os = "linux")]
fn enlarge_pipes() {
    const PIPE_SIZE: i32 = 8 * 1024 * 1024;
    unsafe {
        libc::fcntl(0, libc::F_SETPIPE_SZ, PIPE_SIZE);
        libc::fcntl(1, libc::F_SETPIPE_SZ, PIPE_SIZE);
    }
}

fn main() {
    reset_sigpipe();

    #[cfg(target_os = "linux")]
    enlarge_pipes();

    let cli = Cli::parse();
    let tool = tool_name("base85");

    let filename = cli.file.as_deref().unwrap_or("-");

    let input = match open_input(filename) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("{}: {}: {}", tool, filename, io_error_msg(&e));
            process::exit(1);
        }
    };

    let stdout = io::stdout();
    let mut out = io::BufWriter::with_capacity(1024 * 1024, stdout.lock());

    let result = process(input, &cli, &mut out);
    // Flush before printing an error so partial output appears before the message.
    let flushed = out.flush();

    if let Err(e) = result {
        report(&tool, &e, filename);
        process::exit(1);
    }
    if let Err(e) = flushed
        && e.kind() != io::ErrorKind::BrokenPipe
    {
        eprintln!("{}: write error: {}", tool, io_error_msg(&e));
        process::exit(1);
    }
}

fn process(input: Input, cli: &Cli, out: &mut impl Write) -> Result<(), Base85Error> {
    match input {
        Input::Data(data) if cli.decode => base85::decode_to_writer(&data, cli.ignore_garbage, out),
        Input::Data(data) => Ok(base85::encode_to_writer(&data, cli.wrap, out)?),
        Input::Stream(mut reader) if cli.decode => {
            base85::decode_stream(&mut reader, cli.ignore_garbage, out)
        }
        Input::Stream(mut reader) => Ok(base85::encode_stream(&mut reader, cli.wrap, out)?),
    }
}

fn report(tool: &str, e: &Base85Error, filename: &str) {
    match e {
        Base85Error::Io(_) if e.is_broken_pipe() => process::exit(0),
        Base85Error::Io(io_err) if filename != "-" => {
            eprintln!("{}: {}: {}", tool, filename, io_error_msg(io_err));
        }
        Base85Error::Io(io_err) => eprintln!("{}: {}", tool, io_error_msg(io_err)),
        _ => eprintln!("{}: invalid input: {}", tool, e),
    }
}
