use std::io::{self, BufWriter, Read, Write};

use rayon::prelude::*;

use super::block::{ENCODED_BLOCK, RAW_BLOCK, encode_slice, encoded_len};
use super::error::Base85Error;
use super::stream::{StreamDecoder, StreamEncoder};
use crate::common::io::read_full;

/// Encode chunk for in-memory input: 4MB, a whole number of blocks.
const ENCODE_CHUNK: usize = 4 * 1024 * 1024;

/// Decode chunk for in-memory input; bounds the decoded buffer held at once.
const DECODE_CHUNK: usize = 4 * 1024 * 1024;

/// Read size for streamed input.
const STREAM_CHUNK: usize = 4 * 1024 * 1024;

/// Inputs at least this large (and not wrapped) are encoded on all cores.
const PARALLEL_THRESHOLD: usize = 8 * 1024 * 1024;

/// Per-task slice for parallel encode; a whole number of blocks.
const PARALLEL_CHUNK: usize = 1024 * 1024;

const _: () = assert!(ENCODE_CHUNK % RAW_BLOCK == 0 && PARALLEL_CHUNK % RAW_BLOCK == 0);

/// Encode `data` to a Base85 string.
pub fn encode(data: &[u8]) -> String {
    let mut out = Vec::with_capacity(encoded_len(data.len()));
    encode_slice(data, &mut out);
    // SAFETY: the encoder only emits bytes from ALPHABET, which is ASCII
    unsafe { String::from_utf8_unchecked(out) }
}

/// Decode Base85 text, skipping whitespace.
pub fn decode(text: &[u8]) -> Result<Vec<u8>, Base85Error> {
    let mut out = Vec::with_capacity(text.len() / ENCODED_BLOCK * RAW_BLOCK + RAW_BLOCK);
    let mut decoder = StreamDecoder::new();
    decoder.update(text, &mut out)?;
    decoder.finish(&mut out)?;
    Ok(out)
}

/// Encode data and write to output, wrapping lines at `wrap_col` (0 = no wrapping).
pub fn encode_to_writer(data: &[u8], wrap_col: usize, out: &mut impl Write) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }

    if wrap_col == 0 {
        return encode_no_wrap(data, out);
    }

    encode_wrapped(data, wrap_col, out)
}

/// Encode without wrapping in 4MB chunks, reusing one output buffer.
/// Every chunk but the last is block-aligned, so only the last can end short.
fn encode_no_wrap(data: &[u8], out: &mut impl Write) -> io::Result<()> {
    if data.len() >= PARALLEL_THRESHOLD && rayon::current_num_threads() > 1 {
        return encode_parallel(data, out);
    }

    let mut buf = Vec::with_capacity(encoded_len(ENCODE_CHUNK));
    for chunk in data.chunks(ENCODE_CHUNK) {
        buf.clear();
        encode_slice(chunk, &mut buf);
        out.write_all(&buf)?;
    }
    Ok(())
}

/// Encode large inputs across all cores.
/// Work is split into block-aligned slices and written back in order, one
/// batch (one slice per thread) at a time to bound memory.
fn encode_parallel(data: &[u8], out: &mut impl Write) -> io::Result<()> {
    let batch = PARALLEL_CHUNK * rayon::current_num_threads().max(1);

    for group in data.chunks(batch) {
        let encoded: Vec<Vec<u8>> = group
            .par_chunks(PARALLEL_CHUNK)
            .map(|chunk| {
                let mut buf = Vec::with_capacity(encoded_len(chunk.len()));
                encode_slice(chunk, &mut buf);
                buf
            })
            .collect();
        for part in &encoded {
            out.write_all(part)?;
        }
    }
    Ok(())
}

/// Encode with line wrapping. A newline ends every full line and the final
/// partial one.
fn encode_wrapped(data: &[u8], wrap_col: usize, out: &mut impl Write) -> io::Result<()> {
    let mut encoded = Vec::with_capacity(encoded_len(ENCODE_CHUNK));
    let mut wrapped = Vec::with_capacity(wrapped_capacity(encoded_len(ENCODE_CHUNK), wrap_col));
    let mut col = 0usize;

    for chunk in data.chunks(ENCODE_CHUNK) {
        encoded.clear();
        encode_slice(chunk, &mut encoded);
        wrapped.clear();
        build_wrapped_output(&encoded, wrap_col, &mut col, &mut wrapped);
        out.write_all(&wrapped)?;
    }

    if col > 0 {
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[inline]
fn wrapped_capacity(encoded: usize, wrap_col: usize) -> usize {
    encoded + encoded / wrap_col + 2
}

/// Append `data` to `wrapped`, inserting a newline every `wrap_col` columns.
/// `col` carries the current column across calls.
#[inline]
fn build_wrapped_output(data: &[u8], wrap_col: usize, col: &mut usize, wrapped: &mut Vec<u8>) {
    let mut rp = 0;

    while rp < data.len() {
        let space = wrap_col - *col;
        let avail = data.len() - rp;

        if avail < space {
            wrapped.extend_from_slice(&data[rp..]);
            *col += avail;
            break;
        }

        wrapped.extend_from_slice(&data[rp..rp + space]);
        wrapped.push(b'\n');
        rp += space;
        *col = 0;
    }
}

/// Write `encoded`, wrapped when `wrap_col > 0`.
fn write_encoded(
    encoded: &[u8],
    wrap_col: usize,
    col: &mut usize,
    wrapped: &mut Vec<u8>,
    out: &mut impl Write,
) -> io::Result<()> {
    if wrap_col == 0 {
        return out.write_all(encoded);
    }
    wrapped.clear();
    build_wrapped_output(encoded, wrap_col, col, wrapped);
    out.write_all(wrapped)
}

/// Decode Base85 text held in memory and write to output.
/// When `ignore_garbage` is true, bytes outside the alphabet are dropped;
/// otherwise only whitespace is skipped.
///
/// Bytes decoded before an error are written before the error is returned.
pub fn decode_to_writer(
    data: &[u8],
    ignore_garbage: bool,
    out: &mut impl Write,
) -> Result<(), Base85Error> {
    if data.is_empty() {
        return Ok(());
    }

    let mut decoder = new_decoder(ignore_garbage);
    let mut decoded = Vec::with_capacity(DECODE_CHUNK / ENCODED_BLOCK * RAW_BLOCK + RAW_BLOCK);

    for chunk in data.chunks(DECODE_CHUNK) {
        decoded.clear();
        let result = decoder.update(chunk, &mut decoded);
        emit(out, &decoded, result)?;
    }

    decoded.clear();
    let result = decoder.finish(&mut decoded);
    emit(out, &decoded, result)
}

/// Stream-encode from a reader to a writer. Used for stdin and pipes.
pub fn encode_stream(
    reader: &mut impl Read,
    wrap_col: usize,
    writer: &mut impl Write,
) -> io::Result<()> {
    let mut buf = vec![0u8; STREAM_CHUNK];
    let mut out = BufWriter::with_capacity(2 * 1024 * 1024, writer);

    let mut encoder = StreamEncoder::new();
    let encoded_max = encoded_len(STREAM_CHUNK) + ENCODED_BLOCK;
    let mut encoded = Vec::with_capacity(encoded_max);
    let mut wrapped = if wrap_col > 0 {
        Vec::with_capacity(wrapped_capacity(encoded_max, wrap_col))
    } else {
        Vec::new()
    };
    let mut col = 0usize;

    loop {
        let n = read_full(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        encoded.clear();
        encoder.update(&buf[..n], &mut encoded);
        write_encoded(&encoded, wrap_col, &mut col, &mut wrapped, &mut out)?;
    }

    encoded.clear();
    encoder.finish(&mut encoded);
    write_encoded(&encoded, wrap_col, &mut col, &mut wrapped, &mut out)?;

    if col > 0 {
        out.write_all(b"\n")?;
    }
    out.flush()
}

/// Stream-decode from a reader to a writer. Used for stdin and pipes.
pub fn decode_stream(
    reader: &mut impl Read,
    ignore_garbage: bool,
    writer: &mut impl Write,
) -> Result<(), Base85Error> {
    let mut buf = vec![0u8; STREAM_CHUNK];
    let mut out = BufWriter::with_capacity(2 * 1024 * 1024, writer);

    let mut decoder = new_decoder(ignore_garbage);
    let mut decoded = Vec::with_capacity(STREAM_CHUNK / ENCODED_BLOCK * RAW_BLOCK + RAW_BLOCK);

    loop {
        let n = read_full(reader, &mut buf)?;
        if n == 0 {
            break;
        }
        decoded.clear();
        let result = decoder.update(&buf[..n], &mut decoded);
        emit(&mut out, &decoded, result)?;
    }

    decoded.clear();
    let result = decoder.finish(&mut decoded);
    emit(&mut out, &decoded, result)?;
    out.flush()?;
    Ok(())
}

fn new_decoder(ignore_garbage: bool) -> StreamDecoder {
    if ignore_garbage {
        StreamDecoder::ignoring_garbage()
    } else {
        StreamDecoder::new()
    }
}

/// Write what was decoded, then report `result`. Output for blocks before a
/// failure is flushed so it reaches the sink ahead of the error.
fn emit(
    out: &mut impl Write,
    decoded: &[u8],
    result: Result<(), Base85Error>,
) -> Result<(), Base85Error> {
    out.write_all(decoded)?;
    if result.is_err() {
        out.flush()?;
    }
    result
}
