//! Incremental Base85 codecs for input that arrives in arbitrary chunks.
//!
//! Both directions keep a small fixed-size carry for a block split across
//! chunk boundaries, so the output never depends on how the input was chunked.

use super::block::{
    ENCODED_BLOCK, RAW_BLOCK, decode_block, encode_full_blocks, encode_slice, encode_word,
    is_alphabet_char,
};
use super::error::Base85Error;

/// Whitespace skipped while decoding: space, tab, LF, CR, VT, FF.
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0b | 0x0c)
}

/// Streaming encoder. Holds up to three bytes between `update` calls.
#[derive(Debug, Default, Clone)]
pub struct StreamEncoder {
    carry: [u8; RAW_BLOCK],
    carry_len: usize,
}

impl StreamEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of their block.
    pub fn pending(&self) -> usize {
        self.carry_len
    }

    /// Encode `chunk`, appending every completed block to `out`.
    pub fn update(&mut self, mut chunk: &[u8], out: &mut Vec<u8>) {
        if self.carry_len > 0 {
            let take = (RAW_BLOCK - self.carry_len).min(chunk.len());
            self.carry[self.carry_len..self.carry_len + take].copy_from_slice(&chunk[..take]);
            self.carry_len += take;
            chunk = &chunk[take..];
            if self.carry_len < RAW_BLOCK {
                return;
            }
            out.extend_from_slice(&encode_word(u32::from_be_bytes(self.carry)));
            self.carry_len = 0;
        }

        let tail = encode_full_blocks(chunk, out);
        self.carry[..tail.len()].copy_from_slice(tail);
        self.carry_len = tail.len();
    }

    /// Emit the final short block, if any.
    pub fn finish(self, out: &mut Vec<u8>) {
        encode_slice(&self.carry[..self.carry_len], out);
    }
}

/// Streaming decoder. Skips whitespace and holds up to four significant
/// characters between `update` calls.
///
/// Error positions count significant characters from the start of the stream:
/// whitespace, and discarded garbage when ignoring garbage, are not counted.
/// A decoder that has returned an error should not be fed further input.
#[derive(Debug, Default, Clone)]
pub struct StreamDecoder {
    carry: [u8; ENCODED_BLOCK],
    carry_len: usize,
    position: u64,
    ignore_garbage: bool,
}

impl StreamDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// A decoder that silently drops bytes outside the alphabet instead of failing.
    pub fn ignoring_garbage() -> Self {
        Self {
            ignore_garbage: true,
            ..Self::default()
        }
    }

    /// Significant characters consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Decode `chunk`, appending every completed block to `out`.
    ///
    /// On error, `out` still holds the bytes of every block completed before
    /// the failing one.
    pub fn update(&mut self, chunk: &[u8], out: &mut Vec<u8>) -> Result<(), Base85Error> {
        out.reserve(chunk.len() / ENCODED_BLOCK * RAW_BLOCK + RAW_BLOCK);

        // Encoded text is usually line-wrapped; decode each line separately so
        // the whole blocks inside it can skip the carry.
        let mut start = 0;
        for nl in memchr::memchr_iter(b'\n', chunk) {
            self.feed_line(&chunk[start..nl], out)?;
            start = nl + 1;
        }
        self.feed_line(&chunk[start..], out)
    }

    /// Decode the final, possibly short, block.
    ///
    /// A single leftover character is a `TruncatedInput` error.
    pub fn finish(self, out: &mut Vec<u8>) -> Result<(), Base85Error> {
        if self.carry_len == 0 {
            return Ok(());
        }
        let start = self.position - self.carry_len as u64;
        let mut word = [0u8; RAW_BLOCK];
        let n = decode_block(&self.carry[..self.carry_len], &mut word)
            .map_err(|e| e.rebase(start))?;
        out.extend_from_slice(&word[..n]);
        Ok(())
    }

    fn feed_line(&mut self, line: &[u8], out: &mut Vec<u8>) -> Result<(), Base85Error> {
        let mut rest = line;
        loop {
            if self.carry_len == 0 && !self.ignore_garbage {
                rest = self.decode_direct(rest, out)?;
            }
            let Some((&c, tail)) = rest.split_first() else {
                return Ok(());
            };
            self.push(c, out)?;
            rest = tail;
        }
    }

    /// Decode whole whitespace-free blocks straight from `data`; returns the rest.
    fn decode_direct<'a>(
        &mut self,
        data: &'a [u8],
        out: &mut Vec<u8>,
    ) -> Result<&'a [u8], Base85Error> {
        let mut word = [0u8; RAW_BLOCK];
        let mut rest = data;
        while rest.len() >= ENCODED_BLOCK {
            let block = &rest[..ENCODED_BLOCK];
            if block.iter().any(|&b| is_whitespace(b)) {
                break;
            }
            decode_block(block, &mut word).map_err(|e| e.rebase(self.position))?;
            out.extend_from_slice(&word);
            self.position += ENCODED_BLOCK as u64;
            rest = &rest[ENCODED_BLOCK..];
        }
        Ok(rest)
    }

    #[inline]
    fn push(&mut self, c: u8, out: &mut Vec<u8>) -> Result<(), Base85Error> {
        if is_whitespace(c) || (self.ignore_garbage && !is_alphabet_char(c)) {
            return Ok(());
        }
        self.carry[self.carry_len] = c;
        self.carry_len += 1;
        self.position += 1;
        if self.carry_len == ENCODED_BLOCK {
            self.carry_len = 0;
            let start = self.position - ENCODED_BLOCK as u64;
            let mut word = [0u8; RAW_BLOCK];
            decode_block(&self.carry, &mut word).map_err(|e| e.rebase(start))?;
            out.extend_from_slice(&word);
        }
        Ok(())
    }
}
