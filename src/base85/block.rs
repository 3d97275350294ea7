//! Single-block Base85 transform.
//!
//! Uses the RFC 1924 alphabet with the padding rules of Python's
//! `base64.b85encode`/`b85decode`: a short final block is zero-padded before
//! encoding and the output truncated to `len + 1` characters; on decode, a
//! short block is extended with the last alphabet digit (`~`) and the result
//! truncated to `len - 1` bytes. There is no `z` shortcut for zero words.

use super::error::Base85Error;

/// The 85 digit symbols, in digit order.
pub const ALPHABET: &[u8; 85] =
    b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz!#$%&()*+-;<=>?@^_`{|}~";

/// Digit used to extend a short block before decoding (the value of `~`).
pub const PAD_DIGIT: u32 = 84;

/// Raw bytes per full block.
pub const RAW_BLOCK: usize = 4;

/// Encoded characters per full block.
pub const ENCODED_BLOCK: usize = 5;

const INVALID: u8 = 0xFF;

const fn build_decode_table(alphabet: &[u8; 85]) -> [u8; 256] {
    let mut table = [INVALID; 256];
    let mut i = 0;
    while i < 85 {
        // Duplicate symbols would make decoding ambiguous.
        assert!(table[alphabet[i] as usize] == INVALID);
        table[alphabet[i] as usize] = i as u8;
        i += 1;
    }
    table
}

/// Reverse alphabet: byte -> digit value, `0xFF` for bytes outside the alphabet.
pub const DECODE_TABLE: [u8; 256] = build_decode_table(ALPHABET);

/// Digit value of `c`, or `None` if `c` is not in the alphabet.
#[inline]
pub fn digit_value(c: u8) -> Option<u8> {
    match DECODE_TABLE[c as usize] {
        INVALID => None,
        d => Some(d),
    }
}

#[inline]
pub fn is_alphabet_char(c: u8) -> bool {
    DECODE_TABLE[c as usize] != INVALID
}

/// Exact number of characters produced by encoding `n` raw bytes.
#[inline]
pub const fn encoded_len(n: usize) -> usize {
    let tail = n % RAW_BLOCK;
    n / RAW_BLOCK * ENCODED_BLOCK + if tail == 0 { 0 } else { tail + 1 }
}

/// Render a 32-bit word as five base-85 digits, most significant first.
#[inline]
pub fn encode_word(mut value: u32) -> [u8; 5] {
    let mut out = [0u8; ENCODED_BLOCK];
    for c in out.iter_mut().rev() {
        *c = ALPHABET[(value % 85) as usize];
        value /= 85;
    }
    out
}

/// Encode one block of 1..=4 bytes into `out`, returning the number of
/// characters produced (`block.len() + 1`).
///
/// # Panics
///
/// Panics if `block` is empty or longer than four bytes.
#[inline]
pub fn encode_block(block: &[u8], out: &mut [u8; 5]) -> usize {
    assert!(
        (1..=RAW_BLOCK).contains(&block.len()),
        "encode_block: block length {} outside 1..=4",
        block.len()
    );
    let mut word = [0u8; RAW_BLOCK];
    word[..block.len()].copy_from_slice(block);
    *out = encode_word(u32::from_be_bytes(word));
    block.len() + 1
}

/// Decode one block of 2..=5 characters into `out`, returning the number of
/// bytes produced (`block.len() - 1`).
///
/// Positions in the returned error are relative to the start of `block`.
/// Accumulation wraps modulo 2^32, so out-of-range hunks such as `~~~~~`
/// decode to the low 32 bits of their value.
///
/// # Panics
///
/// Panics if `block` is longer than five characters.
pub fn decode_block(block: &[u8], out: &mut [u8; 4]) -> Result<usize, Base85Error> {
    assert!(
        block.len() <= ENCODED_BLOCK,
        "decode_block: block length {} exceeds 5",
        block.len()
    );
    // One character carries fewer than eight bits.
    if block.len() < 2 {
        return Err(Base85Error::TruncatedInput { position: 0 });
    }

    let mut value: u32 = 0;
    for (i, &c) in block.iter().enumerate() {
        let digit = DECODE_TABLE[c as usize];
        if digit == INVALID {
            return Err(Base85Error::invalid_character(block, i));
        }
        value = value.wrapping_mul(85).wrapping_add(u32::from(digit));
    }
    for _ in block.len()..ENCODED_BLOCK {
        value = value.wrapping_mul(85).wrapping_add(PAD_DIGIT);
    }

    *out = value.to_be_bytes();
    Ok(block.len() - 1)
}

/// Encode every complete 4-byte block of `data`, appending to `out`.
/// Returns the unconsumed tail (0..=3 bytes).
pub fn encode_full_blocks<'a>(data: &'a [u8], out: &mut Vec<u8>) -> &'a [u8] {
    let blocks = data.chunks_exact(RAW_BLOCK);
    let tail = blocks.remainder();
    out.reserve(data.len() / RAW_BLOCK * ENCODED_BLOCK);
    for b in blocks {
        out.extend_from_slice(&encode_word(u32::from_be_bytes([b[0], b[1], b[2], b[3]])));
    }
    tail
}

/// Encode all of `data`, including a final short block, appending to `out`.
pub fn encode_slice(data: &[u8], out: &mut Vec<u8>) {
    let tail = encode_full_blocks(data, out);
    if !tail.is_empty() {
        let mut enc = [0u8; ENCODED_BLOCK];
        let n = encode_block(tail, &mut enc);
        out.extend_from_slice(&enc[..n]);
    }
}
