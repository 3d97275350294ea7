use std::io;

/// Errors produced while decoding Base85 text.
///
/// Encoding never fails on its own; the only error it can surface is `Io`
/// from the underlying reader or writer.
#[derive(Debug, thiserror::Error)]
pub enum Base85Error {
    /// A byte outside the alphabet was found in the encoded input.
    /// `position` counts significant characters (whitespace is not counted).
    #[error("invalid character '{ch}' at position {position} in block \"{block}\"", ch = .byte.escape_ascii())]
    InvalidCharacter {
        byte: u8,
        position: u64,
        block: String,
    },

    /// The input ended with a single leftover character, which cannot encode any byte.
    #[error("truncated input: lone character at position {position}")]
    TruncatedInput { position: u64 },

    /// I/O error from the byte source or sink.
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Base85Error {
    pub(crate) fn invalid_character(block: &[u8], index: usize) -> Self {
        Base85Error::InvalidCharacter {
            byte: block[index],
            position: index as u64,
            block: block.escape_ascii().to_string(),
        }
    }

    /// Shift a block-relative position by `offset` so it refers to the whole stream.
    pub(crate) fn rebase(self, offset: u64) -> Self {
        match self {
            Base85Error::InvalidCharacter {
                byte,
                position,
                block,
            } => Base85Error::InvalidCharacter {
                byte,
                position: position + offset,
                block,
            },
            Base85Error::TruncatedInput { position } => Base85Error::TruncatedInput {
                position: position + offset,
            },
            other => other,
        }
    }

    /// Stream position of the offending input, if this is a data error.
    pub fn position(&self) -> Option<u64> {
        match self {
            Base85Error::InvalidCharacter { position, .. }
            | Base85Error::TruncatedInput { position } => Some(*position),
            Base85Error::Io(_) => None,
        }
    }

    /// True when the output side went away (`EPIPE`); coreutils treat that as success.
    pub fn is_broken_pipe(&self) -> bool {
        matches!(self, Base85Error::Io(e) if e.kind() == io::ErrorKind::BrokenPipe)
    }
}
