use thiserror::Error;

/// Reasons a payload, or a single field of it, could not be decoded.
///
/// All of these are recoverable: the record they occur in is dropped and the
/// rest of the stream is processed normally.
#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum DecodeError {
    #[error("not enough bytes: needed {needed}, {remaining} remaining")]
    Exhausted { needed: usize, remaining: usize },

    #[error("no terminator found for string starting at offset {offset}")]
    MissingTerminator { offset: usize },

    #[error("field `{0}` is already present")]
    DuplicateField(String),

    #[error("unknown provider `{0}`")]
    UnknownProvider(String),

    #[error("unknown opcode {opcode} for provider {provider}")]
    UnknownOpcode { provider: &'static str, opcode: u8 },

    #[error("unsupported version {version} of {provider} opcode {opcode}")]
    UnsupportedVersion {
        provider: &'static str,
        opcode: u8,
        version: u8,
    },

    #[error("{provider} opcode {opcode} is only decoded for 64-bit payloads")]
    Requires64Bit { provider: &'static str, opcode: u8 },

    #[error("{remaining} bytes left over after decoding all fields")]
    ResidualBytes { remaining: usize },
}

pub type Result<T> = std::result::Result<T, DecodeError>;
