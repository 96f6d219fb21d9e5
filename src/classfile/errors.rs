use thiserror::Error;

/// Structural errors raised while decoding or encoding a class file.
///
/// Every variant means the input artifact is corrupt (or the output would
/// be); none of them mean "missing".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassFileError {
    #[error("not a class file: bad magic 0x{found:08X}")]
    BadMagic { found: u32 },

    #[error("unexpected end of class file at offset {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownConstantTag { tag: u8, index: u16 },

    #[error("invalid constant pool index {index}")]
    InvalidConstantIndex { index: u16 },

    #[error("constant pool index {index} is {found}, expected {expected}")]
    ConstantTypeMismatch {
        index: u16,
        expected: &'static str,
        found: &'static str,
    },

    #[error("invalid modified UTF-8 in constant {index}")]
    InvalidUtf8 { index: u16 },

    #[error("{count} trailing bytes after end of class file")]
    TrailingBytes { count: usize },

    #[error("malformed descriptor '{descriptor}': {reason}")]
    InvalidDescriptor {
        descriptor: String,
        reason: &'static str,
    },

    #[error("malformed {attribute} attribute: {reason}")]
    MalformedAttribute {
        attribute: &'static str,
        reason: String,
    },

    #[error("constant pool overflow: more than 65535 entries")]
    ConstantPoolOverflow,

    #[error("{what} too large to encode: {len}")]
    TooLarge { what: &'static str, len: usize },
}
