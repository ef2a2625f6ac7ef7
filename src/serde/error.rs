use thiserror::Error;

/// Errors that can occur while reading or writing wire data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// Tried to read past the end of the incoming buffer
    #[error("Unexpected end of buffer while reading wire data")]
    UnexpectedEnd,

    /// String payload was not valid UTF-8
    #[error("String payload is not valid UTF-8")]
    InvalidUtf8,

    /// String exceeds the u16 length prefix
    #[error("String of {length} bytes exceeds the maximum wire length of {max} bytes")]
    StringTooLong { length: usize, max: usize },

    /// Incoming dirty mask references a slot the local layout does not declare
    #[error("Dirty mask references slot {slot}, which the local layout does not declare. Sender and receiver layouts must match")]
    UnknownDirtyBit { slot: u8 },
}
