use std::fmt;

/// Error returned by the filter construction and query APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A v1 build was given a value whose byte length does not match
    /// `ceil(bitLimit/8)`.
    ValueExceedsBitLimit,
    /// A v1 load asked for more answer bits than the filter's stored
    /// `bitLimit` allows.
    BitLimitTooSmallOnLoad,
    /// A multi-filter build or query mixed filters of different byte
    /// lengths.
    MultiFilterSizeMismatch,
    /// The requested cell count cannot hold the requested `storedBits`
    /// reservation.
    OversizedTable,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ValueExceedsBitLimit => {
                write!(f, "value length does not match the filter's bit limit")
            }
            Self::BitLimitTooSmallOnLoad => {
                write!(f, "requested answer length exceeds the stored bit limit")
            }
            Self::MultiFilterSizeMismatch => {
                write!(f, "filters passed together have different byte lengths")
            }
            Self::OversizedTable => {
                write!(f, "cell table is too small to reserve the requested bits")
            }
        }
    }
}

impl std::error::Error for Error {}
