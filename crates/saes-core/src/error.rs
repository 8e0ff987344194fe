//! Error taxonomy shared by the cipher, GCM and key-file crates.

use thiserror::Error;

/// Errors raised by slice-accepting entry points.
///
/// Fixed-size entry points cannot fail; everything that takes a slice checks
/// its length first and reports the mismatch here instead of panicking.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// A raw key did not have a supported length.
    #[error("invalid key length: {actual} bytes (expected 16, 24 or 32)")]
    InvalidKeyLength {
        /// Length that was supplied.
        actual: usize,
    },

    /// A fixed-size buffer, word count or code did not match what the operation requires.
    #[error("precondition violated for {what}: expected {expected}, got {actual}")]
    PreconditionViolation {
        /// Which argument was wrong.
        what: &'static str,
        /// Required size or value.
        expected: usize,
        /// Supplied size or value.
        actual: usize,
    },

    /// A raw instruction function code used bit 7 or an unassigned cipher function.
    #[error("unused instruction function code {bits:#04x} (highest valid is 0x5f)")]
    InvalidFnCode {
        /// The rejected code.
        bits: u8,
    },

    /// Input too short to hold the authentication tag.
    #[error("input length {actual} is shorter than the minimum of {min} bytes")]
    InvalidInputLength {
        /// Minimum acceptable length.
        min: usize,
        /// Length that was supplied.
        actual: usize,
    },

    /// The authentication tag did not verify.
    #[error("authentication failed: tag mismatch")]
    AuthenticationFailed,
}

/// Result alias using [`Error`].
pub type Result<T> = core::result::Result<T, Error>;

/// Checks that `actual == expected`, naming the argument on failure.
pub fn ensure_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::PreconditionViolation {
            what,
            expected,
            actual,
        })
    }
}
