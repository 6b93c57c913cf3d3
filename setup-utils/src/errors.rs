use ark_serialize::SerializationError;
use thiserror::Error;

use std::fmt;

/// Errors that may occur while running the phase 2 ceremony.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Phase 1 parameters support a domain of {available}, but the circuit requires {required}")]
    Phase1TooSmall { required: usize, available: usize },
    #[error("Invalid phase 2 size {0}: must be a non-zero power of two supported by the scalar field")]
    InvalidPhase2Size(usize),
    #[error("Invalid circuit description: {0}")]
    InvalidCircuit(String),
    #[error("Invalid length, expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },
    #[error("Malformed accumulator: section {section} expected {expected} elements, got {got}")]
    MalformedAccumulator {
        section: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("Insufficient entropy: {0}")]
    InsufficientEntropy(&'static str),
    #[error("Corrupt parameter file: {0}")]
    CorruptFile(String),
    #[error("Contribution #{index} is invalid: {source}")]
    InvalidContribution {
        index: usize,
        #[source]
        source: Box<Error>,
    },
    #[error(transparent)]
    Verification(#[from] VerificationError),
    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the pairing and hash-chain checks of a contribution.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("Transcript digest does not match the hash chain")]
    TranscriptBroken,
    #[error("Contribution was built on a different transcript than its predecessor")]
    WrongPredecessor,
    #[error("Expected exactly one new contribution, found {0}")]
    UnexpectedContributionCount(usize),
    #[error("A previously recorded contribution was altered")]
    HistoryAltered,
    #[error("Element {0} must not change between contributions")]
    ImmutableElementChanged(&'static str),
    #[error("Element {0} is not the group generator")]
    InvalidGenerator(&'static str),
    #[error("Element {0} is the point at infinity")]
    ZeroElement(&'static str),
    #[error("Circuit shapes do not match")]
    ShapeMismatch,
    #[error("Circuit hash does not match")]
    CircuitMismatch,
    #[error("Initial parameters do not match the ones derived from the phase 1 input and the circuit")]
    InitialParametersMismatch,
    #[error("Beacon contribution does not match the published seed")]
    BeaconMismatch,
    #[error("Ratio check failed: {0}")]
    InvalidRatio(&'static str),
}

/// The recovery class of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing parameter, phase 1 or circuit input. Re-supply the input.
    Input,
    /// Missing randomness. Retry with entropy.
    Entropy,
    /// A pairing or hash-chain check failed. Ceremony-fatal for this branch.
    CryptoInvariant,
    /// Corrupt or truncated file. Re-request it from the sender.
    Codec,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            ErrorKind::Input => write!(f, "InputError"),
            ErrorKind::Entropy => write!(f, "EntropyError"),
            ErrorKind::CryptoInvariant => write!(f, "CryptoInvariantError"),
            ErrorKind::Codec => write!(f, "CodecError"),
        }
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Phase1TooSmall { .. }
            | Error::InvalidPhase2Size(_)
            | Error::InvalidCircuit(_)
            | Error::InvalidLength { .. }
            | Error::MalformedAccumulator { .. }
            | Error::Io(_) => ErrorKind::Input,
            Error::InsufficientEntropy(_) => ErrorKind::Entropy,
            Error::CorruptFile(_) | Error::Serialization(_) => ErrorKind::Codec,
            Error::InvalidContribution { .. } | Error::Verification(_) => ErrorKind::CryptoInvariant,
        }
    }

    /// Cryptographic failures are never transient and must not be retried.
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::CryptoInvariant
    }

    pub fn corrupt(reason: impl fmt::Display) -> Self {
        Error::CorruptFile(reason.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
