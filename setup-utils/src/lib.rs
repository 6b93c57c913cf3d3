//! Shared building blocks of the Groth16 phase 2 ceremony: hashing, pairing
//! checks, entropy handling, the phase 1 input and element encoding.

mod beacon;
pub use beacon::beacon_randomness;

pub mod elements;
pub use elements::{buffer_size, CheckForCorrectness, UseCompression};

mod entropy;
pub use entropy::{mix, EntropyMixer, Randomness};

mod errors;
pub use errors::{Error, ErrorKind, Result, VerificationError};

mod groth16_utils;
pub use groth16_utils::{domain_generator, Groth16Params};

mod helpers;
pub use helpers::*;

pub mod progress;

/// The size of a Blake2b-512 digest.
pub const HASH_SIZE: usize = 64;

pub use generic_array::GenericArray;
pub use typenum::consts::U64;
