//! Groth16 phase 2: circuit-specific parameters built by a sequence of
//! contributions on top of the phase 1 powers of tau.

pub mod accumulator;
pub mod circuit;
pub mod keypair;
pub mod parameters;
pub mod polynomial;
pub mod transcript;

pub use circuit::{CircuitShape, R1CS};
pub use parameters::MPCParameters;
pub use transcript::{verify_encoded, verify_transcript, ContributionRecord, VerificationReport};
