//! Turns raw entropy into the secret scalar of a contribution.
//!
//! Raw material is absorbed into a Blake2b-512 state under a domain tag. The
//! finalized digest is reduced modulo the scalar field order from its full 512
//! bits, so the bias of the result is negligible. A zero scalar is never
//! returned, the digest is re-hashed with a counter until it reduces to a
//! non-zero value.

use crate::{helpers::Hash, rng_from_digest, Error, Result};

use ark_ff::PrimeField;
use blake2::{Blake2b, Digest};
use rand::RngCore;
use rand_chacha::ChaChaRng;
use tracing::debug;

use std::{fmt, io::Read, path::Path};

const MIX_DOMAIN: &[u8] = b"phase2-entropy-mix-v1";
const DELTA_DOMAIN: &[u8] = b"phase2-delta-v1";
const RNG_DOMAIN: &[u8] = b"phase2-proof-rng-v1";

/// Collects entropy from any number of sources before it is finalized.
pub struct EntropyMixer {
    hasher: Blake2b,
    absorbed: usize,
}

impl Default for EntropyMixer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EntropyMixer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("EntropyMixer").field("absorbed", &self.absorbed).finish()
    }
}

impl EntropyMixer {
    pub fn new() -> Self {
        let mut hasher = Blake2b::new();
        hasher.update(MIX_DOMAIN);
        Self { hasher, absorbed: 0 }
    }

    /// Absorbs a chunk of raw bytes. Every chunk is length-prefixed so that
    /// different splits of the same bytes mix differently.
    pub fn absorb(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(&(bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
        self.absorbed += bytes.len();
        self
    }

    /// Absorbs everything until the end of `reader`.
    pub fn absorb_reader<R: Read>(&mut self, mut reader: R) -> Result<&mut Self> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        debug!(bytes = buf.len(), "absorbed entropy from reader");
        Ok(self.absorb(&buf))
    }

    pub fn absorb_file<P: AsRef<Path>>(&mut self, path: P) -> Result<&mut Self> {
        self.absorb_reader(fs_err::File::open(path.as_ref())?)
    }

    /// Absorbs 64 bytes from the operating system RNG.
    pub fn absorb_os_rng(&mut self) -> &mut Self {
        let mut bytes = [0u8; 64];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        self.absorb(&bytes)
    }

    /// Number of raw bytes absorbed so far.
    pub fn absorbed(&self) -> usize {
        self.absorbed
    }

    pub fn finalize(self) -> Result<Randomness> {
        if self.absorbed == 0 {
            return Err(Error::InsufficientEntropy("no entropy was supplied"));
        }
        Ok(Randomness::from_digest(self.hasher.finalize()))
    }
}

/// Finalized randomness of a single contribution. Yields the secret scalar
/// and the RNG for the auxiliary proof randomness, each under its own domain.
#[derive(Clone)]
pub struct Randomness {
    digest: Hash,
}

impl fmt::Debug for Randomness {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Randomness(<redacted>)")
    }
}

impl Randomness {
    pub(crate) fn from_digest(digest: Hash) -> Self {
        Self { digest }
    }

    /// The secret scalar, never zero.
    pub fn delta<F: PrimeField>(&self) -> F {
        scalar_from_digest(DELTA_DOMAIN, &self.digest)
    }

    pub fn rng(&self) -> ChaChaRng {
        let mut hasher = Blake2b::new();
        hasher.update(RNG_DOMAIN);
        hasher.update(&self.digest);
        rng_from_digest(&hasher.finalize())
    }
}

/// Mixes raw entropy into a non-zero scalar.
pub fn mix<F: PrimeField>(raw: &[u8]) -> Result<F> {
    let mut mixer = EntropyMixer::new();
    mixer.absorb(raw);
    Ok(mixer.finalize()?.delta())
}

/// Wide reduction of `Blake2b(domain || counter || digest)`, retrying with
/// the next counter while the result is zero.
fn scalar_from_digest<F: PrimeField>(domain: &[u8], digest: &[u8]) -> F {
    let mut counter = 0u64;
    loop {
        let mut hasher = Blake2b::new();
        hasher.update(domain);
        hasher.update(&counter.to_le_bytes());
        hasher.update(digest);
        let scalar = F::from_le_bytes_mod_order(&hasher.finalize());
        if !scalar.is_zero() {
            return scalar;
        }
        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_ff::Zero;
    use rand::Rng;

    #[test]
    fn empty_entropy_is_rejected() {
        let err = mix::<Fr>(&[]).unwrap_err();
        assert!(matches!(err, Error::InsufficientEntropy(_)));
        assert!(err.is_recoverable());
        assert!(EntropyMixer::new().finalize().is_err());
    }

    #[test]
    fn mixing_is_deterministic() {
        let a = mix::<Fr>(b"some keyboard mashing").unwrap();
        let b = mix::<Fr>(b"some keyboard mashing").unwrap();
        let c = mix::<Fr>(b"some keyboard mashinG").unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(!a.is_zero());
    }

    #[test]
    fn sources_are_length_separated() {
        let mut split = EntropyMixer::new();
        split.absorb(b"ab").absorb(b"c");
        let mut joined = EntropyMixer::new();
        joined.absorb(b"abc");
        assert_eq!(split.absorbed(), 3);
        assert_ne!(
            split.finalize().unwrap().delta::<Fr>(),
            joined.finalize().unwrap().delta::<Fr>()
        );
    }

    #[test]
    fn delta_and_rng_are_independent() {
        let mut mixer = EntropyMixer::new();
        mixer.absorb_reader(&b"entropy from stdin"[..]).unwrap().absorb_os_rng();
        let randomness = mixer.finalize().unwrap();
        assert_eq!(randomness.delta::<Fr>(), randomness.delta::<Fr>());
        let first: [u8; 32] = randomness.rng().gen();
        let second: [u8; 32] = randomness.rng().gen();
        assert_eq!(first, second);
        assert_eq!(format!("{:?}", randomness), "Randomness(<redacted>)");
    }
}
