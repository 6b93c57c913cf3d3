use crate::{Error, Result, VerificationError};

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::PrimeField;
use ark_std::UniformRand;
use blake2::{Blake2b, Digest};
use generic_array::GenericArray;
use rand::{thread_rng, Rng, SeedableRng};
use rand_chacha::ChaChaRng;
use rayon::prelude::*;
use typenum::consts::U64;

use std::io::{self, Write};

/// Blake2b-512 output.
pub type Hash = GenericArray<u8, U64>;

/// Calculates the hash of the given buffer.
pub fn calculate_hash(input: &[u8]) -> Hash {
    let mut hasher = Blake2b::new();
    hasher.update(input);
    hasher.finalize()
}

/// Hash of the empty input. Seeds the transcript of a fresh parameter file.
pub fn blank_hash() -> Hash {
    Blake2b::new().finalize()
}

/// Hashes everything written to it. Wraps an inner writer whose output is
/// forwarded unchanged, use `io::sink()` to only hash.
pub struct HashWriter<W: Write> {
    writer: W,
    hasher: Blake2b,
}

impl HashWriter<io::Sink> {
    pub fn sink() -> Self {
        Self::new(io::sink())
    }
}

impl<W: Write> HashWriter<W> {
    pub fn new(writer: W) -> Self {
        HashWriter {
            writer,
            hasher: Blake2b::new(),
        }
    }

    pub fn into_hash(self) -> Hash {
        self.hasher.finalize()
    }
}

impl<W: Write> Write for HashWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let bytes = self.writer.write(buf)?;
        if bytes > 0 {
            self.hasher.update(&buf[0..bytes]);
        }
        Ok(bytes)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Prints a 64-byte hash as four rows of 16 hex bytes.
pub fn print_hash(hash: &[u8]) {
    for line in hash.chunks(16) {
        print!("\t");
        for section in line.chunks(4) {
            for b in section {
                print!("{:02x}", b);
            }
            print!(" ");
        }
        println!();
    }
}

/// Checks if pairs have the same ratio, i.e. `e(g1.0, g2.1) == e(g1.1, g2.0)`.
/// None of the four elements may be the identity.
pub fn check_same_ratio<E: Pairing>(
    g1: &(E::G1Affine, E::G1Affine),
    g2: &(E::G2Affine, E::G2Affine),
    err: &'static str,
) -> Result<()> {
    if g1.0 == E::G1Affine::zero() || g1.1 == E::G1Affine::zero() {
        return Err(VerificationError::ZeroElement(err).into());
    }
    if g2.0 == E::G2Affine::zero() || g2.1 == E::G2Affine::zero() {
        return Err(VerificationError::ZeroElement(err).into());
    }
    if E::pairing(g1.0, g2.1) != E::pairing(g1.1, g2.0) {
        return Err(VerificationError::InvalidRatio(err).into());
    }
    Ok(())
}

/// Compute a random linear combination of the two vectors.
/// If `v1[i]` and `v2[i]` share the same ratio for all `i`, so do the outputs.
pub fn merge_pairs<G: CurveGroup>(v1: &[G::Affine], v2: &[G::Affine]) -> Result<(G::Affine, G::Affine)> {
    if v1.len() != v2.len() {
        return Err(Error::InvalidLength {
            expected: v1.len(),
            got: v2.len(),
        });
    }
    let scalars = (0..v1.len())
        .into_par_iter()
        .map(|_| G::ScalarField::rand(&mut thread_rng()))
        .collect::<Vec<_>>();
    let (s, sx) = rayon::join(|| G::msm_unchecked(v1, &scalars), || G::msm_unchecked(v2, &scalars));
    Ok((s.into_affine(), sx.into_affine()))
}

/// Multiplies every element by `scalar` in parallel and returns them in affine form.
pub fn batch_mul<C: AffineRepr>(elements: &[C], scalar: &C::ScalarField) -> Vec<C> {
    let projective = elements.par_iter().map(|e| *e * *scalar).collect::<Vec<_>>();
    C::Group::normalize_batch(&projective)
}

/// Deterministically maps a digest to a G2 element by seeding a ChaCha RNG
/// with its first 32 bytes and sampling a uniform group element.
pub fn hash_to_g2<E: Pairing>(digest: &[u8]) -> E::G2Affine {
    E::G2::rand(&mut rng_from_digest(digest)).into_affine()
}

/// Seeds a ChaCha RNG with the first 32 bytes of a digest. Shorter digests
/// are zero-padded.
pub fn rng_from_digest(digest: &[u8]) -> ChaChaRng {
    let mut seed = [0u8; 32];
    let len = digest.len().min(32);
    seed[..len].copy_from_slice(&digest[..len]);
    ChaChaRng::from_seed(seed)
}

/// Samples a non-zero scalar.
pub fn random_nonzero_scalar<F: PrimeField, R: Rng + ?Sized>(rng: &mut R) -> F {
    loop {
        let scalar = F::rand(rng);
        if !scalar.is_zero() {
            return scalar;
        }
    }
}

/// Returns `log2(n)` for powers of two.
pub fn log_2(n: usize) -> Option<usize> {
    if n.is_power_of_two() {
        Some(n.trailing_zeros() as usize)
    } else {
        None
    }
}
