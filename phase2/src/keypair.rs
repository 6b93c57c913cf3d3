use setup_utils::{
    buffer_size,
    check_same_ratio,
    elements::{read_bytes, read_element, write_element},
    hash_to_g2,
    random_nonzero_scalar,
    CheckForCorrectness,
    Hash,
    HashWriter,
    Result,
    UseCompression,
    VerificationError,
    HASH_SIZE,
};

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_serialize::CanonicalSerialize;
use rand::Rng;

use std::{fmt, io::Write};

/// The public part of a contribution. Proves knowledge of the secret delta
/// and binds it to the transcript the contribution was built on.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey<E: Pairing> {
    /// `delta * G1`
    pub delta_g1: E::G1Affine,
    /// `delta * G2`
    pub delta_g2: E::G2Affine,
    pub s: E::G1Affine,
    pub s_delta: E::G1Affine,
    pub r_delta: E::G2Affine,
    /// Digest of the parameters this contribution was applied to.
    pub transcript: [u8; HASH_SIZE],
}

impl<E: Pairing> fmt::Debug for PublicKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("PublicKey")
            .field("delta_g1", &self.delta_g1)
            .field("delta_g2", &self.delta_g2)
            .field("s", &self.s)
            .field("s_delta", &self.s_delta)
            .field("r_delta", &self.r_delta)
            .field("transcript", &hex::encode(&self.transcript[..]))
            .finish()
    }
}

/// The secret part of a contribution. Must be dropped as soon as the
/// contribution has been applied.
#[derive(Clone)]
pub struct PrivateKey<E: Pairing> {
    pub delta: E::ScalarField,
}

impl<E: Pairing> fmt::Debug for PrivateKey<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "PrivateKey(<redacted>)")
    }
}

/// Builds the proof for a contribution of `delta` on top of `transcript`.
/// The random `s` is drawn from `rng`.
pub fn keypair<E: Pairing, R: Rng>(
    rng: &mut R,
    delta: E::ScalarField,
    transcript: &[u8; HASH_SIZE],
) -> Result<(PublicKey<E>, PrivateKey<E>)> {
    let s = (E::G1Affine::generator() * random_nonzero_scalar::<E::ScalarField, _>(rng)).into_affine();
    let s_delta = (s * delta).into_affine();
    let r = hash_to_g2::<E>(&pok_digest::<E>(transcript, &s, &s_delta)?);
    let r_delta = (r * delta).into_affine();

    let public_key = PublicKey {
        delta_g1: (E::G1Affine::generator() * delta).into_affine(),
        delta_g2: (E::G2Affine::generator() * delta).into_affine(),
        s,
        s_delta,
        r_delta,
        transcript: *transcript,
    };
    Ok((public_key, PrivateKey { delta }))
}

/// The challenge of the proof of knowledge, `Blake2b(transcript || s || s_delta)`.
fn pok_digest<E: Pairing>(transcript: &[u8; HASH_SIZE], s: &E::G1Affine, s_delta: &E::G1Affine) -> Result<Hash> {
    let mut sink = HashWriter::sink();
    sink.write_all(&transcript[..])?;
    s.serialize_uncompressed(&mut sink)?;
    s_delta.serialize_uncompressed(&mut sink)?;
    Ok(sink.into_hash())
}

impl<E: Pairing> PublicKey<E> {
    /// Size of an encoded key.
    pub fn size(compressed: UseCompression) -> usize {
        3 * buffer_size::<E::G1Affine>(compressed) + 2 * buffer_size::<E::G2Affine>(compressed) + HASH_SIZE
    }

    /// Verifies the proof pair and the proof of knowledge, and that the key
    /// was built on `transcript`.
    pub fn verify(&self, transcript: &[u8; HASH_SIZE]) -> Result<()> {
        if &self.transcript != transcript {
            return Err(VerificationError::WrongPredecessor.into());
        }
        let g1 = E::G1Affine::generator();
        let g2 = E::G2Affine::generator();

        // delta_g1 and delta_g2 carry the same delta
        check_same_ratio::<E>(&(g1, self.delta_g1), &(g2, self.delta_g2), "delta proof pair")?;

        // the contributor knows delta
        let r = hash_to_g2::<E>(&pok_digest::<E>(&self.transcript, &self.s, &self.s_delta)?);
        check_same_ratio::<E>(&(self.s, self.s_delta), &(r, self.r_delta), "proof of knowledge")?;
        check_same_ratio::<E>(&(self.s, self.s_delta), &(g2, self.delta_g2), "proof of knowledge delta")?;
        Ok(())
    }

    pub fn write<W: Write>(&self, writer: &mut W, compressed: UseCompression) -> Result<()> {
        write_element(writer, &self.delta_g1, compressed)?;
        write_element(writer, &self.delta_g2, compressed)?;
        write_element(writer, &self.s, compressed)?;
        write_element(writer, &self.s_delta, compressed)?;
        write_element(writer, &self.r_delta, compressed)?;
        writer.write_all(&self.transcript)?;
        Ok(())
    }

    pub fn read(reader: &mut &[u8], compressed: UseCompression, check: CheckForCorrectness) -> Result<Self> {
        let delta_g1 = read_element(reader, compressed, check)?;
        let delta_g2 = read_element(reader, compressed, check)?;
        let s = read_element(reader, compressed, check)?;
        let s_delta = read_element(reader, compressed, check)?;
        let r_delta = read_element(reader, compressed, check)?;
        let mut transcript = [0u8; HASH_SIZE];
        transcript.copy_from_slice(read_bytes(reader, HASH_SIZE)?);
        Ok(PublicKey {
            delta_g1,
            delta_g2,
            s,
            s_delta,
            r_delta,
            transcript,
        })
    }
}
