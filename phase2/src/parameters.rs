use crate::{
    accumulator::Accumulator,
    circuit::{CircuitShape, R1CS},
    keypair::{keypair, PublicKey},
    polynomial::eval,
};
use setup_utils::{
    beacon_randomness,
    blank_hash,
    check_same_ratio,
    elements::{read_bytes, read_u64},
    merge_pairs,
    CheckForCorrectness,
    Error,
    Groth16Params,
    HashWriter,
    Randomness,
    Result,
    UseCompression,
    VerificationError,
    HASH_SIZE,
};

use ark_ec::{pairing::Pairing, AffineRepr};
use ark_groth16::{ProvingKey, VerifyingKey};
use rand::Rng;
use tracing::{debug, info, info_span};

use std::io::Write;

/// Identifies a phase 2 parameter file.
pub const MAGIC: &[u8; 8] = b"phase2\x00\x01";
/// The current version of the file layout.
pub const VERSION: u32 = 1;

/// MPC parameters are just like Groth16 `Parameters` except, when serialized,
/// they contain a transcript of contributions at the end, which can be verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MPCParameters<E: Pairing> {
    pub shape: CircuitShape,
    pub cs_hash: [u8; HASH_SIZE],
    pub params: Accumulator<E>,
    pub contributions: Vec<PublicKey<E>>,
    /// Running digest over every version of the accumulator.
    pub digest: [u8; HASH_SIZE],
}

impl<E: Pairing> MPCParameters<E> {
    /// Evaluates the circuit's QAP over the phase 1 Lagrange coefficients,
    /// producing the parameters before any contribution (gamma = delta = 1).
    pub fn new(circuit: &R1CS<E::ScalarField>, phase1: &Groth16Params<E>) -> Result<Self> {
        let span = info_span!("phase2-new");
        let _enter = span.enter();

        circuit.validate()?;
        let shape = circuit.shape()?;
        if phase1.size() < shape.domain_size {
            return Err(Error::Phase1TooSmall {
                required: shape.domain_size,
                available: phase1.size(),
            });
        }
        if phase1.size() != shape.domain_size {
            return Err(Error::InvalidLength {
                expected: shape.domain_size,
                got: phase1.size(),
            });
        }
        info!(
            num_inputs = shape.num_inputs,
            num_aux = shape.num_aux,
            num_constraints = shape.num_constraints,
            domain_size = shape.domain_size,
            "evaluating the circuit over the phase 1 parameters"
        );

        let qap = circuit.to_qap();
        let evaluated = eval::<E>(
            &phase1.coeffs_g1,
            &phase1.coeffs_g2,
            &phase1.alpha_coeffs_g1,
            &phase1.beta_coeffs_g1,
            &qap.at,
            &qap.bt,
            &qap.ct,
            shape.num_inputs,
        );

        let params = Accumulator {
            alpha_g1: phase1.alpha_g1,
            beta_g1: phase1.beta_g1,
            beta_g2: phase1.beta_g2,
            gamma_g2: E::G2Affine::generator(),
            delta_g1: E::G1Affine::generator(),
            delta_g2: E::G2Affine::generator(),
            ic: evaluated.ic,
            h: phase1.h_g1.clone(),
            l: evaluated.l,
            a: evaluated.a_g1,
            b_g1: evaluated.b_g1,
            b_g2: evaluated.b_g2,
        };
        params.check_shape(&shape)?;

        let digest = compute_digest(&params, &blank_hash())?;
        info!(digest = %hex::encode(&digest[..]), "created the initial parameters");
        Ok(MPCParameters {
            shape,
            cs_hash: circuit.hash()?,
            params,
            contributions: vec![],
            digest,
        })
    }

    /// Contributes `delta` to the parameters and returns the new transcript digest.
    /// The auxiliary randomness of the proof of knowledge is drawn from `rng`.
    /// The parameters are left untouched if anything fails.
    pub fn contribute<R: Rng>(&mut self, delta: &E::ScalarField, rng: &mut R) -> Result<[u8; HASH_SIZE]> {
        let span = info_span!("phase2-contribution", index = self.contributions.len());
        let _enter = span.enter();

        self.shape.validate()?;
        self.params.check_shape(&self.shape)?;

        let mut params = self.params.clone();
        params.apply_delta(delta)?;
        let (public_key, _) = keypair::<E, _>(rng, *delta, &self.digest)?;
        let digest = compute_digest(&params, &self.digest)?;

        self.params = params;
        self.contributions.push(public_key);
        self.digest = digest;

        info!(digest = %hex::encode(&digest[..]), "contribution applied");
        Ok(digest)
    }

    /// Contributes the secret derived from mixed entropy.
    pub fn contribute_with_entropy(&mut self, randomness: &Randomness) -> Result<[u8; HASH_SIZE]> {
        self.contribute(&randomness.delta(), &mut randomness.rng())
    }

    /// Applies the final, publicly reproducible contribution.
    pub fn apply_beacon(&mut self, seed: &[u8], iterations: u64) -> Result<[u8; HASH_SIZE]> {
        info!(seed = %hex::encode(seed), iterations, "applying the random beacon");
        self.contribute_with_entropy(&beacon_randomness(seed, iterations))
    }

    /// Checks this is an untouched file created by [`MPCParameters::new`].
    pub fn verify_initial(&self) -> Result<()> {
        self.shape.validate()?;
        self.params.check_shape(&self.shape)?;
        if !self.contributions.is_empty() {
            return Err(VerificationError::UnexpectedContributionCount(self.contributions.len()).into());
        }
        if self.params.gamma_g2 != E::G2Affine::generator() {
            return Err(VerificationError::InvalidGenerator("gamma_g2").into());
        }
        if self.params.delta_g1 != E::G1Affine::generator() {
            return Err(VerificationError::InvalidGenerator("delta_g1").into());
        }
        if self.params.delta_g2 != E::G2Affine::generator() {
            return Err(VerificationError::InvalidGenerator("delta_g2").into());
        }
        if compute_digest(&self.params, &blank_hash())? != self.digest {
            return Err(VerificationError::TranscriptBroken.into());
        }
        Ok(())
    }

    /// Checks the file is exactly what [`MPCParameters::new`] derives from
    /// the phase 1 parameters and the circuit.
    pub fn verify_initialization(&self, circuit: &R1CS<E::ScalarField>, phase1: &Groth16Params<E>) -> Result<()> {
        self.verify_initial()?;
        let expected = Self::new(circuit, phase1)?;
        if expected.shape != self.shape {
            return Err(VerificationError::ShapeMismatch.into());
        }
        if expected.cs_hash != self.cs_hash {
            return Err(VerificationError::CircuitMismatch.into());
        }
        if expected != *self {
            return Err(VerificationError::InitialParametersMismatch.into());
        }
        Ok(())
    }

    /// Checks the last contribution is the beacon derived from `seed`.
    pub fn verify_beacon(&self, seed: &[u8], iterations: u64) -> Result<()> {
        let last = self
            .contributions
            .last()
            .ok_or(VerificationError::UnexpectedContributionCount(0))?;
        let randomness = beacon_randomness(seed, iterations);
        let (expected, _) = keypair::<E, _>(&mut randomness.rng(), randomness.delta(), &last.transcript)?;
        if &expected != last {
            return Err(VerificationError::BeaconMismatch.into());
        }
        Ok(())
    }

    /// Verifies that `after` is this file plus exactly one valid contribution.
    pub fn verify(&self, after: &Self) -> Result<()> {
        let before = self;
        if before.shape != after.shape {
            return Err(VerificationError::ShapeMismatch.into());
        }
        if before.cs_hash != after.cs_hash {
            return Err(VerificationError::CircuitMismatch.into());
        }
        after.params.check_shape(&after.shape)?;

        let new_contributions = after.contributions.len().saturating_sub(before.contributions.len());
        if new_contributions != 1 {
            return Err(VerificationError::UnexpectedContributionCount(new_contributions).into());
        }
        if before.contributions[..] != after.contributions[..before.contributions.len()] {
            return Err(VerificationError::HistoryAltered.into());
        }

        let pubkey = &after.contributions[before.contributions.len()];
        if pubkey.transcript != before.digest {
            return Err(VerificationError::WrongPredecessor.into());
        }
        if compute_digest(&after.params, &before.digest)? != after.digest {
            return Err(VerificationError::TranscriptBroken.into());
        }

        after.params.check_unchanged(&before.params)?;

        // the proof pair and the proof of knowledge
        pubkey.verify(&before.digest)?;

        let g1 = E::G1Affine::generator();
        let g2 = E::G2Affine::generator();

        // delta was multiplied by the contributed secret
        check_same_ratio::<E>(
            &(before.params.delta_g1, after.params.delta_g1),
            &(g2, pubkey.delta_g2),
            "delta_g1",
        )?;
        check_same_ratio::<E>(
            &(g1, pubkey.delta_g1),
            &(before.params.delta_g2, after.params.delta_g2),
            "delta_g2",
        )?;

        // h and l were divided by it
        check_section_ratio::<E>(&after.params.h, &before.params.h, &pubkey.delta_g2, "h")?;
        check_section_ratio::<E>(&after.params.l, &before.params.l, &pubkey.delta_g2, "l")?;

        debug!(index = before.contributions.len(), "contribution verified");
        Ok(())
    }

    /// Serializes the parameters.
    pub fn write<W: Write>(&self, writer: &mut W, compressed: UseCompression) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&[compressed.to_byte()])?;
        for n in &[
            self.shape.num_inputs,
            self.shape.num_aux,
            self.shape.num_constraints,
            self.shape.domain_size,
        ] {
            writer.write_all(&(*n as u64).to_le_bytes())?;
        }
        writer.write_all(&self.cs_hash)?;
        self.params.write(writer, compressed)?;
        writer.write_all(&(self.contributions.len() as u64).to_le_bytes())?;
        for pubkey in &self.contributions {
            pubkey.write(writer, compressed)?;
        }
        writer.write_all(&self.digest)?;
        Ok(())
    }

    /// Deserializes the parameters. Every length is checked against the
    /// header before any element is decoded, and the whole input must be consumed.
    pub fn read(mut reader: &[u8], check: CheckForCorrectness) -> Result<Self> {
        let reader = &mut reader;
        if read_bytes(reader, MAGIC.len())? != &MAGIC[..] {
            return Err(Error::corrupt("not a phase 2 parameter file"));
        }
        let mut version = [0u8; 4];
        version.copy_from_slice(read_bytes(reader, 4)?);
        let version = u32::from_le_bytes(version);
        if version != VERSION {
            return Err(Error::corrupt(format!("unsupported version {}", version)));
        }
        let compressed = UseCompression::from_byte(read_bytes(reader, 1)?[0])?;

        let shape = CircuitShape {
            num_inputs: read_dimension(reader)?,
            num_aux: read_dimension(reader)?,
            num_constraints: read_dimension(reader)?,
            domain_size: read_dimension(reader)?,
        };
        shape
            .validate()
            .map_err(|e| Error::corrupt(format!("invalid circuit shape: {}", e)))?;

        let mut cs_hash = [0u8; HASH_SIZE];
        cs_hash.copy_from_slice(read_bytes(reader, HASH_SIZE)?);

        let params = Accumulator::read(reader, &shape, compressed, check)?;

        let count = read_u64(reader)?;
        if count.saturating_mul(PublicKey::<E>::size(compressed) as u64) > reader.len() as u64 {
            return Err(Error::corrupt(format!(
                "declared {} contributions but only {} bytes remain",
                count,
                reader.len()
            )));
        }
        let contributions = (0..count)
            .map(|_| PublicKey::read(reader, compressed, check))
            .collect::<Result<Vec<_>>>()?;

        let mut digest = [0u8; HASH_SIZE];
        digest.copy_from_slice(read_bytes(reader, HASH_SIZE)?);
        if !reader.is_empty() {
            return Err(Error::corrupt(format!("{} trailing bytes", reader.len())));
        }

        debug!(contributions = contributions.len(), compressed = %compressed, "read parameters");
        Ok(MPCParameters {
            shape,
            cs_hash,
            params,
            contributions,
            digest,
        })
    }

    /// The transcript digest as hex, to be published by the contributor.
    pub fn digest_hex(&self) -> String {
        hex::encode(&self.digest[..])
    }

    /// The Groth16 key pair defined by the current parameters.
    pub fn keypair(&self) -> (ProvingKey<E>, VerifyingKey<E>) {
        (self.proving_key(), self.verifying_key())
    }

    /// The Groth16 proving key, which embeds the verifying key.
    pub fn proving_key(&self) -> ProvingKey<E> {
        ProvingKey {
            vk: self.verifying_key(),
            beta_g1: self.params.beta_g1,
            delta_g1: self.params.delta_g1,
            a_query: self.params.a.clone(),
            b_g1_query: self.params.b_g1.clone(),
            b_g2_query: self.params.b_g2.clone(),
            h_query: self.params.h.clone(),
            l_query: self.params.l.clone(),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey<E> {
        VerifyingKey {
            alpha_g1: self.params.alpha_g1,
            beta_g2: self.params.beta_g2,
            gamma_g2: self.params.gamma_g2,
            delta_g2: self.params.delta_g2,
            gamma_abc_g1: self.params.ic.clone(),
        }
    }
}

fn read_dimension(reader: &mut &[u8]) -> Result<usize> {
    let n = read_u64(reader)?;
    if n > u32::MAX as u64 {
        return Err(Error::corrupt(format!("circuit dimension {} is too large", n)));
    }
    Ok(n as usize)
}

/// `Blake2b(uncompressed accumulator || previous)`.
fn compute_digest<E: Pairing>(params: &Accumulator<E>, previous: &[u8]) -> Result<[u8; HASH_SIZE]> {
    let mut sink = HashWriter::sink();
    params.write(&mut sink, UseCompression::No)?;
    sink.write_all(previous)?;
    let mut digest = [0u8; HASH_SIZE];
    digest.copy_from_slice(&sink.into_hash());
    Ok(digest)
}

/// Checks `after[i] * delta == before[i]` for every `i` through a random
/// linear combination. Sections made only of the point at infinity have no
/// ratio and must be unchanged instead.
fn check_section_ratio<E: Pairing>(
    after: &[E::G1Affine],
    before: &[E::G1Affine],
    delta_g2: &E::G2Affine,
    section: &'static str,
) -> Result<()> {
    let (merged_after, merged_before) = merge_pairs::<E::G1>(after, before)?;
    let zero = E::G1Affine::zero();
    if merged_after == zero && merged_before == zero {
        if after != before {
            return Err(VerificationError::InvalidRatio(section).into());
        }
        return Ok(());
    }
    check_same_ratio::<E>(
        &(merged_after, merged_before),
        &(E::G2Affine::generator(), *delta_g2),
        section,
    )
}
