use crate::circuit::CircuitShape;
use setup_utils::{
    batch_mul,
    elements::{read_element, read_vec_exact, write_element, write_vec},
    CheckForCorrectness,
    Error,
    Result,
    UseCompression,
    VerificationError,
};

use ark_ec::pairing::Pairing;
use ark_ff::Field;
use tracing::trace;

use std::{fmt, io::Write};

/// The sections of the accumulator, in their serialization order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    AlphaG1,
    BetaG1,
    BetaG2,
    GammaG2,
    DeltaG1,
    DeltaG2,
    Ic,
    H,
    L,
    A,
    BG1,
    BG2,
}

impl Section {
    pub const ALL: [Section; 12] = [
        Section::AlphaG1,
        Section::BetaG1,
        Section::BetaG2,
        Section::GammaG2,
        Section::DeltaG1,
        Section::DeltaG2,
        Section::Ic,
        Section::H,
        Section::L,
        Section::A,
        Section::BG1,
        Section::BG2,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Section::AlphaG1 => "alpha_g1",
            Section::BetaG1 => "beta_g1",
            Section::BetaG2 => "beta_g2",
            Section::GammaG2 => "gamma_g2",
            Section::DeltaG1 => "delta_g1",
            Section::DeltaG2 => "delta_g2",
            Section::Ic => "ic",
            Section::H => "h",
            Section::L => "l",
            Section::A => "a",
            Section::BG1 => "b_g1",
            Section::BG2 => "b_g2",
        }
    }

    /// The power of delta a contribution multiplies this section by.
    pub fn delta_exponent(self) -> i8 {
        match self {
            Section::DeltaG1 | Section::DeltaG2 => 1,
            Section::H | Section::L => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The Groth16 parameters being built by the ceremony.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accumulator<E: Pairing> {
    pub alpha_g1: E::G1Affine,
    pub beta_g1: E::G1Affine,
    pub beta_g2: E::G2Affine,
    pub gamma_g2: E::G2Affine,
    pub delta_g1: E::G1Affine,
    pub delta_g2: E::G2Affine,
    pub ic: Vec<E::G1Affine>,
    pub h: Vec<E::G1Affine>,
    pub l: Vec<E::G1Affine>,
    pub a: Vec<E::G1Affine>,
    pub b_g1: Vec<E::G1Affine>,
    pub b_g2: Vec<E::G2Affine>,
}

impl<E: Pairing> Accumulator<E> {
    /// Number of elements a section must hold for the given circuit.
    pub fn expected_len(section: Section, shape: &CircuitShape) -> usize {
        match section {
            Section::Ic => shape.num_inputs,
            Section::H => shape.h_len(),
            Section::L => shape.num_aux,
            Section::A | Section::BG1 | Section::BG2 => shape.num_variables(),
            _ => 1,
        }
    }

    pub fn len(&self, section: Section) -> usize {
        match section {
            Section::Ic => self.ic.len(),
            Section::H => self.h.len(),
            Section::L => self.l.len(),
            Section::A => self.a.len(),
            Section::BG1 => self.b_g1.len(),
            Section::BG2 => self.b_g2.len(),
            _ => 1,
        }
    }

    /// Checks every section has the length the circuit shape implies.
    pub fn check_shape(&self, shape: &CircuitShape) -> Result<()> {
        for section in Section::ALL.iter() {
            let expected = Self::expected_len(*section, shape);
            let got = self.len(*section);
            if expected != got {
                return Err(Error::MalformedAccumulator {
                    section: section.name(),
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    /// Multiplies every section by its power of `delta`.
    pub fn apply_delta(&mut self, delta: &E::ScalarField) -> Result<()> {
        let delta_inv = delta
            .inverse()
            .ok_or(Error::InsufficientEntropy("the contribution scalar must not be zero"))?;

        self.delta_g1 = batch_mul(&[self.delta_g1], delta)[0];
        self.delta_g2 = batch_mul(&[self.delta_g2], delta)[0];

        let (h, l) = rayon::join(|| batch_mul(&self.h, &delta_inv), || batch_mul(&self.l, &delta_inv));
        self.h = h;
        self.l = l;
        trace!(h = self.h.len(), l = self.l.len(), "applied delta");
        Ok(())
    }

    /// Returns the first delta-independent section that differs between the two accumulators.
    pub fn check_unchanged(&self, other: &Self) -> std::result::Result<(), VerificationError> {
        let changed = Section::ALL
            .iter()
            .filter(|section| section.delta_exponent() == 0)
            .find(|section| match section {
                Section::AlphaG1 => self.alpha_g1 != other.alpha_g1,
                Section::BetaG1 => self.beta_g1 != other.beta_g1,
                Section::BetaG2 => self.beta_g2 != other.beta_g2,
                Section::GammaG2 => self.gamma_g2 != other.gamma_g2,
                Section::Ic => self.ic != other.ic,
                Section::A => self.a != other.a,
                Section::BG1 => self.b_g1 != other.b_g1,
                Section::BG2 => self.b_g2 != other.b_g2,
                _ => false,
            });
        match changed {
            Some(section) => Err(VerificationError::ImmutableElementChanged(section.name())),
            None => Ok(()),
        }
    }

    pub fn write<W: Write>(&self, writer: &mut W, compressed: UseCompression) -> Result<()> {
        write_element(writer, &self.alpha_g1, compressed)?;
        write_element(writer, &self.beta_g1, compressed)?;
        write_element(writer, &self.beta_g2, compressed)?;
        write_element(writer, &self.gamma_g2, compressed)?;
        write_element(writer, &self.delta_g1, compressed)?;
        write_element(writer, &self.delta_g2, compressed)?;
        write_vec(writer, &self.ic, compressed)?;
        write_vec(writer, &self.h, compressed)?;
        write_vec(writer, &self.l, compressed)?;
        write_vec(writer, &self.a, compressed)?;
        write_vec(writer, &self.b_g1, compressed)?;
        write_vec(writer, &self.b_g2, compressed)?;
        Ok(())
    }

    /// Reads an accumulator whose section lengths must match `shape`.
    /// Only `h` is required to be free of the point at infinity, the other
    /// vectors hold it for variables a polynomial does not use.
    pub fn read(
        reader: &mut &[u8],
        shape: &CircuitShape,
        compressed: UseCompression,
        check: CheckForCorrectness,
    ) -> Result<Self> {
        let sparse = check.allowing_zero();
        let len = |section| Self::expected_len(section, shape);
        Ok(Accumulator {
            alpha_g1: read_element(reader, compressed, check)?,
            beta_g1: read_element(reader, compressed, check)?,
            beta_g2: read_element(reader, compressed, check)?,
            gamma_g2: read_element(reader, compressed, check)?,
            delta_g1: read_element(reader, compressed, check)?,
            delta_g2: read_element(reader, compressed, check)?,
            ic: read_vec_exact(reader, len(Section::Ic), "ic", compressed, sparse)?,
            h: read_vec_exact(reader, len(Section::H), "h", compressed, check)?,
            l: read_vec_exact(reader, len(Section::L), "l", compressed, sparse)?,
            a: read_vec_exact(reader, len(Section::A), "a", compressed, sparse)?,
            b_g1: read_vec_exact(reader, len(Section::BG1), "b_g1", compressed, sparse)?,
            b_g2: read_vec_exact(reader, len(Section::BG2), "b_g2", compressed, sparse)?,
        })
    }
}
