//! The rank-1 constraint system consumed by the ceremony.
//!
//! Variables are numbered with the public inputs first, starting with the
//! constant one at index 0, followed by the private (auxiliary) variables.
//! This is the column order of `ark_relations` constraint matrices.

use crate::polynomial::Column;
use setup_utils::{Error, HashWriter, Result, HASH_SIZE};

use ark_ff::PrimeField;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem, OptimizationGoal, SynthesisMode};
use ark_serialize::CanonicalSerialize;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::{io::Write, str::FromStr};

/// Largest circuit dimension accepted, the limit of the parameter file header.
pub const MAX_DIMENSION: usize = u32::MAX as usize;

/// The dimensions of a circuit. Fixes the length of every accumulator section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitShape {
    /// Public inputs, including the constant one.
    pub num_inputs: usize,
    pub num_aux: usize,
    pub num_constraints: usize,
    /// Size of the evaluation domain, a power of two.
    pub domain_size: usize,
}

impl CircuitShape {
    pub fn new(num_inputs: usize, num_aux: usize, num_constraints: usize) -> Result<Self> {
        let shape = CircuitShape {
            num_inputs,
            num_aux,
            num_constraints,
            domain_size: required_domain_size(num_constraints, num_inputs)?,
        };
        shape.validate()?;
        Ok(shape)
    }

    pub fn num_variables(&self) -> usize {
        self.num_inputs + self.num_aux
    }

    /// The length of the `h` query.
    pub fn h_len(&self) -> usize {
        self.domain_size - 1
    }

    /// Checks the shape is self-consistent.
    pub fn validate(&self) -> Result<()> {
        if self.num_inputs == 0 {
            return Err(Error::InvalidCircuit("the constant one input is missing".to_string()));
        }
        check_dimension("num_inputs", self.num_inputs)?;
        check_dimension("num_aux", self.num_aux)?;
        check_dimension("num_constraints", self.num_constraints)?;
        let expected = required_domain_size(self.num_constraints, self.num_inputs)?;
        if self.domain_size != expected {
            return Err(Error::InvalidPhase2Size(self.domain_size));
        }
        Ok(())
    }
}

/// The smallest radix-2 domain holding every constraint plus one
/// input-consistency row per public input.
pub fn required_domain_size(num_constraints: usize, num_inputs: usize) -> Result<usize> {
    num_constraints
        .checked_add(num_inputs)
        .and_then(usize::checked_next_power_of_two)
        .map(|size| size.max(2))
        .ok_or_else(|| {
            Error::InvalidCircuit(format!(
                "{} constraints and {} inputs do not fit an evaluation domain",
                num_constraints, num_inputs
            ))
        })
}

fn check_dimension(name: &str, value: usize) -> Result<()> {
    if value > MAX_DIMENSION {
        return Err(Error::InvalidCircuit(format!(
            "{} is {}, the limit is {}",
            name, value, MAX_DIMENSION
        )));
    }
    Ok(())
}

/// A single constraint `<a, z> * <b, z> = <c, z>`, as sparse `(coefficient, variable)` rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint<F: PrimeField> {
    pub a: Vec<(F, usize)>,
    pub b: Vec<(F, usize)>,
    pub c: Vec<(F, usize)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct R1CS<F: PrimeField> {
    pub num_inputs: usize,
    pub num_aux: usize,
    pub constraints: Vec<Constraint<F>>,
}

/// The QAP columns of a circuit, indexed by variable.
pub struct Qap<F> {
    pub at: Vec<Column<F>>,
    pub bt: Vec<Column<F>>,
    pub ct: Vec<Column<F>>,
}

impl<F: PrimeField> R1CS<F> {
    /// Synthesizes the circuit in setup mode, the same way the Groth16 prover does.
    pub fn from_synthesizer<C: ConstraintSynthesizer<F>>(circuit: C) -> Result<Self> {
        let cs = ConstraintSystem::new_ref();
        cs.set_optimization_goal(OptimizationGoal::Constraints);
        cs.set_mode(SynthesisMode::Setup);
        circuit
            .generate_constraints(cs.clone())
            .map_err(|e| Error::InvalidCircuit(e.to_string()))?;
        cs.finalize();

        let matrices = cs
            .to_matrices()
            .ok_or_else(|| Error::InvalidCircuit("the constraint system has no matrices".to_string()))?;
        let constraints = matrices
            .a
            .into_iter()
            .zip(matrices.b)
            .zip(matrices.c)
            .map(|((a, b), c)| Constraint { a, b, c })
            .collect::<Vec<_>>();

        let r1cs = R1CS {
            num_inputs: matrices.num_instance_variables,
            num_aux: matrices.num_witness_variables,
            constraints,
        };
        r1cs.validate()?;
        debug!(
            num_inputs = r1cs.num_inputs,
            num_aux = r1cs.num_aux,
            num_constraints = r1cs.constraints.len(),
            "synthesized circuit"
        );
        Ok(r1cs)
    }

    pub fn shape(&self) -> Result<CircuitShape> {
        CircuitShape::new(self.num_inputs, self.num_aux, self.constraints.len())
    }

    /// Every variable index must refer to an input or an auxiliary variable.
    pub fn validate(&self) -> Result<()> {
        let num_variables = self.shape()?.num_variables();
        for (i, constraint) in self.constraints.iter().enumerate() {
            for row in &[&constraint.a, &constraint.b, &constraint.c] {
                if let Some((_, var)) = row.iter().find(|(_, var)| *var >= num_variables) {
                    return Err(Error::InvalidCircuit(format!(
                        "constraint {} references variable {}, but there are only {}",
                        i, var, num_variables
                    )));
                }
            }
        }
        Ok(())
    }

    /// Transposes the constraints into per-variable QAP columns. The input
    /// consistency rows place `L_{num_constraints + i}` in the `a` column of
    /// input `i`.
    pub fn to_qap(&self) -> Qap<F> {
        let num_variables = self.num_inputs + self.num_aux;
        let mut at = vec![vec![]; num_variables];
        let mut bt = vec![vec![]; num_variables];
        let mut ct = vec![vec![]; num_variables];

        for (i, constraint) in self.constraints.iter().enumerate() {
            for &(coeff, var) in &constraint.a {
                at[var].push((coeff, i));
            }
            for &(coeff, var) in &constraint.b {
                bt[var].push((coeff, i));
            }
            for &(coeff, var) in &constraint.c {
                ct[var].push((coeff, i));
            }
        }

        let num_constraints = self.constraints.len();
        for (i, column) in at.iter_mut().enumerate().take(self.num_inputs) {
            column.push((F::one(), num_constraints + i));
        }

        Qap { at, bt, ct }
    }

    /// Blake2b hash of the canonical encoding of the constraint system.
    pub fn hash(&self) -> Result<[u8; HASH_SIZE]> {
        let mut hasher = HashWriter::sink();
        for n in &[self.num_inputs, self.num_aux, self.constraints.len()] {
            (*n as u64).serialize_uncompressed(&mut hasher)?;
        }
        for constraint in &self.constraints {
            for row in &[&constraint.a, &constraint.b, &constraint.c] {
                (row.len() as u64).serialize_uncompressed(&mut hasher)?;
                for (coeff, var) in row.iter() {
                    (*var as u64).serialize_uncompressed(&mut hasher)?;
                    coeff.serialize_uncompressed(&mut hasher)?;
                }
            }
        }
        hasher.flush()?;
        let mut hash = [0u8; HASH_SIZE];
        hash.copy_from_slice(&hasher.into_hash());
        Ok(hash)
    }

    /// Parses the JSON description of a circuit. Coefficients are decimal strings.
    pub fn from_json(json: &str) -> Result<Self> {
        let file: R1CSFile = serde_json::from_str(json).map_err(|e| Error::InvalidCircuit(e.to_string()))?;
        let parse_row = |row: Vec<(usize, String)>| {
            row.into_iter()
                .map(|(var, coeff)| {
                    F::from_str(coeff.trim())
                        .map(|coeff| (coeff, var))
                        .map_err(|_| Error::InvalidCircuit(format!("invalid coefficient {:?}", coeff)))
                })
                .collect::<Result<Vec<_>>>()
        };
        let constraints = file
            .constraints
            .into_iter()
            .map(|c| {
                Ok(Constraint {
                    a: parse_row(c.a)?,
                    b: parse_row(c.b)?,
                    c: parse_row(c.c)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let r1cs = R1CS {
            num_inputs: file.num_inputs,
            num_aux: file.num_aux,
            constraints,
        };
        r1cs.validate()?;
        Ok(r1cs)
    }

    pub fn to_json(&self) -> Result<String> {
        let row = |row: &[(F, usize)]| {
            row.iter()
                .map(|(coeff, var)| (*var, coeff.into_bigint().to_string()))
                .collect::<Vec<_>>()
        };
        let file = R1CSFile {
            num_inputs: self.num_inputs,
            num_aux: self.num_aux,
            constraints: self
                .constraints
                .iter()
                .map(|c| ConstraintFile {
                    a: row(&c.a),
                    b: row(&c.b),
                    c: row(&c.c),
                })
                .collect(),
        };
        serde_json::to_string_pretty(&file).map_err(|e| Error::InvalidCircuit(e.to_string()))
    }
}

#[derive(Serialize, Deserialize)]
struct R1CSFile {
    num_inputs: usize,
    num_aux: usize,
    constraints: Vec<ConstraintFile>,
}

#[derive(Serialize, Deserialize)]
struct ConstraintFile {
    a: Vec<(usize, String)>,
    b: Vec<(usize, String)>,
    c: Vec<(usize, String)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use test_helpers::CubicCircuit;

    #[test]
    fn synthesizes_cubic_circuit() {
        let r1cs = R1CS::<Fr>::from_synthesizer(CubicCircuit::<Fr>::default()).unwrap();
        assert_eq!(r1cs.num_inputs, 2);
        assert_eq!(r1cs.num_aux, 3);
        assert_eq!(r1cs.constraints.len(), 3);

        let shape = r1cs.shape().unwrap();
        assert_eq!(shape.domain_size, 8);
        assert_eq!(shape.h_len(), 7);
        assert_eq!(shape.num_variables(), 5);
    }

    #[test]
    fn qap_has_input_rows() {
        let r1cs = R1CS::<Fr>::from_synthesizer(CubicCircuit::<Fr>::default()).unwrap();
        let qap = r1cs.to_qap();
        assert_eq!(qap.at.len(), 5);
        // consistency rows follow the three constraints
        assert!(qap.at[0].contains(&(Fr::from(1u64), 3)));
        assert!(qap.at[1].contains(&(Fr::from(1u64), 4)));
        assert!(qap.bt[0].iter().all(|(_, lag)| *lag < 3));
    }

    #[test]
    fn json_round_trip_keeps_hash() {
        let r1cs = R1CS::<Fr>::from_synthesizer(CubicCircuit::<Fr>::default()).unwrap();
        let json = r1cs.to_json().unwrap();
        let parsed = R1CS::<Fr>::from_json(&json).unwrap();
        assert_eq!(parsed, r1cs);
        assert_eq!(parsed.hash().unwrap(), r1cs.hash().unwrap());

        let mut other = r1cs.clone();
        other.constraints[0].a[0].0 += Fr::from(1u64);
        assert_ne!(other.hash().unwrap(), r1cs.hash().unwrap());
    }

    #[test]
    fn rejects_invalid_circuits() {
        let json = r#"{ "num_inputs": 1, "num_aux": 1, "constraints": [
            { "a": [[0, "1"]], "b": [[1, "2"]], "c": [[2, "3"]] }
        ] }"#;
        let err = R1CS::<Fr>::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidCircuit(_)));

        let json = r#"{ "num_inputs": 1, "num_aux": 1, "constraints": [
            { "a": [[0, "one"]], "b": [], "c": [] }
        ] }"#;
        assert!(R1CS::<Fr>::from_json(json).is_err());

        let json = r#"{ "num_inputs": 0, "num_aux": 1, "constraints": [] }"#;
        assert!(R1CS::<Fr>::from_json(json).is_err());

        assert!(R1CS::<Fr>::from_json("not json").is_err());
    }

    #[test]
    fn rejects_oversized_dimensions() {
        // the sum of inputs and variables overflows
        let json = r#"{ "num_inputs": 18446744073709551615, "num_aux": 1, "constraints": [] }"#;
        let err = R1CS::<Fr>::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidCircuit(_)), "{:?}", err);

        // the domain size overflows
        let json = r#"{ "num_inputs": 18446744073709551615, "num_aux": 0, "constraints": [] }"#;
        let err = R1CS::<Fr>::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidCircuit(_)), "{:?}", err);

        // representable, but larger than a parameter file can describe
        let json = r#"{ "num_inputs": 1, "num_aux": 4294967296, "constraints": [] }"#;
        let err = R1CS::<Fr>::from_json(json).unwrap_err();
        assert!(matches!(err, Error::InvalidCircuit(_)), "{:?}", err);

        assert!(matches!(
            CircuitShape::new(usize::MAX, 0, 1),
            Err(Error::InvalidCircuit(_))
        ));
        assert_eq!(required_domain_size(3, 2).unwrap(), 8);
        assert!(required_domain_size(usize::MAX, 1).is_err());
    }
}
