use ark_ff::{Field, PrimeField};
use ark_relations::{
    lc,
    r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable},
};

/// Proves knowledge of `x` such that `x^3 + x + 5 = y` for a public `y`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicCircuit<F: PrimeField> {
    pub x: Option<F>,
}

impl<F: PrimeField> CubicCircuit<F> {
    pub fn new(x: F) -> Self {
        CubicCircuit { x: Some(x) }
    }

    /// The public input `y` for the witness.
    pub fn output(&self) -> Option<F> {
        self.x.map(|x| x * x * x + x + F::from(5u64))
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for CubicCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let x_val = self.x;
        let x2_val = x_val.map(|x| x * x);
        let x3_val = x2_val.and_then(|x2| x_val.map(|x| x2 * x));
        let y_val = self.output();

        let x = cs.new_witness_variable(|| x_val.ok_or(SynthesisError::AssignmentMissing))?;
        let x2 = cs.new_witness_variable(|| x2_val.ok_or(SynthesisError::AssignmentMissing))?;
        let x3 = cs.new_witness_variable(|| x3_val.ok_or(SynthesisError::AssignmentMissing))?;
        let y = cs.new_input_variable(|| y_val.ok_or(SynthesisError::AssignmentMissing))?;

        cs.enforce_constraint(lc!() + x, lc!() + x, lc!() + x2)?;
        cs.enforce_constraint(lc!() + x2, lc!() + x, lc!() + x3)?;
        cs.enforce_constraint(
            lc!() + x3 + x + (F::from(5u64), Variable::One),
            lc!() + Variable::One,
            lc!() + y,
        )?;
        Ok(())
    }
}

/// Squares `x` repeatedly and exposes the last square, one constraint per squaring.
#[derive(Debug, Clone, Copy)]
pub struct SquaringCircuit<F: PrimeField> {
    pub x: Option<F>,
    pub num_squarings: usize,
}

impl<F: PrimeField> SquaringCircuit<F> {
    pub fn new(x: Option<F>, num_squarings: usize) -> Self {
        SquaringCircuit { x, num_squarings }
    }

    pub fn output(&self) -> Option<F> {
        self.x.map(|mut x| {
            for _ in 0..self.num_squarings {
                x.square_in_place();
            }
            x
        })
    }
}

impl<F: PrimeField> ConstraintSynthesizer<F> for SquaringCircuit<F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let mut value = self.x;
        let mut current = cs.new_witness_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?;
        for i in 0..self.num_squarings {
            value = value.map(|v| v * v);
            let next = if i + 1 == self.num_squarings {
                cs.new_input_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?
            } else {
                cs.new_witness_variable(|| value.ok_or(SynthesisError::AssignmentMissing))?
            };
            cs.enforce_constraint(lc!() + current, lc!() + current, lc!() + next)?;
            current = next;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::Fr;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn cubic_circuit_is_satisfied() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        CubicCircuit::new(Fr::from(3u64)).generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), 3);
        assert_eq!(cs.num_instance_variables(), 2);
        assert_eq!(cs.num_witness_variables(), 3);
        assert_eq!(CubicCircuit::new(Fr::from(3u64)).output(), Some(Fr::from(35u64)));
    }

    #[test]
    fn squaring_circuit_is_satisfied() {
        let cs = ConstraintSystem::<Fr>::new_ref();
        SquaringCircuit::new(Some(Fr::from(2u64)), 3)
            .generate_constraints(cs.clone())
            .unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(cs.num_constraints(), 3);
        assert_eq!(cs.num_instance_variables(), 2);
        assert_eq!(cs.num_witness_variables(), 3);
        assert_eq!(SquaringCircuit::new(Some(Fr::from(2u64)), 3).output(), Some(Fr::from(256u64)));
    }
}
