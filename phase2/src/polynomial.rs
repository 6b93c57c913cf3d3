use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup, VariableBaseMSM};
use ark_std::Zero;

use rayon::prelude::*;

/// A QAP polynomial of a single variable, as sparse `(coefficient, lagrange index)` pairs.
pub type Column<F> = Vec<(F, usize)>;

/// The evaluated QAP in both groups, one element per variable.
pub struct EvaluatedQap<E: Pairing> {
    pub a_g1: Vec<E::G1Affine>,
    pub b_g1: Vec<E::G1Affine>,
    pub b_g2: Vec<E::G2Affine>,
    pub ic: Vec<E::G1Affine>,
    pub l: Vec<E::G1Affine>,
}

/// Evaluates and returns the provided QAP Polynomial vectors at the provided coefficients.
/// `ic` holds `beta * a + alpha * b + c` of the first `num_inputs` variables, `l` that of the rest.
/// The returned points are _affine_
#[allow(clippy::too_many_arguments)]
pub fn eval<E: Pairing>(
    // Lagrange coefficients for tau
    coeffs_g1: &[E::G1Affine],
    coeffs_g2: &[E::G2Affine],
    alpha_coeffs_g1: &[E::G1Affine],
    beta_coeffs_g1: &[E::G1Affine],
    // QAP polynomials
    at: &[Column<E::ScalarField>],
    bt: &[Column<E::ScalarField>],
    ct: &[Column<E::ScalarField>],
    // The number of inputs
    num_inputs: usize,
) -> EvaluatedQap<E> {
    // calculate the evaluated polynomials
    let a_g1 = dot_product_vec(at, coeffs_g1);
    let b_g1 = dot_product_vec(bt, coeffs_g1);
    let b_g2 = dot_product_vec(bt, coeffs_g2);
    let mut ext = dot_product_ext::<E>((at, beta_coeffs_g1), (bt, alpha_coeffs_g1), (ct, coeffs_g1));

    // break to `ic` and `l` coeffs
    let l = ext.split_off(num_inputs);

    EvaluatedQap {
        a_g1,
        b_g1,
        b_g2,
        ic: ext,
        l,
    }
}

#[allow(clippy::type_complexity)]
fn dot_product_ext<E: Pairing>(
    (at, beta_coeffs_g1): (&[Column<E::ScalarField>], &[E::G1Affine]),
    (bt, alpha_coeffs_g1): (&[Column<E::ScalarField>], &[E::G1Affine]),
    (ct, coeffs_g1): (&[Column<E::ScalarField>], &[E::G1Affine]),
) -> Vec<E::G1Affine> {
    let ret = at
        .par_iter()
        .zip(bt.par_iter().zip(ct))
        .map(|(at, (bt, ct))| {
            dot_product(at, beta_coeffs_g1) + dot_product(bt, alpha_coeffs_g1) + dot_product(ct, coeffs_g1)
        })
        .collect::<Vec<_>>();
    E::G1::normalize_batch(&ret)
}

/// Returns a batch normalized vector where the coefficients
/// have been applied to the input
/// This is a NxN * Nx1 -> Nx1 matrix multiplication basically
fn dot_product_vec<C: AffineRepr>(input: &[Column<C::ScalarField>], coeffs: &[C]) -> Vec<C> {
    let ret = input
        .par_iter()
        .map(|row| dot_product(row, coeffs))
        .collect::<Vec<_>>();
    C::Group::normalize_batch(&ret)
}

/// Executes a dot product between two vectors (1xN * Nx1)
fn dot_product<C: AffineRepr>(input: &[(C::ScalarField, usize)], coeffs: &[C]) -> C::Group {
    if input.len() > 10 {
        let (bases, scalars): (Vec<C>, Vec<C::ScalarField>) =
            input.iter().map(|(coeff, lag)| (coeffs[*lag], *coeff)).unzip();
        C::Group::msm_unchecked(&bases, &scalars)
    } else {
        input
            .iter()
            .fold(C::Group::zero(), |sum, (coeff, lag)| sum + coeffs[*lag] * *coeff)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Bls12_381, Fr, G1Affine, G1Projective};
    use test_helpers::random_point_vec;

    use ark_std::UniformRand;
    use rand::{thread_rng, Rng};

    fn gen_input(rng: &mut impl Rng, len: usize) -> Vec<(Fr, usize)> {
        (0..len).map(|i| (Fr::rand(rng), (i * 7) % 16)).collect()
    }

    fn get_expected(elements: &[G1Affine], input: &[(Fr, usize)]) -> G1Projective {
        input
            .iter()
            .map(|(coeff, lag)| elements[*lag] * *coeff)
            .fold(G1Projective::zero(), |a, b| a + b)
    }

    #[test]
    fn test_dot_product() {
        let mut rng = thread_rng();
        let elements: Vec<G1Affine> = random_point_vec(16, &mut rng);

        // both the small folding path and the multi-scalar multiplication path
        for len in &[3, 16] {
            let input = gen_input(&mut rng, *len);
            let expected = get_expected(&elements, &input);
            assert_eq!(dot_product(&input, &elements), expected);

            // it also applies the coefficients vector to each row
            // in the inputs vector
            let input_vec = vec![input; 10];
            let got = dot_product_vec(&input_vec, &elements);
            assert_eq!(got, vec![expected.into_affine(); 10])
        }
    }

    #[test]
    fn test_dot_product_ext() {
        let mut rng = thread_rng();
        // generate the input vectors
        let at = (0..10).map(|_| gen_input(&mut rng, 6)).collect::<Vec<_>>();
        let bt = (0..10).map(|_| gen_input(&mut rng, 12)).collect::<Vec<_>>();
        let ct = (0..10).map(|_| gen_input(&mut rng, 2)).collect::<Vec<_>>();
        // generate the coeffs vectors
        let beta_coeffs_g1: Vec<G1Affine> = random_point_vec(16, &mut rng);
        let alpha_coeffs_g1: Vec<G1Affine> = random_point_vec(16, &mut rng);
        let coeffs_g1: Vec<G1Affine> = random_point_vec(16, &mut rng);

        let got = dot_product_ext::<Bls12_381>((&at, &beta_coeffs_g1), (&bt, &alpha_coeffs_g1), (&ct, &coeffs_g1));

        // it should be the sum of the dot products
        let mut expected = Vec::new();
        for i in 0..at.len() {
            expected.push(
                (get_expected(&beta_coeffs_g1, &at[i])
                    + get_expected(&alpha_coeffs_g1, &bt[i])
                    + get_expected(&coeffs_g1, &ct[i]))
                .into_affine(),
            );
        }
        assert_eq!(got, expected);
    }
}
