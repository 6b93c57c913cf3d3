use setup_utils::{Groth16Params, Result};

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::One;
use ark_std::UniformRand;
use rand::Rng;
use rayon::prelude::*;

/// Phase 1 parameters for a domain of `size` points built from random
/// secrets that are thrown away.
pub fn random_phase1<E: Pairing, R: Rng>(size: usize, rng: &mut R) -> Result<Groth16Params<E>> {
    let tau = E::ScalarField::rand(rng);
    let alpha = E::ScalarField::rand(rng);
    let beta = E::ScalarField::rand(rng);
    phase1_from_secrets(size, tau, alpha, beta)
}

/// Phase 1 parameters for a domain of `size` points from known secrets,
/// as a powers of tau ceremony would have produced them.
pub fn phase1_from_secrets<E: Pairing>(
    size: usize,
    tau: E::ScalarField,
    alpha: E::ScalarField,
    beta: E::ScalarField,
) -> Result<Groth16Params<E>> {
    let mut powers = Vec::with_capacity(2 * size - 1);
    let mut current = E::ScalarField::one();
    for _ in 0..2 * size - 1 {
        powers.push(current);
        current *= tau;
    }

    let g1 = E::G1Affine::generator();
    let g2 = E::G2Affine::generator();
    let g1_powers = |scale: E::ScalarField, n: usize| {
        let projective = powers[..n].par_iter().map(|p| g1 * (scale * p)).collect::<Vec<_>>();
        E::G1::normalize_batch(&projective)
    };

    let tau_g1 = g1_powers(E::ScalarField::one(), 2 * size - 1);
    let alpha_tau_g1 = g1_powers(alpha, size);
    let beta_tau_g1 = g1_powers(beta, size);
    let tau_g2 = E::G2::normalize_batch(&powers[..size].par_iter().map(|p| g2 * p).collect::<Vec<_>>());
    let beta_g2 = (g2 * beta).into_affine();

    Groth16Params::new(size, tau_g1, tau_g2, alpha_tau_g1, beta_tau_g1, beta_g2)
}
