mod circuits;
pub use circuits::{CubicCircuit, SquaringCircuit};

mod phase1;
pub use phase1::{phase1_from_secrets, random_phase1};

use ark_ec::{AffineRepr, CurveGroup};
use ark_std::UniformRand;
use rand::Rng;

/// Returns `n` random points of the group.
pub fn random_point_vec<C: AffineRepr, R: Rng>(n: usize, rng: &mut R) -> Vec<C> {
    let points = (0..n).map(|_| C::Group::rand(rng)).collect::<Vec<_>>();
    C::Group::normalize_batch(&points)
}
