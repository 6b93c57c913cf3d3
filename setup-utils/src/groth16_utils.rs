use crate::{
    elements::{read_bytes, read_element, read_vec, write_element, write_vec},
    progress::{report_progress_ending, report_progress_starting},
    CheckForCorrectness,
    Error,
    Result,
    UseCompression,
};

use ark_ec::{pairing::Pairing, AffineRepr, CurveGroup};
use ark_ff::{FftField, Field};
use rayon::prelude::*;
use tracing::{debug, info};

use std::io::Write;

/// The phase 1 output in the form consumed by phase 2: the powers of tau
/// converted to Lagrange coefficients over a radix-2 domain of `size` points,
/// plus the `(tau^size - 1) * tau^i` powers for the `h` query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Groth16Params<E: Pairing> {
    pub alpha_g1: E::G1Affine,
    pub beta_g1: E::G1Affine,
    pub beta_g2: E::G2Affine,
    pub coeffs_g1: Vec<E::G1Affine>,
    pub coeffs_g2: Vec<E::G2Affine>,
    pub alpha_coeffs_g1: Vec<E::G1Affine>,
    pub beta_coeffs_g1: Vec<E::G1Affine>,
    pub h_g1: Vec<E::G1Affine>,
}

impl<E: Pairing> Groth16Params<E> {
    /// Converts monomial powers of tau into Lagrange coefficients for a
    /// domain of `phase2_size` points.
    pub fn new(
        phase2_size: usize,
        tau_powers_g1: Vec<E::G1Affine>,
        tau_powers_g2: Vec<E::G2Affine>,
        alpha_tau_powers_g1: Vec<E::G1Affine>,
        beta_tau_powers_g1: Vec<E::G1Affine>,
        beta_g2: E::G2Affine,
    ) -> Result<Self> {
        domain_generator::<E::ScalarField>(phase2_size)?;
        let available = tau_powers_g2
            .len()
            .min(alpha_tau_powers_g1.len())
            .min(beta_tau_powers_g1.len())
            .min((tau_powers_g1.len() + 1) / 2);
        if available < phase2_size {
            return Err(Error::Phase1TooSmall {
                required: phase2_size,
                available,
            });
        }
        info!(size = phase2_size, "converting phase 1 powers to Lagrange form");
        report_progress_starting("groth16-params");

        let alpha_g1 = alpha_tau_powers_g1[0];
        let beta_g1 = beta_tau_powers_g1[0];

        // (tau^m - 1) * tau^i for i in 0..m-1
        let h_g1 = (0..phase2_size - 1)
            .into_par_iter()
            .map(|i| tau_powers_g1[i + phase2_size].into_group() - tau_powers_g1[i])
            .collect::<Vec<_>>();
        let h_g1 = E::G1::normalize_batch(&h_g1);

        let (coeffs_g1, (coeffs_g2, (alpha_coeffs_g1, beta_coeffs_g1))) = rayon::join(
            || to_lagrange(&tau_powers_g1[..phase2_size]),
            || {
                rayon::join(
                    || to_lagrange(&tau_powers_g2[..phase2_size]),
                    || {
                        rayon::join(
                            || to_lagrange(&alpha_tau_powers_g1[..phase2_size]),
                            || to_lagrange(&beta_tau_powers_g1[..phase2_size]),
                        )
                    },
                )
            },
        );
        report_progress_ending("groth16-params");

        Ok(Groth16Params {
            alpha_g1,
            beta_g1,
            beta_g2,
            coeffs_g1: coeffs_g1?,
            coeffs_g2: coeffs_g2?,
            alpha_coeffs_g1: alpha_coeffs_g1?,
            beta_coeffs_g1: beta_coeffs_g1?,
            h_g1,
        })
    }

    /// The number of points of the evaluation domain.
    pub fn size(&self) -> usize {
        self.coeffs_g1.len()
    }

    pub fn write<W: Write>(&self, writer: &mut W, compressed: UseCompression) -> Result<()> {
        writer.write_all(&[compressed.to_byte()])?;
        write_element(writer, &self.alpha_g1, compressed)?;
        write_element(writer, &self.beta_g1, compressed)?;
        write_element(writer, &self.beta_g2, compressed)?;
        write_vec(writer, &self.coeffs_g1, compressed)?;
        write_vec(writer, &self.coeffs_g2, compressed)?;
        write_vec(writer, &self.alpha_coeffs_g1, compressed)?;
        write_vec(writer, &self.beta_coeffs_g1, compressed)?;
        write_vec(writer, &self.h_g1, compressed)?;
        Ok(())
    }

    /// Reads the parameters and checks that all vectors agree on the domain size.
    pub fn read(mut reader: &[u8], check_input_for_correctness: CheckForCorrectness) -> Result<Self> {
        let reader = &mut reader;
        let flag = read_bytes(reader, 1)?[0];
        let compressed = UseCompression::from_byte(flag)?;
        let check = check_input_for_correctness;
        let alpha_g1 = read_element(reader, compressed, check)?;
        let beta_g1 = read_element(reader, compressed, check)?;
        let beta_g2 = read_element(reader, compressed, check)?;
        let coeffs_g1 = read_vec(reader, compressed, check)?;
        let coeffs_g2 = read_vec(reader, compressed, check)?;
        let alpha_coeffs_g1 = read_vec(reader, compressed, check)?;
        let beta_coeffs_g1 = read_vec(reader, compressed, check)?;
        let h_g1 = read_vec(reader, compressed, check)?;
        if !reader.is_empty() {
            return Err(Error::corrupt(format!("{} trailing bytes after phase 1 data", reader.len())));
        }

        let params = Groth16Params {
            alpha_g1,
            beta_g1,
            beta_g2,
            coeffs_g1,
            coeffs_g2,
            alpha_coeffs_g1,
            beta_coeffs_g1,
            h_g1,
        };
        params.check_lengths()?;
        debug!(size = params.size(), compressed = %compressed, "read phase 1 parameters");
        Ok(params)
    }

    fn check_lengths(&self) -> Result<()> {
        let size = self.size();
        domain_generator::<E::ScalarField>(size)?;
        for &(section, got) in &[
            ("coeffs_g2", self.coeffs_g2.len()),
            ("alpha_coeffs_g1", self.alpha_coeffs_g1.len()),
            ("beta_coeffs_g1", self.beta_coeffs_g1.len()),
        ] {
            if got != size {
                return Err(Error::MalformedAccumulator {
                    section,
                    expected: size,
                    got,
                });
            }
        }
        if self.h_g1.len() != size - 1 {
            return Err(Error::MalformedAccumulator {
                section: "h_g1",
                expected: size - 1,
                got: self.h_g1.len(),
            });
        }
        Ok(())
    }
}

/// The generator of the multiplicative subgroup of order `size`.
pub fn domain_generator<F: FftField>(size: usize) -> Result<F> {
    if size < 2 || !size.is_power_of_two() {
        return Err(Error::InvalidPhase2Size(size));
    }
    F::get_root_of_unity(size as u64).ok_or(Error::InvalidPhase2Size(size))
}

/// Inverse FFT in the exponent: maps `[tau^i]` to `[L_i(tau)]`.
fn to_lagrange<C: AffineRepr>(powers: &[C]) -> Result<Vec<C>> {
    let size = powers.len();
    let omega = domain_generator::<C::ScalarField>(size)?;
    let omega_inv = omega.inverse().ok_or(Error::InvalidPhase2Size(size))?;
    let size_inv = C::ScalarField::from(size as u64)
        .inverse()
        .ok_or(Error::InvalidPhase2Size(size))?;

    let mut elements = powers.iter().map(|p| p.into_group()).collect::<Vec<_>>();
    serial_fft(&mut elements, &omega_inv, size.trailing_zeros());
    elements.par_iter_mut().for_each(|e| *e *= size_inv);
    Ok(C::Group::normalize_batch(&elements))
}

fn serial_fft<G: CurveGroup>(a: &mut [G], omega: &G::ScalarField, log_n: u32) {
    fn bitreverse(mut n: u32, l: u32) -> u32 {
        let mut r = 0;
        for _ in 0..l {
            r = (r << 1) | (n & 1);
            n >>= 1;
        }
        r
    }

    let n = a.len() as u32;
    debug_assert_eq!(n, 1 << log_n);

    for k in 0..n {
        let rk = bitreverse(k, log_n);
        if k < rk {
            a.swap(rk as usize, k as usize);
        }
    }

    let mut m = 1;
    for _ in 0..log_n {
        let w_m = omega.pow([(n / (2 * m)) as u64]);

        let mut k = 0;
        while k < n {
            let mut w = G::ScalarField::from(1u64);
            for j in 0..m {
                let t = a[(k + j + m) as usize] * w;
                let u = a[(k + j) as usize];
                a[(k + j + m) as usize] = u - t;
                a[(k + j) as usize] = u + t;
                w *= &w_m;
            }
            k += 2 * m;
        }

        m *= 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bls12_381::{Bls12_381, Fr, G1Affine, G2Affine};
    use ark_std::UniformRand;
    use rand::thread_rng;

    fn powers<C: AffineRepr>(base: C, x: C::ScalarField, n: usize) -> Vec<C> {
        let mut acc = C::ScalarField::from(1u64);
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push((base * acc).into_affine());
            acc *= x;
        }
        out
    }

    fn phase1(size: usize, tau: Fr, alpha: Fr, beta: Fr) -> Groth16Params<Bls12_381> {
        let g1 = G1Affine::generator();
        let tau_g1 = powers(g1, tau, 2 * size - 1);
        let tau_g2 = powers(G2Affine::generator(), tau, size);
        let alpha_g1 = powers((g1 * alpha).into_affine(), tau, size);
        let beta_g1 = powers((g1 * beta).into_affine(), tau, size);
        let beta_g2 = (G2Affine::generator() * beta).into_affine();
        Groth16Params::new(size, tau_g1, tau_g2, alpha_g1, beta_g1, beta_g2).unwrap()
    }

    #[test]
    fn lagrange_coefficients_sum_to_generator() {
        let rng = &mut thread_rng();
        let params = phase1(16, Fr::rand(rng), Fr::rand(rng), Fr::rand(rng));
        let sum: <Bls12_381 as Pairing>::G1 = params.coeffs_g1.iter().map(|c| c.into_group()).sum();
        assert_eq!(sum.into_affine(), G1Affine::generator());
        let sum: <Bls12_381 as Pairing>::G2 = params.coeffs_g2.iter().map(|c| c.into_group()).sum();
        assert_eq!(sum.into_affine(), G2Affine::generator());
    }

    #[test]
    fn lagrange_coefficients_at_known_tau() {
        let size = 8;
        let rng = &mut thread_rng();
        let tau = Fr::rand(rng);
        let params = phase1(size, tau, Fr::rand(rng), Fr::rand(rng));

        // L_i(tau) = (tau^m - 1) * omega^i / (m * (tau - omega^i))
        let omega = domain_generator::<Fr>(size).unwrap();
        let z = tau.pow([size as u64]) - Fr::from(1u64);
        let m_inv = Fr::from(size as u64).inverse().unwrap();
        for (i, coeff) in params.coeffs_g1.iter().enumerate() {
            let omega_i = omega.pow([i as u64]);
            let l_i = z * omega_i * m_inv * (tau - omega_i).inverse().unwrap();
            assert_eq!(*coeff, (G1Affine::generator() * l_i).into_affine());
        }

        assert_eq!(params.h_g1.len(), size - 1);
        assert_eq!(params.h_g1[2], (G1Affine::generator() * (z * tau.pow([2u64]))).into_affine());
    }

    #[test]
    fn rejects_insufficient_powers() {
        let g1 = G1Affine::generator();
        let g2 = G2Affine::generator();
        let err = Groth16Params::<Bls12_381>::new(8, vec![g1; 14], vec![g2; 8], vec![g1; 8], vec![g1; 8], g2)
            .unwrap_err();
        assert!(matches!(err, Error::Phase1TooSmall { required: 8, available: 7 }));

        let err = Groth16Params::<Bls12_381>::new(12, vec![g1; 30], vec![g2; 16], vec![g1; 16], vec![g1; 16], g2)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidPhase2Size(12)));
    }

    #[test]
    fn serialization() {
        let rng = &mut thread_rng();
        let params = phase1(4, Fr::rand(rng), Fr::rand(rng), Fr::rand(rng));
        for compressed in &[UseCompression::Yes, UseCompression::No] {
            let mut buf = vec![];
            params.write(&mut buf, *compressed).unwrap();
            let read = Groth16Params::<Bls12_381>::read(&buf, CheckForCorrectness::Full).unwrap();
            assert_eq!(read, params);

            buf.push(0);
            assert!(Groth16Params::<Bls12_381>::read(&buf, CheckForCorrectness::Full).is_err());
        }
    }
}
