use crate::{read_parameters, write_parameters, BeaconOpts};
use setup_utils::{CheckForCorrectness, UseCompression};

use anyhow::Context;
use ark_ec::pairing::Pairing;

pub(crate) fn beacon_iterations(exp: u32) -> anyhow::Result<u64> {
    1u64.checked_shl(exp)
        .ok_or_else(|| anyhow::anyhow!("the iteration exponent must be below 64, got {}", exp))
}

pub fn beacon<E: Pairing>(opts: &BeaconOpts, compressed: UseCompression) -> anyhow::Result<()> {
    let seed = hex::decode(opts.seed.trim()).context("the beacon seed should be a hex string")?;
    let iterations = beacon_iterations(opts.num_iterations_exp)?;

    let mut params = read_parameters::<E>(&opts.input, CheckForCorrectness::Full)?;
    params.apply_beacon(&seed, iterations)?;
    write_parameters(&opts.output, &params, compressed)
}
