use crate::{phase1_file_name, write_parameters, NewOpts};
use phase2::{MPCParameters, R1CS};
use setup_utils::{log_2, CheckForCorrectness, Groth16Params, UseCompression};

use anyhow::Context;
use ark_ec::pairing::Pairing;
use tracing::{debug, info};

use std::path::Path;

pub fn new<E: Pairing>(opts: &NewOpts, compressed: UseCompression) -> anyhow::Result<()> {
    let json = fs_err::read_to_string(&opts.circuit)?;
    let circuit = R1CS::<E::ScalarField>::from_json(&json).with_context(|| format!("invalid circuit {}", opts.circuit))?;
    let shape = circuit.shape()?;
    debug!(?shape, "read the circuit");

    let power = log_2(shape.domain_size).ok_or_else(|| anyhow::anyhow!("domain size is not a power of two"))?;
    let phase1_path = Path::new(&opts.phase1_dir).join(phase1_file_name(power));
    info!("reading the phase 1 parameters from {:?}", phase1_path);
    let phase1_bytes = fs_err::read(&phase1_path)?;
    // the phase 1 output was verified by its own ceremony
    let phase1 = Groth16Params::<E>::read(&phase1_bytes, CheckForCorrectness::No)
        .with_context(|| format!("could not decode {:?}", phase1_path))?;

    let params = MPCParameters::new(&circuit, &phase1)?;
    write_parameters(&opts.output, &params, compressed)
}
