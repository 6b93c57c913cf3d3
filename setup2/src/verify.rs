use crate::{beacon::beacon_iterations, phase1_file_name, write_atomically, VerifyOpts};
use phase2::{verify_encoded, MPCParameters, R1CS};
use setup_utils::{log_2, CheckForCorrectness, Groth16Params};

use anyhow::Context;
use ark_ec::pairing::Pairing;
use tracing::info;

use std::path::Path;

pub fn verify<E: Pairing>(opts: &VerifyOpts) -> anyhow::Result<()> {
    if opts.files.is_empty() {
        anyhow::bail!("no parameter files were provided");
    }
    let files = opts
        .files
        .iter()
        .map(fs_err::read)
        .collect::<Result<Vec<_>, _>>()?;

    let report = verify_encoded::<E, _>(&files, CheckForCorrectness::Full);
    if let Some(path) = &opts.report {
        write_atomically(path, serde_json::to_string_pretty(&report)?.as_bytes())?;
    }
    if !report.valid {
        let file = report
            .first_invalid_index
            .and_then(|i| opts.files.get(i))
            .cloned()
            .unwrap_or_default();
        return report
            .into_result()
            .with_context(|| format!("verification failed at {}", file));
    }
    info!(files = files.len(), "all contributions are valid");

    match (&opts.phase1_dir, &opts.circuit) {
        (Some(phase1_dir), Some(circuit)) => {
            let first = MPCParameters::<E>::read(&files[0], CheckForCorrectness::Full)?;
            verify_initialization(&first, phase1_dir, circuit)
                .with_context(|| format!("{} is not the expected initial file", opts.files[0]))?;
            info!("the initial parameters match the phase 1 output and the circuit");
        }
        (None, None) => {}
        _ => anyhow::bail!("checking the initial file requires both --phase1-dir and --circuit"),
    }

    if let Some(seed) = &opts.beacon_seed {
        let seed = hex::decode(seed.trim()).context("the beacon seed should be a hex string")?;
        let iterations = beacon_iterations(opts.num_iterations_exp)?;
        let last = MPCParameters::<E>::read(&files[files.len() - 1], CheckForCorrectness::Full)?;
        last.verify_beacon(&seed, iterations)
            .context("the last contribution is not the beacon")?;
        info!("the last contribution matches the beacon");
    }

    println!("Verified {} files", files.len());
    Ok(())
}

fn verify_initialization<E: Pairing>(first: &MPCParameters<E>, phase1_dir: &str, circuit: &str) -> anyhow::Result<()> {
    let circuit = R1CS::<E::ScalarField>::from_json(&fs_err::read_to_string(circuit)?)?;
    let power = log_2(first.shape.domain_size).ok_or_else(|| anyhow::anyhow!("domain size is not a power of two"))?;
    let phase1_bytes = fs_err::read(Path::new(phase1_dir).join(phase1_file_name(power)))?;
    let phase1 = Groth16Params::<E>::read(&phase1_bytes, CheckForCorrectness::No)?;
    first.verify_initialization(&circuit, &phase1)?;
    Ok(())
}
