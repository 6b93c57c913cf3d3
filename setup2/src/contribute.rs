use crate::{read_parameters, write_parameters, ContributeOpts};
use setup_utils::{CheckForCorrectness, EntropyMixer, UseCompression};

use anyhow::Context;
use ark_ec::pairing::Pairing;
use tracing::info;

use std::io::{self, BufRead, Write};

pub fn contribute<E: Pairing>(opts: &ContributeOpts, compressed: UseCompression) -> anyhow::Result<()> {
    let mut params = read_parameters::<E>(&opts.input, CheckForCorrectness::Full)?;
    info!(contributions = params.contributions.len(), "read the parameters to contribute to");

    let mut mixer = EntropyMixer::new();
    if let Some(path) = &opts.entropy_file {
        mixer.absorb_file(path)?;
    }
    if let Some(entropy) = &opts.entropy_hex {
        let entropy = hex::decode(entropy.trim()).context("entropy should be a hex string")?;
        mixer.absorb(&entropy);
    }
    if opts.entropy_file.is_none() && opts.entropy_hex.is_none() {
        print!("Type some random text and press [ENTER] to provide additional entropy: ");
        io::stdout().flush()?;
        let mut line = String::new();
        io::stdin().lock().read_line(&mut line)?;
        mixer.absorb(line.as_bytes());
    }
    mixer.absorb_os_rng();
    info!(bytes = mixer.absorbed(), "mixed the supplied entropy");
    let randomness = mixer.finalize()?;

    info!("Computing your contribution, this could take a while...");
    params.contribute_with_entropy(&randomness)?;
    drop(randomness);

    write_parameters(&opts.output, &params, compressed)
}
