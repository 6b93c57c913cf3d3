use crate::{read_parameters, write_atomically, ExportOpts};
use setup_utils::CheckForCorrectness;

use ark_ec::pairing::Pairing;
use ark_serialize::CanonicalSerialize;
use tracing::{info, warn};

pub fn export<E: Pairing>(opts: &ExportOpts) -> anyhow::Result<()> {
    let params = read_parameters::<E>(&opts.input, CheckForCorrectness::Full)?;
    if params.contributions.is_empty() {
        warn!("the parameters have no contributions and are not secure");
    }
    let (proving_key, verifying_key) = params.keypair();

    let mut bytes = vec![];
    proving_key.serialize_compressed(&mut bytes)?;
    write_atomically(&opts.proving_key, &bytes)?;

    let mut bytes = vec![];
    verifying_key.serialize_compressed(&mut bytes)?;
    write_atomically(&opts.verifying_key, &bytes)?;

    info!(
        proving_key = %opts.proving_key,
        verifying_key = %opts.verifying_key,
        "exported the Groth16 keys"
    );
    Ok(())
}
