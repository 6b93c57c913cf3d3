use phase2::MPCParameters;
use setup_utils::{print_hash, CheckForCorrectness, UseCompression};

use anyhow::Context;
use ark_ec::pairing::Pairing;
use tempfile::NamedTempFile;
use tracing::info;

use std::{
    io::Write,
    path::{Path, PathBuf},
};

/// The name of the phase 1 file prepared for a domain of `2^power` points.
pub fn phase1_file_name(power: usize) -> String {
    format!("phase1radix2m{}", power)
}

/// Writes `bytes` to a temporary file next to `path` and moves it into
/// place once fully written, so a failed run never leaves a partial file.
pub fn write_atomically<P: AsRef<Path>>(path: P, bytes: &[u8]) -> anyhow::Result<()> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut file = NamedTempFile::new_in(&dir).with_context(|| format!("could not create a file in {:?}", dir))?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("could not write {:?}", path))?;
    Ok(())
}

pub fn read_parameters<E: Pairing>(path: &str, check: CheckForCorrectness) -> anyhow::Result<MPCParameters<E>> {
    let bytes = fs_err::read(path)?;
    let params = MPCParameters::read(&bytes, check).with_context(|| format!("could not decode {}", path))?;
    Ok(params)
}

/// Writes the parameters and prints the transcript digest the participant must publish.
pub fn write_parameters<E: Pairing>(
    path: &str,
    params: &MPCParameters<E>,
    compressed: UseCompression,
) -> anyhow::Result<()> {
    let mut bytes = vec![];
    params.write(&mut bytes, compressed)?;
    write_atomically(path, &bytes)?;
    info!(path, contributions = params.contributions.len(), "wrote the parameters");
    println!("Wrote {}. Publish its transcript digest:", path);
    print_hash(&params.digest);
    Ok(())
}
