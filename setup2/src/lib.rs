mod beacon;
pub use beacon::beacon;

mod contribute;
pub use contribute::contribute;

mod export;
pub use export::export;

mod new;
pub use new::new;

mod utils;
pub use utils::{phase1_file_name, read_parameters, write_atomically, write_parameters};

mod verify;
pub use verify::verify;

use ark_bls12_377::Bls12_377;
use ark_bls12_381::Bls12_381;
use ark_ec::pairing::Pairing;
use gumdrop::Options;
use setup_utils::UseCompression;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurveKind {
    Bls12_381,
    Bls12_377,
}

pub fn curve_from_str(src: &str) -> std::result::Result<CurveKind, String> {
    let curve = match src.to_lowercase().as_str() {
        "bls12_381" => CurveKind::Bls12_381,
        "bls12_377" => CurveKind::Bls12_377,
        _ => return Err("unsupported curve. Currently supported: bls12_381, bls12_377".to_string()),
    };
    Ok(curve)
}

pub fn compression_from_str(src: &str) -> std::result::Result<UseCompression, String> {
    let compression = match src.to_lowercase().as_str() {
        "compressed" => UseCompression::Yes,
        "uncompressed" => UseCompression::No,
        _ => return Err("unsupported compression. Currently supported: compressed, uncompressed".to_string()),
    };
    Ok(compression)
}

#[derive(Debug, Options, Clone)]
pub struct Phase2Opts {
    help: bool,
    #[options(
        help = "the elliptic curve to use",
        default = "bls12_381",
        parse(try_from_str = "curve_from_str")
    )]
    pub curve_kind: CurveKind,
    #[options(
        help = "the encoding of written parameter files",
        default = "compressed",
        parse(try_from_str = "compression_from_str")
    )]
    pub compression: UseCompression,
    #[options(command)]
    pub command: Option<Command>,
}

// The supported commands
#[derive(Debug, Options, Clone)]
pub enum Command {
    #[options(help = "creates the initial parameters from the phase 1 output and a circuit")]
    New(NewOpts),
    #[options(help = "contribute to the ceremony by applying a secret to the parameters")]
    Contribute(ContributeOpts),
    #[options(help = "apply the final, publicly reproducible contribution")]
    Beacon(BeaconOpts),
    #[options(help = "verify a sequence of parameter files")]
    Verify(VerifyOpts),
    #[options(help = "export the Groth16 proving and verifying keys")]
    Export(ExportOpts),
}

#[derive(Debug, Options, Clone)]
pub struct NewOpts {
    help: bool,
    #[options(help = "the directory holding the phase1radix2m<m> files", default = "phase1")]
    pub phase1_dir: String,
    #[options(help = "the circuit description in JSON", default = "circuit.json")]
    pub circuit: String,
    #[options(help = "the initial parameter file to be created", default = "params")]
    pub output: String,
}

#[derive(Debug, Options, Clone)]
pub struct ContributeOpts {
    help: bool,
    #[options(help = "the parameter file to contribute to", default = "params")]
    pub input: String,
    #[options(help = "the parameter file to be created", default = "new_params")]
    pub output: String,
    #[options(help = "a file whose contents are mixed into the secret")]
    pub entropy_file: Option<String>,
    #[options(help = "hex encoded entropy mixed into the secret")]
    pub entropy_hex: Option<String>,
}

#[derive(Debug, Options, Clone)]
pub struct BeaconOpts {
    help: bool,
    #[options(help = "the parameter file to contribute to", default = "params")]
    pub input: String,
    #[options(help = "the final parameter file to be created", default = "final_params")]
    pub output: String,
    #[options(
        help = "the beacon value, hex encoded",
        default = "0000000000000000000a558a61ddc8ee4e488d647a747fe4dcc362fe2026c620"
    )]
    pub seed: String,
    #[options(help = "the beacon is hashed 2^n times", default = "10")]
    pub num_iterations_exp: u32,
}

#[derive(Debug, Options, Clone)]
pub struct VerifyOpts {
    help: bool,
    #[options(help = "the directory holding the phase1radix2m<m> files, to check the initial file")]
    pub phase1_dir: Option<String>,
    #[options(help = "the circuit description in JSON, to check the initial file")]
    pub circuit: Option<String>,
    #[options(help = "the beacon value, hex encoded, to check the last contribution")]
    pub beacon_seed: Option<String>,
    #[options(help = "the beacon is hashed 2^n times", default = "10")]
    pub num_iterations_exp: u32,
    #[options(help = "write the verification report as JSON to this file")]
    pub report: Option<String>,
    #[options(free, help = "the parameter files, in contribution order")]
    pub files: Vec<String>,
}

#[derive(Debug, Options, Clone)]
pub struct ExportOpts {
    help: bool,
    #[options(help = "the final parameter file", default = "final_params")]
    pub input: String,
    #[options(help = "the proving key file to be created", default = "proving_key")]
    pub proving_key: String,
    #[options(help = "the verifying key file to be created", default = "verifying_key")]
    pub verifying_key: String,
}

/// Runs the command on the selected curve.
pub fn execute_cmd(opts: &Phase2Opts) -> anyhow::Result<()> {
    match opts.curve_kind {
        CurveKind::Bls12_381 => execute::<Bls12_381>(opts),
        CurveKind::Bls12_377 => execute::<Bls12_377>(opts),
    }
}

fn execute<E: Pairing>(opts: &Phase2Opts) -> anyhow::Result<()> {
    let command = opts
        .command
        .as_ref()
        .ok_or_else(|| anyhow::anyhow!("No command was provided.\n{}", Phase2Opts::usage()))?;
    match command {
        Command::New(opt) => new::<E>(opt, opts.compression),
        Command::Contribute(opt) => contribute::<E>(opt, opts.compression),
        Command::Beacon(opt) => beacon::<E>(opt, opts.compression),
        Command::Verify(opt) => verify::<E>(opt),
        Command::Export(opt) => export::<E>(opt),
    }
}
