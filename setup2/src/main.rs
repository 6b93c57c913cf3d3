use setup2::{execute_cmd, Phase2Opts};

use gumdrop::Options;
use std::{process, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::{time::UtcTime, Subscriber},
};

fn main() {
    Subscriber::builder()
        .with_timer(UtcTime::rfc_3339())
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let opts: Phase2Opts = Phase2Opts::parse_args_default_or_exit();
    if opts.command.is_none() {
        error!("No command was provided.");
        error!("{}", Phase2Opts::usage());
        process::exit(2)
    }

    let now = Instant::now();
    if let Err(e) = execute_cmd(&opts) {
        error!("{:?}", e);
        process::exit(1)
    }
    info!("Executing {:?} took: {:?}", opts, now.elapsed());
}
