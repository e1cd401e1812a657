//! zdbtree - Show the vdev tree of a ZFS pool
//!
//! Runs `zdb -C <pool>` (or reads a saved dump) and prints the parsed
//! configuration tree as text or JSON.

use std::error::Error;
use std::fs;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use env_logger::Env;
use log::debug;

use zdbtree::cli::Cli;
use zdbtree::data::{parse_named_pool_output, render_pool};
use zdbtree::{ClientOptions, PoolRecord, ZdbClient};

/// Loads the requested pool from a dump file or from zdb
fn load_pool(cli: &Cli, opts: &ClientOptions) -> Result<Arc<PoolRecord>, Box<dyn Error>> {
    match &cli.input {
        Some(path) => {
            debug!("reading zdb output from {}", path.display());
            let text = fs::read_to_string(path)?;
            let mut pool = parse_named_pool_output(&cli.pool, &text)?;
            pool.guid = cli.guid.clone();
            Ok(Arc::new(pool))
        }
        None => {
            let client = ZdbClient::from_options(opts);
            Ok(client.get_pool(&cli.pool, &cli.guid)?)
        }
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let opts = ClientOptions::from_cli(cli)?;
    let pool = load_pool(cli, &opts)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(pool.as_ref())?);
    } else {
        print!("{}", render_pool(&pool));
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(cli.default_log_level())).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("zdbtree: error for pool {:?}: {err}", cli.pool);
            ExitCode::FAILURE
        }
    }
}
