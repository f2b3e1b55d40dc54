mod cli;
mod download;
mod logging;
mod output;
mod reading;
mod stations;

use std::{io, process};

use anyhow::Result;
use clap::Parser;
use cli::{command, Cli, Commands};

fn main() {
    dotenvy::dotenv().ok();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // help and version go to stdout and exit cleanly
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            eprint!("{}", e);
            process::exit(1);
        }
    };

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Download(args) => {
            let summary = command::download(args, cli.debug)?;
            println!("{}", summary);
        }
        Commands::Convert(args) => {
            logging::init(cli.debug, None, None)?;
            if let Some(filename) = command::convert(args, io::stdout().lock())? {
                println!("File saved to `{}`", filename);
            }
        }
    }

    Ok(())
}
