use clap::Parser;

use dctdm_core::Result;

mod cli;
use cli::*;
mod commands;

pub type CliResult<T> = Result<T>;

fn main() -> Result<()> {
    env_logger::init();

    let args = CliArgs::parse();
    if let Err(err) = handle_subcommands(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }

    Ok(())
}

fn handle_subcommands(args: CliArgs) -> CliResult<()> {
    match args.command {
        Commands::Embed(embed) => embed.run(),
        Commands::Extract(extract) => extract.run(),
    }
}
