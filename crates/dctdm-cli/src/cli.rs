use clap::{Parser, Subcommand};
use dialoguer::Password;

use crate::commands::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Embed(embed::EmbedArgs),
    Extract(extract::ExtractArgs),
}

/// Prompt for a password on a terminal, matching the teacher's interactive
/// fallback when `--password` wasn't passed on the command line.
pub fn ask_for_password() -> Option<String> {
    Password::new()
        .with_prompt("Password")
        .allow_empty_password(true)
        .interact()
        .ok()
        .filter(|p: &String| !p.is_empty())
}
