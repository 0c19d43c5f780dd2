use std::path::PathBuf;

use clap::Args;
use dctdm_core::DctdmOptions;

use crate::CliResult;

/// Recover a hidden text message from a stego JPEG
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Stego JPEG, used read-only
    #[arg(short = 'i', long = "in", value_name = "stego.jpg", required = true)]
    pub stego: PathBuf,

    /// Password used to decrypt the message, if the sidecar marks it encrypted
    #[arg(short, long, value_name = "password")]
    pub password: Option<String>,

    /// DCTDM coefficient-pair step; must match the value used at embed time
    #[arg(long, value_name = "delta", default_value = "10")]
    pub delta: i32,
}

impl ExtractArgs {
    pub fn run(self) -> CliResult<()> {
        let password = self.password.or_else(crate::cli::ask_for_password);

        let mut options = DctdmOptions::new(self.delta);
        if let Some(password) = password {
            options = options.with_password(password);
        }

        let message = dctdm_core::extract_file(&self.stego, &options)?;
        println!("{message}");
        Ok(())
    }
}
