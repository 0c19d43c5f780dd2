use std::path::PathBuf;

use clap::Args;
use dctdm_core::DctdmOptions;

use crate::CliResult;

/// Hide a text message in a baseline-JPEG cover image
#[derive(Args, Debug)]
pub struct EmbedArgs {
    /// Cover JPEG, used read-only
    #[arg(short = 'i', long = "in", value_name = "cover.jpg", required = true)]
    pub cover: PathBuf,

    /// Stego JPEG to write
    #[arg(short = 'o', long = "out", value_name = "stego.jpg", required = true)]
    pub out: PathBuf,

    /// A text message that will be hidden
    #[arg(short, long, value_name = "text message")]
    pub message: Option<String>,

    /// Read the message to hide from a file instead of `--message`
    #[arg(
        long = "message-file",
        value_name = "path",
        conflicts_with = "message",
        required_unless_present = "message"
    )]
    pub message_file: Option<PathBuf>,

    /// Password used to encrypt the message before embedding
    #[arg(long, value_name = "password")]
    pub password: Option<String>,

    /// DCTDM coefficient-pair step
    #[arg(long, value_name = "delta", default_value = "10")]
    pub delta: i32,
}

impl EmbedArgs {
    pub fn run(self) -> CliResult<()> {
        let message = match self.message {
            Some(message) => message,
            None => {
                let path = self
                    .message_file
                    .expect("clap requires message or message_file");
                std::fs::read_to_string(path)?
            }
        };

        let password = self.password.or_else(crate::cli::ask_for_password);

        let mut options = DctdmOptions::new(self.delta);
        if let Some(password) = password {
            options = options.with_password(password);
        }

        dctdm_core::embed_file(&self.cover, &self.out, &message, &options)
    }
}
