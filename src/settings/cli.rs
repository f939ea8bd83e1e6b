use super::Parser;
use clap::Subcommand;

#[derive(Parser, Debug)]
#[command(name = "chirpy-auth", about = "Credential and session-token administration")]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Commands that take a token read it from an `Authorization`-style value,
/// e.g. `--authorization "Bearer <token>"`.
#[derive(Subcommand, Debug)]
pub enum Command {
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Refresh {
        #[arg(long)]
        authorization: String,
    },
    Revoke {
        #[arg(long)]
        authorization: String,
    },
    ChangePassword {
        #[arg(long)]
        authorization: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Authenticate {
        #[arg(long)]
        authorization: String,
    },
    /// Check an `ApiKey <key>` value against the configured service key.
    AuthorizeService {
        #[arg(long)]
        authorization: String,
    },
    /// Delete every credential. Only allowed when `auth.platform = "dev"`.
    Reset,
}
