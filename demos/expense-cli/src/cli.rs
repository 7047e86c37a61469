use clap::{Parser, Subcommand};

/// Command-line arguments for the Spendwise demo client
#[derive(Parser, Debug)]
#[command(
    name = "expense-cli",
    about = "Log in to a Spendwise backend and call its API",
    version
)]
pub struct Cli {
    /// API base URL (overrides SPENDWISE_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Keep the session in memory instead of on disk
    #[arg(long)]
    pub ephemeral: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands for the demo client
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        username: String,
        #[arg(long, short)]
        password: String,
    },

    /// Create an account (does not log in)
    Register {
        username: String,
        #[arg(long, short)]
        password: String,
    },

    /// Forget the stored session
    Logout,

    /// Show who is logged in
    Whoami,

    /// Perform an authenticated GET and print the body
    Get {
        /// Path relative to the API URL, e.g. /expense/1/expenses
        path: String,
    },
}
