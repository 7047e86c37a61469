mod cli;

use std::process::ExitCode;

use clap::Parser;
use spendwise::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.requires_login() => {
            eprintln!("error: {e}");
            eprintln!("run `expense-cli login <username> -p <password>` first");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), SpendwiseError> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.api_url {
        config.api_url = url;
    }
    tracing::debug!(
        api_url = %config.api_url,
        session_path = %config.session_path.display(),
        ephemeral = cli.ephemeral,
        "resolved config"
    );

    let mut builder = SpendwiseClient::builder().config(config);
    if cli.ephemeral {
        builder = builder.in_memory();
    }
    let client = builder.build()?;

    match cli.command {
        Command::Login { username, password } => {
            let session = client.login(&username, &password).await?;
            println!(
                "logged in as {} (id {})",
                session.user.username, session.user.id.0
            );
        }
        Command::Register { username, password } => {
            let user = client.register(&username, &password).await?;
            match user.message {
                Some(message) => println!("{message}"),
                None => println!("registered {}", user.username),
            }
        }
        Command::Logout => {
            client.logout()?;
            println!("logged out");
        }
        Command::Whoami => match client.current_session()? {
            Some(session) => println!(
                "{} (id {})",
                session.user.username, session.user.id.0
            ),
            None => println!("not logged in"),
        },
        Command::Get { path } => {
            let response = client.execute(&RequestSpec::get(path)).await?;
            let body = match serde_json::from_slice::<serde_json::Value>(&response.body) {
                Ok(json) => serde_json::to_string_pretty(&json)
                    .unwrap_or_else(|_| response.text()),
                Err(_) => response.text(),
            };
            if !response.is_success() {
                eprintln!("HTTP {}", response.status);
            }
            println!("{body}");
        }
    }
    Ok(())
}
