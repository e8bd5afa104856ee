use anyhow::Result;
use clap::Parser;

mod cli;

use paraphrase_gateway::{config, init_tracing, server};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    init_tracing();

    match args.get_command() {
        cli::Commands::Start => {
            let cfg = config::load_config(&args.config)?;
            server::start_server(cfg).await?;
        }
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => {
                let mut cfg = config::load_config(&args.config)?;
                mask_secrets(&mut cfg);
                println!("{}", toml::to_string_pretty(&cfg)?);
            }
            cli::ConfigCommands::Validate => {
                config::load_config(&args.config)?;
                println!("Configuration OK");
            }
        },
        cli::Commands::Version => {
            println!("Paraphrase Gateway v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn mask_secrets(cfg: &mut config::Config) {
    cfg.model.api_key = mask(&cfg.model.api_key);
    for user in &mut cfg.users {
        user.token = mask(&user.token);
    }
}

fn mask(secret: &str) -> String {
    if secret.len() <= 4 {
        "****".to_string()
    } else {
        format!("{}****", &secret[..4])
    }
}
