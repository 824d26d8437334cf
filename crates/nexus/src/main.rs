use anyhow::{Context, Result};
use clap::Parser;
use nexus_referral::InMemoryNexus;
use solana_sdk::pubkey::Pubkey;
use tracing::info;
use utils::{AppConfig, EnvLoader, Logger};

mod commands;
mod snapshot;

use commands::Command;

#[derive(Parser, Debug)]
#[clap(name = "nexus", about = "Referral directory and tiered-commission ledger")]
struct Cli {
    #[clap(flatten)]
    config: AppConfig,

    #[clap(subcommand)]
    command: Command,
}

fn main() -> Result<(), anyhow::Error> {
    // 根据 CARGO_ENV 加载对应的环境配置文件
    EnvLoader::load_env_file().ok();
    let cli = Cli::parse();

    let _guard = Logger::new_with_log_dir(cli.config.cargo_env, cli.config.log_dir.clone(), Some(cli.config.rust_log.as_str()));

    Nexus::new(cli.config).run(cli.command)
}

struct Nexus {
    config: AppConfig,
}

impl Nexus {
    fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn run(self, command: Command) -> Result<()> {
        let mut ledger = match command {
            Command::Init => self.with_fresh_ledger()?,
            _ => snapshot::load(&self.config.state_file)?,
        };

        let read_only = command.is_read_only();
        let (output, events) = commands::execute(&mut ledger, command)?;

        println!("{}", serde_json::to_string_pretty(&output)?);
        for event in &events {
            println!("{}", serde_json::to_string(event)?);
            println!("Program data: {}", event.to_program_data());
        }

        if !read_only {
            snapshot::save(&self.config.state_file, &ledger)?;
        }
        info!("✅ done ({} events)", events.len());
        Ok(())
    }

    fn with_fresh_ledger(&self) -> Result<InMemoryNexus> {
        snapshot::ensure_absent(&self.config.state_file)?;
        let master = self.config.master.context("🔴 MASTER is required for init")?;
        let address = self.config.nexus_address.unwrap_or_else(Pubkey::new_unique);

        Ok(InMemoryNexus::in_memory(address, self.config.chain_id, master))
    }
}
