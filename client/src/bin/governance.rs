use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use governance_client::registry::GOVERNOR_OWNER;
use governance_client::{GovernanceAction, GovernanceClient, GovernanceConfig, ProposalId};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "governance")]
#[command(author, version, about = "Run governance actions against deployed contracts", long_about = None)]
struct Cli {
    /// Path to the governance TOML configuration
    #[arg(short, long, env = "GOVERNANCE_CONFIG", default_value = "governance.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Make a governor accept its pending timelock admin (via multisig)
    AcceptAdmin {
        /// Registry key of the governor
        #[arg(default_value = GOVERNOR_OWNER)]
        contract: String,
    },
    /// Queue a succeeded proposal on the owner governor
    Queue {
        /// Proposal id
        proposal_id: ProposalId,
    },
    /// Execute a queued proposal on the owner governor
    Execute {
        /// Proposal id
        proposal_id: ProposalId,
    },
    /// Cancel a proposal through the guardian multisig
    Cancel {
        /// Registry key of the governor, e.g. GovernorOwner or GovernorAdmin
        contract: String,
        /// Proposal id
        proposal_id: ProposalId,
    },
    /// Add the admin timelock as LockedSOV admin (via multisig)
    TransferLockedSovOwnership,
    /// Check that the configured node is reachable
    Health,
}

impl Command {
    fn into_action(self) -> Option<GovernanceAction> {
        match self {
            Command::AcceptAdmin { contract } => Some(GovernanceAction::AcceptAdmin { contract }),
            Command::Queue { proposal_id } => Some(GovernanceAction::Queue { proposal_id }),
            Command::Execute { proposal_id } => Some(GovernanceAction::Execute { proposal_id }),
            Command::Cancel {
                contract,
                proposal_id,
            } => Some(GovernanceAction::Cancel {
                contract,
                proposal_id,
            }),
            Command::TransferLockedSovOwnership => {
                Some(GovernanceAction::TransferLockedSovOwnership)
            }
            Command::Health => None,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    governance_client::init_tracing();

    let cli = Cli::parse();

    let config = GovernanceConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    let client =
        GovernanceClient::from_config(&config).context("Failed to initialize governance client")?;

    match cli.command.into_action() {
        Some(action) => {
            let outcome = client
                .dispatch(&action)
                .await
                .with_context(|| format!("{} failed", action))?;
            println!("{}", outcome);
        }
        None => {
            client.health_check().await.context("Health check failed")?;
            println!("Node at {} is healthy", client.config().rpc_url);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_cancel() {
        let cli = Cli::parse_from(["governance", "cancel", "GovernorAdmin", "7"]);
        assert_eq!(cli.config, PathBuf::from("governance.toml"));
        assert_eq!(
            cli.command.into_action(),
            Some(GovernanceAction::Cancel {
                contract: "GovernorAdmin".to_string(),
                proposal_id: 7,
            })
        );
    }

    #[test]
    fn test_cli_accept_admin_defaults_to_owner() {
        let cli = Cli::parse_from(["governance", "--config", "prod.toml", "accept-admin"]);
        assert_eq!(cli.config, PathBuf::from("prod.toml"));
        assert_eq!(
            cli.command.into_action(),
            Some(GovernanceAction::AcceptAdmin {
                contract: GOVERNOR_OWNER.to_string(),
            })
        );
    }

    #[test]
    fn test_cli_health_has_no_action() {
        let cli = Cli::parse_from(["governance", "health"]);
        assert!(cli.command.into_action().is_none());
    }

    #[test]
    fn test_cli_rejects_negative_id() {
        assert!(Cli::try_parse_from(["governance", "queue", "-1"]).is_err());
    }
}
