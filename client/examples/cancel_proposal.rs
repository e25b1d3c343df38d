//! Example: cancel a proposal through the guardian multisig
//!
//! Usage: `cargo run --example cancel_proposal -- governance.toml GovernorAdmin 7`

use governance_client::{GovernanceClient, GovernanceConfig, GovernanceError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    governance_client::init_tracing();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "governance.toml".to_string());
    let contract = args.next().unwrap_or_else(|| "GovernorOwner".to_string());
    let proposal_id: u64 = args.next().unwrap_or_else(|| "1".to_string()).parse()?;

    let client = GovernanceClient::from_config(&GovernanceConfig::from_file(&config_path)?)?;

    match client.dispatcher().cancel_proposal(&contract, proposal_id).await {
        Ok(submission) => {
            match submission.multisig_tx_id {
                Some(id) => println!("✓ Cancel submitted to multisig as transaction {}", id),
                None => println!("✓ Cancel submitted, multisig id not reported"),
            }
            println!("{}", submission.tx);
            println!("\nThe remaining multisig owners must confirm it.");
        }
        Err(e @ GovernanceError::GuardianMismatch { .. }) => {
            eprintln!("✗ {}", e);
            eprintln!("  Check the guardian of {} before retrying.", contract);
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
