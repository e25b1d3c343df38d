//! Example: queue a proposal, then execute it once its timelock has passed
//!
//! Usage: `cargo run --example queue_and_execute -- governance.toml 42`

use governance_client::{GovernanceClient, GovernanceConfig, GovernanceError};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    governance_client::init_tracing();

    let mut args = std::env::args().skip(1);
    let config_path = args.next().unwrap_or_else(|| "governance.toml".to_string());
    let proposal_id: u64 = args.next().unwrap_or_else(|| "1".to_string()).parse()?;

    let config = GovernanceConfig::from_file(&config_path)?;
    println!("Network: {:?}", config.chain.network);
    println!("RPC URL: {}\n", config.chain.rpc_url);

    let client = GovernanceClient::from_config(&config)?;
    client.health_check().await?;

    println!("Queueing proposal {}...", proposal_id);
    match client.dispatcher().queue_proposal(proposal_id).await {
        Ok(info) => println!("{}\n", info),
        // Already queued proposals revert; carry on to execution
        Err(GovernanceError::RpcError(reason)) => println!("Queue rejected: {}\n", reason),
        Err(e) => return Err(e.into()),
    }

    println!("Executing proposal {}...", proposal_id);
    let info = client.dispatcher().execute_proposal(proposal_id).await?;
    println!("{}", info);

    Ok(())
}
