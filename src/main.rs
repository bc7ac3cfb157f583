//! registry-certify - issue and verify registry certificates

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::{error, info};

use registry_certify::{
    certificate::{verify_envelope, CertificateFacade, OperatorKey, ProofEnvelope},
    chain::RpcChainReader,
    config::{Args, Command},
    logging,
    timeline::RiskWeights,
};

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Accepts either a full issued certificate (`{payload, display, proof}`) or
/// a bare proof envelope
fn read_envelope(path: &Path) -> anyhow::Result<ProofEnvelope> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read certificate file {}", path.display()))?;
    let mut document: serde_json::Value =
        serde_json::from_str(&raw).context("certificate file is not valid JSON")?;
    let envelope = match document.get_mut("proof") {
        Some(proof) => proof.take(),
        None => document,
    };
    serde_json::from_value(envelope).context("certificate file does not contain a proof envelope")
}

fn build_facade(args: &Args) -> anyhow::Result<CertificateFacade> {
    let ctx = args.ledger_context()?;
    info!(
        rpc_url = %ctx.rpc_url,
        registry = %ctx.contract_address.to_checksum(),
        chain_id = args.chain_id,
        "Ledger configured"
    );
    let chain = Arc::new(RpcChainReader::new(ctx));
    let config = args.payload_config()?;
    let window = args.history_window();

    Ok(match args.operator_private_key {
        Some(_) => CertificateFacade::new(chain, config, window, args.operator_key()?, RiskWeights::default()),
        None => CertificateFacade::read_only(chain, config, window, RiskWeights::default()),
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    logging::init(&args.log_level, args.log_format);

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    match &args.command {
        Command::Verify { file } => {
            let envelope = read_envelope(file)?;
            let result = verify_envelope(&envelope);
            print_json(&result)?;
            if !result.ok {
                std::process::exit(1);
            }
        }
        Command::Keygen => {
            let key = OperatorKey::generate();
            println!("address:     {}", key.address().to_checksum());
            println!("private key: {}", key.to_hex().as_str());
        }
        Command::Operator => {
            let key = args.operator_key()?;
            println!("{}", key.address().to_checksum());
        }
        Command::Issue { record_id, out } => {
            let facade = build_facade(&args)?;
            let issued = facade.issue_certificate(record_id, args.deadline()).await?;
            let json = serde_json::to_string_pretty(&issued)?;
            match out {
                Some(path) => {
                    std::fs::write(path, json)
                        .with_context(|| format!("cannot write certificate to {}", path.display()))?;
                    info!(
                        path = %path.display(),
                        certificate = %issued.proof.certificate_number,
                        "Certificate written"
                    );
                }
                None => println!("{}", json),
            }
        }
        Command::Timeline { record_id } => {
            let facade = build_facade(&args)?;
            let report = facade.get_timeline(record_id, args.deadline()).await?;
            print_json(&report)?;
        }
        Command::Record { record_id } => {
            let facade = build_facade(&args)?;
            let record = facade.get_record(record_id, args.deadline()).await?;
            print_json(&record)?;
        }
    }

    Ok(())
}
