//! Configuration for registry-certify
//!
//! CLI arguments and environment variable handling using clap. Every option
//! has an environment fallback so the binary can run from a `.env` file.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::certificate::{OperatorKey, PayloadConfig};
use crate::chain::{ContractInterface, HistoryWindow, LedgerContext, DEFAULT_HISTORY_LOOKBACK_BLOCKS};
use crate::chain::rpc::DEFAULT_MAX_BLOCK_RANGE;
use crate::logging::LogFormat;
use crate::types::{Address, CertifyError, Result};

/// Registry certificates: signed, verifiable snapshots of ledger records
#[derive(Parser, Debug, Clone)]
#[command(name = "registry-certify")]
#[command(about = "Issue and verify signed certificates for registry ledger records")]
pub struct Args {
    /// Ledger JSON-RPC endpoint
    #[arg(long, env = "LEDGER_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Registry contract address (0x-prefixed)
    #[arg(long, env = "REGISTRY_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Path to the registry contract ABI (bare array or build artifact)
    #[arg(long, env = "REGISTRY_CONTRACT_ABI", default_value = "abi/PropertyRegistry.json")]
    pub contract_abi: PathBuf,

    /// Chain id embedded in certificates
    #[arg(long, env = "LEDGER_CHAIN_ID", default_value = "1")]
    pub chain_id: u64,

    /// Operator secp256k1 private key (hex). Required for `issue` and `operator`.
    #[arg(long, env = "OPERATOR_PRIVATE_KEY", hide_env_values = true)]
    pub operator_private_key: Option<String>,

    /// Externally reachable base URL used in certificate links
    #[arg(long, env = "PUBLIC_BASE_URL", default_value = "http://localhost:3000")]
    pub public_base_url: String,

    /// Per-RPC request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "10000")]
    pub request_timeout_ms: u64,

    /// Overall deadline of one command's ledger reads, in milliseconds
    #[arg(long, env = "REQUEST_DEADLINE_MS", default_value = "60000")]
    pub deadline_ms: u64,

    /// Maximum block span of a single `eth_getLogs` query
    #[arg(long, env = "MAX_LOG_BLOCK_RANGE", default_value_t = DEFAULT_MAX_BLOCK_RANGE)]
    pub max_log_block_range: u64,

    /// How many blocks back from the head event history is searched
    #[arg(long, env = "HISTORY_LOOKBACK_BLOCKS", default_value_t = DEFAULT_HISTORY_LOOKBACK_BLOCKS)]
    pub history_lookback_blocks: u64,

    /// Block the registry contract was deployed at; registration lookups start here
    #[arg(long, env = "REGISTRY_DEPLOYMENT_BLOCK", default_value = "0")]
    pub registry_deployment_block: u64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format (text, json)
    #[arg(long, env = "LOG_FORMAT", default_value = "text")]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Issue a signed certificate for a record
    Issue {
        record_id: String,
        /// Write the certificate JSON to a file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Verify a certificate file offline
    Verify {
        /// Certificate JSON: an issued certificate or a bare proof envelope
        file: PathBuf,
    },
    /// Print a record's ordered event timeline and risk assessment
    Timeline { record_id: String },
    /// Print the raw ledger snapshot of a record
    Record { record_id: String },
    /// Print the operator signing address
    Operator,
    /// Generate a fresh operator key
    Keygen,
}

impl Command {
    /// Whether the command reads the ledger
    pub fn needs_ledger(&self) -> bool {
        matches!(
            self,
            Self::Issue { .. } | Self::Timeline { .. } | Self::Record { .. }
        )
    }

    /// Whether the command signs or reports the operator identity
    pub fn needs_operator_key(&self) -> bool {
        matches!(self, Self::Issue { .. } | Self::Operator)
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Args {
    /// Validate configuration for the selected command
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.command.needs_ledger() {
            match &self.rpc_url {
                None => return Err("LEDGER_RPC_URL is required for this command".to_string()),
                Some(url) if !is_http_url(url) => {
                    return Err("LEDGER_RPC_URL must be an http(s) URL".to_string())
                }
                Some(_) => {}
            }
            match &self.contract_address {
                None => {
                    return Err("REGISTRY_CONTRACT_ADDRESS is required for this command".to_string())
                }
                Some(raw) => {
                    if raw.parse::<Address>().is_err() {
                        return Err("REGISTRY_CONTRACT_ADDRESS is not a valid address".to_string());
                    }
                }
            }
            if self.max_log_block_range == 0 {
                return Err("MAX_LOG_BLOCK_RANGE must be greater than zero".to_string());
            }
        }

        if self.command.needs_operator_key() && self.operator_private_key.is_none() {
            return Err("OPERATOR_PRIVATE_KEY is required for this command".to_string());
        }

        if self.chain_id == 0 {
            return Err("LEDGER_CHAIN_ID must be greater than zero".to_string());
        }

        if self.request_timeout_ms == 0 || self.deadline_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS and REQUEST_DEADLINE_MS must be greater than zero".to_string());
        }

        if !is_http_url(&self.public_base_url) {
            return Err("PUBLIC_BASE_URL must be an http(s) URL".to_string());
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn history_window(&self) -> HistoryWindow {
        HistoryWindow {
            lookback_blocks: self.history_lookback_blocks,
            deployment_block: self.registry_deployment_block,
        }
    }

    pub fn registry_address(&self) -> Result<Address> {
        self.contract_address
            .as_deref()
            .ok_or_else(|| CertifyError::Config("REGISTRY_CONTRACT_ADDRESS is not set".to_string()))?
            .parse()
            .map_err(|_| CertifyError::Config("REGISTRY_CONTRACT_ADDRESS is not a valid address".to_string()))
    }

    pub fn payload_config(&self) -> Result<PayloadConfig> {
        Ok(PayloadConfig {
            public_base_url: self.public_base_url.clone(),
            chain_id: self.chain_id,
            registry_address: self.registry_address()?,
        })
    }

    /// Load the contract ABI and build the ledger context
    pub fn ledger_context(&self) -> Result<LedgerContext> {
        let rpc_url = self
            .rpc_url
            .as_deref()
            .ok_or_else(|| CertifyError::Config("LEDGER_RPC_URL is not set".to_string()))?;
        let interface = ContractInterface::load(&self.contract_abi)?;
        LedgerContext::new(
            rpc_url,
            self.registry_address()?,
            interface,
            self.max_log_block_range,
            self.request_timeout(),
        )
    }

    pub fn operator_key(&self) -> Result<OperatorKey> {
        let raw = self
            .operator_private_key
            .as_deref()
            .ok_or_else(|| CertifyError::Config("OPERATOR_PRIVATE_KEY is not set".to_string()))?;
        OperatorKey::from_hex(raw)
    }
}
