//! JSON-RPC ledger reader
//!
//! Reads record state with `eth_call` and event history with `eth_getLogs`.
//! Log queries are split into chunks of at most `max_block_range` blocks; a
//! chunk the provider still rejects for its size is halved until it fits.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use tracing::{debug, warn};

use super::abi::ContractInterface;
use super::{ChainReader, EventKind, LedgerRecord, TimelineEvent};
use crate::types::{Address, CertifyError, RecordId, Result, H256};

/// Default maximum block span per `eth_getLogs` request
pub const DEFAULT_MAX_BLOCK_RANGE: u64 = 10_000;

/// JSON-RPC error code many providers use for oversized log queries
const LIMIT_EXCEEDED_CODE: i64 = -32005;

/// Explicit ledger handle: endpoint, contract and its validated interface
#[derive(Debug, Clone)]
pub struct LedgerContext {
    pub rpc_url: String,
    pub contract_address: Address,
    pub interface: Arc<ContractInterface>,
    pub max_block_range: u64,
    http_client: reqwest::Client,
}

impl LedgerContext {
    pub fn new(
        rpc_url: impl Into<String>,
        contract_address: Address,
        interface: ContractInterface,
        max_block_range: u64,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent("registry-certify/0.1")
            .build()
            .map_err(|e| CertifyError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self {
            rpc_url: rpc_url.into(),
            contract_address,
            interface: Arc::new(interface),
            max_block_range: max_block_range.max(1),
            http_client,
        })
    }
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: JsonValue,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Clone, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

/// Why an RPC call failed
#[derive(Debug)]
enum RpcFailure {
    Transport(CertifyError),
    Remote { code: i64, message: String },
}

impl RpcFailure {
    /// Provider refused the query because the block range or result set is too large
    fn is_range_limit(&self) -> bool {
        match self {
            Self::Remote { code, message } => {
                let message = message.to_ascii_lowercase();
                *code == LIMIT_EXCEEDED_CODE
                    || message.contains("block range")
                    || message.contains("range too large")
                    || message.contains("query returned more than")
                    || message.contains("limit exceeded")
            }
            Self::Transport(_) => false,
        }
    }
}

impl From<RpcFailure> for CertifyError {
    fn from(failure: RpcFailure) -> Self {
        match failure {
            RpcFailure::Transport(err) => err,
            RpcFailure::Remote { code, message } => {
                CertifyError::LedgerUnavailable(format!("RPC error {}: {}", code, message))
            }
        }
    }
}

/// Raw log object as returned by `eth_getLogs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: String,
    pub block_number: String,
    pub transaction_hash: H256,
    pub log_index: String,
    #[serde(default)]
    pub removed: bool,
}

fn parse_quantity(s: &str) -> Result<u64> {
    let digits = s.strip_prefix("0x").ok_or_else(|| {
        CertifyError::LedgerUnavailable(format!("quantity without 0x prefix: {}", s))
    })?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| CertifyError::LedgerUnavailable(format!("bad quantity {}: {}", s, e)))
}

fn parse_data(s: &str) -> Result<Vec<u8>> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(digits).map_err(|e| CertifyError::LedgerUnavailable(format!("bad hex data: {}", e)))
}

fn quantity(n: u64) -> String {
    format!("0x{:x}", n)
}

/// Split `[from, to]` into consecutive inclusive chunks of at most `max_span` blocks
pub fn block_ranges(from: u64, to: u64, max_span: u64) -> Vec<(u64, u64)> {
    let max_span = max_span.max(1);
    let mut ranges = Vec::new();
    if from > to {
        return ranges;
    }
    let mut start = from;
    loop {
        let end = start.saturating_add(max_span - 1).min(to);
        ranges.push((start, end));
        if end == to {
            break;
        }
        start = end + 1;
    }
    ranges
}

/// Decode one raw log into a timeline event
pub fn decode_log(
    interface: &ContractInterface,
    kind: EventKind,
    log: &RpcLog,
) -> Result<TimelineEvent> {
    let data = parse_data(&log.data)?;
    let event = interface.decode_event(kind, &log.topics, &data)?;
    Ok(TimelineEvent {
        block_number: parse_quantity(&log.block_number)?,
        log_index: parse_quantity(&log.log_index)?,
        tx_hash: log.transaction_hash,
        event,
    })
}

/// ChainReader over an Ethereum-style JSON-RPC endpoint
pub struct RpcChainReader {
    ctx: LedgerContext,
    next_id: AtomicU64,
}

impl RpcChainReader {
    pub fn new(ctx: LedgerContext) -> Self {
        Self {
            ctx,
            next_id: AtomicU64::new(1),
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
    ) -> std::result::Result<T, RpcFailure> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .ctx
            .http_client
            .post(&self.ctx.rpc_url)
            .json(&request)
            .send()
            .await
            .map_err(|e| RpcFailure::Transport(e.into()))?;

        if !response.status().is_success() {
            return Err(RpcFailure::Transport(CertifyError::LedgerUnavailable(format!(
                "HTTP {} from {}",
                response.status(),
                self.ctx.rpc_url
            ))));
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| RpcFailure::Transport(e.into()))?;

        if let Some(err) = body.error {
            return Err(RpcFailure::Remote {
                code: err.code,
                message: err.message,
            });
        }
        body.result.ok_or_else(|| {
            RpcFailure::Transport(CertifyError::LedgerUnavailable(format!(
                "{} returned neither result nor error",
                method
            )))
        })
    }

    async fn get_logs(
        &self,
        topics: &[H256; 2],
        from_block: u64,
        to_block: u64,
    ) -> std::result::Result<Vec<RpcLog>, RpcFailure> {
        let filter = json!({
            "address": self.ctx.contract_address,
            "fromBlock": quantity(from_block),
            "toBlock": quantity(to_block),
            "topics": [topics[0], topics[1]],
        });
        self.call("eth_getLogs", json!([filter])).await
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn get_record(&self, record_id: &RecordId) -> Result<LedgerRecord> {
        let data = self.ctx.interface.encode_record_call(record_id.as_str());
        let tx = json!({
            "to": self.ctx.contract_address,
            "data": format!("0x{}", hex::encode(data)),
        });
        let raw: String = self.call("eth_call", json!([tx, "latest"])).await?;
        let record = self.ctx.interface.decode_record(&parse_data(&raw)?)?;
        debug!(record_id = %record_id, exists = record.exists, "Record state read");
        Ok(record)
    }

    async fn latest_block(&self) -> Result<u64> {
        let raw: String = self.call("eth_blockNumber", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn get_events(
        &self,
        record_id: &RecordId,
        kind: EventKind,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<TimelineEvent>> {
        let topic0 = self.ctx.interface.event(kind).topic0;
        let topics = [topic0, record_id.topic()];

        let mut pending: VecDeque<(u64, u64)> =
            block_ranges(from_block, to_block, self.ctx.max_block_range).into();
        let mut events = Vec::new();

        while let Some((start, end)) = pending.pop_front() {
            match self.get_logs(&topics, start, end).await {
                Ok(logs) => {
                    for log in logs.iter().filter(|l| !l.removed) {
                        if log.topics.first() != Some(&topic0) {
                            continue;
                        }
                        events.push(decode_log(&self.ctx.interface, kind, log)?);
                    }
                }
                Err(failure) if failure.is_range_limit() && end > start => {
                    let mid = start + (end - start) / 2;
                    debug!(
                        event = %kind,
                        from = start,
                        to = end,
                        "Provider rejected log range, splitting"
                    );
                    pending.push_front((mid + 1, end));
                    pending.push_front((start, mid));
                }
                Err(failure) => {
                    warn!(event = %kind, from = start, to = end, "eth_getLogs failed: {:?}", failure);
                    return Err(failure.into());
                }
            }
        }

        debug!(
            record_id = %record_id,
            event = %kind,
            from = from_block,
            to = to_block,
            count = events.len(),
            "Events fetched"
        );
        Ok(events)
    }
}
