//! Aptos fullnode REST client: ledger info, view calls and transaction
//! confirmation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::errors::{MarketError, Result};
use crate::wallet::TransactionConfirmer;

/// `GET /` response, trimmed to what the health check reports.
#[derive(Debug, Deserialize)]
pub struct LedgerInfo {
    pub chain_id: u8,
    pub ledger_version: String,
    /// Microseconds since the Unix epoch, as a decimal string.
    pub ledger_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NodeStatus {
    pub chain_id: u8,
    pub ledger_version: String,
    pub ledger_time: Option<DateTime<Utc>>,
}

impl From<LedgerInfo> for NodeStatus {
    fn from(info: LedgerInfo) -> Self {
        Self {
            chain_id: info.chain_id,
            ledger_time: parse_micros(&info.ledger_timestamp),
            ledger_version: info.ledger_version,
        }
    }
}

/// `GET /transactions/by_hash/{hash}` response.
#[derive(Debug, Deserialize)]
pub struct TransactionView {
    #[serde(rename = "type")]
    pub kind: String,
    pub hash: String,
    pub success: Option<bool>,
    pub vm_status: Option<String>,
    pub version: Option<String>,
}

impl TransactionView {
    pub fn is_pending(&self) -> bool {
        self.kind == "pending_transaction"
    }
}

/// On-chain review state of a project, as `verification::get_verification_status`
/// reports it (0 pending, 1 verified, 2 rejected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Pending,
    Verified,
    Rejected,
}

impl VerificationStatus {
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(Self::Pending),
            1 => Some(Self::Verified),
            2 => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Verified => 1,
            Self::Rejected => 2,
        }
    }
}

pub struct AptosNodeClient {
    client: Client,
    node_url: String,
    poll_interval: Duration,
    max_polls: Option<u32>,
}

impl AptosNodeClient {
    pub fn new(client: Client, node_url: &str) -> Self {
        Self {
            client,
            node_url: node_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_secs(1),
            max_polls: None,
        }
    }

    pub fn with_polling(mut self, interval: Duration, max_polls: Option<u32>) -> Self {
        self.poll_interval = interval;
        self.max_polls = max_polls;
        self
    }

    pub async fn ledger_info(&self) -> Result<NodeStatus> {
        let info: LedgerInfo = self
            .client
            .get(format!("{}/", self.node_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(info.into())
    }

    /// Call a Move view function; returns the node's JSON array of results.
    pub async fn view(&self, function_id: &str, arguments: Vec<Value>) -> Result<Vec<Value>> {
        let body = json!({
            "function": function_id,
            "type_arguments": [],
            "arguments": arguments,
        });
        let resp = self
            .client
            .post(format!("{}/view", self.node_url))
            .json(&body)
            .send()
            .await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(MarketError::View(format!("{function_id} returned {status}: {text}")));
        }
        Ok(resp.json().await?)
    }

    /// Review state of `project_id` in the verification module under `contract_address`.
    pub async fn view_verification_status(
        &self,
        contract_address: &str,
        project_id: &str,
    ) -> Result<VerificationStatus> {
        let function_id = format!("{contract_address}::verification::get_verification_status");
        let values = self
            .view(&function_id, vec![Value::String(project_id.to_string())])
            .await?;
        // u8 results come back as numbers, u64 as decimal strings.
        let code = values.first().and_then(|v| match v {
            Value::Number(n) => n.as_u64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        });
        code.and_then(VerificationStatus::from_code).ok_or_else(|| {
            MarketError::View(format!(
                "unexpected verification status for {project_id}: {values:?}"
            ))
        })
    }

    /// Look a transaction up by hash. `None` while the node has not seen it yet.
    pub async fn transaction_by_hash(&self, hash: &str) -> Result<Option<TransactionView>> {
        let resp = self
            .client
            .get(format!("{}/transactions/by_hash/{hash}", self.node_url))
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(resp.error_for_status()?.json().await?))
    }
}

#[async_trait]
impl TransactionConfirmer for AptosNodeClient {
    async fn wait_for_transaction(&self, hash: &str) -> Result<()> {
        let mut polls = 0u32;
        loop {
            match self.transaction_by_hash(hash).await? {
                Some(tx) if !tx.is_pending() => {
                    return match tx.success {
                        Some(false) => Err(MarketError::Confirmation(format!(
                            "{hash} aborted: {}",
                            tx.vm_status.unwrap_or_else(|| "unknown status".to_string())
                        ))),
                        _ => {
                            info!(
                                "Transaction {hash} committed at version {}",
                                tx.version.as_deref().unwrap_or("?")
                            );
                            Ok(())
                        }
                    };
                }
                Some(_) => debug!("Transaction {hash} still pending"),
                None => debug!("Transaction {hash} not visible yet"),
            }

            polls += 1;
            if self.max_polls.is_some_and(|max| polls >= max) {
                return Err(MarketError::Confirmation(format!(
                    "{hash} not committed after {polls} polls"
                )));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

fn parse_micros(raw: &str) -> Option<DateTime<Utc>> {
    raw.parse::<i64>()
        .ok()
        .and_then(DateTime::from_timestamp_micros)
}
