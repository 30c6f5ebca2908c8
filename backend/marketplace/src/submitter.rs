//! Purchase / retirement submission.
//!
//! One request becomes at most two signing calls: the provider's primary
//! payload layout, then its fallback layout if and only if the first call errors.
//! The direct extension path is used whenever it is configured, the
//! adapter path otherwise. A returned hash is optionally confirmed on the
//! fullnode; confirmation problems are logged and do not fail the request.
//!
//! There is no backoff and no de-duplication: two identical requests are
//! two transactions.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::errors::{MarketError, Result};
use crate::payload::{EntryFunctionPayload, MarketFunction, PayloadShape, DEFAULT_CREDITS};
use crate::wallet::{SigningProvider, TransactionConfirmer, WalletSession};

/// What the user asked to do with a project's credits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TradeRequest {
    pub project_id: String,
    #[serde(default = "default_credits")]
    pub credits: u64,
    /// Price argument; the configured default is used when absent.
    #[serde(default)]
    pub price: Option<String>,
}

fn default_credits() -> u64 {
    DEFAULT_CREDITS
}

impl TradeRequest {
    pub fn new(project_id: &str) -> Self {
        Self {
            project_id: project_id.to_string(),
            credits: DEFAULT_CREDITS,
            price: None,
        }
    }

    pub fn with_price(mut self, price: impl ToString) -> Self {
        self.price = Some(price.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub hash: String,
    /// Whether the fullnode reported the transaction committed.
    pub confirmed: bool,
    /// Signing calls made: 1 or 2.
    pub attempts: u8,
    /// Layout of the call that succeeded.
    pub shape: PayloadShape,
}

pub struct Submitter {
    contract_address: String,
    default_price: String,
    direct: Option<Arc<dyn SigningProvider>>,
    adapter: Option<Arc<dyn SigningProvider>>,
    confirmer: Option<Arc<dyn TransactionConfirmer>>,
}

impl Submitter {
    pub fn new(contract_address: &str, default_price: &str) -> Self {
        Self {
            contract_address: contract_address.to_string(),
            default_price: default_price.to_string(),
            direct: None,
            adapter: None,
            confirmer: None,
        }
    }

    pub fn with_direct(mut self, provider: Option<Arc<dyn SigningProvider>>) -> Self {
        self.direct = provider;
        self
    }

    pub fn with_adapter(mut self, provider: Option<Arc<dyn SigningProvider>>) -> Self {
        self.adapter = provider;
        self
    }

    pub fn with_confirmer(mut self, confirmer: Option<Arc<dyn TransactionConfirmer>>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub async fn purchase(
        &self,
        session: &WalletSession,
        request: &TradeRequest,
    ) -> Result<SubmissionOutcome> {
        self.submit(session, MarketFunction::PurchaseCredits, request)
            .await
    }

    pub async fn retire(
        &self,
        session: &WalletSession,
        request: &TradeRequest,
    ) -> Result<SubmissionOutcome> {
        self.submit(session, MarketFunction::RetireCredits, request)
            .await
    }

    /// Build the payload for `function` and run the submission sequence.
    pub async fn submit(
        &self,
        session: &WalletSession,
        function: MarketFunction,
        request: &TradeRequest,
    ) -> Result<SubmissionOutcome> {
        if !session.is_ready() {
            info!("Not connected to wallet, rejecting {function}");
            return Err(MarketError::WalletNotConnected);
        }

        let price = request.price.as_deref().unwrap_or(&self.default_price);
        let payload = EntryFunctionPayload::credit_trade(
            &self.contract_address,
            function,
            &request.project_id,
            request.credits,
            price,
        );
        info!(
            "Submitting {} for project {} ({} credits at {price})",
            function, request.project_id, request.credits
        );

        let provider = self.select_provider()?;
        let sender = session.account_address.as_deref();
        let [primary, fallback] = provider.payload_shapes();
        debug!("Signing via {} ({:?} path)", provider.name(), provider.path());

        let (response, attempts, shape) =
            match provider.sign_and_submit(&payload.to_shape(primary, sender)).await {
                Ok(response) => (response, 1, primary),
                Err(first) => {
                    warn!(
                        "{} rejected {primary:?} payload ({first}), retrying as {fallback:?}",
                        provider.name()
                    );
                    // Re-select so the retry follows the same path rule.
                    let provider = self.select_provider()?;
                    match provider
                        .sign_and_submit(&payload.to_shape(fallback, sender))
                        .await
                    {
                        Ok(response) => (response, 2, fallback),
                        Err(last) => {
                            error!("All transaction attempts failed: {last}");
                            return Err(MarketError::SubmissionFailed(last.to_string()));
                        }
                    }
                }
            };

        let hash = extract_hash(&response).ok_or_else(|| {
            warn!("No transaction hash found in response: {response}");
            MarketError::MissingHash
        })?;
        info!("Transaction submitted, hash: {hash}");

        let confirmed = self.confirm(&hash).await;
        Ok(SubmissionOutcome {
            hash,
            confirmed,
            attempts,
            shape,
        })
    }

    fn select_provider(&self) -> Result<&Arc<dyn SigningProvider>> {
        self.direct
            .as_ref()
            .or(self.adapter.as_ref())
            .ok_or(MarketError::NoTransactionMethod)
    }

    async fn confirm(&self, hash: &str) -> bool {
        let Some(confirmer) = &self.confirmer else {
            info!("No client available to wait for confirmation");
            return false;
        };
        match confirmer.wait_for_transaction(hash).await {
            Ok(()) => {
                info!("Transaction {hash} confirmed");
                true
            }
            Err(e) => {
                warn!("Could not wait for transaction {hash}, but it was submitted: {e}");
                false
            }
        }
    }
}

/// Pull the hash out of a wallet response: a bare string, `hash`, or `txHash`.
pub fn extract_hash(response: &Value) -> Option<String> {
    let hash = match response {
        Value::String(s) => Some(s.as_str()),
        Value::Object(map) => map
            .get("hash")
            .or_else(|| map.get("txHash"))
            .and_then(Value::as_str),
        _ => None,
    }?;
    (!hash.is_empty()).then(|| hash.to_string())
}
