//! Wallet session, signing providers and the connection context.
//!
//! A signing provider is whatever can sign and submit a transaction on the
//! user's behalf: a directly reachable wallet extension bridge, or the
//! generic wallet adapter. Each provider states which payload layout it
//! expects first and which it accepts as a fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::errors::{MarketError, Result};
use crate::payload::PayloadShape;

/// Which call path a provider represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignerPath {
    /// Wallet extension reached directly.
    Direct,
    /// Signing through the generic wallet adapter.
    Adapter,
}

/// Connection state as reported by the wallet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletSession {
    pub connected: bool,
    pub account_address: Option<String>,
    pub wallet_name: Option<String>,
}

impl WalletSession {
    pub fn connected(wallet_name: &str, account_address: &str) -> Self {
        Self {
            connected: true,
            account_address: Some(account_address.to_string()),
            wallet_name: Some(wallet_name.to_string()),
        }
    }

    /// Connected and bound to a named wallet.
    pub fn is_ready(&self) -> bool {
        self.connected && self.wallet_name.is_some()
    }

    /// `0xda14...b6c0` style label for display.
    pub fn short_address(&self) -> Option<String> {
        self.account_address.as_deref().map(shorten_address)
    }
}

pub fn shorten_address(address: &str) -> String {
    if address.len() <= 10 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}

/// Signs and submits transaction payloads on behalf of the connected account.
#[async_trait]
pub trait SigningProvider: Send + Sync {
    /// Wallet name, e.g. "Petra".
    fn name(&self) -> &str;

    fn path(&self) -> SignerPath;

    /// Primary layout first, fallback layout second.
    fn payload_shapes(&self) -> [PayloadShape; 2];

    /// Ask the wallet for its account; returns the account address.
    async fn connect(&self) -> Result<String>;

    /// Sign and submit `payload`; returns the wallet's raw response.
    async fn sign_and_submit(&self, payload: &Value) -> Result<Value>;
}

/// Blocks until a submitted transaction is committed.
#[async_trait]
pub trait TransactionConfirmer: Send + Sync {
    async fn wait_for_transaction(&self, hash: &str) -> Result<()>;
}

#[derive(Debug, Deserialize)]
struct AccountResponse {
    address: String,
}

/// [`SigningProvider`] backed by an HTTP signing bridge.
///
/// * `GET  {base}/account`          → `{ "address": "0x…" }`
/// * `POST {base}/sign_and_submit`  → the wallet's response (hash string or object)
pub struct RemoteSigner {
    name: String,
    path: SignerPath,
    shapes: [PayloadShape; 2],
    base_url: String,
    client: Client,
}

impl RemoteSigner {
    pub fn new(name: &str, path: SignerPath, base_url: &str, client: Client) -> Self {
        Self {
            name: name.to_string(),
            path,
            shapes: default_shapes(path),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

/// Extension bridges take the bare payload and fall back to the wrapped one;
/// adapters take the wrapped payload and fall back to the tagged flat one.
pub fn default_shapes(path: SignerPath) -> [PayloadShape; 2] {
    match path {
        SignerPath::Direct => [PayloadShape::Bare, PayloadShape::Wrapped],
        SignerPath::Adapter => [PayloadShape::Wrapped, PayloadShape::Entry],
    }
}

#[async_trait]
impl SigningProvider for RemoteSigner {
    fn name(&self) -> &str {
        &self.name
    }

    fn path(&self) -> SignerPath {
        self.path
    }

    fn payload_shapes(&self) -> [PayloadShape; 2] {
        self.shapes
    }

    async fn connect(&self) -> Result<String> {
        let resp = self
            .client
            .get(format!("{}/account", self.base_url))
            .send()
            .await?;
        if !resp.status().is_success() {
            return Err(MarketError::Signer(format!(
                "{} refused connection: HTTP {}",
                self.name,
                resp.status()
            )));
        }
        let account: AccountResponse = resp.json().await?;
        Ok(account.address)
    }

    async fn sign_and_submit(&self, payload: &Value) -> Result<Value> {
        debug!("{} signing payload: {payload}", self.name);
        let resp = self
            .client
            .post(format!("{}/sign_and_submit", self.base_url))
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MarketError::Signer(format!("HTTP {status}: {body}")));
        }
        Ok(resp.json().await?)
    }
}

/// Configured wallets plus the current session.
pub struct WalletContext {
    direct: Option<Arc<dyn SigningProvider>>,
    adapter: Option<Arc<dyn SigningProvider>>,
    session: RwLock<WalletSession>,
}

/// Wallet picked when the caller names none and it is configured.
pub const PREFERRED_WALLET: &str = "Petra";

impl WalletContext {
    pub fn new(
        direct: Option<Arc<dyn SigningProvider>>,
        adapter: Option<Arc<dyn SigningProvider>>,
    ) -> Self {
        Self {
            direct,
            adapter,
            session: RwLock::new(WalletSession::default()),
        }
    }

    /// Build providers from the signer URLs in `config`.
    pub fn from_config(config: &crate::config::Config, client: &Client) -> Self {
        let direct = config.direct_signer_url.as_deref().map(|url| {
            Arc::new(RemoteSigner::new(
                &config.direct_wallet_name,
                SignerPath::Direct,
                url,
                client.clone(),
            )) as Arc<dyn SigningProvider>
        });
        let adapter = config.adapter_signer_url.as_deref().map(|url| {
            Arc::new(RemoteSigner::new(
                &config.adapter_wallet_name,
                SignerPath::Adapter,
                url,
                client.clone(),
            )) as Arc<dyn SigningProvider>
        });
        Self::new(direct, adapter)
    }

    pub fn direct(&self) -> Option<Arc<dyn SigningProvider>> {
        self.direct.clone()
    }

    pub fn adapter(&self) -> Option<Arc<dyn SigningProvider>> {
        self.adapter.clone()
    }

    /// Names of the configured wallets, direct first.
    pub fn available(&self) -> Vec<String> {
        self.providers().map(|p| p.name().to_string()).collect()
    }

    pub async fn session(&self) -> WalletSession {
        self.session.read().await.clone()
    }

    /// Connect to `preferred`, else to Petra if configured, else to the first wallet.
    ///
    /// The session is only replaced once the provider returns an address; a
    /// failed attempt leaves the current session in place.
    pub async fn connect(&self, preferred: Option<&str>) -> Result<WalletSession> {
        let provider = match preferred {
            Some(name) => self
                .find(name)
                .ok_or_else(|| MarketError::UnknownWallet(name.to_string()))?,
            None => self
                .find(PREFERRED_WALLET)
                .or_else(|| self.providers().next())
                .ok_or(MarketError::NoTransactionMethod)?,
        };

        info!("Connecting wallet {}", provider.name());
        let address = provider.connect().await?;
        let session = WalletSession::connected(provider.name(), &address);
        *self.session.write().await = session.clone();
        info!(
            "Wallet {} connected as {}",
            provider.name(),
            shorten_address(&address)
        );
        Ok(session)
    }

    pub async fn disconnect(&self) {
        let mut session = self.session.write().await;
        if let Some(name) = session.wallet_name.as_deref() {
            info!("Disconnecting wallet {name}");
        }
        *session = WalletSession::default();
    }

    fn providers(&self) -> impl Iterator<Item = &Arc<dyn SigningProvider>> {
        self.direct.iter().chain(self.adapter.iter())
    }

    fn find(&self, name: &str) -> Option<&Arc<dyn SigningProvider>> {
        self.providers().find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Shared HTTP client for signer bridges and the fullnode.
pub fn http_client() -> Result<Client> {
    Ok(Client::builder().timeout(Duration::from_secs(30)).build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSigner {
        name: &'static str,
        path: SignerPath,
        address: Option<&'static str>,
    }

    #[async_trait]
    impl SigningProvider for FixedSigner {
        fn name(&self) -> &str {
            self.name
        }

        fn path(&self) -> SignerPath {
            self.path
        }

        fn payload_shapes(&self) -> [PayloadShape; 2] {
            default_shapes(self.path)
        }

        async fn connect(&self) -> Result<String> {
            self.address
                .map(String::from)
                .ok_or_else(|| MarketError::Signer("user rejected".to_string()))
        }

        async fn sign_and_submit(&self, _payload: &Value) -> Result<Value> {
            Ok(Value::Null)
        }
    }

    fn signer(
        name: &'static str,
        path: SignerPath,
        address: Option<&'static str>,
    ) -> Arc<dyn SigningProvider> {
        Arc::new(FixedSigner {
            name,
            path,
            address,
        })
    }

    #[tokio::test]
    async fn connect_prefers_petra() {
        let ctx = WalletContext::new(
            None,
            Some(signer("Petra", SignerPath::Adapter, Some("0xpetra"))),
        );
        let session = ctx.connect(None).await.unwrap();
        assert_eq!(session.wallet_name.as_deref(), Some("Petra"));
        assert_eq!(ctx.session().await, session);
    }

    #[tokio::test]
    async fn connect_falls_back_to_first_wallet() {
        let ctx = WalletContext::new(
            Some(signer("Martian", SignerPath::Direct, Some("0xmartian"))),
            Some(signer("Pontem", SignerPath::Adapter, Some("0xpontem"))),
        );
        assert_eq!(ctx.available(), vec!["Martian", "Pontem"]);

        let session = ctx.connect(None).await.unwrap();
        assert_eq!(session.wallet_name.as_deref(), Some("Martian"));
        assert_eq!(session.account_address.as_deref(), Some("0xmartian"));
    }

    #[tokio::test]
    async fn connect_by_name_and_disconnect() {
        let ctx = WalletContext::new(
            Some(signer("Petra", SignerPath::Direct, Some("0xpetra"))),
            Some(signer("Pontem", SignerPath::Adapter, Some("0xpontem"))),
        );
        let session = ctx.connect(Some("pontem")).await.unwrap();
        assert_eq!(session.wallet_name.as_deref(), Some("Pontem"));

        ctx.disconnect().await;
        assert!(!ctx.session().await.connected);
    }

    #[tokio::test]
    async fn failed_connect_keeps_session_disconnected() {
        let ctx = WalletContext::new(Some(signer("Petra", SignerPath::Direct, None)), None);
        assert!(ctx.connect(None).await.is_err());
        assert!(!ctx.session().await.is_ready());

        assert!(matches!(
            ctx.connect(Some("Nightly")).await,
            Err(MarketError::UnknownWallet(_))
        ));
    }

    #[tokio::test]
    async fn failed_reconnect_keeps_previous_session() {
        let ctx = WalletContext::new(
            Some(signer("Petra", SignerPath::Direct, Some("0xpetra"))),
            Some(signer("Pontem", SignerPath::Adapter, None)),
        );
        let before = ctx.connect(None).await.unwrap();

        assert!(matches!(
            ctx.connect(Some("Pontem")).await,
            Err(MarketError::Signer(_))
        ));
        let after = ctx.session().await;
        assert_eq!(after, before);
        assert_eq!(after.account_address.as_deref(), Some("0xpetra"));
    }

    #[tokio::test]
    async fn connect_without_wallets() {
        let ctx = WalletContext::new(None, None);
        assert!(matches!(
            ctx.connect(None).await,
            Err(MarketError::NoTransactionMethod)
        ));
    }

    #[test]
    fn short_address_label() {
        let session = WalletSession::connected(
            "Petra",
            "0xda14cb8535c599bd7eeedaf980c4e6fa8c1605047ff88403b6120f7437b7b6c0",
        );
        assert_eq!(session.short_address().as_deref(), Some("0xda14...b6c0"));
        assert_eq!(shorten_address("0x1"), "0x1");
    }
}
