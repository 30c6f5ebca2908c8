//! Application configuration loaded from environment variables.

use std::path::PathBuf;

use crate::errors::{MarketError, Result};

/// Address the EcoChain Move package was published under on testnet.
pub const DEFAULT_CONTRACT_ADDRESS: &str =
    "0xda14cb8535c599bd7eeedaf980c4e6fa8c1605047ff88403b6120f7437b7b6c0";

#[derive(Debug, Clone)]
pub struct Config {
    /// Aptos fullnode REST endpoint (e.g. https://fullnode.testnet.aptoslabs.com/v1)
    pub node_url: String,
    /// Account address the marketplace/verification modules live under
    pub contract_address: String,
    /// Generated listing document (projects with NFT data)
    pub projects_file: PathBuf,
    /// Listing document used when the generated one is missing
    pub projects_fallback_file: PathBuf,
    /// Port for the REST API server
    pub api_port: u16,
    /// Signing bridge for a directly injected wallet extension, if any
    pub direct_signer_url: Option<String>,
    /// Wallet name reported by the direct signer
    pub direct_wallet_name: String,
    /// Signing bridge behind the generic wallet adapter, if any
    pub adapter_signer_url: Option<String>,
    /// Wallet name reported by the adapter signer
    pub adapter_wallet_name: String,
    /// Price argument used when a purchase request carries none
    pub default_price: String,
    /// Whether to poll the fullnode for confirmation after submission
    pub wait_for_confirmation: bool,
    /// Delay between confirmation polls, in milliseconds
    pub confirm_poll_ms: u64,
    /// Optional cap on confirmation polls; unbounded when unset
    pub confirm_max_polls: Option<u32>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let contract_address = env_var("CONTRACT_ADDRESS")
            .unwrap_or_else(|_| DEFAULT_CONTRACT_ADDRESS.to_string());
        validate_address(&contract_address)?;

        Ok(Config {
            node_url: env_var("NODE_URL")
                .unwrap_or_else(|_| "https://fullnode.testnet.aptoslabs.com/v1".to_string()),
            contract_address,
            projects_file: env_var("PROJECTS_FILE")
                .unwrap_or_else(|_| "data/project_data_with_nfts.json".to_string())
                .into(),
            projects_fallback_file: env_var("PROJECTS_FALLBACK_FILE")
                .unwrap_or_else(|_| "data/project_data.json".to_string())
                .into(),
            api_port: env_var("API_PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .map_err(|_| MarketError::Config("Invalid API_PORT".to_string()))?,
            direct_signer_url: env_var("DIRECT_SIGNER_URL").ok(),
            direct_wallet_name: env_var("DIRECT_WALLET_NAME")
                .unwrap_or_else(|_| "Petra".to_string()),
            adapter_signer_url: env_var("ADAPTER_SIGNER_URL").ok(),
            adapter_wallet_name: env_var("ADAPTER_WALLET_NAME")
                .unwrap_or_else(|_| "Wallet Adapter".to_string()),
            default_price: env_var("DEFAULT_PRICE").unwrap_or_else(|_| "1845".to_string()),
            wait_for_confirmation: env_var("WAIT_FOR_CONFIRMATION")
                .unwrap_or_else(|_| "true".to_string())
                .parse()
                .map_err(|_| MarketError::Config("Invalid WAIT_FOR_CONFIRMATION".to_string()))?,
            confirm_poll_ms: env_var("CONFIRM_POLL_MS")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .map_err(|_| MarketError::Config("Invalid CONFIRM_POLL_MS".to_string()))?,
            confirm_max_polls: env_var("CONFIRM_MAX_POLLS")
                .ok()
                .map(|v| {
                    v.parse::<u32>()
                        .map_err(|_| MarketError::Config("Invalid CONFIRM_MAX_POLLS".to_string()))
                })
                .transpose()?,
        })
    }
}

/// Check that `address` is a `0x`-prefixed hex account address of at most 32 bytes.
pub fn validate_address(address: &str) -> Result<()> {
    let digits = address
        .strip_prefix("0x")
        .ok_or_else(|| MarketError::Config(format!("Address must start with 0x: {address}")))?;
    if digits.is_empty() || digits.len() > 64 {
        return Err(MarketError::Config(format!(
            "Address must hold 1-32 bytes: {address}"
        )));
    }
    // Odd-length short forms (0x1) are legal on Aptos; pad before decoding.
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    hex::decode(&padded)
        .map(|_| ())
        .map_err(|e| MarketError::Config(format!("Invalid address {address}: {e}")))
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| MarketError::Config(format!("Missing env var: {key}")))
}
