//! Listing document source for `GET /api/projects`.
//!
//! The generated file (projects with NFT data) wins; the plain project file
//! is used when it is missing; an embedded one-project document is served
//! when neither can be read. The document is passed through untouched.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::config::DEFAULT_CONTRACT_ADDRESS;
use crate::errors::Result;

/// Where a served listing document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingSource {
    Primary,
    Fallback,
    Embedded,
}

#[derive(Debug, Clone)]
pub struct LoadedListing {
    pub source: ListingSource,
    pub document: Value,
}

/// Load the listing document, falling back primary → fallback → embedded.
///
/// Never fails: read and parse errors are logged and the next source is tried.
pub async fn load_listing_document(primary: &Path, fallback: &Path) -> LoadedListing {
    match read_json(primary).await {
        Ok(document) => {
            debug!("Serving listings from {}", primary.display());
            return LoadedListing {
                source: ListingSource::Primary,
                document,
            };
        }
        Err(e) => debug!("Primary listing file {} unavailable: {e}", primary.display()),
    }

    match read_json(fallback).await {
        Ok(document) => LoadedListing {
            source: ListingSource::Fallback,
            document,
        },
        Err(e) => {
            warn!(
                "Error reading projects data ({}), serving embedded listing",
                e
            );
            LoadedListing {
                source: ListingSource::Embedded,
                document: embedded_listing(),
            }
        }
    }
}

async fn read_json(path: &Path) -> Result<Value> {
    let raw = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}

/// Single-project document served when no listing file is deployed.
pub fn embedded_listing() -> Value {
    const ADDRESS: &str = DEFAULT_CONTRACT_ADDRESS;
    const OBJECT: &str = "0xda14cb8535c599bd000000025a";
    const TX: &str = "0x1832770758d52e945e750c8631ea2925ae2638018545647c7eb820b271a8e468";

    json!({
        "projects": [
            {
                "id": "RF-2023-089",
                "title": "Amazon Rainforest Conservation",
                "location": "Brazil",
                "type": "Reforestation",
                "category": "reforestation",
                "price": 1845,
                "creditsAvailable": 12450,
                "verified": true,
                "nft_data": {
                    "collection_name": "EcoChain Carbon Credits",
                    "token_name": "Reforestation - RF-2023-089",
                    "owner_address": ADDRESS,
                    "contract_address": ADDRESS,
                    "object_address": OBJECT,
                    "transaction_hash": TX,
                    "explorer_urls": {
                        "transaction": format!("https://explorer.aptoslabs.com/txn/{TX}?network=testnet"),
                        "contract": format!("https://explorer.aptoslabs.com/account/{ADDRESS}?network=testnet"),
                        "object": format!("https://explorer.aptoslabs.com/object/{OBJECT}?network=testnet")
                    }
                }
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listing::ListingDocument;

    fn write(dir: &Path, name: &str, value: &Value) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, serde_json::to_string_pretty(value).unwrap()).unwrap();
        path
    }

    #[tokio::test]
    async fn serves_primary_when_present() {
        let dir = tempfile::tempdir().unwrap();
        let primary_doc = json!({ "projects": [{ "id": "PRIMARY" }] });
        let primary = write(dir.path(), "with_nfts.json", &primary_doc);
        let fallback = write(
            dir.path(),
            "plain.json",
            &json!({ "projects": [{ "id": "FALLBACK" }] }),
        );

        let loaded = load_listing_document(&primary, &fallback).await;
        assert_eq!(loaded.source, ListingSource::Primary);
        assert_eq!(loaded.document, primary_doc);
    }

    #[tokio::test]
    async fn falls_back_when_primary_missing() {
        let dir = tempfile::tempdir().unwrap();
        let fallback_doc = json!({ "projects": [{ "id": "FALLBACK" }, { "id": "OTHER" }] });
        let fallback = write(dir.path(), "plain.json", &fallback_doc);

        let loaded = load_listing_document(&dir.path().join("missing.json"), &fallback).await;
        assert_eq!(loaded.source, ListingSource::Fallback);
        assert_eq!(loaded.document, fallback_doc);
    }

    #[tokio::test]
    async fn falls_back_when_primary_is_not_json() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join("broken.json");
        std::fs::write(&primary, "{ not json").unwrap();
        let fallback_doc = json!({ "projects": [] });
        let fallback = write(dir.path(), "plain.json", &fallback_doc);

        let loaded = load_listing_document(&primary, &fallback).await;
        assert_eq!(loaded.source, ListingSource::Fallback);
        assert_eq!(loaded.document, fallback_doc);
    }

    #[tokio::test]
    async fn embedded_payload_when_both_missing() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = load_listing_document(
            &dir.path().join("missing_a.json"),
            &dir.path().join("missing_b.json"),
        )
        .await;

        assert_eq!(loaded.source, ListingSource::Embedded);
        let projects = loaded.document["projects"].as_array().unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0]["id"], "RF-2023-089");
    }

    #[test]
    fn embedded_payload_matches_listing_model() {
        let doc: ListingDocument = serde_json::from_value(embedded_listing()).unwrap();
        let nft = doc.projects[0].nft_data.as_ref().unwrap();
        assert_eq!(nft.token_name, "Reforestation - RF-2023-089");
        assert!(nft.explorer_urls.transaction.contains(&nft.transaction_hash));
    }
}
