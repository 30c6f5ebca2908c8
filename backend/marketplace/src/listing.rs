//! Marketplace listing types, the built-in fixture data and the category filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketError;

/// Project categories the marketplace lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Reforestation,
    Renewable,
    Methane,
    Marine,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Reforestation,
        Category::Renewable,
        Category::Methane,
        Category::Marine,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reforestation => "reforestation",
            Self::Renewable => "renewable",
            Self::Methane => "methane",
            Self::Marine => "marine",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MarketError::InvalidCategory(s.to_string()))
    }
}

/// Selection made in the marketplace filter panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Only(Category),
}

impl FromStr for CategoryFilter {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            Ok(Self::All)
        } else {
            s.parse().map(Self::Only)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplorerUrls {
    pub transaction: String,
    pub contract: String,
    pub object: String,
}

/// Token metadata attached to a project once its credit NFT has been minted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NftData {
    pub collection_name: String,
    pub token_name: String,
    pub owner_address: String,
    pub contract_address: String,
    pub object_address: String,
    pub transaction_hash: String,
    pub explorer_urls: ExplorerUrls,
}

/// A carbon-credit project as listed on the marketplace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub title: String,
    pub location: String,
    pub category: Category,
    /// Human-readable project type, e.g. "Renewable Energy".
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub project_type: Option<String>,
    /// Price per credit in minor units (1845 = 18.45).
    pub price: u64,
    pub credits_available: u64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
    #[serde(
        rename = "pricePerTokenUSD",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub price_per_token_usd: Option<f64>,
    #[serde(rename = "nft_data", default, skip_serializing_if = "Option::is_none")]
    pub nft_data: Option<NftData>,
}

/// `{ "projects": [...] }` as served by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingDocument {
    pub projects: Vec<Project>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransactionKind {
    Purchase,
    Retirement,
}

/// One row of the "recent transactions" feed. Sample data only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub project: String,
    pub credits: u64,
    pub price: String,
    pub price_per_credit: String,
    pub buyer: String,
    pub location: String,
    pub date: String,
    pub tx_hash: String,
}

/// Return the projects matching `filter`.
///
/// `All` yields the input unchanged; `Only` keeps the input order.
pub fn filter_projects(projects: &[Project], filter: CategoryFilter) -> Vec<Project> {
    match filter {
        CategoryFilter::All => projects.to_vec(),
        CategoryFilter::Only(category) => projects
            .iter()
            .filter(|p| p.category == category)
            .cloned()
            .collect(),
    }
}

#[allow(clippy::too_many_arguments)]
fn project(
    id: &str,
    title: &str,
    location: &str,
    category: Category,
    project_type: &str,
    price: u64,
    credits_available: u64,
    rating: f64,
    description: &str,
) -> Project {
    Project {
        id: id.to_string(),
        title: title.to_string(),
        location: location.to_string(),
        category,
        project_type: Some(project_type.to_string()),
        price,
        credits_available,
        rating,
        verified: true,
        description: description.to_string(),
        coordinates: None,
        price_per_token_usd: None,
        nft_data: None,
    }
}

/// The projects shown on the marketplace page when no listing file is deployed.
pub fn fixture_projects() -> Vec<Project> {
    vec![
        project(
            "RF-2023-089",
            "Amazon Rainforest Conservation",
            "Brazil",
            Category::Reforestation,
            "Reforestation",
            1845,
            12_450,
            4.9,
            "This project focuses on conserving and restoring the Amazon rainforest, one of Earth's most vital carbon sinks and biodiversity hotspots.",
        ),
        project(
            "SE-2023-142",
            "Solar Energy Farm",
            "India",
            Category::Renewable,
            "Renewable Energy",
            1420,
            45_230,
            4.7,
            "A large-scale solar farm in Rajasthan that replaces coal-fired power plants, significantly reducing carbon emissions in India's energy sector.",
        ),
        project(
            "MG-2023-076",
            "Methane Gas Capture",
            "United States",
            Category::Methane,
            "Gas Capture",
            1280,
            9_120,
            4.8,
            "This project captures harmful methane emissions from landfills in Colorado, converting this potent greenhouse gas into clean energy.",
        ),
        project(
            "MC-2023-105",
            "Marine Conservation Blue Carbon",
            "Philippines",
            Category::Marine,
            "Conservation",
            1950,
            7_850,
            4.6,
            "Protection of coastal mangrove forests in the Philippines, preserving vital blue carbon ecosystems and supporting local communities.",
        ),
        project(
            "RF-2023-118",
            "Highland Reforestation Project",
            "Scotland",
            Category::Reforestation,
            "Reforestation",
            1650,
            15_200,
            4.5,
            "Restoration of native Caledonian forests in the Scottish Highlands, enhancing biodiversity while creating significant carbon sinks.",
        ),
        project(
            "WE-2023-092",
            "Wind Farm Kenya",
            "Kenya",
            Category::Renewable,
            "Renewable Energy",
            1370,
            32_600,
            4.8,
            "Africa's largest wind power project, providing clean electricity to over 300,000 homes while avoiding 380,000 tons of CO2 emissions annually.",
        ),
    ]
}

#[allow(clippy::too_many_arguments)]
fn record(
    kind: TransactionKind,
    project: &str,
    credits: u64,
    price: &str,
    price_per_credit: &str,
    buyer: &str,
    location: &str,
    date: &str,
    tx_hash: &str,
) -> TransactionRecord {
    TransactionRecord {
        kind,
        project: project.to_string(),
        credits,
        price: price.to_string(),
        price_per_credit: price_per_credit.to_string(),
        buyer: buyer.to_string(),
        location: location.to_string(),
        date: date.to_string(),
        tx_hash: tx_hash.to_string(),
    }
}

/// Decorative "recent activity" feed. Not derived from any ledger query.
pub fn sample_transactions() -> Vec<TransactionRecord> {
    use TransactionKind::{Purchase, Retirement};
    vec![
        record(
            Purchase,
            "Amazon Rainforest Conservation",
            500,
            "$9,225.00",
            "$18.45",
            "GreenTech Inc.",
            "Brazil",
            "2 hours ago",
            "0x7f2c38e5d3b95a4a0c8f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Retirement,
            "Wind Farm Kenya",
            1_200,
            "$16,440.00",
            "$13.70",
            "EcoAir Corp",
            "Kenya",
            "5 hours ago",
            "0x9e8b1a4d5f2c38e5c7f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Purchase,
            "Mangrove Restoration Initiative",
            800,
            "$11,600.00",
            "$14.50",
            "OceanGuard",
            "Indonesia",
            "1 day ago",
            "0x5e2a38e5d3b95a4c7f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Purchase,
            "Solar Energy Farm Rajasthan",
            350,
            "$4,970.00",
            "$14.20",
            "SustainCorp",
            "India",
            "1 day ago",
            "0x3f2c38e5d3b95a4c7f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Retirement,
            "Methane Capture Colorado",
            700,
            "$8,960.00",
            "$12.80",
            "CleanFutures LLC",
            "United States",
            "2 days ago",
            "0x1a2c38e5d3b95a4c7f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Purchase,
            "Marine Conservation Blue Carbon",
            250,
            "$4,875.00",
            "$19.50",
            "OceanicSolutions",
            "Philippines",
            "3 days ago",
            "0x8b2c38e5d3b95a4c7f19167d8c5b7d9d2e898432c6f37a",
        ),
        record(
            Retirement,
            "Reforestation Highland Project",
            1_500,
            "$24,750.00",
            "$16.50",
            "GreenPath International",
            "Scotland",
            "4 days ago",
            "0x2d2c38e5d3b95a4c7f19167d8c5b7d9d2e898432c6f37a",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_all_returns_full_set_unmodified() {
        let projects = fixture_projects();
        assert_eq!(filter_projects(&projects, CategoryFilter::All), projects);
    }

    #[test]
    fn filter_by_category_returns_exact_subset() {
        let projects = fixture_projects();
        for category in Category::ALL {
            let filtered = filter_projects(&projects, CategoryFilter::Only(category));
            let expected: Vec<_> = projects
                .iter()
                .filter(|p| p.category == category)
                .cloned()
                .collect();
            assert_eq!(filtered, expected);
        }

        let renewable = filter_projects(&projects, CategoryFilter::Only(Category::Renewable));
        let ids: Vec<_> = renewable.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["SE-2023-142", "WE-2023-092"]);
    }

    #[test]
    fn filter_on_empty_category_is_empty() {
        let only_marine: Vec<_> = fixture_projects()
            .into_iter()
            .filter(|p| p.category != Category::Marine)
            .collect();
        assert!(filter_projects(&only_marine, CategoryFilter::Only(Category::Marine)).is_empty());
    }

    #[test]
    fn parse_category_filter() {
        assert_eq!("all".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            "Methane".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Only(Category::Methane)
        );
        assert!("conservation".parse::<CategoryFilter>().is_err());
    }

    #[test]
    fn project_uses_camel_case_wire_names() {
        let json = serde_json::json!({
            "id": "RF-2023-089",
            "title": "Amazon Rainforest Conservation",
            "location": "Brazil",
            "category": "reforestation",
            "type": "Reforestation",
            "price": 1845,
            "creditsAvailable": 12450,
            "verified": true,
            "pricePerTokenUSD": 18.45,
            "coordinates": { "latitude": -3.4653, "longitude": -62.2159 }
        });
        let project: Project = serde_json::from_value(json).unwrap();
        assert_eq!(project.credits_available, 12_450);
        assert_eq!(project.price_per_token_usd, Some(18.45));
        assert_eq!(project.project_type.as_deref(), Some("Reforestation"));
        assert!(project.nft_data.is_none());

        let back = serde_json::to_value(&project).unwrap();
        assert_eq!(back["creditsAvailable"], 12450);
        assert!(back.get("nft_data").is_none());
    }

    #[test]
    fn shipped_listing_matches_fixtures() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../data/project_data.json");
        let raw = std::fs::read_to_string(path).unwrap();
        let doc: ListingDocument = serde_json::from_str(&raw).unwrap();

        let shipped: Vec<_> = doc.projects.iter().map(|p| (&p.id, p.category, p.price)).collect();
        let fixtures = fixture_projects();
        let expected: Vec<_> = fixtures.iter().map(|p| (&p.id, p.category, p.price)).collect();
        assert_eq!(shipped, expected);
        assert!(doc.projects.iter().all(|p| p.coordinates.is_some()));
    }

    #[test]
    fn sample_feed_serializes_kind_as_type() {
        let feed = sample_transactions();
        let first = serde_json::to_value(&feed[0]).unwrap();
        assert_eq!(first["type"], "Purchase");
        assert_eq!(first["txHash"], feed[0].tx_hash);
    }
}
