//! The charity catalog.
//!
//! The catalog is fixed for the lifetime of the process: either the built-in
//! list or a JSON file named in the configuration, loaded once at startup.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::directory::filter::CharityFilter;
use crate::directory::record::CharityRecord;

/// Error type for catalog loading.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("catalog contains no charities")]
    Empty,

    #[error("duplicate charity id '{0}'")]
    DuplicateId(String),
}

/// Immutable, ordered set of charity records.
#[derive(Debug, Clone)]
pub struct Directory {
    records: Vec<CharityRecord>,
}

impl Directory {
    /// Build a directory from records, rejecting empty sets and duplicate ids.
    pub fn new(records: Vec<CharityRecord>) -> Result<Self, CatalogError> {
        if records.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (i, record) in records.iter().enumerate() {
            if records[..i].iter().any(|r| r.id == record.id) {
                return Err(CatalogError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self { records })
    }

    /// The built-in catalog, stamped as verified at `verified_at`.
    pub fn builtin(verified_at: DateTime<Utc>) -> Self {
        Self {
            records: builtin_records(verified_at),
        }
    }

    /// Load a catalog from a JSON array of records.
    pub fn from_json_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let records: Vec<CharityRecord> = serde_json::from_str(&content)?;
        Self::new(records)
    }

    pub fn records(&self) -> &[CharityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for record in &self.records {
            if !seen.contains(&record.category.as_str()) {
                seen.push(&record.category);
            }
        }
        seen
    }

    pub fn verified_count(&self) -> usize {
        self.records.iter().filter(|r| r.verified).count()
    }

    /// Records matching `filter`, in catalog order.
    pub fn search(&self, filter: &CharityFilter) -> Vec<&CharityRecord> {
        filter.apply(&self.records)
    }
}

#[allow(clippy::too_many_arguments)]
fn record(
    id: &str,
    name: &str,
    description: &str,
    category: &str,
    sub_category: &str,
    donation_url: &str,
    featured: bool,
    impact: &str,
    location: &str,
    rating: f32,
    established_year: u16,
    certifications: &[&str],
    accepts_zakat: bool,
    languages: &[&str],
    verified_at: DateTime<Utc>,
) -> CharityRecord {
    CharityRecord {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        category: category.to_string(),
        sub_category: Some(sub_category.to_string()),
        donation_url: donation_url.to_string(),
        verified: true,
        featured,
        impact: Some(impact.to_string()),
        location: Some(location.to_string()),
        rating,
        established_year,
        certifications: certifications.iter().map(|s| s.to_string()).collect(),
        emergency_response: true,
        accepts_zakat,
        languages: languages.iter().map(|s| s.to_string()).collect(),
        last_verified: verified_at,
    }
}

fn builtin_records(verified_at: DateTime<Utc>) -> Vec<CharityRecord> {
    vec![
        record(
            "islamic-relief",
            "Islamic Relief USA",
            "Providing emergency aid, healthcare, and education to Gaza families in critical need.",
            "Emergency Aid",
            "Medical & Food",
            "https://irusa.org/middle-east/palestine/",
            true,
            "Serving 50,000+ families monthly",
            "Gaza Strip",
            4.8,
            1993,
            &["GuideStar Platinum", "Charity Navigator 4-Star"],
            true,
            &["English", "Arabic"],
            verified_at,
        ),
        record(
            "muslim-aid",
            "Muslim Aid",
            "Delivering life-saving medical supplies, clean water, and shelter materials to Gaza.",
            "Medical Support",
            "Healthcare & Water",
            "https://muslimaid.org/palestine-emergency/",
            true,
            "Treated 25,000+ patients this year",
            "Gaza & West Bank",
            4.7,
            1985,
            &["Charity Commission Registered"],
            true,
            &["English", "Arabic", "French"],
            verified_at,
        ),
        record(
            "penny-appeal",
            "Penny Appeal",
            "Providing hot meals, emergency shelter, and psychological support for Gaza children.",
            "Food Distribution",
            "Child Support",
            "https://pennyappeal.org/appeal/palestine-emergency",
            false,
            "Fed 15,000+ children daily",
            "Gaza Strip",
            4.6,
            2009,
            &["Fundraising Regulator"],
            true,
            &["English", "Arabic"],
            verified_at,
        ),
        record(
            "human-appeal",
            "Human Appeal",
            "Building temporary shelters, providing clean water systems, and educational support.",
            "Infrastructure",
            "Water & Shelter",
            "https://humanappeal.org.uk/appeals/palestine",
            false,
            "Built 200+ shelters, 50+ water wells",
            "Gaza & Lebanon",
            4.5,
            1991,
            &["Charity Commission", "Humanitarian Accountability Partnership"],
            true,
            &["English", "Arabic", "French"],
            verified_at,
        ),
        record(
            "ummah-welfare-trust",
            "Ummah Welfare Trust",
            "Providing cash assistance, medical care, and orphan support for Gaza families.",
            "Family Support",
            "Orphan Care",
            "https://uwt.org/palestine",
            true,
            "Supporting 3,000+ orphans",
            "Gaza Strip",
            4.9,
            2001,
            &["Charity Commission", "GuideStar"],
            true,
            &["English", "Arabic", "Urdu"],
            verified_at,
        ),
        record(
            "map-uk",
            "Medical Aid for Palestinians",
            "Delivering critical medical supplies, training healthcare workers, and emergency surgical support.",
            "Medical Support",
            "Healthcare Training",
            "https://www.map.org.uk/donate/palestine-crisis",
            false,
            "Trained 500+ healthcare workers",
            "Gaza & West Bank",
            4.8,
            1984,
            &["Charity Commission", "Medics Sans Frontières Partnership"],
            false,
            &["English", "Arabic"],
            verified_at,
        ),
    ]
}
