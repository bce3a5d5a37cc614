//! Charity record type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verified aid organization listed in the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharityRecord {
    /// Stable slug, also used as the analytics counter key.
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub sub_category: Option<String>,
    /// Outbound donation page.
    pub donation_url: String,
    #[serde(default)]
    pub verified: bool,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub impact: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// Rating out of 5.
    pub rating: f32,
    pub established_year: u16,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default)]
    pub emergency_response: bool,
    #[serde(default = "default_accepts_zakat")]
    pub accepts_zakat: bool,
    #[serde(default)]
    pub languages: Vec<String>,
    pub last_verified: DateTime<Utc>,
}

fn default_accepts_zakat() -> bool {
    true
}
