//! New-charity submissions.
//!
//! Submissions are validated and acknowledged for manual review. Nothing is
//! stored; the receipt only carries a generated id for correspondence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

/// Fields every submission must carry.
pub const REQUIRED_FIELDS: [&str; 3] = ["name", "description", "donationUrl"];

/// Body of `POST /charities`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharitySubmission {
    pub name: Option<String>,
    pub description: Option<String>,
    pub donation_url: Option<String>,
    pub category: Option<String>,
}

/// A submission that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidSubmission {
    pub name: String,
    pub description: String,
    pub donation_url: Url,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("Missing required fields")]
    MissingFields(Vec<&'static str>),

    #[error("Invalid donation URL")]
    InvalidDonationUrl(String),
}

impl CharitySubmission {
    /// Check required fields and the donation URL.
    pub fn validate(self) -> Result<ValidSubmission, SubmissionError> {
        let name = present(self.name);
        let description = present(self.description);
        let donation_url = present(self.donation_url);

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push(REQUIRED_FIELDS[0]);
        }
        if description.is_none() {
            missing.push(REQUIRED_FIELDS[1]);
        }
        if donation_url.is_none() {
            missing.push(REQUIRED_FIELDS[2]);
        }

        let (Some(name), Some(description), Some(donation_url)) = (name, description, donation_url)
        else {
            return Err(SubmissionError::MissingFields(missing));
        };

        let url = Url::parse(&donation_url)
            .ok()
            .filter(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
            .ok_or(SubmissionError::InvalidDonationUrl(donation_url))?;

        Ok(ValidSubmission {
            name,
            description,
            donation_url: url,
            category: present(self.category),
        })
    }
}

impl ValidSubmission {
    /// First `max_chars` characters of the description, for log lines.
    pub fn description_preview(&self, max_chars: usize) -> String {
        let mut chars = self.description.chars();
        let preview: String = chars.by_ref().take(max_chars).collect();
        if chars.next().is_some() {
            format!("{}...", preview)
        } else {
            preview
        }
    }
}

/// Acknowledgment returned for an accepted submission.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionReceipt {
    pub message: &'static str,
    pub status: &'static str,
    pub review_time: &'static str,
    pub submission_id: String,
    pub note: String,
}

impl SubmissionReceipt {
    pub fn pending(received_at: DateTime<Utc>, note: &str) -> Self {
        Self {
            message: "Charity submission received for verification",
            status: "pending_review",
            review_time: "2-5 business days",
            submission_id: submission_id(received_at),
            note: format!("{} - All submissions undergo thorough verification", note),
        }
    }
}

/// `relief-<unix millis>-<8 hex chars>`.
pub fn submission_id(received_at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("relief-{}-{}", received_at.timestamp_millis(), &suffix[..8])
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
