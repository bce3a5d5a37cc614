use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Serialize;

use crate::directory::{CharityFilter, CharityQuery, CharityRecord, CharitySubmission, SubmissionReceipt};
use crate::http::request::{user_agent, ClientAddr};
use crate::http::response::{timestamp, ApiError, MESSAGE};
use crate::http::server::AppState;

/// Characters of a submission description written to the log.
const PREVIEW_CHARS: usize = 100;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMeta<'a> {
    /// Records returned.
    pub total: usize,
    /// Records in the catalog.
    pub available: usize,
    pub categories: Vec<&'a str>,
    pub last_updated: String,
    pub message: &'static str,
}

#[derive(Serialize)]
pub struct CharityList<'a> {
    pub charities: Vec<&'a CharityRecord>,
    pub meta: CatalogMeta<'a>,
}

pub async fn list_charities(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    query: Result<Query<CharityQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) = query?;
    let filter = CharityFilter::try_from(query)?;
    let charities = state.directory.search(&filter);

    tracing::info!(
        client = %client,
        filters = ?filter,
        results = charities.len(),
        user_agent = %user_agent(&headers),
        "Charity list request"
    );

    let body = CharityList {
        meta: CatalogMeta {
            total: charities.len(),
            available: state.directory.len(),
            categories: state.directory.categories(),
            last_updated: timestamp(),
            message: MESSAGE,
        },
        charities,
    };
    Ok(Json(body).into_response())
}

pub async fn submit_charity(
    client: ClientAddr,
    headers: HeaderMap,
    body: Result<Json<CharitySubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<SubmissionReceipt>), ApiError> {
    let Json(submission) = body?;
    let submission = submission.validate().inspect_err(|e| {
        tracing::info!(client = %client, reason = %e, "Charity submission rejected");
    })?;

    let receipt = SubmissionReceipt::pending(Utc::now(), MESSAGE);
    tracing::info!(
        client = %client,
        submission_id = %receipt.submission_id,
        name = %submission.name,
        category = submission.category.as_deref().unwrap_or("none"),
        donation_url = %submission.donation_url,
        description = %submission.description_preview(PREVIEW_CHARS),
        user_agent = %user_agent(&headers),
        "Charity submission received"
    );

    Ok((StatusCode::CREATED, Json(receipt)))
}
