use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::analytics::{AnalyticsEvent, EventRequest, SnapshotKind};
use crate::http::request::{user_agent, ClientAddr};
use crate::http::response::{timestamp, ApiError, MESSAGE};
use crate::http::server::AppState;

/// Characters of event data written to the log.
const DATA_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SnapshotQuery {
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    query: Result<Query<SnapshotQuery>, QueryRejection>,
) -> Result<Json<Value>, ApiError> {
    let Query(query) = query?;
    let kind = SnapshotKind::from_query(query.kind.as_deref());

    tracing::info!(
        client = %client,
        kind = ?kind,
        user_agent = %user_agent(&headers),
        "Analytics request"
    );

    let store = &state.store;
    let body = match kind {
        SnapshotKind::Donations => flatten(&store.donations(), MESSAGE.to_string())?,
        SnapshotKind::Visitors => flatten(&store.visitors(), MESSAGE.to_string())?,
        SnapshotKind::Performance => flatten(&store.performance(), MESSAGE.to_string())?,
        SnapshotKind::Security => flatten(&store.security(), MESSAGE.to_string())?,
        SnapshotKind::Summary => json!({
            "summary": store.summary(),
            "message": format!("{} - Platform serving humanity", MESSAGE),
            "lastUpdated": timestamp(),
        }),
    };
    Ok(Json(body))
}

/// Merge a view's fields with `message` and `lastUpdated`.
fn flatten<T: Serialize>(view: &T, message: String) -> Result<Value, ApiError> {
    let mut body = match serde_json::to_value(view) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            map
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };
    body.insert("message".into(), json!(message));
    body.insert("lastUpdated".into(), json!(timestamp()));
    Ok(Value::Object(body))
}

pub async fn track_event(
    State(state): State<AppState>,
    client: ClientAddr,
    headers: HeaderMap,
    body: Result<Json<EventRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body?;
    let name = request
        .event
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or(ApiError::MissingEvent)?;

    let event = AnalyticsEvent::parse(name, request.data.as_ref());
    let counted = state.store.record(&event);

    tracing::info!(
        client = %client,
        event = %name,
        counted,
        data = %data_preview(request.data.as_ref()),
        user_agent = %user_agent(&headers),
        "Analytics event"
    );

    Ok(Json(json!({
        "success": true,
        "event": name,
        "timestamp": timestamp(),
        "message": format!("{} - Event tracked", MESSAGE),
    })))
}

fn data_preview(data: Option<&Value>) -> String {
    match data {
        Some(value) => value.to_string().chars().take(DATA_PREVIEW_CHARS).collect(),
        None => "none".to_string(),
    }
}
