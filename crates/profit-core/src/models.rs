//! Profit records and backend payload shapes
//!
//! Raw record fields stay as `serde_json::Value` so a missing or wrong-typed
//! field falls back to its default instead of rejecting the whole page.
//! Top-level payload fields go through the lenient decoders at the bottom of
//! this file for the same reason.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::codec;
use crate::constants;

/// One ingested profit event, normalized
#[derive(Debug, Clone, PartialEq)]
pub struct ProfitRecord {
    /// Deposit amount, never negative
    pub amount: f64,
    pub worker_percent: u32,
    pub service: String,
    pub worker: String,
    pub date: DateTime<Utc>,
    /// Project balance as reported when this record was ingested
    pub project_running_total: f64,
}

impl ProfitRecord {
    /// Normalize a raw backend record. `now` stands in for a missing or
    /// unparseable date.
    pub fn from_raw(raw: &RawProfit, now: DateTime<Utc>) -> Self {
        Self {
            amount: raw.amount.as_ref().map(codec::decode_value).unwrap_or(0.0),
            worker_percent: raw
                .worker_percent
                .as_ref()
                .and_then(parse_percent)
                .unwrap_or(constants::DEFAULT_WORKER_PERCENT),
            service: text_or(raw.service.as_ref(), constants::UNKNOWN_SERVICE),
            worker: text_or(raw.worker_name.as_ref(), constants::UNKNOWN_WORKER),
            date: raw.date.as_ref().and_then(parse_date).unwrap_or(now),
            project_running_total: raw
                .project_amount
                .as_ref()
                .map(codec::decode_value)
                .unwrap_or(0.0),
        }
    }

    /// Worker share as display text, e.g. "70%"
    pub fn worker_percent_text(&self) -> String {
        format!("{}%", self.worker_percent)
    }
}

/// Profit record as delivered by the backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawProfit {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub worker_percent: Option<Value>,
    #[serde(default)]
    pub service: Option<Value>,
    #[serde(default)]
    pub worker_name: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub project_amount: Option<Value>,
}

/// `GET /api/data` response: authoritative totals plus the newest profits
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OverviewPayload {
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub workers_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub profits_count: Option<u64>,
    #[serde(default, deserialize_with = "lenient_profits")]
    pub profits: Option<Vec<RawProfit>>,
}

/// `GET /api/profits?limit=&offset=` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PagePayload {
    #[serde(default, deserialize_with = "lenient_profits")]
    pub profits: Option<Vec<RawProfit>>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub has_more: bool,
}

/// `POST /api/profits` body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmitRequest {
    pub amount: f64,
    pub worker_percent: u32,
    pub service: String,
    /// Handle without the leading `@`
    pub worker_username: String,
    /// Identity id of the submitting user, when known
    pub added_by: Option<i64>,
}

/// `POST /api/profits` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubmitResponse {
    #[serde(default, deserialize_with = "lenient_flag")]
    pub success: bool,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub profits_count: Option<u64>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Worker as listed by `GET /api/workers`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Worker {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Identity-provider id; string or number depending on the backend
    #[serde(default)]
    pub telegram_id: Option<Value>,
    #[serde(default)]
    pub register_date: Option<String>,
}

impl Worker {
    /// Display name, falling back to the handle
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.username)
    }

    /// Active means the worker has linked an identity-provider account
    pub fn is_active(&self) -> bool {
        match &self.telegram_id {
            Some(Value::String(s)) => !s.trim().is_empty(),
            Some(Value::Number(_)) => true,
            _ => false,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkersPayload {
    #[serde(default, deserialize_with = "lenient_workers")]
    pub workers: Vec<Worker>,
}

/// What the backend did with an add-worker request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerAction {
    Added,
    Updated,
    NoChanges,
    FoundExisting,
    #[serde(other)]
    Other,
}

impl std::fmt::Display for WorkerAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkerAction::Added => write!(f, "added"),
            WorkerAction::Updated => write!(f, "updated"),
            WorkerAction::NoChanges => write!(f, "no changes"),
            WorkerAction::FoundExisting => write!(f, "found existing"),
            WorkerAction::Other => write!(f, "processed"),
        }
    }
}

/// `POST /api/workers/add-telegram` response
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddWorkerResponse {
    #[serde(default)]
    pub action: Option<WorkerAction>,
    #[serde(default)]
    pub worker: Option<Worker>,
    #[serde(default)]
    pub error: Option<String>,
}

fn text_or(value: Option<&Value>, default: &str) -> String {
    match value {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => default.to_string(),
    }
}

fn parse_percent(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.trunc() as u64))
            .and_then(|p| u32::try_from(p).ok()),
        Value::String(s) => {
            let digits: String = s.trim().chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        }
        _ => None,
    }
}

/// Accepts epoch milliseconds, RFC 3339, RFC 2822 ("Tue, 19 Aug 2025 10:15:00 GMT"),
/// naive local timestamps, and bare dates (UTC midnight).
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(DateTime::from_timestamp_millis),
        Value::String(s) => parse_date_str(s.trim()),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local
                .from_local_datetime(&naive)
                .earliest()
                .map(|dt| dt.with_timezone(&Utc));
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Lenient payload decoders
// =============================================================================

/// Numbers and amount strings decode; null or anything else reads as absent
fn lenient_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(v @ (Value::Number(_) | Value::String(_))) => Some(codec::decode_value(&v)),
        _ => None,
    })
}

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let amount = lenient_amount(deserializer)?;
    Ok(amount.map(|a| a.trunc() as u64))
}

/// `true`, non-zero numbers and "true"/"1" are set; everything else is not
fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        _ => false,
    })
}

/// Keeps object entries and drops anything else. A non-array reads as absent.
fn lenient_profits<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Vec<RawProfit>>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(entries)) = value else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .filter(Value::is_object)
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect(),
    ))
}

/// Drops entries that are not a worker object with a username
fn lenient_workers<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Worker>, D::Error> {
    let value = Option::<Value>::deserialize(deserializer)?;
    let Some(Value::Array(entries)) = value else {
        return Ok(Vec::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|entry| serde_json::from_value(entry).ok())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawProfit {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_from_raw_full_record() {
        let now = Utc::now();
        let record = ProfitRecord::from_raw(
            &raw(json!({
                "amount": "1.234,5",
                "worker_percent": 85,
                "service": "WalletPay",
                "worker_name": "@cryptohunter",
                "date": "2025-08-17T21:10:00Z",
                "project_amount": 56000
            })),
            now,
        );

        assert_eq!(record.amount, 1234.5);
        assert_eq!(record.worker_percent_text(), "85%");
        assert_eq!(record.service, "WalletPay");
        assert_eq!(record.worker, "@cryptohunter");
        assert_eq!(record.date.to_rfc3339(), "2025-08-17T21:10:00+00:00");
        assert_eq!(record.project_running_total, 56000.0);
    }

    #[test]
    fn test_from_raw_defaults() {
        let now = Utc::now();
        let record = ProfitRecord::from_raw(&RawProfit::default(), now);

        assert_eq!(record.amount, 0.0);
        assert_eq!(record.worker_percent_text(), "70%");
        assert_eq!(record.service, constants::UNKNOWN_SERVICE);
        assert_eq!(record.worker, constants::UNKNOWN_WORKER);
        assert_eq!(record.date, now);
        assert_eq!(record.project_running_total, 0.0);
    }

    #[test]
    fn test_from_raw_tolerates_wrong_types() {
        let now = Utc::now();
        let record = ProfitRecord::from_raw(
            &raw(json!({
                "amount": [1, 2],
                "worker_percent": "65",
                "service": "",
                "worker_name": null,
                "date": "not a date"
            })),
            now,
        );

        assert_eq!(record.amount, 0.0);
        assert_eq!(record.worker_percent, 65);
        assert_eq!(record.service, constants::UNKNOWN_SERVICE);
        assert_eq!(record.worker, constants::UNKNOWN_WORKER);
        assert_eq!(record.date, now);
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = DateTime::parse_from_rfc3339("2025-08-19T10:15:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert_eq!(parse_date(&json!("2025-08-19T10:15:00Z")), Some(expected));
        assert_eq!(parse_date(&json!("Tue, 19 Aug 2025 10:15:00 GMT")), Some(expected));
        assert_eq!(parse_date(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(
            parse_date(&json!("2025-08-19")).map(|d| d.to_rfc3339()),
            Some("2025-08-19T00:00:00+00:00".to_string())
        );
        assert!(parse_date(&json!("2025-08-19 10:15:00")).is_some());
        assert_eq!(parse_date(&json!("")), None);
        assert_eq!(parse_date(&json!({})), None);
    }

    #[test]
    fn test_worker_activity() {
        let mut worker = Worker {
            username: "alice".to_string(),
            ..Default::default()
        };
        assert!(!worker.is_active());
        assert_eq!(worker.display_name(), "alice");

        worker.telegram_id = Some(json!("  "));
        assert!(!worker.is_active());

        worker.telegram_id = Some(json!(123456));
        worker.name = Some("Alice Smith".to_string());
        assert!(worker.is_active());
        assert_eq!(worker.display_name(), "Alice Smith");
    }

    #[test]
    fn test_worker_action_decoding() {
        let response: AddWorkerResponse =
            serde_json::from_value(json!({"action": "found_existing", "worker": {"username": "bob"}}))
                .unwrap();
        assert_eq!(response.action, Some(WorkerAction::FoundExisting));
        assert_eq!(response.worker.unwrap().username, "bob");

        let response: AddWorkerResponse =
            serde_json::from_value(json!({"action": "merged"})).unwrap();
        assert_eq!(response.action, Some(WorkerAction::Other));
    }

    #[test]
    fn test_page_payload_tolerates_bad_top_level_fields() {
        let page: PagePayload =
            serde_json::from_value(json!({"profits": [{"amount": "5"}], "has_more": null})).unwrap();
        assert!(!page.has_more);
        assert_eq!(page.profits.map(|p| p.len()), Some(1));

        let page: PagePayload = serde_json::from_value(json!({
            "profits": [{"amount": "5"}, null, 7, {"amount": "6"}],
            "has_more": "true"
        }))
        .unwrap();
        assert!(page.has_more);
        assert_eq!(page.profits.map(|p| p.len()), Some(2));

        let page: PagePayload = serde_json::from_value(json!({"profits": "none", "has_more": 0})).unwrap();
        assert!(page.profits.is_none());
        assert!(!page.has_more);
    }

    #[test]
    fn test_overview_payload_tolerates_bad_top_level_fields() {
        let overview: OverviewPayload = serde_json::from_value(json!({
            "total_amount": "34463",
            "workers_count": "6",
            "profits_count": null,
            "profits": [null, {"amount": 5400}]
        }))
        .unwrap();

        assert_eq!(overview.total_amount, Some(34463.0));
        assert_eq!(overview.workers_count, Some(6));
        assert_eq!(overview.profits_count, None);
        assert_eq!(overview.profits.map(|p| p.len()), Some(1));

        let overview: OverviewPayload =
            serde_json::from_value(json!({"total_amount": {"value": 1}, "workers_count": 2.0})).unwrap();
        assert_eq!(overview.total_amount, None);
        assert_eq!(overview.workers_count, Some(2));
    }

    #[test]
    fn test_submit_response_and_workers_leniency() {
        let response: SubmitResponse =
            serde_json::from_value(json!({"success": 1, "total_amount": "6.400", "profits_count": "21"}))
                .unwrap();
        assert!(response.success);
        assert_eq!(response.total_amount, Some(6400.0));
        assert_eq!(response.profits_count, Some(21));

        let payload: WorkersPayload = serde_json::from_value(json!({
            "workers": [{"username": "alice"}, {"name": "no handle"}, null]
        }))
        .unwrap();
        assert_eq!(payload.workers.len(), 1);
        assert_eq!(payload.workers[0].username, "alice");
    }
}
