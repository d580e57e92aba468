use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// External identifier of a trip document.
pub type TripId = String;

/// A trip-planning request as received at the HTTP boundary.
///
/// Fields are carried verbatim: dates, style and pace are not parsed or
/// validated here, only required to be present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub trip_id: TripId,
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub travelers: u32,
    pub budget: Budget,
    pub travel_style: String,
    pub pace: String,
    pub starting_city: String,
    pub surprise_me: bool,
}

/// Budget as supplied by the client: free text ("1500", "mid-range") or a number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Budget {
    Amount(serde_json::Number),
    Text(String),
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Budget::Amount(n) => write!(f, "{}", n),
            Budget::Text(s) => f.write_str(s),
        }
    }
}

/// Structured travel plan returned by the generation service.
///
/// The shape is opaque to this crate. Values are only constructed by
/// [`crate::extract::extract_itinerary`], so holding an `Itinerary` means
/// the model output was parsed successfully.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Itinerary(Value);

impl Itinerary {
    pub(crate) fn from_parsed(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }
}

/// Generation status of a trip document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TripStatus {
    Pending,
    Ready,
    Failed,
}

impl TripStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripStatus::Pending => "PENDING",
            TripStatus::Ready => "READY",
            TripStatus::Failed => "FAILED",
        }
    }
}

impl fmt::Display for TripStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted trip document as seen by this service.
///
/// Fields owned by other writers (user id, destination metadata, ...) are
/// kept in `other` and survive every merge-update untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    #[serde(skip)]
    pub trip_id: TripId,

    pub status: TripStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Value>,

    /// Assigned by the store when the itinerary is committed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    /// Reason recorded by a failure write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,

    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl TripRecord {
    /// A freshly created record awaiting generation.
    pub fn pending(trip_id: impl Into<TripId>) -> Self {
        Self {
            trip_id: trip_id.into(),
            status: TripStatus::Pending,
            itinerary: None,
            generated_at: None,
            error: None,
            failed_at: None,
            other: Map::new(),
        }
    }
}

/// A partial write against a trip document.
///
/// Only the fields listed by [`TripUpdate::field_paths`] are touched, plus
/// the timestamp named by [`TripUpdate::timestamp_field`], which the store
/// assigns itself.
#[derive(Debug, Clone, PartialEq)]
pub enum TripUpdate {
    Ready { itinerary: Itinerary },
    Failed { reason: String },
}

impl TripUpdate {
    pub fn ready(itinerary: Itinerary) -> Self {
        TripUpdate::Ready { itinerary }
    }

    pub fn failed(reason: impl Into<String>) -> Self {
        TripUpdate::Failed {
            reason: reason.into(),
        }
    }

    pub fn status(&self) -> TripStatus {
        match self {
            TripUpdate::Ready { .. } => TripStatus::Ready,
            TripUpdate::Failed { .. } => TripStatus::Failed,
        }
    }

    /// Document fields written with client-supplied values.
    pub fn field_paths(&self) -> &'static [&'static str] {
        match self {
            TripUpdate::Ready { .. } => &["itinerary", "status"],
            TripUpdate::Failed { .. } => &["status", "error"],
        }
    }

    /// Document field stamped with the store's own clock.
    pub fn timestamp_field(&self) -> &'static str {
        match self {
            TripUpdate::Ready { .. } => "generatedAt",
            TripUpdate::Failed { .. } => "failedAt",
        }
    }

    /// Client-supplied field values, in the same order as `field_paths`.
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        match self {
            TripUpdate::Ready { itinerary } => {
                fields.insert("itinerary".into(), itinerary.as_value().clone());
            }
            TripUpdate::Failed { reason } => {
                fields.insert("error".into(), Value::String(reason.clone()));
            }
        }
        fields.insert("status".into(), Value::String(self.status().as_str().into()));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn lisbon_json() -> Value {
        json!({
            "tripId": "t1",
            "destination": "Lisbon",
            "startDate": "2025-05-01",
            "endDate": "2025-05-07",
            "travelers": 2,
            "budget": "1500",
            "travelStyle": "relaxed",
            "pace": "slow",
            "startingCity": "NYC",
            "surpriseMe": false
        })
    }

    #[test]
    fn test_trip_request_from_camel_case() {
        let req: TripRequest = serde_json::from_value(lisbon_json()).unwrap();
        assert_eq!(req.trip_id, "t1");
        assert_eq!(req.starting_city, "NYC");
        assert_eq!(req.budget, Budget::Text("1500".into()));
        assert!(!req.surprise_me);
    }

    #[test]
    fn test_budget_accepts_number() {
        let mut body = lisbon_json();
        body["budget"] = json!(2500.5);
        let req: TripRequest = serde_json::from_value(body).unwrap();
        assert_eq!(req.budget.to_string(), "2500.5");
    }

    #[test]
    fn test_missing_field_is_rejected() {
        let mut body = lisbon_json();
        body.as_object_mut().unwrap().remove("destination");
        assert!(serde_json::from_value::<TripRequest>(body).is_err());
    }

    #[test]
    fn test_status_serializes_screaming_case() {
        assert_eq!(serde_json::to_value(TripStatus::Ready).unwrap(), json!("READY"));
        let parsed: TripStatus = serde_json::from_value(json!("PENDING")).unwrap();
        assert_eq!(parsed, TripStatus::Pending);
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let doc = json!({
            "status": "PENDING",
            "userId": "u-42",
            "createdAt": "2025-04-01T00:00:00Z"
        });
        let record: TripRecord = serde_json::from_value(doc).unwrap();
        assert_eq!(record.status, TripStatus::Pending);
        assert_eq!(record.other.get("userId"), Some(&json!("u-42")));

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["userId"], "u-42");
        assert!(back.get("itinerary").is_none());
    }

    #[test]
    fn test_update_fields() {
        let ready = TripUpdate::ready(Itinerary::from_parsed(json!({"days": []})));
        assert_eq!(ready.status(), TripStatus::Ready);
        assert_eq!(ready.timestamp_field(), "generatedAt");
        let fields = ready.fields();
        assert_eq!(fields["itinerary"], json!({"days": []}));
        assert_eq!(fields["status"], "READY");

        let failed = TripUpdate::failed("boom");
        assert_eq!(failed.field_paths(), &["status", "error"]);
        assert_eq!(failed.fields()["error"], "boom");
        assert_eq!(failed.timestamp_field(), "failedAt");
    }
}
