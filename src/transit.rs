//! OC Transpo next-trip lookups.
//!
//! The v2.0 `GetNextTripsForStop` endpoint returns every route serving a
//! stop with its upcoming trips. The feed is inconsistent about arrays: a
//! stop served by a single route returns `RouteDirection` as an object, and
//! a direction with one trip does the same for `Trip`. Both shapes are
//! accepted.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::TransitSettings;
use crate::error::Error;

/// OC Transpo API base URL
pub const API_BASE_URL: &str = "https://api.octranspo1.com/v2.0";

const TIMEOUT_SECS: u64 = 10;

/// Upcoming trips at one stop, grouped by route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopSchedule {
    /// Stop number as reported by the API
    pub stop_no: String,
    /// Human readable stop name
    pub stop_label: String,
    /// Routes in the order the API listed them
    pub routes: Vec<RouteTimes>,
}

/// Arrival times for one route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteTimes {
    /// Route number (e.g. "95")
    pub route_no: String,
    /// Minutes until arrival; a trailing `*` marks a GPS-tracked bus
    pub times: Vec<String>,
}

impl StopSchedule {
    /// Parse a `GetNextTripsForStop` JSON response.
    pub fn from_json(json: &str) -> Result<Self, Error> {
        let envelope: Envelope = serde_json::from_str(json)?;
        let result = envelope.result;
        if !result.error.is_empty() {
            tracing::warn!("OC Transpo reported error code {}", result.error);
        }

        let mut routes: Vec<RouteTimes> = Vec::new();
        for direction in result.route.directions.into_vec() {
            let times = direction
                .trips
                .into_vec()
                .into_iter()
                .flat_map(|list| list.trip.into_vec())
                .map(|trip| trip.display_time());

            match routes.iter_mut().find(|r| r.route_no == direction.route_no) {
                Some(existing) => existing.times.extend(times),
                None => routes.push(RouteTimes {
                    route_no: direction.route_no,
                    times: times.collect(),
                }),
            }
        }

        Ok(Self {
            stop_no: result.stop_no,
            stop_label: result.stop_label,
            routes,
        })
    }

    /// Render as a two-column text table.
    ///
    /// # Example
    ///
    /// ```
    /// use vesta_helper::transit::{RouteTimes, StopSchedule};
    ///
    /// let schedule = StopSchedule {
    ///     stop_no: "3017".to_string(),
    ///     stop_label: "Rideau".to_string(),
    ///     routes: vec![RouteTimes {
    ///         route_no: "95".to_string(),
    ///         times: vec!["4*".to_string(), "19".to_string()],
    ///     }],
    /// };
    /// assert!(schedule.to_table().contains("| 95           | 4*, 19    |"));
    /// ```
    pub fn to_table(&self) -> String {
        const ROUTE_HEADER: &str = "Route Number";
        const TIMES_HEADER: &str = "Bus Times";

        let rows: Vec<(&str, String)> = self
            .routes
            .iter()
            .map(|r| (r.route_no.as_str(), r.times.join(", ")))
            .collect();

        let route_width = rows
            .iter()
            .map(|(route, _)| route.chars().count())
            .chain(std::iter::once(ROUTE_HEADER.len()))
            .max()
            .unwrap_or_default();
        let times_width = rows
            .iter()
            .map(|(_, times)| times.chars().count())
            .chain(std::iter::once(TIMES_HEADER.len()))
            .max()
            .unwrap_or_default();

        let rule = format!("+{}+{}+\n", "-".repeat(route_width + 2), "-".repeat(times_width + 2));
        let mut table = rule.clone();
        table.push_str(&format!(
            "| {ROUTE_HEADER:<route_width$} | {TIMES_HEADER:<times_width$} |\n"
        ));
        table.push_str(&rule);
        for (route, times) in &rows {
            table.push_str(&format!("| {route:<route_width$} | {times:<times_width$} |\n"));
        }
        table.push_str(&rule);
        table
    }
}

/// OC Transpo API client.
#[derive(Debug, Clone)]
pub struct TransitClient {
    http: reqwest::Client,
    app_id: String,
    api_key: String,
    base_url: String,
}

impl TransitClient {
    /// Create a client with the given application ID and key.
    pub fn new(app_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            app_id: app_id.into(),
            api_key: api_key.into(),
            base_url: API_BASE_URL.to_string(),
        }
    }

    /// Create a client from settings.
    ///
    /// Returns [`Error::NotConfigured`] if either credential is missing.
    pub fn from_settings(settings: &TransitSettings) -> Result<Self, Error> {
        match (&settings.app_id, &settings.api_key) {
            (Some(app_id), Some(api_key)) => {
                Ok(Self::new(app_id.clone(), api_key.clone()).with_base_url(&settings.base_url))
            }
            _ => Err(Error::NotConfigured("OC Transpo")),
        }
    }

    /// Set a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch upcoming trips for a stop.
    pub async fn next_trips(&self, stop_no: &str) -> Result<StopSchedule, Error> {
        let url = format!("{}/GetNextTripsForStop", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[
                ("appID", self.app_id.as_str()),
                ("apiKey", self.api_key.as_str()),
                ("stopNo", stop_no),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api { status, body });
        }

        let body = response.text().await?;
        let schedule = StopSchedule::from_json(&body)?;
        tracing::info!(
            "Fetched {} routes for stop {}",
            schedule.routes.len(),
            stop_no
        );
        Ok(schedule)
    }
}

// =============================================================================
// Wire format
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
    Missing,
}

impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        OneOrMany::Missing
    }
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(items) => items,
            OneOrMany::One(item) => vec![item],
            OneOrMany::Missing => Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "GetNextTripsForStopResult")]
    result: StopResult,
}

#[derive(Debug, Deserialize)]
struct StopResult {
    #[serde(rename = "StopNo", default, deserialize_with = "string_or_number")]
    stop_no: String,
    #[serde(rename = "StopLabel", default)]
    stop_label: String,
    #[serde(rename = "Error", default)]
    error: String,
    #[serde(rename = "Route", default)]
    route: RouteList,
}

#[derive(Debug, Default, Deserialize)]
struct RouteList {
    #[serde(rename = "RouteDirection", default)]
    directions: OneOrMany<RouteDirection>,
}

#[derive(Debug, Deserialize)]
struct RouteDirection {
    #[serde(rename = "RouteNo", deserialize_with = "string_or_number")]
    route_no: String,
    #[serde(rename = "Trips", default)]
    trips: OneOrMany<TripList>,
}

#[derive(Debug, Deserialize)]
struct TripList {
    #[serde(rename = "Trip", default)]
    trip: OneOrMany<Trip>,
}

#[derive(Debug, Deserialize)]
struct Trip {
    #[serde(rename = "AdjustedScheduleTime", deserialize_with = "string_or_number")]
    adjusted_schedule_time: String,
    #[serde(rename = "GPSSpeed", default, deserialize_with = "string_or_number")]
    gps_speed: String,
}

impl Trip {
    fn display_time(self) -> String {
        if self.gps_speed.is_empty() {
            self.adjusted_schedule_time
        } else {
            format!("{}*", self.adjusted_schedule_time)
        }
    }
}

/// The feed sends some numeric fields as strings and some as numbers.
fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::Query;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::collections::HashMap;

    const MULTI_ROUTE: &str = r#"{
        "GetNextTripsForStopResult": {
            "StopNo": "3017",
            "StopLabel": "RIDEAU",
            "Error": "",
            "Route": {
                "RouteDirection": [
                    {
                        "RouteNo": "95",
                        "Direction": "Eastbound",
                        "Trips": {"Trip": [
                            {"AdjustedScheduleTime": "4", "GPSSpeed": "41.2"},
                            {"AdjustedScheduleTime": "19", "GPSSpeed": ""}
                        ]}
                    },
                    {
                        "RouteNo": 7,
                        "Direction": "Northbound",
                        "Trips": {"Trip": {"AdjustedScheduleTime": "11", "GPSSpeed": ""}}
                    },
                    {
                        "RouteNo": "95",
                        "Direction": "Westbound",
                        "Trips": {"Trip": [{"AdjustedScheduleTime": "8", "GPSSpeed": "12"}]}
                    }
                ]
            }
        }
    }"#;

    #[test]
    fn test_parse_multiple_routes() {
        let schedule = StopSchedule::from_json(MULTI_ROUTE).unwrap();
        assert_eq!(schedule.stop_no, "3017");
        assert_eq!(schedule.stop_label, "RIDEAU");
        assert_eq!(
            schedule.routes,
            vec![
                RouteTimes {
                    route_no: "95".to_string(),
                    times: vec!["4*".to_string(), "19".to_string(), "8*".to_string()],
                },
                RouteTimes {
                    route_no: "7".to_string(),
                    times: vec!["11".to_string()],
                },
            ]
        );
    }

    #[test]
    fn test_parse_single_route_object() {
        let json = r#"{"GetNextTripsForStopResult": {
            "StopNo": "1234", "StopLabel": "X", "Error": "",
            "Route": {"RouteDirection": {"RouteNo": "44", "Trips": []}}
        }}"#;
        let schedule = StopSchedule::from_json(json).unwrap();
        assert_eq!(schedule.routes.len(), 1);
        assert_eq!(schedule.routes[0].route_no, "44");
        assert!(schedule.routes[0].times.is_empty());
    }

    #[test]
    fn test_parse_no_routes() {
        let json = r#"{"GetNextTripsForStopResult": {"StopNo": "1", "Error": "10", "Route": {}}}"#;
        let schedule = StopSchedule::from_json(json).unwrap();
        assert!(schedule.routes.is_empty());
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            StopSchedule::from_json("<html>"),
            Err(Error::Serialization(_))
        ));
    }

    #[test]
    fn test_table_layout() {
        let schedule = StopSchedule::from_json(MULTI_ROUTE).unwrap();
        let table = schedule.to_table();
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "+--------------+------------+");
        assert_eq!(lines[1], "| Route Number | Bus Times  |");
        assert_eq!(lines[3], "| 95           | 4*, 19, 8* |");
        assert_eq!(lines[4], "| 7            | 11         |");
    }

    #[test]
    fn test_from_settings_requires_credentials() {
        let settings = TransitSettings::default();
        assert!(matches!(
            TransitClient::from_settings(&settings),
            Err(Error::NotConfigured(_))
        ));
    }

    async fn next_trips(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
        assert_eq!(params.get("appID").map(String::as_str), Some("app"));
        assert_eq!(params.get("apiKey").map(String::as_str), Some("key"));
        Json(json!({"GetNextTripsForStopResult": {
            "StopNo": params.get("stopNo").cloned().unwrap_or_default(),
            "StopLabel": "TEST",
            "Error": "",
            "Route": {"RouteDirection": {"RouteNo": "1", "Trips": {"Trip": [
                {"AdjustedScheduleTime": "3", "GPSSpeed": "20"}
            ]}}}
        }}))
    }

    #[tokio::test]
    async fn test_next_trips_against_fake_api() {
        let app = Router::new().route("/GetNextTripsForStop", get(next_trips));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = TransitClient::new("app", "key").with_base_url(format!("http://{addr}"));
        let schedule = client.next_trips("3017").await.unwrap();

        assert_eq!(schedule.stop_no, "3017");
        assert_eq!(schedule.routes[0].times, vec!["3*".to_string()]);
    }
}
