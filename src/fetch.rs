//! OpenF1 REST client: per-cycle snapshot fetch and one-time session discovery.

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{DiscoveryError, FetchError};
use crate::types::{MeetingInfo, SessionInfo, Snapshot};

const STREAM_COUNT: usize = 7;

/// Source of per-cycle snapshots.
///
/// `None` means every stream failed this cycle. Partial failures come back as
/// a `Snapshot` whose failed streams are empty.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync {
    async fn fetch_snapshot(&self, session_key: u32) -> Option<Snapshot>;
}

#[derive(Clone)]
pub struct OpenF1Client {
    client: Client,
    base_url: String,
}

impl OpenF1Client {
    pub fn new(base_url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("failed to build OpenF1 client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    #[inline]
    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_list<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, FetchError> {
        let endpoint = path.to_string();
        let resp = self
            .client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status { endpoint, status });
        }

        let body = resp.bytes().await.map_err(|source| FetchError::Transport {
            endpoint: endpoint.clone(),
            source,
        })?;
        let rows: Vec<serde_json::Value> =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                endpoint: endpoint.clone(),
                source,
            })?;

        // A malformed record costs only itself, never the rest of the stream.
        Ok(rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(endpoint = %endpoint, error = %e, "dropping malformed record");
                    None
                }
            })
            .collect())
    }

    async fn session_stream<T: DeserializeOwned>(
        &self,
        path: &str,
        session_key: u32,
    ) -> Result<Vec<T>, FetchError> {
        self.get_list(path, &[("session_key", session_key.to_string())])
            .await
    }

    /// Resolve a session key (`"latest"` or a number) to its session record.
    pub async fn discover_session(&self, session_key: &str) -> Result<SessionInfo, DiscoveryError> {
        let sessions: Vec<SessionInfo> = self
            .get_list("/sessions", &[("session_key", session_key.to_string())])
            .await?;
        sessions
            .into_iter()
            .next()
            .ok_or_else(|| DiscoveryError::NoSession(session_key.to_string()))
    }

    pub async fn fetch_meeting(&self, meeting_key: u32) -> Result<Option<MeetingInfo>, FetchError> {
        let meetings: Vec<MeetingInfo> = self
            .get_list("/meetings", &[("meeting_key", meeting_key.to_string())])
            .await?;
        Ok(meetings.into_iter().next())
    }
}

fn or_empty<T>(result: Result<Vec<T>, FetchError>, failures: &mut usize) -> Vec<T> {
    match result {
        Ok(records) => records,
        Err(e) => {
            *failures += 1;
            warn!(error = %e, "stream fetch failed; treating as empty this cycle");
            Vec::new()
        }
    }
}

#[async_trait]
impl SnapshotFetcher for OpenF1Client {
    async fn fetch_snapshot(&self, session_key: u32) -> Option<Snapshot> {
        let started = Instant::now();
        let (positions, drivers, laps, car_data, stints, intervals, track_status) = futures::join!(
            self.session_stream("/position", session_key),
            self.session_stream("/drivers", session_key),
            self.session_stream("/laps", session_key),
            self.session_stream("/car_data", session_key),
            self.session_stream("/stints", session_key),
            self.session_stream("/intervals", session_key),
            self.session_stream("/track_status", session_key),
        );

        let mut failures = 0;
        let snapshot = Snapshot {
            positions: or_empty(positions, &mut failures),
            drivers: or_empty(drivers, &mut failures),
            laps: or_empty(laps, &mut failures),
            car_data: or_empty(car_data, &mut failures),
            stints: or_empty(stints, &mut failures),
            intervals: or_empty(intervals, &mut failures),
            track_status: or_empty(track_status, &mut failures),
        };

        debug!(
            session_key,
            failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "snapshot fetched"
        );

        if failures == STREAM_COUNT {
            warn!(session_key, "every stream failed; skipping merge this cycle");
            return None;
        }
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn client(server: &MockServer) -> OpenF1Client {
        OpenF1Client::new(&server.base_url(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn failed_streams_degrade_to_empty() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/position")
                    .query_param("session_key", "9472");
                then.status(200).json_body(json!([
                    {"driver_number": 1, "position": 1, "date": "2024-03-02T15:05:00.000000+00:00"},
                    {"driver_number": 11, "position": 2, "date": "2024-03-02T15:05:00.000000+00:00"}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/intervals");
                then.status(200).json_body(json!([
                    {"driver_number": 11, "gap_to_leader": 1.9, "interval": 1.9, "date": "2024-03-02T15:05:01+00:00"}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/laps");
                then.status(500);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/stints");
                then.status(200).body("not json");
            })
            .await;

        let snap = client(&server).fetch_snapshot(9472).await.unwrap();
        assert_eq!(snap.positions.len(), 2);
        assert_eq!(snap.intervals.len(), 1);
        assert!(snap.laps.is_empty());
        assert!(snap.stints.is_empty());
        assert!(snap.drivers.is_empty());
    }

    #[tokio::test]
    async fn malformed_record_is_dropped_alone() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/laps");
                then.status(200).json_body(json!([
                    {"driver_number": 1, "lap_number": 20, "lap_duration": 93.1},
                    {"driver_number": 11, "lap_number": 20, "lap_duration": 93.9},
                    {"driver_number": 16, "lap_number": "19", "lap_duration": 94.2}
                ]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/position");
                then.status(200).json_body(json!([
                    {"driver_number": 1, "position": 1},
                    {"driver_number": 16, "position": -3},
                    {"driver_number": 11, "position": 2.5},
                    {"driver_number": 44, "position": 4}
                ]));
            })
            .await;

        let snap = client(&server).fetch_snapshot(9472).await.unwrap();
        let lapped: Vec<_> = snap.laps.iter().filter_map(|l| l.driver_number).collect();
        assert_eq!(lapped, vec![1, 11]);
        let ranked: Vec<_> = snap.positions.iter().filter_map(|p| p.driver_number).collect();
        assert_eq!(ranked, vec![1, 44]);
    }

    #[tokio::test]
    async fn every_stream_failing_is_a_total_failure() {
        let server = MockServer::start_async().await;
        assert!(client(&server).fetch_snapshot(9472).await.is_none());
    }

    #[tokio::test]
    async fn discovers_latest_session_and_meeting() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/sessions")
                    .query_param("session_key", "latest");
                then.status(200).json_body(json!([{
                    "session_key": 9472,
                    "session_name": "Race",
                    "session_type": "Race",
                    "date_start": "2024-03-02T15:00:00+00:00",
                    "date_end": "2024-03-02T17:00:00+00:00",
                    "meeting_key": 1229
                }]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/meetings")
                    .query_param("meeting_key", "1229");
                then.status(200).json_body(json!([{
                    "meeting_key": 1229,
                    "meeting_name": "Bahrain Grand Prix",
                    "country_name": "Bahrain"
                }]));
            })
            .await;

        let api = client(&server);
        let session = api.discover_session("latest").await.unwrap();
        assert_eq!(session.session_key, 9472);
        assert_eq!(session.meeting_key, Some(1229));

        let meeting = api.fetch_meeting(1229).await.unwrap().unwrap();
        assert_eq!(meeting.meeting_name.as_deref(), Some("Bahrain Grand Prix"));
    }

    #[tokio::test]
    async fn empty_discovery_is_fatal() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/sessions");
                then.status(200).json_body(json!([]));
            })
            .await;

        let err = client(&server).discover_session("latest").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::NoSession(ref k) if k == "latest"));

        let err = client(&server).discover_session("9999").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn http_error_surfaces_as_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/sessions");
                then.status(503);
            })
            .await;

        let err = client(&server).discover_session("latest").await.unwrap_err();
        match err {
            DiscoveryError::Fetch(FetchError::Status { status, .. }) => {
                assert_eq!(status.as_u16(), 503)
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }
}
