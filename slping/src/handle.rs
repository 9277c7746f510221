//! A cached view of one server's availability.

use std::{collections::BTreeSet, time::Duration};

use serde::Serialize;
use tracing::debug;

use crate::{DEFAULT_TIMEOUT, QueryError, ServerAddress, StatusResponse, query};

/// Where a [`ServerStatus`] stands after its last refresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Availability {
    /// Never refreshed.
    #[default]
    Unknown,
    Available,
    Unavailable,
}

/// The data a refresh produces.
///
/// Unavailable reports always carry the defaults; counts from an earlier
/// success are never kept next to `available: false`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub available: bool,
    pub players_online: i64,
    pub players_max: i64,
    pub player_names_sample: BTreeSet<String>,
}

impl From<&StatusResponse> for Report {
    fn from(response: &StatusResponse) -> Self {
        Self {
            available: true,
            players_online: response.players.online,
            players_max: response.players.max,
            player_names_sample: response.sample_names().map(str::to_owned).collect(),
        }
    }
}

/// Last known status of one server, refreshed on demand.
///
/// Refreshing takes `&mut self`: share a handle between threads behind a lock,
/// or give each task its own handle.
///
/// # Examples
///
/// ```no_run
/// use slping::{ServerAddress, ServerStatus};
///
/// let address: ServerAddress = "mc.example.org".parse()?;
/// let mut status = ServerStatus::new(address);
/// status.refresh();
/// if status.available() {
///     println!("{}/{} online", status.players_online(), status.players_max());
/// }
/// # Ok::<(), slping::AddressError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ServerStatus {
    address: ServerAddress,
    timeout: Duration,
    availability: Availability,
    report: Report,
}

impl ServerStatus {
    #[must_use]
    pub fn new(address: ServerAddress) -> Self {
        Self::with_timeout(address, DEFAULT_TIMEOUT)
    }

    #[must_use]
    pub fn with_timeout(address: ServerAddress, timeout: Duration) -> Self {
        Self {
            address,
            timeout,
            availability: Availability::Unknown,
            report: Report::default(),
        }
    }

    /// Queries the server, blocking for up to the handle's timeout.
    ///
    /// Never fails: an unreachable or misbehaving server just leaves the handle
    /// [`Availability::Unavailable`].
    pub fn refresh(&mut self) -> &Report {
        let result = query(&self.address, self.timeout);
        self.record(result)
    }

    /// [`refresh`](Self::refresh) on the tokio runtime.
    pub async fn refresh_async(&mut self) -> &Report {
        let result = crate::tokio::query(&self.address, self.timeout).await;
        self.record(result)
    }

    fn record(&mut self, result: Result<StatusResponse, QueryError>) -> &Report {
        match result {
            Ok(response) => {
                self.availability = Availability::Available;
                self.report = Report::from(&response);
            }
            Err(err) => {
                debug!(
                    address = %self.address,
                    error = %err.source,
                    malformed = err.is_malformed_response(),
                    "server unavailable"
                );
                self.availability = Availability::Unavailable;
                self.report = Report::default();
            }
        }
        &self.report
    }

    #[must_use]
    pub const fn address(&self) -> &ServerAddress {
        &self.address
    }

    #[must_use]
    pub const fn availability(&self) -> Availability {
        self.availability
    }

    #[must_use]
    pub const fn report(&self) -> &Report {
        &self.report
    }

    #[must_use]
    pub const fn available(&self) -> bool {
        self.report.available
    }

    #[must_use]
    pub const fn players_online(&self) -> i64 {
        self.report.players_online
    }

    #[must_use]
    pub const fn players_max(&self) -> i64 {
        self.report.players_max
    }

    #[must_use]
    pub const fn player_names_sample(&self) -> &BTreeSet<String> {
        &self.report.player_names_sample
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockServer, Reply, SCENARIO_A, closed_port};

    fn names(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_starts_unknown() {
        let status = ServerStatus::new(ServerAddress::new("localhost", 25565));
        assert_eq!(status.availability(), Availability::Unknown);
        assert!(!status.available());
        assert_eq!(status.report(), &Report::default());
    }

    #[test]
    fn test_refresh_available() {
        let server = MockServer::start(Reply::Status(SCENARIO_A.into()), 1);
        let mut status = ServerStatus::new(server.address.clone());
        status.refresh();
        assert_eq!(status.availability(), Availability::Available);
        assert!(status.available());
        assert_eq!(status.players_online(), 3);
        assert_eq!(status.players_max(), 5);
        assert_eq!(
            status.player_names_sample(),
            &names(&["mf", "dignity", "viking"])
        );
    }

    #[test]
    fn test_refresh_without_sample() {
        let json = r#"{"players":{"online":0,"max":20},"description":"idle"}"#;
        let server = MockServer::start(Reply::Status(json.into()), 1);
        let mut status = ServerStatus::new(server.address.clone());
        let report = status.refresh().clone();
        assert!(report.available);
        assert_eq!(report.players_max, 20);
        assert!(report.player_names_sample.is_empty());
    }

    #[test]
    fn test_refresh_idempotent() {
        let server = MockServer::start(Reply::Status(SCENARIO_A.into()), 2);
        let mut status = ServerStatus::new(server.address.clone());
        let first = status.refresh().clone();
        let second = status.refresh().clone();
        assert_eq!(first, second);
        assert_eq!(server.join().len(), 2);
    }

    #[test]
    fn test_failure_resets_fields() {
        let server = MockServer::start(Reply::Status(SCENARIO_A.into()), 1);
        let mut status = ServerStatus::with_timeout(server.address.clone(), Duration::from_secs(2));
        assert!(status.refresh().available);
        // the mock stops listening after one client
        server.join();

        let report = status.refresh();
        assert_eq!(report, &Report::default());
        assert_eq!(status.availability(), Availability::Unavailable);
        assert!(!status.available());
        assert_eq!(status.players_online(), 0);
        assert_eq!(status.players_max(), 0);
        assert!(status.player_names_sample().is_empty());
    }

    #[test]
    fn test_refresh_refused() {
        let mut status = ServerStatus::new(closed_port());
        status.refresh();
        assert_eq!(status.availability(), Availability::Unavailable);
        assert_eq!(status.report(), &Report::default());
    }

    #[test]
    fn test_refresh_silent_server() {
        let server = MockServer::start(Reply::Silent, 1);
        let mut status =
            ServerStatus::with_timeout(server.address.clone(), Duration::from_millis(200));
        let started = std::time::Instant::now();
        status.refresh();
        assert!(started.elapsed() < Duration::from_secs(3));
        assert_eq!(status.availability(), Availability::Unavailable);
    }

    #[test]
    fn test_malformed_response_is_unavailable() {
        let server = MockServer::start(Reply::Status("not json".into()), 1);
        let mut status = ServerStatus::new(server.address.clone());
        status.refresh();
        assert!(!status.available());
    }
}
