//! Feed loading: the event feed and the plate boundary feed are fetched as
//! two independent tasks. Each task delivers exactly one `FeedUpdate` over a
//! channel; the UI thread applies updates between frames.

use crate::config::MapConfig;
use crate::data::geojson_lines;
use crate::error::{MapError, MapResult};
use crate::map::LineString;
use crate::quake::{parse_event_feed, EventBatch};
use geojson::GeoJson;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};

/// Result of one completed fetch
#[derive(Debug)]
pub enum FeedUpdate {
    Events(MapResult<EventBatch>),
    Plates(MapResult<Vec<LineString>>),
}

/// Where a feed comes from: `http(s)://` URLs go over the network,
/// anything else is read as a local file path.
fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

pub fn build_client(config: &MapConfig) -> MapResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("quake-map/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.http_timeout_secs))
        .build()
        .map_err(|e| MapError::Config(format!("http client: {e}")))
}

/// Fetch raw bytes from a URL or a local path
pub async fn fetch_bytes(client: &reqwest::Client, source: &str) -> MapResult<Vec<u8>> {
    if !is_remote(source) {
        return tokio::fs::read(source)
            .await
            .map_err(|e| MapError::network(source, e));
    }

    let response = client
        .get(source)
        .send()
        .await
        .map_err(|e| MapError::network(source, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(MapError::network(source, format!("HTTP {status}")));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|e| MapError::network(source, e))?;
    Ok(bytes.to_vec())
}

pub async fn fetch_events(client: &reqwest::Client, source: &str) -> MapResult<EventBatch> {
    let mut bytes = fetch_bytes(client, source).await?;
    // SIMD parsing of a multi-megabyte feed is CPU work; keep it off the IO threads
    tokio::task::spawn_blocking(move || parse_event_feed(&mut bytes))
        .await
        .map_err(|e| MapError::MalformedData(format!("event parser stopped: {e}")))?
}

/// Parse a plate boundary document into its lines
pub fn parse_plate_feed(bytes: &[u8]) -> MapResult<Vec<LineString>> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| MapError::MalformedData(format!("plate feed is not UTF-8: {e}")))?;
    let geojson: GeoJson = text
        .parse()
        .map_err(|e| MapError::MalformedData(format!("plate feed: {e}")))?;
    Ok(geojson_lines(&geojson))
}

pub async fn fetch_plates(client: &reqwest::Client, source: &str) -> MapResult<Vec<LineString>> {
    let bytes = fetch_bytes(client, source).await?;
    parse_plate_feed(&bytes)
}

/// Start both fetches on the runtime. No ordering between them; each sends
/// one update when done.
pub fn spawn_fetches(
    runtime: &Handle,
    client: reqwest::Client,
    config: Arc<MapConfig>,
) -> UnboundedReceiver<FeedUpdate> {
    let (tx, rx) = mpsc::unbounded_channel();

    {
        let tx = tx.clone();
        let client = client.clone();
        let config = Arc::clone(&config);
        runtime.spawn(async move {
            tracing::info!(source = %config.event_feed, "fetching events");
            let result = fetch_events(&client, &config.event_feed).await;
            match &result {
                Ok(batch) => tracing::info!(
                    events = batch.events.len(),
                    skipped = batch.skipped,
                    "event feed loaded"
                ),
                Err(e) => tracing::warn!(error = %e, "event feed failed"),
            }
            // Receiver gone means the app was reset or closed
            let _ = tx.send(FeedUpdate::Events(result));
        });
    }

    runtime.spawn(async move {
        tracing::info!(source = %config.plate_feed, "fetching plate boundaries");
        let result = fetch_plates(&client, &config.plate_feed).await;
        match &result {
            Ok(lines) => tracing::info!(lines = lines.len(), "plate boundaries loaded"),
            Err(e) => tracing::warn!(error = %e, "plate feed failed"),
        }
        let _ = tx.send(FeedUpdate::Plates(result));
    });

    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EVENTS: &str = r#"{
        "type": "FeatureCollection",
        "metadata": { "count": 2 },
        "features": [
            { "type": "Feature",
              "properties": { "mag": 4.5, "place": "5km NW of The Geysers, CA", "time": 1700000000000 },
              "geometry": { "type": "Point", "coordinates": [-122.4, 37.8, 2.1] } },
            { "type": "Feature",
              "properties": { "mag": null, "place": "nowhere", "time": 1700000000000 },
              "geometry": { "type": "Point", "coordinates": [0.0, 0.0, 0.0] } }
        ]
    }"#;

    const PLATES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "properties": {},
              "geometry": { "type": "LineString", "coordinates": [[-29.8, 55.1], [-29.5, 54.7]] } },
            { "type": "Feature", "properties": {},
              "geometry": { "type": "LineString", "coordinates": [[166.6, -45.0], [167.2, -46.0]] } }
        ]
    }"#;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn client() -> reqwest::Client {
        build_client(&MapConfig::default()).unwrap()
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://earthquake.usgs.gov/feed.geojson"));
        assert!(is_remote("http://localhost:8080/x"));
        assert!(!is_remote("data/all_week.geojson"));
        assert!(!is_remote("/tmp/https.geojson"));
    }

    #[test]
    fn test_parse_plate_feed() {
        let lines = parse_plate_feed(PLATES.as_bytes()).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(matches!(parse_plate_feed(b"{oops"), Err(MapError::MalformedData(_))));
    }

    #[tokio::test]
    async fn test_fetch_events_from_file() {
        let file = write_temp(EVENTS);
        let path = file.path().to_str().unwrap();
        let batch = fetch_events(&client(), path).await.unwrap();
        assert_eq!(batch.events.len(), 1);
        assert_eq!(batch.skipped, 1);
        assert_eq!(batch.events[0].place, "5km NW of The Geysers, CA");
    }

    #[tokio::test]
    async fn test_missing_file_is_network_failure() {
        let err = fetch_events(&client(), "/no/such/feed.geojson").await.unwrap_err();
        assert!(matches!(err, MapError::NetworkFailure { .. }));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_fetches_are_independent() {
        let plates = write_temp(PLATES);
        let config = Arc::new(MapConfig {
            event_feed: "/no/such/events.geojson".to_string(),
            plate_feed: plates.path().to_str().unwrap().to_string(),
            ..MapConfig::default()
        });

        let mut rx = spawn_fetches(&Handle::current(), client(), config);
        let mut events = None;
        let mut lines = None;
        for _ in 0..2 {
            match rx.recv().await.unwrap() {
                FeedUpdate::Events(r) => events = Some(r),
                FeedUpdate::Plates(r) => lines = Some(r),
            }
        }

        assert!(events.unwrap().is_err());
        assert_eq!(lines.unwrap().unwrap().len(), 2);
        assert!(rx.recv().await.is_none());
    }
}
