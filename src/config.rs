use crate::error::{MapError, MapResult};
use crate::map::wrap_lon;
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_EVENT_FEED: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";
pub const DEFAULT_PLATE_FEED: &str =
    "https://raw.githubusercontent.com/fraxen/tectonicplates/master/GeoJSON/PB2002_boundaries.json";

const CONFIG_ENV: &str = "QUAKE_MAP_CONFIG";
const CONFIG_FILE: &str = "quake-map.toml";
const TOKEN_ENV: &str = "MAPBOX_ACCESS_TOKEN";
const EVENTS_ENV: &str = "QUAKE_MAP_EVENTS";
const PLATES_ENV: &str = "QUAKE_MAP_PLATES";

/// Immutable startup configuration, shared by the map and the fetch tasks.
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Tile provider credential
    pub access_token: Option<String>,
    /// Event feed URL or local file path
    pub event_feed: String,
    /// Plate boundary URL or local file path
    pub plate_feed: String,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Viewport zoom factor (1.0 = whole world across the map width)
    pub zoom: f64,
    /// Directory holding Natural Earth basemap files
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
    pub http_timeout_secs: u64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            event_feed: DEFAULT_EVENT_FEED.to_string(),
            plate_feed: DEFAULT_PLATE_FEED.to_string(),
            center_lat: 15.55,
            center_lon: -50.0,
            zoom: 1.0,
            data_dir: PathBuf::from("data"),
            log_file: PathBuf::from("quake-map.log"),
            http_timeout_secs: 30,
        }
    }
}

/// On-disk shape of `quake-map.toml`; every key optional
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    access_token: Option<String>,
    event_feed: Option<String>,
    plate_feed: Option<String>,
    center_lat: Option<f64>,
    center_lon: Option<f64>,
    zoom: Option<f64>,
    data_dir: Option<PathBuf>,
    log_file: Option<PathBuf>,
    http_timeout_secs: Option<u64>,
}

impl MapConfig {
    /// Defaults, then the config file (if any), then environment overrides.
    pub fn load() -> MapResult<Self> {
        let mut config = Self::default();

        let path = std::env::var(CONFIG_ENV)
            .ok()
            .and_then(non_empty)
            .map(PathBuf::from)
            .or_else(|| {
                let local = PathBuf::from(CONFIG_FILE);
                local.exists().then_some(local)
            });

        if let Some(path) = path {
            config.apply_file(&path)?;
        }

        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn apply_file(&mut self, path: &Path) -> MapResult<()> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| MapError::Config(format!("reading {}: {}", path.display(), e)))?;
        self.apply_toml(&raw)
            .map_err(|e| MapError::Config(format!("{}: {}", path.display(), e)))
    }

    fn apply_toml(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let file: FileConfig = toml::from_str(raw)?;

        if let Some(v) = file.access_token.and_then(non_empty) {
            self.access_token = Some(v);
        }
        if let Some(v) = file.event_feed.and_then(non_empty) {
            self.event_feed = v;
        }
        if let Some(v) = file.plate_feed.and_then(non_empty) {
            self.plate_feed = v;
        }
        if let Some(v) = file.center_lat {
            self.center_lat = v.clamp(-85.0, 85.0);
        }
        if let Some(v) = file.center_lon {
            self.center_lon = wrap_lon(v);
        }
        if let Some(v) = file.zoom {
            self.zoom = v.clamp(0.5, 100.0);
        }
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.log_file {
            self.log_file = v;
        }
        if let Some(v) = file.http_timeout_secs {
            self.http_timeout_secs = v.max(1);
        }
        Ok(())
    }

    fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(TOKEN_ENV).and_then(non_empty) {
            self.access_token = Some(v);
        }
        if let Some(v) = lookup(EVENTS_ENV).and_then(non_empty) {
            self.event_feed = v;
        }
        if let Some(v) = lookup(PLATES_ENV).and_then(non_empty) {
            self.plate_feed = v;
        }
    }

    /// The tile credential, or `MissingCredential` when none was supplied
    pub fn require_credential(&self) -> MapResult<&str> {
        self.access_token
            .as_deref()
            .ok_or(MapError::MissingCredential)
    }
}

fn non_empty(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_public_feeds() {
        let config = MapConfig::default();
        assert_eq!(config.event_feed, DEFAULT_EVENT_FEED);
        assert_eq!(config.plate_feed, DEFAULT_PLATE_FEED);
        assert_eq!(config.center_lat, 15.55);
        assert_eq!(config.center_lon, -50.0);
        assert!(config.access_token.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let mut config = MapConfig::default();
        config
            .apply_toml(
                r#"
                access_token = "pk.test"
                center_lat = 37.8
                center_lon = -122.4
                zoom = 4.0
                data_dir = "/tmp/ne"
                "#,
            )
            .unwrap();
        assert_eq!(config.access_token.as_deref(), Some("pk.test"));
        assert_eq!(config.center_lat, 37.8);
        assert_eq!(config.center_lon, -122.4);
        assert_eq!(config.zoom, 4.0);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/ne"));
        assert_eq!(config.event_feed, DEFAULT_EVENT_FEED);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let mut config = MapConfig::default();
        assert!(config.apply_toml("acces_token = \"typo\"").is_err());
    }

    #[test]
    fn center_lon_wraps_like_panning() {
        let mut config = MapConfig::default();
        config.apply_toml("center_lon = 190.0\ncenter_lat = -120.0").unwrap();
        assert_eq!(config.center_lon, -170.0);
        assert_eq!(config.center_lat, -85.0);

        config.apply_toml("center_lon = -540.0").unwrap();
        assert_eq!(config.center_lon, -180.0);
        config.apply_toml("center_lon = 122.5").unwrap();
        assert_eq!(config.center_lon, 122.5);
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let mut config = MapConfig::default();
        config.apply_toml("access_token = \"   \"").unwrap();
        assert!(matches!(
            config.require_credential(),
            Err(MapError::MissingCredential)
        ));
    }

    #[test]
    fn env_beats_file() {
        let mut config = MapConfig::default();
        config.apply_toml("access_token = \"from-file\"").unwrap();

        let env: HashMap<&str, &str> = [
            ("MAPBOX_ACCESS_TOKEN", "from-env"),
            ("QUAKE_MAP_EVENTS", "feeds/week.geojson"),
            ("QUAKE_MAP_PLATES", ""),
        ]
        .into_iter()
        .collect();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.require_credential().unwrap(), "from-env");
        assert_eq!(config.event_feed, "feeds/week.geojson");
        assert_eq!(config.plate_feed, DEFAULT_PLATE_FEED);
    }

    #[test]
    fn file_on_disk_is_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "zoom = 2.5\nhttp_timeout_secs = 0\n").unwrap();

        let mut config = MapConfig::default();
        config.apply_file(&path).unwrap();
        assert_eq!(config.zoom, 2.5);
        assert_eq!(config.http_timeout_secs, 1);
    }

    #[test]
    fn unreadable_file_is_a_config_error() {
        let mut config = MapConfig::default();
        let err = config
            .apply_file(Path::new("/definitely/not/here.toml"))
            .unwrap_err();
        assert!(matches!(err, MapError::Config(_)));
    }
}
