use crate::error::{MapError, MapResult};
use crate::quake::band::{classify, MagnitudeBand};
use chrono::{DateTime, Local, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One earthquake from the event feed
#[derive(Clone, Debug, PartialEq)]
pub struct SeismicEvent {
    pub lon: f64,
    pub lat: f64,
    pub magnitude: f64,
    pub place: String,
    pub time: Option<DateTime<Utc>>,
}

impl SeismicEvent {
    /// Build an event from one GeoJSON feature.
    /// Fails for a missing or non-numeric magnitude, a missing geometry,
    /// or coordinates that are not a finite on-earth [lon, lat] pair.
    pub fn from_feature(feature: &Value) -> MapResult<Self> {
        let props = feature
            .get("properties")
            .filter(|p| p.is_object())
            .ok_or_else(|| MapError::MalformedData("feature has no properties".into()))?;

        let magnitude = props
            .get("mag")
            .and_then(Value::as_f64)
            .ok_or_else(|| MapError::MalformedData("missing properties.mag".into()))?;

        let coords = feature
            .get("geometry")
            .and_then(|g| g.get("coordinates"))
            .and_then(Value::as_array)
            .ok_or_else(|| MapError::MalformedData("missing geometry.coordinates".into()))?;

        let (lon, lat) = match (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) {
            (Some(lon), Some(lat)) => (lon, lat),
            _ => {
                return Err(MapError::MalformedData(
                    "coordinates are not a [lon, lat] pair".into(),
                ))
            }
        };

        if !lon.is_finite() || !lat.is_finite() || lat.abs() > 90.0 || lon.abs() > 180.0 {
            return Err(MapError::MalformedData(format!(
                "coordinates out of range: [{lon}, {lat}]"
            )));
        }

        let place = props
            .get("place")
            .and_then(Value::as_str)
            .unwrap_or("Unknown location")
            .to_string();

        let time = props
            .get("time")
            .and_then(Value::as_i64)
            .and_then(DateTime::from_timestamp_millis);

        Ok(Self {
            lon,
            lat,
            magnitude,
            place,
            time,
        })
    }

    pub fn band(&self) -> MagnitudeBand {
        classify(self.magnitude)
    }

    /// Occurrence time in the local timezone, e.g. `3/14/2024, 9:26:53 PM`
    pub fn formatted_date(&self) -> String {
        match self.time {
            Some(t) => t
                .with_timezone(&Local)
                .format("%-m/%-d/%Y, %-I:%M:%S %p")
                .to_string(),
            None => "Unknown".to_string(),
        }
    }
}

/// Events parsed from one feed document plus the records that were dropped
#[derive(Clone, Debug, Default)]
pub struct EventBatch {
    pub events: Vec<SeismicEvent>,
    pub skipped: usize,
}

/// Top-level feed shape; features stay untyped so one bad record
/// can be skipped without losing the rest
#[derive(Deserialize)]
struct RawFeed {
    features: Vec<Value>,
}

/// Parse an event feed document. The buffer is used as scratch space by the
/// SIMD parser and is left in an unspecified state.
pub fn parse_event_feed(bytes: &mut [u8]) -> MapResult<EventBatch> {
    let feed: RawFeed = simd_json::serde::from_slice(bytes)
        .map_err(|e| MapError::MalformedData(format!("event feed: {e}")))?;

    let mut batch = EventBatch {
        events: Vec::with_capacity(feed.features.len()),
        skipped: 0,
    };

    for (idx, feature) in feed.features.iter().enumerate() {
        match SeismicEvent::from_feature(feature) {
            Ok(event) => batch.events.push(event),
            Err(e) => {
                tracing::debug!(feature = idx, error = %e, "skipping event record");
                batch.skipped += 1;
            }
        }
    }

    Ok(batch)
}
