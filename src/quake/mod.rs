mod band;
mod event;

pub use band::{classify, BandCounts, BandStyle, MagnitudeBand, BAND_STYLES};
pub use event::{parse_event_feed, EventBatch, SeismicEvent};
