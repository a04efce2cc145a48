pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod feed;
pub mod legend;
pub mod logging;
pub mod map;
pub mod quake;
pub mod ui;
