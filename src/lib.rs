//! Terminal map browser for a static list of places.
//!
//! Places are loaded once from a JSON document, drawn as markers on a
//! Braille map, listed as cards and filtered by category and rating.

pub mod app;
pub mod braille;
pub mod config;
pub mod controls;
pub mod data;
pub mod filter;
pub mod map;
pub mod rain;
pub mod ui;
pub mod view;
