//! Layermint - Layered Collectible Image Generator
//!
//! Builds a collection of images by stacking one randomly chosen element per
//! trait layer, writes per-item trait metadata and pins the results to a
//! content-addressed store.
//!
//! # Architecture
//!
//! - Catalog: per-layer element pools with rarity parsed from filenames
//! - Sampler: weighted selection by rarity tier
//! - Composer: one sample per layer, in layer order
//! - Generator: render phase, then a resumable publish phase

pub mod catalog;
pub mod cli;
pub mod compose;
pub mod config;
pub mod error;
pub mod generate;
pub mod metadata;
pub mod render;
pub mod sampler;
pub mod upload;

pub use error::{LayermintError, Result};
