//! Rotating image-to-ASCII backdrop.
//!
//! Source images are sampled into a fixed-size glyph grid and the displayed
//! grid diffuses toward each new target a few random cells per tick.

#![forbid(unsafe_code)]

pub mod animator;
pub mod catalog;
pub mod config;
pub mod error;
pub mod glyph_grid;
pub mod palette;
pub mod sampler;
pub mod scheduler;

pub use animator::{AnimationState, DiffusionAnimator, TickOutcome};
pub use catalog::ImageCatalog;
pub use config::BackdropConfig;
pub use error::{ConfigError, GridError, LoadError};
pub use glyph_grid::GlyphGrid;
pub use palette::{PaletteMapping, GLYPH_PALETTE};
pub use sampler::{ImageFetcher, ImageSource, Sampler, SourceFetcher};
pub use scheduler::{run_backdrop, Backdrop, FrameSink, RunSummary, TerminalSink, Timing};
