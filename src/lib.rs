//! Tap Ski - endless downhill world generator
//!
//! Core modules:
//! - `sim`: Deterministic world generation (path, pools, viewport culling)
//! - `settings`: Data-driven generator tuning
//! - `session`: Per-session player context (score, audio, character)
//! - `error`: Configuration and precondition errors

pub mod error;
pub mod session;
pub mod settings;
pub mod sim;

pub use error::{Result, WorldError};
pub use session::SessionContext;
pub use settings::{DensityPreset, GeneratorSettings};
pub use sim::{TickInput, TickReport, WorldGenerator};

/// Generator configuration constants
pub mod consts {
    /// Corridor width in world units
    pub const PATH_WIDTH: f32 = 3.0;
    /// Extra world units generated beyond the camera on each axis
    pub const X_OVERDRAW: u32 = 5;
    pub const Y_OVERDRAW: u32 = 5;

    /// Gap kept between a tree and the corridor edge
    pub const TREE_MARGIN: f32 = 1.0;
    /// Largest sideways nudge applied to a new row while turning
    pub const MAX_LATERAL_DRIFT: f32 = 0.5;

    /// Rows per direction decision (inclusive)
    pub const RUN_LENGTH_MIN: u32 = 5;
    pub const RUN_LENGTH_MAX: u32 = 16;

    /// Rows between obstacle placements (inclusive)
    pub const OBSTACLE_CADENCE_MIN: u32 = 8;
    pub const OBSTACLE_CADENCE_MAX: u32 = 30;

    /// Fractional viewport padding before a pooled object is retired
    pub const RETIRE_PADDING: f32 = 0.1;
    /// Fractional viewport padding before a row is pulled back to center
    pub const RECENTER_PADDING: f32 = 0.05;

    /// Off-window parking spot for inactive pool members
    pub const SENTINEL: (f32, f32) = (-1000.0, -1000.0);

    /// How far the player may drift back up the slope before a tick is rejected
    pub const REGRESSION_TOLERANCE: f32 = 1e-3;

    /// Tallest camera view, and largest overdraw or lookahead, in rows
    pub const MAX_WINDOW_ROWS: u32 = 4096;
}

/// Sample uniformly from `[lo, hi)`, collapsing to `lo` when the span is empty
#[inline]
pub fn sample_span<R: rand::Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}
