use thiserror::Error;

/// Errors raised while configuring or driving the world generator.
///
/// Pool starvation is deliberately absent: an empty pool is a normal
/// condition and is reported through stats and events instead.
#[derive(Debug, Error)]
pub enum WorldError {
    #[error("viewport must have a finite, positive size (got {width} x {height})")]
    DegenerateViewport { width: f32, height: f32 },

    #[error("prefab catalog has no {0} entries")]
    EmptyCatalog(&'static str),

    #[error("prefab catalog has no prefab for {0}")]
    MissingPrefab(String),

    #[error("{0} pool would be created with zero capacity")]
    ZeroCapacity(&'static str),

    #[error("invalid setting `{name}`: {reason}")]
    InvalidSetting { name: &'static str, reason: String },

    #[error("invalid range `{name}`: {min}..={max}")]
    InvalidRange { name: &'static str, min: u32, max: u32 },

    #[error("generator has no populated session")]
    NotPopulated,

    #[error("player moved back up the slope: y {current} is above last seen {last}")]
    PlayerRegressed { last: f32, current: f32 },

    #[error("settings format error: {0}")]
    SettingsFormat(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WorldError>;
