//! Generator settings
//!
//! Loaded from JSON by the host, validated once before a generator is built.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Result, WorldError};
use crate::sim::pool::DequeuePolicy;
use crate::sim::state::{ObstacleKind, TreeKind};

/// World density levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DensityPreset {
    Sparse,
    #[default]
    Normal,
    Dense,
}

impl DensityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DensityPreset::Sparse => "Sparse",
            DensityPreset::Normal => "Normal",
            DensityPreset::Dense => "Dense",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sparse" | "low" => Some(DensityPreset::Sparse),
            "normal" | "medium" | "med" => Some(DensityPreset::Normal),
            "dense" | "high" => Some(DensityPreset::Dense),
            _ => None,
        }
    }

    /// Trees allocated for the session
    pub fn tree_capacity(&self) -> u32 {
        match self {
            DensityPreset::Sparse => 40,
            DensityPreset::Normal => 60,
            DensityPreset::Dense => 90,
        }
    }

    /// Rows between obstacles
    pub fn obstacle_cadence(&self) -> CountRange {
        match self {
            DensityPreset::Sparse => CountRange::new(12, 40),
            DensityPreset::Normal => CountRange::new(OBSTACLE_CADENCE_MIN, OBSTACLE_CADENCE_MAX),
            DensityPreset::Dense => CountRange::new(5, 18),
        }
    }
}

/// Inclusive integer range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

impl CountRange {
    pub const fn new(min: u32, max: u32) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn as_tuple(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    fn validate(&self, name: &'static str) -> Result<()> {
        if self.min == 0 || self.min > self.max {
            return Err(WorldError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Relative likelihood of a kind when filling a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindWeight<K> {
    pub kind: K,
    pub weight: u32,
}

/// Exact number of members of a kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCount<K> {
    pub kind: K,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorSettings {
    /// Density preset the pool sizes came from
    pub density: DensityPreset,

    // === Corridor ===
    pub path_width: f32,
    /// Largest sideways nudge per row while turning
    pub max_lateral_drift: f32,
    /// Rows held per direction decision
    pub run_length: CountRange,

    // === Window ===
    pub x_overdraw: u32,
    pub y_overdraw: u32,
    /// Extra rows kept ahead of the overdrawn window
    pub lookahead_rows: u32,

    // === Visibility ===
    pub retire_padding: f32,
    pub recenter_padding: f32,
    /// Where inactive members are parked
    pub sentinel: Vec2,

    // === Trees ===
    pub tree_capacity: u32,
    pub tree_weights: Vec<KindWeight<TreeKind>>,
    pub tree_margin: f32,
    pub tree_policy: DequeuePolicy,

    // === Obstacles ===
    pub obstacle_counts: Vec<KindCount<ObstacleKind>>,
    pub obstacle_cadence: CountRange,
    pub obstacle_policy: DequeuePolicy,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            density: DensityPreset::Normal,

            path_width: PATH_WIDTH,
            max_lateral_drift: MAX_LATERAL_DRIFT,
            run_length: CountRange::new(RUN_LENGTH_MIN, RUN_LENGTH_MAX),

            x_overdraw: X_OVERDRAW,
            y_overdraw: Y_OVERDRAW,
            lookahead_rows: 0,

            retire_padding: RETIRE_PADDING,
            recenter_padding: RECENTER_PADDING,
            sentinel: Vec2::new(SENTINEL.0, SENTINEL.1),

            tree_capacity: DensityPreset::Normal.tree_capacity(),
            // Christmas trees are a 5% treat, the rest split evenly
            tree_weights: vec![
                KindWeight { kind: TreeKind::Christmas, weight: 15 },
                KindWeight { kind: TreeKind::Snowy, weight: 95 },
                KindWeight { kind: TreeKind::Partial, weight: 95 },
                KindWeight { kind: TreeKind::Pine, weight: 95 },
            ],
            tree_margin: TREE_MARGIN,
            tree_policy: DequeuePolicy::Fifo,

            obstacle_counts: vec![
                KindCount { kind: ObstacleKind::Rock, count: 1 },
                KindCount { kind: ObstacleKind::WoodRamp, count: 1 },
                KindCount { kind: ObstacleKind::SnowRamp, count: 2 },
                KindCount { kind: ObstacleKind::SmallSnowman, count: 1 },
                KindCount { kind: ObstacleKind::BigSnowman, count: 1 },
                KindCount { kind: ObstacleKind::Checkpoint, count: 3 },
            ],
            obstacle_cadence: DensityPreset::Normal.obstacle_cadence(),
            obstacle_policy: DequeuePolicy::UniformRandom,
        }
    }
}

impl GeneratorSettings {
    /// Create settings from a density preset (applies preset pool sizes)
    pub fn from_preset(preset: DensityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a density preset (updates density-dependent settings)
    pub fn apply_preset(&mut self, preset: DensityPreset) {
        self.density = preset;
        self.tree_capacity = preset.tree_capacity();
        self.obstacle_cadence = preset.obstacle_cadence();
    }

    /// Rows in the corridor ring for a view of the given height
    pub fn window_rows(&self, view_height: f32) -> usize {
        let view_rows = view_height.ceil().clamp(1.0, MAX_WINDOW_ROWS as f32) as usize;
        view_rows
            .saturating_add(self.y_overdraw as usize)
            .saturating_add(self.lookahead_rows as usize)
    }

    pub fn validate(&self) -> Result<()> {
        positive("path_width", self.path_width)?;
        non_negative("max_lateral_drift", self.max_lateral_drift)?;
        non_negative("retire_padding", self.retire_padding)?;
        non_negative("recenter_padding", self.recenter_padding)?;
        non_negative("tree_margin", self.tree_margin)?;
        if !self.sentinel.is_finite() {
            return Err(invalid("sentinel", "must be finite"));
        }

        self.run_length.validate("run_length")?;
        self.obstacle_cadence.validate("obstacle_cadence")?;

        if self.tree_capacity == 0 {
            return Err(WorldError::ZeroCapacity("tree"));
        }
        at_most_window("y_overdraw", self.y_overdraw)?;
        at_most_window("lookahead_rows", self.lookahead_rows)?;

        match checked_total(self.tree_weights.iter().map(|w| w.weight)) {
            None => return Err(invalid("tree_weights", "total weight overflows u32")),
            Some(0) => return Err(invalid("tree_weights", "total weight must be positive")),
            Some(_) => {}
        }
        match checked_total(self.obstacle_counts.iter().map(|c| c.count)) {
            None => return Err(invalid("obstacle_counts", "total count overflows u32")),
            Some(0) => return Err(WorldError::ZeroCapacity("obstacle")),
            Some(_) => {}
        }
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        log::info!("Loaded generator settings ({})", settings.density.as_str());
        Ok(settings)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn invalid(name: &'static str, reason: &str) -> WorldError {
    WorldError::InvalidSetting {
        name,
        reason: reason.to_string(),
    }
}

fn positive(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be positive, got {value}")))
    }
}

fn non_negative(name: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be non-negative, got {value}")))
    }
}

fn at_most_window(name: &'static str, rows: u32) -> Result<()> {
    if rows <= MAX_WINDOW_ROWS {
        Ok(())
    } else {
        Err(invalid(name, &format!("must be at most {MAX_WINDOW_ROWS} rows, got {rows}")))
    }
}

/// Sum of a weight or count table, `None` on overflow
pub(crate) fn checked_total(values: impl IntoIterator<Item = u32>) -> Option<u32> {
    values.into_iter().try_fold(0u32, |total, v| total.checked_add(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = GeneratorSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.window_rows(20.0), 25);
    }

    #[test]
    fn test_preset_roundtrip_names() {
        for preset in [DensityPreset::Sparse, DensityPreset::Normal, DensityPreset::Dense] {
            assert_eq!(DensityPreset::from_str(preset.as_str()), Some(preset));
        }
        assert_eq!(DensityPreset::from_str("HIGH"), Some(DensityPreset::Dense));
        assert_eq!(DensityPreset::from_str("extreme"), None);
    }

    #[test]
    fn test_apply_preset_changes_pools() {
        let settings = GeneratorSettings::from_preset(DensityPreset::Dense);
        assert_eq!(settings.tree_capacity, 90);
        assert_eq!(settings.obstacle_cadence, CountRange::new(5, 18));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let bad_width = GeneratorSettings {
            path_width: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            bad_width.validate(),
            Err(WorldError::InvalidSetting { name: "path_width", .. })
        ));

        let bad_range = GeneratorSettings {
            run_length: CountRange::new(9, 3),
            ..Default::default()
        };
        assert!(matches!(
            bad_range.validate(),
            Err(WorldError::InvalidRange { name: "run_length", .. })
        ));

        let no_trees = GeneratorSettings {
            tree_capacity: 0,
            ..Default::default()
        };
        assert!(matches!(no_trees.validate(), Err(WorldError::ZeroCapacity("tree"))));

        let no_obstacles = GeneratorSettings {
            obstacle_counts: Vec::new(),
            ..Default::default()
        };
        assert!(matches!(no_obstacles.validate(), Err(WorldError::ZeroCapacity("obstacle"))));
    }

    #[test]
    fn test_oversized_tables_rejected() {
        let json = r#"{ "tree_weights": [
            { "kind": "Pine", "weight": 3000000000 },
            { "kind": "Snowy", "weight": 3000000000 }
        ] }"#;
        assert!(matches!(
            GeneratorSettings::from_json(json),
            Err(WorldError::InvalidSetting { name: "tree_weights", .. })
        ));

        let too_many = GeneratorSettings {
            obstacle_counts: vec![
                KindCount { kind: ObstacleKind::Rock, count: u32::MAX },
                KindCount { kind: ObstacleKind::Checkpoint, count: 1 },
            ],
            ..Default::default()
        };
        assert!(matches!(
            too_many.validate(),
            Err(WorldError::InvalidSetting { name: "obstacle_counts", .. })
        ));
    }

    #[test]
    fn test_window_rows_bounded() {
        let settings = GeneratorSettings::default();
        assert_eq!(
            settings.window_rows(f32::MAX),
            MAX_WINDOW_ROWS as usize + Y_OVERDRAW as usize
        );

        let deep = GeneratorSettings {
            lookahead_rows: u32::MAX,
            ..Default::default()
        };
        assert!(matches!(
            deep.validate(),
            Err(WorldError::InvalidSetting { name: "lookahead_rows", .. })
        ));
    }

    #[test]
    fn test_json_partial_override() {
        let settings = GeneratorSettings::from_json(r#"{ "path_width": 4.0, "lookahead_rows": 10 }"#).unwrap();
        assert_eq!(settings.path_width, 4.0);
        assert_eq!(settings.lookahead_rows, 10);
        assert_eq!(settings.y_overdraw, Y_OVERDRAW);
        assert_eq!(settings.window_rows(20.0), 35);

        let json = settings.to_json().unwrap();
        assert_eq!(GeneratorSettings::from_json(&json).unwrap(), settings);
    }

    #[test]
    fn test_json_errors_surface() {
        assert!(matches!(
            GeneratorSettings::from_json("{ not json"),
            Err(WorldError::SettingsFormat(_))
        ));
        assert!(GeneratorSettings::from_json(r#"{ "retire_padding": -1.0 }"#).is_err());
    }
}
