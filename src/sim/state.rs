//! Generator-wide types: phases, member kinds, prefab catalog, events
//!
//! Everything the host needs to interpret pooled members lives here.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::MemberHandle;
use crate::error::{Result, WorldError};

/// Session lifecycle of the generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorPhase {
    /// Constructed, nothing generated yet
    Uninitialized,
    /// Ring and pools built, waiting for the first tick
    Populated,
    /// Ticking every frame
    Running,
    /// Session over; the next populate rebuilds everything
    Ended,
}

/// Tree variants recycled alongside the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TreeKind {
    Snowy,
    Partial,
    Pine,
    Christmas,
}

impl TreeKind {
    pub const ALL: [TreeKind; 4] = [
        TreeKind::Snowy,
        TreeKind::Partial,
        TreeKind::Pine,
        TreeKind::Christmas,
    ];
}

/// Obstacle variants, some of which sit inside the corridor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Rock,
    WoodRamp,
    SnowRamp,
    SmallSnowman,
    BigSnowman,
    Checkpoint,
}

impl ObstacleKind {
    pub const ALL: [ObstacleKind; 6] = [
        ObstacleKind::Rock,
        ObstacleKind::WoodRamp,
        ObstacleKind::SnowRamp,
        ObstacleKind::SmallSnowman,
        ObstacleKind::BigSnowman,
        ObstacleKind::Checkpoint,
    ];

    /// Ramps and checkpoints trigger gameplay when the player crosses them
    pub fn is_interactive(&self) -> bool {
        matches!(
            self,
            ObstacleKind::WoodRamp | ObstacleKind::SnowRamp | ObstacleKind::Checkpoint
        )
    }
}

/// Opaque host handle for whatever renders a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrefabId(pub u32);

/// One kind-to-prefab binding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry<K> {
    pub kind: K,
    pub prefab: PrefabId,
}

/// Prefabs supplied by the host at construction
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrefabCatalog {
    pub trees: Vec<CatalogEntry<TreeKind>>,
    pub obstacles: Vec<CatalogEntry<ObstacleKind>>,
}

impl PrefabCatalog {
    /// Catalog that numbers every kind sequentially (trees first)
    pub fn sequential() -> Self {
        let trees = TreeKind::ALL
            .iter()
            .enumerate()
            .map(|(i, &kind)| CatalogEntry { kind, prefab: PrefabId(i as u32) })
            .collect::<Vec<_>>();
        let offset = trees.len() as u32;
        let obstacles = ObstacleKind::ALL
            .iter()
            .enumerate()
            .map(|(i, &kind)| CatalogEntry {
                kind,
                prefab: PrefabId(offset + i as u32),
            })
            .collect();
        Self { trees, obstacles }
    }

    pub fn tree_prefab(&self, kind: TreeKind) -> Option<PrefabId> {
        self.trees.iter().find(|e| e.kind == kind).map(|e| e.prefab)
    }

    pub fn obstacle_prefab(&self, kind: ObstacleKind) -> Option<PrefabId> {
        self.obstacles.iter().find(|e| e.kind == kind).map(|e| e.prefab)
    }

    /// Reject catalogs that cannot back either pool
    pub fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(WorldError::EmptyCatalog("tree"));
        }
        if self.obstacles.is_empty() {
            return Err(WorldError::EmptyCatalog("obstacle"));
        }
        Ok(())
    }
}

/// Which pool an event or counter refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolId {
    Trees,
    Obstacles,
}

/// Things that happened during a tick, drained by the host
#[derive(Debug, Clone, PartialEq)]
pub enum WorldEvent {
    /// A corridor row was moved to the front of the window
    RowGenerated { position: Vec2, width: f32 },
    TreePlaced {
        handle: MemberHandle,
        kind: TreeKind,
        prefab: PrefabId,
        position: Vec2,
    },
    ObstaclePlaced {
        handle: MemberHandle,
        kind: ObstacleKind,
        prefab: PrefabId,
        position: Vec2,
    },
    Retired { pool: PoolId, handle: MemberHandle },
    /// An activation was due but found no inactive member
    Starved { pool: PoolId },
}

/// Running counters for diagnosing pool sizing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub rows_generated: u64,
    pub rows_recentered: u64,
    /// Rows jumped over because one frame outran the whole ring
    pub rows_skipped: u64,
    pub trees_placed: u64,
    pub obstacles_placed: u64,
    pub retired: u64,
    pub trees_starved: u64,
    pub obstacles_starved: u64,
}

/// RNG seed bookkeeping (one stream per session)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
    pub session: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed, session: 0 }
    }

    /// Seed for the current session, decorrelated from its neighbours
    pub fn session_seed(&self) -> u64 {
        self.seed
            .wrapping_add(self.session.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.session_seed())
    }

    /// Move on to the next session's stream
    pub fn next_session(&mut self) -> Pcg32 {
        self.session += 1;
        self.to_rng()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_sequential_catalog_covers_all_kinds() {
        let catalog = PrefabCatalog::sequential();
        for kind in TreeKind::ALL {
            assert!(catalog.tree_prefab(kind).is_some());
        }
        for kind in ObstacleKind::ALL {
            assert!(catalog.obstacle_prefab(kind).is_some());
        }
        assert_eq!(catalog.obstacle_prefab(ObstacleKind::Rock), Some(PrefabId(4)));
        assert!(catalog.validate().is_ok());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let catalog = PrefabCatalog {
            trees: Vec::new(),
            ..PrefabCatalog::sequential()
        };
        assert!(matches!(catalog.validate(), Err(WorldError::EmptyCatalog("tree"))));
    }

    #[test]
    fn test_sessions_get_distinct_streams() {
        let mut state = RngState::new(42);
        let mut first = state.to_rng();
        let mut second = state.next_session();
        let a: u64 = first.random();
        let b: u64 = second.random();
        assert_ne!(a, b);
        assert_eq!(state.session, 1);
    }
}
