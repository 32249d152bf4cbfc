//! Deterministic world generation
//!
//! All generation logic lives here. This module must stay pure and
//! deterministic:
//! - One seeded RNG per session
//! - Stable iteration order (arena indices)
//! - No rendering or platform dependencies

pub mod direction;
pub mod generator;
pub mod path;
pub mod pool;
pub mod state;
pub mod tick;
pub mod viewport;

pub use direction::{Direction, DirectionBias};
pub use generator::WorldGenerator;
pub use path::{PathRing, PathStep, StepId};
pub use pool::{
    Activation, ActivationCadence, DequeuePolicy, MemberHandle, ObjectPool, Placement, PoolMember, PoolSpec,
};
pub use state::{
    CatalogEntry, GeneratorPhase, GeneratorStats, ObstacleKind, PoolId, PrefabCatalog, PrefabId,
    RngState, TreeKind, WorldEvent,
};
pub use tick::{TickInput, TickReport};
pub use viewport::{Camera, Viewport, is_above_view, is_visible};
