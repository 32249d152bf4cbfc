//! World generator: owns the corridor ring and both pools
//!
//! Lifecycle: `populate` builds a session, `tick` advances it every frame,
//! `end_game` parks everything. Populating again always rebuilds from
//! scratch on the next session's RNG stream.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::direction::DirectionBias;
use super::path::{PathRing, PathStep};
use super::pool::{Activation, ActivationCadence, ObjectPool, Placement, PoolSpec};
use super::state::{
    GeneratorPhase, GeneratorStats, ObstacleKind, PoolId, PrefabCatalog, RngState, TreeKind,
    WorldEvent,
};
use super::viewport::{Camera, Viewport};
use crate::consts::MAX_WINDOW_ROWS;
use crate::error::{Result, WorldError};
use crate::session::SessionContext;
use crate::settings::GeneratorSettings;

/// Viewports derived from the latest camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Frame {
    /// What the camera sees; used for culling and recentering
    pub view: Viewport,
    /// View plus overdraw; horizontal limits for tree placement
    pub bounds: Viewport,
}

impl Frame {
    pub fn from_camera(camera: &Camera, settings: &GeneratorSettings) -> Result<Self> {
        let view = Viewport::from_camera(camera)?;
        if view.height() > MAX_WINDOW_ROWS as f32 {
            return Err(WorldError::DegenerateViewport {
                width: view.width(),
                height: view.height(),
            });
        }
        Ok(Self {
            view,
            bounds: Viewport::with_overdraw(camera, settings.x_overdraw, settings.y_overdraw)?,
        })
    }
}

pub struct WorldGenerator {
    pub(crate) settings: GeneratorSettings,
    catalog: PrefabCatalog,
    rng_state: RngState,
    pub(crate) rng: Pcg32,
    pub(crate) phase: GeneratorPhase,
    pub(crate) ring: PathRing,
    pub(crate) trees: ObjectPool<TreeKind>,
    pub(crate) obstacles: ObjectPool<ObstacleKind>,
    bias: DirectionBias,
    pub(crate) frame: Option<Frame>,
    /// Player y at the last generation jump (minus carried fraction)
    pub(crate) last_update_y: f32,
    /// Lowest player y seen this session
    pub(crate) last_player_y: f32,
    pub(crate) stats: GeneratorStats,
    pub(crate) events: Vec<WorldEvent>,
}

impl WorldGenerator {
    /// Validate configuration and prepare an unpopulated generator
    pub fn new(settings: GeneratorSettings, catalog: PrefabCatalog, seed: u64) -> Result<Self> {
        settings.validate()?;
        catalog.validate()?;
        check_prefabs(&settings, &catalog)?;

        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let bias = DirectionBias::new(&mut rng, settings.run_length.as_tuple());
        let (trees, obstacles) = empty_pools(&settings, &mut rng);

        Ok(Self {
            settings,
            catalog,
            rng_state,
            rng,
            phase: GeneratorPhase::Uninitialized,
            ring: PathRing::default(),
            trees,
            obstacles,
            bias,
            frame: None,
            last_update_y: 0.0,
            last_player_y: 0.0,
            stats: GeneratorStats::default(),
            events: Vec::new(),
        })
    }

    /// Build a fresh session around the player: pools, corridor, one tree
    /// per row. Nothing changes if the camera is degenerate.
    pub fn populate(&mut self, player: Vec2, camera: &Camera) -> Result<()> {
        let frame = Frame::from_camera(camera, &self.settings)?;

        if self.phase != GeneratorPhase::Uninitialized {
            self.rng = self.rng_state.next_session();
        }

        let tree_specs = tree_specs(&self.settings, &self.catalog, &mut self.rng)?;
        let obstacle_specs = obstacle_specs(&self.settings, &self.catalog)?;
        let (mut trees, mut obstacles) = empty_pools(&self.settings, &mut self.rng);
        trees.populate(&tree_specs)?;
        trees.shuffle_inactive(&mut self.rng);
        obstacles.populate(&obstacle_specs)?;

        self.trees = trees;
        self.obstacles = obstacles;
        self.bias = DirectionBias::new(&mut self.rng, self.settings.run_length.as_tuple());
        self.stats = GeneratorStats::default();
        self.events.clear();
        self.frame = Some(frame);

        let rows = self.settings.window_rows(frame.view.height());
        if self.trees.capacity() < rows {
            log::warn!(
                "Tree pool ({}) is smaller than the {}-row window; expect bare rows",
                self.trees.capacity(),
                rows
            );
        }

        let top = Vec2::new(player.x, player.y.floor());
        self.ring = PathRing::fill(top, rows, self.settings.path_width);
        let initial: Vec<PathStep> = self.ring.iter().copied().collect();
        for step in &initial {
            self.recycle_tree(step, &frame.bounds);
        }

        self.last_update_y = player.y;
        self.last_player_y = player.y;
        self.phase = GeneratorPhase::Populated;

        log::info!(
            "Session {} populated: {} rows, {} trees, {} obstacles (seed {})",
            self.rng_state.session,
            rows,
            self.trees.capacity(),
            self.obstacles.capacity(),
            self.rng_state.session_seed()
        );
        Ok(())
    }

    /// Reset the session context and populate a new run
    pub fn start_new_game(
        &mut self,
        session: &mut SessionContext,
        player: Vec2,
        camera: &Camera,
    ) -> Result<()> {
        self.populate(player, camera)?;
        session.reset();
        Ok(())
    }

    /// Move `count` rows from the back of the ring to the front, recycling
    /// a tree and (when due) an obstacle beside each one.
    ///
    /// At most one ring's worth of rows is relocated; any rows beyond that
    /// would only be overwritten again, so the front jumps over them.
    /// Returns the number of rows actually relocated.
    pub fn generate_more_world(&mut self, count: usize) -> Result<usize> {
        let rows = count.min(self.ring.len());
        self.relocate_rows(rows, (count - rows) as f32)
    }

    /// Relocate `rows` rows, the first of them `skipped` rows past the
    /// current front
    pub(crate) fn relocate_rows(&mut self, rows: usize, skipped: f32) -> Result<usize> {
        let frame = self.frame.ok_or(WorldError::NotPopulated)?;
        if self.ring.is_empty() {
            return Err(WorldError::NotPopulated);
        }
        if skipped > 0.0 {
            self.stats.rows_skipped += skipped as u64;
            log::debug!("Jumping the corridor front {} rows ahead", skipped);
        }

        let mut gap = skipped;
        for _ in 0..rows {
            let Some(mut anchor) = self.ring.frontmost().copied() else {
                return Err(WorldError::NotPopulated);
            };
            anchor.position.y -= gap;
            gap = 0.0;
            let Some(id) = self.ring.pop_rearmost() else {
                return Err(WorldError::NotPopulated);
            };

            let mut step = self.ring.get(id).copied().unwrap_or(anchor);
            step.reposition(
                &anchor,
                &self.bias,
                self.settings.max_lateral_drift,
                &mut self.rng,
            );
            if step.recenter_if_invisible(&frame.view, self.settings.recenter_padding) {
                self.stats.rows_recentered += 1;
            }
            if let Some(slot) = self.ring.get_mut(id) {
                *slot = step;
            }

            self.recycle_tree(&step, &frame.bounds);
            self.recycle_obstacle(&step, &frame.bounds);
            self.ring.push_frontmost(id);
            self.bias.advance(&mut self.rng);

            self.stats.rows_generated += 1;
            self.events.push(WorldEvent::RowGenerated {
                position: step.position,
                width: step.width,
            });
        }

        log::debug!(
            "Generated {} rows, front now at y {:.1}",
            rows,
            self.ring.frontmost().map(|s| s.position.y).unwrap_or_default()
        );
        Ok(rows)
    }

    fn recycle_tree(&mut self, anchor: &PathStep, bounds: &Viewport) {
        match self.trees.activate_near(anchor, bounds, &mut self.rng) {
            Activation::Placed(handle) => {
                if let Some(member) = self.trees.get(handle) {
                    self.stats.trees_placed += 1;
                    self.events.push(WorldEvent::TreePlaced {
                        handle,
                        kind: member.kind,
                        prefab: member.prefab,
                        position: member.position,
                    });
                }
            }
            Activation::Starved => {
                self.stats.trees_starved += 1;
                self.events.push(WorldEvent::Starved { pool: PoolId::Trees });
            }
            Activation::NotDue => {}
        }
    }

    fn recycle_obstacle(&mut self, anchor: &PathStep, bounds: &Viewport) {
        match self.obstacles.activate_near(anchor, bounds, &mut self.rng) {
            Activation::Placed(handle) => {
                if let Some(member) = self.obstacles.get(handle) {
                    self.stats.obstacles_placed += 1;
                    self.events.push(WorldEvent::ObstaclePlaced {
                        handle,
                        kind: member.kind,
                        prefab: member.prefab,
                        position: member.position,
                    });
                }
            }
            Activation::Starved => {
                self.stats.obstacles_starved += 1;
                self.events.push(WorldEvent::Starved { pool: PoolId::Obstacles });
            }
            Activation::NotDue => {}
        }
    }

    /// Park every member and stop ticking until the next populate
    pub fn end_game(&mut self) -> GeneratorStats {
        let parked = self.trees.retire_all() + self.obstacles.retire_all();
        self.phase = GeneratorPhase::Ended;
        self.frame = None;
        log::info!(
            "Session {} ended: {} rows generated, {} members parked, starved trees/obstacles {}/{}",
            self.rng_state.session,
            self.stats.rows_generated,
            parked,
            self.stats.trees_starved,
            self.stats.obstacles_starved
        );
        self.stats
    }

    /// Take every event recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.events)
    }

    #[inline]
    pub fn phase(&self) -> GeneratorPhase {
        self.phase
    }

    #[inline]
    pub fn ring(&self) -> &PathRing {
        &self.ring
    }

    #[inline]
    pub fn trees(&self) -> &ObjectPool<TreeKind> {
        &self.trees
    }

    #[inline]
    pub fn obstacles(&self) -> &ObjectPool<ObstacleKind> {
        &self.obstacles
    }

    /// Pool access for consumers that retire members early (pickups)
    #[inline]
    pub fn obstacles_mut(&mut self) -> &mut ObjectPool<ObstacleKind> {
        &mut self.obstacles
    }

    #[inline]
    pub fn direction_bias(&self) -> &DirectionBias {
        &self.bias
    }

    #[inline]
    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    #[inline]
    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    #[inline]
    pub fn catalog(&self) -> &PrefabCatalog {
        &self.catalog
    }

    #[inline]
    pub fn session(&self) -> u64 {
        self.rng_state.session
    }
}

fn empty_pools(
    settings: &GeneratorSettings,
    rng: &mut Pcg32,
) -> (ObjectPool<TreeKind>, ObjectPool<ObstacleKind>) {
    let trees = ObjectPool::new(
        "tree",
        settings.tree_policy,
        Placement::BesideCorridor {
            margin: settings.tree_margin,
        },
        settings.sentinel,
    );
    let cadence = ActivationCadence::new(rng, settings.obstacle_cadence.as_tuple());
    let obstacles = ObjectPool::new(
        "obstacle",
        settings.obstacle_policy,
        Placement::WithinCorridor,
        settings.sentinel,
    )
    .with_cadence(cadence);
    (trees, obstacles)
}

fn check_prefabs(settings: &GeneratorSettings, catalog: &PrefabCatalog) -> Result<()> {
    for w in settings.tree_weights.iter().filter(|w| w.weight > 0) {
        if catalog.tree_prefab(w.kind).is_none() {
            return Err(WorldError::MissingPrefab(format!("{:?}", w.kind)));
        }
    }
    obstacle_specs(settings, catalog).map(|_| ())
}

/// Draw `tree_capacity` kinds from the weight table
fn tree_specs<R: Rng + ?Sized>(
    settings: &GeneratorSettings,
    catalog: &PrefabCatalog,
    rng: &mut R,
) -> Result<Vec<PoolSpec<TreeKind>>> {
    let weights: Vec<_> = settings.tree_weights.iter().filter(|w| w.weight > 0).collect();
    let total = crate::settings::checked_total(weights.iter().map(|w| w.weight))
        .filter(|&total| total > 0)
        .ok_or_else(|| WorldError::InvalidSetting {
            name: "tree_weights",
            reason: "total weight must be positive and fit in u32".to_string(),
        })?;
    let mut counts = vec![0u32; weights.len()];

    for _ in 0..settings.tree_capacity {
        let mut roll = rng.random_range(0..total);
        for (i, w) in weights.iter().enumerate() {
            if roll < w.weight {
                counts[i] += 1;
                break;
            }
            roll -= w.weight;
        }
    }

    weights
        .iter()
        .zip(counts)
        .filter(|(_, count)| *count > 0)
        .map(|(w, count)| {
            let prefab = catalog
                .tree_prefab(w.kind)
                .ok_or_else(|| WorldError::MissingPrefab(format!("{:?}", w.kind)))?;
            Ok(PoolSpec {
                kind: w.kind,
                prefab,
                count,
            })
        })
        .collect()
}

fn obstacle_specs(
    settings: &GeneratorSettings,
    catalog: &PrefabCatalog,
) -> Result<Vec<PoolSpec<ObstacleKind>>> {
    settings
        .obstacle_counts
        .iter()
        .filter(|c| c.count > 0)
        .map(|c| {
            let prefab = catalog
                .obstacle_prefab(c.kind)
                .ok_or_else(|| WorldError::MissingPrefab(format!("{:?}", c.kind)))?;
            Ok(PoolSpec {
                kind: c.kind,
                prefab,
                count: c.count,
            })
        })
        .collect()
}
