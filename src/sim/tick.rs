//! Per-frame generator tick
//!
//! Culls pooled members that scrolled off the top of the view, then
//! generates rows in view-height jumps as the player descends.

use glam::Vec2;

use super::generator::{Frame, WorldGenerator};
use super::state::{GeneratorPhase, PoolId, WorldEvent};
use super::viewport::{Camera, Viewport};
use crate::consts::REGRESSION_TOLERANCE;
use crate::error::{Result, WorldError};

/// Host state for a single frame
#[derive(Debug, Clone, Copy)]
pub struct TickInput {
    /// Player world position
    pub player: Vec2,
    /// Camera following the player
    pub camera: Camera,
}

/// What a tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Pool members retired by the visibility sweep
    pub retired: usize,
    /// Corridor rows generated this frame
    pub rows_generated: usize,
}

impl WorldGenerator {
    /// Advance the world by one frame.
    ///
    /// Fails without touching anything if the session is not populated, the
    /// camera is degenerate, or the player moved back up the slope.
    pub fn tick(&mut self, input: &TickInput) -> Result<TickReport> {
        if matches!(
            self.phase,
            GeneratorPhase::Uninitialized | GeneratorPhase::Ended
        ) {
            return Err(WorldError::NotPopulated);
        }

        let frame = Frame::from_camera(&input.camera, &self.settings)?;
        let player_y = input.player.y;
        if player_y > self.last_player_y + REGRESSION_TOLERANCE {
            return Err(WorldError::PlayerRegressed {
                last: self.last_player_y,
                current: player_y,
            });
        }

        self.phase = GeneratorPhase::Running;
        self.last_player_y = self.last_player_y.min(player_y);
        self.frame = Some(frame);

        let retired = self.sweep_retire(&frame.view);

        let mut report = TickReport {
            retired,
            rows_generated: 0,
        };

        let distance = self.last_update_y - player_y;
        if distance > frame.view.height() {
            // Whole rows only; the fraction carries into the next jump
            let whole = distance.floor();
            let len = self.ring.len();
            let rows = if whole >= len as f32 { len } else { whole as usize };
            report.rows_generated = self.relocate_rows(rows, whole - rows as f32)?;
            self.last_update_y -= whole;
        }

        Ok(report)
    }

    /// Retire members of both pools that left the top of the view
    fn sweep_retire(&mut self, view: &Viewport) -> usize {
        let padding = self.settings.retire_padding;
        let trees = self.trees.sweep_retire(view, padding);
        let obstacles = self.obstacles.sweep_retire(view, padding);
        let count = trees.len() + obstacles.len();

        self.events.extend(
            trees
                .into_iter()
                .map(|handle| WorldEvent::Retired { pool: PoolId::Trees, handle })
                .chain(
                    obstacles
                        .into_iter()
                        .map(|handle| WorldEvent::Retired { pool: PoolId::Obstacles, handle }),
                ),
        );
        self.stats.retired += count as u64;
        if count > 0 {
            log::trace!("Retired {} members", count);
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::GeneratorSettings;
    use crate::sim::state::PrefabCatalog;
    use crate::sim::viewport::is_above_view;
    use proptest::prelude::*;

    fn input_at(player: Vec2) -> TickInput {
        TickInput {
            player,
            camera: Camera::new(Vec2::new(player.x, player.y - 5.0), 10.0, 0.5),
        }
    }

    fn running(seed: u64) -> WorldGenerator {
        let mut world =
            WorldGenerator::new(GeneratorSettings::default(), PrefabCatalog::sequential(), seed).unwrap();
        let start = input_at(Vec2::ZERO);
        world.populate(start.player, &start.camera).unwrap();
        world
    }

    /// Descend at a steady pace, returning the number of rows generated
    fn descend(world: &mut WorldGenerator, frames: usize, speed: f32) -> usize {
        let mut rows = 0;
        for frame in 1..=frames {
            let report = world
                .tick(&input_at(Vec2::new(0.0, -(frame as f32) * speed)))
                .unwrap();
            rows += report.rows_generated;
        }
        rows
    }

    #[test]
    fn test_tick_before_populate() {
        let mut world =
            WorldGenerator::new(GeneratorSettings::default(), PrefabCatalog::sequential(), 1).unwrap();
        assert!(matches!(world.tick(&input_at(Vec2::ZERO)), Err(WorldError::NotPopulated)));
    }

    #[test]
    fn test_first_tick_starts_running() {
        let mut world = running(1);
        let report = world.tick(&input_at(Vec2::new(0.0, -0.5))).unwrap();
        assert_eq!(world.phase(), GeneratorPhase::Running);
        assert_eq!(report.rows_generated, 0);
    }

    #[test]
    fn test_generation_waits_for_a_full_view_height() {
        let mut world = running(2);
        let front = world.ring().frontmost().unwrap().position.y;

        // 20-unit view: nothing until the player has gone further than that
        let report = world.tick(&input_at(Vec2::new(0.0, -20.0))).unwrap();
        assert_eq!(report.rows_generated, 0);

        let report = world.tick(&input_at(Vec2::new(0.0, -21.5))).unwrap();
        assert_eq!(report.rows_generated, 21);
        assert_eq!(world.ring().frontmost().unwrap().position.y, front - 21.0);
        assert_eq!(world.ring().len(), 25);
        assert!(world.ring().is_contiguous());

        // The half row carried over, so the next jump comes half a row early
        let report = world.tick(&input_at(Vec2::new(0.0, -41.0))).unwrap();
        assert_eq!(report.rows_generated, 0);
        let report = world.tick(&input_at(Vec2::new(0.0, -41.5))).unwrap();
        assert_eq!(report.rows_generated, 20);
        assert!(world.ring().is_contiguous());
    }

    #[test]
    fn test_teleport_relocates_one_ring_at_most() {
        let mut world = running(8);
        world.drain_events();
        let rows = world.ring().len();

        let report = world.tick(&input_at(Vec2::new(0.0, -10_000.0))).unwrap();
        assert_eq!(report.rows_generated, rows);
        assert_eq!(world.ring().len(), rows);
        assert!(world.ring().is_contiguous());
        assert_eq!(world.stats().rows_generated, rows as u64);
        assert_eq!(world.stats().rows_skipped, 10_000 - rows as u64);

        // Front lands where a steady descent would have put it
        assert_eq!(world.ring().frontmost().unwrap().position.y, -10_025.0);
        assert!(world.drain_events().len() <= rows * 3 + 2 * world.trees().capacity());

        // Back to normal pacing afterwards
        let report = world.tick(&input_at(Vec2::new(0.0, -10_001.0))).unwrap();
        assert_eq!(report.rows_generated, 0);
        assert!(world.ring().is_contiguous());
    }

    #[test]
    fn test_absurd_jump_stays_bounded() {
        let mut world = running(9);
        let report = world.tick(&input_at(Vec2::new(0.0, -1.0e30))).unwrap();
        assert_eq!(report.rows_generated, world.ring().len());
        assert!(world.ring().frontmost().unwrap().position.y < -1.0e29);
    }

    #[test]
    fn test_oversized_camera_rejected() {
        let mut world = running(10);
        let tall = TickInput {
            player: Vec2::new(0.0, -1.0),
            camera: Camera::new(Vec2::ZERO, 1.0e9, 0.5),
        };
        assert!(matches!(world.tick(&tall), Err(WorldError::DegenerateViewport { .. })));
        assert_eq!(world.phase(), GeneratorPhase::Populated);
    }

    #[test]
    fn test_regression_rejected_without_mutation() {
        let mut world = running(3);
        world.tick(&input_at(Vec2::new(0.0, -30.0))).unwrap();
        let ring: Vec<_> = world.ring().iter().copied().collect();
        let active = world.trees().active_count();

        let err = world.tick(&input_at(Vec2::new(0.0, -10.0))).unwrap_err();
        assert!(matches!(err, WorldError::PlayerRegressed { .. }));
        assert_eq!(world.ring().iter().copied().collect::<Vec<_>>(), ring);
        assert_eq!(world.trees().active_count(), active);

        // Standing still is fine
        assert!(world.tick(&input_at(Vec2::new(0.0, -30.0))).is_ok());
    }

    #[test]
    fn test_sweep_retires_trees_behind_player() {
        let mut world = running(4);
        world.drain_events();
        descend(&mut world, 200, 0.25);

        let events = world.drain_events();
        let retired = events
            .iter()
            .filter(|e| matches!(e, WorldEvent::Retired { pool: PoolId::Trees, .. }))
            .count();
        assert!(retired > 0);

        let view = Viewport::from_camera(&input_at(Vec2::new(0.0, -50.0)).camera).unwrap();
        for (_, tree) in world.trees().active_members() {
            assert!(is_above_view(tree.position, &view, 0.1));
        }
    }

    #[test]
    fn test_obstacles_appear_on_the_corridor() {
        let mut world = running(5);
        descend(&mut world, 2000, 0.25);
        assert!(world.stats().obstacles_placed > 0);
        for (_, obstacle) in world.obstacles().active_members() {
            let row = world.ring().step_at_row(obstacle.position.y);
            if let Some(row) = row {
                assert!(row.contains_x(obstacle.position.x));
            }
        }
    }

    #[test]
    fn test_front_row_stays_in_view_horizontally() {
        let mut world = running(6);
        for frame in 1..=3000 {
            let input = input_at(Vec2::new(0.0, -(frame as f32) * 0.3));
            world.tick(&input).unwrap();
            let front = world.ring().frontmost().unwrap();
            let view = Viewport::from_camera(&input.camera).unwrap();
            assert!(front.is_visible_in(&view, 0.05));
        }
    }

    #[test]
    fn test_end_game_stops_ticking() {
        let mut world = running(7);
        world.tick(&input_at(Vec2::new(0.0, -1.0))).unwrap();
        world.end_game();
        assert!(matches!(
            world.tick(&input_at(Vec2::new(0.0, -2.0))),
            Err(WorldError::NotPopulated)
        ));
    }

    #[test]
    fn test_determinism() {
        // Two generators with the same seed build identical worlds
        let mut a = running(99999);
        let mut b = running(99999);
        descend(&mut a, 500, 0.4);
        descend(&mut b, 500, 0.4);

        let rows_a: Vec<_> = a.ring().iter().copied().collect();
        let rows_b: Vec<_> = b.ring().iter().copied().collect();
        assert_eq!(rows_a, rows_b);
        assert_eq!(a.trees().members(), b.trees().members());
        assert_eq!(a.obstacles().members(), b.obstacles().members());
        assert_eq!(a.stats(), b.stats());
        assert_eq!(a.drain_events(), b.drain_events());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn ring_and_pools_hold_invariants(
            seed in any::<u64>(),
            steps in prop::collection::vec(0.0f32..3.0, 1..300),
        ) {
            let mut world = running(seed);
            let rows = world.ring().len();
            let tree_capacity = world.trees().capacity();
            let obstacle_capacity = world.obstacles().capacity();

            let mut y = 0.0f32;
            for dy in steps {
                y -= dy;
                world.tick(&input_at(Vec2::new(0.0, y))).unwrap();

                prop_assert_eq!(world.ring().len(), rows);
                prop_assert!(world.ring().is_contiguous());
                prop_assert_eq!(
                    world.trees().active_count() + world.trees().inactive_count(),
                    tree_capacity
                );
                prop_assert_eq!(
                    world.obstacles().active_count() + world.obstacles().inactive_count(),
                    obstacle_capacity
                );
                // The corridor never falls behind the player by more than a view
                let front = world.ring().frontmost().unwrap().position.y;
                prop_assert!(front <= y);
            }
        }
    }
}
