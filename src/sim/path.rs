//! The safe corridor: a fixed ring of rows relocated in place
//!
//! Rows are created once when a session is populated. After that the
//! rearmost row is moved to the front whenever the world advances, so the
//! ring never allocates during play.

use std::collections::VecDeque;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::direction::DirectionBias;
use super::viewport::Viewport;

/// Stable arena index of a row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub usize);

/// One traversable row of the corridor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathStep {
    /// Row anchor (corridor center)
    pub position: Vec2,
    pub width: f32,
}

impl PathStep {
    pub fn create(position: Vec2, width: f32) -> Self {
        Self { position, width }
    }

    #[inline]
    pub fn left_edge(&self) -> f32 {
        self.position.x - self.width / 2.0
    }

    #[inline]
    pub fn right_edge(&self) -> f32 {
        self.position.x + self.width / 2.0
    }

    /// Place this row one unit below `anchor`, nudged sideways when turning
    pub fn reposition<R: Rng + ?Sized>(
        &mut self,
        anchor: &PathStep,
        bias: &DirectionBias,
        max_drift: f32,
        rng: &mut R,
    ) {
        let sign = bias.direction().sign();
        let dx = if sign != 0.0 {
            crate::sample_span(rng, 0.0, max_drift) * sign
        } else {
            0.0
        };
        self.position = anchor.position + Vec2::new(dx, -1.0);
    }

    /// Horizontal overlap test against the view; rows ahead of the camera
    /// must not count as invisible just because of their height.
    pub fn is_visible_in(&self, viewport: &Viewport, padding: f32) -> bool {
        let left = viewport.normalize(Vec2::new(self.left_edge(), 0.0)).x;
        let right = viewport.normalize(Vec2::new(self.right_edge(), 0.0)).x;
        !(right < -padding || left > 1.0 + padding)
    }

    /// Pull a row that drifted off-screen back to the view's center column.
    ///
    /// Returns true if the row moved.
    pub fn recenter_if_invisible(&mut self, viewport: &Viewport, padding: f32) -> bool {
        if self.is_visible_in(viewport, padding) {
            return false;
        }
        self.position.x = viewport.center().x;
        true
    }

    #[inline]
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.left_edge() && x <= self.right_edge()
    }
}

/// Fixed-size queue of rows, rearmost (highest y) first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathRing {
    steps: Vec<PathStep>,
    order: VecDeque<StepId>,
}

impl PathRing {
    /// Lay `rows` straight rows below `top`, one unit apart
    pub fn fill(top: Vec2, rows: usize, width: f32) -> Self {
        let steps: Vec<PathStep> = (1..=rows)
            .map(|k| PathStep::create(Vec2::new(top.x, top.y - k as f32), width))
            .collect();
        let order = (0..rows).map(StepId).collect();
        Self { steps, order }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&PathStep> {
        self.steps.get(id.0)
    }

    pub fn get_mut(&mut self, id: StepId) -> Option<&mut PathStep> {
        self.steps.get_mut(id.0)
    }

    /// Oldest row, furthest behind the player
    pub fn rearmost(&self) -> Option<&PathStep> {
        self.order.front().and_then(|&id| self.get(id))
    }

    /// Newest row, furthest ahead of the player
    pub fn frontmost(&self) -> Option<&PathStep> {
        self.order.back().and_then(|&id| self.get(id))
    }

    pub fn pop_rearmost(&mut self) -> Option<StepId> {
        self.order.pop_front()
    }

    pub fn push_frontmost(&mut self, id: StepId) {
        self.order.push_back(id);
    }

    /// Row ids, rearmost first
    pub fn ids(&self) -> impl Iterator<Item = StepId> + '_ {
        self.order.iter().copied()
    }

    /// Rows, rearmost first
    pub fn iter(&self) -> impl Iterator<Item = &PathStep> + '_ {
        self.order.iter().filter_map(|&id| self.get(id))
    }

    /// True when the rows descend one unit at a time
    pub fn is_contiguous(&self) -> bool {
        let ys: Vec<f32> = self.iter().map(|s| s.position.y).collect();
        ys.windows(2).all(|w| ((w[0] - w[1]) - 1.0).abs() < 1e-3)
    }

    /// Row whose anchor is nearest `y`, if `y` is within the ring
    pub fn step_at_row(&self, y: f32) -> Option<&PathStep> {
        self.iter().find(|s| (s.position.y - y).abs() <= 0.5)
    }

    /// Clamp an x coordinate into the corridor at height `y`.
    ///
    /// Outside the ring the x is returned unchanged.
    pub fn clamp_to_corridor(&self, x: f32, y: f32) -> f32 {
        match self.step_at_row(y) {
            Some(step) => x.clamp(step.left_edge(), step.right_edge()),
            None => x,
        }
    }
}
