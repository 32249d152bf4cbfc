//! Fixed-capacity recycling pools for trees and obstacles
//!
//! Members are allocated once per session into an arena and addressed by
//! index. Activation moves an inactive member next to a corridor row;
//! retirement parks it at the sentinel position and queues it for reuse.
//! Handles carry a generation so a stale handle never aliases a member
//! that has since been recycled.

use std::collections::VecDeque;
use std::fmt::Debug;

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::path::PathStep;
use super::state::PrefabId;
use super::viewport::{Viewport, is_above_view};
use crate::error::{Result, WorldError};
use crate::sample_span;

/// Reference to one activation of a pool member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemberHandle {
    pub index: u32,
    pub generation: u32,
}

/// A pre-allocated pooled object
#[derive(Debug, Clone, PartialEq)]
pub struct PoolMember<K> {
    pub kind: K,
    pub prefab: PrefabId,
    pub position: Vec2,
    pub active: bool,
    /// Bumped on every activation
    pub generation: u32,
}

/// How the next inactive member is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DequeuePolicy {
    /// Oldest retired member first
    #[default]
    Fifo,
    /// Any inactive member with equal probability
    UniformRandom,
}

/// Where an activated member lands relative to its anchor row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Left or right of the corridor (50/50), never on it
    BesideCorridor { margin: f32 },
    /// Anywhere across the corridor width
    WithinCorridor,
}

/// Independent countdown that thins out activations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivationCadence {
    steps_since_last: u32,
    next_at: u32,
    range: (u32, u32),
}

impl ActivationCadence {
    pub fn new<R: Rng + ?Sized>(rng: &mut R, range: (u32, u32)) -> Self {
        let mut cadence = Self {
            steps_since_last: 0,
            next_at: range.0,
            range,
        };
        cadence.next_at = cadence.sample(rng);
        cadence
    }

    /// Count one opportunity; true when an activation is due.
    ///
    /// Stays due until `rearm` is called, so an activation that could not
    /// happen is owed to the next opportunity.
    pub fn step(&mut self) -> bool {
        if !self.is_due() {
            self.steps_since_last += 1;
        }
        self.is_due()
    }

    #[inline]
    pub fn is_due(&self) -> bool {
        self.steps_since_last >= self.next_at
    }

    /// Start the next countdown after an activation
    pub fn rearm<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.steps_since_last = 0;
        self.next_at = self.sample(rng);
    }

    #[inline]
    pub fn next_at(&self) -> u32 {
        self.next_at
    }

    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        let min = self.range.0.max(1);
        rng.random_range(min..=self.range.1.max(min))
    }
}

/// Outcome of one activation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    Placed(MemberHandle),
    /// The cadence has not come round yet
    NotDue,
    /// An activation was due but every member is live
    Starved,
}

impl Activation {
    #[inline]
    pub fn placed(self) -> Option<MemberHandle> {
        match self {
            Activation::Placed(handle) => Some(handle),
            _ => None,
        }
    }
}

/// `count` members of one kind to allocate up front
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolSpec<K> {
    pub kind: K,
    pub prefab: PrefabId,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectPool<K> {
    label: &'static str,
    members: Vec<PoolMember<K>>,
    inactive: VecDeque<u32>,
    active: Vec<u32>,
    policy: DequeuePolicy,
    placement: Placement,
    cadence: Option<ActivationCadence>,
    sentinel: Vec2,
}

impl<K: Copy + Debug> ObjectPool<K> {
    pub fn new(label: &'static str, policy: DequeuePolicy, placement: Placement, sentinel: Vec2) -> Self {
        Self {
            label,
            members: Vec::new(),
            inactive: VecDeque::new(),
            active: Vec::new(),
            policy,
            placement,
            cadence: None,
            sentinel,
        }
    }

    /// Gate activations behind an independent countdown
    pub fn with_cadence(mut self, cadence: ActivationCadence) -> Self {
        self.cadence = Some(cadence);
        self
    }

    /// Allocate every member, parked and inactive. Replaces any previous
    /// population.
    pub fn populate(&mut self, specs: &[PoolSpec<K>]) -> Result<()> {
        let total = crate::settings::checked_total(specs.iter().map(|s| s.count)).ok_or_else(|| {
            WorldError::InvalidSetting {
                name: self.label,
                reason: "member count overflows u32".to_string(),
            }
        })?;
        if total == 0 {
            return Err(WorldError::ZeroCapacity(self.label));
        }

        self.members.clear();
        self.active.clear();
        self.inactive.clear();
        self.members.reserve(total as usize);

        for spec in specs {
            for _ in 0..spec.count {
                let index = self.members.len() as u32;
                self.members.push(PoolMember {
                    kind: spec.kind,
                    prefab: spec.prefab,
                    position: self.sentinel,
                    active: false,
                    generation: 0,
                });
                self.inactive.push_back(index);
            }
        }

        log::debug!("Populated {} pool with {} members", self.label, total);
        Ok(())
    }

    /// Randomize the order inactive members come out in
    pub fn shuffle_inactive<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.inactive.make_contiguous().shuffle(rng);
    }

    /// Pull one inactive member next to `anchor`.
    ///
    /// A pool with a cadence counts the request first and only reports
    /// starvation when an activation was actually due. Members and the RNG
    /// are left untouched unless something is placed.
    pub fn activate_near<R: Rng + ?Sized>(
        &mut self,
        anchor: &PathStep,
        bounds: &Viewport,
        rng: &mut R,
    ) -> Activation {
        if let Some(cadence) = self.cadence.as_mut() {
            if !cadence.step() {
                return Activation::NotDue;
            }
        }

        let index = match self.policy {
            DequeuePolicy::Fifo => self.inactive.pop_front(),
            DequeuePolicy::UniformRandom if self.inactive.is_empty() => None,
            DequeuePolicy::UniformRandom => {
                let slot = rng.random_range(0..self.inactive.len());
                self.inactive.swap_remove_back(slot)
            }
        };
        let Some(index) = index else {
            return Activation::Starved;
        };
        if let Some(cadence) = self.cadence.as_mut() {
            cadence.rearm(rng);
        }

        let x = self.placement_x(anchor, bounds, rng);
        let member = &mut self.members[index as usize];
        member.position = Vec2::new(x, anchor.position.y);
        member.active = true;
        member.generation = member.generation.wrapping_add(1);
        self.active.push(index);

        log::trace!(
            "{} pool: {:?} #{} -> ({:.2}, {:.2})",
            self.label,
            member.kind,
            index,
            member.position.x,
            member.position.y
        );

        Activation::Placed(MemberHandle {
            index,
            generation: member.generation,
        })
    }

    fn placement_x<R: Rng + ?Sized>(&self, anchor: &PathStep, bounds: &Viewport, rng: &mut R) -> f32 {
        match self.placement {
            Placement::WithinCorridor => sample_span(rng, anchor.left_edge(), anchor.right_edge()),
            Placement::BesideCorridor { margin } => {
                let left = (bounds.min().x, anchor.left_edge() - margin);
                let right = (anchor.right_edge() + margin, bounds.max().x);
                let left_open = left.1 > left.0;
                let right_open = right.1 > right.0;

                // Always roll so the stream does not depend on room available
                let prefer_left = rng.random_bool(0.5);
                let (lo, hi) = match (prefer_left, left_open, right_open) {
                    (true, true, _) | (false, true, false) => left,
                    (false, _, true) | (true, false, true) => right,
                    // Corridor fills the bounds; stay just off it
                    _ => return left.1,
                };
                sample_span(rng, lo, hi)
            }
        }
    }

    /// Retire every active member that has scrolled past the padded top
    /// edge. Returns the handles that were retired.
    pub fn sweep_retire(&mut self, viewport: &Viewport, padding: f32) -> Vec<MemberHandle> {
        let mut retired = Vec::new();
        // Back to front so swap_remove never skips an element
        let mut i = self.active.len();
        while i > 0 {
            i -= 1;
            let index = self.active[i];
            let position = self.members[index as usize].position;
            if !is_above_view(position, viewport, padding) {
                self.active.swap_remove(i);
                retired.push(self.park(index));
            }
        }
        retired
    }

    /// Retire one member early (e.g. a collected pickup). False if the
    /// handle is stale.
    pub fn retire(&mut self, handle: MemberHandle) -> bool {
        if self.get(handle).is_none() {
            return false;
        }
        if let Some(i) = self.active.iter().position(|&idx| idx == handle.index) {
            self.active.swap_remove(i);
            self.park(handle.index);
            return true;
        }
        false
    }

    /// Park everything; used at session end
    pub fn retire_all(&mut self) -> usize {
        let count = self.active.len();
        while let Some(index) = self.active.pop() {
            self.park(index);
        }
        count
    }

    fn park(&mut self, index: u32) -> MemberHandle {
        let member = &mut self.members[index as usize];
        member.active = false;
        member.position = self.sentinel;
        self.inactive.push_back(index);
        MemberHandle {
            index,
            generation: member.generation,
        }
    }

    /// Live member for a handle, `None` once it has been retired or reused
    pub fn get(&self, handle: MemberHandle) -> Option<&PoolMember<K>> {
        self.members
            .get(handle.index as usize)
            .filter(|m| m.active && m.generation == handle.generation)
    }

    pub fn active_members(&self) -> impl Iterator<Item = (MemberHandle, &PoolMember<K>)> + '_ {
        self.active.iter().map(|&index| {
            let member = &self.members[index as usize];
            (
                MemberHandle {
                    index,
                    generation: member.generation,
                },
                member,
            )
        })
    }

    pub fn members(&self) -> &[PoolMember<K>] {
        &self.members
    }

    #[inline]
    pub fn label(&self) -> &'static str {
        self.label
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[inline]
    pub fn inactive_count(&self) -> usize {
        self.inactive.len()
    }

    #[inline]
    pub fn is_starved(&self) -> bool {
        self.inactive.is_empty()
    }
}
