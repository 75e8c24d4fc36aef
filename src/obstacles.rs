//! Obstacle pairs: placement, motion and removal.

use crate::config::Tunables;
use crate::geometry::{Rect, Vec2};
use crate::physics::BodyId;
use log::debug;
use rand::Rng;

/// Sprite size of one cactus in world units.
pub const OBSTACLE_SIZE: Vec2 = Vec2::new(54.0, 316.0);
const HITBOX_INSET: Vec2 = Vec2::new(2.5, 1.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Motion {
    /// Leftward speed in world units per second.
    pub speed: f64,
    /// Distance left to travel before the pair removes itself.
    pub remaining: f64,
}

/// A bottom and a top obstacle spawned, moved, scored and removed together.
#[derive(Debug, Clone, PartialEq)]
pub struct ObstaclePair {
    pub id: u64,
    /// Shared centre x of both sprites.
    pub x: f64,
    pub bottom_y: f64,
    pub top_y: f64,
    pub size: Vec2,
    pub passed: bool,
    pub motion: Option<Motion>,
}

impl ObstaclePair {
    pub fn trailing_edge(&self) -> f64 {
        self.x + self.size.x / 2.0
    }

    pub fn bottom_center(&self) -> Vec2 {
        Vec2::new(self.x, self.bottom_y)
    }

    pub fn top_center(&self) -> Vec2 {
        Vec2::new(self.x, self.top_y)
    }

    /// The vertical opening between the two sprites, as (low, high).
    pub fn gap(&self) -> (f64, f64) {
        (
            self.bottom_y + self.size.y / 2.0,
            self.top_y - self.size.y / 2.0,
        )
    }

    pub fn bodies(&self) -> [(BodyId, Rect); 2] {
        [
            (
                BodyId::Obstacle {
                    pair: self.id,
                    top: false,
                },
                Rect::centered(self.bottom_center(), self.size, HITBOX_INSET),
            ),
            (
                BodyId::Obstacle {
                    pair: self.id,
                    top: true,
                },
                Rect::centered(self.top_center(), self.size, HITBOX_INSET),
            ),
        ]
    }
}

#[derive(Debug, Default)]
pub struct ObstacleField {
    pairs: Vec<ObstaclePair>,
    next_id: u64,
}

impl ObstacleField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[ObstaclePair] {
        &self.pairs
    }

    pub fn pairs_mut(&mut self) -> &mut [ObstaclePair] {
        &mut self.pairs
    }

    /// Creates a pair just off the right edge, already moving.
    ///
    /// The bottom sprite's centre is drawn from a band expressed as fractions
    /// of the playable height; the top sprite sits one player-proportional gap
    /// above it.
    pub fn spawn<R: Rng>(
        &mut self,
        t: &Tunables,
        player_height: f64,
        rng: &mut R,
    ) -> &ObstaclePair {
        let size = OBSTACLE_SIZE;
        let start_x = t.world_width + size.x / 2.0;

        let midpoint_y = t.playable_start() - size.y / 2.0;
        let low = midpoint_y + t.playable_height() * t.bottom_obstacle_min_fraction;
        let high = midpoint_y + t.playable_height() * t.bottom_obstacle_max_fraction;
        let bottom_y = if high > low { rng.gen_range(low..=high) } else { low };

        let gap = t.gap_to_player_height_ratio * player_height;
        let top_y = bottom_y + size.y / 2.0 + gap + size.y / 2.0;

        let id = self.next_id;
        self.next_id += 1;
        debug!("Spawning obstacle pair {id} with gap at y={:.1}", bottom_y + size.y / 2.0);

        self.pairs.push(ObstaclePair {
            id,
            x: start_x,
            bottom_y,
            top_y,
            size,
            passed: false,
            motion: Some(Motion {
                speed: t.obstacle_speed,
                remaining: t.world_width + size.x,
            }),
        });
        &self.pairs[self.pairs.len() - 1]
    }

    /// Moves every pair that still has a motion; pairs that complete their
    /// travel are removed.
    pub fn advance(&mut self, dt: f64) {
        for pair in &mut self.pairs {
            travel(pair, dt);
        }
        self.remove_finished();
    }

    /// Moves only the most recent pair, to make up for a late spawn.
    pub fn advance_newest(&mut self, dt: f64) {
        if let Some(pair) = self.pairs.last_mut() {
            travel(pair, dt);
        }
        self.remove_finished();
    }

    fn remove_finished(&mut self) {
        self.pairs
            .retain(|p| !matches!(p.motion, Some(m) if m.remaining <= 0.0));
    }

    /// Freezes every live pair where it stands.
    pub fn halt_all(&mut self) {
        for pair in &mut self.pairs {
            pair.motion = None;
        }
    }

    pub fn is_moving(&self) -> bool {
        self.pairs.iter().any(|p| p.motion.is_some())
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, Rect)> + '_ {
        self.pairs.iter().flat_map(|p| p.bodies())
    }
}

fn travel(pair: &mut ObstaclePair, dt: f64) {
    if let Some(motion) = pair.motion.as_mut() {
        let step = (motion.speed * dt).min(motion.remaining);
        pair.x -= step;
        motion.remaining -= step;
    }
}
