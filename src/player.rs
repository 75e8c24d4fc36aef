//! The bird: integration, flap, idle wobble and flight animation.

use crate::config::Tunables;
use crate::geometry::{Rect, Vec2, ease_in_out};

/// Sprite size of the bird in world units.
pub const PLAYER_SIZE: Vec2 = Vec2::new(39.0, 29.0);
/// The collision outline is narrower than the sprite on the beak/tail side.
const HITBOX_INSET: Vec2 = Vec2::new(4.0, 0.0);

const WOBBLE_HEIGHT: f64 = 10.0;
const WOBBLE_HALF_PERIOD: f64 = 0.4;
pub const FLIGHT_FRAMES: usize = 4;
const FLIGHT_FRAME_TIME: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerBody {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Radians, counter-clockwise.
    pub rotation: f64,
}

#[derive(Debug, Clone)]
pub struct Player {
    pub body: PlayerBody,
    /// Rest height the wobble oscillates above.
    wobble_base: f64,
    wobble_clock: Option<f64>,
    flight_clock: Option<f64>,
}

impl Player {
    pub fn new(t: &Tunables) -> Self {
        let base = t.playable_height() * 0.4 + t.playable_start();
        Self {
            body: PlayerBody {
                position: Vec2::new(t.world_width * 0.2, base),
                velocity: Vec2::ZERO,
                rotation: 0.0,
            },
            wobble_base: base,
            wobble_clock: Some(0.0),
            flight_clock: Some(0.0),
        }
    }

    /// One step of gravity and velocity. The top of the world caps the
    /// position; the ground is left to contact detection.
    pub fn integrate(&mut self, gravity: f64, world_height: f64, dt: f64) {
        self.body.velocity += Vec2::new(0.0, gravity) * dt;
        self.body.position += self.body.velocity * dt;
        self.body.position.y = self.body.position.y.min(world_height);
    }

    pub fn flap(&mut self, flap_velocity: f64) {
        self.body.velocity = Vec2::new(0.0, flap_velocity);
    }

    /// Advances the idle and flight animations.
    pub fn animate(&mut self, dt: f64) {
        if let Some(clock) = self.wobble_clock.as_mut() {
            *clock += dt;
            let phase = *clock % (2.0 * WOBBLE_HALF_PERIOD);
            let lift = if phase < WOBBLE_HALF_PERIOD {
                ease_in_out(phase / WOBBLE_HALF_PERIOD)
            } else {
                1.0 - ease_in_out((phase - WOBBLE_HALF_PERIOD) / WOBBLE_HALF_PERIOD)
            };
            self.body.position.y = self.wobble_base + lift * WOBBLE_HEIGHT;
        }
        if let Some(clock) = self.flight_clock.as_mut() {
            *clock += dt;
        }
    }

    pub fn stop_wobble(&mut self) {
        self.wobble_clock = None;
    }

    pub fn is_wobbling(&self) -> bool {
        self.wobble_clock.is_some()
    }

    pub fn stop_all_animations(&mut self) {
        self.wobble_clock = None;
        self.flight_clock = None;
    }

    /// Wing frame of the flight animation; frame 0 once it has stopped.
    pub fn flight_frame(&self) -> usize {
        self.flight_clock
            .map(|c| (c / FLIGHT_FRAME_TIME) as usize % FLIGHT_FRAMES)
            .unwrap_or(0)
    }

    /// Lays the bird on its back on the ground line.
    pub fn crash_land(&mut self, ground_y: f64) {
        self.body.velocity = Vec2::ZERO;
        self.body.rotation = (-90.0_f64).to_radians();
        self.body.position.y = ground_y + PLAYER_SIZE.x / 2.0;
    }

    pub fn hitbox(&self) -> Rect {
        Rect::centered(self.body.position, PLAYER_SIZE, HITBOX_INSET)
    }
}
