//! Flappy Felipe: a tap-to-flap game with a frame-driven state machine and a
//! half-block terminal front end.

pub mod actions;
pub mod audio;
pub mod collision;
pub mod config;
pub mod effects;
pub mod error;
pub mod game;
pub mod geometry;
pub mod obstacles;
pub mod physics;
pub mod player;
pub mod render;
pub mod score;

pub use error::{FlappyError, Result};
pub use game::{Game, GameState, TapOutcome};
