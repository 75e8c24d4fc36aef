use crate::physics::{Category, Contact};
use log::debug;

/// What the player hit since the game loop last looked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollisionFlags {
    pub hit_ground: bool,
    pub hit_obstacle: bool,
}

impl CollisionFlags {
    /// Records one contact. Repeated contacts before the flags are consumed
    /// coalesce into the same flag.
    pub fn resolve(&mut self, contact: Contact) {
        match contact.other_than_player() {
            Some(Category::Ground) => {
                debug!("Hit ground");
                self.hit_ground = true;
            }
            Some(Category::Obstacle) => {
                debug!("Hit obstacle");
                self.hit_obstacle = true;
            }
            Some(Category::Player) | None => {}
        }
    }

    /// Reads and clears the ground flag.
    pub fn take_ground(&mut self) -> bool {
        std::mem::take(&mut self.hit_ground)
    }

    pub fn take_obstacle(&mut self) -> bool {
        std::mem::take(&mut self.hit_obstacle)
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
