//! Contact host: category-tagged bodies and begin-contact detection.
//!
//! Stands in for a physics engine. It only answers "which bodies started
//! touching the player this step" and reports each as an unordered
//! [`Contact`]; it never moves anything.

use crate::geometry::Rect;
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Player,
    Obstacle,
    Ground,
}

/// Two bodies that began touching. Order carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Contact {
    pub a: Category,
    pub b: Category,
}

impl Contact {
    pub fn new(a: Category, b: Category) -> Self {
        Self { a, b }
    }

    /// The member that isn't the player, if the player is involved at all.
    pub fn other_than_player(&self) -> Option<Category> {
        match (self.a, self.b) {
            (Category::Player, other) => Some(other),
            (other, Category::Player) => Some(other),
            _ => None,
        }
    }
}

/// Identity of a body the player can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BodyId {
    Ground,
    Obstacle { pair: u64, top: bool },
}

impl BodyId {
    pub fn category(&self) -> Category {
        match self {
            BodyId::Ground => Category::Ground,
            BodyId::Obstacle { .. } => Category::Obstacle,
        }
    }
}

#[derive(Debug, Default)]
pub struct ContactDetector {
    touching: HashSet<BodyId>,
}

impl ContactDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tests the player against the ground line and every obstacle box and
    /// returns the contacts that began since the previous step.
    pub fn step(
        &mut self,
        player: Rect,
        ground_y: f64,
        obstacles: impl IntoIterator<Item = (BodyId, Rect)>,
    ) -> Vec<Contact> {
        let mut now = HashSet::new();
        if player.min.y <= ground_y {
            now.insert(BodyId::Ground);
        }
        for (id, rect) in obstacles {
            if player.overlaps(&rect) {
                now.insert(id);
            }
        }

        let began: Vec<Contact> = now
            .difference(&self.touching)
            .map(|id| {
                debug!("Contact began with {id:?}");
                Contact::new(Category::Player, id.category())
            })
            .collect();
        self.touching = now;
        began
    }

    pub fn reset(&mut self) {
        self.touching.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Vec2;

    fn player_at(y: f64) -> Rect {
        Rect::centered(Vec2::new(50.0, y), Vec2::new(20.0, 20.0), Vec2::ZERO)
    }

    #[test]
    fn test_other_than_player_is_order_free() {
        let c1 = Contact::new(Category::Player, Category::Ground);
        let c2 = Contact::new(Category::Obstacle, Category::Player);
        assert_eq!(c1.other_than_player(), Some(Category::Ground));
        assert_eq!(c2.other_than_player(), Some(Category::Obstacle));
        assert_eq!(
            Contact::new(Category::Ground, Category::Obstacle).other_than_player(),
            None
        );
    }

    #[test]
    fn test_ground_contact_reported_once() {
        let mut d = ContactDetector::new();
        assert!(d.step(player_at(100.0), 80.0, []).is_empty());
        let began = d.step(player_at(85.0), 80.0, []);
        assert_eq!(began, vec![Contact::new(Category::Player, Category::Ground)]);
        assert!(d.step(player_at(84.0), 80.0, []).is_empty());
    }

    #[test]
    fn test_each_obstacle_sprite_is_its_own_body() {
        let mut d = ContactDetector::new();
        let bottom = Rect::centered(Vec2::new(50.0, 60.0), Vec2::new(10.0, 100.0), Vec2::ZERO);
        let top = Rect::centered(Vec2::new(55.0, 140.0), Vec2::new(10.0, 100.0), Vec2::ZERO);
        let id = |top| BodyId::Obstacle { pair: 1, top };
        let bodies = [(id(false), bottom), (id(true), top)];
        let began = d.step(player_at(100.0), 0.0, bodies);
        assert_eq!(began.len(), 2);
        assert!(began.iter().all(|c| c.other_than_player() == Some(Category::Obstacle)));
    }
}
