//! The game state machine: one frame tick, taps and contacts in; state,
//! world and sound cues out.

use crate::actions::{Fired, Scheduler, Sequence, Step};
use crate::audio::Sound;
use crate::collision::CollisionFlags;
use crate::config::Tunables;
use crate::effects::Effects;
use crate::geometry::Vec2;
use crate::obstacles::ObstacleField;
use crate::physics::{Contact, ContactDetector};
use crate::player::{PLAYER_SIZE, Player};
use crate::score::{ScoreStore, ScoreTracker};
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;

const SPAWN_KEY: &str = "spawn";
const CRASH_SOUNDS_KEY: &str = "crash-sounds";
const SCORECARD_KEY: &str = "scorecard";

/// Taps right of this fraction of the width hit "share" on the scorecard.
pub const SHARE_THRESHOLD: f64 = 0.6;
const NEW_GAME_FADE: f64 = 0.5;
const CRASH_SOUND_GAP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameState {
    MainMenu,
    Play,
    Falling,
    ShowingScore,
    GameOver,
}

/// What a scheduled task asks the game to do when it comes due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    SpawnObstacle,
    Sound(Sound),
    GameOver,
}

/// How a tap was interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    Started,
    Flapped,
    NewGame,
    /// The share button; sharing itself happens outside the game.
    Share,
    Ignored,
}

pub struct Game {
    tunables: Tunables,
    store: Box<dyn ScoreStore>,
    rng: StdRng,
    state: GameState,
    player: Player,
    obstacles: ObstacleField,
    score: ScoreTracker,
    flags: CollisionFlags,
    scheduler: Scheduler<Cue>,
    contacts: ContactDetector,
    effects: Effects,
    sounds: Vec<Sound>,
    ground_offset: f64,
}

impl Game {
    pub fn new(tunables: Tunables, store: Box<dyn ScoreStore>) -> Self {
        Self::with_rng(tunables, store, StdRng::from_entropy())
    }

    /// A game whose obstacle placement is reproducible.
    pub fn with_seed(tunables: Tunables, store: Box<dyn ScoreStore>, seed: u64) -> Self {
        Self::with_rng(tunables, store, StdRng::seed_from_u64(seed))
    }

    fn with_rng(tunables: Tunables, store: Box<dyn ScoreStore>, rng: StdRng) -> Self {
        let player = Player::new(&tunables);
        Self {
            tunables,
            store,
            rng,
            state: GameState::MainMenu,
            player,
            obstacles: ObstacleField::new(),
            score: ScoreTracker::new(),
            flags: CollisionFlags::default(),
            scheduler: Scheduler::new(),
            contacts: ContactDetector::new(),
            effects: Effects::default(),
            sounds: Vec::new(),
            ground_offset: 0.0,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn score(&self) -> u32 {
        self.score.score()
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn obstacles(&self) -> &ObstacleField {
        &self.obstacles
    }

    pub fn flags(&self) -> CollisionFlags {
        self.flags
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Scroll position of the ground strip, in [0, world width).
    pub fn ground_offset(&self) -> f64 {
        self.ground_offset
    }

    pub fn is_spawning(&self) -> bool {
        self.scheduler.is_running(SPAWN_KEY)
    }

    /// Sounds cued since the last call, oldest first.
    pub fn drain_sounds(&mut self) -> Vec<Sound> {
        std::mem::take(&mut self.sounds)
    }

    // ── Input ───────────────────────────────────────────────────────────────

    /// A tap at a world-space point.
    pub fn tap(&mut self, at: Vec2) -> TapOutcome {
        match self.state {
            GameState::MainMenu => {
                self.switch_to_play();
                TapOutcome::Started
            }
            GameState::Play => {
                self.flap();
                TapOutcome::Flapped
            }
            GameState::Falling | GameState::ShowingScore => TapOutcome::Ignored,
            GameState::GameOver => {
                if at.x > self.tunables.world_width * SHARE_THRESHOLD {
                    info!("Share requested with score {}", self.score.score());
                    TapOutcome::Share
                } else {
                    self.switch_to_new_game();
                    TapOutcome::NewGame
                }
            }
        }
    }

    /// A contact reported by the physics host. Takes effect on the next
    /// frame's dispatch.
    pub fn contact(&mut self, contact: Contact) {
        self.flags.resolve(contact);
    }

    // ── Frame ───────────────────────────────────────────────────────────────

    pub fn update(&mut self, dt: f64) {
        let dt = dt.max(0.0);

        self.effects.advance(dt);
        self.player.animate(dt);
        // sequences started by this frame's transitions begin timing next frame
        let checkpoint = self.scheduler.checkpoint();

        match self.state {
            GameState::MainMenu | GameState::ShowingScore | GameState::GameOver => {
                // nothing consumes contacts here
                self.flags.clear();
            }
            GameState::Play => {
                self.update_player(dt);
                self.update_ground(dt);
                if !self.check_hit_ground() && !self.check_hit_obstacle() {
                    self.update_score();
                }
            }
            GameState::Falling => {
                self.update_player(dt);
                self.check_hit_ground();
                self.flags.hit_obstacle = false;
            }
        }

        self.obstacles.advance(dt);
        for fired in self.scheduler.advance_since(checkpoint, dt) {
            self.handle_cue(fired);
        }

        let began = self.contacts.step(
            self.player.hitbox(),
            self.tunables.playable_start(),
            self.obstacles.bodies(),
        );
        for contact in began {
            self.contact(contact);
        }
    }

    fn update_player(&mut self, dt: f64) {
        self.player
            .integrate(self.tunables.gravity, self.tunables.world_height, dt);
    }

    fn update_ground(&mut self, dt: f64) {
        let width = self.tunables.world_width;
        self.ground_offset = (self.ground_offset + self.tunables.obstacle_speed * dt) % width;
    }

    fn check_hit_ground(&mut self) -> bool {
        if !self.flags.take_ground() {
            return false;
        }
        self.player.crash_land(self.tunables.playable_start());
        self.sounds.push(Sound::HitGround);
        self.switch_to_showing_score();
        true
    }

    fn check_hit_obstacle(&mut self) -> bool {
        if !self.flags.take_obstacle() {
            return false;
        }
        self.switch_to_falling();
        true
    }

    fn update_score(&mut self) {
        let player_x = self.player.body.position.x;
        let scored = self.score.update(player_x, self.obstacles.pairs_mut());
        for _ in 0..scored {
            self.sounds.push(Sound::Coin);
        }
    }

    fn handle_cue(&mut self, fired: Fired<Cue>) {
        match fired.cue {
            Cue::SpawnObstacle => {
                self.obstacles
                    .spawn(&self.tunables, PLAYER_SIZE.y, &mut self.rng);
                self.obstacles.advance_newest(fired.late_by);
            }
            Cue::Sound(sound) => self.sounds.push(sound),
            Cue::GameOver => {
                if self.state == GameState::ShowingScore {
                    self.set_state(GameState::GameOver);
                }
            }
        }
    }

    // ── Transitions ─────────────────────────────────────────────────────────

    fn set_state(&mut self, next: GameState) {
        info!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn flap(&mut self) {
        self.player.flap(self.tunables.flap_velocity);
        self.sounds.push(Sound::Flap);
    }

    fn start_spawning(&mut self) {
        let t = &self.tunables;
        let spawn = Sequence::forever(
            vec![Step::Wait(t.first_spawn_delay)],
            vec![Step::Emit(Cue::SpawnObstacle), Step::Wait(t.every_spawn_delay)],
        );
        self.scheduler.run(SPAWN_KEY, spawn);
    }

    /// Cancels the spawn timer and freezes every live obstacle.
    fn stop_spawning(&mut self) {
        self.scheduler.remove(SPAWN_KEY);
        self.obstacles.halt_all();
        debug!("Spawning stopped with {} pairs live", self.obstacles.pairs().len());
    }

    fn switch_to_play(&mut self) {
        self.set_state(GameState::Play);
        self.player.stop_wobble();
        self.flags.clear();
        self.start_spawning();
        // a free flap so the bird doesn't drop straight away
        self.flap();
    }

    fn switch_to_falling(&mut self) {
        self.set_state(GameState::Falling);
        self.effects.start_shake();
        self.effects.start_flash();
        self.scheduler.run(
            CRASH_SOUNDS_KEY,
            Sequence::once(vec![
                Step::Emit(Cue::Sound(Sound::Whack)),
                Step::Wait(CRASH_SOUND_GAP),
                Step::Emit(Cue::Sound(Sound::Falling)),
            ]),
        );
        self.player.stop_all_animations();
        self.stop_spawning();
    }

    fn switch_to_showing_score(&mut self) {
        self.set_state(GameState::ShowingScore);
        self.player.stop_all_animations();
        self.stop_spawning();

        let best = self.score.record_best(self.store.as_mut());
        let step = self.tunables.animation_delay;
        self.effects.show_scorecard(self.score.score(), best, step);

        let pop = Cue::Sound(Sound::Pop);
        self.scheduler.run(
            SCORECARD_KEY,
            Sequence::once(vec![
                Step::Wait(step),
                Step::Emit(pop),
                Step::Wait(step),
                Step::Emit(pop),
                Step::Wait(step),
                Step::Emit(pop),
                Step::Emit(Cue::GameOver),
            ]),
        );
    }

    fn switch_to_new_game(&mut self) {
        self.set_state(GameState::MainMenu);
        self.scheduler.clear();
        self.obstacles.clear();
        self.contacts.reset();
        self.flags.clear();
        self.score.reset();
        self.player = Player::new(&self.tunables);
        self.ground_offset = 0.0;
        self.effects = Effects::default();
        self.effects.start_fade(NEW_GAME_FADE);
        self.sounds.push(Sound::Pop);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::Category;
    use crate::score::{BEST_SCORE_KEY, MemoryStore};

    const DT: f64 = 1.0 / 32.0;

    fn game() -> Game {
        Game::with_seed(Tunables::default(), Box::new(MemoryStore::new()), 11)
    }

    fn left_tap(g: &Game) -> Vec2 {
        Vec2::new(g.tunables().world_width * 0.25, 100.0)
    }

    fn ground() -> Contact {
        Contact::new(Category::Player, Category::Ground)
    }

    fn obstacle() -> Contact {
        Contact::new(Category::Obstacle, Category::Player)
    }

    #[test]
    fn test_starts_in_main_menu_idle() {
        let mut g = game();
        g.update(1.0);
        assert_eq!(g.state(), GameState::MainMenu);
        assert!(g.obstacles().pairs().is_empty());
        assert!(!g.is_spawning());
        assert!(g.player().is_wobbling());
    }

    #[test]
    fn test_tap_starts_play_and_spawning() {
        let mut g = game();
        assert_eq!(g.tap(left_tap(&g)), TapOutcome::Started);
        assert_eq!(g.state(), GameState::Play);
        assert!(g.is_spawning());
        assert!(!g.player().is_wobbling());
        assert_eq!(g.player().body.velocity.y, g.tunables().flap_velocity);
    }

    #[test]
    fn test_flap_in_play_resets_velocity() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.update(DT);
        g.update(DT);
        assert!(g.player().body.velocity.y < g.tunables().flap_velocity);
        assert_eq!(g.tap(left_tap(&g)), TapOutcome::Flapped);
        assert_eq!(g.player().body.velocity.y, g.tunables().flap_velocity);
    }

    #[test]
    fn test_contact_is_seen_on_next_frame() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.contact(obstacle());
        assert_eq!(g.state(), GameState::Play);
        g.update(DT);
        assert_eq!(g.state(), GameState::Falling);
        assert!(!g.flags().hit_obstacle);
    }

    #[test]
    fn test_falling_halts_spawning_and_motion() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.update(0.5);
        assert_eq!(g.obstacles().pairs().len(), 1);
        g.contact(obstacle());
        g.update(DT);
        assert_eq!(g.state(), GameState::Falling);
        assert!(!g.is_spawning());
        assert!(!g.obstacles().is_moving());
        assert!(g.effects().is_flashing());

        let x = g.obstacles().pairs()[0].x;
        g.update(DT);
        assert_eq!(g.obstacles().pairs()[0].x, x);
    }

    #[test]
    fn test_crash_sounds_are_sequenced() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.drain_sounds();
        g.contact(obstacle());
        g.update(DT);
        assert_eq!(g.drain_sounds(), vec![Sound::Whack]);
        g.update(0.05);
        assert!(g.drain_sounds().is_empty());
        g.update(0.05);
        assert_eq!(g.drain_sounds(), vec![Sound::Falling]);
    }

    #[test]
    fn test_ground_then_scorecard_then_game_over() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.contact(ground());
        g.update(DT);
        assert_eq!(g.state(), GameState::ShowingScore);
        assert_eq!(g.player().body.velocity, Vec2::ZERO);
        assert!(g.effects().scorecard().is_some());

        // taps are ignored while the card is revealed
        assert_eq!(g.tap(left_tap(&g)), TapOutcome::Ignored);

        g.update(0.5);
        assert_eq!(g.state(), GameState::ShowingScore);
        g.update(0.4);
        assert_eq!(g.state(), GameState::GameOver);
        let pops = g.drain_sounds().iter().filter(|s| **s == Sound::Pop).count();
        assert_eq!(pops, 3);
    }

    #[test]
    fn test_scorecard_reveal_times_from_the_frame_after_entry() {
        let tick = 1.0 / 8.0;
        let mut g = game();
        g.tap(left_tap(&g));
        g.contact(ground());
        g.update(tick);
        assert_eq!(g.state(), GameState::ShowingScore);
        g.drain_sounds();

        let mut elapsed = 0.0;
        let mut first_pop = None;
        while g.state() == GameState::ShowingScore && elapsed < 5.0 {
            g.update(tick);
            elapsed += tick;
            if first_pop.is_none() && g.drain_sounds().contains(&Sound::Pop) {
                first_pop = Some(elapsed);
            }
        }
        assert_eq!(g.state(), GameState::GameOver);
        assert!(elapsed >= 0.9, "game over after {elapsed}s");
        assert!(first_pop.is_some_and(|t| t >= 0.3), "first pop at {first_pop:?}");
    }

    #[test]
    fn test_ground_in_play_halts_live_pairs() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.update(0.5);
        assert_eq!(g.obstacles().pairs().len(), 1);

        g.contact(ground());
        g.update(DT);
        assert_eq!(g.state(), GameState::ShowingScore);
        assert!(!g.is_spawning());
        assert!(!g.obstacles().is_moving());

        let frozen: Vec<f64> = g.obstacles().pairs().iter().map(|p| p.x).collect();
        for _ in 0..16 {
            g.update(DT);
        }
        let now: Vec<f64> = g.obstacles().pairs().iter().map(|p| p.x).collect();
        assert_eq!(now, frozen);
    }

    #[test]
    fn test_ground_wins_over_obstacle_in_same_frame() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.contact(obstacle());
        g.contact(ground());
        g.update(DT);
        assert_eq!(g.state(), GameState::ShowingScore);
        g.update(DT);
        assert_eq!(g.state(), GameState::ShowingScore);
    }

    #[test]
    fn test_game_over_taps() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.contact(ground());
        g.update(DT);
        g.update(1.0);
        assert_eq!(g.state(), GameState::GameOver);

        let right = Vec2::new(g.tunables().world_width * 0.8, 100.0);
        assert_eq!(g.tap(right), TapOutcome::Share);
        assert_eq!(g.state(), GameState::GameOver);

        let edge = Vec2::new(g.tunables().world_width * SHARE_THRESHOLD, 100.0);
        assert_eq!(g.tap(edge), TapOutcome::NewGame);
        assert_eq!(g.state(), GameState::MainMenu);
        assert_eq!(g.score(), 0);
        assert!(g.obstacles().pairs().is_empty());
        assert!(g.player().is_wobbling());
        assert!(g.effects().fade_level() > 0.0);
        assert!(g.effects().scorecard().is_none());
    }

    #[test]
    fn test_best_score_written_when_beaten() {
        let mut g = game();
        g.tap(left_tap(&g));
        g.obstacles
            .spawn(&Tunables::default(), PLAYER_SIZE.y, &mut g.rng);
        g.obstacles.pairs_mut()[0].x = 0.0;
        g.update(DT);
        assert_eq!(g.score(), 1);
        assert!(g.drain_sounds().contains(&Sound::Coin));

        g.contact(ground());
        g.update(DT);
        let card = g.effects().scorecard().unwrap();
        assert_eq!((card.score, card.best), (1, 1));
        assert_eq!(g.store.integer(BEST_SCORE_KEY), 1);
    }

    #[test]
    fn test_best_score_kept_when_not_beaten() {
        let mut store = MemoryStore::new();
        store.set_integer(BEST_SCORE_KEY, 5).unwrap();
        let mut g = Game::with_seed(Tunables::default(), Box::new(store), 2);
        g.tap(left_tap(&g));
        g.contact(ground());
        g.update(DT);
        let card = g.effects().scorecard().unwrap();
        assert_eq!((card.score, card.best), (0, 5));
        assert_eq!(g.store.integer(BEST_SCORE_KEY), 5);
    }

    #[test]
    fn test_idle_states_discard_contacts() {
        let mut g = game();
        g.contact(ground());
        g.update(DT);
        assert_eq!(g.flags(), CollisionFlags::default());
        g.tap(left_tap(&g));
        g.update(DT);
        assert_eq!(g.state(), GameState::Play);
    }
}
