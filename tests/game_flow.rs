use flappy_felipe::{
    Game, GameState, TapOutcome,
    audio::Sound,
    config::Tunables,
    geometry::Vec2,
    physics::{Category, Contact},
    score::{BEST_SCORE_KEY, MemoryStore, ScoreStore},
};

// Powers of two keep the virtual clock exact.
const DT: f64 = 1.0 / 32.0;

/// No gravity and a wide gap parked around the bird: it cruises through
/// every pair untouched.
fn cruising() -> Tunables {
    Tunables {
        gravity: 0.0,
        flap_velocity: 0.0,
        bottom_obstacle_min_fraction: 0.2,
        bottom_obstacle_max_fraction: 0.2,
        gap_to_player_height_ratio: 10.0,
        ..Tunables::default()
    }
}

fn tap_left(g: &mut Game) -> TapOutcome {
    let at = Vec2::new(g.tunables().world_width * 0.25, 200.0);
    g.tap(at)
}

/// Ticks `seconds` of frames, returning the tick at which each new pair
/// showed up.
fn run(g: &mut Game, seconds: f64, spawned_at: &mut Vec<u64>, tick: &mut u64) {
    let frames = (seconds / DT).round() as u64;
    for _ in 0..frames {
        let before = g.obstacles().pairs().iter().map(|p| p.id).max();
        g.update(DT);
        *tick += 1;
        let after = g.obstacles().pairs().iter().map(|p| p.id).max();
        if after.is_some() && after != before {
            spawned_at.push(*tick);
        }
    }
}

#[test]
fn spawns_on_schedule_and_scores_each_pair_once() {
    let mut g = Game::with_seed(cruising(), Box::new(MemoryStore::new()), 7);
    assert_eq!(tap_left(&mut g), TapOutcome::Started);

    let (mut spawned_at, mut tick) = (Vec::new(), 0);
    run(&mut g, 6.0, &mut spawned_at, &mut tick);

    // 0.5s, then every 2s
    assert_eq!(spawned_at, vec![16, 80, 144]);
    assert_eq!(g.state(), GameState::Play);
    assert_eq!(g.score(), 3);
    let coins = g.drain_sounds().iter().filter(|s| **s == Sound::Coin).count();
    assert_eq!(coins, 3);
}

#[test]
fn fresh_pair_enters_just_off_the_right_edge() {
    let mut g = Game::with_seed(cruising(), Box::new(MemoryStore::new()), 3);
    tap_left(&mut g);
    for _ in 0..16 {
        g.update(DT);
    }
    let pairs = g.obstacles().pairs();
    assert_eq!(pairs.len(), 1);
    let t = g.tunables();
    assert_eq!(pairs[0].x, t.world_width + pairs[0].size.x / 2.0);

    // top and bottom share one spawn and one x
    let (gap_low, gap_high) = pairs[0].gap();
    assert!((gap_high - gap_low - t.gap_to_player_height_ratio * 29.0).abs() < 1e-9);
    assert_eq!(pairs[0].top_center().x, pairs[0].bottom_center().x);
}

#[test]
fn crash_stops_spawning_for_good() {
    let mut g = Game::with_seed(cruising(), Box::new(MemoryStore::new()), 5);
    tap_left(&mut g);
    let (mut spawned_at, mut tick) = (Vec::new(), 0);
    run(&mut g, 1.0, &mut spawned_at, &mut tick);
    assert_eq!(spawned_at.len(), 1);

    g.contact(Contact::new(Category::Obstacle, Category::Player));
    g.update(DT);
    assert_eq!(g.state(), GameState::Falling);
    assert!(!g.is_spawning());

    let frozen: Vec<f64> = g.obstacles().pairs().iter().map(|p| p.x).collect();
    run(&mut g, 10.0, &mut spawned_at, &mut tick);
    assert_eq!(spawned_at.len(), 1);
    let now: Vec<f64> = g.obstacles().pairs().iter().map(|p| p.x).collect();
    assert_eq!(now, frozen);

    // taps do nothing while falling
    assert_eq!(tap_left(&mut g), TapOutcome::Ignored);
    g.contact(Contact::new(Category::Ground, Category::Player));
    g.update(DT);
    assert_eq!(g.state(), GameState::ShowingScore);
}

#[test]
fn obstacle_in_the_way_knocks_the_bird_down() {
    let t = Tunables {
        // bottom obstacle tops out above the bird
        bottom_obstacle_min_fraction: 0.5,
        bottom_obstacle_max_fraction: 0.5,
        ..cruising()
    };
    let mut g = Game::with_seed(t, Box::new(MemoryStore::new()), 1);
    tap_left(&mut g);
    g.drain_sounds();

    let mut frames = 0;
    while g.state() == GameState::Play && frames < 200 {
        g.update(DT);
        frames += 1;
    }
    assert_eq!(g.state(), GameState::Falling);
    assert_eq!(g.score(), 0);
    assert!(g.effects().is_flashing());
    assert!(!g.obstacles().is_moving());
    assert_eq!(g.drain_sounds(), vec![Sound::Whack]);
}

#[test]
fn unflapped_bird_lands_and_session_ends() {
    let t = Tunables {
        first_spawn_delay: 30.0,
        ..Tunables::default()
    };
    let mut store = MemoryStore::new();
    store.set_integer(BEST_SCORE_KEY, 4).unwrap();
    let mut g = Game::with_seed(t, Box::new(store), 9);
    tap_left(&mut g);

    // gravity acts every frame
    let v0 = g.player().body.velocity.y;
    g.update(DT);
    let expected = v0 + g.tunables().gravity * DT;
    assert!((g.player().body.velocity.y - expected).abs() < 1e-9);

    let mut frames = 0;
    while g.state() == GameState::Play && frames < 320 {
        g.update(DT);
        frames += 1;
    }
    assert_eq!(g.state(), GameState::ShowingScore);
    assert_eq!(g.player().body.velocity, Vec2::ZERO);
    let card = g.effects().scorecard().expect("scorecard shown");
    assert_eq!((card.score, card.best), (0, 4));
    assert!(g.drain_sounds().contains(&Sound::HitGround));

    for _ in 0..32 {
        g.update(DT);
    }
    assert_eq!(g.state(), GameState::GameOver);

    let share = Vec2::new(g.tunables().world_width * 0.9, 100.0);
    assert_eq!(g.tap(share), TapOutcome::Share);
    assert_eq!(tap_left(&mut g), TapOutcome::NewGame);
    assert_eq!(g.state(), GameState::MainMenu);

    // and round we go again
    assert_eq!(tap_left(&mut g), TapOutcome::Started);
    assert_eq!(g.state(), GameState::Play);
}
