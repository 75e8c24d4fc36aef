use crossterm::{
    cursor,
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers,
        MouseButton, MouseEventKind,
    },
    execute, terminal,
};
use flappy_felipe::{
    Game,
    audio::Audio,
    config::{GamePaths, Tunables},
    geometry::Vec2,
    render::{self, PixelBuf, View},
    score::{JsonFileStore, MemoryStore, ScoreStore},
};
use log::{debug, info, warn};
use std::fs::File;
use std::io::{self, Write, stdout};
use std::time::{Duration, Instant};

// ── Setup ───────────────────────────────────────────────────────────────────

/// stdout is the game screen, so logs go to a file or nowhere.
fn init_logging(paths: Option<&GamePaths>) {
    let Some(paths) = paths else {
        return;
    };
    let Ok(file) = File::create(paths.log_file()) else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().filter_or("FLAPPY_LOG", "info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

fn open_store(paths: Option<&GamePaths>) -> Box<dyn ScoreStore> {
    let Some(paths) = paths else {
        return Box::new(MemoryStore::new());
    };
    match JsonFileStore::open(paths.scores_file()) {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("Best score won't be saved: {e}");
            Box::new(MemoryStore::new())
        }
    }
}

// ── Input ───────────────────────────────────────────────────────────────────

enum Input {
    Tap(Vec2),
    Quit,
    Resize(usize, usize),
}

fn read_input(ev: Event, view: &View, t: &Tunables) -> Option<Input> {
    // Keyboard taps land on the left ("OK") or right ("share") half
    let ok_side = Vec2::new(t.world_width * 0.5, t.world_height * 0.5);
    let share_side = Vec2::new(t.world_width * 0.8, t.world_height * 0.5);
    match ev {
        Event::Key(key) if key.kind != KeyEventKind::Release => match key.code {
            KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Input::Quit)
            }
            KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter | KeyCode::Left => {
                Some(Input::Tap(ok_side))
            }
            KeyCode::Right | KeyCode::Char('s') => Some(Input::Tap(share_side)),
            _ => None,
        },
        Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
            // Each terminal row holds two pixel rows; aim at the middle
            let at = view.to_world(m.column as f64, m.row as f64 * 2.0 + 1.0);
            Some(Input::Tap(at))
        }
        Event::Resize(c, r) => Some(Input::Resize(c as usize, r as usize * 2)),
        _ => None,
    }
}

// ── Main ────────────────────────────────────────────────────────────────────

fn run(out: &mut io::Stdout, game: &mut Game, audio: &Audio) -> anyhow::Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::new(cols as usize, rows as usize * 2);
    let frame_dur = Duration::from_millis(game.tunables().frame_millis);
    let max_dt = game.tunables().max_frame_dt;
    let mut last_frame: Option<Instant> = None;

    loop {
        let frame_start = Instant::now();
        let view = View::fit(buf.width(), buf.height(), game.tunables());

        // Input
        while event::poll(Duration::ZERO)? {
            match read_input(event::read()?, &view, game.tunables()) {
                Some(Input::Quit) => return Ok(()),
                Some(Input::Tap(at)) => {
                    let outcome = game.tap(at);
                    debug!("Tap at ({:.0}, {:.0}): {outcome:?}", at.x, at.y);
                }
                Some(Input::Resize(w, h)) => buf.resize(w, h),
                None => {}
            }
        }

        // Update; the first frame has no elapsed time
        let dt = last_frame.map_or(0.0, |t| t.elapsed().as_secs_f64().min(max_dt));
        last_frame = Some(frame_start);
        game.update(dt);
        for sound in game.drain_sounds() {
            audio.play(sound);
        }

        // Render
        render::draw(game, &mut buf);
        buf.render(out)?;

        // Frame pacing
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            std::thread::sleep(frame_dur - elapsed);
        }
    }
}

fn main() -> anyhow::Result<()> {
    let paths = match GamePaths::discover() {
        Ok(paths) => Some(paths),
        Err(e) => {
            eprintln!("flappy-felipe: {e}; running without config, log or saved scores");
            None
        }
    };
    init_logging(paths.as_ref());

    let tunables = match &paths {
        Some(p) => Tunables::load_or_default(&p.config_file()),
        None => Tunables::default(),
    };
    let mut game = Game::new(tunables, open_store(paths.as_ref()));
    let audio = Audio::open();
    info!("Starting");

    terminal::enable_raw_mode()?;
    let mut out = stdout();
    let result = execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
    .map_err(anyhow::Error::from)
    .and_then(|()| run(&mut out, &mut game, &audio));
    let restored = restore_terminal(&mut out, terminal::disable_raw_mode);

    info!("Exiting with score {}", game.score());
    result?;
    restored?;
    Ok(())
}

/// Undoes the terminal setup. Every step runs even if an earlier one fails;
/// the first error is returned.
fn restore_terminal(
    out: &mut impl Write,
    disable_raw_mode: impl FnOnce() -> io::Result<()>,
) -> io::Result<()> {
    let screen = execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    );
    let raw = disable_raw_mode();
    let flushed = out.flush();
    screen.and(raw).and(flushed)
}
