use fundsp::prelude::*;
use log::{debug, warn};
use rodio::{OutputStream, OutputStreamBuilder, Sink, buffer::SamplesBuffer};
use std::collections::HashMap;

const SAMPLE_RATE: u32 = 44_100;

/// The game's sound effects, all fire-and-forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sound {
    Flap,
    Coin,
    Whack,
    Falling,
    HitGround,
    Pop,
}

impl Sound {
    pub const ALL: [Sound; 6] = [
        Sound::Flap,
        Sound::Coin,
        Sound::Whack,
        Sound::Falling,
        Sound::HitGround,
        Sound::Pop,
    ];
}

// ── Synthesis ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy)]
enum Wave {
    Sine,
    Saw,
    Square,
}

/// A single swept oscillator with a linear fade-out.
#[derive(Clone, Copy)]
struct Voice {
    wave: Wave,
    from_hz: f32,
    to_hz: f32,
    sweep: f32,
    gain: f32,
    duration: f32,
}

#[rustfmt::skip]
fn voice(sound: Sound) -> Voice {
    match sound {
        Sound::Flap => Voice { wave: Wave::Sine, from_hz: 520.0, to_hz: 860.0, sweep: 0.08, gain: 0.10, duration: 0.09 },
        Sound::Coin => Voice { wave: Wave::Square, from_hz: 988.0, to_hz: 1319.0, sweep: 0.06, gain: 0.07, duration: 0.25 },
        Sound::Whack => Voice { wave: Wave::Saw, from_hz: 180.0, to_hz: 60.0, sweep: 0.08, gain: 0.25, duration: 0.12 },
        // 400Hz down to 80Hz over 0.4s, fading over 0.5s
        Sound::Falling => Voice { wave: Wave::Saw, from_hz: 400.0, to_hz: 80.0, sweep: 0.4, gain: 0.15, duration: 0.5 },
        Sound::HitGround => Voice { wave: Wave::Sine, from_hz: 120.0, to_hz: 40.0, sweep: 0.2, gain: 0.3, duration: 0.25 },
        Sound::Pop => Voice { wave: Wave::Sine, from_hz: 300.0, to_hz: 900.0, sweep: 0.05, gain: 0.15, duration: 0.07 },
    }
}

fn ramp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

fn render(v: Voice) -> Vec<f32> {
    let Voice { wave, from_hz, to_hz, sweep, gain, duration } = v;
    let freq = lfo(move |t: f32| ramp(from_hz, to_hz, t / sweep));
    let level = lfo(move |t: f32| ramp(gain, 0.0, t / duration));

    let mut unit: Box<dyn AudioUnit> = match wave {
        Wave::Sine => Box::new((freq >> sine::<f32>()) * level),
        Wave::Saw => Box::new((freq >> saw()) * level),
        Wave::Square => Box::new((freq >> square()) * level),
    };
    unit.set_sample_rate(SAMPLE_RATE as f64);

    let n = (duration * SAMPLE_RATE as f32) as usize;
    (0..n).map(|_| unit.get_mono()).collect()
}

// ── Playback ────────────────────────────────────────────────────────────────

/// Plays effects on the default output device. Without one, every call is a
/// silent no-op.
pub struct Audio {
    stream: Option<OutputStream>,
    samples: HashMap<Sound, Vec<f32>>,
}

impl Audio {
    pub fn open() -> Self {
        let stream = match OutputStreamBuilder::open_default_stream() {
            Ok(mut stream) => {
                // stderr is the terminal we draw on
                stream.log_on_drop(false);
                Some(stream)
            }
            Err(e) => {
                warn!("No audio output, playing silently: {e}");
                None
            }
        };
        let samples = if stream.is_some() {
            Sound::ALL.iter().map(|&s| (s, render(voice(s)))).collect()
        } else {
            HashMap::new()
        };
        Self { stream, samples }
    }

    pub fn silent() -> Self {
        Self {
            stream: None,
            samples: HashMap::new(),
        }
    }

    pub fn play(&self, sound: Sound) {
        let Some(stream) = &self.stream else {
            return;
        };
        let Some(samples) = self.samples.get(&sound) else {
            warn!("No samples for {sound:?}, skipping");
            return;
        };
        debug!("Playing {sound:?}");
        let sink = Sink::connect_new(stream.mixer());
        sink.append(SamplesBuffer::new(1, SAMPLE_RATE, samples.clone()));
        sink.detach(); // Play in background
    }
}
