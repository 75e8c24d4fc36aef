//! Presentation-only timers: shake, flash, fade and the scorecard reveal.
//!
//! Nothing here feeds back into game logic; the renderer reads these to
//! decide offsets and opacities.

use crate::geometry::ease_in_out;

const SHAKE_AMOUNT: f64 = 7.0;
const SHAKE_OSCILLATIONS: f64 = 10.0;
const SHAKE_DURATION: f64 = 1.0;
const FLASH_DURATION: f64 = 0.01;

/// A delayed, fixed-length animation clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tween {
    delay: f64,
    duration: f64,
    elapsed: f64,
}

impl Tween {
    pub fn new(delay: f64, duration: f64) -> Self {
        Self {
            delay,
            duration,
            elapsed: 0.0,
        }
    }

    pub fn advance(&mut self, dt: f64) {
        self.elapsed += dt;
    }

    /// Linear progress in [0, 1]; 0 while still in the delay.
    pub fn fraction(&self) -> f64 {
        if self.duration <= 0.0 {
            return if self.elapsed >= self.delay { 1.0 } else { 0.0 };
        }
        ((self.elapsed - self.delay) / self.duration).clamp(0.0, 1.0)
    }

    /// Eased progress in [0, 1].
    pub fn progress(&self) -> f64 {
        ease_in_out(self.fraction())
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.delay + self.duration
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scorecard {
    pub score: u32,
    pub best: u32,
    /// "Game over" banner scaling and fading in.
    pub banner: Tween,
    /// The card sliding up from below the screen.
    pub card: Tween,
    /// OK and Share buttons fading in.
    pub buttons: Tween,
}

impl Scorecard {
    pub fn new(score: u32, best: u32, step: f64) -> Self {
        Self {
            score,
            best,
            banner: Tween::new(step, step),
            card: Tween::new(step * 2.0, step),
            buttons: Tween::new(step * 3.0, step),
        }
    }

    fn advance(&mut self, dt: f64) {
        self.banner.advance(dt);
        self.card.advance(dt);
        self.buttons.advance(dt);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    shake: Option<Tween>,
    flash: Option<f64>,
    fade: Option<Tween>,
    scorecard: Option<Scorecard>,
}

impl Effects {
    pub fn advance(&mut self, dt: f64) {
        if let Some(shake) = self.shake.as_mut() {
            shake.advance(dt);
            if shake.is_finished() {
                self.shake = None;
            }
        }
        if let Some(remaining) = self.flash.as_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                self.flash = None;
            }
        }
        if let Some(fade) = self.fade.as_mut() {
            fade.advance(dt);
            if fade.is_finished() {
                self.fade = None;
            }
        }
        if let Some(card) = self.scorecard.as_mut() {
            card.advance(dt);
        }
    }

    pub fn start_shake(&mut self) {
        self.shake = Some(Tween::new(0.0, SHAKE_DURATION));
    }

    /// Vertical world offset of the shaking scene; decays to zero.
    pub fn shake_offset(&self) -> f64 {
        match self.shake {
            Some(shake) => {
                let t = shake.fraction();
                SHAKE_AMOUNT * (1.0 - t) * (t * SHAKE_OSCILLATIONS * std::f64::consts::TAU).sin()
            }
            None => 0.0,
        }
    }

    /// The flash lives until the next frame's advance, so it is drawn once.
    pub fn start_flash(&mut self) {
        self.flash = Some(FLASH_DURATION);
    }

    pub fn is_flashing(&self) -> bool {
        self.flash.is_some()
    }

    pub fn start_fade(&mut self, duration: f64) {
        self.fade = Some(Tween::new(0.0, duration));
    }

    /// Darkness of the new-game fade, 1.0 fully black down to 0.0.
    pub fn fade_level(&self) -> f64 {
        self.fade.map(|f| 1.0 - f.fraction()).unwrap_or(0.0)
    }

    pub fn show_scorecard(&mut self, score: u32, best: u32, step: f64) {
        self.scorecard = Some(Scorecard::new(score, best, step));
    }

    pub fn scorecard(&self) -> Option<&Scorecard> {
        self.scorecard.as_ref()
    }
}
