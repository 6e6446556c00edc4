//! Sound boundary
//!
//! The game only ever asks for a named effect to be played. On wasm32 the
//! [`AudioManager`] synthesises short tones with the Web Audio API; elsewhere a
//! [`SilentSink`] or [`RecordingSink`] stands in.

use std::cell::RefCell;
use std::rc::Rc;

/// Sound effect names
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Correct answer
    Accepted,
    /// Wrong answer
    WrongAnswer,
    /// Last life lost
    Defeated,
}

impl SoundEffect {
    pub fn name(&self) -> &'static str {
        match self {
            SoundEffect::Accepted => "accepted",
            SoundEffect::WrongAnswer => "wrongAnswer",
            SoundEffect::Defeated => "defeated",
        }
    }

    /// Per-effect volume before the master volume is applied
    pub fn default_volume(&self) -> f32 {
        match self {
            SoundEffect::Accepted | SoundEffect::WrongAnswer => 1.0,
            SoundEffect::Defeated => 0.5,
        }
    }
}

/// Something that can play effects. Playback is fire-and-forget.
pub trait SoundSink {
    fn play(&mut self, effect: SoundEffect);

    /// Master volume, clamped to `0.0..=1.0`
    fn set_master_volume(&mut self, level: f32);
}

/// Discards everything
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl SoundSink for SilentSink {
    fn play(&mut self, _effect: SoundEffect) {}

    fn set_master_volume(&mut self, _level: f32) {}
}

/// Remembers what was played; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    played: Rc<RefCell<Vec<SoundEffect>>>,
    volume: Rc<RefCell<f32>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn played(&self) -> Vec<SoundEffect> {
        self.played.borrow().clone()
    }

    pub fn count(&self, effect: SoundEffect) -> usize {
        self.played.borrow().iter().filter(|e| **e == effect).count()
    }

    pub fn master_volume(&self) -> f32 {
        *self.volume.borrow()
    }
}

impl SoundSink for RecordingSink {
    fn play(&mut self, effect: SoundEffect) {
        self.played.borrow_mut().push(effect);
    }

    fn set_master_volume(&mut self, level: f32) {
        *self.volume.borrow_mut() = level.clamp(0.0, 1.0);
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::AudioManager;

#[cfg(target_arch = "wasm32")]
mod web {
    use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

    use super::{SoundEffect, SoundSink};

    /// Procedural Web Audio player
    pub struct AudioManager {
        ctx: Option<AudioContext>,
        master_volume: f32,
    }

    impl AudioManager {
        pub fn new(master_volume: f32) -> Self {
            // May fail outside a secure context
            let ctx = AudioContext::new().ok();
            if ctx.is_none() {
                log::warn!("Failed to create AudioContext - audio disabled");
            }
            Self {
                ctx,
                master_volume: master_volume.clamp(0.0, 1.0),
            }
        }

        fn create_osc(
            &self,
            ctx: &AudioContext,
            freq: f32,
            osc_type: OscillatorType,
        ) -> Option<(OscillatorNode, GainNode)> {
            let osc = ctx.create_oscillator().ok()?;
            let gain = ctx.create_gain().ok()?;

            osc.set_type(osc_type);
            osc.frequency().set_value(freq);
            osc.connect_with_audio_node(&gain).ok()?;
            gain.connect_with_audio_node(&ctx.destination()).ok()?;

            Some((osc, gain))
        }

        /// Rising two-note ding
        fn play_accepted(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [660.0, 990.0].iter().enumerate() {
                let delay = i as f64 * 0.07;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.15)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.2).ok();
                }
            }
        }

        /// Low buzz
        fn play_wrong(&self, ctx: &AudioContext, vol: f32) {
            let Some((osc, gain)) = self.create_osc(ctx, 180.0, OscillatorType::Square) else {
                return;
            };
            let t = ctx.current_time();

            gain.gain().set_value_at_time(vol * 0.25, t).ok();
            gain.gain()
                .exponential_ramp_to_value_at_time(0.01, t + 0.25)
                .ok();
            osc.frequency().set_value_at_time(180.0, t).ok();
            osc.frequency()
                .exponential_ramp_to_value_at_time(90.0, t + 0.25)
                .ok();

            osc.start().ok();
            osc.stop_with_when(t + 0.3).ok();
        }

        /// Sad descending run
        fn play_defeated(&self, ctx: &AudioContext, vol: f32) {
            for (i, freq) in [400.0, 350.0, 300.0, 200.0].iter().enumerate() {
                let delay = i as f64 * 0.2;
                if let Some((osc, gain)) = self.create_osc(ctx, *freq, OscillatorType::Sine) {
                    let t = ctx.current_time() + delay;
                    gain.gain().set_value_at_time(vol * 0.3, t).ok();
                    gain.gain()
                        .exponential_ramp_to_value_at_time(0.01, t + 0.3)
                        .ok();
                    osc.start_with_when(t).ok();
                    osc.stop_with_when(t + 0.4).ok();
                }
            }
        }
    }

    impl SoundSink for AudioManager {
        fn play(&mut self, effect: SoundEffect) {
            let vol = self.master_volume * effect.default_volume();
            if vol <= 0.0 {
                return;
            }
            let Some(ctx) = &self.ctx else { return };

            // Browsers start the context suspended until a user gesture
            if ctx.state() == web_sys::AudioContextState::Suspended {
                let _ = ctx.resume();
            }

            match effect {
                SoundEffect::Accepted => self.play_accepted(ctx, vol),
                SoundEffect::WrongAnswer => self.play_wrong(ctx, vol),
                SoundEffect::Defeated => self.play_defeated(ctx, vol),
            }
        }

        fn set_master_volume(&mut self, level: f32) {
            self.master_volume = level.clamp(0.0, 1.0);
        }
    }
}
