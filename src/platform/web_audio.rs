//! Audio collaborator using Web Audio API
//!
//! Procedurally generated sound effects and a per-level drone, no external
//! files needed.

use web_sys::{AudioContext, GainNode, OscillatorNode, OscillatorType};

use super::{AudioSink, Sfx};

pub struct WebAudio {
    ctx: Option<AudioContext>,
    master_volume: f32,
    muted: bool,
    music: Option<(OscillatorNode, GainNode)>,
}

impl Default for WebAudio {
    fn default() -> Self {
        Self::new()
    }
}

impl WebAudio {
    pub fn new() -> Self {
        // May fail outside a secure context
        let ctx = AudioContext::new().ok();
        if ctx.is_none() {
            log::warn!("Failed to create AudioContext - audio disabled");
        }
        Self {
            ctx,
            master_volume: 0.8,
            muted: false,
            music: None,
        }
    }

    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            self.stop_music();
        }
    }

    fn volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Context, resumed if the browser suspended it
    fn context(&self) -> Option<&AudioContext> {
        let ctx = self.ctx.as_ref()?;
        if ctx.state() == web_sys::AudioContextState::Suspended {
            if let Err(e) = ctx.resume() {
                log::debug!("AudioContext resume failed: {:?}", e);
            }
        }
        Some(ctx)
    }

    /// Create an oscillator with gain envelope
    fn create_osc(
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

    /// One enveloped tone sweeping from `from` to `to` Hz
    fn sweep(
        ctx: &AudioContext,
        osc_type: OscillatorType,
        from: f32,
        to: f32,
        level: f32,
        delay: f64,
        duration: f64,
    ) {
        let Some((osc, gain)) = Self::create_osc(ctx, from, osc_type) else {
            return;
        };
        let t = ctx.current_time() + delay;

        gain.gain().set_value_at_time(level, t).ok();
        gain.gain()
            .exponential_ramp_to_value_at_time(0.01, t + duration)
            .ok();
        osc.frequency().set_value_at_time(from, t).ok();
        osc.frequency()
            .exponential_ramp_to_value_at_time(to, t + duration)
            .ok();

        osc.start_with_when(t).ok();
        osc.stop_with_when(t + duration + 0.05).ok();
    }

    /// Rising or falling note sequence
    fn arpeggio(ctx: &AudioContext, notes: &[f32], level: f32, step: f64) {
        for (i, freq) in notes.iter().enumerate() {
            Self::sweep(
                ctx,
                OscillatorType::Triangle,
                *freq,
                *freq,
                level,
                i as f64 * step,
                step * 1.5,
            );
        }
    }
}

impl AudioSink for WebAudio {
    fn play_sfx(&mut self, sfx: Sfx) {
        let vol = self.volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.context() else { return };

        match sfx {
            // Short chirp up
            Sfx::Hop => Self::sweep(ctx, OscillatorType::Square, 400.0, 800.0, vol * 0.15, 0.0, 0.06),
            Sfx::Dash => Self::sweep(ctx, OscillatorType::Square, 300.0, 1200.0, vol * 0.2, 0.0, 0.12),
            // Soft wooden thunk
            Sfx::Land => Self::sweep(ctx, OscillatorType::Sine, 180.0, 90.0, vol * 0.3, 0.0, 0.08),
            Sfx::Squash => {
                Self::sweep(ctx, OscillatorType::Sawtooth, 220.0, 40.0, vol * 0.4, 0.0, 0.25);
                Self::sweep(ctx, OscillatorType::Sine, 60.0, 30.0, vol * 0.35, 0.0, 0.2);
            }
            Sfx::Splash => {
                Self::sweep(ctx, OscillatorType::Sine, 900.0, 120.0, vol * 0.3, 0.0, 0.35);
                Self::sweep(ctx, OscillatorType::Triangle, 1500.0, 300.0, vol * 0.1, 0.05, 0.3);
            }
            Sfx::SweptAway => Self::sweep(ctx, OscillatorType::Sine, 600.0, 200.0, vol * 0.3, 0.0, 0.5),
            Sfx::Rescue => Self::arpeggio(ctx, &[523.0, 659.0, 784.0], vol * 0.25, 0.08),
            Sfx::LevelComplete => Self::arpeggio(ctx, &[523.0, 659.0, 784.0, 1047.0], vol * 0.3, 0.12),
            Sfx::Victory => {
                Self::arpeggio(ctx, &[523.0, 659.0, 784.0, 1047.0, 1319.0, 1568.0], vol * 0.3, 0.1)
            }
            Sfx::GameOver => Self::arpeggio(ctx, &[392.0, 330.0, 262.0, 196.0], vol * 0.3, 0.2),
            Sfx::Tongue => Self::sweep(ctx, OscillatorType::Sawtooth, 1200.0, 300.0, vol * 0.15, 0.0, 0.1),
            // Two-part ribbit
            Sfx::Croak => {
                Self::sweep(ctx, OscillatorType::Sawtooth, 140.0, 110.0, vol * 0.3, 0.0, 0.1);
                Self::sweep(ctx, OscillatorType::Sawtooth, 150.0, 100.0, vol * 0.3, 0.14, 0.12);
            }
        }
    }

    fn play_level_music(&mut self, level: u32) {
        self.stop_music();
        let vol = self.volume();
        if vol <= 0.0 {
            return;
        }
        let Some(ctx) = self.context() else { return };

        // Root climbs a semitone per level
        let freq = 55.0 * 2f32.powf(level.saturating_sub(1) as f32 / 12.0);
        let Some((osc, gain)) = Self::create_osc(ctx, freq, OscillatorType::Triangle) else {
            return;
        };
        gain.gain().set_value(vol * 0.05);
        if osc.start().is_ok() {
            self.music = Some((osc, gain));
        }
    }

    fn stop_music(&mut self) {
        if let Some((osc, gain)) = self.music.take() {
            gain.gain().set_value(0.0);
            if let Err(e) = osc.stop() {
                log::debug!("Failed to stop music: {:?}", e);
            }
        }
    }
}
