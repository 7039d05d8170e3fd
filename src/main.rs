//! Frog Crossing entry point
//!
//! On the web everything starts from the library's wasm entry point. Natively
//! this runs a headless session with a simple autopilot and logs the result.
//!
//! Usage: `frog-crossing [seed] [levels.json] [tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod headless_run {
    use frog_crossing::consts::SIM_DT;
    use frog_crossing::platform::{ImmediateLoader, LogAudio, LogUi, RecordingRenderer};
    use frog_crossing::sim::{
        CollisionClassifier, DangerLevel, GamePhase, GameState, InputRequest, Zone,
    };
    use frog_crossing::{Game, LevelTable, Tuning};

    /// Simulated session length
    const MAX_SECONDS: f64 = 600.0;

    pub fn run() -> Result<(), String> {
        let mut args = std::env::args().skip(1);
        let seed = match args.next() {
            Some(s) => s.parse::<u64>().map_err(|e| format!("bad seed `{s}`: {e}"))?,
            None => 0x5eed,
        };
        let levels = match args.next() {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
                LevelTable::from_json(&json).map_err(|e| format!("{path}: {e}"))?
            }
            None => LevelTable::builtin(),
        };
        let tuning = match args.next() {
            Some(path) => {
                let json = std::fs::read_to_string(&path).map_err(|e| format!("{path}: {e}"))?;
                Tuning::from_json(&json).map_err(|e| format!("{path}: {e}"))?
            }
            None => Tuning::default(),
        };

        let mut game = Game::new(
            seed,
            levels,
            tuning,
            RecordingRenderer::new(),
            LogAudio::default(),
            LogUi::default(),
            ImmediateLoader::new(),
        )
        .map_err(|e| e.to_string())?;

        game.start(None).map_err(|e| e.to_string())?;

        let frame_ms = f64::from(SIM_DT) * 1000.0;
        let mut now = 0.0;
        while now < MAX_SECONDS * 1000.0 {
            if game.state().phase == GamePhase::Playing {
                if let Some(request) = autopilot(game.state(), game.tuning()) {
                    game.push_input(request);
                }
            }
            game.frame(now);
            now += frame_ms;
            if matches!(game.state().phase, GamePhase::Ended { .. } | GamePhase::Idle) {
                break;
            }
        }

        let hud = game.hud();
        log::info!(
            "Session over after {:.1}s: {} on level {} ({}), score {}, lives {}, frogs {}/{}",
            now / 1000.0,
            hud.phase,
            hud.level,
            hud.level_name,
            hud.score,
            hud.lives,
            hud.frogs_rescued,
            hud.frogs_needed
        );
        for (i, entry) in game.high_scores().entries.iter().enumerate() {
            log::info!(
                "#{} {} (level {}, {} frogs, {:?})",
                i + 1,
                entry.score,
                entry.level,
                entry.frogs_saved,
                entry.outcome
            );
        }
        Ok(())
    }

    /// Hop forward when the row ahead looks survivable, otherwise wait
    fn autopilot(state: &GameState, tuning: &Tuning) -> Option<InputRequest> {
        let world = state.world.as_ref()?;
        let classifier = CollisionClassifier::from_tuning(tuning);

        let mut ahead = state.player.position;
        ahead.z += tuning.hop_distance;
        let mut ride = state.player.ride;
        let outcome = classifier.classify(
            &mut ahead,
            &mut ride,
            &world.obstacles,
            &world.zones,
            &world.dangerous,
        );

        let clear = outcome.failure.is_none()
            && (outcome.zone == Zone::Water || outcome.danger < DangerLevel::Critical);
        clear.then(InputRequest::forward)
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Frog Crossing (native, headless) starting...");

    if let Err(e) = headless_run::run() {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main in the library, this is just to satisfy the compiler
}
