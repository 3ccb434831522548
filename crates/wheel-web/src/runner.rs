use log::{info, warn};
use wheel_engine::{DebugRenderer, TickOutcome, WheelConfig, WheelError, WheelSession};

/// Browser-side owner of the current round.
///
/// wasm-bindgen cannot hold borrowed engine state across calls, so the
/// exported free functions in `lib.rs` route through one `thread_local!`
/// runner. Flat buffers are refreshed after every tick for zero-copy reads.
pub struct WheelRunner {
    config: WheelConfig,
    session: Option<WheelSession>,
    debug: DebugRenderer,
    debug_enabled: bool,
    snapshot_buffer: Vec<f32>,
    strike_buffer: Vec<u32>,
}

impl WheelRunner {
    pub fn new() -> Self {
        Self {
            config: WheelConfig::default(),
            session: None,
            debug: DebugRenderer::new(),
            debug_enabled: false,
            snapshot_buffer: Vec::new(),
            strike_buffer: Vec::new(),
        }
    }

    /// Replace the configuration used by the next `init`.
    pub fn load_config(&mut self, json: &str) -> Result<(), WheelError> {
        self.config = WheelConfig::from_json(json)?;
        info!("wheel config loaded: {} pegs", self.config.peg_count);
        Ok(())
    }

    /// Start a new round, discarding any previous one.
    pub fn init(&mut self, peg_count: u32, seed: u64) -> Result<(), WheelError> {
        if let Some(mut old) = self.session.take() {
            old.shutdown();
        }
        // Nothing from the old round survives, even if the new build fails.
        self.snapshot_buffer.clear();
        self.strike_buffer.clear();
        self.debug.reset();
        let config = WheelConfig {
            peg_count,
            ..self.config.clone()
        };
        let session = WheelSession::build(config, seed)?;
        session.snapshot().write_floats(&mut self.snapshot_buffer);
        self.session = Some(session);
        Ok(())
    }

    /// Pull the lever. Without a round this does nothing.
    pub fn spin(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => session.spin(),
            None => {
                warn!("spin requested before a wheel was initialized");
                false
            }
        }
    }

    /// Advance by one host frame. Returns the winning peg, or -1 while pending.
    pub fn tick(&mut self, dt: f32) -> i32 {
        let Some(session) = self.session.as_mut() else {
            return TickOutcome::Pending.to_code();
        };
        let outcome = session.advance(dt);

        session.snapshot().write_floats(&mut self.snapshot_buffer);
        self.strike_buffer.clear();
        self.strike_buffer.extend_from_slice(session.strikes());
        if self.debug_enabled {
            self.debug.render(session.world());
        }
        outcome.to_code()
    }

    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.shutdown();
        }
        self.debug.dispose();
        self.strike_buffer.clear();
    }

    pub fn set_debug(&mut self, enabled: bool) {
        self.debug_enabled = enabled;
    }

    pub fn outcome(&self) -> TickOutcome {
        self.session
            .as_ref()
            .map(|s| s.outcome())
            .unwrap_or_default()
    }

    /// Needle angle for drawing at host time `time`.
    pub fn needle_rotation(&self, time: f32) -> f32 {
        self.session
            .as_ref()
            .map(|s| s.snapshot().needle_rotation_or_fallback(time))
            .unwrap_or(0.0)
    }

    pub fn is_initialized(&self) -> bool {
        self.session.is_some()
    }

    // ---- Pointer accessors for zero-copy reads ----

    pub fn snapshot_ptr(&self) -> *const f32 {
        self.snapshot_buffer.as_ptr()
    }

    pub fn snapshot_len(&self) -> u32 {
        self.snapshot_buffer.len() as u32
    }

    pub fn strikes_ptr(&self) -> *const u32 {
        self.strike_buffer.as_ptr()
    }

    pub fn strikes_len(&self) -> u32 {
        self.strike_buffer.len() as u32
    }

    pub fn debug_lines_ptr(&self) -> *const f32 {
        self.debug.lines_ptr()
    }

    pub fn debug_lines_len(&self) -> u32 {
        self.debug.lines().len() as u32
    }
}

impl Default for WheelRunner {
    fn default() -> Self {
        Self::new()
    }
}
