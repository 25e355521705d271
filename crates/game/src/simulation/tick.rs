pub const DEFAULT_TICK_RATE: u32 = 60;
pub const DEFAULT_MAX_FRAMESKIP: u32 = 10;

/// Fixed-timestep accumulator with a frame-skip cap.
///
/// Wall-clock deltas are banked by `begin_frame`; `consume_tick` debits one
/// step at a time until either the bank runs dry or the cap for this frame is
/// reached. The cap bounds catch-up work after a stall: the simulation falls
/// behind real time instead of freezing the frame, and keeps draining the
/// backlog on following frames.
#[derive(Debug)]
pub struct FixedTimestep {
    tick_rate: u32,
    dt: f64,
    max_frameskip: u32,
    accumulator: f64,
    ticks_this_frame: u32,
}

impl FixedTimestep {
    pub fn new(tick_rate: u32, max_frameskip: u32) -> Self {
        Self {
            tick_rate,
            dt: 1.0 / tick_rate as f64,
            max_frameskip,
            accumulator: 0.0,
            ticks_this_frame: 0,
        }
    }

    pub fn tick_rate(&self) -> u32 {
        self.tick_rate
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn max_frameskip(&self) -> u32 {
        self.max_frameskip
    }

    /// Banks the wall-clock delta for this outer iteration and resets the
    /// frame's tick counter. Negative deltas (a clock hiccup) are ignored.
    pub fn begin_frame(&mut self, delta: f64) {
        self.accumulator += delta.max(0.0);
        self.ticks_this_frame = 0;
    }

    /// True while a full step is banked and this frame's cap has not been
    /// reached; each true debits one step.
    pub fn consume_tick(&mut self) -> bool {
        if self.accumulator >= self.dt && self.ticks_this_frame < self.max_frameskip {
            self.accumulator -= self.dt;
            self.ticks_this_frame += 1;
            true
        } else {
            false
        }
    }

    pub fn ticks_this_frame(&self) -> u32 {
        self.ticks_this_frame
    }

    /// Whether the last frame stopped at the cap with work still banked.
    pub fn capped(&self) -> bool {
        self.ticks_this_frame == self.max_frameskip && self.accumulator >= self.dt
    }

    /// Fractional progress into the next unsimulated tick, in [0, 1]. Under
    /// normal operation the accumulator holds less than one step after the
    /// tick loop, so this is strictly below 1; when the cap was hit it clamps
    /// at 1 rather than asking the presenter to extrapolate further.
    pub fn alpha(&self) -> f32 {
        (self.accumulator / self.dt).clamp(0.0, 1.0) as f32
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.ticks_this_frame = 0;
    }
}

impl Default for FixedTimestep {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE, DEFAULT_MAX_FRAMESKIP)
    }
}
