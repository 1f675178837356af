//! Frame driver with injected lifecycle callbacks.
//!
//! Hosts feed monotonically increasing timestamps; the driver runs
//! `on_initialize` once before the first step and `on_step` with the delta
//! since the previous frame on every frame after that.

type InitFn<S> = Box<dyn FnOnce(&mut S)>;
type StepFn<S> = Box<dyn FnMut(&mut S, f32)>;

pub struct Driver<S> {
    state: S,
    on_initialize: Option<InitFn<S>>,
    on_step: StepFn<S>,
    last_timestamp: Option<f64>,
    frames: u64,
    elapsed: f64,
}

impl<S> Driver<S> {
    pub fn new<I, F>(state: S, on_initialize: I, on_step: F) -> Self
    where
        I: FnOnce(&mut S) + 'static,
        F: FnMut(&mut S, f32) + 'static,
    {
        Self {
            state,
            on_initialize: Some(Box::new(on_initialize)),
            on_step: Box::new(on_step),
            last_timestamp: None,
            frames: 0,
            elapsed: 0.0,
        }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Seconds of stepped time so far.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn is_initialized(&self) -> bool {
        self.on_initialize.is_none()
    }

    pub fn initialize(&mut self) {
        if let Some(init) = self.on_initialize.take() {
            init(&mut self.state);
        }
    }

    /// Handle a frame stamped `timestamp_secs`. The first frame only sets the
    /// clock; time running backwards yields a zero delta. Returns the delta
    /// handed to `on_step`.
    pub fn frame(&mut self, timestamp_secs: f64) -> f32 {
        let dt = match self.last_timestamp {
            Some(last) if timestamp_secs.is_finite() => (timestamp_secs - last).max(0.0) as f32,
            _ => 0.0,
        };
        if timestamp_secs.is_finite() {
            self.last_timestamp = Some(timestamp_secs);
        }

        self.advance(dt);
        dt
    }

    /// Step by an explicit delta, bypassing the timestamp clock.
    pub fn advance(&mut self, dt: f32) {
        self.initialize();
        (self.on_step)(&mut self.state, dt);
        self.frames += 1;
        self.elapsed += f64::from(dt);
    }
}
