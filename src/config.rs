use std::time::Duration;

/// Tuning constants for the interaction engine. The reveal rate, the
/// interruption budget and the processing timeout are deliberately
/// configuration rather than hard-coded values.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Characters per second the transcript reveals at while audio plays.
    reveal_chars_per_sec: f64,

    /// Interval between reveal/drain bookkeeping ticks.
    tick_interval: Duration,

    /// Barge-in must take effect within this much wall-clock time.
    interrupt_budget: Duration,

    /// Forces `processing -> error` when no payload of any kind arrives.
    processing_timeout: Duration,

    /// Preferred capture chunk size in samples, for the fixed-buffer path.
    capture_chunk_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            reveal_chars_per_sec: 30.0,
            tick_interval: Duration::from_millis(50),
            interrupt_budget: Duration::from_millis(100),
            processing_timeout: Duration::from_secs(25),
            capture_chunk_size: 1024,
        }
    }

    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::new()
    }

    pub fn reveal_chars_per_sec(&self) -> f64 {
        self.reveal_chars_per_sec
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn interrupt_budget(&self) -> Duration {
        self.interrupt_budget
    }

    pub fn processing_timeout(&self) -> Duration {
        self.processing_timeout
    }

    pub fn capture_chunk_size(&self) -> usize {
        self.capture_chunk_size
    }
}

pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl Default for EngineConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::new(),
        }
    }

    pub fn with_reveal_chars_per_sec(mut self, rate: f64) -> Self {
        self.config.reveal_chars_per_sec = rate;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = interval;
        self
    }

    pub fn with_interrupt_budget(mut self, budget: Duration) -> Self {
        self.config.interrupt_budget = budget;
        self
    }

    pub fn with_processing_timeout(mut self, timeout: Duration) -> Self {
        self.config.processing_timeout = timeout;
        self
    }

    pub fn with_capture_chunk_size(mut self, chunk_size: usize) -> Self {
        self.config.capture_chunk_size = chunk_size;
        self
    }

    pub fn build(self) -> EngineConfig {
        self.config
    }
}
