use std::time::Duration;

/// Paces character-by-character disclosure of the response text so the
/// visible transcript tracks elapsed playback time. The full text arrives
/// as deltas; the visible prefix only ever grows, never past the full text,
/// and the remainder is revealed at once when the audio drains.
pub struct TextReveal {
    full: Vec<char>,
    visible: usize,
    chars_per_sec: f64,
}

impl TextReveal {
    pub fn new(chars_per_sec: f64) -> Self {
        Self {
            full: Vec::new(),
            visible: 0,
            chars_per_sec,
        }
    }

    pub fn push_delta(&mut self, delta: &str) {
        self.full.extend(delta.chars());
    }

    /// Advances the visible prefix by `round(rate × elapsed)` characters,
    /// bounded by the pending length. The caller only ticks this while the
    /// turn is playing and not paused.
    pub fn advance(&mut self, elapsed: Duration) {
        let step = (self.chars_per_sec * elapsed.as_secs_f64()).round() as usize;
        self.visible = (self.visible + step).min(self.full.len());
    }

    /// Reveals everything that has been received. Called when the audio
    /// stream is complete and playback has drained, so no residual text is
    /// ever truncated.
    pub fn reveal_all(&mut self) {
        self.visible = self.full.len();
    }

    /// Discards all text, for barge-in or a new turn.
    pub fn clear(&mut self) {
        self.full.clear();
        self.visible = 0;
    }

    pub fn visible_text(&self) -> String {
        self.full[..self.visible].iter().collect()
    }

    pub fn full_text(&self) -> String {
        self.full.iter().collect()
    }

    pub fn visible_len(&self) -> usize {
        self.visible
    }

    pub fn pending_len(&self) -> usize {
        self.full.len() - self.visible
    }

    pub fn is_fully_revealed(&self) -> bool {
        self.visible == self.full.len()
    }
}
