use std::time::Instant;

/// Session/turn status, the single source of truth consumed by the UI and
/// by the playback/reveal components to decide whether to advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Idle,
    Listening,
    Processing,
    Playing,
    Paused,
    Finished,
    Stopped,
    Error,
}

impl TurnStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnStatus::Finished | TurnStatus::Stopped | TurnStatus::Error)
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, TurnStatus::Idle) && !self.is_terminal()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputModality {
    Voice,
    Text,
}

/// One user-utterance/response cycle.
#[derive(Debug)]
pub struct Turn {
    id: u64,
    modality: InputModality,
    status: TurnStatus,
    text_complete: bool,
    audio_drained: bool,
    error: Option<String>,
    created_at: Instant,
}

impl Turn {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn modality(&self) -> InputModality {
        self.modality
    }

    pub fn status(&self) -> TurnStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// The turn state machine. All writes go through the named transition
/// methods below; every other component only reads the status or asks the
/// owning session to request a transition.
///
/// States: idle -> listening -> processing -> playing <-> paused -> finished,
/// with stopped and error reachable from any non-terminal state, and idle
/// reachable only once the previous turn is terminal.
pub struct TurnMachine {
    current: Option<Turn>,
    next_id: u64,
}

impl Default for TurnMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnMachine {
    pub fn new() -> Self {
        Self {
            current: None,
            next_id: 1,
        }
    }

    pub fn status(&self) -> TurnStatus {
        self.current
            .as_ref()
            .map(|t| t.status)
            .unwrap_or(TurnStatus::Idle)
    }

    /// The current turn while it is non-terminal.
    pub fn active(&self) -> Option<&Turn> {
        self.current.as_ref().filter(|t| t.status.is_active())
    }

    pub fn current(&self) -> Option<&Turn> {
        self.current.as_ref()
    }

    fn start_turn(&mut self, modality: InputModality, status: TurnStatus) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        tracing::debug!(turn = id, ?status, "turn started");
        self.current = Some(Turn {
            id,
            modality,
            status,
            text_complete: false,
            audio_drained: false,
            error: None,
            created_at: Instant::now(),
        });
        id
    }

    fn set_status(&mut self, status: TurnStatus) {
        if let Some(turn) = self.current.as_mut() {
            tracing::debug!(turn = turn.id, from = ?turn.status, to = ?status, "turn transition");
            turn.status = status;
        }
    }

    /// idle -> listening. Requires no active turn; the session barges in on
    /// any active turn before calling this.
    pub fn begin_listening(&mut self) -> Result<u64, TurnStatus> {
        if let Some(turn) = self.active() {
            return Err(turn.status());
        }
        Ok(self.start_turn(InputModality::Voice, TurnStatus::Listening))
    }

    /// listening -> processing, after a non-empty capture was committed.
    pub fn begin_processing(&mut self) -> bool {
        if self.status() == TurnStatus::Listening {
            self.set_status(TurnStatus::Processing);
            true
        } else {
            false
        }
    }

    /// idle -> processing for a typed message; creates the turn directly in
    /// processing since there is no capture window.
    pub fn begin_text_turn(&mut self) -> Result<u64, TurnStatus> {
        if let Some(turn) = self.active() {
            return Err(turn.status());
        }
        Ok(self.start_turn(InputModality::Text, TurnStatus::Processing))
    }

    /// Ends a listening window that captured nothing. The turn terminates
    /// without touching the wire.
    pub fn abandon_listening(&mut self) -> bool {
        if self.status() == TurnStatus::Listening {
            self.set_status(TurnStatus::Stopped);
            true
        } else {
            false
        }
    }

    /// processing -> playing, on the first audio payload of the response.
    pub fn first_audio(&mut self) -> bool {
        if self.status() == TurnStatus::Processing {
            self.set_status(TurnStatus::Playing);
            true
        } else {
            false
        }
    }

    /// playing -> paused.
    pub fn pause(&mut self) -> bool {
        if self.status() == TurnStatus::Playing {
            self.set_status(TurnStatus::Paused);
            true
        } else {
            false
        }
    }

    /// paused -> playing.
    pub fn resume(&mut self) -> bool {
        if self.status() == TurnStatus::Paused {
            self.set_status(TurnStatus::Playing);
            true
        } else {
            false
        }
    }

    /// Records that the full response text has been received. Finishing
    /// still waits for the audio side.
    pub fn mark_text_complete(&mut self) {
        if let Some(turn) = self.current.as_mut() {
            if turn.status.is_active() {
                turn.text_complete = true;
            }
        }
    }

    /// Records that playback reported drained. Finishing still waits for
    /// the text side.
    pub fn mark_audio_drained(&mut self) {
        if let Some(turn) = self.current.as_mut() {
            if turn.status.is_active() {
                turn.audio_drained = true;
            }
        }
    }

    /// {processing|playing|paused} -> finished, only once both streams have
    /// independently confirmed completion. Returns true on the transition.
    pub fn finish_if_complete(&mut self) -> bool {
        let ready = self.current.as_ref().is_some_and(|t| {
            matches!(
                t.status,
                TurnStatus::Processing | TurnStatus::Playing | TurnStatus::Paused
            ) && t.text_complete
                && t.audio_drained
        });
        if ready {
            self.set_status(TurnStatus::Finished);
        }
        ready
    }

    /// any non-terminal -> stopped (barge-in). Returns true if a turn was
    /// actually interrupted.
    pub fn interrupt(&mut self) -> bool {
        if self.status().is_active() {
            self.set_status(TurnStatus::Stopped);
            true
        } else {
            false
        }
    }

    /// any non-terminal -> error.
    pub fn fail(&mut self, message: &str) -> bool {
        if self.status().is_active() {
            if let Some(turn) = self.current.as_mut() {
                turn.error = Some(message.to_string());
            }
            self.set_status(TurnStatus::Error);
            true
        } else {
            false
        }
    }
}
