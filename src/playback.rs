use std::collections::VecDeque;

mod cpal_graph;

pub use cpal_graph::CpalOutputGraph;

/// One decoded block of playback samples. Owned by the engine queue until
/// scheduled; scheduling hands ownership to the output graph until that
/// buffer finishes playing.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Decodes a base64 PCM16 payload, bit-for-bit, no resampling. Returns
    /// None when the payload is not valid base64 PCM16.
    pub fn from_payload(payload: &str) -> Option<Self> {
        parlance_realtime_utils::audio::decode(payload).map(|samples| Self { samples })
    }

    pub fn from_samples(samples: Vec<f32>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn into_samples(self) -> Vec<f32> {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// The seam between the playback engine and the platform audio output.
///
/// A graph holds at most one scheduled buffer at a time. `is_idle` is
/// level-triggered: it stays true once the scheduled buffer has fully left
/// the output, so a completion observed during a pause is simply observed
/// again after resume.
pub trait OutputGraph: Send + Sync {
    /// Begins output of the buffer immediately. Ownership transfers to the
    /// graph until the buffer finishes or is stopped.
    fn schedule(&mut self, buffer: AudioBuffer);

    /// True when no scheduled buffer remains in flight.
    fn is_idle(&self) -> bool;

    /// Freezes output mid-sample. No audio is lost or skipped.
    fn suspend(&mut self);

    /// Undoes `suspend`; the frozen buffer continues where it stopped.
    fn resume(&mut self);

    /// Forcibly stops the in-flight buffer, dropping its unplayed samples.
    fn stop(&mut self);
}

/// Queues decoded audio and plays it back-to-back through an output graph.
/// Pause freezes the in-flight buffer; flush makes the engine immediately
/// reusable for a new turn.
pub struct PlaybackEngine {
    graph: Box<dyn OutputGraph>,
    queue: VecDeque<AudioBuffer>,
    stream_complete: bool,
    paused: bool,
    in_flight: bool,
}

impl PlaybackEngine {
    pub fn new(graph: Box<dyn OutputGraph>) -> Self {
        Self {
            graph,
            queue: VecDeque::new(),
            stream_complete: false,
            paused: false,
            in_flight: false,
        }
    }

    /// Appends one decoded buffer; starts playback immediately when nothing
    /// is scheduled and the session is not paused.
    pub fn enqueue(&mut self, buffer: AudioBuffer) {
        self.queue.push_back(buffer);
        self.pump();
    }

    fn pump(&mut self) {
        if !self.in_flight && !self.paused {
            if let Some(buffer) = self.queue.pop_front() {
                self.graph.schedule(buffer);
                self.in_flight = true;
            }
        }
    }

    /// Observes buffer completions and advances the queue. A completion
    /// while paused is a no-op; the graph reports it again after resume.
    pub fn poll(&mut self) {
        if self.paused {
            return;
        }
        if self.in_flight && self.graph.is_idle() {
            self.in_flight = false;
            self.pump();
        }
    }

    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            self.graph.suspend();
        }
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            self.graph.resume();
            self.pump();
        }
    }

    /// Marks that no more buffers will arrive for the current turn.
    pub fn mark_stream_complete(&mut self) {
        self.stream_complete = true;
    }

    /// Drained holds exactly when the stream is complete, the queue is
    /// empty, nothing is scheduled, and the session is not paused.
    pub fn drained(&self) -> bool {
        self.stream_complete && self.queue.is_empty() && !self.in_flight && !self.paused
    }

    /// Barge-in path: synchronously empties the queue, stops the in-flight
    /// buffer and clears both flags so a new turn can reuse the engine at
    /// once.
    pub fn flush(&mut self) {
        self.queue.clear();
        if self.in_flight {
            self.graph.stop();
            self.in_flight = false;
        }
        if self.paused {
            self.graph.resume();
            self.paused = false;
        }
        self.stream_complete = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn has_in_flight(&self) -> bool {
        self.in_flight
    }
}

#[cfg(test)]
pub(crate) mod test_graph {
    use super::{AudioBuffer, OutputGraph};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    pub struct GraphState {
        pub scheduled: Vec<AudioBuffer>,
        pub playing: bool,
        pub suspended: bool,
        pub stopped_mid_flight: usize,
    }

    /// Deterministic graph: buffers complete only when the test says so.
    #[derive(Clone)]
    pub struct TestGraph {
        pub state: Arc<Mutex<GraphState>>,
    }

    impl TestGraph {
        pub fn new() -> Self {
            Self {
                state: Arc::new(Mutex::new(GraphState::default())),
            }
        }

        /// Simulates the natural end of the in-flight buffer.
        pub fn complete_current(&self) {
            self.state.lock().unwrap().playing = false;
        }

        pub fn scheduled(&self) -> Vec<AudioBuffer> {
            self.state.lock().unwrap().scheduled.clone()
        }

        pub fn stopped_mid_flight(&self) -> usize {
            self.state.lock().unwrap().stopped_mid_flight
        }

        pub fn is_suspended(&self) -> bool {
            self.state.lock().unwrap().suspended
        }
    }

    impl OutputGraph for TestGraph {
        fn schedule(&mut self, buffer: AudioBuffer) {
            let mut state = self.state.lock().unwrap();
            state.scheduled.push(buffer);
            state.playing = true;
        }

        fn is_idle(&self) -> bool {
            !self.state.lock().unwrap().playing
        }

        fn suspend(&mut self) {
            self.state.lock().unwrap().suspended = true;
        }

        fn resume(&mut self) {
            self.state.lock().unwrap().suspended = false;
        }

        fn stop(&mut self) {
            let mut state = self.state.lock().unwrap();
            if state.playing {
                state.playing = false;
                state.stopped_mid_flight += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_graph::TestGraph;
    use super::*;

    fn buffer(tag: f32, len: usize) -> AudioBuffer {
        AudioBuffer::from_samples(vec![tag; len])
    }

    fn engine() -> (PlaybackEngine, TestGraph) {
        let graph = TestGraph::new();
        (PlaybackEngine::new(Box::new(graph.clone())), graph)
    }

    #[test]
    fn decodes_payload_bit_for_bit() {
        use base64::Engine as _;
        let pcm: Vec<u8> = [0i16, i16::MAX, -i16::MAX, 1234]
            .iter()
            .flat_map(|v| v.to_le_bytes())
            .collect();
        let payload = base64::engine::general_purpose::STANDARD.encode(&pcm);
        let buf = AudioBuffer::from_payload(&payload).unwrap();
        assert_eq!(buf.len(), 4);
        assert_eq!(buf.samples()[0], 0.0);
        assert_eq!(buf.samples()[1], 1.0);
        assert_eq!(buf.samples()[2], -1.0);
    }

    #[test]
    fn invalid_payload_is_rejected() {
        assert!(AudioBuffer::from_payload("*** nope ***").is_none());
    }

    #[test]
    fn encoded_samples_round_trip_through_payload() {
        let samples = vec![0.5, -0.5, 0.125];
        let payload = parlance_realtime_utils::audio::encode(&samples);
        let buf = AudioBuffer::from_payload(&payload).unwrap();
        for (a, b) in samples.iter().zip(buf.samples()) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn first_enqueue_schedules_immediately() {
        let (mut engine, graph) = engine();
        engine.enqueue(buffer(1.0, 10));
        assert_eq!(graph.scheduled().len(), 1);
        assert!(engine.has_in_flight());
        assert_eq!(engine.queue_len(), 0);
    }

    #[test]
    fn buffers_play_in_order_with_none_skipped_or_repeated() {
        let (mut engine, graph) = engine();
        for i in 0..5 {
            engine.enqueue(buffer(i as f32, 4));
        }
        // Head scheduled immediately, rest queued.
        assert_eq!(engine.queue_len(), 4);
        for _ in 0..5 {
            graph.complete_current();
            engine.poll();
        }
        let scheduled = graph.scheduled();
        assert_eq!(scheduled.len(), 5);
        for (i, buf) in scheduled.iter().enumerate() {
            assert_eq!(buf.samples()[0], i as f32, "out of order at {i}");
        }
    }

    #[test]
    fn completion_while_paused_is_a_no_op() {
        let (mut engine, graph) = engine();
        engine.enqueue(buffer(1.0, 4));
        engine.enqueue(buffer(2.0, 4));
        engine.pause();
        assert!(graph.is_suspended());
        // The in-flight buffer's completion races the pause.
        graph.complete_current();
        engine.poll();
        assert_eq!(graph.scheduled().len(), 1, "queue advanced while paused");
        // After resume the completion is observed again and the queue moves.
        engine.resume();
        engine.poll();
        assert_eq!(graph.scheduled().len(), 2);
    }

    #[test]
    fn pause_resume_preserves_every_buffer() {
        let (mut engine, graph) = engine();
        for i in 0..3 {
            engine.enqueue(buffer(i as f32, 4));
        }
        graph.complete_current();
        engine.poll();
        engine.pause();
        engine.resume();
        graph.complete_current();
        engine.poll();
        graph.complete_current();
        engine.poll();
        let tags: Vec<f32> = graph.scheduled().iter().map(|b| b.samples()[0]).collect();
        assert_eq!(tags, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn resume_restarts_from_queue_head_when_idle() {
        let (mut engine, graph) = engine();
        engine.pause();
        engine.enqueue(buffer(7.0, 4));
        assert_eq!(graph.scheduled().len(), 0, "paused engine must not schedule");
        engine.resume();
        assert_eq!(graph.scheduled().len(), 1);
    }

    #[test]
    fn drained_requires_all_four_conditions() {
        let (mut engine, graph) = engine();
        assert!(!engine.drained(), "stream not complete yet");

        engine.mark_stream_complete();
        assert!(engine.drained(), "empty queue, nothing scheduled, not paused");

        // A scheduled buffer un-drains the engine.
        engine.flush();
        engine.enqueue(buffer(1.0, 4));
        engine.mark_stream_complete();
        assert!(!engine.drained(), "buffer mid-playback");

        graph.complete_current();
        engine.poll();
        assert!(engine.drained());

        engine.pause();
        assert!(!engine.drained(), "paused engine is never drained");
        engine.resume();
        assert!(engine.drained());
    }

    #[test]
    fn drained_asserts_without_consuming() {
        let (mut engine, _graph) = engine();
        engine.mark_stream_complete();
        assert!(engine.drained());
        assert!(engine.drained(), "drained must be a pure predicate");
    }

    #[test]
    fn flush_empties_and_resets_for_reuse() {
        let (mut engine, graph) = engine();
        engine.enqueue(buffer(1.0, 4));
        engine.enqueue(buffer(2.0, 4));
        engine.mark_stream_complete();
        engine.pause();

        engine.flush();
        assert_eq!(engine.queue_len(), 0);
        assert!(!engine.has_in_flight());
        assert!(!engine.is_paused());
        assert!(!engine.drained(), "flush cleared stream-complete");
        assert_eq!(graph.stopped_mid_flight(), 1);
        assert!(!graph.is_suspended(), "graph usable for the next turn");

        // The next turn starts cleanly.
        engine.enqueue(buffer(3.0, 4));
        assert_eq!(graph.scheduled().last().unwrap().samples()[0], 3.0);
    }

    #[test]
    fn interleaved_pause_resume_plays_everything_exactly_once() {
        let (mut engine, graph) = engine();
        let total = 6;
        for i in 0..total {
            engine.enqueue(buffer(i as f32, 8));
        }
        let mut completed = 0;
        let mut step = 0;
        while completed < total {
            step += 1;
            if step % 2 == 0 {
                engine.pause();
                engine.poll();
                engine.resume();
            }
            graph.complete_current();
            engine.poll();
            completed += 1;
        }
        let tags: Vec<f32> = graph.scheduled().iter().map(|b| b.samples()[0]).collect();
        assert_eq!(tags, (0..total).map(|i| i as f32).collect::<Vec<_>>());
    }
}
