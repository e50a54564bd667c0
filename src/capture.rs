use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::StreamConfig;
use rubato::Resampler;

use crate::client::ClientTx;
use crate::error::EngineError;
use crate::types::events::client::{
    InputAudioBufferAppendEvent, InputAudioBufferCommitEvent, ResponseCreateEvent,
};
use crate::types::ClientEvent;
use parlance_realtime_utils::audio::{self, WIRE_PCM16_SAMPLE_RATE};
use parlance_realtime_utils::device;
use parlance_realtime_utils::frame::{FrameEncoder, FRAME_MS};

/// Owns the microphone for one session. The cpal stream lives on a
/// dedicated capture thread (cpal streams are not Send); raw sample blocks
/// cross to the async side by value over a channel, are resampled to the
/// wire rate, cut into 20 ms frames and forwarded as append events.
pub struct CaptureController {
    device_name: Option<String>,
    chunk_size: usize,
    active: Option<ActiveCapture>,
}

struct ActiveCapture {
    stop_tx: std::sync::mpsc::Sender<()>,
    thread: std::thread::JoinHandle<()>,
    forward: tokio::task::JoinHandle<()>,
    captured_ms: Arc<AtomicU64>,
}

impl CaptureController {
    pub fn new(device_name: Option<String>, chunk_size: usize) -> Self {
        Self {
            device_name,
            chunk_size,
            active: None,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.active.is_some()
    }

    /// Captured duration of the current listening window, in milliseconds
    /// of emitted frames.
    pub fn captured_ms(&self) -> u64 {
        self.active
            .as_ref()
            .map(|a| a.captured_ms.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Acquires the microphone and begins forwarding frames to the relay.
    /// The duration counter starts at zero.
    pub async fn start(&mut self, client: ClientTx) -> Result<(), EngineError> {
        if self.active.is_some() {
            return Ok(());
        }

        let (sample_tx, sample_rx) = tokio::sync::mpsc::channel::<Vec<f32>>(256);
        let (ready_tx, ready_rx) = tokio::sync::oneshot::channel();
        let (stop_tx, stop_rx) = std::sync::mpsc::channel();

        let device_name = self.device_name.clone();
        let chunk_size = self.chunk_size;
        let thread = std::thread::spawn(move || {
            capture_thread(device_name, chunk_size, sample_tx, ready_tx, stop_rx);
        });

        let input_rate = match ready_rx.await {
            Ok(Ok(rate)) => rate,
            Ok(Err(msg)) => return Err(EngineError::DeviceUnavailable(msg)),
            Err(_) => {
                return Err(EngineError::DeviceUnavailable(
                    "capture thread died during setup".to_string(),
                ))
            }
        };

        let captured_ms = Arc::new(AtomicU64::new(0));
        let forward = tokio::spawn(forward_frames(
            sample_rx,
            input_rate,
            chunk_size,
            client,
            captured_ms.clone(),
        ));

        self.active = Some(ActiveCapture {
            stop_tx,
            thread,
            forward,
            captured_ms,
        });
        Ok(())
    }

    /// Releases the microphone and returns the captured duration in
    /// milliseconds. All samples already captured are flushed through the
    /// frame encoder before this returns.
    pub async fn stop(&mut self) -> u64 {
        let Some(active) = self.active.take() else {
            return 0;
        };
        let ActiveCapture {
            stop_tx,
            thread,
            forward,
            captured_ms,
        } = active;

        // Dropping the stream closes the sample channel, which lets the
        // forwarding task drain everything already captured and exit.
        let _ = stop_tx.send(());
        let _ = forward.await;
        let ms = captured_ms.load(Ordering::SeqCst);
        let _ = tokio::task::spawn_blocking(move || thread.join()).await;
        ms
    }
}

/// The wire messages a finished listening window produces. An empty window
/// sends nothing (an empty commit is a protocol error upstream); a second
/// concurrent response is never created.
pub fn finish_messages(captured_ms: u64, response_active: bool) -> Vec<ClientEvent> {
    if captured_ms == 0 {
        return Vec::new();
    }
    let mut events = vec![ClientEvent::InputAudioBufferCommit(
        InputAudioBufferCommitEvent::new(),
    )];
    if !response_active {
        events.push(ClientEvent::ResponseCreate(ResponseCreateEvent::new()));
    }
    events
}

pub(crate) fn fold_to_mono(data: &[f32], channels: usize) -> Vec<f32> {
    if channels > 1 {
        data.chunks(channels)
            .map(|c| c.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        data.to_vec()
    }
}

fn capture_thread(
    device_name: Option<String>,
    chunk_size: usize,
    sample_tx: tokio::sync::mpsc::Sender<Vec<f32>>,
    ready_tx: tokio::sync::oneshot::Sender<Result<u32, String>>,
    stop_rx: std::sync::mpsc::Receiver<()>,
) {
    let input = match device::get_or_default_input(device_name) {
        Ok(input) => input,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };

    let default_config = match input.default_input_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    let channels = default_config.channels() as usize;
    let sample_rate = default_config.sample_rate();

    let make_data_fn = |tx: tokio::sync::mpsc::Sender<Vec<f32>>| {
        move |data: &[f32], _: &cpal::InputCallbackInfo| {
            if tx.try_send(fold_to_mono(data, channels)).is_err() {
                tracing::warn!("capture channel full, dropping a block");
            }
        }
    };

    // Fixed-size buffers keep capture latency uniform; not every backend
    // supports them, in which case default-sized blocks feed the same
    // frame encoder.
    let fixed = StreamConfig {
        channels: default_config.channels(),
        sample_rate,
        buffer_size: cpal::BufferSize::Fixed(chunk_size as u32),
    };
    let stream = input
        .build_input_stream(
            &fixed,
            make_data_fn(sample_tx.clone()),
            |err| tracing::error!("input stream error: {}", err),
            None,
        )
        .or_else(|e| {
            tracing::warn!(
                "fixed-size input buffers unavailable ({}), using default block size",
                e
            );
            let fallback = StreamConfig {
                channels: default_config.channels(),
                sample_rate,
                buffer_size: cpal::BufferSize::Default,
            };
            input.build_input_stream(
                &fallback,
                make_data_fn(sample_tx),
                |err| tracing::error!("input stream error: {}", err),
                None,
            )
        });

    let stream = match stream {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e.to_string()));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.to_string()));
        return;
    }
    let _ = ready_tx.send(Ok(sample_rate.0));

    // Hold the stream until the controller asks to stop.
    let _ = stop_rx.recv();
    drop(stream);
}

async fn forward_frames(
    mut sample_rx: tokio::sync::mpsc::Receiver<Vec<f32>>,
    input_rate: u32,
    chunk_size: usize,
    client: ClientTx,
    captured_ms: Arc<AtomicU64>,
) {
    let needs_resample = (input_rate as f64 - WIRE_PCM16_SAMPLE_RATE).abs() > f64::EPSILON;
    let mut resampler = if needs_resample {
        match audio::create_resampler(input_rate as f64, WIRE_PCM16_SAMPLE_RATE, chunk_size) {
            Ok(resampler) => Some(resampler),
            Err(e) => {
                tracing::error!("failed to create capture resampler: {}", e);
                return;
            }
        }
    } else {
        None
    };

    let mut pending: VecDeque<f32> = VecDeque::with_capacity(chunk_size * 2);
    let mut encoder = FrameEncoder::new(WIRE_PCM16_SAMPLE_RATE as u32);

    while let Some(block) = sample_rx.recv().await {
        let mut wire_samples: Vec<f32> = Vec::new();
        match resampler.as_mut() {
            Some(resampler) => {
                pending.extend(block);
                while pending.len() >= chunk_size {
                    let chunk: Vec<f32> = pending.drain(..chunk_size).collect();
                    if let Ok(resampled) = resampler.process(&[chunk.as_slice()], None) {
                        if let Some(resampled) = resampled.first() {
                            wire_samples.extend(resampled.iter().copied());
                        }
                    }
                }
            }
            None => wire_samples = block,
        }

        for frame in encoder.push(&wire_samples) {
            captured_ms.fetch_add(FRAME_MS as u64, Ordering::SeqCst);
            let payload =
                base64::engine::general_purpose::STANDARD.encode(frame.pcm16());
            let event =
                ClientEvent::InputAudioBufferAppend(InputAudioBufferAppendEvent::new(payload));
            if client.send(event).await.is_err() {
                tracing::warn!("client channel closed, stopping capture forwarding");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(events: &[ClientEvent]) -> Vec<&'static str> {
        events
            .iter()
            .map(|e| match e {
                ClientEvent::InputAudioBufferCommit(_) => "commit",
                ClientEvent::ResponseCreate(_) => "create",
                _ => "other",
            })
            .collect()
    }

    #[test]
    fn empty_window_sends_nothing() {
        assert!(finish_messages(0, false).is_empty());
        assert!(finish_messages(0, true).is_empty());
    }

    #[test]
    fn captured_audio_sends_commit_then_create() {
        assert_eq!(kinds(&finish_messages(600, false)), vec!["commit", "create"]);
    }

    #[test]
    fn active_response_suppresses_second_create() {
        assert_eq!(kinds(&finish_messages(600, true)), vec!["commit"]);
    }

    #[test]
    fn stereo_folds_to_mono_average() {
        let folded = fold_to_mono(&[1.0, 0.0, 0.5, 0.5, -1.0, 1.0], 2);
        assert_eq!(folded, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn mono_passes_through() {
        let folded = fold_to_mono(&[0.1, 0.2, 0.3], 1);
        assert_eq!(folded, vec![0.1, 0.2, 0.3]);
    }
}
