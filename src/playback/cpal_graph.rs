use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};

use super::{AudioBuffer, OutputGraph};
use parlance_realtime_utils::audio::WIRE_PCM16_SAMPLE_RATE;
use parlance_realtime_utils::device;

#[derive(Default)]
struct PlayState {
    samples: Vec<f32>,
    pos: usize,
}

enum GraphCmd {
    Suspend,
    Resume,
    Shutdown,
}

/// Output graph backed by a cpal stream. The stream lives on a dedicated
/// thread because cpal streams are not Send; this handle only touches the
/// shared play state and a command channel, so the engine that owns it can
/// move between tasks freely.
///
/// At most one buffer is in flight at a time (the engine guarantees it), so
/// scheduling replaces the play state wholesale and `stop` clears it
/// synchronously.
pub struct CpalOutputGraph {
    state: Arc<Mutex<PlayState>>,
    cmd_tx: mpsc::Sender<GraphCmd>,
    thread: Option<std::thread::JoinHandle<()>>,
}

impl CpalOutputGraph {
    pub fn new(device_name: Option<String>) -> anyhow::Result<Self> {
        let state = Arc::new(Mutex::new(PlayState::default()));
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let thread_state = state.clone();
        let thread = std::thread::spawn(move || {
            output_thread(device_name, thread_state, cmd_rx, ready_tx);
        });

        match ready_rx.recv() {
            Ok(Ok(())) => Ok(Self {
                state,
                cmd_tx,
                thread: Some(thread),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(anyhow::anyhow!("audio output thread died during setup")),
        }
    }
}

fn output_thread(
    device_name: Option<String>,
    state: Arc<Mutex<PlayState>>,
    cmd_rx: mpsc::Receiver<GraphCmd>,
    ready_tx: mpsc::Sender<anyhow::Result<()>>,
) {
    let stream = match build_stream(device_name, state) {
        Ok(stream) => stream,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };
    if let Err(e) = stream.play() {
        let _ = ready_tx.send(Err(e.into()));
        return;
    }
    let _ = ready_tx.send(Ok(()));

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            GraphCmd::Suspend => {
                if let Err(e) = stream.pause() {
                    tracing::error!("failed to pause output stream: {}", e);
                }
            }
            GraphCmd::Resume => {
                if let Err(e) = stream.play() {
                    tracing::error!("failed to resume output stream: {}", e);
                }
            }
            GraphCmd::Shutdown => break,
        }
    }
    drop(stream);
}

fn build_stream(
    device_name: Option<String>,
    state: Arc<Mutex<PlayState>>,
) -> anyhow::Result<cpal::Stream> {
    let rate = WIRE_PCM16_SAMPLE_RATE as u32;
    let output = device::get_or_default_output(device_name)?;
    tracing::debug!("output device: {:?}", output.name());

    let supported = output
        .supported_output_configs()?
        .find(|c| {
            c.channels() == 1
                && c.min_sample_rate() <= SampleRate(rate)
                && c.max_sample_rate() >= SampleRate(rate)
        })
        .or_else(|| {
            output.supported_output_configs().ok()?.find(|c| {
                c.channels() == 2
                    && c.min_sample_rate() <= SampleRate(rate)
                    && c.max_sample_rate() >= SampleRate(rate)
            })
        })
        .ok_or_else(|| anyhow::anyhow!("no output config supports {} hz", rate))?;

    let config: StreamConfig = supported.with_sample_rate(SampleRate(rate)).config();
    let channels = config.channels as usize;

    let output_data_fn = move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
        let mut play = match state.lock() {
            Ok(play) => play,
            Err(_) => return,
        };
        for frame in data.chunks_mut(channels) {
            let sample = if play.pos < play.samples.len() {
                let s = play.samples[play.pos];
                play.pos += 1;
                s
            } else {
                0.0
            };
            for out in frame.iter_mut() {
                *out = sample;
            }
        }
    };

    let stream = output.build_output_stream(
        &config,
        output_data_fn,
        move |err| tracing::error!("output stream error: {}", err),
        None,
    )?;
    Ok(stream)
}

impl OutputGraph for CpalOutputGraph {
    fn schedule(&mut self, buffer: AudioBuffer) {
        if let Ok(mut play) = self.state.lock() {
            play.samples = buffer.into_samples();
            play.pos = 0;
        }
    }

    fn is_idle(&self) -> bool {
        self.state
            .lock()
            .map(|play| play.pos >= play.samples.len())
            .unwrap_or(true)
    }

    fn suspend(&mut self) {
        let _ = self.cmd_tx.send(GraphCmd::Suspend);
    }

    fn resume(&mut self) {
        let _ = self.cmd_tx.send(GraphCmd::Resume);
    }

    fn stop(&mut self) {
        if let Ok(mut play) = self.state.lock() {
            play.samples.clear();
            play.pos = 0;
        }
    }
}

impl Drop for CpalOutputGraph {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(GraphCmd::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
