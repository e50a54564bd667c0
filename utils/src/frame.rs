/// One fixed-duration block of little-endian PCM16 samples at the capture
/// rate. Produced by [`FrameEncoder`], consumed once, never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFrame {
    pcm16: Vec<u8>,
}

impl AudioFrame {
    pub fn pcm16(&self) -> &[u8] {
        &self.pcm16
    }

    pub fn sample_count(&self) -> usize {
        self.pcm16.len() / 2
    }

    pub fn into_pcm16(self) -> Vec<u8> {
        self.pcm16
    }
}

/// Duration of one frame in milliseconds.
pub const FRAME_MS: usize = 20;

/// Accumulates a continuous mono f32 stream and emits one immutable 20 ms
/// PCM16 frame per `rate / 50` samples. Partial samples are buffered across
/// calls; nothing is emitted until a full frame exists, and samples are never
/// dropped or reordered.
pub struct FrameEncoder {
    samples_per_frame: usize,
    buffer: Vec<f32>,
}

impl FrameEncoder {
    pub fn new(sample_rate: u32) -> Self {
        let samples_per_frame = (sample_rate as usize * FRAME_MS) / 1000;
        Self {
            samples_per_frame,
            buffer: Vec::with_capacity(samples_per_frame * 2),
        }
    }

    pub fn samples_per_frame(&self) -> usize {
        self.samples_per_frame
    }

    /// Feeds a block of samples of any length and returns every frame that
    /// completed. Works the same whether the caller delivers small fixed
    /// buffers or large analysis blocks.
    pub fn push(&mut self, samples: &[f32]) -> Vec<AudioFrame> {
        self.buffer.extend_from_slice(samples);

        let mut frames = Vec::new();
        while self.buffer.len() >= self.samples_per_frame {
            let chunk: Vec<f32> = self.buffer.drain(..self.samples_per_frame).collect();
            frames.push(AudioFrame {
                pcm16: crate::audio::encode_pcm16(&chunk),
            });
        }
        frames
    }

    /// Count of samples held back waiting for the next full frame.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
    }
}
