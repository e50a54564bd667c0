use base64::Engine;
use rubato::{FastFixedIn, PolynomialDegree};

/// Sample rate the wire protocol carries PCM16 audio at, both directions.
pub const WIRE_PCM16_SAMPLE_RATE: f64 = 24000.0;

pub fn create_resampler(
    in_sampling_rate: f64,
    out_sampling_rate: f64,
    chunk_size: usize,
) -> anyhow::Result<FastFixedIn<f32>> {
    let resampler = FastFixedIn::<f32>::new(
        out_sampling_rate / in_sampling_rate,
        1.0,
        PolynomialDegree::Cubic,
        chunk_size,
        1,
    )?;
    Ok(resampler)
}

/// Decodes one base64 PCM16 payload into f32 samples in -1..1. Returns
/// None when the payload is not valid base64, so callers can distinguish a
/// decode failure from silence.
pub fn decode(fragment: &str) -> Option<Vec<f32>> {
    match base64::engine::general_purpose::STANDARD.decode(fragment) {
        Ok(pcm16) => Some(pcm16_to_f32(&pcm16)),
        Err(_) => {
            tracing::error!("failed to decode base64 fragment");
            None
        }
    }
}

/// Converts little-endian PCM16 bytes to f32 samples, bit-for-bit.
pub fn pcm16_to_f32(pcm16: &[u8]) -> Vec<f32> {
    pcm16
        .chunks_exact(2)
        .map(|chunk| {
            let v = i16::from_le_bytes([chunk[0], chunk[1]]);
            (v as f32 / i16::MAX as f32).clamp(-1.0, 1.0)
        })
        .collect()
}

/// Encodes f32 samples in -1..1 as a base64 PCM16 payload, saturating at
/// the i16 range.
pub fn encode(pcm32: &[f32]) -> String {
    base64::engine::general_purpose::STANDARD.encode(encode_pcm16(pcm32))
}

/// Converts f32 samples to little-endian PCM16 bytes, saturating at ±1.
pub fn encode_pcm16(pcm32: &[f32]) -> Vec<u8> {
    pcm32
        .iter()
        .flat_map(|&sample| {
            let v = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            v.to_le_bytes()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pcm16_round_trip_preserves_samples() {
        let samples = vec![0.0, 0.25, -0.25, 0.5, -0.5, 0.99, -0.99];
        let decoded = decode(&encode(&samples)).unwrap();
        assert_eq!(decoded.len(), samples.len());
        for (a, b) in samples.iter().zip(decoded.iter()) {
            assert!((a - b).abs() < 1.0 / i16::MAX as f32 * 2.0, "{} vs {}", a, b);
        }
    }

    #[test]
    fn encode_saturates_out_of_range() {
        let bytes = encode_pcm16(&[2.0, -2.0]);
        let hi = i16::from_le_bytes([bytes[0], bytes[1]]);
        let lo = i16::from_le_bytes([bytes[2], bytes[3]]);
        assert_eq!(hi, i16::MAX);
        assert_eq!(lo, -i16::MAX);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode("!!! not base64 !!!").is_none());
    }

    #[test]
    fn odd_trailing_byte_is_dropped() {
        let decoded = pcm16_to_f32(&[0, 0, 7]);
        assert_eq!(decoded, vec![0.0]);
    }
}
