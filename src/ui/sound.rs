/// Sound engine: the activation tone via rodio.
///
/// The tone is synthesized into an in-memory WAV buffer at init time and
/// played fire-and-forget through a detached Sink. Every playback failure
/// is swallowed.
///
/// Compile without the "sound" feature to disable audio entirely (the stub
/// SoundEngine does nothing).

#[cfg(feature = "sound")]
mod inner {
    use std::io::Cursor;
    use std::sync::Arc;

    use rodio::{OutputStream, OutputStreamHandle, Sink};

    use super::gen_activation_tone;
    use super::SAMPLE_RATE;

    pub struct SoundEngine {
        _stream: OutputStream,
        handle: OutputStreamHandle,
        sfx_activation: Arc<Vec<u8>>,
    }

    impl SoundEngine {
        /// None when no output device is available.
        pub fn new() -> Option<Self> {
            let (stream, handle) = OutputStream::try_default().ok()?;
            Some(SoundEngine {
                _stream: stream,
                handle,
                sfx_activation: Arc::new(make_wav(&gen_activation_tone())),
            })
        }

        fn play(&self, buf: &Arc<Vec<u8>>) {
            if let Ok(sink) = Sink::try_new(&self.handle) {
                let cursor = Cursor::new(buf.as_ref().clone());
                if let Ok(src) = rodio::Decoder::new(cursor) {
                    sink.append(src);
                    sink.detach(); // fire-and-forget
                }
            }
        }

        pub fn play_activation(&self) { self.play(&self.sfx_activation); }
    }

    // ════════════════════════════════════════════════════════════
    //  WAV encoder: wraps f32 samples into a valid WAV buffer
    // ════════════════════════════════════════════════════════════

    fn make_wav(samples: &[f32]) -> Vec<u8> {
        let num_channels: u16 = 1;
        let bits_per_sample: u16 = 16;
        let byte_rate = SAMPLE_RATE * (num_channels as u32) * (bits_per_sample as u32) / 8;
        let block_align = num_channels * bits_per_sample / 8;
        let data_size = samples.len() as u32 * 2;
        let file_size = 36 + data_size;

        let mut buf = Vec::with_capacity(44 + data_size as usize);

        buf.extend_from_slice(b"RIFF");
        buf.extend_from_slice(&file_size.to_le_bytes());
        buf.extend_from_slice(b"WAVE");

        buf.extend_from_slice(b"fmt ");
        buf.extend_from_slice(&16u32.to_le_bytes());
        buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
        buf.extend_from_slice(&num_channels.to_le_bytes());
        buf.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
        buf.extend_from_slice(&byte_rate.to_le_bytes());
        buf.extend_from_slice(&block_align.to_le_bytes());
        buf.extend_from_slice(&bits_per_sample.to_le_bytes());

        buf.extend_from_slice(b"data");
        buf.extend_from_slice(&data_size.to_le_bytes());

        for &s in samples {
            let val = (s.clamp(-1.0, 1.0) * 32767.0) as i16;
            buf.extend_from_slice(&val.to_le_bytes());
        }

        buf
    }
}

#[cfg_attr(not(feature = "sound"), allow(dead_code))]
const SAMPLE_RATE: u32 = 22050;

const TONE_SECS: f32 = 1.5;
const TONE_START_HZ: f32 = 40.0;
const TONE_END_HZ: f32 = 20.0;
const TONE_START_GAIN: f32 = 0.3;
const TONE_END_GAIN: f32 = 0.001;

/// Value at fraction `t` of an exponential ramp from `from` to `to`.
fn exp_ramp(from: f32, to: f32, t: f32) -> f32 {
    from * (to / from).powf(t)
}

/// Sub-bass drop: sine sweeping 40 Hz -> 20 Hz with an exponential
/// 0.3 -> 0.001 gain envelope over 1.5 s.
#[cfg_attr(not(feature = "sound"), allow(dead_code))]
fn gen_activation_tone() -> Vec<f32> {
    let n = (SAMPLE_RATE as f32 * TONE_SECS) as usize;
    let mut phase = 0.0_f32;
    (0..n)
        .map(|i| {
            let t = i as f32 / n as f32;
            let freq = exp_ramp(TONE_START_HZ, TONE_END_HZ, t);
            let gain = exp_ramp(TONE_START_GAIN, TONE_END_GAIN, t);
            // Integrate phase so the sweep has no discontinuities.
            phase += freq / SAMPLE_RATE as f32;
            (phase * 2.0 * std::f32::consts::PI).sin() * gain
        })
        .collect()
}

// ════════════════════════════════════════════════════════════
//  Public API: compiles to no-ops when sound feature is off
// ════════════════════════════════════════════════════════════

#[cfg(feature = "sound")]
pub use inner::SoundEngine;

#[cfg(not(feature = "sound"))]
pub struct SoundEngine;

#[cfg(not(feature = "sound"))]
impl SoundEngine {
    pub fn new() -> Option<Self> { Some(SoundEngine) }
    pub fn play_activation(&self) {}
}
