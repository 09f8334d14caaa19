//! Frame format shared by compiled audio, uploaded overrides and the
//! playback sink.

use std::sync::Arc;

/// Number of stereo sample pairs in one [`Frame`].
pub const FRAME_SIZE: usize = 128;

/// Sample rate compiled audio is produced at.
pub const ASSUMED_SAMPLE_RATE: u32 = 48_000;

/// Immutable, cheaply shared run of frames. Published audio, the cached
/// natural audio and the override buffers all hand these around instead of
/// copying samples.
pub type AudioClip = Arc<[Frame]>;

/// One left/right sample pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StereoSample {
    pub left: f32,
    pub right: f32,
}

impl StereoSample {
    pub const SILENCE: Self = Self {
        left: 0.0,
        right: 0.0,
    };

    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }
}

/// 128 consecutive stereo sample pairs, the unit of exchange with the audio
/// sink.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    samples: [StereoSample; FRAME_SIZE],
}

impl Frame {
    pub fn silent() -> Self {
        Self {
            samples: [StereoSample::SILENCE; FRAME_SIZE],
        }
    }

    pub fn from_samples(samples: [StereoSample; FRAME_SIZE]) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[StereoSample; FRAME_SIZE] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [StereoSample; FRAME_SIZE] {
        &mut self.samples
    }

    /// Returns the samples as an interleaved `L R L R ...` slice.
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        self.samples.iter().flat_map(|s| [s.left, s.right])
    }
}

/// Groups interleaved stereo samples into frames. A trailing partial frame
/// is padded with silence; an odd trailing sample is paired with silence.
pub fn frames_from_interleaved(samples: &[f32]) -> Vec<Frame> {
    let pairs_per_frame = FRAME_SIZE * 2;
    samples
        .chunks(pairs_per_frame)
        .map(|chunk| {
            let mut frame = Frame::silent();
            for (slot, pair) in frame.samples.iter_mut().zip(chunk.chunks(2)) {
                slot.left = pair[0];
                slot.right = pair.get(1).copied().unwrap_or(0.0);
            }
            frame
        })
        .collect()
}

/// Flattens frames back into interleaved stereo samples.
pub fn interleave(frames: &[Frame]) -> Vec<f32> {
    let mut out = Vec::with_capacity(frames.len() * FRAME_SIZE * 2);
    for frame in frames {
        out.extend(frame.interleaved());
    }
    out
}

/// Duration of `frame_count` frames at the given rate.
pub fn frames_duration_seconds(frame_count: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    (frame_count * FRAME_SIZE) as f64 / sample_rate as f64
}
