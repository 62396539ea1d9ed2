// SPDX-License-Identifier: MIT

//! Random sensor payloads for demos and load tests

use rand::Rng;

pub const FRAME_HEIGHT: usize = 720;
pub const FRAME_WIDTH: usize = 1280;
pub const FRAME_CHANNELS: usize = 3;
pub const SAMPLE_RATE: usize = 16_000;

/// A random RGB frame, row-major `height x width x channels` bytes
pub fn video_frame(height: usize, width: usize, channels: usize) -> Vec<u8> {
    let mut frame = vec![0u8; height * width * channels];
    rand::thread_rng().fill(frame.as_mut_slice());
    frame
}

/// A 720p frame
pub fn default_video_frame() -> Vec<u8> {
    video_frame(FRAME_HEIGHT, FRAME_WIDTH, FRAME_CHANNELS)
}

/// Uniform samples in `[-1.0, 1.0]`, encoded as little-endian `f32`
pub fn audio_chunk(duration_secs: f64, sample_rate: usize) -> Vec<u8> {
    let samples = (duration_secs * sample_rate as f64) as usize;
    let mut rng = rand::thread_rng();
    (0..samples)
        .flat_map(|_| rng.gen_range(-1.0f32..=1.0).to_le_bytes())
        .collect()
}

/// One second of audio at 16 kHz
pub fn default_audio_chunk() -> Vec<u8> {
    audio_chunk(1.0, SAMPLE_RATE)
}

/// Decode a chunk produced by [`audio_chunk`]; a trailing partial sample is ignored
pub fn decode_samples(chunk: &[u8]) -> Vec<f32> {
    chunk
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}
