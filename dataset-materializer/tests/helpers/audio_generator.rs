//! Audio Test Fixture Generator
//!
//! Writes small WAV files so fixtures look like real source audio

use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.1,
            sample_rate: 16000,
            channels: 1,
        }
    }
}

/// Generate a 16-bit PCM WAV file with a 440Hz tone
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let spec = hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample =
            (0.3 * (2.0 * std::f32::consts::PI * 440.0 * t).sin() * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }

    writer.finalize()?;
    Ok(path.to_path_buf())
}
