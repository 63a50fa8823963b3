//! Audio Test Fixture Generator
//!
//! Short WAV stems for archive fixtures

use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Configuration for generated audio
#[derive(Debug, Clone)]
pub struct AudioConfig {
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub frequency: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            duration_seconds: 0.1,
            sample_rate: 8000,
            channels: 1,
            frequency: 440.0,
        }
    }
}

fn spec(config: &AudioConfig) -> hound::WavSpec {
    hound::WavSpec {
        channels: config.channels,
        sample_rate: config.sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    }
}

fn write_tone<W: std::io::Write + std::io::Seek>(
    writer: &mut hound::WavWriter<W>,
    config: &AudioConfig,
) -> anyhow::Result<()> {
    let total_samples = (config.duration_seconds * config.sample_rate as f64) as usize;

    for i in 0..total_samples {
        let t = i as f32 / config.sample_rate as f32;
        let sample =
            (0.3 * (2.0 * std::f32::consts::PI * config.frequency * t).sin() * i16::MAX as f32) as i16;
        for _ in 0..config.channels {
            writer.write_sample(sample)?;
        }
    }
    Ok(())
}

/// Generate a test WAV file
pub fn generate_test_wav(path: &Path, config: &AudioConfig) -> anyhow::Result<PathBuf> {
    let mut writer = hound::WavWriter::create(path, spec(config))?;
    write_tone(&mut writer, config)?;
    writer.finalize()?;
    Ok(path.to_path_buf())
}

/// WAV file contents in memory, for packing straight into an archive
pub fn wav_bytes(config: &AudioConfig) -> Vec<u8> {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec(config)).unwrap();
        write_tone(&mut writer, config).unwrap();
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}
