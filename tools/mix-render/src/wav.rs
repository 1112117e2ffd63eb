//! WAV import and export

use anyhow::{Context, Result, bail};
use nether_mix::SampleData;
use std::path::Path;

/// PCM words as loaded from disk
#[derive(Debug, Clone, PartialEq)]
pub enum Pcm {
    Bit8(Vec<i8>),
    Bit16(Vec<i16>),
}

/// A decoded WAV file
#[derive(Debug, Clone)]
pub struct LoadedSample {
    pub pcm: Pcm,
    /// 1 or 2, interleaved
    pub channels: u16,
    pub sample_rate: u32,
}

impl LoadedSample {
    /// Borrow the words for a mixer channel
    pub fn data(&self) -> SampleData<'_> {
        match &self.pcm {
            Pcm::Bit8(words) => SampleData::Bit8(words),
            Pcm::Bit16(words) => SampleData::Bit16(words),
        }
    }

    /// Length in frames
    pub fn frames(&self) -> usize {
        let words = match &self.pcm {
            Pcm::Bit8(words) => words.len(),
            Pcm::Bit16(words) => words.len(),
        };
        words / self.channels as usize
    }
}

/// Load a mono or stereo WAV file
///
/// 8-bit files stay 8-bit; every other depth and float is reduced to 16-bit.
pub fn load_wav(path: &Path) -> Result<LoadedSample> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("Failed to load WAV: {}", path.display()))?;
    let spec = reader.spec();

    if spec.channels != 1 && spec.channels != 2 {
        bail!(
            "Unsupported channel count {} in {}",
            spec.channels,
            path.display()
        );
    }

    let pcm = match spec.sample_format {
        hound::SampleFormat::Int => match spec.bits_per_sample {
            8 => Pcm::Bit8(
                reader
                    .samples::<i8>()
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("Failed to decode {}", path.display()))?,
            ),
            16 => Pcm::Bit16(
                reader
                    .samples::<i16>()
                    .collect::<Result<_, _>>()
                    .with_context(|| format!("Failed to decode {}", path.display()))?,
            ),
            24 | 32 => {
                let shift = spec.bits_per_sample - 16;
                Pcm::Bit16(
                    reader
                        .samples::<i32>()
                        .map(|s| s.map(|v| (v >> shift) as i16))
                        .collect::<Result<_, _>>()
                        .with_context(|| format!("Failed to decode {}", path.display()))?,
                )
            }
            bits => bail!("Unsupported bit depth {} in {}", bits, path.display()),
        },
        hound::SampleFormat::Float => Pcm::Bit16(
            reader
                .samples::<f32>()
                .map(|s| s.map(|v| (v.clamp(-1.0, 1.0) * 32767.0) as i16))
                .collect::<Result<_, _>>()
                .with_context(|| format!("Failed to decode {}", path.display()))?,
        ),
    };

    let sample = LoadedSample {
        pcm,
        channels: spec.channels,
        sample_rate: spec.sample_rate,
    };
    tracing::debug!(
        "Loaded {}: {} frames, {} ch, {}Hz",
        path.display(),
        sample.frames(),
        sample.channels,
        sample.sample_rate
    );
    Ok(sample)
}

/// Write interleaved 16-bit PCM
pub fn write_wav(path: &Path, pcm: &[i16], channels: u16, sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;
    for &word in pcm {
        writer.write_sample(word)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize {}", path.display()))?;
    Ok(())
}
