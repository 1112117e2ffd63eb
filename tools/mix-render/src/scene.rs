//! Scene file parsing
//!
//! A scene describes one offline render: the output format and a list of
//! voices, each playing a WAV file at some rate, volume and pan.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Scene file structure
#[derive(Debug, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub output: OutputSection,
    #[serde(default)]
    pub voice: Vec<VoiceEntry>,
}

/// Which mixer renders the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MixerKind {
    /// 32-bit accumulation with volume ramping and fade tail
    #[default]
    R,
    /// 16-bit scratch render, amplified per ear
    Q,
}

/// Output format section
#[derive(Debug, Deserialize)]
pub struct OutputSection {
    /// Output sample rate in Hz.
    /// Default: 44100
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Length of the render in seconds.
    /// Default: 1.0
    #[serde(default = "default_seconds")]
    pub seconds: f64,

    /// Interleaved stereo output.
    /// Default: true
    #[serde(default = "default_stereo")]
    pub stereo: bool,

    /// Frames per mixing block.
    /// Default: 1024
    #[serde(default = "default_block")]
    pub block: usize,

    #[serde(default)]
    pub mixer: MixerKind,

    /// Gain applied when converting to 16-bit PCM.
    /// Default: 1.0
    #[serde(default = "default_amplify")]
    pub amplify: f64,
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            sample_rate: default_sample_rate(),
            seconds: default_seconds(),
            stereo: default_stereo(),
            block: default_block(),
            mixer: MixerKind::default(),
            amplify: default_amplify(),
        }
    }
}

fn default_sample_rate() -> u32 {
    44100
}

fn default_seconds() -> f64 {
    1.0
}

fn default_stereo() -> bool {
    true
}

fn default_block() -> usize {
    1024
}

fn default_amplify() -> f64 {
    1.0
}

fn default_volume() -> i32 {
    64
}

/// Interpolation requested for a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterpolationEntry {
    #[default]
    None,
    Linear,
    /// 3-tap on the Q mixer, linear on the R mixer
    Max,
}

/// Loop behaviour for a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoopModeEntry {
    #[default]
    Forward,
    Pingpong,
}

/// Optional loop region in sample frames
#[derive(Debug, Clone, Deserialize)]
pub struct LoopEntry {
    pub start: u32,
    pub end: u32,
    #[serde(default)]
    pub mode: LoopModeEntry,
}

/// Single voice entry
#[derive(Debug, Deserialize)]
pub struct VoiceEntry {
    /// WAV file, relative to the scene file
    pub sample: String,

    /// Playback rate in Hz; the file's own rate when absent
    #[serde(default)]
    pub rate: Option<u32>,

    /// 0..=64.
    /// Default: 64
    #[serde(default = "default_volume")]
    pub volume: i32,

    /// -64 (left) ..= 64 (right).
    /// Default: 0
    #[serde(default)]
    pub pan: i32,

    #[serde(default)]
    pub interpolation: InterpolationEntry,

    /// Seconds before the voice is triggered (rounded down to a block)
    #[serde(default)]
    pub start: f64,

    /// Play the sample backwards from its last frame
    #[serde(default)]
    pub reverse: bool,

    #[serde(default, rename = "loop")]
    pub loop_region: Option<LoopEntry>,
}

impl Scene {
    /// Load scene from file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Parse scene from string
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse scene file")
    }

    /// Validate scene fields
    pub fn validate(&self) -> Result<()> {
        let out = &self.output;
        if out.sample_rate == 0 {
            anyhow::bail!("Invalid sample_rate 0 (must be positive)");
        }
        if !(out.seconds.is_finite() && out.seconds >= 0.0) {
            anyhow::bail!("Invalid seconds {} (must be >= 0)", out.seconds);
        }
        if out.block == 0 {
            anyhow::bail!("Invalid block 0 (must be at least one frame)");
        }
        if !(out.amplify.is_finite() && out.amplify > 0.0) {
            anyhow::bail!("Invalid amplify {} (must be > 0)", out.amplify);
        }

        for (i, voice) in self.voice.iter().enumerate() {
            if !(0..=nether_mix::MAX_VOLUME).contains(&voice.volume) {
                anyhow::bail!("voice {}: volume {} outside 0..=64", i, voice.volume);
            }
            if !(-nether_mix::MAX_PAN..=nether_mix::MAX_PAN).contains(&voice.pan) {
                anyhow::bail!("voice {}: pan {} outside -64..=64", i, voice.pan);
            }
            if voice.rate == Some(0) {
                anyhow::bail!("voice {}: rate must be positive", i);
            }
            if !(voice.start.is_finite() && voice.start >= 0.0) {
                anyhow::bail!("voice {}: start {} must be >= 0", i, voice.start);
            }
            if let Some(region) = &voice.loop_region
                && region.start >= region.end
            {
                anyhow::bail!(
                    "voice {}: loop {}..{} is empty",
                    i,
                    region.start,
                    region.end
                );
            }
        }

        Ok(())
    }

    /// Total output frames
    pub fn frames(&self) -> usize {
        (self.output.seconds * self.output.sample_rate as f64).round() as usize
    }

    /// Resolve a voice's sample path against the scene directory
    pub fn sample_path(base: &Path, voice: &VoiceEntry) -> PathBuf {
        base.join(&voice.sample)
    }
}
