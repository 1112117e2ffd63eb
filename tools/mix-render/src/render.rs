//! Render command - mix a scene into a WAV file

use anyhow::{Context, Result};
use clap::Args;
use nether_mix::{
    Channel, ClipTables, FadeTail, InterpTable, Interpolation, LoopMode, OutputLayout,
    QInterpMaxTable, QInterpTable, QMixer, QVolumeTable, RMixer, VolumeTable, clip,
};
use std::path::{Path, PathBuf};

use crate::scene::{InterpolationEntry, LoopModeEntry, MixerKind, Scene, VoiceEntry};
use crate::wav::{LoadedSample, load_wav, write_wav};

/// Volume table gain: a full-scale byte at volume 64 lands near full-scale 16-bit
const TABLE_GAIN: i32 = 4;

/// Arguments for the render command
#[derive(Args)]
pub struct RenderArgs {
    /// Scene file
    pub scene: PathBuf,

    /// Output WAV file
    #[arg(short, long, default_value = "mix.wav")]
    pub output: PathBuf,

    /// Override the scene's mixer
    #[arg(long, value_enum)]
    pub mixer: Option<MixerKind>,

    /// Override the scene's block size in frames
    #[arg(long)]
    pub block: Option<usize>,
}

/// Execute the render command
pub fn execute(args: RenderArgs) -> Result<()> {
    let mut scene = Scene::load(&args.scene)?;
    if let Some(mixer) = args.mixer {
        scene.output.mixer = mixer;
    }
    if let Some(block) = args.block {
        scene.output.block = block;
    }
    scene.validate()?;

    let base = args.scene.parent().unwrap_or(Path::new("."));
    let samples = load_samples(&scene, base)?;
    let pcm = render_scene(&scene, &samples)?;

    let channels = if scene.output.stereo { 2 } else { 1 };
    write_wav(&args.output, &pcm, channels, scene.output.sample_rate)?;

    println!(
        "Rendered {} voices, {} frames ({:?} mixer) -> {}",
        scene.voice.len(),
        pcm.len() / channels as usize,
        scene.output.mixer,
        args.output.display()
    );
    Ok(())
}

/// Load every voice's sample, in voice order
pub fn load_samples(scene: &Scene, base: &Path) -> Result<Vec<LoadedSample>> {
    scene
        .voice
        .iter()
        .map(|voice| load_wav(&Scene::sample_path(base, voice)))
        .collect()
}

/// One voice during the render
struct Voice<'a> {
    channel: Channel<'a>,
    step: i32,
    volume: i32,
    pan: i32,
    start_block: usize,
    /// Per-ear amplification volume on the Q path
    q_vols: [i32; 2],
    /// Q path: value the voice held when it ran out, ramped down afterwards
    q_held: i16,
}

impl<'a> Voice<'a> {
    fn new(
        entry: &VoiceEntry,
        sample: &'a LoadedSample,
        output_rate: u32,
        block: usize,
        stereo_out: bool,
    ) -> Result<Self> {
        let mut channel = if sample.channels == 2 {
            Channel::new_stereo(sample.data())
        } else {
            Channel::new(sample.data())
        }
        .with_context(|| format!("Invalid sample data in {}", entry.sample))?;

        if let Some(region) = &entry.loop_region {
            let mode = match region.mode {
                LoopModeEntry::Forward => LoopMode::Forward,
                LoopModeEntry::Pingpong => LoopMode::PingPong,
            };
            channel
                .set_loop(region.start, region.end, mode)
                .with_context(|| format!("Invalid loop for {}", entry.sample))?;
        }

        channel.set_interpolation(match entry.interpolation {
            InterpolationEntry::None => Interpolation::None,
            InterpolationEntry::Linear => Interpolation::Linear,
            InterpolationEntry::Max => Interpolation::Quadratic,
        });

        let rate = entry.rate.unwrap_or(sample.sample_rate) as i64;
        let step = ((rate << 16) / output_rate as i64).clamp(1, i32::MAX as i64) as i32;
        let step = if entry.reverse { -step } else { step };

        let start_frame = (entry.start * output_rate as f64) as usize;

        Ok(Self {
            channel,
            step,
            volume: entry.volume,
            // A mono render has one ear; panning would only attenuate it
            pan: if stereo_out { entry.pan } else { 0 },
            start_block: start_frame / block,
            q_vols: [0; 2],
            q_held: 0,
        })
    }

    fn trigger(&mut self) {
        self.channel.trigger(self.step);
        self.channel.set_volume_pan(self.volume, self.pan);
    }
}

/// Mix the whole scene into interleaved 16-bit PCM
pub fn render_scene(scene: &Scene, samples: &[LoadedSample]) -> Result<Vec<i16>> {
    let out = &scene.output;
    let layout = if out.stereo {
        OutputLayout::Stereo
    } else {
        OutputLayout::Mono
    };
    let ears = layout.ears();

    let mut voices = scene
        .voice
        .iter()
        .zip(samples)
        .map(|(entry, sample)| Voice::new(entry, sample, out.sample_rate, out.block, out.stereo))
        .collect::<Result<Vec<_>>>()?;

    let clip_tables = ClipTables::new((out.amplify * 256.0).round() as i32);
    let limit = ClipTables::check_max(clip_tables.limit::<i16>())?;

    let total = scene.frames();
    let mut pcm = Vec::with_capacity(total * ears);
    let mut acc = vec![0i32; out.block * ears];
    let mut words = vec![0i16; out.block * ears];

    let mut blocks = Blocks::new(out.mixer, layout);
    let mut done = 0;
    let mut block_index = 0;
    while done < total {
        let frames = out.block.min(total - done);
        for voice in voices.iter_mut().filter(|v| v.start_block == block_index) {
            tracing::debug!(block = block_index, step = voice.step, "voice triggered");
            voice.trigger();
        }

        let acc = &mut acc[..frames * ears];
        blocks.mix(acc, &mut voices);

        let words = &mut words[..frames * ears];
        clip(words, acc, &clip_tables, limit);
        pcm.extend_from_slice(words);

        done += frames;
        block_index += 1;
    }

    tracing::info!(
        "Mixed {} frames in {} blocks of {}",
        total,
        block_index,
        out.block
    );
    Ok(pcm)
}

/// Mixer tables and per-render state
struct Blocks {
    kind: MixerKind,
    layout: OutputLayout,
    volume: VolumeTable,
    interp: InterpTable,
    q_volume: QVolumeTable,
    q_interp: QInterpTable,
    q_interp_max: QInterpMaxTable,
    fade: FadeTail,
    scratch: Vec<i16>,
}

impl Blocks {
    fn new(kind: MixerKind, layout: OutputLayout) -> Self {
        Self {
            kind,
            layout,
            volume: VolumeTable::linear(TABLE_GAIN),
            interp: InterpTable::new(),
            q_volume: QVolumeTable::linear(TABLE_GAIN),
            q_interp: QInterpTable::new(),
            q_interp_max: QInterpMaxTable::new(),
            fade: FadeTail::new(),
            scratch: Vec::new(),
        }
    }

    fn mix(&mut self, acc: &mut [i32], voices: &mut [Voice<'_>]) {
        match self.kind {
            MixerKind::R => {
                let mixer = RMixer::new(&self.volume, &self.interp, self.layout);
                self.fade.apply(acc, self.layout);
                for voice in voices.iter_mut() {
                    mixer.play_channel(acc, &mut self.fade, &mut voice.channel);
                }
            }
            MixerKind::Q => {
                let mixer = QMixer::new(&self.q_volume, &self.q_interp, &self.q_interp_max);
                let ears = self.layout.ears();
                let frames = acc.len() / ears;
                self.scratch.resize(frames, 0);
                acc.fill(0);
                for voice in voices.iter_mut() {
                    let stopped = !voice.channel.is_playing();
                    if stopped {
                        if voice.q_vols == [0; 2] {
                            continue;
                        }
                        self.scratch.fill(voice.q_held);
                    } else {
                        mixer.play_channel(&mut self.scratch, &mut voice.channel, false);
                        if !voice.channel.is_playing()
                            && let Some(&last) = self.scratch.last()
                        {
                            voice.q_held = last;
                        }
                    }
                    for ear in 0..ears {
                        let target = if stopped { 0 } else { voice.channel.vol[ear] };
                        amplify_ramped(
                            &mixer,
                            &mut acc[ear..],
                            &self.scratch,
                            &mut voice.q_vols[ear],
                            target,
                            ears,
                        );
                    }
                }
            }
        }
    }
}

/// Amplify `src` into one ear, ramping `cur` toward `target` first
fn amplify_ramped(
    mixer: &QMixer<'_>,
    out: &mut [i32],
    src: &[i16],
    cur: &mut i32,
    target: i32,
    stride: usize,
) {
    let ramp = ((target - *cur).unsigned_abs() as usize).min(src.len());
    if target > *cur {
        mixer.amplify_channel_up(out, &src[..ramp], *cur, stride);
        *cur += ramp as i32;
    } else if target < *cur {
        mixer.amplify_channel_down(out, &src[..ramp], *cur, stride);
        *cur -= ramp as i32;
    }
    if ramp < src.len() {
        mixer.amplify_channel(&mut out[ramp * stride..], &src[ramp..], *cur, stride);
    }
}
