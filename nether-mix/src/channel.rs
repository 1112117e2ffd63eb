//! Mixer channel state
//!
//! One playback voice as seen by the mixer: a borrowed sample, a 16.16 cursor
//! and step, loop points, and the 2x2 volume matrix the ramper moves toward its
//! target. The track layer owns note triggering and volume/pan intent; the
//! mixer only moves the cursor, flips the step on ping-pong edges, ramps
//! `cur_vols` and clears `PLAYING` when a one-shot sample runs out.

use crate::error::MixError;
use crate::render::Interpolation;
use crate::{FRAC_BITS, MAX_PAN, MAX_VOLUME};

bitflags::bitflags! {
    /// Channel status flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ChannelStatus: u16 {
        /// Channel is producing output
        const PLAYING = 0x0001;
        /// Channel advances but renders silence
        const MUTE = 0x0002;
        /// Sample has a loop region
        const LOOPED = 0x0004;
        /// Loop bounces between its edges instead of jumping back
        const PINGPONG_LOOP = 0x0008;
        /// Sample words are 16-bit
        const PLAY_16BIT = 0x0010;
        /// Linear interpolation between neighbouring frames
        const INTERPOLATE = 0x0020;
        /// 3-tap interpolation (Q mixer; R mixer treats it as linear)
        const INTERPOLATE_MAX = 0x0040;
        /// Sample is interleaved stereo
        const PLAY_STEREO = 0x0080;
    }
}

/// Borrowed PCM data
///
/// Stereo samples are interleaved (L, R, L, R, ...). The mixer never writes to
/// or frees the data.
#[derive(Debug, Clone, Copy)]
pub enum SampleData<'a> {
    /// Signed 8-bit words
    Bit8(&'a [i8]),
    /// Signed 16-bit words in host order
    Bit16(&'a [i16]),
}

impl SampleData<'_> {
    /// Number of words (not frames)
    pub fn words(&self) -> usize {
        match self {
            SampleData::Bit8(d) => d.len(),
            SampleData::Bit16(d) => d.len(),
        }
    }

    pub fn is_16bit(&self) -> bool {
        matches!(self, SampleData::Bit16(_))
    }
}

/// Loop behaviour at the loop edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Jump from the loop end back to the loop start
    Forward,
    /// Reverse direction at each edge
    PingPong,
}

/// Per-voice playback state
#[derive(Debug, Clone)]
pub struct Channel<'a> {
    /// Source PCM
    pub sample: SampleData<'a>,
    /// Sample length in frames
    pub length: u32,
    /// Loop start frame
    pub loop_start: u32,
    /// Loop end frame (exclusive)
    pub loop_end: u32,
    /// Loop length (`loop_end - loop_start`), cached for the wrap path
    pub rep_len: u32,
    /// 16.16 signed increment per output frame (0 = paused)
    pub step: i32,
    /// Integer frame cursor
    pub pos: u32,
    /// Fractional cursor (1/65536 frame)
    pub fpos: u16,
    pub status: ChannelStatus,
    /// Current volume matrix, `[ear][source tap]`
    pub cur_vols: [[i32; 2]; 2],
    /// Ramp target for `cur_vols`
    pub dst_vols: [[i32; 2]; 2],
    /// Per-ear volume derived from volume and pan
    pub vol: [i32; 2],
    /// Volume as requested by the track layer, before panning
    pub orig_vol: [i32; 2],
    /// Pan as requested by the track layer
    pub orig_pan: i32,
    /// Cross-ear volume for stereo sources (track layer bookkeeping)
    pub orig_vol_x: i32,
}

impl<'a> Channel<'a> {
    /// Create a stopped mono channel over `sample`
    pub fn new(sample: SampleData<'a>) -> Result<Self, MixError> {
        Self::with_layout(sample, false)
    }

    /// Create a stopped channel over interleaved stereo `sample`
    pub fn new_stereo(sample: SampleData<'a>) -> Result<Self, MixError> {
        Self::with_layout(sample, true)
    }

    fn with_layout(sample: SampleData<'a>, stereo: bool) -> Result<Self, MixError> {
        let words = sample.words();
        if words == 0 {
            return Err(MixError::EmptySample);
        }
        if stereo && words % 2 != 0 {
            return Err(MixError::StereoSampleOdd(words));
        }
        let frames = if stereo { words / 2 } else { words };
        // Leave headroom so `length << 16` plus one step stays positive in i64 math
        let length = u32::try_from(frames)
            .ok()
            .filter(|&l| l < u32::MAX >> 1)
            .ok_or(MixError::SampleTooLong(frames))?;

        let mut status = ChannelStatus::empty();
        if sample.is_16bit() {
            status |= ChannelStatus::PLAY_16BIT;
        }
        if stereo {
            status |= ChannelStatus::PLAY_STEREO;
        }

        Ok(Self {
            sample,
            length,
            loop_start: 0,
            loop_end: 0,
            rep_len: 0,
            step: 0,
            pos: 0,
            fpos: 0,
            status,
            cur_vols: [[0; 2]; 2],
            dst_vols: [[0; 2]; 2],
            vol: [0; 2],
            orig_vol: [0; 2],
            orig_pan: 0,
            orig_vol_x: 0,
        })
    }

    /// Source taps per frame (1 for mono, 2 for stereo)
    #[inline]
    pub fn taps(&self) -> usize {
        if self.status.contains(ChannelStatus::PLAY_STEREO) {
            2
        } else {
            1
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.status.contains(ChannelStatus::PLAYING)
    }

    #[inline]
    pub fn is_looped(&self) -> bool {
        self.status.contains(ChannelStatus::LOOPED) && self.rep_len > 0
    }

    #[inline]
    pub fn is_pingpong(&self) -> bool {
        self.status.contains(ChannelStatus::PINGPONG_LOOP)
    }

    /// Combined 16.16 cursor
    #[inline]
    pub fn cursor(&self) -> i64 {
        ((self.pos as i64) << FRAC_BITS) | self.fpos as i64
    }

    /// Store a combined 16.16 cursor
    #[inline]
    pub fn set_cursor(&mut self, cursor: i64) {
        debug_assert!(cursor >= 0, "cursor moved before sample start");
        self.pos = (cursor >> FRAC_BITS) as u32;
        self.fpos = cursor as u16;
    }

    /// Interpolation mode requested by the status flags
    pub fn interpolation(&self) -> Interpolation {
        if self.status.contains(ChannelStatus::INTERPOLATE_MAX) {
            Interpolation::Quadratic
        } else if self.status.contains(ChannelStatus::INTERPOLATE) {
            Interpolation::Linear
        } else {
            Interpolation::None
        }
    }

    /// Select the interpolation mode
    pub fn set_interpolation(&mut self, mode: Interpolation) {
        self.status
            .remove(ChannelStatus::INTERPOLATE | ChannelStatus::INTERPOLATE_MAX);
        match mode {
            Interpolation::None => {}
            Interpolation::Linear => self.status |= ChannelStatus::INTERPOLATE,
            Interpolation::Quadratic => {
                self.status |= ChannelStatus::INTERPOLATE | ChannelStatus::INTERPOLATE_MAX
            }
        }
    }

    /// Set the loop region `start..end` (frames)
    ///
    /// An empty region disables looping.
    pub fn set_loop(&mut self, start: u32, end: u32, mode: LoopMode) -> Result<(), MixError> {
        if start > end || end > self.length {
            return Err(MixError::LoopOutOfRange {
                start,
                end,
                length: self.length,
            });
        }
        self.loop_start = start;
        self.loop_end = end;
        self.rep_len = end - start;
        self.status
            .remove(ChannelStatus::LOOPED | ChannelStatus::PINGPONG_LOOP);
        if self.rep_len > 0 {
            self.status |= ChannelStatus::LOOPED;
            if mode == LoopMode::PingPong {
                self.status |= ChannelStatus::PINGPONG_LOOP;
            }
        }
        Ok(())
    }

    /// Remove the loop region
    pub fn clear_loop(&mut self) {
        self.loop_start = 0;
        self.loop_end = 0;
        self.rep_len = 0;
        self.status
            .remove(ChannelStatus::LOOPED | ChannelStatus::PINGPONG_LOOP);
    }

    /// Restart playback from the sample edge matching the direction of `step`
    pub fn trigger(&mut self, step: i32) {
        self.step = step;
        self.pos = if step < 0 { self.length - 1 } else { 0 };
        self.fpos = 0;
        self.status |= ChannelStatus::PLAYING;
    }

    /// Derive the per-ear volumes and volume-matrix target
    ///
    /// `volume` is 0..=64, `pan` is -64 (left) ..= 64 (right). Center pan keeps
    /// full volume on both ears. Mono sources feed both ears from tap 0; stereo
    /// sources map tap 0 to the left ear and tap 1 to the right ear.
    pub fn set_volume_pan(&mut self, volume: i32, pan: i32) {
        let volume = volume.clamp(0, MAX_VOLUME);
        let pan = pan.clamp(-MAX_PAN, MAX_PAN);

        let left = volume * (MAX_PAN - pan.max(0)) / MAX_PAN;
        let right = volume * (MAX_PAN + pan.min(0)) / MAX_PAN;

        self.orig_vol = [volume, volume];
        self.orig_pan = pan;
        self.vol = [left, right];

        self.dst_vols = if self.taps() == 2 {
            [[left, self.orig_vol_x], [self.orig_vol_x, right]]
        } else {
            [[left, 0], [right, 0]]
        };
    }

    /// Jump `cur_vols` to the target, skipping the ramp
    pub fn snap_volumes(&mut self) {
        self.cur_vols = self.dst_vols;
    }
}
