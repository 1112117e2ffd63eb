//! Q mixer: raw 16-bit resampling
//!
//! Renders a channel's resampled source into an `i16` scratch buffer with no
//! volume applied. The caller then amplifies the scratch buffer into its
//! `i32` accumulator with one of the `amplify_channel*` helpers, which walk
//! the accumulator with a stride so one mono scratch buffer can feed either
//! ear of an interleaved block.

use crate::channel::{Channel, ChannelStatus, SampleData};
use crate::position::split;
use crate::render::{Backend, Interpolation, SampleWord, Source, drive};
use crate::tables::{QInterpMaxTable, QInterpTable, QVolumeTable};

/// Quality mixer over shared lookup tables
#[derive(Debug, Clone, Copy)]
pub struct QMixer<'t> {
    volume: &'t QVolumeTable,
    interp: &'t QInterpTable,
    interp_max: &'t QInterpMaxTable,
}

impl<'t> QMixer<'t> {
    pub fn new(
        volume: &'t QVolumeTable,
        interp: &'t QInterpTable,
        interp_max: &'t QInterpMaxTable,
    ) -> Self {
        Self {
            volume,
            interp,
            interp_max,
        }
    }

    /// Render one block of `ch` into `out`, one word per frame
    ///
    /// `out` is overwritten. With `quiet` (or a muted channel) the block is
    /// zeroed but the channel still advances. A stopped channel leaves zeros.
    pub fn play_channel(&self, out: &mut [i16], ch: &mut Channel, quiet: bool) {
        if !ch.is_playing() {
            out.fill(0);
            return;
        }
        let quiet = quiet || ch.status.contains(ChannelStatus::MUTE);
        drive(self, out, ch, false, quiet);
    }

    /// Add `src` at constant `volume` into every `stride`-th slot of `out`
    pub fn amplify_channel(&self, out: &mut [i32], src: &[i16], volume: i32, stride: usize) {
        self.amplify(out, src, volume, 0, stride);
    }

    /// Like [`amplify_channel`](Self::amplify_channel), raising the volume
    /// by one after every frame
    pub fn amplify_channel_up(&self, out: &mut [i32], src: &[i16], volume: i32, stride: usize) {
        self.amplify(out, src, volume, 1, stride);
    }

    /// Like [`amplify_channel`](Self::amplify_channel), lowering the volume
    /// by one after every frame
    pub fn amplify_channel_down(&self, out: &mut [i32], src: &[i16], volume: i32, stride: usize) {
        self.amplify(out, src, volume, -1, stride);
    }

    fn amplify(&self, out: &mut [i32], src: &[i16], mut volume: i32, delta: i32, stride: usize) {
        debug_assert!(stride > 0);
        debug_assert!(out.len() >= (src.len().saturating_sub(1)) * stride + 1 || src.is_empty());
        for (slot, &word) in out.iter_mut().step_by(stride).zip(src) {
            *slot += self.volume.amplify(volume, word);
            volume += delta;
        }
    }

    /// Source value of `frame` with stereo taps averaged
    fn held_from<W: SampleWord>(src: &Source<'_, W>, frame: u32) -> i16 {
        let mut acc = 0i32;
        for tap in 0..src.taps() {
            acc += src.at(frame, tap).word() as i32;
        }
        if src.taps() == 2 { (acc >> 1) as i16 } else { acc as i16 }
    }

    fn mix<W: SampleWord>(
        &self,
        out: &mut [i16],
        src: &Source<'_, W>,
        mode: Interpolation,
        mut cursor: i64,
        step: i64,
    ) {
        let taps = src.taps();
        for slot in out.iter_mut() {
            let (pos, fpos) = split(cursor);
            let fpos = fpos as u32;
            let mut acc = 0i32;
            for tap in 0..taps {
                let s0 = src.at(pos, tap).word();
                acc += match mode {
                    Interpolation::None => s0 as i32,
                    Interpolation::Linear => {
                        let s1 = src.at(src.next(pos), tap).word();
                        self.interp.blend(fpos, s0, s1)
                    }
                    Interpolation::Quadratic => {
                        let n1 = src.next(pos);
                        let n2 = src.next(n1);
                        let s = [s0, src.at(n1, tap).word(), src.at(n2, tap).word()];
                        self.interp_max.blend(fpos, s)
                    }
                };
            }
            if taps == 2 {
                acc >>= 1;
            }
            // the quadratic can overshoot the source range
            *slot = acc.clamp(i16::MIN as i32, i16::MAX as i32) as i16;
            cursor += step;
        }
    }
}

impl Backend for QMixer<'_> {
    type Word = i16;

    fn width(&self) -> usize {
        1
    }

    fn render(&self, out: &mut [i16], ch: &Channel, cursor: i64, _inc: &[[i32; 2]; 2]) {
        let mode = ch.interpolation();
        let step = ch.step as i64;
        match ch.sample {
            SampleData::Bit8(data) => self.mix(out, &Source::new(data, ch), mode, cursor, step),
            SampleData::Bit16(data) => self.mix(out, &Source::new(data, ch), mode, cursor, step),
        }
    }

    fn silence(&self, out: &mut [i16]) {
        out.fill(0);
    }

    fn hold(&self, out: &mut [i16], ch: &Channel, frame: u32) {
        let held = match ch.sample {
            SampleData::Bit8(data) => Self::held_from(&Source::new(data, ch), frame),
            SampleData::Bit16(data) => Self::held_from(&Source::new(data, ch), frame),
        };
        out.fill(held);
    }
}
