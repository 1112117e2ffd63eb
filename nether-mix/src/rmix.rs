//! R mixer: 32-bit accumulation through the volume matrix
//!
//! Every frame adds `volume[cur_vols[ear][tap]][byte]` for each source tap
//! into each output ear. Mono sources only feed tap 0, so the matrix collapses
//! to one volume per ear. Volumes ramp toward `dst_vols` one unit per frame.

use crate::channel::{Channel, ChannelStatus, SampleData};
use crate::fade::FadeTail;
use crate::position::split;
use crate::render::{Backend, Finish, Interpolation, OutputLayout, SampleWord, Source, drive};
use crate::tables::{InterpTable, VolumeTable};

/// Accumulating mixer over shared lookup tables
#[derive(Debug, Clone, Copy)]
pub struct RMixer<'t> {
    volume: &'t VolumeTable,
    interp: &'t InterpTable,
    layout: OutputLayout,
}

impl<'t> RMixer<'t> {
    pub fn new(volume: &'t VolumeTable, interp: &'t InterpTable, layout: OutputLayout) -> Self {
        Self {
            volume,
            interp,
            layout,
        }
    }

    pub fn layout(&self) -> OutputLayout {
        self.layout
    }

    /// Add one block of `ch` into `out`
    ///
    /// `out` holds `out.len() / ears` frames and is accumulated into, never
    /// cleared. Muted channels advance silently. A channel that runs out of
    /// sample holds its last value for the rest of the block and passes that
    /// value on to `fade`.
    pub fn play_channel(&self, out: &mut [i32], fade: &mut FadeTail, ch: &mut Channel) {
        debug_assert_eq!(out.len() % self.layout.ears(), 0);
        if !ch.is_playing() {
            return;
        }

        let quiet = ch.status.contains(ChannelStatus::MUTE);
        let finish = drive(self, out, ch, true, quiet);
        if matches!(finish, Finish::Ended { .. }) && !quiet {
            self.fade_channel(fade, ch);
        }
    }

    /// Move a stopping channel's current output level into the fade tail
    ///
    /// Uses the frame under the cursor at the current volumes, so a track
    /// layer cutting a note can call this before clearing `PLAYING`.
    pub fn fade_channel(&self, fade: &mut FadeTail, ch: &Channel) {
        fade.add(self.held(ch, ch.pos));
    }

    /// Per-ear output of `frame` at the current volumes
    fn held(&self, ch: &Channel, frame: u32) -> [i32; 2] {
        match ch.sample {
            SampleData::Bit8(data) => self.held_from(&Source::new(data, ch), &ch.cur_vols, frame),
            SampleData::Bit16(data) => self.held_from(&Source::new(data, ch), &ch.cur_vols, frame),
        }
    }

    fn held_from<W: SampleWord>(
        &self,
        src: &Source<'_, W>,
        vols: &[[i32; 2]; 2],
        frame: u32,
    ) -> [i32; 2] {
        let mut level = [0; 2];
        for (ear, slot) in level.iter_mut().take(self.layout.ears()).enumerate() {
            for tap in 0..src.taps() {
                *slot += self.volume.row(vols[ear][tap])[src.at(frame, tap).hi() as usize];
            }
        }
        level
    }

    #[allow(clippy::too_many_arguments)]
    fn mix<W: SampleWord>(
        &self,
        out: &mut [i32],
        src: &Source<'_, W>,
        interpolate: bool,
        mut cursor: i64,
        step: i64,
        mut vols: [[i32; 2]; 2],
        inc: &[[i32; 2]; 2],
    ) {
        let ears = self.layout.ears();
        for frame in out.chunks_exact_mut(ears) {
            let (pos, fpos) = split(cursor);
            for tap in 0..src.taps() {
                let byte = if interpolate {
                    let next = src.next(pos);
                    self.interp
                        .blend(fpos as u32, src.at(pos, tap).hi(), src.at(next, tap).hi())
                } else {
                    src.at(pos, tap).hi()
                };
                for (ear, acc) in frame.iter_mut().enumerate() {
                    *acc += self.volume.row(vols[ear][tap])[byte as usize];
                }
            }
            for (row, d) in vols.iter_mut().zip(inc) {
                row[0] += d[0];
                row[1] += d[1];
            }
            cursor += step;
        }
    }
}

impl Backend for RMixer<'_> {
    type Word = i32;

    fn width(&self) -> usize {
        self.layout.ears()
    }

    fn render(&self, out: &mut [i32], ch: &Channel, cursor: i64, inc: &[[i32; 2]; 2]) {
        // 3-tap mode has no R table; it plays linear
        let interpolate = ch.interpolation() != Interpolation::None;
        let step = ch.step as i64;
        match ch.sample {
            SampleData::Bit8(data) => {
                let src = Source::new(data, ch);
                self.mix(out, &src, interpolate, cursor, step, ch.cur_vols, inc);
            }
            SampleData::Bit16(data) => {
                let src = Source::new(data, ch);
                self.mix(out, &src, interpolate, cursor, step, ch.cur_vols, inc);
            }
        }
    }

    fn silence(&self, _out: &mut [i32]) {}

    fn hold(&self, out: &mut [i32], ch: &Channel, frame: u32) {
        let held = self.held(ch, frame);
        for slots in out.chunks_exact_mut(self.layout.ears()) {
            for (slot, h) in slots.iter_mut().zip(held) {
                *slot += h;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> VolumeTable {
        VolumeTable::from_fn(65, |v, s| v * s)
    }

    #[test]
    fn test_stereo_source_matrix() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Stereo);

        let data = [10i8, -20, 30, -40];
        let mut ch = Channel::new_stereo(SampleData::Bit8(&data)).unwrap();
        ch.orig_vol_x = 1;
        ch.set_volume_pan(64, 0);
        ch.snap_volumes();
        ch.trigger(0x0001_0000);

        let mut out = [0i32; 2];
        let mut fade = FadeTail::new();
        mixer.play_channel(&mut out, &mut fade, &mut ch);
        // left = 64 * L + 1 * R, right = 1 * L + 64 * R
        assert_eq!(out, [64 * 10 - 20, 10 - 64 * 20]);
        assert_eq!(ch.pos, 1);
    }

    #[test]
    fn test_mono_layout_uses_left_ear() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Mono);

        let data = [3i8; 8];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.set_volume_pan(64, 64);
        ch.snap_volumes();
        ch.trigger(0x0001_0000);

        let mut out = [1i32; 4];
        let mut fade = FadeTail::new();
        mixer.play_channel(&mut out, &mut fade, &mut ch);
        // hard right: the left ear is silent
        assert_eq!(out, [1; 4]);
        assert_eq!(ch.pos, 4);
    }

    #[test]
    fn test_sixteen_bit_uses_high_byte() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Mono);

        let data = [0x1234i16, -0x0100, 0x00ff];
        let mut ch = Channel::new(SampleData::Bit16(&data)).unwrap();
        ch.cur_vols = [[2, 0], [2, 0]];
        ch.dst_vols = ch.cur_vols;
        ch.trigger(0x0001_0000);

        let mut out = [0i32; 3];
        let mut fade = FadeTail::new();
        mixer.play_channel(&mut out, &mut fade, &mut ch);
        assert_eq!(out, [2 * 0x12, -2, 0]);
    }

    #[test]
    fn test_muted_channel_advances_silently() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Stereo);

        let data = [50i8; 4];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.set_volume_pan(64, 0);
        ch.snap_volumes();
        ch.trigger(0x0001_0000);
        ch.status |= ChannelStatus::MUTE;

        let mut out = [0i32; 12];
        let mut fade = FadeTail::new();
        mixer.play_channel(&mut out, &mut fade, &mut ch);
        assert_eq!(out, [0; 12]);
        assert!(!ch.is_playing());
        assert!(fade.is_silent());
    }

    #[test]
    fn test_stopped_channel_is_skipped() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Stereo);

        let data = [50i8; 4];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.step = 0x0001_0000;
        ch.set_volume_pan(64, 0);
        ch.snap_volumes();

        let mut out = [0i32; 4];
        let mut fade = FadeTail::new();
        mixer.play_channel(&mut out, &mut fade, &mut ch);
        assert_eq!(out, [0; 4]);
        assert_eq!(ch.pos, 0);
    }

    #[test]
    fn test_fade_channel_takes_current_level() {
        let volume = table();
        let interp = InterpTable::new();
        let mixer = RMixer::new(&volume, &interp, OutputLayout::Stereo);

        let data = [0i8, 0, 100, 0];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.set_volume_pan(64, 32);
        ch.snap_volumes();
        ch.pos = 2;

        let mut fade = FadeTail::new();
        mixer.fade_channel(&mut fade, &ch);
        assert_eq!(fade.level(), [32 * 100, 64 * 100]);
    }
}
