//! Sample render core
//!
//! The render loops are generic over the source word (`i8`/`i16`) and take
//! the source channel count and interpolation mode from the channel. The
//! output side is a [`Backend`]: the R mixer accumulates `i32` frames through
//! its volume matrix, the Q mixer stores raw `i16` frames. [`drive`] is the
//! one block loop both mixers run: resolve a safe run, split it into ramp
//! segments, render each segment, then wrap at loop edges or stop at the
//! sample end.

use crate::channel::{Channel, ChannelStatus};
use crate::position::edge;
use crate::ramp::{Ramp, plan_ramp};
use crate::resolver::{Boundary, resolve, wrap};

/// Resampling quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    /// Nearest frame at or before the cursor
    #[default]
    None,
    /// Two-tap linear blend
    Linear,
    /// Three-tap quadratic blend (Q mixer only; the R mixer uses linear)
    Quadratic,
}

/// Frame layout of an `i32` accumulation buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLayout {
    Mono,
    /// Interleaved left, right
    Stereo,
}

impl OutputLayout {
    /// Accumulator slots per frame
    #[inline]
    pub fn ears(self) -> usize {
        match self {
            OutputLayout::Mono => 1,
            OutputLayout::Stereo => 2,
        }
    }
}

// =============================================================================
// Source side
// =============================================================================

/// A sample word as the render loops consume it
pub(crate) trait SampleWord: Copy {
    /// Signed high byte, the R mixer volume-table index
    fn hi(self) -> u8;
    /// Value widened to the 16-bit scale
    fn word(self) -> i16;
}

impl SampleWord for i8 {
    #[inline]
    fn hi(self) -> u8 {
        self as u8
    }

    #[inline]
    fn word(self) -> i16 {
        (self as i16) << 8
    }
}

impl SampleWord for i16 {
    #[inline]
    fn hi(self) -> u8 {
        (self >> 8) as u8
    }

    #[inline]
    fn word(self) -> i16 {
        self
    }
}

/// Read-only view over a channel's sample for one render call
pub(crate) struct Source<'s, W> {
    data: &'s [W],
    taps: usize,
    last: u32,
    wrap_at: u32,
    wrap_to: u32,
}

impl<'s, W: SampleWord> Source<'s, W> {
    pub(crate) fn new(data: &'s [W], ch: &Channel) -> Self {
        // Interpolation neighbour of the last loop frame: the loop start for a
        // forward loop, the frame itself for ping-pong
        let (wrap_at, wrap_to) = if ch.is_looped() {
            if ch.is_pingpong() {
                (ch.loop_end, ch.loop_end - 1)
            } else {
                (ch.loop_end, ch.loop_start)
            }
        } else {
            (u32::MAX, u32::MAX)
        };
        Self {
            data,
            taps: ch.taps(),
            last: ch.length - 1,
            wrap_at,
            wrap_to,
        }
    }

    #[inline]
    pub(crate) fn taps(&self) -> usize {
        self.taps
    }

    /// Word of `tap` at `frame`, reads past the end hold the last frame
    #[inline]
    pub(crate) fn at(&self, frame: u32, tap: usize) -> W {
        let frame = frame.min(self.last) as usize;
        self.data[frame * self.taps + tap]
    }

    /// Interpolation neighbour of `frame`
    #[inline]
    pub(crate) fn next(&self, frame: u32) -> u32 {
        let n = frame + 1;
        if n == self.wrap_at { self.wrap_to } else { n }
    }
}

// =============================================================================
// Output side
// =============================================================================

/// Output width a render loop writes into
pub(crate) trait Backend {
    /// Output slot type
    type Word: Copy;

    /// Output slots per frame
    fn width(&self) -> usize;

    /// Render `out.len() / width` frames starting at `cursor`
    ///
    /// Frame `i` uses `ch.cur_vols + i * inc`; the channel itself is not
    /// touched.
    fn render(&self, out: &mut [Self::Word], ch: &Channel, cursor: i64, inc: &[[i32; 2]; 2]);

    /// Frames that produce nothing audible
    fn silence(&self, out: &mut [Self::Word]);

    /// Frames held at `frame`'s value after the sample ran out
    fn hold(&self, out: &mut [Self::Word], ch: &Channel, frame: u32);
}

/// Result of one [`drive`] call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Finish {
    /// Channel still playing
    Running,
    /// Sample ran out; the rest of the block holds this frame
    Ended { frame: u32 },
}

/// Render one block of `out.len() / width` frames for one channel
///
/// `ramping` enables the anti-click volume ramp; `quiet` advances the channel
/// without producing sound.
pub(crate) fn drive<B: Backend>(
    backend: &B,
    out: &mut [B::Word],
    ch: &mut Channel,
    ramping: bool,
    quiet: bool,
) -> Finish {
    let width = backend.width();
    let total = (out.len() / width) as u32;

    if ch.step == 0 {
        backend.silence(out);
        return Finish::Running;
    }

    let mut done = 0u32;
    while done < total {
        let requested = total - done;
        let run = resolve(ch, requested);
        let mut cursor = ch.cursor();
        let mut left = run.len;

        while left > 0 {
            let ramp = if ramping {
                plan_ramp(&ch.cur_vols, &ch.dst_vols, left)
            } else {
                Ramp::flat(left)
            };
            let span = &mut out[done as usize * width..(done + ramp.len) as usize * width];
            if quiet || ramp.quiet {
                backend.silence(span);
            } else {
                backend.render(span, ch, cursor, &ramp.inc);
            }
            cursor += ch.step as i64 * ramp.len as i64;
            ramp.apply(&mut ch.cur_vols);
            done += ramp.len;
            left -= ramp.len;
        }

        match run.boundary {
            Boundary::None => ch.set_cursor(cursor),
            Boundary::Loop => wrap(ch, cursor),
            Boundary::End => {
                let frame = if ch.step > 0 { ch.length - 1 } else { 0 };
                ch.set_cursor(edge(frame));
                ch.status.remove(ChannelStatus::PLAYING);
                tracing::trace!(frame, "channel ran out of sample data");

                let fill = run.fill(requested);
                let rest = &mut out[done as usize * width..(done + fill) as usize * width];
                if quiet {
                    backend.silence(rest);
                } else {
                    backend.hold(rest, ch, frame);
                }
                return Finish::Ended { frame };
            }
        }
    }
    Finish::Running
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{LoopMode, SampleData};

    /// Writes the integer frame position of every rendered frame
    struct FramePositions;

    impl Backend for FramePositions {
        type Word = i64;

        fn width(&self) -> usize {
            1
        }

        fn render(&self, out: &mut [i64], ch: &Channel, cursor: i64, _inc: &[[i32; 2]; 2]) {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = (cursor + ch.step as i64 * i as i64) >> 16;
            }
        }

        fn silence(&self, out: &mut [i64]) {
            out.fill(-1);
        }

        fn hold(&self, out: &mut [i64], _ch: &Channel, frame: u32) {
            out.fill(1000 + frame as i64);
        }
    }

    #[test]
    fn test_source_neighbours() {
        let data = [0i8; 10];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        let src = Source::new(&data, &ch);
        assert_eq!(src.next(3), 4);
        assert_eq!(src.next(9), 10);

        ch.set_loop(2, 9, LoopMode::Forward).unwrap();
        let src = Source::new(&data, &ch);
        assert_eq!(src.next(8), 2);

        ch.set_loop(2, 9, LoopMode::PingPong).unwrap();
        let src = Source::new(&data, &ch);
        assert_eq!(src.next(8), 8);
    }

    #[test]
    fn test_source_clamps_reads() {
        let data = [1i16, 2, 3, 4];
        let ch = Channel::new_stereo(SampleData::Bit16(&data)).unwrap();
        let src = Source::new(&data, &ch);
        assert_eq!(src.at(1, 1), 4);
        assert_eq!(src.at(7, 0), 3);
    }

    #[test]
    fn test_drive_forward_loop_positions() {
        let data = [0i8; 10];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.set_loop(2, 9, LoopMode::Forward).unwrap();
        ch.step = 0x0002_abcd;
        ch.pos = 1;
        ch.fpos = 0x1234;

        let mut out = [0i64; 16];
        assert_eq!(drive(&FramePositions, &mut out, &mut ch, false, false), Finish::Running);
        assert_eq!(out, [1, 3, 6, 2, 4, 7, 3, 5, 8, 4, 6, 2, 5, 7, 3, 6]);
        assert_eq!((ch.pos, ch.fpos), (8, 0xcf04));
    }

    #[test]
    fn test_drive_pingpong_bounces() {
        let data = [0i8; 8];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.set_loop(2, 6, LoopMode::PingPong).unwrap();
        ch.step = 0x0001_0000;
        ch.pos = 3;

        let mut out = [0i64; 12];
        drive(&FramePositions, &mut out, &mut ch, false, false);
        // mirrors about 6 and about 2 are exact for whole steps
        assert_eq!(out, [3, 4, 5, 6, 5, 4, 3, 2, 3, 4, 5, 6]);
        assert!(ch.step < 0);
        assert_eq!(ch.pos, 5);
    }

    #[test]
    fn test_drive_end_holds_last_frame() {
        let data = [0i8; 6];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.trigger(0x0002_0000);

        let mut out = [0i64; 6];
        let finish = drive(&FramePositions, &mut out, &mut ch, false, false);
        assert_eq!(finish, Finish::Ended { frame: 5 });
        assert_eq!(out, [0, 2, 4, 1005, 1005, 1005]);
        assert!(!ch.is_playing());
        assert_eq!(ch.pos, 5);
    }

    #[test]
    fn test_drive_end_after_ramp_segments() {
        let data = [0i8; 6];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.dst_vols = [[2, 0], [2, 0]];
        ch.trigger(0x0001_0000);

        // the run to the end splits into a 2-frame ramp and a flat segment
        let mut out = [0i64; 9];
        let finish = drive(&FramePositions, &mut out, &mut ch, true, false);
        assert_eq!(finish, Finish::Ended { frame: 5 });
        assert_eq!(out, [0, 1, 2, 3, 4, 5, 1005, 1005, 1005]);
        assert_eq!(ch.cur_vols, ch.dst_vols);
    }

    #[test]
    fn test_drive_quiet_still_advances() {
        let data = [0i8; 100];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.trigger(0x0001_4000);

        let mut out = [0i64; 8];
        drive(&FramePositions, &mut out, &mut ch, true, false);
        // all volumes are zero: the ramper marks every segment quiet
        assert_eq!(out, [-1; 8]);
        assert_eq!((ch.pos, ch.fpos), (10, 0));
    }

    #[test]
    fn test_drive_paused_renders_nothing() {
        let data = [0i8; 4];
        let mut ch = Channel::new(SampleData::Bit8(&data)).unwrap();
        ch.trigger(0);
        ch.pos = 2;
        let mut out = [7i64; 4];
        assert_eq!(drive(&FramePositions, &mut out, &mut ch, false, false), Finish::Running);
        assert_eq!(out, [-1; 4]);
        assert_eq!(ch.pos, 2);
    }
}
