//! Loop resolution
//!
//! Works out how many frames a channel can render with its current step before
//! it crosses a loop edge or the sample edge, and moves the cursor back into
//! the loop once a loop edge has been crossed. Both mixers share this code.

use crate::channel::Channel;
use crate::position::{edge, mirror};

/// What stops a run short of the requested length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// The whole requested length fits
    None,
    /// The run ends on a loop edge; call [`wrap`] before continuing
    Loop,
    /// The run ends on the sample edge; the channel stops here
    End,
}

/// A run of frames that can be rendered without any edge handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Run {
    /// Frames to render
    pub len: u32,
    pub boundary: Boundary,
}

impl Run {
    /// Frames left over after an `End` run, to be filled with the held sample
    pub fn fill(&self, requested: u32) -> u32 {
        match self.boundary {
            Boundary::End => requested - self.len,
            _ => 0,
        }
    }
}

/// Resolve the longest safe run of at most `len` frames
///
/// Forward playback heads for the loop end while inside the loop and for the
/// sample end otherwise; backward playback heads for the loop start or frame 0.
/// The frame count to the edge is `ceil(distance / |step|)` computed on the
/// 48-bit fixed-point distance.
pub fn resolve(ch: &Channel, len: u32) -> Run {
    let unclamped = Run {
        len,
        boundary: Boundary::None,
    };
    if ch.step == 0 || len == 0 {
        return unclamped;
    }

    let step = ch.step.unsigned_abs() as u64;
    let cursor = ch.cursor();
    let looped = ch.is_looped();

    let (distance, boundary) = if ch.step > 0 {
        if looped && ch.pos < ch.loop_end {
            (edge(ch.loop_end) - cursor, Boundary::Loop)
        } else {
            (edge(ch.length) - cursor, Boundary::End)
        }
    } else if looped && ch.pos >= ch.loop_start {
        (cursor - edge(ch.loop_start) + 1, Boundary::Loop)
    } else {
        (cursor + 1, Boundary::End)
    };

    // A cursor already past the sample end resolves to an empty End run
    let distance = distance.max(0) as u64;
    let tmp = distance + step - 1;

    // The quotient has to fit in 32 bits; anything larger is beyond any block
    if (tmp >> 32) < step {
        let frames = (tmp / step) as u32;
        if frames <= len {
            return Run {
                len: frames,
                boundary,
            };
        }
    }
    unclamped
}

/// Bring a cursor that crossed a loop edge back inside the loop
///
/// Ping-pong loops mirror the cursor about the crossed edge and flip the step;
/// forward loops shift it by the loop length. Repeats until the cursor is back
/// inside, so loops shorter than one step are handled. The result is stored in
/// the channel. A step of `i32::MIN` turns into `i32::MAX`.
pub fn wrap(ch: &mut Channel, cursor: i64) {
    if !ch.is_looped() {
        debug_assert!(false, "wrap on an unlooped channel");
        ch.set_cursor(cursor.clamp(0, edge(ch.length) - 1));
        return;
    }

    let start = edge(ch.loop_start);
    let end = edge(ch.loop_end);
    let span = edge(ch.rep_len);
    let pingpong = ch.is_pingpong();

    let mut c = cursor;
    loop {
        if ch.step > 0 {
            if c < end {
                break;
            }
            if pingpong {
                c = mirror(c, ch.loop_end);
                ch.step = ch.step.saturating_neg();
            } else {
                c -= span;
            }
        } else {
            if c >= start {
                break;
            }
            if pingpong {
                c = mirror(c, ch.loop_start);
                ch.step = ch.step.saturating_neg();
            } else {
                c += span;
            }
        }
    }
    ch.set_cursor(c);
}
