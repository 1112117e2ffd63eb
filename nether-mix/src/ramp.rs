//! Anti-click volume ramping
//!
//! Each of the four matrix taps walks from `cur_vols` to `dst_vols` by one unit
//! per rendered frame. A ramp segment ends when the closest tap reaches its
//! target, so within a segment every tap has a constant increment of -1, 0 or
//! +1 and none can overshoot.

/// One constant-increment ramp segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ramp {
    /// Frames in this segment
    pub len: u32,
    /// Per-frame increment for each `[ear][tap]`
    pub inc: [[i32; 2]; 2],
    /// Every tap sits at zero and stays there: skip the render, keep advancing
    pub quiet: bool,
}

impl Ramp {
    /// Move `cur` to where it stands after this segment
    #[inline]
    pub fn apply(&self, cur: &mut [[i32; 2]; 2]) {
        for (row, inc) in cur.iter_mut().zip(self.inc.iter()) {
            for (v, d) in row.iter_mut().zip(inc.iter()) {
                *v += d * self.len as i32;
            }
        }
    }

    /// Segment with no ramping at all
    pub(crate) fn flat(len: u32) -> Self {
        Self {
            len,
            inc: [[0; 2]; 2],
            quiet: false,
        }
    }
}

/// Plan the next ramp segment of at most `len` frames
pub fn plan_ramp(cur: &[[i32; 2]; 2], dst: &[[i32; 2]; 2], len: u32) -> Ramp {
    let mut seg = len;
    let mut inc = [[0; 2]; 2];
    let mut quiet = true;

    for ear in 0..2 {
        for tap in 0..2 {
            let delta = dst[ear][tap] - cur[ear][tap];
            if delta != 0 {
                inc[ear][tap] = delta.signum();
                seg = seg.min(delta.unsigned_abs());
            }
            if cur[ear][tap] != 0 || dst[ear][tap] != 0 {
                quiet = false;
            }
        }
    }

    Ramp {
        len: seg,
        inc,
        quiet,
    }
}
