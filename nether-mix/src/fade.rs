//! Click-free tail for channels that stopped mid-block
//!
//! When a one-shot sample runs out its last value would otherwise drop to zero
//! in a single frame. The channel hands that value to the [`FadeTail`], which
//! keeps adding a decaying copy to the following blocks until it dies out.

use crate::render::OutputLayout;

/// Decaying per-ear DC level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FadeTail {
    level: [i32; 2],
}

impl FadeTail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current per-ear level
    pub fn level(&self) -> [i32; 2] {
        self.level
    }

    pub fn is_silent(&self) -> bool {
        self.level == [0, 0]
    }

    /// Take over a stopped channel's held per-ear value
    pub fn add(&mut self, held: [i32; 2]) {
        self.level[0] = self.level[0].saturating_add(held[0]);
        self.level[1] = self.level[1].saturating_add(held[1]);
    }

    /// Write the tail into `out`, one decay step per frame
    ///
    /// This initializes the block: call it before any channel adds into `out`.
    /// Each step keeps 127/128 of the level, truncated toward zero so both
    /// signs settle on exactly zero.
    pub fn apply(&mut self, out: &mut [i32], layout: OutputLayout) {
        match layout {
            OutputLayout::Mono => {
                for slot in out.iter_mut() {
                    *slot = self.level[0];
                    self.level[0] = decay(self.level[0]);
                }
            }
            OutputLayout::Stereo => {
                for frame in out.chunks_exact_mut(2) {
                    frame[0] = self.level[0];
                    frame[1] = self.level[1];
                    self.level = [decay(self.level[0]), decay(self.level[1])];
                }
            }
        }
    }
}

#[inline]
fn decay(level: i32) -> i32 {
    // |result| < |level|, so the narrowing is exact
    (level as i64 * 127 / 128) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silent_tail_clears_block() {
        let mut fade = FadeTail::new();
        let mut out = [5i32; 8];
        fade.apply(&mut out, OutputLayout::Stereo);
        assert_eq!(out, [0; 8]);
        assert!(fade.is_silent());
    }

    #[test]
    fn test_decay_per_frame() {
        let mut fade = FadeTail::new();
        fade.add([12800, -12800]);
        let mut out = [0i32; 4];
        fade.apply(&mut out, OutputLayout::Stereo);
        assert_eq!(out, [12800, -12800, 12700, -12700]);
        assert_eq!(fade.level(), [12600, -12600]);
    }

    #[test]
    fn test_mono_uses_left_level() {
        let mut fade = FadeTail::new();
        fade.add([256, 999]);
        let mut out = [0i32; 3];
        fade.apply(&mut out, OutputLayout::Mono);
        assert_eq!(out, [256, 254, 252]);
    }

    #[test]
    fn test_both_signs_reach_zero() {
        let mut fade = FadeTail::new();
        fade.add([1 << 20, -(1 << 20)]);
        let mut out = vec![0i32; 2 * 4096];
        let mut prev = fade.level();
        while !fade.is_silent() {
            fade.apply(&mut out, OutputLayout::Stereo);
            let now = fade.level();
            assert!(now[0] <= prev[0] && now[0] >= 0);
            assert!(now[1] >= prev[1] && now[1] <= 0);
            prev = now;
        }
        assert_eq!(fade.level(), [0, 0]);
    }

    #[test]
    fn test_loud_stops_saturate_and_decay() {
        let mut fade = FadeTail::new();
        for _ in 0..3 {
            fade.add([0x7f_0000, 0]);
        }
        assert_eq!(fade.level(), [3 * 0x7f_0000, 0]);

        fade.add([i32::MAX, i32::MIN]);
        assert_eq!(fade.level(), [i32::MAX, i32::MIN]);

        let mut out = [0i32; 4];
        fade.apply(&mut out, OutputLayout::Stereo);
        assert_eq!(out, [i32::MAX, i32::MIN, 2_130_706_431, -2_130_706_432]);
        assert!(fade.level()[0] > 0 && fade.level()[1] < 0);
    }
}
