//! Accumulator to device PCM conversion
//!
//! An accumulator sample is split into three bytes (bits 0-7, 8-15 and signed
//! 16-23); one table per byte holds that byte's share of the amplified output,
//! and the three shares are summed with 16-bit wrap-around. Samples outside
//! `-max..=max` take the precomputed saturation outputs instead.

use crate::error::MixError;

/// Largest clip bound the three byte tables cover
pub const CLIP_MAX: i32 = 0x7f_ffff;

/// Device sample word produced by [`clip`]
pub trait PcmWord: Copy {
    /// Largest output magnitude
    const PEAK: i64;

    /// Output word for a wrapped table sum
    fn from_table(sum: u16) -> Self;
}

impl PcmWord for i16 {
    const PEAK: i64 = 0x7fff;

    #[inline]
    fn from_table(sum: u16) -> Self {
        sum as i16
    }
}

impl PcmWord for u8 {
    const PEAK: i64 = 0x7f;

    #[inline]
    fn from_table(sum: u16) -> Self {
        sum as u8
    }
}

/// Byte-split amplification tables
#[derive(Debug, Clone)]
pub struct ClipTables {
    amp: [[u16; 256]; 3],
    amplify: i32,
    shift: u32,
}

impl ClipTables {
    /// Signed 16-bit output: `sample * amplify / 256`
    pub fn new(amplify: i32) -> Self {
        Self::build(amplify, 8, 0)
    }

    /// Unsigned 8-bit output: `sample * amplify / 65536 + 128`
    pub fn unsigned8(amplify: i32) -> Self {
        Self::build(amplify, 16, 0x80)
    }

    fn build(amplify: i32, shift: u32, bias: i64) -> Self {
        let amp = amplify as i64;
        let lo = std::array::from_fn(|b| ((b as i64 * amp) >> shift) as u16);
        let mid = std::array::from_fn(|b| (((b as i64 * amp) << 8) >> shift) as u16);
        let hi = std::array::from_fn(|b| {
            let s = b as u8 as i8 as i64;
            ((((s * amp) << 16) >> shift) + bias) as u16
        });
        Self {
            amp: [lo, mid, hi],
            amplify,
            shift,
        }
    }

    /// Validate a clip bound for [`clip`]
    pub fn check_max(max: i32) -> Result<i32, MixError> {
        if (1..=CLIP_MAX).contains(&max) {
            Ok(max)
        } else {
            Err(MixError::ClipMaxOutOfRange(max))
        }
    }

    /// Largest accumulator magnitude that still fits `W` after amplification
    pub fn limit<W: PcmWord>(&self) -> i32 {
        if self.amplify <= 0 {
            return CLIP_MAX;
        }
        let limit = (W::PEAK << self.shift) / self.amplify as i64;
        limit.clamp(1, CLIP_MAX as i64) as i32
    }

    /// Convert one in-range accumulator sample
    #[inline]
    pub fn lookup<W: PcmWord>(&self, sample: i32) -> W {
        let s = sample as u32;
        let sum = self.amp[0][(s & 0xff) as usize]
            .wrapping_add(self.amp[1][((s >> 8) & 0xff) as usize])
            .wrapping_add(self.amp[2][((s >> 16) & 0xff) as usize]);
        W::from_table(sum)
    }
}

/// Convert `src` accumulator samples into `dst`, saturating outside `-max..=max`
///
/// `dst` and `src` must have the same length; `max` must pass
/// [`ClipTables::check_max`].
pub fn clip<W: PcmWord>(dst: &mut [W], src: &[i32], tables: &ClipTables, max: i32) {
    debug_assert_eq!(dst.len(), src.len());
    debug_assert!(ClipTables::check_max(max).is_ok(), "clip max {max}");

    let min_out: W = tables.lookup(-max);
    let max_out: W = tables.lookup(max);
    for (d, &s) in dst.iter_mut().zip(src) {
        *d = if s < -max {
            min_out
        } else if s > max {
            max_out
        } else {
            tables.lookup(s)
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unity_table_is_exact() {
        let t = ClipTables::new(256);
        for v in (-32768..=32767).step_by(97) {
            assert_eq!(t.lookup::<i16>(v), v as i16);
        }
        assert_eq!(t.lookup::<i16>(-1), -1);
        assert_eq!(t.lookup::<i16>(32767), 32767);
    }

    #[test]
    fn test_amplify_floors_like_a_shift() {
        let t = ClipTables::new(128);
        for v in [-65536, -3, -1, 0, 1, 3, 255, 256, 65535] {
            assert_eq!(t.lookup::<i16>(v) as i32, (v * 128) >> 8, "sample {v}");
        }
        let t = ClipTables::new(512);
        assert_eq!(t.lookup::<i16>(1000), 2000);
        assert_eq!(t.limit::<i16>(), 16383);
    }

    #[test]
    fn test_clip_saturates() {
        let t = ClipTables::new(256);
        let src = [100_000, -100_000, 1234, -32767, 40000];
        let mut dst = [0i16; 5];
        clip(&mut dst, &src, &t, 0x7fff);
        assert_eq!(dst, [32767, -32767, 1234, -32767, 32767]);
    }

    #[test]
    fn test_unsigned8_output() {
        let t = ClipTables::unsigned8(256);
        let src = [0, 0x7fff, -256, -0x8000, 1_000_000];
        let mut dst = [0u8; 5];
        clip(&mut dst, &src, &t, t.limit::<u8>());
        assert_eq!(dst[0], 128);
        assert_eq!(dst[1], 255);
        assert_eq!(dst[2], 127);
        // symmetric bound: -limit lands one step above the floor
        assert_eq!(dst[3], 1);
        assert_eq!(dst[4], 255);
    }

    #[test]
    fn test_check_max_bounds() {
        assert_eq!(ClipTables::check_max(0x7fff), Ok(0x7fff));
        assert_eq!(
            ClipTables::check_max(0),
            Err(MixError::ClipMaxOutOfRange(0))
        );
        assert!(ClipTables::check_max(CLIP_MAX + 1).is_err());
    }
}
