//! 16.16 fixed-point cursor arithmetic
//!
//! A cursor is `pos << 16 | fpos`. Steps are signed 16.16 increments. Bulk
//! advances are a single 64-bit multiply-add, so advancing by `n` frames at
//! once lands exactly where `n` single-frame advances would.

use crate::FRAC_BITS;

/// Cursor for an integer position and fraction
#[inline]
pub(crate) const fn cursor(pos: u32, fpos: u16) -> i64 {
    ((pos as i64) << FRAC_BITS) | fpos as i64
}

/// Split a non-negative cursor back into position and fraction
#[inline]
pub(crate) fn split(cursor: i64) -> (u32, u16) {
    debug_assert!(cursor >= 0, "negative cursor {cursor}");
    ((cursor >> FRAC_BITS) as u32, cursor as u16)
}

/// Cursor of a frame edge
#[inline]
pub(crate) const fn edge(frame: u32) -> i64 {
    (frame as i64) << FRAC_BITS
}

/// Advance `(pos, fpos)` by `frames` output frames at `step`
///
/// `acc = step * frames + fpos`; the new fraction is `acc & 0xffff` and
/// `acc >> 16` is added to `pos`. The result must stay at or after frame 0.
pub fn advance(pos: u32, fpos: u16, step: i32, frames: u32) -> (u32, u16) {
    let acc = step as i64 * frames as i64 + fpos as i64;
    let moved = edge(pos) + (acc & !0xffff);
    split(moved | (acc & 0xffff))
}

/// Mirror a cursor about a frame edge
#[inline]
pub(crate) fn mirror(cursor: i64, about: u32) -> i64 {
    2 * edge(about) - cursor
}

/// Reflect `(pos, fpos)` about frame `edge`
///
/// `pos' = 2 * edge - pos`, one frame lower when `fpos` is non-zero because
/// the fractional carry changes orientation, and `fpos' = -fpos`. Reflecting
/// twice about the same edge returns the original position.
pub fn reflect_about(edge: u32, pos: u32, fpos: u16) -> (u32, u16) {
    split(mirror(cursor(pos, fpos), edge))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_matches_single_steps() {
        let cases: &[(u32, u16, i32, u32)] = &[
            (0, 0, 0x0001_0000, 100),
            (1, 0x1234, 0x0002_abcd, 16),
            (5000, 0xffff, 0x0000_0001, 70000),
            (3, 0x8000, 0x0000_8000, 3),
            (9000, 0x0010, -0x0001_2345, 500),
            (40, 0, -0x0000_0101, 1000),
        ];
        for &(pos, fpos, step, frames) in cases {
            let mut c = cursor(pos, fpos);
            for _ in 0..frames {
                c += step as i64;
            }
            assert_eq!(
                advance(pos, fpos, step, frames),
                split(c),
                "pos={pos} fpos={fpos:#x} step={step:#x} frames={frames}"
            );
        }
    }

    #[test]
    fn test_advance_reference_values() {
        assert_eq!(advance(1, 0x1234, 0x0002_abcd, 16), (0x2b, 0xcf04));
        assert_eq!(advance(10, 0x8000, -0x0000_8000, 3), (9, 0));
        assert_eq!(advance(10, 0x8000, -0x0000_8000, 4), (8, 0x8000));
    }

    #[test]
    fn test_reflect_fraction_carry() {
        // 9.25 mirrored about 9 is 8.75
        assert_eq!(reflect_about(9, 9, 0x4000), (8, 0xc000));
        // whole positions reflect without the carry correction
        assert_eq!(reflect_about(9, 10, 0), (8, 0));
        // backward edge: 1.5 about 2 is 2.5
        assert_eq!(reflect_about(2, 1, 0x8000), (2, 0x8000));
    }

    #[test]
    fn test_reflect_twice_is_identity() {
        for &(edge, pos, fpos) in &[(9u32, 9u32, 0x4000u16), (9, 11, 0), (2, 1, 1), (100, 57, 0xffff)]
        {
            let (p1, f1) = reflect_about(edge, pos, fpos);
            assert_eq!(reflect_about(edge, p1, f1), (pos, fpos));
        }
    }
}
