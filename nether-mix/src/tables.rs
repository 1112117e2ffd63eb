//! Mixer lookup tables
//!
//! The mixers only ever read these. They are normally built once at startup
//! and shared by reference between every channel (and every thread) that
//! mixes with them. The `linear`/`new` builders produce plain linear tables;
//! callers that need a different amplitude curve supply their own rows.
//!
//! Every table is indexed by raw sample bytes. A byte holds the two's
//! complement value of a signed 8-bit word (or the high byte of a 16-bit
//! word), so row entries for bytes `0x80..=0xff` are the negative half.

use crate::error::MixError;
use crate::{INTERP_STEPS, MAX_VOLUME, QINTERP_MAX_STEPS, QINTERP_STEPS};

/// Signed value of a sample byte
#[inline]
const fn signed(byte: usize) -> i32 {
    byte as u8 as i8 as i32
}

// =============================================================================
// R mixer
// =============================================================================

/// R mixer amplitude table: `rows[volume][byte]`
#[derive(Debug, Clone)]
pub struct VolumeTable {
    rows: Vec<[i32; 256]>,
}

impl VolumeTable {
    /// Wrap externally computed rows
    pub fn from_rows(rows: Vec<[i32; 256]>) -> Result<Self, MixError> {
        if rows.is_empty() {
            return Err(MixError::EmptyVolumeTable);
        }
        warn_short(rows.len());
        Ok(Self { rows })
    }

    /// Build `levels` rows from `f(volume, signed_sample)`
    pub fn from_fn(levels: usize, f: impl Fn(i32, i32) -> i32) -> Self {
        let rows = (0..levels.max(1))
            .map(|v| std::array::from_fn(|b| f(v as i32, signed(b))))
            .collect();
        Self { rows }
    }

    /// Linear table over `0..=MAX_VOLUME`: `volume * sample * amplify`
    pub fn linear(amplify: i32) -> Self {
        Self::from_fn(MAX_VOLUME as usize + 1, |v, s| v * s * amplify)
    }

    /// Number of volume levels
    pub fn levels(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub(crate) fn row(&self, volume: i32) -> &[i32; 256] {
        debug_assert!(
            (volume as usize) < self.rows.len(),
            "volume {volume} outside table"
        );
        &self.rows[volume as usize]
    }
}

/// R mixer two-tap interpolation table: `[fpos >> 12][byte][tap]`
///
/// Blending two neighbouring bytes is two lookups and an add; the result is
/// again a sample byte ready for the volume table.
#[derive(Debug, Clone)]
pub struct InterpTable {
    taps: Box<[[[i8; 2]; 256]; INTERP_STEPS]>,
}

impl InterpTable {
    pub fn new() -> Self {
        let mut taps = Box::new([[[0i8; 2]; 256]; INTERP_STEPS]);
        let steps = INTERP_STEPS as i32;
        for (f, bucket) in taps.iter_mut().enumerate() {
            let w1 = f as i32;
            let w0 = steps - w1;
            for (b, entry) in bucket.iter_mut().enumerate() {
                let s = signed(b);
                *entry = [(s * w0 / steps) as i8, (s * w1 / steps) as i8];
            }
        }
        Self { taps }
    }

    /// Wrap an externally computed table
    pub fn from_taps(taps: Box<[[[i8; 2]; 256]; INTERP_STEPS]>) -> Self {
        Self { taps }
    }

    /// Blend `b0` (at the cursor) toward `b1` (next frame)
    #[inline]
    pub(crate) fn blend(&self, fpos: u32, b0: u8, b1: u8) -> u8 {
        let bucket = &self.taps[(fpos >> 12) as usize & (INTERP_STEPS - 1)];
        (bucket[b0 as usize][0] as i32 + bucket[b1 as usize][1] as i32) as u8
    }
}

impl Default for InterpTable {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Q mixer
// =============================================================================

/// Q mixer amplitude table: `rows[volume][0 = low byte, 1 = high byte][byte]`
///
/// A 16-bit word is amplified at full precision by summing the low-byte and
/// high-byte lookups.
#[derive(Debug, Clone)]
pub struct QVolumeTable {
    rows: Vec<[[i32; 256]; 2]>,
}

impl QVolumeTable {
    /// Wrap externally computed rows
    pub fn from_rows(rows: Vec<[[i32; 256]; 2]>) -> Result<Self, MixError> {
        if rows.is_empty() {
            return Err(MixError::EmptyVolumeTable);
        }
        warn_short(rows.len());
        Ok(Self { rows })
    }

    /// Linear table over `0..=MAX_VOLUME`: `volume * word * amplify / 256`
    pub fn linear(amplify: i32) -> Self {
        let rows = (0..=MAX_VOLUME)
            .map(|v| {
                [
                    std::array::from_fn(|b| (v * b as i32 * amplify) >> 8),
                    std::array::from_fn(|b| v * signed(b) * amplify),
                ]
            })
            .collect();
        Self { rows }
    }

    pub fn levels(&self) -> usize {
        self.rows.len()
    }

    /// Amplify one 16-bit word
    #[inline]
    pub(crate) fn amplify(&self, volume: i32, word: i16) -> i32 {
        debug_assert!(
            (volume as usize) < self.rows.len(),
            "volume {volume} outside table"
        );
        let row = &self.rows[volume as usize];
        row[0][word as u16 as usize & 0xff] + row[1][(word as u16 >> 8) as usize]
    }
}

/// Q mixer linear interpolation table: `[fpos >> 11][byte][tap]`, split into
/// high-byte and low-byte halves
#[derive(Debug, Clone)]
pub struct QInterpTable {
    hi: Vec<[[i16; 2]; 256]>,
    lo: Vec<[[i16; 2]; 256]>,
}

impl QInterpTable {
    pub fn new() -> Self {
        let steps = QINTERP_STEPS as i32;
        let weights: Vec<[i32; 2]> = (0..steps).map(|f| [steps - f, f]).collect();
        let (hi, lo) = split_tables(&weights, steps);
        Self { hi, lo }
    }

    /// Interpolate between `s0` and `s1`
    #[inline]
    pub(crate) fn blend(&self, fpos: u32, s0: i16, s1: i16) -> i32 {
        let f = (fpos >> 11) as usize & (QINTERP_STEPS - 1);
        let (hi, lo) = (&self.hi[f], &self.lo[f]);
        let (h0, l0) = bytes(s0);
        let (h1, l1) = bytes(s1);
        hi[h0][0] as i32 + hi[h1][1] as i32 + lo[l0][0] as i32 + lo[l1][1] as i32
    }
}

impl Default for QInterpTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Q mixer 3-tap (quadratic) interpolation table: `[fpos >> 12][byte][tap]`
#[derive(Debug, Clone)]
pub struct QInterpMaxTable {
    hi: Vec<[[i16; 3]; 256]>,
    lo: Vec<[[i16; 3]; 256]>,
}

impl QInterpMaxTable {
    /// Quadratic through the cursor frame and the next two
    pub fn new() -> Self {
        let n = QINTERP_MAX_STEPS as i32;
        // Lagrange weights at t = f / n, scaled by 2 n^2
        let weights: Vec<[i32; 3]> = (0..n)
            .map(|f| [(f - n) * (f - 2 * n), 2 * f * (2 * n - f), f * (f - n)])
            .collect();
        let (hi, lo) = split_tables(&weights, 2 * n * n);
        Self { hi, lo }
    }

    #[inline]
    pub(crate) fn blend(&self, fpos: u32, s: [i16; 3]) -> i32 {
        let f = (fpos >> 12) as usize & (QINTERP_MAX_STEPS - 1);
        let (hi, lo) = (&self.hi[f], &self.lo[f]);
        let mut acc = 0;
        for (k, &word) in s.iter().enumerate() {
            let (h, l) = bytes(word);
            acc += hi[h][k] as i32 + lo[l][k] as i32;
        }
        acc
    }
}

impl Default for QInterpMaxTable {
    fn default() -> Self {
        Self::new()
    }
}

fn warn_short(levels: usize) {
    if levels <= MAX_VOLUME as usize {
        tracing::warn!(
            levels,
            "volume table shorter than MAX_VOLUME + 1; channel volumes must stay below {levels}"
        );
    }
}

/// High byte (signed) and low byte (unsigned) of a word as table indices
#[inline]
fn bytes(word: i16) -> (usize, usize) {
    let w = word as u16;
    ((w >> 8) as usize, (w & 0xff) as usize)
}

/// Build high-byte and low-byte tables for per-bucket tap weights over `scale`
#[allow(clippy::type_complexity)]
fn split_tables<const N: usize>(
    weights: &[[i32; N]],
    scale: i32,
) -> (Vec<[[i16; N]; 256]>, Vec<[[i16; N]; 256]>) {
    let hi = weights
        .iter()
        .map(|w| {
            std::array::from_fn(|b| {
                std::array::from_fn(|k| ((signed(b) << 8) * w[k] / scale) as i16)
            })
        })
        .collect();
    let lo = weights
        .iter()
        .map(|w| {
            std::array::from_fn(|b| std::array::from_fn(|k| (b as i32 * w[k] / scale) as i16))
        })
        .collect();
    (hi, lo)
}
