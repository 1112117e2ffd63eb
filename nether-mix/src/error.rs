//! Mixer setup error types
//!
//! Rendering itself cannot fail; these errors come from building tables and
//! channels out of caller-supplied data.

use thiserror::Error;

/// Errors raised while validating tables or channel data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MixError {
    /// A volume table needs at least one row
    #[error("volume table has no rows")]
    EmptyVolumeTable,

    /// Sample data holds no frames
    #[error("sample has no frames")]
    EmptySample,

    /// Interleaved stereo data with a dangling half frame
    #[error("stereo sample has odd word count {0}")]
    StereoSampleOdd(usize),

    /// Sample length does not fit the 32-bit frame cursor
    #[error("sample too long: {0} frames")]
    SampleTooLong(usize),

    /// Loop points outside the sample or reversed
    #[error("loop {start}..{end} out of range for {length} frames")]
    LoopOutOfRange { start: u32, end: u32, length: u32 },

    /// Clip bound outside the 24-bit range the byte tables cover
    #[error("clip max {0} outside 1..=0x7fffff")]
    ClipMaxOutOfRange(i32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(MixError::EmptyVolumeTable.to_string(), "volume table has no rows");
        assert_eq!(
            MixError::LoopOutOfRange {
                start: 4,
                end: 12,
                length: 10
            }
            .to_string(),
            "loop 4..12 out of range for 10 frames"
        );
        assert_eq!(
            MixError::ClipMaxOutOfRange(0).to_string(),
            "clip max 0 outside 1..=0x7fffff"
        );
    }
}
