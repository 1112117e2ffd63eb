//! Nether-Mix: fixed-point software channel mixer
//!
//! Renders any number of independent sample-playback channels into an
//! accumulation buffer using 16.16 fixed-point resampling. Every voice carries
//! its own pitch, loop mode, stereo volume matrix and anti-click volume ramp.
//!
//! Two mixers share one loop resolver and one generic render core:
//!
//! | Mixer | Output | Volume | Use |
//! |-------|--------|--------|-----|
//! | [`RMixer`] | `i32` accumulate, mono or stereo | 2x2 matrix via [`VolumeTable`] | regular playback |
//! | [`QMixer`] | `i16` store, single channel | none (applied later by `amplify_channel*`) | quality mode |
//!
//! The render path never allocates, locks or logs per sample. Lookup tables are
//! built (or loaded) once by the caller and shared by reference.
//!
//! # Block flow
//!
//! ```
//! use nether_mix::{
//!     Channel, ChannelStatus, ClipTables, FadeTail, InterpTable, OutputLayout, RMixer,
//!     SampleData, VolumeTable, clip,
//! };
//!
//! let volume = VolumeTable::linear(1);
//! let interp = InterpTable::new();
//! let mixer = RMixer::new(&volume, &interp, OutputLayout::Stereo);
//!
//! let data: Vec<i8> = (0..64).map(|i| (i * 2) as i8).collect();
//! let mut channel = Channel::new(SampleData::Bit8(&data)).unwrap();
//! channel.step = 0x0001_8000;
//! channel.set_volume_pan(64, 0);
//! channel.status |= ChannelStatus::PLAYING;
//!
//! let mut fade = FadeTail::new();
//! let mut acc = vec![0i32; 2 * 32];
//! fade.apply(&mut acc, OutputLayout::Stereo);
//! mixer.play_channel(&mut acc, &mut fade, &mut channel);
//!
//! let tables = ClipTables::new(256);
//! let mut pcm = vec![0i16; acc.len()];
//! clip(&mut pcm, &acc, &tables, 0x7fff);
//! ```

mod channel;
mod clip;
mod error;
mod fade;
mod position;
mod qmix;
mod ramp;
mod render;
mod resolver;
mod rmix;
mod tables;


pub use channel::{Channel, ChannelStatus, LoopMode, SampleData};
pub use clip::{CLIP_MAX, ClipTables, PcmWord, clip};
pub use error::MixError;
pub use fade::FadeTail;
pub use position::{advance, reflect_about};
pub use qmix::QMixer;
pub use ramp::{Ramp, plan_ramp};
pub use render::{Interpolation, OutputLayout};
pub use resolver::{Boundary, Run, resolve, wrap};
pub use rmix::RMixer;
pub use tables::{InterpTable, QInterpMaxTable, QInterpTable, QVolumeTable, VolumeTable};

// =============================================================================
// Constants
// =============================================================================

/// Fractional bits of the 16.16 step and cursor
pub const FRAC_BITS: u32 = 16;

/// Highest volume level a channel tap can hold (tables carry `MAX_VOLUME + 1` rows)
pub const MAX_VOLUME: i32 = 64;

/// Pan range: -64 (hard left) ..= 64 (hard right)
pub const MAX_PAN: i32 = 64;

/// Buckets in the R mixer linear interpolation table (`fpos >> 12`)
pub const INTERP_STEPS: usize = 16;

/// Buckets in the Q mixer linear interpolation table (`fpos >> 11`)
pub const QINTERP_STEPS: usize = 32;

/// Buckets in the Q mixer 3-tap interpolation table (`fpos >> 12`)
pub const QINTERP_MAX_STEPS: usize = 16;
