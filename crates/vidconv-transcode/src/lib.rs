//! Transcode engine abstraction and the MediaConvert-compatible client.

mod mediaconvert;
mod traits;

pub use mediaconvert::MediaConvertClient;
pub use traits::{TranscodeEngine, TranscodeError, TranscodeResult};
