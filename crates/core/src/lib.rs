//! Video watermark removal: locate a known logo by normalized
//! cross-correlation, mask it, and fill the hole by fast-marching inpainting,
//! one streamed frame at a time.

pub mod inpainting;
pub mod localization;
pub mod masking;
pub mod pipeline;
pub mod shared;
pub mod template;
pub mod video;
