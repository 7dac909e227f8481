//! QR code (ISO/IEC 18004:2006, Model 2) encoder.
//!
//! Turns a byte string and an error correction level into a matrix of
//! dark/light modules, picking the smallest fitting version and the
//! lowest-penalty mask. Rendering is left to the caller: `QR::bitmap`
//! and friends expose the finished symbol as boolean matrices.

pub mod builder;

mod bitstream;
mod codec;
mod ec;
mod error;
mod iter;
mod mask;
mod metadata;
mod qr;

pub use builder::QRBuilder;
pub use codec::Mode;
pub use error::{QRError, QRResult};
pub use mask::MaskPattern;
pub use metadata::{ECLevel, Version};
pub use qr::{QR, QUIET_ZONE_WIDTH};
