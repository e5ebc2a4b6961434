//! Vendor data extraction: vendor page text → [`McuSpecification`].
//!
//! [`McuSpecification`]: crate::mcu::McuSpecification

pub mod text;
pub mod vendor;

pub use vendor::{ExtractError, VendorExtractor};
