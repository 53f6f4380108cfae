//! fe-core: shared foundation for the fesuite solver crates.
//!
//! Contains:
//! - numeric (Real + float helpers + scientific formatting)
//! - units (uom SI types used for reference scales)
//! - error (non-finite value errors)

pub mod error;
pub mod numeric;
pub mod units;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use units::*;
