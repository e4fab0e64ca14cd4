//! Control of Keysight MSO-X/DSO-X 3000A, UXR and MXR oscilloscopes over
//! SCPI.
//!
//! ```no_run
//! use oscope_scpi::{load_settings_or_default, Channel, Oscilloscope};
//!
//! # fn main() -> Result<(), oscope_scpi::Error> {
//! let mut scope = Oscilloscope::open(&load_settings_or_default(None))?;
//! scope.setup_autoscale(&[Channel::Analog(1)])?;
//! for stat in scope.measure_statistics()? {
//!     println!("{} {}", stat.label, scope.polish(stat.mean, None));
//! }
//! scope.close()
//! # }
//! ```

pub mod config;
pub mod error;
pub mod instruments;
pub mod protocols;
pub mod scpi;
pub mod session;
pub mod units;
pub mod visa;

pub use self::config::{load_settings, load_settings_or_default, Settings};
pub use error::Error;
pub use instruments::{
    AnnotationColor, Background, Channel, Identity, Oscilloscope, StatRecord, Variant,
};
pub use session::Session;
pub use units::{Polished, Quantity, OVER_RANGE};
pub use visa::Resource;
