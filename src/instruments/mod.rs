pub mod channel;
pub mod keysight;
pub mod measure;
pub mod models;
pub mod statistics;

pub use channel::Channel;
pub use keysight::{AnnotationColor, Background, Identity, Oscilloscope};
pub use models::{CountRule, Placement, Variant};
pub use statistics::StatRecord;
