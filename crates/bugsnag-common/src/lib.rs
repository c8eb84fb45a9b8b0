pub mod error;
pub mod time;

pub use error::{ExporterError, Result};
pub use time::{Clock, SystemClock};
