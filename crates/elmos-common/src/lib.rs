pub mod error;
pub mod traits;
pub mod types;

pub use error::{ElmosError, Result};
pub use traits::ConsoleSink;
pub use types::{Color, LogLevel, Outcome, Style, StyledRun};
