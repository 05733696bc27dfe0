//! Progress rate limiting for transfer events.

mod throttle;

pub use throttle::{DEFAULT_PROGRESS_INTERVAL, ProgressThrottle};
