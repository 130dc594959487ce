mod bus;
mod types;

pub use bus::{EventBus, Publisher};
pub use types::Notification;
