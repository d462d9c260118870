pub mod engine;
pub mod traits;

pub use engine::{NotificationEngine, NotifyStats};
pub use traits::NotifyStore;
