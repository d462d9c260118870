pub mod jobs;
pub mod periodic;

pub use jobs::{NotifyJob, ScrapeJob};
pub use periodic::{CycleJob, PeriodicWorker};
