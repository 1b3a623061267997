//! Timezone-aware job scheduler
//!
//! Fires registered jobs at configured wall-clock times in the trading
//! timezone. Each job fires at most once per scheduled instant, and a job
//! instance still running when its next instant arrives is skipped.

mod jobs;

pub use jobs::{JobCallback, JobSchedule, JobScheduler};
