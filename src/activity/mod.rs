pub mod recorder;

pub use recorder::{ActivityLog, ActivityRecorder};
