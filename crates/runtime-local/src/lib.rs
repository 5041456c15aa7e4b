mod clock;
mod context;
mod kv;

pub use clock::ManualClock;
pub use context::{BackgroundTasks, LocalRequestContext};
pub use kv::InMemoryKvStore;
