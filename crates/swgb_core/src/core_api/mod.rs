mod engine;
mod types;

pub use engine::{Engine, Session};
pub use types::{PlayerEntry, Snapshot};
