// Library root: exposes the orchestration modules so integration tests can
// drive the event loop directly.

pub mod app;
pub mod protocol;
