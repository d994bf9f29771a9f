//! The emitter trait nodes' callers (the scheduler) publish through.

use thiserror::Error;

use super::event::StateEvent;

#[derive(Debug, Error)]
pub enum EmitterError {
    #[error("event stream is closed")]
    Closed,
    #[error("subscriber lagged, {0} events dropped")]
    Lagged(usize),
    #[error("{0}")]
    Other(String),
}

pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: StateEvent) -> Result<(), EmitterError>;
}
