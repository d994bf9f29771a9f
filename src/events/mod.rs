//! The execution event stream (spec §3, §4.4, §6.3): a typed, hash-chained
//! log of everything the executor observes during a run, fanned out to
//! any number of sinks through [`EventBus`].

mod bus;
mod emitter;
mod event;
mod hub;
mod sink;

pub use bus::EventBus;
pub use emitter::{EmitterError, EventEmitter};
pub use event::StateEvent;
pub use hub::{BlockingEventIter, EventHub, EventHubMetrics, EventStream, HubEmitter};
pub use sink::{ChannelSink, EventSink, JsonLinesSink, MemorySink, StdOutSink};
