mod event_store;
mod live_world;

pub use event_store::{DiffMatch, DiffQuery, IEventStore};
pub use live_world::ILiveWorld;
