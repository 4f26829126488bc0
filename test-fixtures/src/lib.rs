//! Shared test fixtures for the Hindsight workspace: an in-memory change
//! log, a blog-shaped entity world (users, posts, comments, categories,
//! tags, versions), and record builders for scripting histories.

pub mod events;
pub mod log;
pub mod world;

pub use events::{diff, event};
pub use log::MemoryEventLog;
pub use world::{blog_world, BlogWorld};
