pub mod memory;

pub use memory::{StaticUniverse, StaticUniverseParameters};
