// src/matching/mod.rs
pub mod assembler;
pub mod candidates;
pub mod context;
pub mod coordinates;
pub mod normalize;
pub mod resolver;
pub mod scorer;

pub use resolver::{Deadline, LocationResolver, PassControl, Unbounded};
