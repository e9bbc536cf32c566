pub mod engine;

pub use engine::AllocationEngine;
