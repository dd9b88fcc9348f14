pub mod classifier;
pub mod engine;
pub mod extra_model;
pub mod identity;
pub mod indexer;
pub mod mutator;
