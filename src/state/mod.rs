pub mod normalize;
pub mod reconcile;
pub mod state_model;
pub mod store;
pub mod sync;
