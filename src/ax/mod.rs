pub mod attribute;
pub mod probe;
pub mod walker;
