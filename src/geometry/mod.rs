pub mod attach;
pub mod engine;
