pub mod engine;
pub mod vigil;
