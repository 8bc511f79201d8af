pub mod market;
pub mod signal;
