pub mod builder;
pub mod trigger;
