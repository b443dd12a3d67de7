pub mod core;
pub mod marks;
