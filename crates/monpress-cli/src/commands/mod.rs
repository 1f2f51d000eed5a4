pub mod dev;
pub mod generate;
pub mod new;
