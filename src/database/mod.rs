pub mod catalog;
pub mod memory;
pub mod pool;
pub mod postgres;
