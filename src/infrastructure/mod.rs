pub mod memory_repo;
pub mod models;
pub mod shipping_repo;
pub mod system;
