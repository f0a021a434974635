pub mod data;
pub mod models;
pub mod train;
pub mod utils;
