pub mod api;
pub mod config;
pub mod models;
pub mod normalize;
pub mod storage;
