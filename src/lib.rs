pub mod api;
pub mod catalog;
pub mod config;
pub mod quiz;
pub mod render;
pub mod state;
