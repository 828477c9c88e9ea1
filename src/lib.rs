pub mod config;
pub mod crop;
pub mod error;
pub mod geometry;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod region;
pub mod render;
