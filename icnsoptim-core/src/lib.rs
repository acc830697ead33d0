pub mod config;
pub mod iconset;
pub mod pipeline;
pub mod tools;

