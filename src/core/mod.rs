pub mod config;
pub mod generation;
pub mod options;
pub mod template;
