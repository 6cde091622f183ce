pub mod app;
pub mod audio;
pub mod color;
pub mod config;
pub mod effects;
pub mod export;
pub mod font;
pub mod noise;
pub mod overlay;
pub mod project;
pub mod scheduler;
pub mod settings;
pub mod surface;
pub mod visual;
