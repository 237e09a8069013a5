pub mod app;
pub mod audio;
pub mod config;
pub mod gpu;
pub mod renderer;
pub mod resources;
pub mod window;
pub mod world;

pub use config::ClientConfig;
pub use resources::ResourceRegistry;
pub use world::{Layer, LayerKind, Map, Tile, World};
