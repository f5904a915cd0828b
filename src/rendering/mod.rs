pub mod assets;
pub mod renderer;
pub mod scene;
