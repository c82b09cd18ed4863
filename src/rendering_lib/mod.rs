// src/rendering_lib/mod.rs

pub mod backend;
pub mod renderer;
pub mod shader;
pub mod texture;
pub mod vertex;

pub use backend::{RenderBackend, Viewport};
pub use renderer::Renderer;
pub use shader::WGSL_SHADER_SOURCE;
pub use texture::Texture;
pub use vertex::Vertex;
