mod pixel;
mod renderer;
mod text;
mod transform;

pub use renderer::Renderer;
pub use transform::{centered_draw_position, Viewport};
