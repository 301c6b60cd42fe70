mod camera;
mod pipelines;
mod renderer;

pub(crate) use renderer::Renderer;
