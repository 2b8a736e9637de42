mod camera;
mod scene;
mod skybox;

pub use camera::Camera;
pub use scene::Scene;
pub use skybox::Skybox;
