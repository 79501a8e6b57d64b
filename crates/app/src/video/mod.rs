//! OpenCV-backed camera, window and detector adapter.

mod camera;
mod detector;
mod window;

pub use camera::Camera;
pub use detector::BridgeOnMat;
pub use window::Window;

fn backend(err: opencv::Error) -> String {
    err.to_string()
}
