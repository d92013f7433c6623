mod builder;
mod canvas;
#[cfg(all(target_os = "linux", feature = "camera"))]
mod gst;
mod interface;
mod source;
#[cfg(test)]
mod tests;

pub use builder::CameraInterfaceBuilder;
pub use canvas::{Canvas, PNG_MIME_TYPE};
#[cfg(all(target_os = "linux", feature = "camera"))]
pub use gst::GstVideoSource;
pub use interface::{CameraInterface, LiveStream};
pub use source::{select_source, SyntheticVideoSource, UnavailableSource, VideoSource, VideoStream};
