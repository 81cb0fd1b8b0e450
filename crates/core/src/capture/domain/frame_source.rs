use crate::shared::frame::Frame;
use crate::shared::pixel_format::PixelFormat;

/// A camera the host renders on demand.
///
/// Dimensions and pixel layout are fixed for the lifetime of the source;
/// the recorder sizes its staging frame from them once at bind time.
pub trait FrameSource: Send {
    /// Camera name, used to name the first-frame still.
    fn name(&self) -> &str;

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn pixel_format(&self) -> PixelFormat {
        PixelFormat::Rgba
    }

    /// Renders the camera's current view into its internal buffer.
    fn render_current_view(&mut self) -> Result<(), Box<dyn std::error::Error>>;

    /// Copies the most recently rendered pixels into `image`, overwriting it.
    fn copy_rendered_pixels_into(
        &mut self,
        image: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>>;
}
