use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;
use crate::shared::pixel_format::PixelFormat;

/// Synthetic camera that renders a diagonal gradient scrolling one pixel
/// per render, with a frame-counter band along the top rows.
///
/// Stands in for a real simulation camera when driving the recorder
/// from the command line.
pub struct TestPatternSource {
    name: String,
    width: u32,
    height: u32,
    format: PixelFormat,
    rendered: Frame,
    renders: u64,
}

impl TestPatternSource {
    pub fn new(name: impl Into<String>, width: u32, height: u32) -> Self {
        Self::with_format(name, width, height, PixelFormat::Rgba)
    }

    pub fn with_format(
        name: impl Into<String>,
        width: u32,
        height: u32,
        format: PixelFormat,
    ) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            format,
            rendered: Frame::blank(width, height, format),
            renders: 0,
        }
    }

    pub fn renders(&self) -> u64 {
        self.renders
    }
}

impl FrameSource for TestPatternSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    fn render_current_view(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        let shift = self.renders as usize;
        let band = (self.renders % 256) as u8;
        let mut pixels = self.rendered.as_ndarray_mut();
        for ((row, col, channel), value) in pixels.indexed_iter_mut() {
            *value = match channel {
                0 => ((col + shift) % 256) as u8,
                1 => ((row + shift) % 256) as u8,
                2 if row < 8 => band,
                2 => ((row + col) % 256) as u8,
                _ => u8::MAX,
            };
        }
        self.renders += 1;
        Ok(())
    }

    fn copy_rendered_pixels_into(
        &mut self,
        image: &mut Frame,
    ) -> Result<(), Box<dyn std::error::Error>> {
        if image.data().len() != self.rendered.data().len() {
            return Err(format!(
                "staging image holds {} bytes, rendered frame has {}",
                image.data().len(),
                self.rendered.data().len()
            )
            .into());
        }
        image.data_mut().copy_from_slice(self.rendered.data());
        Ok(())
    }
}
