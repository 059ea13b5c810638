use crate::dpl::camera::frame::PlaneBuffer;
use crate::dpl::common::error::Result;
use crate::dpl::utility::facade::ImageView;

/// The three display surfaces of the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DisplayPlane {
    Base,
    Color,
    Depth,
}

impl DisplayPlane {
    pub fn name(self) -> &'static str {
        match self {
            DisplayPlane::Base => "base",
            DisplayPlane::Color => "color",
            DisplayPlane::Depth => "depth",
        }
    }
}

/// Borrowed 8-bit raster; 1 channel is grey, 3 channels are BGR.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Raster<'a> {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub data: &'a [u8],
}

impl<'a> From<&'a PlaneBuffer<u8>> for Raster<'a> {
    fn from(plane: &'a PlaneBuffer<u8>) -> Self {
        Self {
            width: plane.width(),
            height: plane.height(),
            channels: plane.channels(),
            data: plane.data(),
        }
    }
}

impl<'a> From<ImageView<'a>> for Raster<'a> {
    fn from(view: ImageView<'a>) -> Self {
        Self {
            width: view.width,
            height: view.height,
            channels: ImageView::CHANNELS,
            data: view.data,
        }
    }
}

/// Destination for displayed frames.
pub trait FrameSink {
    fn show(&mut self, plane: DisplayPlane, image: Raster<'_>) -> Result<()>;

    /// Called once per poll after all planes of the iteration were shown.
    fn end_frame(&mut self) -> Result<()> {
        Ok(())
    }
}
