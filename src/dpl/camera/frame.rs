//! Caller-owned frame buffers
//!
//! Pixel memory handed out by the native library is only valid until the next
//! retrieval, so every plane is copied out here, rotated by 180° to upright
//! orientation. A plane the library did not produce is zero-filled in its last
//! valid shape.

use tracing::warn;

use crate::dpl::common::error::StatusCode;
use crate::dpl::ffi::types::{DepthType, FrameData, ImageType};

/// Outcome for one plane of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    /// Fresh data was copied in.
    Ready,
    /// Not produced this frame; the buffer holds zeros.
    Absent,
    /// The retrieval call failed; the buffer holds zeros.
    Failed(StatusCode),
}

impl BufferState {
    pub fn is_ready(self) -> bool {
        self == BufferState::Ready
    }
}

/// Per-frame summary returned alongside the buffers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStatus {
    pub frame_no: i32,
    pub gain: i32,
    pub exposure: i32,
    /// Error reported by the camera itself for this frame.
    pub camera_error: StatusCode,
    pub base: BufferState,
    pub color: BufferState,
    pub depth: BufferState,
}

impl FrameStatus {
    pub(crate) fn failed(code: StatusCode) -> Self {
        Self {
            frame_no: -1,
            gain: 0,
            exposure: 0,
            camera_error: StatusCode::OK,
            base: BufferState::Failed(code),
            color: BufferState::Failed(code),
            depth: BufferState::Failed(code),
        }
    }

    fn absent(frame: &FrameData) -> Self {
        Self {
            frame_no: frame.frameNo,
            gain: frame.gain,
            exposure: frame.exposure,
            camera_error: StatusCode(frame.camera_status.error_code),
            base: BufferState::Absent,
            color: BufferState::Absent,
            depth: BufferState::Absent,
        }
    }
}

/// A row-major image plane with interleaved channels.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaneBuffer<T> {
    width: usize,
    height: usize,
    channels: usize,
    data: Vec<T>,
}

impl<T: Copy + Default> PlaneBuffer<T> {
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![T::default(); width * height * channels],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Zero-fills the plane, keeping its shape.
    pub fn clear(&mut self) {
        self.data.fill(T::default());
    }

    /// Copies `src` (row-major, `width * height * channels` elements) rotated by 180°.
    pub fn copy_rotated(&mut self, src: &[T], width: usize, height: usize, channels: usize) {
        let len = width * height * channels;
        debug_assert_eq!(src.len(), len);

        self.width = width;
        self.height = height;
        self.channels = channels;
        self.data.resize(len, T::default());

        for (dst, pixel) in self
            .data
            .chunks_exact_mut(channels)
            .zip(src.chunks_exact(channels).rev())
        {
            dst.copy_from_slice(pixel);
        }
    }
}

/// Base, colour and disparity planes of the most recent frame.
#[derive(Debug, Clone)]
pub struct FrameBuffers {
    pub base: PlaneBuffer<u8>,
    /// BGR, 3 channels.
    pub color: PlaneBuffer<u8>,
    pub depth: PlaneBuffer<f32>,
}

impl FrameBuffers {
    /// Allocates all planes at the camera's maximum size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            base: PlaneBuffer::new(width, height, 1),
            color: PlaneBuffer::new(width, height, 3),
            depth: PlaneBuffer::new(width, height, 1),
        }
    }

    pub(crate) fn clear(&mut self) {
        self.base.clear();
        self.color.clear();
        self.depth.clear();
    }

    /// Copies frame `frame` out of native memory.
    ///
    /// # Safety
    ///
    /// Every non-null image pointer in `frame` must reference at least
    /// `width * height * channels` readable elements.
    pub(crate) unsafe fn fill_from(&mut self, frame: &FrameData) -> FrameStatus {
        let mut status = FrameStatus::absent(frame);

        // Without a base image the frame is unusable as a whole.
        // SAFETY: forwarded from the caller.
        let Some((base, width, height)) = (unsafe { image_slice(&frame.p1, 1) }) else {
            self.clear();
            return status;
        };
        self.base.copy_rotated(base, width, height, 1);
        status.base = BufferState::Ready;

        // SAFETY: forwarded from the caller.
        match unsafe { image_slice(&frame.color, 3) } {
            Some((color, width, height)) => {
                self.color.copy_rotated(color, width, height, 3);
                status.color = BufferState::Ready;
            }
            None => self.color.clear(),
        }

        // SAFETY: forwarded from the caller.
        match unsafe { depth_slice(&frame.depth) } {
            Some((depth, width, height)) => {
                self.depth.copy_rotated(depth, width, height, 1);
                status.depth = BufferState::Ready;
            }
            None => self.depth.clear(),
        }

        status
    }
}

fn dimensions(width: i32, height: i32) -> Option<(usize, usize)> {
    if width <= 0 || height <= 0 {
        None
    } else {
        Some((width as usize, height as usize))
    }
}

unsafe fn image_slice(image: &ImageType, channels: usize) -> Option<(&[u8], usize, usize)> {
    let (width, height) = dimensions(image.width, image.height)?;
    if image.image.is_null() {
        warn!(width, height, "native image has dimensions but no data");
        return None;
    }
    // SAFETY: guaranteed by the caller of `fill_from`.
    let data = unsafe { std::slice::from_raw_parts(image.image, width * height * channels) };
    Some((data, width, height))
}

unsafe fn depth_slice(depth: &DepthType) -> Option<(&[f32], usize, usize)> {
    let (width, height) = dimensions(depth.width, depth.height)?;
    if depth.image.is_null() {
        warn!(width, height, "native disparity has dimensions but no data");
        return None;
    }
    // SAFETY: guaranteed by the caller of `fill_from`.
    let data = unsafe { std::slice::from_raw_parts(depth.image, width * height) };
    Some((data, width, height))
}
