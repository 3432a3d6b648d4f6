use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Pixel layout of a [`CameraFrame`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    Gray8,
    /// Interleaved 8-bit blue, green, red (the usual capture layout).
    Bgr8,
}

impl PixelFormat {
    #[inline]
    pub fn channels(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Bgr8 => 3,
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum FrameError {
    #[error("invalid frame buffer length (expected {expected} bytes, got {got})")]
    InvalidBuffer { expected: usize, got: usize },
    #[error("invalid frame dimensions (width={width}, height={height})")]
    InvalidDimensions { width: usize, height: usize },
}

/// One captured camera image, shared cheaply between papers of a frame.
#[derive(Clone, Debug)]
pub struct CameraFrame {
    pub width: usize,
    pub height: usize,
    pub format: PixelFormat,
    pub data: Arc<[u8]>, // row-major, len = w*h*channels
}

impl CameraFrame {
    pub fn new(
        width: usize,
        height: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::InvalidDimensions { width, height });
        }
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(format.channels()))
            .ok_or(FrameError::InvalidDimensions { width, height })?;
        if data.len() != expected {
            return Err(FrameError::InvalidBuffer {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data: data.into(),
        })
    }

    /// Frame size in pixels as floats, handy for UV normalisation.
    #[inline]
    pub fn size(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }

    /// Luma conversion for marker detection (ITU-R BT.601 weights).
    pub fn to_gray(&self) -> GrayImage {
        let data = match self.format {
            PixelFormat::Gray8 => self.data.to_vec(),
            PixelFormat::Bgr8 => self
                .data
                .chunks_exact(3)
                .map(|px| {
                    let (b, g, r) = (px[0] as u32, px[1] as u32, px[2] as u32);
                    ((299 * r + 587 * g + 114 * b + 500) / 1000) as u8
                })
                .collect(),
        };
        GrayImage {
            width: self.width,
            height: self.height,
            data,
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // row-major, len = w*h
}

#[derive(Clone, Debug)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }
}
