//! Boundary to the native MICR recognition engine
//!
//! The engine is an opaque, process-wide collaborator: `init` once, any
//! number of `process` calls, `deinit` once. [`MicrEngine`] is the raw call
//! surface; [`Session`] enforces the ordering and releases the engine on every
//! exit path.

pub mod ffi;
pub mod native;

#[cfg(test)]
pub(crate) mod fake;

use strum_macros::{Display, EnumIter};
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::error::{MicrError, Result};
use crate::image_processing::MicrImage;

pub use native::NativeEngine;

/// Pixel layouts understood by the engine, in the order of the SDK header
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ImageType {
    #[strum(serialize = "RGB24")]
    Rgb24 = 0,
    #[strum(serialize = "RGBA32")]
    Rgba32 = 1,
    #[strum(serialize = "BGRA32")]
    Bgra32 = 2,
    #[strum(serialize = "NV12")]
    Nv12 = 3,
    #[strum(serialize = "NV21")]
    Nv21 = 4,
    #[strum(serialize = "YUV420P")]
    Yuv420p = 5,
    #[strum(serialize = "YVU420P")]
    Yvu420p = 6,
    #[strum(serialize = "YUV422P")]
    Yuv422p = 7,
    #[strum(serialize = "YUV444P")]
    Yuv444p = 8,
    /// 8-bit grayscale
    #[strum(serialize = "Y")]
    Y = 9,
    #[strum(serialize = "BGR24")]
    Bgr24 = 10,
}

impl ImageType {
    /// Layout of a decoded bitmap with `bpp` bytes per pixel
    pub fn from_bytes_per_pixel(bpp: u8) -> Result<Self> {
        match bpp {
            1 => Ok(ImageType::Y),
            3 => Ok(ImageType::Rgb24),
            4 => Ok(ImageType::Rgba32),
            other => Err(MicrError::UnsupportedBytesPerPixel(other)),
        }
    }

    /// Bytes per pixel for packed layouts, `None` for YUV
    pub fn bytes_per_pixel(&self) -> Option<usize> {
        match self {
            ImageType::Y => Some(1),
            ImageType::Rgb24 | ImageType::Bgr24 => Some(3),
            ImageType::Rgba32 | ImageType::Bgra32 => Some(4),
            _ => None,
        }
    }

    pub fn is_yuv(&self) -> bool {
        self.bytes_per_pixel().is_none()
    }

    pub fn as_raw(&self) -> i32 {
        *self as i32
    }
}

/// A packed (grayscale / RGB-family) frame ready for `process`
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    pub image_type: ImageType,
    pub data: &'a [u8],
    pub width: usize,
    pub height: usize,
    /// Samples per row, never less than `width`
    pub stride: usize,
    pub exif_orientation: i32,
}

impl<'a> Frame<'a> {
    pub fn new(
        image_type: ImageType,
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        exif_orientation: i32,
    ) -> Result<Self> {
        let bpp = image_type
            .bytes_per_pixel()
            .ok_or_else(|| MicrError::ImageTypeMismatch(image_type.to_string()))?;
        let stride = if stride == 0 { width } else { stride };
        if stride < width {
            return Err(MicrError::BufferTooSmall {
                expected: width * bpp,
                actual: stride * bpp,
            });
        }

        let expected = stride * height * bpp;
        if data.len() < expected {
            return Err(MicrError::BufferTooSmall {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            image_type,
            data,
            width,
            height,
            stride,
            exif_orientation,
        })
    }
}

/// A planar or semi-planar YUV frame, typically straight from a camera
#[derive(Debug, Clone, Copy)]
pub struct PlanarFrame<'a> {
    pub image_type: ImageType,
    pub y: &'a [u8],
    pub u: &'a [u8],
    pub v: &'a [u8],
    pub width: usize,
    pub height: usize,
    pub y_stride: usize,
    pub u_stride: usize,
    pub v_stride: usize,
    /// Distance between two chroma samples, 0 lets the engine infer it from the type
    pub uv_pixel_stride: usize,
    pub exif_orientation: i32,
}

impl<'a> PlanarFrame<'a> {
    /// Check the frame before it crosses the foreign boundary
    pub fn validate(&self) -> Result<()> {
        if !self.image_type.is_yuv() {
            return Err(MicrError::ImageTypeMismatch(self.image_type.to_string()));
        }

        let expected = self.y_stride.max(self.width) * self.height;
        if self.y.len() < expected {
            return Err(MicrError::BufferTooSmall {
                expected,
                actual: self.y.len(),
            });
        }
        if self.u.is_empty() || self.v.is_empty() {
            return Err(MicrError::BufferTooSmall {
                expected: 1,
                actual: 0,
            });
        }
        Ok(())
    }
}

/// Outcome of an engine call. `code == 0` means success
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineResult {
    pub code: i32,
    pub phrase: String,
    pub json: String,
}

impl EngineResult {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

/// Raw call surface of the engine.
///
/// `Err` is reserved for failures to reach the engine (missing symbol, bad
/// argument); a call that ran but failed comes back as a non-OK
/// [`EngineResult`].
pub trait MicrEngine {
    fn init(&mut self, config_json: &str) -> Result<EngineResult>;

    fn process(&mut self, frame: &Frame<'_>) -> Result<EngineResult>;

    fn process_planar(&mut self, frame: &PlanarFrame<'_>) -> Result<EngineResult>;

    /// Run a fake inference so models are loaded before timing starts
    fn warm_up(&mut self, image_type: ImageType) -> Result<EngineResult>;

    fn deinit(&mut self) -> Result<EngineResult>;

    fn request_runtime_license_key(&mut self, raw_instead_of_json: bool) -> Result<EngineResult>;
}

/// Turn a non-OK result into an error
pub fn check(operation: &'static str, result: EngineResult) -> Result<EngineResult> {
    if result.is_ok() {
        debug!("{}: OK -> {}", operation, result.json);
        Ok(result)
    } else {
        Err(MicrError::Engine {
            operation,
            code: result.code,
            phrase: result.phrase,
            json: result.json,
        })
    }
}

/// An initialized engine.
///
/// Only [`Session::init`] creates one, so nothing can be processed before
/// `init` succeeded. The engine is de-initialized exactly once: explicitly
/// through [`Session::deinit`], or on drop.
pub struct Session<E: MicrEngine> {
    engine: E,
    active: bool,
}

impl<E: MicrEngine> Session<E> {
    pub fn init(engine: E, config: &EngineConfig) -> Result<Self> {
        Self::init_with_json(engine, &config.to_json()?)
    }

    pub fn init_with_json(mut engine: E, config_json: &str) -> Result<Self> {
        debug!("Engine configuration: {}", config_json);
        check("Init", engine.init(config_json)?)?;
        Ok(Self {
            engine,
            active: true,
        })
    }

    pub fn process(&mut self, frame: &Frame<'_>) -> Result<EngineResult> {
        check("Process", self.engine.process(frame)?)
    }

    pub fn process_image(&mut self, image: &MicrImage) -> Result<EngineResult> {
        self.process(&image.as_frame()?)
    }

    pub fn process_planar(&mut self, frame: &PlanarFrame<'_>) -> Result<EngineResult> {
        frame.validate()?;
        check("Process", self.engine.process_planar(frame)?)
    }

    pub fn warm_up(&mut self, image_type: ImageType) -> Result<EngineResult> {
        check("WarmUp", self.engine.warm_up(image_type)?)
    }

    /// Unchecked: a refused key request is reported, not fatal
    pub fn request_runtime_license_key(&mut self, raw_instead_of_json: bool) -> Result<EngineResult> {
        self.engine.request_runtime_license_key(raw_instead_of_json)
    }

    pub fn deinit(mut self) -> Result<EngineResult> {
        self.active = false;
        check("DeInit", self.engine.deinit()?)
    }
}

impl<E: MicrEngine> Drop for Session<E> {
    fn drop(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        info!("Releasing engine...");
        match self.engine.deinit() {
            Ok(result) if result.is_ok() => {}
            Ok(result) => warn!("DeInit failed: {} ({})", result.phrase, result.code),
            Err(e) => warn!("DeInit failed: {}", e),
        }
    }
}
