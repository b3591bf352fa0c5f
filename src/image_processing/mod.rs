pub mod buffer;
pub mod orientation;

use image::{ColorType, DynamicImage, ImageReader};
use std::path::Path;
use tracing::debug;

use crate::engine::{Frame, ImageType};
use crate::error::{MicrError, Result};

pub use orientation::ExifOrientation;

/// A decoded bitmap, laid out the way the engine reads it
#[derive(Debug, Clone)]
pub struct MicrImage {
    pub image_type: ImageType,
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Samples per row, `>= width`
    pub stride: u32,
    pub orientation: ExifOrientation,
}

impl MicrImage {
    /// Wrap a tightly packed buffer with `bpp` bytes per pixel
    pub fn from_packed(
        bpp: u8,
        data: Vec<u8>,
        width: u32,
        height: u32,
        orientation: ExifOrientation,
    ) -> Result<Self> {
        let image_type = ImageType::from_bytes_per_pixel(bpp)?;
        let (data, stride) = buffer::align_rows(data, width, height, image_type)?;

        Ok(Self {
            image_type,
            data,
            width,
            height,
            stride,
            orientation,
        })
    }

    pub fn as_frame(&self) -> Result<Frame<'_>> {
        Frame::new(
            self.image_type,
            &self.data,
            self.width as usize,
            self.height as usize,
            self.stride as usize,
            self.orientation.as_tag(),
        )
    }
}

/// Decode a JPEG/PNG/BMP file into an engine-ready bitmap
pub fn decode_file(path: &Path) -> Result<MicrImage> {
    if !path.is_file() {
        return Err(MicrError::ImageNotFound(path.to_path_buf()));
    }

    let img = ImageReader::open(path)?.with_guessed_format()?.decode()?;
    let (width, height) = (img.width(), img.height());
    let orientation = orientation::read_exif_orientation(path);
    debug!(
        "Decoded {}: {}x{} {:?}, orientation {} ({})",
        path.display(),
        width,
        height,
        img.color(),
        orientation.as_tag(),
        orientation.description()
    );

    let (bpp, data) = packed_pixels(img)?;
    MicrImage::from_packed(bpp, data, width, height, orientation)
}

/// Grayscale, RGB and RGBA are kept (deeper samples are reduced to 8 bits).
/// Gray+alpha of any depth would be 2 bytes per pixel and is rejected as such.
fn packed_pixels(img: DynamicImage) -> Result<(u8, Vec<u8>)> {
    match img.color() {
        ColorType::L8 | ColorType::L16 => Ok((1, img.into_luma8().into_raw())),
        ColorType::Rgb8 | ColorType::Rgb16 | ColorType::Rgb32F => {
            Ok((3, img.into_rgb8().into_raw()))
        }
        ColorType::Rgba8 | ColorType::Rgba16 | ColorType::Rgba32F => {
            Ok((4, img.into_rgba8().into_raw()))
        }
        ColorType::La8 | ColorType::La16 => Err(MicrError::UnsupportedBytesPerPixel(
            ColorType::La8.bytes_per_pixel(),
        )),
        other => Err(MicrError::UnsupportedColorType(format!("{:?}", other))),
    }
}
