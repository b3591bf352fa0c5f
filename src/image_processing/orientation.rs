use exif::{Exif, In, Reader, Tag};
use std::path::Path;

/// EXIF orientation values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExifOrientation {
    /// Normal orientation (0 degrees), also used when the tag is missing
    #[default]
    TopLeft = 1,
    /// Horizontally flipped
    TopRight = 2,
    /// Rotated 180 degrees
    BottomRight = 3,
    /// Vertically flipped
    BottomLeft = 4,
    /// Rotated 90 degrees CCW + horizontally flipped
    LeftTop = 5,
    /// Rotated 90 degrees CW (portrait)
    RightTop = 6,
    /// Rotated 90 degrees CW + horizontally flipped
    RightBottom = 7,
    /// Rotated 90 degrees CCW (portrait)
    LeftBottom = 8,
}

impl From<u32> for ExifOrientation {
    /// Values outside [1, 8] fall back to the normal orientation
    fn from(value: u32) -> Self {
        match value {
            2 => ExifOrientation::TopRight,
            3 => ExifOrientation::BottomRight,
            4 => ExifOrientation::BottomLeft,
            5 => ExifOrientation::LeftTop,
            6 => ExifOrientation::RightTop,
            7 => ExifOrientation::RightBottom,
            8 => ExifOrientation::LeftBottom,
            _ => ExifOrientation::TopLeft,
        }
    }
}

impl ExifOrientation {
    /// Tag value as handed to the engine
    pub fn as_tag(&self) -> i32 {
        *self as i32
    }

    /// Get a human-readable description of the orientation
    pub fn description(&self) -> &'static str {
        match self {
            ExifOrientation::TopLeft => "Normal",
            ExifOrientation::TopRight => "Horizontally flipped",
            ExifOrientation::BottomRight => "Rotated 180°",
            ExifOrientation::BottomLeft => "Vertically flipped",
            ExifOrientation::LeftTop => "Rotated 90° CCW + flipped",
            ExifOrientation::RightTop => "Rotated 90° CW (portrait)",
            ExifOrientation::RightBottom => "Rotated 90° CW + flipped",
            ExifOrientation::LeftBottom => "Rotated 90° CCW (portrait)",
        }
    }
}

/// Orientation stored in parsed EXIF data
pub fn orientation_from_exif(exif: &Exif) -> ExifOrientation {
    exif.get_field(Tag::Orientation, In::PRIMARY)
        .and_then(|field| field.value.get_uint(0))
        .map(ExifOrientation::from)
        .unwrap_or_default()
}

/// Read the EXIF orientation of an image file.
///
/// Files without EXIF, or whose EXIF cannot be read, are treated as upright.
pub fn read_exif_orientation(image_path: &Path) -> ExifOrientation {
    let file = match std::fs::File::open(image_path) {
        Ok(file) => file,
        Err(e) => {
            tracing::debug!("No EXIF for {}: {}", image_path.display(), e);
            return ExifOrientation::default();
        }
    };

    let mut buf_reader = std::io::BufReader::new(file);
    match Reader::new().read_from_container(&mut buf_reader) {
        Ok(exif) => orientation_from_exif(&exif),
        Err(e) => {
            tracing::debug!("No EXIF for {}: {}", image_path.display(), e);
            ExifOrientation::default()
        }
    }
}
