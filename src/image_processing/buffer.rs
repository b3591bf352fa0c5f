use crate::engine::ImageType;
use crate::error::{MicrError, Result};

/// Row stride, in samples, the engine expects for a `width`-pixel row.
///
/// 24-bit rows must span a whole number of DWORDs, so their stride is rounded
/// up to the next multiple of 4 pixels. Other layouts are already aligned.
pub fn aligned_stride(width: u32, image_type: ImageType) -> u32 {
    match image_type {
        ImageType::Rgb24 | ImageType::Bgr24 if width % 4 != 0 => (width + 3) & !3,
        _ => width,
    }
}

/// Normalize a tightly packed buffer to the engine's row alignment.
///
/// Returns the (possibly padded) buffer and its stride in samples. Padding
/// samples are zero and the logical width is unchanged.
pub fn align_rows(
    data: Vec<u8>,
    width: u32,
    height: u32,
    image_type: ImageType,
) -> Result<(Vec<u8>, u32)> {
    let bpp = image_type
        .bytes_per_pixel()
        .ok_or_else(|| MicrError::ImageTypeMismatch(image_type.to_string()))?;
    let row_bytes = width as usize * bpp;
    let expected = row_bytes * height as usize;
    if data.len() < expected {
        return Err(MicrError::BufferTooSmall {
            expected,
            actual: data.len(),
        });
    }

    let stride = aligned_stride(width, image_type);
    if stride == width {
        return Ok((data, stride));
    }

    tracing::debug!(
        "Image width ({}) not a multiple of DWORD, padding rows to {} samples",
        width,
        stride
    );

    let stride_bytes = stride as usize * bpp;
    let mut padded = vec![0u8; stride_bytes * height as usize];
    for (src, dst) in data[..expected]
        .chunks_exact(row_bytes)
        .zip(padded.chunks_exact_mut(stride_bytes))
    {
        dst[..row_bytes].copy_from_slice(src);
    }

    Ok((padded, stride))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_stride() {
        assert_eq!(aligned_stride(4, ImageType::Rgb24), 4);
        assert_eq!(aligned_stride(5, ImageType::Rgb24), 8);
        assert_eq!(aligned_stride(6, ImageType::Rgb24), 8);
        assert_eq!(aligned_stride(7, ImageType::Bgr24), 8);
        assert_eq!(aligned_stride(1279, ImageType::Rgb24), 1280);
        // only 24-bit rows need padding
        assert_eq!(aligned_stride(5, ImageType::Y), 5);
        assert_eq!(aligned_stride(5, ImageType::Rgba32), 5);
    }

    #[test]
    fn test_padded_rows_are_dword_aligned() {
        for width in 1..=17u32 {
            let stride = aligned_stride(width, ImageType::Rgb24);
            assert_eq!((stride * 3) % 4, 0, "width {}", width);
            assert!(stride >= width && stride < width + 4);
        }
    }

    #[test]
    fn test_align_rows_pads_rgb24() {
        // 3x2 image, each pixel value = row * 10 + column
        let mut data = Vec::new();
        for row in 0..2u8 {
            for col in 0..3u8 {
                let v = row * 10 + col;
                data.extend_from_slice(&[v, v, v]);
            }
        }

        let (padded, stride) = align_rows(data, 3, 2, ImageType::Rgb24).unwrap();
        assert_eq!(stride, 4);
        assert_eq!(padded.len(), 4 * 3 * 2);
        assert_eq!(&padded[0..9], &[0, 0, 0, 1, 1, 1, 2, 2, 2]);
        assert_eq!(&padded[9..12], &[0, 0, 0]);
        assert_eq!(&padded[12..21], &[10, 10, 10, 11, 11, 11, 12, 12, 12]);
        assert_eq!(&padded[21..24], &[0, 0, 0]);
    }

    #[test]
    fn test_align_rows_keeps_aligned_buffers() {
        let data = vec![7u8; 4 * 3 * 2];
        let (out, stride) = align_rows(data.clone(), 4, 2, ImageType::Rgb24).unwrap();
        assert_eq!(stride, 4);
        assert_eq!(out, data);

        let gray = vec![1u8; 5 * 3];
        let (out, stride) = align_rows(gray.clone(), 5, 3, ImageType::Y).unwrap();
        assert_eq!(stride, 5);
        assert_eq!(out, gray);
    }

    #[test]
    fn test_align_rows_rejects_short_buffer() {
        assert!(matches!(
            align_rows(vec![0u8; 10], 5, 1, ImageType::Rgb24),
            Err(MicrError::BufferTooSmall { expected: 15, actual: 10 })
        ));
    }

    #[test]
    fn test_align_rows_rejects_yuv() {
        assert!(matches!(
            align_rows(vec![0u8; 16], 4, 4, ImageType::Nv21),
            Err(MicrError::ImageTypeMismatch(_))
        ));
    }
}
