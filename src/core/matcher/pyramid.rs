//! Scale pyramid for multi-scale keypoint detection.
//!
//! Levels are downscaled from the full-resolution image with
//! fast_image_resize (SIMD bilinear).

use fast_image_resize::{images::Image, PixelType, ResizeOptions, Resizer};
use image::GrayImage;

/// One pyramid level
pub struct PyramidLevel {
    /// Level index, 0 = full resolution
    pub octave: u8,
    /// Factor mapping level coordinates back to full resolution
    pub scale: f32,
    pub image: GrayImage,
}

/// Build up to `levels` levels, each `scale_factor` smaller than the last.
///
/// Stops early once a level would be `min_side` pixels or smaller on either axis.
pub fn build_pyramid(
    image: &GrayImage,
    levels: u8,
    scale_factor: f32,
    min_side: u32,
) -> Vec<PyramidLevel> {
    let mut pyramid = Vec::with_capacity(levels as usize);
    if image.width() <= min_side || image.height() <= min_side {
        return pyramid;
    }

    pyramid.push(PyramidLevel {
        octave: 0,
        scale: 1.0,
        image: image.clone(),
    });

    let mut resizer = Resizer::new();
    let mut scale = 1.0f32;

    for octave in 1..levels {
        scale *= scale_factor;
        let width = (image.width() as f32 / scale).round() as u32;
        let height = (image.height() as f32 / scale).round() as u32;

        if width <= min_side || height <= min_side {
            break;
        }

        match resize(&mut resizer, image, width, height) {
            Some(level) => pyramid.push(PyramidLevel {
                octave,
                scale,
                image: level,
            }),
            None => break,
        }
    }

    pyramid
}

fn resize(resizer: &mut Resizer, image: &GrayImage, width: u32, height: u32) -> Option<GrayImage> {
    let src_image =
        Image::from_vec_u8(image.width(), image.height(), image.as_raw().clone(), PixelType::U8)
            .ok()?;
    let mut dst_image = Image::new(width, height, PixelType::U8);

    let options = ResizeOptions::new().resize_alg(fast_image_resize::ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));

    resizer.resize(&src_image, &mut dst_image, &options).ok()?;

    GrayImage::from_raw(width, height, dst_image.into_vec())
}
