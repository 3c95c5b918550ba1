//! Adapters between the engine's plane buffers and `image` crate buffers.
//!
//! Callers that hold decoded images convert here; the pipelines themselves
//! only ever see [`ImagePlane`] and [`Planar3`].

use image::{ImageBuffer, Luma, Rgb};

use super::buffer::{ImagePlane, Planar3};

/// 16-bit grayscale image, the box pipelines' sample type.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// 32-bit float RGB image, the unsharp pipelines' sample type.
pub type RgbF32Image = ImageBuffer<Rgb<f32>, Vec<f32>>;

/// Copy a grayscale image into a plane buffer.
pub fn plane_from_luma16(image: &Gray16Image) -> ImagePlane<u16> {
    let (width, height) = image.dimensions();
    ImagePlane::from_fn(width as usize, height as usize, |x, y| {
        image.get_pixel(x as u32, y as u32)[0]
    })
}

/// Copy a plane buffer back into a grayscale image.
pub fn plane_to_luma16(plane: &ImagePlane<u16>) -> Gray16Image {
    ImageBuffer::from_fn(plane.width() as u32, plane.height() as u32, |x, y| {
        Luma([plane.get(x as usize, y as usize)])
    })
}

/// Split an interleaved RGB image into channel-major planes.
pub fn planar_from_rgb32f(image: &RgbF32Image) -> Planar3<f32> {
    let (width, height) = image.dimensions();
    Planar3::from_fn(width as usize, height as usize, |c, x, y| {
        image.get_pixel(x as u32, y as u32)[c]
    })
}

/// Interleave channel-major planes back into an RGB image.
pub fn planar_to_rgb32f(planar: &Planar3<f32>) -> RgbF32Image {
    ImageBuffer::from_fn(planar.width() as u32, planar.height() as u32, |x, y| {
        let (x, y) = (x as usize, y as usize);
        Rgb([
            planar.plane(0).get(x, y),
            planar.plane(1).get(x, y),
            planar.plane(2).get(x, y),
        ])
    })
}
