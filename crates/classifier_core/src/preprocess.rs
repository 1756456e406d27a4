//! Image preprocessing module
//!
//! Turns an uploaded image into the fixed tensor the specialist model
//! expects:
//! - decode (any format the `image` crate understands)
//! - resize so the shortest side is 256 (bilinear)
//! - center-crop to 224x224
//! - scale to [0,1] and normalize with the ImageNet per-channel mean/std
//! - lay out as NCHW f32

use image::{imageops::FilterType, DynamicImage, GenericImageView};
use tract_onnx::prelude::*;

/// Side length of the square network input
pub const INPUT_SIZE: u32 = 224;
/// Shortest-side target of the pre-crop resize
pub const RESIZE_SHORTEST: u32 = 256;
/// Per-channel normalization mean (RGB)
pub const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// Per-channel normalization std (RGB)
pub const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Decode raw upload bytes into an image
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::load_from_memory(bytes)
}

/// Preprocess a decoded image into a 1x3x224x224 input tensor
pub fn to_input_tensor(image: &DynamicImage) -> Tensor {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = resize_dims(width, height, RESIZE_SHORTEST);
    let resized = image.resize_exact(new_width, new_height, FilterType::Triangle);

    let x0 = (new_width - INPUT_SIZE) / 2;
    let y0 = (new_height - INPUT_SIZE) / 2;
    let cropped = resized.crop_imm(x0, y0, INPUT_SIZE, INPUT_SIZE).to_rgb8();

    tract_ndarray::Array4::from_shape_fn(
        (1, 3, INPUT_SIZE as usize, INPUT_SIZE as usize),
        |(_, c, y, x)| {
            let pixel = cropped.get_pixel(x as u32, y as u32);
            (pixel[c] as f32 / 255.0 - MEAN[c]) / STD[c]
        },
    )
    .into()
}

/// Target dimensions for a shortest-side resize preserving aspect ratio
fn resize_dims(width: u32, height: u32, shortest: u32) -> (u32, u32) {
    if width <= height {
        let scaled = (height as f32 * shortest as f32 / width as f32).round() as u32;
        (shortest, scaled.max(shortest))
    } else {
        let scaled = (width as f32 * shortest as f32 / height as f32).round() as u32;
        (scaled.max(shortest), shortest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn solid_image(width: u32, height: u32, value: u8) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_pixel(
            width,
            height,
            Rgb([value, value, value]),
        ))
    }

    #[test]
    fn test_resize_dims_landscape() {
        assert_eq!(resize_dims(500, 300, 256), (427, 256));
    }

    #[test]
    fn test_resize_dims_portrait() {
        assert_eq!(resize_dims(300, 500, 256), (256, 427));
    }

    #[test]
    fn test_resize_dims_square() {
        assert_eq!(resize_dims(640, 640, 256), (256, 256));
    }

    #[test]
    fn test_tensor_shape() {
        let tensor = to_input_tensor(&solid_image(300, 500, 128));
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_tensor_normalization_white() {
        let tensor = to_input_tensor(&solid_image(640, 480, 255));
        let view = tensor.to_array_view::<f32>().unwrap();
        for (c, (mean, std)) in MEAN.iter().zip(STD.iter()).enumerate() {
            let expected = (1.0 - mean) / std;
            let got = view[[0, c, 112, 112]];
            assert!((got - expected).abs() < 1e-4, "channel {c}: {got} vs {expected}");
        }
    }

    #[test]
    fn test_decode_image_rejects_garbage() {
        assert!(decode_image(b"not an image at all").is_err());
    }

    #[test]
    fn test_decode_image_accepts_png() {
        let img = solid_image(10, 10, 200);
        let mut png_bytes = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut png_bytes);
        img.write_to(&mut cursor, image::ImageFormat::Png).unwrap();

        let decoded = decode_image(&png_bytes).unwrap();
        assert_eq!(decoded.dimensions(), (10, 10));
    }
}
