//! `ImageCodec` backed by the `image` crate.

use std::io::Cursor;
use std::sync::Arc;

use image::{DynamicImage, ImageFormat, imageops::FilterType};

use crate::application::repos::{CodecError, CropMode, ImageCodec, SourceImage};
use crate::config::ResizeFilter;

/// Decodes any format `image` understands and always encodes PNG.
#[derive(Debug, Clone, Copy)]
pub struct ImageCrateCodec {
    filter: FilterType,
}

impl ImageCrateCodec {
    pub fn new(filter: ResizeFilter) -> Self {
        let filter = match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::CatmullRom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        };
        Self { filter }
    }
}

impl Default for ImageCrateCodec {
    fn default() -> Self {
        Self::new(ResizeFilter::default())
    }
}

impl ImageCodec for ImageCrateCodec {
    fn decode(&self, source: &[u8]) -> Result<Arc<dyn SourceImage>, CodecError> {
        let image =
            image::load_from_memory(source).map_err(|err| CodecError::Decode(err.to_string()))?;
        Ok(Arc::new(DecodedImage {
            image,
            filter: self.filter,
        }))
    }
}

struct DecodedImage {
    image: DynamicImage,
    filter: FilterType,
}

impl SourceImage for DecodedImage {
    fn resize(&self, width: u32, height: u32, crop: CropMode) -> Result<Vec<u8>, CodecError> {
        if width == 0 || height == 0 {
            return Err(CodecError::InvalidSize { width, height });
        }

        let resized = match crop {
            CropMode::Auto => self.image.resize_to_fill(width, height, self.filter),
            CropMode::Stretch => self.image.resize_exact(width, height, self.filter),
        };

        let mut buffer = Vec::new();
        resized
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .map_err(|err| CodecError::Encode(err.to_string()))?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use image::{GenericImageView, Rgba, RgbaImage};

    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 255]));
        let mut buffer = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
            .expect("encode fixture");
        buffer
    }

    #[test]
    fn crop_auto_hits_exact_size() {
        let source = ImageCrateCodec::default()
            .decode(&png(64, 32))
            .expect("decode");
        let output = source.resize(310, 150, CropMode::Auto).expect("resize");

        let decoded = image::load_from_memory(&output).expect("decode output");
        assert_eq!(decoded.dimensions(), (310, 150));
        assert_eq!(
            image::guess_format(&output).expect("format"),
            ImageFormat::Png
        );
    }

    #[test]
    fn stretch_hits_exact_size() {
        let source = ImageCrateCodec::new(ResizeFilter::Nearest)
            .decode(&png(10, 40))
            .expect("decode");
        let output = source.resize(16, 16, CropMode::Stretch).expect("resize");
        let decoded = image::load_from_memory(&output).expect("decode output");
        assert_eq!(decoded.dimensions(), (16, 16));
    }

    #[test]
    fn garbage_fails_to_decode() {
        let result = ImageCrateCodec::default().decode(b"not an image");
        assert!(matches!(result, Err(CodecError::Decode(_))));
    }

    #[test]
    fn zero_size_is_rejected() {
        let source = ImageCrateCodec::default().decode(&png(4, 4)).expect("decode");
        let result = source.resize(0, 16, CropMode::Auto);
        assert!(matches!(result, Err(CodecError::InvalidSize { .. })));
    }

    #[test]
    fn one_decode_serves_many_sizes() {
        let source = ImageCrateCodec::default()
            .decode(&png(40, 40))
            .expect("decode");

        for (width, height) in [(16, 16), (180, 180), (620, 300)] {
            let output = source.resize(width, height, CropMode::Auto).expect("resize");
            let decoded = image::load_from_memory(&output).expect("decode output");
            assert_eq!(decoded.dimensions(), (width, height));
        }
    }
}
