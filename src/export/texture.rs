//! Texture encoding and saving.

use std::io::Cursor;
use std::path::PathBuf;

use image::{DynamicImage, ImageBuffer};

use crate::host::OutputFs;
use crate::scene::RawImage;
use crate::util::{Error, Result};

use super::dedup::TextureRequest;
use super::settings::TextureFormat;

/// Wrap raw pixels in an image of the matching colour type.
pub fn to_dynamic(raw: &RawImage) -> Result<DynamicImage> {
    if raw.data.len() != raw.expected_len() {
        return Err(Error::other(format!(
            "pixel buffer is {} bytes, expected {} for {}x{}x{}",
            raw.data.len(),
            raw.expected_len(),
            raw.width,
            raw.height,
            raw.components
        )));
    }
    let (w, h, data) = (raw.width, raw.height, raw.data.clone());
    let image = match raw.components {
        1 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLuma8),
        2 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageLumaA8),
        3 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgb8),
        4 => ImageBuffer::from_raw(w, h, data).map(DynamicImage::ImageRgba8),
        n => return Err(Error::other(format!("unsupported component count {}", n))),
    };
    image.ok_or_else(|| Error::other("pixel buffer does not match dimensions"))
}

/// Encode `image` in `format`.
pub fn encode(image: &DynamicImage, format: TextureFormat) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    image.write_to(&mut Cursor::new(&mut buf), format.image_format())?;
    Ok(buf)
}

/// Write one file per format next to `request.destination`. Returns the paths written.
pub fn save_texture(
    request: &TextureRequest,
    raw: &RawImage,
    formats: &[TextureFormat],
    fs: &dyn OutputFs,
) -> Result<Vec<PathBuf>> {
    let image = to_dynamic(raw)?;
    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = request.destination.with_extension(format.extension());
        let bytes = encode(&image, format)?;
        fs.write_file(&path, &bytes)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::dedup::TextureRole;
    use crate::host::MemoryFs;
    use std::path::Path;
    use uuid::Uuid;

    fn checker() -> RawImage {
        RawImage::new(2, 2, 3, vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255])
    }

    #[test]
    fn test_save_all_formats() {
        let fs = MemoryFs::new();
        let req = TextureRequest {
            asset: Uuid::from_u128(5),
            role: TextureRole::Face,
            destination: PathBuf::from("/out/textures/abc"),
        };
        let written = save_texture(&req, &checker(), &[TextureFormat::Tga, TextureFormat::Png], &fs).unwrap();
        assert_eq!(written.len(), 2);

        let png = fs.read(Path::new("/out/textures/abc.png")).unwrap();
        assert_eq!(&png[..4], b"\x89PNG");
        let tga = fs.read(Path::new("/out/textures/abc.tga")).unwrap();
        let decoded = image::load_from_memory_with_format(&tga, image::ImageFormat::Tga).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[test]
    fn test_bad_buffer_is_error() {
        let raw = RawImage::new(4, 4, 4, vec![0; 3]);
        assert!(to_dynamic(&raw).is_err());
        let raw = RawImage::new(1, 1, 5, vec![0; 5]);
        assert!(to_dynamic(&raw).is_err());
    }
}
