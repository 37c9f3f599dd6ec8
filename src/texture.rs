//! Texture image decoding and inline encoding

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use thiserror::Error;

/// Error type for texture loading operations
#[derive(Error, Debug)]
pub enum TextureError {
    #[error("Image decoding error: {0}")]
    DecodeError(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Image {0} did not finish loading in time")]
    TimedOut(String),
}

/// A decoded texture image
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub format: TextureFormat,
}

/// Pixel layouts produced by the decoder
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TextureFormat {
    Rgba8,
}

/// Asynchronous image decoding collaborator
///
/// The returned future is the image's "ready" signal: it settles once,
/// with pixels or with the reason the image could not be used.
#[async_trait::async_trait]
pub trait ImageDecoder: Send + Sync {
    async fn decode(&self, name: &str, data: &[u8]) -> Result<Texture, TextureError>;
}

/// Decodes PNG and JPEG texture files
#[derive(Debug, Default, Clone)]
pub struct TextureLoader;

impl TextureLoader {
    /// Create a new texture loader
    pub fn new() -> Self {
        Self
    }

    /// Load a texture from binary data, identified by its content
    pub fn load(&self, data: &[u8]) -> Result<Texture, TextureError> {
        decode_rgba("texture", None, data)
    }

    /// Load a texture file.
    ///
    /// The content decides the format; the file extension is only used when
    /// the content is not recognised. Errors name the file.
    pub fn load_named(&self, name: &str, data: &[u8]) -> Result<Texture, TextureError> {
        let hint = extension(name).and_then(ImageFormat::from_extension);
        decode_rgba(name, hint, data)
    }
}

fn decode_rgba(
    label: &str,
    hint: Option<ImageFormat>,
    data: &[u8],
) -> Result<Texture, TextureError> {
    let format = match (image::guess_format(data), hint) {
        (Ok(format), _) => format,
        (Err(_), Some(format)) => format,
        (Err(err), None) => return Err(TextureError::DecodeError(format!("{label}: {err}"))),
    };
    if !matches!(format, ImageFormat::Png | ImageFormat::Jpeg) {
        return Err(TextureError::UnsupportedFormat(format!(
            "{label}: only PNG and JPEG textures are supported, got {format:?}"
        )));
    }

    let pixels = image::load_from_memory_with_format(data, format)
        .map_err(|e| TextureError::DecodeError(format!("{label}: {e}")))?
        .into_rgba8();
    let (width, height) = pixels.dimensions();

    Ok(Texture {
        width,
        height,
        data: pixels.into_raw(),
        format: TextureFormat::Rgba8,
    })
}

#[async_trait::async_trait]
impl ImageDecoder for TextureLoader {
    async fn decode(&self, name: &str, data: &[u8]) -> Result<Texture, TextureError> {
        self.load_named(name, data)
    }
}

/// Lowercased extension of a file name, if it has one
pub fn extension(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    (!ext.is_empty()).then(|| ext.to_ascii_lowercase())
}

/// MIME type for an image file name, derived from its extension
pub fn image_mime_type(name: &str) -> String {
    match extension(name).as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg".to_string(),
        Some(ext) => format!("image/{ext}"),
        None => "application/octet-stream".to_string(),
    }
}

/// Self-contained `data:` URI for an image file
pub fn inline_data_uri(name: &str, data: &[u8]) -> String {
    format!("data:{};base64,{}", image_mime_type(name), STANDARD.encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(img: &image::RgbaImage, format: ImageFormat) -> Vec<u8> {
        let mut data = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut data), format)
            .expect("Failed to encode test image");
        data
    }

    #[test]
    fn test_load_jpeg_sync() {
        let loader = TextureLoader::new();

        let mut img = image::RgbaImage::new(1, 1);
        img.put_pixel(0, 0, image::Rgba([255, 255, 255, 255]));
        let rgb = image::DynamicImage::ImageRgba8(img).into_rgb8();
        let mut jpeg_data = Vec::new();
        rgb.write_to(
            &mut std::io::Cursor::new(&mut jpeg_data),
            ImageFormat::Jpeg,
        )
        .expect("Failed to encode test image");

        let result = loader.load(&jpeg_data);
        assert!(result.is_ok(), "Failed to load JPEG: {:?}", result.err());

        let texture = result.unwrap();
        assert_eq!(texture.width, 1);
        assert_eq!(texture.height, 1);
        assert_eq!(texture.format, TextureFormat::Rgba8);
    }

    #[test]
    fn test_load_png_sync() {
        let loader = TextureLoader::new();

        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));

        let texture = loader.load(&encode(&img, ImageFormat::Png)).unwrap();
        assert_eq!((texture.width, texture.height), (2, 1));
        assert_eq!(&texture.data[..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_corrupt_image_rejected() {
        let loader = TextureLoader::new();
        let result = futures::executor::block_on(loader.decode("bad.png", b"not an image"));
        match result {
            Err(TextureError::DecodeError(msg)) => assert!(msg.starts_with("bad.png: "), "{msg}"),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_format_named() {
        let loader = TextureLoader::new();
        let bmp_header = b"BM\x3a\0\0\0\0\0\0\0\x36\0\0\0";

        let result = loader.load_named("skin.png", bmp_header);
        match result {
            Err(TextureError::UnsupportedFormat(msg)) => assert!(msg.contains("skin.png"), "{msg}"),
            other => panic!("expected an unsupported format error, got {other:?}"),
        }
    }

    #[test]
    fn test_unrecognised_content_without_name() {
        let result = TextureLoader::new().load(b"????");
        assert!(matches!(result, Err(TextureError::DecodeError(_))));
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(image_mime_type("a.PNG"), "image/png");
        assert_eq!(image_mime_type("a.jpg"), "image/jpeg");
        assert_eq!(image_mime_type("a.JPEG"), "image/jpeg");
        assert_eq!(image_mime_type("noext"), "application/octet-stream");
    }

    #[test]
    fn test_inline_data_uri() {
        assert_eq!(inline_data_uri("t.png", &[1, 2, 3]), "data:image/png;base64,AQID");
    }
}
