//! Downloading and decoding slide images.

use crate::http;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use deck_core::ImageRef;
use deck_pptx::{EmbeddedImage, ImageOutcome, ImageResolver};
use reqwest::blocking::Client;
use std::io::Cursor;

/// Turns an image reference into PNG or JPEG bytes, or a failure reason.
pub trait ImageFetcher {
    fn fetch(&self, image: &ImageRef) -> ImageOutcome;
}

/// Fetches `http(s)` images and decodes inline `data:` URIs.
///
/// Downloads have no timeout. Anything that is not PNG or JPEG is
/// transcoded to PNG.
pub struct HttpImageFetcher {
    http: Client,
}

impl HttpImageFetcher {
    pub fn new() -> deck_core::Result<Self> {
        Ok(Self {
            http: http::client(None)?,
        })
    }

    fn download(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self.http.get(url).send().map_err(|e| {
            log::warn!("Image download failed for {}: {}", url, e);
            transport_reason(&e).to_string()
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(status.as_u16().to_string());
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| {
                log::warn!("Image body could not be read from {}: {}", url, e);
                "unreadable".to_string()
            })
    }
}

impl ImageFetcher for HttpImageFetcher {
    fn fetch(&self, image: &ImageRef) -> ImageOutcome {
        let bytes = match image {
            ImageRef::Inline(uri) => decode_data_uri(uri),
            ImageRef::Url(url) => self.download(url),
            ImageRef::Query(_) => Err("unresolved search query".to_string()),
        };

        match bytes.and_then(normalize) {
            Ok(image) => ImageOutcome::Ready(image),
            Err(reason) => ImageOutcome::Failed(reason),
        }
    }
}

/// Short marker text for a request that never produced a response.
fn transport_reason(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "timeout"
    } else if error.is_connect() {
        "connect error"
    } else if error.is_redirect() {
        "redirect error"
    } else if error.is_builder() {
        "invalid url"
    } else if error.is_body() || error.is_decode() {
        "unreadable"
    } else {
        "request error"
    }
}

/// Adapts an [`ImageFetcher`] to the resolver the slide filler expects.
pub struct FetchResolver<'a> {
    fetcher: &'a dyn ImageFetcher,
}

impl<'a> FetchResolver<'a> {
    pub fn new(fetcher: &'a dyn ImageFetcher) -> Self {
        Self { fetcher }
    }
}

impl ImageResolver for FetchResolver<'_> {
    fn resolve(&self, image: &ImageRef) -> ImageOutcome {
        self.fetcher.fetch(image)
    }
}

/// Payload of a base64 `data:image/...` URI.
pub fn decode_data_uri(uri: &str) -> Result<Vec<u8>, String> {
    let (header, payload) = uri
        .split_once(',')
        .ok_or_else(|| "malformed data URI".to_string())?;
    if !header.to_ascii_lowercase().ends_with(";base64") {
        return Err("data URI is not base64".to_string());
    }

    let payload: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    STANDARD
        .decode(payload)
        .map_err(|e| format!("invalid base64 ({})", e))
}

/// Keep PNG and JPEG as they are, transcode any other decodable image to PNG.
pub fn normalize(bytes: Vec<u8>) -> Result<EmbeddedImage, String> {
    if let Some(image) = EmbeddedImage::new(bytes.clone()) {
        return Ok(image);
    }

    let decoded = image::load_from_memory(&bytes).map_err(|e| {
        log::warn!("Image could not be decoded: {}", e);
        "unsupported image".to_string()
    })?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(decoded.to_rgb8())
        .write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| format!("PNG conversion failed ({})", e))?;
    log::debug!("Transcoded {} byte image to {} byte PNG", bytes.len(), png.len());

    EmbeddedImage::new(png).ok_or_else(|| "PNG conversion failed".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deck_pptx::ImageFormat;

    fn bmp_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        image::DynamicImage::new_rgb8(2, 2)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Bmp)
            .unwrap();
        out
    }

    fn png_bytes() -> Vec<u8> {
        let mut out = Vec::new();
        image::DynamicImage::new_rgb8(1, 1)
            .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
            .unwrap();
        out
    }

    #[test]
    fn test_decode_data_uri() {
        let png = png_bytes();
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(&png));
        assert_eq!(decode_data_uri(&uri).unwrap(), png);

        assert!(decode_data_uri("data:image/png;base64").is_err());
        assert!(decode_data_uri("data:image/svg+xml,<svg/>").is_err());
        assert!(decode_data_uri("data:image/png;base64,!!!").is_err());
    }

    #[test]
    fn test_normalize_keeps_png() {
        let png = png_bytes();
        let image = normalize(png.clone()).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert_eq!(image.bytes, png);
    }

    #[test]
    fn test_normalize_transcodes_bmp() {
        let image = normalize(bmp_bytes()).unwrap();
        assert_eq!(image.format, ImageFormat::Png);
        assert!(image.bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn test_normalize_rejects_garbage() {
        assert_eq!(
            normalize(b"not an image".to_vec()),
            Err("unsupported image".to_string())
        );
    }

    #[test]
    fn test_fetch_inline_and_query() {
        let fetcher = HttpImageFetcher::new().unwrap();
        let uri = format!("data:image/png;base64,{}", STANDARD.encode(png_bytes()));
        assert!(matches!(
            fetcher.fetch(&ImageRef::Inline(uri)),
            ImageOutcome::Ready(_)
        ));
        assert_eq!(
            fetcher.fetch(&ImageRef::Query("a cat".into())),
            ImageOutcome::Failed("unresolved search query".into())
        );
    }

    #[test]
    fn test_resolver_delegates() {
        let fetcher = HttpImageFetcher::new().unwrap();
        let resolver = FetchResolver::new(&fetcher);
        assert!(matches!(
            resolver.resolve(&ImageRef::Query("x".into())),
            ImageOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_transport_failures_name_their_cause() {
        let fetcher = HttpImageFetcher {
            http: Client::builder().no_proxy().build().unwrap(),
        };
        assert_eq!(
            fetcher.fetch(&ImageRef::Url("http://127.0.0.1:1/x.png".into())),
            ImageOutcome::Failed("connect error".into())
        );
        assert_eq!(
            fetcher.fetch(&ImageRef::Url("not a url".into())),
            ImageOutcome::Failed("invalid url".into())
        );
    }
}
