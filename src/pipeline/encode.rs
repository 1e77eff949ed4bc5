//! Inline parts for the analysis request.
//!
//! Each uploaded paper becomes one or more base64 [`ImageData`] parts. A PDF
//! contributes one PNG per rasterised page; an image upload contributes its
//! own bytes under the sniffed MIME type, never re-encoded. All parts ask for
//! `detail: "high"` so the small print of scanned papers stays readable.

use crate::error::ExamOracleError;
use crate::pipeline::input::SourceDocument;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Parts for the rasterised pages of the PDF `name`, in page order.
pub fn encode_pages(name: &str, pages: &[DynamicImage]) -> Result<Vec<ImageData>, ExamOracleError> {
    pages
        .iter()
        .enumerate()
        .map(|(i, img)| {
            png_bytes(img)
                .map(|png| inline_part(&png, "image/png"))
                .map_err(|e| ExamOracleError::RasterisationFailed {
                    name: name.to_string(),
                    page: i + 1,
                    detail: format!("image encoding failed: {e}"),
                })
        })
        .collect()
}

/// The single part for an image upload.
pub fn encode_image_document(doc: &SourceDocument) -> ImageData {
    debug!("{}: passing {} upload through", doc.name, doc.mime_type);
    inline_part(&doc.data, &doc.mime_type)
}

fn png_bytes(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

fn inline_part(bytes: &[u8], mime_type: &str) -> ImageData {
    let b64 = STANDARD.encode(bytes);
    debug!("Inline {mime_type} part: {} bytes base64", b64.len());
    ImageData::new(b64, mime_type).with_detail("high")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn blank_page() -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 255])))
    }

    #[test]
    fn pages_become_png_parts_in_order() {
        let parts = encode_pages("2023-summer.pdf", &[blank_page(), blank_page()]).unwrap();
        assert_eq!(parts.len(), 2);
        for part in &parts {
            assert_eq!(part.mime_type, "image/png");
            let decoded = STANDARD.decode(&part.data).expect("valid base64");
            assert!(decoded.starts_with(b"\x89PNG"));
        }
    }

    #[test]
    fn no_pages_no_parts() {
        assert!(encode_pages("empty.pdf", &[]).unwrap().is_empty());
    }

    #[test]
    fn image_upload_is_passed_through() {
        let bytes = b"\xFF\xD8\xFF\xE0\0\x10JFIF\0".to_vec();
        let doc = SourceDocument::from_bytes("scan.jpg", bytes.clone()).unwrap();
        let data = encode_image_document(&doc);
        assert_eq!(data.mime_type, "image/jpeg");
        assert_eq!(STANDARD.decode(&data.data).unwrap(), bytes);
    }
}
