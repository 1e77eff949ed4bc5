//! PDF rasterisation: render every page of an uploaded paper via pdfium.
//!
//! Vision providers accept images everywhere but inline PDFs only on some
//! back ends, so PDF uploads are turned into one image per page before the
//! request is built.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto the blocking pool.

use crate::config::AnalysisConfig;
use crate::error::ExamOracleError;
use crate::pipeline::input::SourceDocument;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rasterise all pages of a PDF document.
///
/// # Returns
/// One image per page, in page order.
pub async fn rasterise_pdf(
    doc: &SourceDocument,
    config: &AnalysisConfig,
) -> Result<Vec<DynamicImage>, ExamOracleError> {
    let name = doc.name.clone();
    let data = doc.data.clone();
    let dpi = config.dpi;
    let max_pixels = config.max_rendered_pixels;
    let password = config.password.clone();

    tokio::task::spawn_blocking(move || {
        rasterise_blocking(&name, &data, dpi, max_pixels, password.as_deref())
    })
    .await
    .map_err(|e| ExamOracleError::Internal(format!("Render task panicked: {}", e)))?
}

/// Bind to pdfium: `PDFIUM_LIB_PATH` first, then the working directory, then
/// the system library.
fn bind_pdfium() -> Result<Pdfium, ExamOracleError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| ExamOracleError::PdfiumBindingFailed(format!("{:?}", e)))?;

    Ok(Pdfium::new(bindings))
}

/// Pixel width for a page: `dpi` applied to the physical width, capped at
/// `max_pixels`.
pub(crate) fn target_width(page_width_inches: f32, dpi: u32, max_pixels: u32) -> i32 {
    let wanted = (page_width_inches * dpi as f32).round().max(1.0) as u32;
    wanted.min(max_pixels) as i32
}

fn rasterise_blocking(
    name: &str,
    data: &[u8],
    dpi: u32,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<DynamicImage>, ExamOracleError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium.load_pdf_from_byte_slice(data, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                ExamOracleError::WrongPassword {
                    name: name.to_string(),
                }
            } else {
                ExamOracleError::PasswordRequired {
                    name: name.to_string(),
                }
            }
        } else {
            ExamOracleError::CorruptPdf {
                name: name.to_string(),
                detail: err_str,
            }
        }
    })?;

    let pages = document.pages();
    info!("{}: {} pages", name, pages.len());

    let mut images = Vec::with_capacity(pages.len() as usize);

    for (idx, page) in pages.iter().enumerate() {
        let width = target_width(page.width().to_inches(), dpi, max_pixels);
        let render_config = PdfRenderConfig::new()
            .set_target_width(width)
            .set_maximum_height(max_pixels as i32);

        let bitmap = page.render_with_config(&render_config).map_err(|e| {
            ExamOracleError::RasterisationFailed {
                name: name.to_string(),
                page: idx + 1,
                detail: format!("{:?}", e),
            }
        })?;

        let image = bitmap.as_image();
        debug!(
            "{}: rendered page {} → {}x{} px",
            name,
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    Ok(images)
}
