use std::path::PathBuf;
use std::sync::Arc;

use eframe::egui;
use pdfium_render::prelude::*;

use crate::error::PreviewError;
use crate::mapper::Size;
use crate::service::StagedFile;

pub const PDFIUM_LIB_ENV: &str = "BLUEPRINT_PDFIUM_LIB";
const MIN_PDF_WIDTH: u16 = 400;

/// Decoded RGBA pixels of the first page or image of a blueprint.
#[derive(Clone, Debug, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl DecodedImage {
    pub fn size(&self) -> Size {
        Size::new(self.width as f32, self.height as f32)
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        egui::ColorImage::from_rgba_unmultiplied(
            [self.width as usize, self.height as usize],
            &self.rgba,
        )
    }
}

fn pdfium_library_path() -> Option<PathBuf> {
    std::env::var(PDFIUM_LIB_ENV)
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            let mut candidate = std::env::current_exe().ok()?;
            candidate.pop();
            candidate.push(Pdfium::pdfium_platform_library_name());
            candidate.exists().then_some(candidate)
        })
}

fn render_pdf(bytes: &[u8], target_width: u16) -> Result<image::DynamicImage, PreviewError> {
    let path = pdfium_library_path().ok_or_else(|| {
        PreviewError::PdfUnavailable(format!(
            "PDFium not found. Place it next to the app or set {PDFIUM_LIB_ENV}"
        ))
    })?;
    let bindings = Pdfium::bind_to_library(path)
        .map_err(|err| PreviewError::PdfUnavailable(err.to_string()))?;
    let pdfium = Pdfium::new(bindings);
    let document = pdfium
        .load_pdf_from_byte_slice(bytes, None)
        .map_err(|err| PreviewError::Pdf(err.to_string()))?;
    let page = document
        .pages()
        .get(0)
        .map_err(|err| PreviewError::Pdf(err.to_string()))?;
    let render = page
        .render_with_config(
            &PdfRenderConfig::new()
                .set_target_width(target_width.max(MIN_PDF_WIDTH) as i32)
                .render_form_data(true),
        )
        .map_err(|err| PreviewError::Pdf(err.to_string()))?;
    Ok(render.as_image())
}

pub fn decode(file: &StagedFile, target_width: u16) -> Result<DecodedImage, PreviewError> {
    let image = if file.is_pdf() {
        render_pdf(&file.bytes, target_width)?
    } else {
        image::load_from_memory(&file.bytes)?
    };
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

/// The blueprint texture for the current staged file, decoded once per file.
#[derive(Default)]
pub struct PreviewCache {
    source: Option<Arc<Vec<u8>>>,
    texture: Option<egui::TextureHandle>,
    natural: Option<Size>,
    error: Option<String>,
}

impl PreviewCache {
    /// Returns the natural size the first time a new file decodes, so the caller can adopt it.
    pub fn sync(&mut self, ctx: &egui::Context, file: Option<&StagedFile>) -> Option<Size> {
        let Some(file) = file else {
            *self = Self::default();
            return None;
        };
        if self
            .source
            .as_ref()
            .is_some_and(|bytes| Arc::ptr_eq(bytes, &file.bytes))
        {
            return None;
        }
        *self = Self {
            source: Some(Arc::clone(&file.bytes)),
            ..Self::default()
        };
        let target_width = ctx.screen_rect().width().clamp(400.0, 4096.0) as u16;
        match decode(file, target_width) {
            Ok(decoded) => {
                let size = decoded.size();
                self.texture = Some(ctx.load_texture(
                    "blueprint_preview",
                    decoded.to_color_image(),
                    egui::TextureOptions::LINEAR,
                ));
                self.natural = Some(size);
                tracing::debug!(name = %file.name, width = size.width, height = size.height, "preview decoded");
                Some(size)
            }
            Err(err) => {
                tracing::warn!(name = %file.name, %err, "preview unavailable");
                self.error = Some(err.to_string());
                None
            }
        }
    }

    pub fn texture(&self) -> Option<&egui::TextureHandle> {
        self.texture.as_ref()
    }

    pub fn natural_size(&self) -> Option<Size> {
        self.natural
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}
