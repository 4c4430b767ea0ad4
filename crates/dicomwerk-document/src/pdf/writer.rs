// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document assembler — builds the export PDF page by page using `printpdf` 0.8.
//
// printpdf 0.8 uses a data-oriented API: documents are built by constructing
// `PdfPage` structs containing `Vec<Op>` operation lists, then serialised via
// `PdfDocument::save()`. Pages are accumulated here and only handed to the
// document when it is finished.

use std::path::Path;

use dicomwerk_core::PaperSize;
use dicomwerk_core::error::{DicomwerkError, Result};
use image::RgbaImage;
use printpdf::{
    BuiltinFont, Mm, Op, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
    XObjectTransform,
};
use tracing::{debug, info, instrument, warn};

use crate::image::ImageProcessor;

/// Prefix written before the annotation on the first page.
pub const ANNOTATION_PREFIX: &str = "Annotation: ";

// Layout, in millimetres from the top-left corner of the page.
const LEFT_MM: f32 = 10.0;
const ANNOTATION_TOP_MM: f32 = 10.0;
const LABEL_TOP_MM: f32 = 20.0;
const IMAGE_TOP_MM: f32 = 30.0;
const IMAGE_BOX_W_MM: f32 = 180.0;
const IMAGE_BOX_H_MM: f32 = 160.0;

const FONT_SIZE_PT: f32 = 12.0;
const LINE_HEIGHT_PT: f32 = 15.0;
/// Resolution captured rasters are placed at before scaling into the box.
const IMAGE_DPI: f32 = 150.0;

/// What a page of the assembled document holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Annotation,
    /// Captured raster of the catalog image at `index`.
    Image { index: usize },
    /// The image returned by the filter service.
    Filtered,
}

/// Accumulates pages for one export document.
pub struct DocumentAssembler {
    paper_size: PaperSize,
    doc: PdfDocument,
    pages: Vec<PdfPage>,
    manifest: Vec<PageKind>,
}

impl DocumentAssembler {
    /// Start an empty document with the given paper size and title metadata.
    pub fn new(paper_size: PaperSize, title: &str) -> Self {
        Self {
            paper_size,
            doc: PdfDocument::new(title),
            pages: Vec::new(),
            manifest: Vec::new(),
        }
    }

    /// Paper dimensions in printpdf's Mm units.
    fn page_dimensions(&self) -> (Mm, Mm) {
        let (w_mm, h_mm) = self.paper_size.dimensions_mm();
        (Mm(w_mm as f32), Mm(h_mm as f32))
    }

    /// Pages added so far.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Kinds of the pages added so far, in order.
    pub fn manifest(&self) -> &[PageKind] {
        &self.manifest
    }

    // -- Pages ----------------------------------------------------------------

    /// Add a text page holding `"Annotation: <text>"`.
    ///
    /// Long annotations are word-wrapped; lines that do not fit on the page
    /// are dropped. Returns `true` when that happened.
    #[instrument(skip(self, annotation), fields(text_len = annotation.len()))]
    pub fn add_annotation_page(&mut self, annotation: &str) -> bool {
        let (page_w, page_h) = self.page_dimensions();
        let page_h_pt = page_h.into_pt().0;

        // Average Helvetica glyph width is roughly 0.50 * font_size in pt,
        // converted to mm (1pt = 0.3528mm).
        let avg_char_width_mm = 0.50 * FONT_SIZE_PT * 0.3528;
        let usable_width_mm = page_w.0 - 2.0 * LEFT_MM;
        let max_chars_per_line = ((usable_width_mm / avg_char_width_mm) as usize).max(1);

        let usable_height_pt = page_h_pt - 2.0 * Mm(ANNOTATION_TOP_MM).into_pt().0;
        let lines_per_page = ((usable_height_pt / LINE_HEIGHT_PT) as usize).max(1);

        let mut lines = wrap_text(&format!("{ANNOTATION_PREFIX}{annotation}"), max_chars_per_line);
        let truncated = lines.len() > lines_per_page;
        if truncated {
            warn!(
                lines = lines.len(),
                lines_per_page, "annotation does not fit on one page; truncating"
            );
            lines.truncate(lines_per_page);
        }

        let top_pt = page_h_pt - Mm(ANNOTATION_TOP_MM).into_pt().0;
        let mut ops = Vec::new();
        for (line_idx, line) in lines.iter().enumerate() {
            let y_pt = top_pt - line_idx as f32 * LINE_HEIGHT_PT;
            ops.extend(text_ops(line, Mm(LEFT_MM).into_pt().0, y_pt));
        }

        self.push_page(PageKind::Annotation, PdfPage::new(page_w, page_h, ops));
        truncated
    }

    /// Add a page with `label` above the image encoded in `image_bytes`.
    ///
    /// The image is scaled to fit the 180 x 160 mm image box preserving its
    /// aspect ratio. On a decode error no page is added.
    #[instrument(skip(self, image_bytes), fields(bytes_len = image_bytes.len()))]
    pub fn add_image_page(&mut self, kind: PageKind, label: &str, image_bytes: &[u8]) -> Result<()> {
        let image = ImageProcessor::from_bytes(image_bytes)?;
        self.place_image(kind, label, &image)
    }

    /// Add a page with `label` above a raster captured from a render surface.
    #[instrument(skip(self, frame), fields(width = frame.width(), height = frame.height()))]
    pub fn add_frame_page(&mut self, kind: PageKind, label: &str, frame: RgbaImage) -> Result<()> {
        self.place_image(kind, label, &ImageProcessor::from_rgba(frame))
    }

    fn place_image(&mut self, kind: PageKind, label: &str, image: &ImageProcessor) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(DicomwerkError::ImageError(format!(
                "cannot place an empty {}x{} image",
                image.width(),
                image.height()
            )));
        }
        let (page_w, page_h) = self.page_dimensions();
        let page_h_pt = page_h.into_pt().0;

        let img_w_pt = image.width() as f32 / IMAGE_DPI * 72.0;
        let img_h_pt = image.height() as f32 / IMAGE_DPI * 72.0;
        let box_w_pt = Mm(IMAGE_BOX_W_MM).into_pt().0;
        let box_h_pt = Mm(IMAGE_BOX_H_MM).into_pt().0;
        let scale = (box_w_pt / img_w_pt).min(box_h_pt / img_h_pt);

        let rendered_w_pt = img_w_pt * scale;
        let rendered_h_pt = img_h_pt * scale;
        let x_offset = Mm(LEFT_MM).into_pt().0 + (box_w_pt - rendered_w_pt) / 2.0;
        let y_offset = page_h_pt - Mm(IMAGE_TOP_MM).into_pt().0 - rendered_h_pt;

        let xobject_id = self.doc.add_image(&image.to_raw_image());

        let mut ops = text_ops(
            label,
            Mm(LEFT_MM).into_pt().0,
            page_h_pt - Mm(LABEL_TOP_MM).into_pt().0,
        );
        ops.push(Op::UseXobject {
            id: xobject_id,
            transform: XObjectTransform {
                translate_x: Some(Pt(x_offset)),
                translate_y: Some(Pt(y_offset)),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                rotate: None,
            },
        });

        debug!(rendered_w_pt, rendered_h_pt, scale, "Image placed on page");
        self.push_page(kind, PdfPage::new(page_w, page_h, ops));
        Ok(())
    }

    fn push_page(&mut self, kind: PageKind, page: PdfPage) {
        self.pages.push(page);
        self.manifest.push(kind);
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document to PDF bytes.
    pub fn finish(mut self) -> (Vec<u8>, Vec<PageKind>) {
        self.doc.with_pages(self.pages);
        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let output = self.doc.save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(count = warnings.len(), "printpdf reported warnings");
        }
        (output, self.manifest)
    }

    /// Serialise the document and write it to `path`.
    ///
    /// Any failure here is reported as [`DicomwerkError::Assembly`].
    pub fn save(self, path: impl AsRef<Path>) -> Result<Vec<PageKind>> {
        let path = path.as_ref();
        let (bytes, manifest) = self.finish();
        std::fs::write(path, &bytes).map_err(|err| {
            DicomwerkError::Assembly(format!("failed to write {}: {err}", path.display()))
        })?;
        info!(pages = manifest.len(), bytes = bytes.len(), "Wrote PDF to {}", path.display());
        Ok(manifest)
    }
}

/// One line of Helvetica text with its baseline at (`x_pt`, `y_pt`).
fn text_ops(text: &str, x_pt: f32, y_pt: f32) -> Vec<Op> {
    vec![
        Op::StartTextSection,
        Op::SetTextCursor {
            pos: Point {
                x: Pt(x_pt),
                y: Pt(y_pt),
            },
        },
        Op::SetFontSizeBuiltinFont {
            size: Pt(FONT_SIZE_PT),
            font: BuiltinFont::Helvetica,
        },
        Op::WriteTextBuiltinFont {
            items: vec![TextItem::Text(text.to_owned())],
            font: BuiltinFont::Helvetica,
        },
        Op::EndTextSection,
    ]
}

// -- Text wrapping helper -----------------------------------------------------

/// Wrap a multi-line string so that no line exceeds `max_width` characters.
///
/// Splits on existing newlines first, then performs simple word-wrap within each
/// paragraph. Words longer than `max_width` are force-broken on character
/// boundaries.
fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let mut result = Vec::new();

    for paragraph in text.split('\n') {
        let words: Vec<&str> = paragraph.split_whitespace().collect();
        if words.is_empty() {
            result.push(String::new());
            continue;
        }

        let mut current_line = String::with_capacity(max_width);
        let mut current_chars = 0usize;

        for word in words {
            let word_chars = word.chars().count();
            if word_chars > max_width {
                if !current_line.is_empty() {
                    result.push(std::mem::take(&mut current_line));
                }
                let chars: Vec<char> = word.chars().collect();
                let mut chunks = chars.chunks(max_width).peekable();
                while let Some(chunk) = chunks.next() {
                    let piece: String = chunk.iter().collect();
                    if chunks.peek().is_some() {
                        result.push(piece);
                    } else {
                        current_chars = chunk.len();
                        current_line = piece;
                    }
                }
            } else if current_line.is_empty() {
                current_line.push_str(word);
                current_chars = word_chars;
            } else if current_chars + 1 + word_chars <= max_width {
                current_line.push(' ');
                current_line.push_str(word);
                current_chars += 1 + word_chars;
            } else {
                result.push(std::mem::replace(&mut current_line, word.to_owned()));
                current_chars = word_chars;
            }
        }

        if !current_line.is_empty() {
            result.push(current_line);
        }
    }

    result
}
