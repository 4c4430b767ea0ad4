// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the dicomwerk-document crate. Measures assembling
// a small export document from 512x512 captured frames, the size the export
// pipeline renders at.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{Rgba, RgbaImage};

use dicomwerk_core::PaperSize;
use dicomwerk_document::{DocumentAssembler, ImageProcessor, PageKind};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Assemble an annotation page plus four 512x512 image pages.
fn bench_assemble_export(c: &mut Criterion) {
    let mut frame = RgbaImage::from_pixel(512, 512, Rgba([0, 0, 0, 255]));
    for y in 128..384 {
        for x in 128..384 {
            frame.put_pixel(x, y, Rgba([220, 220, 220, 255]));
        }
    }
    let png = ImageProcessor::from_rgba(frame)
        .to_png_bytes()
        .expect("encode frame");

    c.bench_function("assemble_export (annotation + 4 frames)", |b| {
        b.iter(|| {
            let mut assembler = DocumentAssembler::new(PaperSize::A4, "bench");
            assembler.add_annotation_page("benchmark annotation");
            for index in 0..4 {
                assembler
                    .add_image_page(
                        PageKind::Image { index },
                        &format!("Image index: {index}"),
                        black_box(&png),
                    )
                    .expect("image page");
            }
            black_box(assembler.finish());
        });
    });
}

criterion_group!(benches, bench_assemble_export);
criterion_main!(benches);
