//! Benchmarks for plainpdf extraction performance.
//!
//! Run with: cargo bench
//!
//! Documents are synthetic: every page shows a few lines with one shared font.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use plainpdf::{Document, Extractor};

/// Creates a PDF with the given number of pages and a valid xref table.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    let mut objects: Vec<String> = Vec::new();

    // 1: catalog, 2: page tree, 3: font
    objects.push("<< /Type /Catalog /Pages 2 0 R >>".to_string());
    let kids: Vec<String> = (0..page_count).map(|i| format!("{} 0 R", 4 + i * 2)).collect();
    objects.push(format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        page_count
    ));
    objects.push(
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    );

    for i in 0..page_count {
        let content_obj = 5 + i * 2;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {content_obj} 0 R >>"
        ));
        let mut text = String::from("BT /F1 11 Tf 72 720 Td 13 TL\n");
        for line in 0..40 {
            text.push_str(&format!(
                "[(Page {} line {line}:) -250 (benchmark text for plainpdf extraction.)] TJ T*\n",
                i + 1
            ));
        }
        text.push_str("ET");
        objects.push(format!(
            "<< /Length {} >>\nstream\n{text}\nendstream",
            text.len()
        ));
    }

    let mut pdf = String::from("%PDF-1.4\n");
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.push_str(&format!("{} 0 obj\n{body}\nendobj\n", i + 1));
    }

    let xref_offset = pdf.len();
    pdf.push_str(&format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1));
    for offset in offsets {
        pdf.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.push_str(&format!(
        "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
        objects.len() + 1
    ));
    pdf.into_bytes()
}

/// Benchmark PDF format detection.
fn bench_format_detection(c: &mut Criterion) {
    let pdf_data = create_test_pdf(1);
    let non_pdf_data = b"Not a PDF file at all, just random text content";

    c.bench_function("detect_valid_pdf", |b| {
        b.iter(|| plainpdf::detect_format_from_bytes(black_box(&pdf_data)).unwrap());
    });

    c.bench_function("detect_non_pdf", |b| {
        b.iter(|| plainpdf::detect_format_from_bytes(black_box(non_pdf_data)).is_err());
    });
}

/// Benchmark loading: xref, catalog and page count only.
fn bench_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("load");

    for page_count in [1, 10, 100] {
        let data = create_test_pdf(page_count);
        group.bench_with_input(BenchmarkId::from_parameter(page_count), &data, |b, data| {
            b.iter(|| Document::load(black_box(data.clone())).unwrap());
        });
    }

    group.finish();
}

/// Benchmark full extraction, parallel against sequential.
fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extract");
    group.sample_size(20);

    for page_count in [5, 50, 200] {
        let data = create_test_pdf(page_count);

        group.bench_with_input(
            BenchmarkId::new("parallel", page_count),
            &data,
            |b, data| {
                let extractor = Extractor::new();
                b.iter(|| extractor.extract_bytes(black_box(data.clone())).unwrap());
            },
        );

        group.bench_with_input(
            BenchmarkId::new("sequential", page_count),
            &data,
            |b, data| {
                let extractor = Extractor::new().sequential();
                b.iter(|| extractor.extract_bytes(black_box(data.clone())).unwrap());
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_format_detection,
    bench_load,
    bench_extraction,
);
criterion_main!(benches);
