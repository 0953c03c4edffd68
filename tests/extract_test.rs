//! End-to-end extraction tests against synthetic documents.

mod common;

use common::{document, lines, text_document, PageContent, PdfBuilder, HELVETICA};
use plainpdf::{
    extract_bytes, extract_text_from_bytes, Document, Error, ErrorKind, Extractor, PageDiagnostic,
    PageSelection, DEFAULT_PAGE_SEPARATOR,
};

#[test]
fn test_two_lines_extract_as_hello_newline_world() {
    let pdf = text_document(&[&["Hello", "World"]]);
    assert_eq!(extract_text_from_bytes(&pdf).unwrap(), "Hello\nWorld");
}

#[test]
fn test_n_pages_yield_n_minus_one_separators() {
    for n in [1usize, 2, 5, 12] {
        let rows: Vec<String> = (1..=n).map(|i| format!("Page {i}")).collect();
        let pages: Vec<PageContent> = rows.iter().map(|r| PageContent::text(&[r.as_str()])).collect();
        let text = extract_text_from_bytes(&document(&pages)).unwrap();

        assert_eq!(text.matches(DEFAULT_PAGE_SEPARATOR).count(), n - 1, "{n} pages");
        let segments: Vec<&str> = text.split(DEFAULT_PAGE_SEPARATOR).collect();
        assert_eq!(segments.len(), n);
        for (i, segment) in segments.iter().enumerate() {
            assert_eq!(*segment, format!("Page {}", i + 1));
        }
    }
}

#[test]
fn test_blank_pages_still_get_separators() {
    let pdf = document(&[
        PageContent::text(&["first"]),
        PageContent::Plain(String::new()),
        PageContent::text(&["third"]),
    ]);
    let text = extract_text_from_bytes(&pdf).unwrap();
    assert_eq!(
        text,
        format!("first{DEFAULT_PAGE_SEPARATOR}{DEFAULT_PAGE_SEPARATOR}third")
    );
}

#[test]
fn test_extraction_is_idempotent() {
    let pages: Vec<PageContent> = (0..8)
        .map(|i| PageContent::Flate(lines(&[&format!("Section {i}"), "Body text follows here."])))
        .collect();
    let pdf = document(&pages);

    let first = extract_bytes(&pdf).unwrap();
    let second = extract_bytes(&pdf).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.text(), second.text());

    // Same document object, extracted twice, with a warm font cache.
    let doc = Document::load(pdf.clone()).unwrap();
    let extractor = Extractor::new();
    let a = extractor.extract_document(&doc).unwrap();
    let b = extractor.extract_document(&doc).unwrap();
    assert_eq!(a.text(), b.text());
    assert_eq!(a.text(), first.text());
}

#[test]
fn test_parallel_and_sequential_agree() {
    let pages: Vec<PageContent> = (0..40)
        .map(|i| PageContent::text(&[&format!("Heading {i}"), &format!("line {}", i * 7)]))
        .collect();
    let pdf = document(&pages);

    let parallel = Extractor::new().extract_bytes(pdf.clone()).unwrap();
    let sequential = Extractor::new().sequential().extract_bytes(pdf).unwrap();
    assert_eq!(parallel, sequential);
    assert_eq!(parallel.pages[39].text, "Heading 39\nline 273");
}

#[test]
fn test_corrupted_xref_is_malformed_document() {
    let pdf = text_document(&[&["Hello"]]);

    // Damage the entry rows of the table.
    let table = find(&pdf, b"xref\n").unwrap();
    let mut rows_damaged = pdf.clone();
    for b in &mut rows_damaged[table + 30..table + 60] {
        if b.is_ascii_digit() {
            *b = b'x';
        }
    }
    // Point startxref into the middle of an object.
    let startxref = find(&pdf, b"startxref\n").unwrap();
    let mut bad_offset = pdf[..startxref].to_vec();
    bad_offset.extend_from_slice(b"startxref\n20\n%%EOF\n");
    // Point startxref past the end of the file.
    let mut past_end = pdf[..startxref].to_vec();
    past_end.extend_from_slice(b"startxref\n999999\n%%EOF\n");
    // Cut the file before the table.
    let truncated = pdf[..table].to_vec();

    for (name, data) in [
        ("damaged rows", rows_damaged),
        ("offset into object", bad_offset),
        ("offset past end", past_end),
        ("truncated", truncated),
    ] {
        let err = extract_bytes(&data).unwrap_err();
        assert!(
            matches!(err, Error::MalformedDocument(_)),
            "{name}: unexpected {err:?}"
        );
        assert_eq!(err.kind(), ErrorKind::MalformedDocument);
        assert!(!err.is_recoverable());
    }
}

#[test]
fn test_missing_header_is_malformed_document() {
    let mut pdf = text_document(&[&["Hello"]]);
    pdf.drain(..4);
    assert!(matches!(
        extract_bytes(&pdf),
        Err(Error::MalformedDocument(_))
    ));
    assert!(matches!(
        extract_bytes(b"just some text"),
        Err(Error::MalformedDocument(_))
    ));
}

#[test]
fn test_unsupported_filter_on_page_three_of_five_yields_empty_segment() {
    let pages = vec![
        PageContent::text(&["one"]),
        PageContent::text(&["two"]),
        PageContent::Filtered("\u{7f}JFIF not really".to_string(), "DCTDecode"),
        PageContent::text(&["four"]),
        PageContent::text(&["five"]),
    ];
    let pdf = document(&pages);
    let extracted = extract_bytes(&pdf).unwrap();

    let text = extracted.text();
    let segments: Vec<&str> = text.split(DEFAULT_PAGE_SEPARATOR).collect();
    assert_eq!(segments, vec!["one", "two", "", "four", "five"]);

    assert!(extracted.is_degraded());
    assert_eq!(
        extracted.diagnostics(),
        vec![(
            3,
            &PageDiagnostic::UnsupportedFilter {
                filter: "DCTDecode".to_string()
            }
        )]
    );
    assert!(extracted.page(3).unwrap().is_degraded());
    assert!(!extracted.page(2).unwrap().is_degraded());
}

#[test]
fn test_unsupported_filter_fails_in_strict_mode() {
    let pdf = document(&[
        PageContent::text(&["one"]),
        PageContent::Filtered("xx".to_string(), "JBIG2Decode"),
    ]);
    let err = Extractor::new().strict().extract_bytes(pdf).unwrap_err();
    assert!(matches!(err, Error::UnsupportedFilter(ref f) if f == "JBIG2Decode"));
    assert!(err.is_recoverable());
}

#[test]
fn test_font_shared_by_hundred_pages_is_decoded_once() {
    let rows: Vec<String> = (1..=100).map(|i| format!("Page number {i}")).collect();
    let pages: Vec<PageContent> = rows.iter().map(|r| PageContent::text(&[r.as_str()])).collect();
    let doc = Document::load(document(&pages)).unwrap();

    let extracted = Extractor::new().extract_document(&doc).unwrap();

    assert_eq!(extracted.page_count(), 100);
    assert_eq!(doc.fonts_decoded(), 1);
    assert_eq!(extracted.page(100).unwrap().text, "Page number 100");

    // A second pass reuses the cached font.
    Extractor::new().sequential().extract_document(&doc).unwrap();
    assert_eq!(doc.fonts_decoded(), 1);
}

#[test]
fn test_inherited_font_resources_are_decoded_once() {
    let mut pdf = PdfBuilder::new();
    let catalog = pdf.reserve();
    let tree = pdf.reserve();
    let font = pdf.add(HELVETICA);
    let mut kids = Vec::new();
    for i in 0..20 {
        let contents = pdf.add_stream("", lines(&[&format!("row {i}")]).as_bytes());
        kids.push(pdf.add(format!(
            "<< /Type /Page /Parent {tree} 0 R /Contents {contents} 0 R >>"
        )));
    }
    let refs: Vec<String> = kids.iter().map(|k| format!("{k} 0 R")).collect();
    pdf.set(catalog, format!("<< /Type /Catalog /Pages {tree} 0 R >>"));
    pdf.set(
        tree,
        format!(
            "<< /Type /Pages /Kids [{}] /Count 20 /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font} 0 R >> >> >>",
            refs.join(" ")
        ),
    );

    let doc = Document::load(pdf.build(catalog)).unwrap();
    let extracted = Extractor::new().extract_document(&doc).unwrap();
    assert_eq!(extracted.page(20).unwrap().text, "row 19");
    assert_eq!(doc.fonts_decoded(), 1);
}

#[test]
fn test_ascii_text_round_trips() {
    let printable: String = (0x21u8..=0x7E).map(char::from).collect();
    let words: Vec<String> = printable
        .as_bytes()
        .chunks(9)
        .map(|c| String::from_utf8(c.to_vec()).unwrap())
        .collect();
    let mut rows: Vec<String> = vec![
        "The quick brown fox jumps over the lazy dog.".to_string(),
        "Numbers: 0123456789, symbols: (parens) and \\backslash\\".to_string(),
        "Mixed CASE with  two spaces inside".to_string(),
    ];
    rows.push(words.join(" "));

    let row_refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let pdf = text_document(&[row_refs.as_slice()]);
    let text = extract_text_from_bytes(&pdf).unwrap();

    assert_eq!(text, rows.join("\n"));
}

#[test]
fn test_ascii_round_trips_across_pages_and_compression() {
    let page_rows: Vec<Vec<String>> = (0..6)
        .map(|p| {
            (0..4)
                .map(|l| format!("p{p} l{l} ~!@#$%^&*_+-=[]{{}}|;:',.<>/?`\""))
                .collect()
        })
        .collect();
    let pages: Vec<PageContent> = page_rows
        .iter()
        .map(|rows| {
            let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
            PageContent::Flate(lines(&refs))
        })
        .collect();

    let extracted = extract_bytes(&document(&pages)).unwrap();
    for (page, rows) in extracted.pages.iter().zip(&page_rows) {
        assert_eq!(page.text, rows.join("\n"));
    }
}

#[test]
fn test_encrypted_document_is_refused() {
    let mut pdf = PdfBuilder::new();
    let catalog = pdf.reserve();
    let tree = pdf.reserve();
    let contents = pdf.add_stream("", b"BT /F1 12 Tf (secret) Tj ET");
    let page = pdf.add(format!(
        "<< /Type /Page /Parent {tree} 0 R /Contents {contents} 0 R >>"
    ));
    pdf.set(catalog, format!("<< /Type /Catalog /Pages {tree} 0 R >>"));
    pdf.set(tree, common::pages_node(&[page]));
    let data = pdf.encrypted().build(catalog);

    let err = extract_bytes(&data).unwrap_err();
    assert!(matches!(err, Error::EncryptedDocument));
    assert_eq!(err.kind(), ErrorKind::EncryptedDocument);

    // A password lets the document load, but its content is still refused.
    let extractor = Extractor::new().with_password("hunter2");
    let doc = extractor.load_bytes(data.clone()).unwrap();
    assert!(doc.is_encrypted());
    assert!(doc.metadata().encrypted);
    assert!(matches!(
        extractor.extract_document(&doc),
        Err(Error::EncryptedDocument)
    ));
}

#[test]
fn test_page_selection() {
    let pdf = text_document(&[&["a"], &["b"], &["c"], &["d"], &["e"]]);

    let extracted = Extractor::new()
        .with_pages(PageSelection::parse("2-3,5").unwrap())
        .extract_bytes(pdf.clone())
        .unwrap();
    let numbers: Vec<u32> = extracted.pages.iter().map(|p| p.number).collect();
    assert_eq!(numbers, vec![2, 3, 5]);
    assert_eq!(
        extracted.text(),
        ["b", "c", "e"].join(DEFAULT_PAGE_SEPARATOR)
    );

    let err = Extractor::new()
        .with_pages(PageSelection::Pages(vec![9]))
        .extract_bytes(pdf)
        .unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(9, 5)));
}

#[test]
fn test_custom_separator_and_thresholds() {
    let pdf = text_document(&[&["Hello", "World"], &["Again"]]);
    let extracted = Extractor::new()
        .with_page_separator("\n---\n")
        // A 14pt drop at 12pt text stays on one line above ratio 1.5; the
        // jump back to the left margin still separates the words.
        .with_line_break_ratio(1.5)
        .extract_bytes(pdf)
        .unwrap();
    assert_eq!(extracted.text(), "Hello World\n---\nAgain");
}

#[test]
fn test_tj_kerning_and_positioned_words() {
    let content = "BT /F1 12 Tf 72 700 Td [(Hello) -800 (World)] TJ ET\n\
                   BT /F1 12 Tf 72 680 Td (Split) Tj 60 0 Td (words) Tj ET\n\
                   BT /F1 12 Tf 72 660 Td [(Ke) 30 (rned)] TJ ET";
    let pdf = document(&[PageContent::Plain(content.to_string())]);
    let text = extract_text_from_bytes(&pdf).unwrap();
    assert_eq!(text, "Hello World\nSplit words\nKerned");
}

#[test]
fn test_hex_strings_and_octal_escapes() {
    let content = "BT /F1 12 Tf 72 700 Td <48656C6C6F> Tj 0 -14 Td (caf\\351) Tj ET";
    let pdf = document(&[PageContent::Plain(content.to_string())]);
    assert_eq!(extract_text_from_bytes(&pdf).unwrap(), "Hello\ncafé");
}

#[test]
fn test_extract_text_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("doc.pdf");
    std::fs::write(&path, text_document(&[&["From", "disk"]])).unwrap();

    assert_eq!(plainpdf::extract_text(&path).unwrap(), "From\ndisk");
    assert!(plainpdf::is_pdf(&path));

    let missing = dir.path().join("missing.pdf");
    assert!(matches!(plainpdf::extract_text(missing), Err(Error::Io(_))));
}

#[test]
fn test_extract_text_from_reader() {
    let pdf = text_document(&[&["Streamed"]]);
    let text = plainpdf::extract_text_from_reader(std::io::Cursor::new(pdf)).unwrap();
    assert_eq!(text, "Streamed");
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_extraction_matches_blocking() {
    let pdf = text_document(&[&["Hello", "World"], &["Second"]]);
    let blocking = extract_bytes(&pdf).unwrap();
    let awaited = plainpdf::extract_text_async(pdf).await.unwrap();
    assert_eq!(awaited, blocking);
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}
