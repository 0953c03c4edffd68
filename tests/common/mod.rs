//! Synthetic PDF construction for integration tests.
//!
//! Every file is written with exact byte offsets so the cross-reference data
//! is valid unless a test deliberately damages it.

#![allow(dead_code)]

use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::Write;

/// A WinAnsi Helvetica, which maps printable ASCII to itself.
pub const HELVETICA: &str =
    "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>";

/// Leading used by [`lines`], comfortably above the line-break threshold.
pub const LEADING: f64 = 14.0;

/// Assembles numbered objects into a PDF file.
#[derive(Debug, Default)]
pub struct PdfBuilder {
    objects: Vec<Option<Vec<u8>>>,
    info: Option<u32>,
    encrypted: bool,
}

impl PdfBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an object number to fill in later with [`PdfBuilder::set`].
    pub fn reserve(&mut self) -> u32 {
        self.objects.push(None);
        self.objects.len() as u32
    }

    pub fn set(&mut self, id: u32, body: impl Into<Vec<u8>>) {
        self.objects[id as usize - 1] = Some(body.into());
    }

    pub fn add(&mut self, body: impl Into<Vec<u8>>) -> u32 {
        let id = self.reserve();
        self.set(id, body);
        id
    }

    /// Add a stream object. `entries` is spliced into the stream dictionary.
    pub fn add_stream(&mut self, entries: &str, data: &[u8]) -> u32 {
        let mut body = format!("<< /Length {} {entries} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.add(body)
    }

    pub fn add_flate_stream(&mut self, data: &[u8]) -> u32 {
        self.add_stream("/Filter /FlateDecode", &deflate(data))
    }

    pub fn with_info(&mut self, id: u32) -> &mut Self {
        self.info = Some(id);
        self
    }

    /// Declare a standard security handler in the trailer.
    pub fn encrypted(&mut self) -> &mut Self {
        self.encrypted = true;
        self
    }

    fn trailer_entries(&self, root: u32) -> String {
        let mut entries = format!("/Root {root} 0 R");
        if let Some(info) = self.info {
            entries.push_str(&format!(" /Info {info} 0 R"));
        }
        if self.encrypted {
            entries.push_str(" /Encrypt << /Filter /Standard /V 1 /R 2 /O <00> /U <00> /P -4 >>");
        }
        entries
    }

    fn write_objects(&self, out: &mut Vec<u8>, skip: &[u32]) -> Vec<usize> {
        let mut offsets = vec![0; self.objects.len()];
        for (i, body) in self.objects.iter().enumerate() {
            let id = i as u32 + 1;
            if skip.contains(&id) {
                continue;
            }
            offsets[i] = out.len();
            out.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
            out.extend_from_slice(body.as_deref().unwrap_or(b"null"));
            out.extend_from_slice(b"\nendobj\n");
        }
        offsets
    }

    /// Write the file with a classic cross-reference table.
    pub fn build(&self, root: u32) -> Vec<u8> {
        let mut out = b"%PDF-1.4\n".to_vec();
        let offsets = self.write_objects(&mut out, &[]);

        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1).as_bytes());
        for offset in offsets {
            out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} {} >>\nstartxref\n{xref}\n%%EOF\n",
                self.objects.len() + 1,
                self.trailer_entries(root)
            )
            .as_bytes(),
        );
        out
    }

    /// Write the file with a cross-reference stream, moving the objects in
    /// `compressed` into a single object stream. Stream objects cannot be
    /// compressed.
    pub fn build_with_xref_stream(&self, root: u32, compressed: &[u32]) -> Vec<u8> {
        let mut out = b"%PDF-1.5\n".to_vec();
        let offsets = self.write_objects(&mut out, compressed);
        let xref_offset = self.write_xref_stream(&mut out, root, &offsets, compressed);
        out.extend_from_slice(format!("startxref\n{xref_offset}\n%%EOF\n").as_bytes());
        out
    }

    /// Write a hybrid-reference file: a classic table that marks the objects
    /// in `compressed` free, and a trailer `/XRefStm` pointing at a
    /// cross-reference stream that locates them in an object stream.
    pub fn build_hybrid(&self, root: u32, compressed: &[u32]) -> Vec<u8> {
        let mut out = b"%PDF-1.5\n".to_vec();
        let offsets = self.write_objects(&mut out, compressed);
        let stream_offset = self.write_xref_stream(&mut out, root, &offsets, compressed);

        let xref = out.len();
        out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1).as_bytes());
        for (i, offset) in offsets.iter().enumerate() {
            if compressed.contains(&(i as u32 + 1)) {
                out.extend_from_slice(b"0000000000 00000 f \n");
            } else {
                out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
            }
        }
        out.extend_from_slice(
            format!(
                "trailer\n<< /Size {} {} /XRefStm {stream_offset} >>\nstartxref\n{xref}\n%%EOF\n",
                self.objects.len() + 1,
                self.trailer_entries(root)
            )
            .as_bytes(),
        );
        out
    }

    /// Append an object stream holding `compressed` and a cross-reference
    /// stream covering every object. Returns the cross-reference stream's offset.
    fn write_xref_stream(&self, out: &mut Vec<u8>, root: u32, offsets: &[usize], compressed: &[u32]) -> usize {
        let objstm_id = self.objects.len() as u32 + 1;
        let mut header = String::new();
        let mut bodies = Vec::new();
        for &id in compressed {
            header.push_str(&format!("{id} {} ", bodies.len()));
            bodies.extend_from_slice(self.objects[id as usize - 1].as_deref().unwrap_or(b"null"));
            bodies.push(b'\n');
        }
        let mut objstm = header.into_bytes();
        let first = objstm.len();
        objstm.extend_from_slice(&bodies);
        let packed = deflate(&objstm);
        let objstm_offset = out.len();
        out.extend_from_slice(
            format!(
                "{objstm_id} 0 obj\n<< /Type /ObjStm /N {} /First {first} /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len(),
                packed.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&packed);
        out.extend_from_slice(b"\nendstream\nendobj\n");

        let xref_id = objstm_id + 1;
        let xref_offset = out.len();
        let mut rows = vec![0u8, 0, 0, 0, 0, 0xFF, 0xFF];
        for (i, offset) in offsets.iter().enumerate() {
            let id = i as u32 + 1;
            match compressed.iter().position(|&c| c == id) {
                Some(index) => push_row(&mut rows, 2, objstm_id as u64, index as u16),
                None => push_row(&mut rows, 1, *offset as u64, 0),
            }
        }
        push_row(&mut rows, 1, objstm_offset as u64, 0);
        push_row(&mut rows, 1, xref_offset as u64, 0);

        out.extend_from_slice(
            format!(
                "{xref_id} 0 obj\n<< /Type /XRef /Size {} /W [1 4 2] {} /Length {} >>\nstream\n",
                xref_id + 1,
                self.trailer_entries(root),
                rows.len()
            )
            .as_bytes(),
        );
        out.extend_from_slice(&rows);
        out.extend_from_slice(b"\nendstream\nendobj\n");
        xref_offset
    }
}

fn push_row(rows: &mut Vec<u8>, kind: u8, field: u64, generation: u16) {
    rows.push(kind);
    rows.extend_from_slice(&(field as u32).to_be_bytes());
    rows.extend_from_slice(&generation.to_be_bytes());
}

pub fn deflate(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Escape text for a PDF literal string.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '(' | ')' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// A content stream showing each line with `/F1` at 12pt, one line per row.
pub fn lines(rows: &[&str]) -> String {
    let mut content = String::from("BT /F1 12 Tf 72 720 Td\n");
    for (i, row) in rows.iter().enumerate() {
        if i > 0 {
            content.push_str(&format!("0 -{LEADING} Td\n"));
        }
        content.push_str(&format!("({}) Tj\n", escape(row)));
    }
    content.push_str("ET\n");
    content
}

/// How a page's content stream is stored.
#[derive(Debug, Clone)]
pub enum PageContent {
    Plain(String),
    Flate(String),
    /// Raw bytes declared with the given filter name.
    Filtered(String, &'static str),
}

impl PageContent {
    pub fn text(rows: &[&str]) -> Self {
        PageContent::Plain(lines(rows))
    }
}

/// Build a document whose pages all use one shared indirect Helvetica as `/F1`.
pub fn document(pages: &[PageContent]) -> Vec<u8> {
    let mut pdf = PdfBuilder::new();
    let catalog = pdf.reserve();
    let tree = pdf.reserve();
    let font = pdf.add(HELVETICA);

    let mut kids = Vec::new();
    for page in pages {
        let contents = match page {
            PageContent::Plain(text) => pdf.add_stream("", text.as_bytes()),
            PageContent::Flate(text) => pdf.add_flate_stream(text.as_bytes()),
            PageContent::Filtered(data, filter) => {
                pdf.add_stream(&format!("/Filter /{filter}"), data.as_bytes())
            }
        };
        kids.push(pdf.add(format!(
            "<< /Type /Page /Parent {tree} 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font} 0 R >> >> /Contents {contents} 0 R >>"
        )));
    }

    pdf.set(catalog, format!("<< /Type /Catalog /Pages {tree} 0 R >>"));
    pdf.set(tree, pages_node(&kids));
    pdf.build(catalog)
}

/// A document with one text page per entry.
pub fn text_document(pages: &[&[&str]]) -> Vec<u8> {
    let contents: Vec<PageContent> = pages.iter().map(|rows| PageContent::text(rows)).collect();
    document(&contents)
}

pub fn pages_node(kids: &[u32]) -> String {
    let refs: Vec<String> = kids.iter().map(|k| format!("{k} 0 R")).collect();
    format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        refs.join(" "),
        kids.len()
    )
}
