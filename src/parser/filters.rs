//! Stream filter chain.
//!
//! Only the general-purpose filters are decoded. Image codecs and `Crypt`
//! produce [`Error::UnsupportedFilter`], which callers treat as a per-page
//! failure.

use super::lexer::{decode_hex, is_whitespace};
use super::object::{Dictionary, Object};
use crate::error::{Error, Result};
use flate2::read::{DeflateDecoder, ZlibDecoder};
use std::io::Read;

/// Upper bound on the decoded size of a single stream.
pub const MAX_DECODED_SIZE: usize = 256 * 1024 * 1024;

/// A stream filter named in a `/Filter` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    Flate,
    Lzw,
    AsciiHex,
    Ascii85,
    RunLength,
    /// A filter that is recognized but not decoded, or an unknown name.
    Unsupported(String),
}

impl Filter {
    /// Map a filter name, including the inline-image abbreviations.
    pub fn from_name(name: &str) -> Self {
        match name {
            "FlateDecode" | "Fl" => Filter::Flate,
            "LZWDecode" | "LZW" => Filter::Lzw,
            "ASCIIHexDecode" | "AHx" => Filter::AsciiHex,
            "ASCII85Decode" | "A85" => Filter::Ascii85,
            "RunLengthDecode" | "RL" => Filter::RunLength,
            other => Filter::Unsupported(other.to_string()),
        }
    }
}

/// `/DecodeParms` values relevant to the decoded filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeParams {
    pub predictor: i64,
    pub colors: usize,
    pub bits_per_component: usize,
    pub columns: usize,
    pub early_change: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            predictor: 1,
            colors: 1,
            bits_per_component: 8,
            columns: 1,
            early_change: true,
        }
    }
}

impl DecodeParams {
    pub fn from_dict(dict: &Dictionary) -> Self {
        let int = |key: &str| dict.get(key).and_then(Object::as_i64);
        let positive = |key: &str, default: usize| {
            int(key)
                .and_then(|v| usize::try_from(v).ok())
                .filter(|&v| v > 0)
                .unwrap_or(default)
        };
        Self {
            predictor: int("Predictor").unwrap_or(1),
            colors: positive("Colors", 1).min(32),
            bits_per_component: positive("BitsPerComponent", 8).min(16),
            columns: positive("Columns", 1),
            early_change: int("EarlyChange").map_or(true, |v| v != 0),
        }
    }
}

/// Read the `/Filter` and `/DecodeParms` entries of a stream dictionary.
///
/// Entries must already be direct objects.
pub fn filter_chain(filter: Option<&Object>, params: Option<&Object>) -> Vec<(Filter, DecodeParams)> {
    let names: Vec<&str> = match filter {
        Some(Object::Name(n)) => vec![n.as_str()],
        Some(Object::Array(items)) => items.iter().filter_map(Object::as_name).collect(),
        _ => Vec::new(),
    };
    let params_at = |i: usize| -> DecodeParams {
        let obj = match params {
            Some(Object::Array(items)) => items.get(i),
            Some(other) if i == 0 => Some(other),
            _ => None,
        };
        obj.and_then(Object::as_dict)
            .map(DecodeParams::from_dict)
            .unwrap_or_default()
    };
    names
        .into_iter()
        .enumerate()
        .map(|(i, name)| (Filter::from_name(name), params_at(i)))
        .collect()
}

/// Apply a filter chain in declaration order.
pub fn decode(data: &[u8], chain: &[(Filter, DecodeParams)]) -> Result<Vec<u8>> {
    // Refuse before doing any work on the whole chain.
    if let Some((Filter::Unsupported(name), _)) =
        chain.iter().find(|(f, _)| matches!(f, Filter::Unsupported(_)))
    {
        return Err(Error::UnsupportedFilter(name.clone()));
    }

    let mut current = data.to_vec();
    for (filter, params) in chain {
        current = match filter {
            Filter::Flate => apply_predictor(flate_decode(&current)?, params)?,
            Filter::Lzw => apply_predictor(lzw_decode(&current, params.early_change)?, params)?,
            Filter::AsciiHex => ascii_hex_decode(&current),
            Filter::Ascii85 => ascii85_decode(&current)?,
            Filter::RunLength => run_length_decode(&current),
            Filter::Unsupported(name) => return Err(Error::UnsupportedFilter(name.clone())),
        };
        if current.len() > MAX_DECODED_SIZE {
            return Err(Error::StreamDecode(format!(
                "decoded stream exceeds {MAX_DECODED_SIZE} bytes"
            )));
        }
    }
    Ok(current)
}

/// Inflate zlib data, falling back to raw deflate and keeping partial output.
pub fn flate_decode(input: &[u8]) -> Result<Vec<u8>> {
    if input.is_empty() {
        return Ok(Vec::new());
    }
    let limit = MAX_DECODED_SIZE as u64 + 1;

    let mut output = Vec::new();
    let zlib_err = match ZlibDecoder::new(input).take(limit).read_to_end(&mut output) {
        Ok(_) => return Ok(output),
        Err(e) => e,
    };
    if !output.is_empty() {
        log::warn!(
            "FlateDecode partial recovery: {} bytes before error: {zlib_err}",
            output.len()
        );
        return Ok(output);
    }

    // Missing or damaged zlib header.
    for skip in [0usize, 2] {
        let Some(body) = input.get(skip..) else { continue };
        output.clear();
        match DeflateDecoder::new(body).take(limit).read_to_end(&mut output) {
            Ok(_) if !output.is_empty() => return Ok(output),
            Err(_) if !output.is_empty() => {
                log::warn!("FlateDecode partial recovery: {} bytes from raw deflate", output.len());
                return Ok(output);
            }
            _ => {}
        }
    }

    Err(Error::StreamDecode(format!("FlateDecode: {zlib_err}")))
}

/// LZW with MSB-first codes; `early_change` selects the TIFF-style size switch.
pub fn lzw_decode(input: &[u8], early_change: bool) -> Result<Vec<u8>> {
    use weezl::{decode::Decoder, BitOrder};

    let mut decoder = if early_change {
        Decoder::with_tiff_size_switch(BitOrder::Msb, 8)
    } else {
        Decoder::new(BitOrder::Msb, 8)
    };
    let mut output = Vec::new();
    let result = decoder.into_vec(&mut output).decode_all(input);
    match result.status {
        Ok(_) => Ok(output),
        Err(e) if !output.is_empty() => {
            log::warn!("LZWDecode partial recovery: {} bytes before error: {e:?}", output.len());
            Ok(output)
        }
        Err(e) => Err(Error::StreamDecode(format!("LZWDecode: {e:?}"))),
    }
}

pub fn ascii_hex_decode(input: &[u8]) -> Vec<u8> {
    let end = input.iter().position(|&c| c == b'>').unwrap_or(input.len());
    decode_hex(&input[..end])
}

pub fn ascii85_decode(input: &[u8]) -> Result<Vec<u8>> {
    let mut output = Vec::with_capacity(input.len() * 4 / 5);
    let mut group = [0u8; 5];
    let mut count = 0;

    let body = input.strip_prefix(b"<~").unwrap_or(input);
    for &c in body {
        match c {
            b'~' => break,
            b'z' if count == 0 => output.extend_from_slice(&[0; 4]),
            b'!'..=b'u' => {
                group[count] = c - b'!';
                count += 1;
                if count == 5 {
                    output.extend_from_slice(&ascii85_group(&group));
                    count = 0;
                }
            }
            c if is_whitespace(c) => {}
            other => {
                return Err(Error::StreamDecode(format!(
                    "ASCII85Decode: invalid byte 0x{other:02x}"
                )))
            }
        }
    }

    if count == 1 {
        return Err(Error::StreamDecode("ASCII85Decode: dangling final byte".into()));
    }
    if count > 1 {
        for slot in group.iter_mut().skip(count) {
            *slot = b'u' - b'!';
        }
        output.extend_from_slice(&ascii85_group(&group)[..count - 1]);
    }
    Ok(output)
}

fn ascii85_group(group: &[u8; 5]) -> [u8; 4] {
    let value = group
        .iter()
        .fold(0u64, |acc, &d| acc * 85 + u64::from(d));
    (value.min(u64::from(u32::MAX)) as u32).to_be_bytes()
}

pub fn run_length_decode(input: &[u8]) -> Vec<u8> {
    let mut output = Vec::new();
    let mut i = 0;
    while i < input.len() {
        let len = input[i] as usize;
        i += 1;
        match len {
            0..=127 => {
                let end = (i + len + 1).min(input.len());
                output.extend_from_slice(&input[i..end]);
                i = end;
            }
            128 => break,
            _ => {
                if let Some(&b) = input.get(i) {
                    output.extend(std::iter::repeat(b).take(257 - len));
                }
                i += 1;
            }
        }
    }
    output
}

/// Undo TIFF (2) or PNG (10..=15) prediction.
pub fn apply_predictor(data: Vec<u8>, params: &DecodeParams) -> Result<Vec<u8>> {
    match params.predictor {
        2 => Ok(tiff_predictor(data, params)),
        10..=15 => png_predictor(&data, params),
        _ => Ok(data),
    }
}

fn bytes_per_pixel(params: &DecodeParams) -> usize {
    ((params.colors * params.bits_per_component + 7) / 8).max(1)
}

fn row_length(params: &DecodeParams) -> usize {
    (params.colors * params.bits_per_component * params.columns + 7) / 8
}

fn tiff_predictor(mut data: Vec<u8>, params: &DecodeParams) -> Vec<u8> {
    // Only 8-bit components are common enough to matter here.
    if params.bits_per_component != 8 {
        return data;
    }
    let bpp = bytes_per_pixel(params);
    let row_len = row_length(params);
    if row_len == 0 {
        return data;
    }
    for row in data.chunks_mut(row_len) {
        for i in bpp..row.len() {
            row[i] = row[i].wrapping_add(row[i - bpp]);
        }
    }
    data
}

fn png_predictor(data: &[u8], params: &DecodeParams) -> Result<Vec<u8>> {
    let bpp = bytes_per_pixel(params);
    let row_len = row_length(params);
    if row_len == 0 {
        return Err(Error::StreamDecode("PNG predictor with empty rows".into()));
    }

    let mut output = Vec::with_capacity(data.len());
    let mut previous = vec![0u8; row_len];
    for chunk in data.chunks(row_len + 1) {
        let (&filter_type, encoded) = match chunk.split_first() {
            Some(split) => split,
            None => break,
        };
        let mut row = vec![0u8; row_len];
        row[..encoded.len()].copy_from_slice(encoded);

        for i in 0..row_len {
            let left = if i >= bpp { row[i - bpp] } else { 0 };
            let up = previous[i];
            let up_left = if i >= bpp { previous[i - bpp] } else { 0 };
            row[i] = match filter_type {
                0 => row[i],
                1 => row[i].wrapping_add(left),
                2 => row[i].wrapping_add(up),
                3 => row[i].wrapping_add(((u16::from(left) + u16::from(up)) / 2) as u8),
                4 => row[i].wrapping_add(paeth(left, up, up_left)),
                other => {
                    return Err(Error::StreamDecode(format!(
                        "unknown PNG filter type {other}"
                    )))
                }
            };
        }
        output.extend_from_slice(&row[..encoded.len()]);
        previous = row;
    }
    Ok(output)
}

fn paeth(a: u8, b: u8, c: u8) -> u8 {
    let p = i16::from(a) + i16::from(b) - i16::from(c);
    let pa = (p - i16::from(a)).abs();
    let pb = (p - i16::from(b)).abs();
    let pc = (p - i16::from(c)).abs();
    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}
