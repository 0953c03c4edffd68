//! Single-byte base encodings and glyph-name lookup.

/// A built-in simple-font encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseEncoding {
    Standard,
    WinAnsi,
    MacRoman,
    /// `/Identity` style or symbolic fonts: codes are taken as Latin-1.
    Latin1,
}

impl BaseEncoding {
    /// Map an `/Encoding` or `/BaseEncoding` name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "StandardEncoding" => Some(BaseEncoding::Standard),
            "WinAnsiEncoding" => Some(BaseEncoding::WinAnsi),
            "MacRomanEncoding" | "MacExpertEncoding" => Some(BaseEncoding::MacRoman),
            _ => None,
        }
    }

    /// Unicode for a single-byte code, if the encoding defines one.
    pub fn decode(self, code: u8) -> Option<char> {
        match self {
            BaseEncoding::Standard => standard(code),
            BaseEncoding::WinAnsi => win_ansi(code),
            BaseEncoding::MacRoman => mac_roman(code),
            BaseEncoding::Latin1 => printable(char::from(code)),
        }
    }

    /// The full 256-entry table.
    pub fn table(self) -> [Option<char>; 256] {
        let mut table = [None; 256];
        for (code, slot) in table.iter_mut().enumerate() {
            *slot = self.decode(code as u8);
        }
        table
    }
}

fn printable(c: char) -> Option<char> {
    (!c.is_control()).then_some(c)
}

fn ascii(code: u8) -> Option<char> {
    (0x20..0x7F).contains(&code).then_some(char::from(code))
}

fn win_ansi(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH[usize::from(code - 0x80)],
        0xA0..=0xFF => Some(char::from(code)),
        // Tabs and line feeds occasionally appear in the low range.
        0x09 | 0x0A | 0x0D => Some(char::from(code)),
        _ => ascii(code),
    }
}

fn mac_roman(code: u8) -> Option<char> {
    match code {
        0x80..=0xFF => MAC_ROMAN_HIGH[usize::from(code - 0x80)],
        _ => ascii(code),
    }
}

fn standard(code: u8) -> Option<char> {
    let c = match code {
        0x27 => '\u{2019}',
        0x60 => '\u{2018}',
        0x20..=0x7E => char::from(code),
        0xA1 => '\u{00A1}',
        0xA2 => '\u{00A2}',
        0xA3 => '\u{00A3}',
        0xA4 => '\u{2044}',
        0xA5 => '\u{00A5}',
        0xA6 => '\u{0192}',
        0xA7 => '\u{00A7}',
        0xA8 => '\u{00A4}',
        0xA9 => '\'',
        0xAA => '\u{201C}',
        0xAB => '\u{00AB}',
        0xAC => '\u{2039}',
        0xAD => '\u{203A}',
        0xAE => '\u{FB01}',
        0xAF => '\u{FB02}',
        0xB1 => '\u{2013}',
        0xB2 => '\u{2020}',
        0xB3 => '\u{2021}',
        0xB4 => '\u{00B7}',
        0xB6 => '\u{00B6}',
        0xB7 => '\u{2022}',
        0xB8 => '\u{201A}',
        0xB9 => '\u{201E}',
        0xBA => '\u{201D}',
        0xBB => '\u{00BB}',
        0xBC => '\u{2026}',
        0xBD => '\u{2030}',
        0xBF => '\u{00BF}',
        0xC1 => '`',
        0xC2 => '\u{00B4}',
        0xC3 => '\u{02C6}',
        0xC4 => '\u{02DC}',
        0xC5 => '\u{00AF}',
        0xC6 => '\u{02D8}',
        0xC7 => '\u{02D9}',
        0xC8 => '\u{00A8}',
        0xCA => '\u{02DA}',
        0xCB => '\u{00B8}',
        0xCD => '\u{02DD}',
        0xCE => '\u{02DB}',
        0xCF => '\u{02C7}',
        0xD0 => '\u{2014}',
        0xE1 => '\u{00C6}',
        0xE3 => '\u{00AA}',
        0xE8 => '\u{0141}',
        0xE9 => '\u{00D8}',
        0xEA => '\u{0152}',
        0xEB => '\u{00BA}',
        0xF1 => '\u{00E6}',
        0xF5 => '\u{0131}',
        0xF8 => '\u{0142}',
        0xF9 => '\u{00F8}',
        0xFA => '\u{0153}',
        0xFB => '\u{00DF}',
        _ => return None,
    };
    Some(c)
}

/// Unicode text for a glyph name.
///
/// Handles the common Adobe names, `uniXXXX` (one or more code units),
/// `uXXXX`..`uXXXXXX`, and suffixed variants such as `a.sc` or `f_i`.
pub fn glyph_name_to_unicode(name: &str) -> Option<String> {
    let base = name.split('.').next().unwrap_or(name);
    if base.is_empty() {
        return None;
    }

    if base.contains('_') {
        let parts: Option<String> = base.split('_').map(single_glyph).collect();
        return parts.filter(|s| !s.is_empty());
    }
    single_glyph(base)
}

fn single_glyph(name: &str) -> Option<String> {
    if let Ok(i) = GLYPH_NAMES.binary_search_by(|(n, _)| (*n).cmp(name)) {
        return Some(GLYPH_NAMES[i].1.to_string());
    }
    if let Some(hex) = name.strip_prefix("uni") {
        if hex.len() >= 4 && hex.len() % 4 == 0 {
            let units: Option<Vec<u16>> = hex
                .as_bytes()
                .chunks(4)
                .map(|c| std::str::from_utf8(c).ok().and_then(|s| u16::from_str_radix(s, 16).ok()))
                .collect();
            return units.map(|u| String::from_utf16_lossy(&u));
        }
    }
    if let Some(hex) = name.strip_prefix('u') {
        if (4..=6).contains(&hex.len()) {
            return u32::from_str_radix(hex, 16)
                .ok()
                .and_then(char::from_u32)
                .map(String::from);
        }
    }
    // Names like "g123" or "cid123" carry no Unicode.
    None
}

const WIN_ANSI_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None, Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None, Some('\u{017D}'), None,
    None, Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None, Some('\u{017E}'), Some('\u{0178}'),
];

const MAC_ROMAN_HIGH: [Option<char>; 128] = [
    Some('\u{00C4}'), Some('\u{00C5}'), Some('\u{00C7}'), Some('\u{00C9}'),
    Some('\u{00D1}'), Some('\u{00D6}'), Some('\u{00DC}'), Some('\u{00E1}'),
    Some('\u{00E0}'), Some('\u{00E2}'), Some('\u{00E4}'), Some('\u{00E3}'),
    Some('\u{00E5}'), Some('\u{00E7}'), Some('\u{00E9}'), Some('\u{00E8}'),
    Some('\u{00EA}'), Some('\u{00EB}'), Some('\u{00ED}'), Some('\u{00EC}'),
    Some('\u{00EE}'), Some('\u{00EF}'), Some('\u{00F1}'), Some('\u{00F3}'),
    Some('\u{00F2}'), Some('\u{00F4}'), Some('\u{00F6}'), Some('\u{00F5}'),
    Some('\u{00FA}'), Some('\u{00F9}'), Some('\u{00FB}'), Some('\u{00FC}'),
    Some('\u{2020}'), Some('\u{00B0}'), Some('\u{00A2}'), Some('\u{00A3}'),
    Some('\u{00A7}'), Some('\u{2022}'), Some('\u{00B6}'), Some('\u{00DF}'),
    Some('\u{00AE}'), Some('\u{00A9}'), Some('\u{2122}'), Some('\u{00B4}'),
    Some('\u{00A8}'), Some('\u{2260}'), Some('\u{00C6}'), Some('\u{00D8}'),
    Some('\u{221E}'), Some('\u{00B1}'), Some('\u{2264}'), Some('\u{2265}'),
    Some('\u{00A5}'), Some('\u{00B5}'), Some('\u{2202}'), Some('\u{2211}'),
    Some('\u{220F}'), Some('\u{03C0}'), Some('\u{222B}'), Some('\u{00AA}'),
    Some('\u{00BA}'), Some('\u{03A9}'), Some('\u{00E6}'), Some('\u{00F8}'),
    Some('\u{00BF}'), Some('\u{00A1}'), Some('\u{00AC}'), Some('\u{221A}'),
    Some('\u{0192}'), Some('\u{2248}'), Some('\u{2206}'), Some('\u{00AB}'),
    Some('\u{00BB}'), Some('\u{2026}'), Some('\u{00A0}'), Some('\u{00C0}'),
    Some('\u{00C3}'), Some('\u{00D5}'), Some('\u{0152}'), Some('\u{0153}'),
    Some('\u{2013}'), Some('\u{2014}'), Some('\u{201C}'), Some('\u{201D}'),
    Some('\u{2018}'), Some('\u{2019}'), Some('\u{00F7}'), Some('\u{25CA}'),
    Some('\u{00FF}'), Some('\u{0178}'), Some('\u{2044}'), Some('\u{20AC}'),
    Some('\u{2039}'), Some('\u{203A}'), Some('\u{FB01}'), Some('\u{FB02}'),
    Some('\u{2021}'), Some('\u{00B7}'), Some('\u{201A}'), Some('\u{201E}'),
    Some('\u{2030}'), Some('\u{00C2}'), Some('\u{00CA}'), Some('\u{00C1}'),
    Some('\u{00CB}'), Some('\u{00C8}'), Some('\u{00CD}'), Some('\u{00CE}'),
    Some('\u{00CF}'), Some('\u{00CC}'), Some('\u{00D3}'), Some('\u{00D4}'),
    Some('\u{F8FF}'), Some('\u{00D2}'), Some('\u{00DA}'), Some('\u{00DB}'),
    Some('\u{00D9}'), Some('\u{0131}'), Some('\u{02C6}'), Some('\u{02DC}'),
    Some('\u{00AF}'), Some('\u{02D8}'), Some('\u{02D9}'), Some('\u{02DA}'),
    Some('\u{00B8}'), Some('\u{02DD}'), Some('\u{02DB}'), Some('\u{02C7}'),
];

/// Adobe glyph names, sorted by name for binary search.
static GLYPH_NAMES: &[(&str, char)] = &[
    ("A", '\u{0041}'),
    ("AE", '\u{00C6}'),
    ("Aacute", '\u{00C1}'),
    ("Acircumflex", '\u{00C2}'),
    ("Adieresis", '\u{00C4}'),
    ("Agrave", '\u{00C0}'),
    ("Alpha", '\u{0391}'),
    ("Aogonek", '\u{0104}'),
    ("Aring", '\u{00C5}'),
    ("Atilde", '\u{00C3}'),
    ("B", '\u{0042}'),
    ("Beta", '\u{0392}'),
    ("C", '\u{0043}'),
    ("Cacute", '\u{0106}'),
    ("Ccaron", '\u{010C}'),
    ("Ccedilla", '\u{00C7}'),
    ("D", '\u{0044}'),
    ("Dcaron", '\u{010E}'),
    ("Delta", '\u{2206}'),
    ("E", '\u{0045}'),
    ("Eacute", '\u{00C9}'),
    ("Ecaron", '\u{011A}'),
    ("Ecircumflex", '\u{00CA}'),
    ("Edieresis", '\u{00CB}'),
    ("Egrave", '\u{00C8}'),
    ("Eogonek", '\u{0118}'),
    ("Eth", '\u{00D0}'),
    ("Euro", '\u{20AC}'),
    ("F", '\u{0046}'),
    ("G", '\u{0047}'),
    ("Gamma", '\u{0393}'),
    ("Gbreve", '\u{011E}'),
    ("H", '\u{0048}'),
    ("I", '\u{0049}'),
    ("Iacute", '\u{00CD}'),
    ("Icircumflex", '\u{00CE}'),
    ("Idieresis", '\u{00CF}'),
    ("Idotaccent", '\u{0130}'),
    ("Igrave", '\u{00CC}'),
    ("J", '\u{004A}'),
    ("K", '\u{004B}'),
    ("L", '\u{004C}'),
    ("Lslash", '\u{0141}'),
    ("M", '\u{004D}'),
    ("N", '\u{004E}'),
    ("Nacute", '\u{0143}'),
    ("Ncaron", '\u{0147}'),
    ("Ntilde", '\u{00D1}'),
    ("O", '\u{004F}'),
    ("OE", '\u{0152}'),
    ("Oacute", '\u{00D3}'),
    ("Ocircumflex", '\u{00D4}'),
    ("Odieresis", '\u{00D6}'),
    ("Ograve", '\u{00D2}'),
    ("Ohungarumlaut", '\u{0150}'),
    ("Omega", '\u{03A9}'),
    ("Oslash", '\u{00D8}'),
    ("Otilde", '\u{00D5}'),
    ("P", '\u{0050}'),
    ("Q", '\u{0051}'),
    ("R", '\u{0052}'),
    ("Rcaron", '\u{0158}'),
    ("S", '\u{0053}'),
    ("Sacute", '\u{015A}'),
    ("Scaron", '\u{0160}'),
    ("Scedilla", '\u{015E}'),
    ("T", '\u{0054}'),
    ("Tcaron", '\u{0164}'),
    ("Thorn", '\u{00DE}'),
    ("U", '\u{0055}'),
    ("Uacute", '\u{00DA}'),
    ("Ucircumflex", '\u{00DB}'),
    ("Udieresis", '\u{00DC}'),
    ("Ugrave", '\u{00D9}'),
    ("Uhungarumlaut", '\u{0170}'),
    ("Uring", '\u{016E}'),
    ("V", '\u{0056}'),
    ("W", '\u{0057}'),
    ("X", '\u{0058}'),
    ("Y", '\u{0059}'),
    ("Yacute", '\u{00DD}'),
    ("Ydieresis", '\u{0178}'),
    ("Z", '\u{005A}'),
    ("Zacute", '\u{0179}'),
    ("Zcaron", '\u{017D}'),
    ("Zdotaccent", '\u{017B}'),
    ("a", '\u{0061}'),
    ("aacute", '\u{00E1}'),
    ("acircumflex", '\u{00E2}'),
    ("acute", '\u{00B4}'),
    ("adieresis", '\u{00E4}'),
    ("ae", '\u{00E6}'),
    ("agrave", '\u{00E0}'),
    ("alpha", '\u{03B1}'),
    ("ampersand", '\u{0026}'),
    ("aogonek", '\u{0105}'),
    ("approxequal", '\u{2248}'),
    ("aring", '\u{00E5}'),
    ("arrowdown", '\u{2193}'),
    ("arrowleft", '\u{2190}'),
    ("arrowright", '\u{2192}'),
    ("arrowup", '\u{2191}'),
    ("asciicircum", '\u{005E}'),
    ("asciitilde", '\u{007E}'),
    ("asterisk", '\u{002A}'),
    ("at", '\u{0040}'),
    ("atilde", '\u{00E3}'),
    ("b", '\u{0062}'),
    ("backslash", '\u{005C}'),
    ("bar", '\u{007C}'),
    ("beta", '\u{03B2}'),
    ("braceleft", '\u{007B}'),
    ("braceright", '\u{007D}'),
    ("bracketleft", '\u{005B}'),
    ("bracketright", '\u{005D}'),
    ("breve", '\u{02D8}'),
    ("brokenbar", '\u{00A6}'),
    ("bullet", '\u{2022}'),
    ("c", '\u{0063}'),
    ("cacute", '\u{0107}'),
    ("caron", '\u{02C7}'),
    ("ccaron", '\u{010D}'),
    ("ccedilla", '\u{00E7}'),
    ("cedilla", '\u{00B8}'),
    ("cent", '\u{00A2}'),
    ("checkmark", '\u{2713}'),
    ("circumflex", '\u{02C6}'),
    ("colon", '\u{003A}'),
    ("comma", '\u{002C}'),
    ("copyright", '\u{00A9}'),
    ("copyrightserif", '\u{00A9}'),
    ("currency", '\u{00A4}'),
    ("d", '\u{0064}'),
    ("dagger", '\u{2020}'),
    ("daggerdbl", '\u{2021}'),
    ("dcaron", '\u{010F}'),
    ("degree", '\u{00B0}'),
    ("delta", '\u{03B4}'),
    ("dieresis", '\u{00A8}'),
    ("divide", '\u{00F7}'),
    ("dollar", '\u{0024}'),
    ("dotaccent", '\u{02D9}'),
    ("dotlessi", '\u{0131}'),
    ("dotlessj", '\u{0237}'),
    ("e", '\u{0065}'),
    ("eacute", '\u{00E9}'),
    ("ecaron", '\u{011B}'),
    ("ecircumflex", '\u{00EA}'),
    ("edieresis", '\u{00EB}'),
    ("egrave", '\u{00E8}'),
    ("eight", '\u{0038}'),
    ("ellipsis", '\u{2026}'),
    ("emdash", '\u{2014}'),
    ("endash", '\u{2013}'),
    ("eogonek", '\u{0119}'),
    ("epsilon", '\u{03B5}'),
    ("equal", '\u{003D}'),
    ("eth", '\u{00F0}'),
    ("exclam", '\u{0021}'),
    ("exclamdown", '\u{00A1}'),
    ("f", '\u{0066}'),
    ("ff", '\u{FB00}'),
    ("ffi", '\u{FB03}'),
    ("ffl", '\u{FB04}'),
    ("fi", '\u{FB01}'),
    ("five", '\u{0035}'),
    ("fl", '\u{FB02}'),
    ("florin", '\u{0192}'),
    ("four", '\u{0034}'),
    ("fraction", '\u{2044}'),
    ("g", '\u{0067}'),
    ("gamma", '\u{03B3}'),
    ("gbreve", '\u{011F}'),
    ("germandbls", '\u{00DF}'),
    ("grave", '\u{0060}'),
    ("greater", '\u{003E}'),
    ("greaterequal", '\u{2265}'),
    ("guillemotleft", '\u{00AB}'),
    ("guillemotright", '\u{00BB}'),
    ("guilsinglleft", '\u{2039}'),
    ("guilsinglright", '\u{203A}'),
    ("h", '\u{0068}'),
    ("hungarumlaut", '\u{02DD}'),
    ("hyphen", '\u{002D}'),
    ("i", '\u{0069}'),
    ("iacute", '\u{00ED}'),
    ("icircumflex", '\u{00EE}'),
    ("idieresis", '\u{00EF}'),
    ("igrave", '\u{00EC}'),
    ("infinity", '\u{221E}'),
    ("integral", '\u{222B}'),
    ("j", '\u{006A}'),
    ("k", '\u{006B}'),
    ("l", '\u{006C}'),
    ("lambda", '\u{03BB}'),
    ("less", '\u{003C}'),
    ("lessequal", '\u{2264}'),
    ("logicalnot", '\u{00AC}'),
    ("lozenge", '\u{25CA}'),
    ("lslash", '\u{0142}'),
    ("m", '\u{006D}'),
    ("macron", '\u{00AF}'),
    ("minus", '\u{2212}'),
    ("mu", '\u{00B5}'),
    ("multiply", '\u{00D7}'),
    ("n", '\u{006E}'),
    ("nacute", '\u{0144}'),
    ("nbspace", '\u{00A0}'),
    ("ncaron", '\u{0148}'),
    ("nine", '\u{0039}'),
    ("notequal", '\u{2260}'),
    ("ntilde", '\u{00F1}'),
    ("numbersign", '\u{0023}'),
    ("o", '\u{006F}'),
    ("oacute", '\u{00F3}'),
    ("ocircumflex", '\u{00F4}'),
    ("odieresis", '\u{00F6}'),
    ("oe", '\u{0153}'),
    ("ogonek", '\u{02DB}'),
    ("ograve", '\u{00F2}'),
    ("ohungarumlaut", '\u{0151}'),
    ("omega", '\u{03C9}'),
    ("one", '\u{0031}'),
    ("onehalf", '\u{00BD}'),
    ("onequarter", '\u{00BC}'),
    ("onesuperior", '\u{00B9}'),
    ("ordfeminine", '\u{00AA}'),
    ("ordmasculine", '\u{00BA}'),
    ("oslash", '\u{00F8}'),
    ("otilde", '\u{00F5}'),
    ("p", '\u{0070}'),
    ("paragraph", '\u{00B6}'),
    ("parenleft", '\u{0028}'),
    ("parenright", '\u{0029}'),
    ("partialdiff", '\u{2202}'),
    ("percent", '\u{0025}'),
    ("period", '\u{002E}'),
    ("periodcentered", '\u{00B7}'),
    ("perthousand", '\u{2030}'),
    ("pi", '\u{03C0}'),
    ("plus", '\u{002B}'),
    ("plusminus", '\u{00B1}'),
    ("product", '\u{220F}'),
    ("q", '\u{0071}'),
    ("question", '\u{003F}'),
    ("questiondown", '\u{00BF}'),
    ("quotedbl", '\u{0022}'),
    ("quotedblbase", '\u{201E}'),
    ("quotedblleft", '\u{201C}'),
    ("quotedblright", '\u{201D}'),
    ("quoteleft", '\u{2018}'),
    ("quoteright", '\u{2019}'),
    ("quotesinglbase", '\u{201A}'),
    ("quotesingle", '\u{0027}'),
    ("r", '\u{0072}'),
    ("radical", '\u{221A}'),
    ("rcaron", '\u{0159}'),
    ("registered", '\u{00AE}'),
    ("registerserif", '\u{00AE}'),
    ("ring", '\u{02DA}'),
    ("s", '\u{0073}'),
    ("sacute", '\u{015B}'),
    ("scaron", '\u{0161}'),
    ("scedilla", '\u{015F}'),
    ("section", '\u{00A7}'),
    ("semicolon", '\u{003B}'),
    ("seven", '\u{0037}'),
    ("sfthyphen", '\u{00AD}'),
    ("sigma", '\u{03C3}'),
    ("six", '\u{0036}'),
    ("slash", '\u{002F}'),
    ("space", '\u{0020}'),
    ("sterling", '\u{00A3}'),
    ("summation", '\u{2211}'),
    ("t", '\u{0074}'),
    ("tcaron", '\u{0165}'),
    ("theta", '\u{03B8}'),
    ("thorn", '\u{00FE}'),
    ("three", '\u{0033}'),
    ("threequarters", '\u{00BE}'),
    ("threesuperior", '\u{00B3}'),
    ("tilde", '\u{02DC}'),
    ("trademark", '\u{2122}'),
    ("trademarkserif", '\u{2122}'),
    ("two", '\u{0032}'),
    ("twosuperior", '\u{00B2}'),
    ("u", '\u{0075}'),
    ("uacute", '\u{00FA}'),
    ("ucircumflex", '\u{00FB}'),
    ("udieresis", '\u{00FC}'),
    ("ugrave", '\u{00F9}'),
    ("uhungarumlaut", '\u{0171}'),
    ("underscore", '\u{005F}'),
    ("uring", '\u{016F}'),
    ("v", '\u{0076}'),
    ("w", '\u{0077}'),
    ("x", '\u{0078}'),
    ("y", '\u{0079}'),
    ("yacute", '\u{00FD}'),
    ("ydieresis", '\u{00FF}'),
    ("yen", '\u{00A5}'),
    ("z", '\u{007A}'),
    ("zacute", '\u{017A}'),
    ("zcaron", '\u{017E}'),
    ("zdotaccent", '\u{017C}'),
    ("zero", '\u{0030}'),
];
