//! Line classification and text measurement for document export
//!
//! Everything here is independent of the PDF backend.

use tracing::debug;

/// Deeper bullets render at this depth
pub const MAX_BULLET_DEPTH: usize = 4;

/// Role of one line of a markdown plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Heading1(&'a str),
    Heading2(&'a str),
    Heading3(&'a str),
    /// `- ` item; `depth` counts two-space indentation steps, capped at [`MAX_BULLET_DEPTH`]
    Bullet { depth: usize, text: &'a str },
    Blank,
    Body(&'a str),
}

/// Classify one line of the response
pub fn classify(line: &str) -> Line<'_> {
    if line.trim().is_empty() {
        return Line::Blank;
    }
    if let Some(text) = line.strip_prefix("# ") {
        return Line::Heading1(text);
    }
    if let Some(text) = line.strip_prefix("## ") {
        return Line::Heading2(text);
    }
    if let Some(text) = line.strip_prefix("### ") {
        return Line::Heading3(text);
    }

    let trimmed = line.trim_start_matches(' ');
    if let Some(text) = trimmed.strip_prefix("- ") {
        let depth = ((line.len() - trimmed.len()) / 2).min(MAX_BULLET_DEPTH);
        return Line::Bullet { depth, text };
    }

    Line::Body(line)
}

/// Remove inline `**` emphasis markers
pub fn strip_emphasis(text: &str) -> String {
    text.replace("**", "")
}

/// Standard Type1 faces used by the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    BoldOblique,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 4] = [Font::Regular, Font::Bold, Font::BoldOblique, Font::Oblique];

    /// PostScript name of the base font
    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::BoldOblique => "Helvetica-BoldOblique",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    /// Name of the font in the page resource dictionary
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::BoldOblique => "F3",
            Font::Oblique => "F4",
        }
    }

    fn is_bold(&self) -> bool {
        matches!(self, Font::Bold | Font::BoldOblique)
    }
}

// Advance widths (1/1000 em) for ASCII 32..=126, from the Helvetica AFM files.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

fn char_width(c: char, font: Font) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        let idx = (code - 32) as usize;
        if font.is_bold() {
            HELVETICA_BOLD_WIDTHS[idx]
        } else {
            HELVETICA_WIDTHS[idx]
        }
    } else if c == '•' {
        350
    } else {
        556
    }
}

/// Width of `text` in points at `size`
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, font))).sum();
    units as f32 * size / 1000.0
}

/// Greedy word wrap to `max_width` points
///
/// Words wider than a whole line are split by character. Always returns at
/// least one (possibly empty) line.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    debug!(text_len = text.len(), %max_width, "wrap: called");
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if text_width(&candidate, font, size) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }

        if text_width(word, font, size) <= max_width {
            current = word.to_string();
        } else {
            for c in word.chars() {
                current.push(c);
                if text_width(&current, font, size) > max_width && current.chars().count() > 1 {
                    current.pop();
                    lines.push(std::mem::take(&mut current));
                    current.push(c);
                }
            }
        }
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

/// Encode text for a WinAnsiEncoding Type1 font
///
/// Characters with no WinAnsi code become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            '\u{20}'..='\u{7e}' => c as u8,
            '\u{a0}'..='\u{ff}' => c as u32 as u8,
            '€' => 0x80,
            '‚' => 0x82,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            '–' => 0x96,
            '—' => 0x97,
            '™' => 0x99,
            '\t' => b' ',
            _ => b'?',
        })
        .collect()
}
