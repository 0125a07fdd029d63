//! Generated appearance streams for filled widgets
//!
//! Text is set in Helvetica with WinAnsi encoding. Checkboxes without an
//! appearance of their own get a ZapfDingbats check mark.

use lazy_static::lazy_static;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Object, Stream, StringFormat};
use regex::Regex;

use crate::error::PdfError;

const PADDING: f32 = 2.0;
const MIN_FONT_SIZE: f32 = 4.0;
const MAX_AUTO_FONT_SIZE: f32 = 12.0;

lazy_static! {
    static ref DA_FONT_SIZE: Regex = Regex::new(r"(\d+(?:\.\d+)?)\s+Tf").unwrap();
}

/// Helvetica advance widths for codes 32..=126, in 1/1000 em
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // space../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0..9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, // N..Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, // n..z
    334, 260, 334, 584, // {..~
];

/// Horizontal alignment from the field's `/Q`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quadding {
    #[default]
    Left,
    Center,
    Right,
}

impl Quadding {
    pub fn from_q(q: Option<i64>) -> Self {
        match q {
            Some(1) => Quadding::Center,
            Some(2) => Quadding::Right,
            _ => Quadding::Left,
        }
    }
}

/// Everything needed to lay out a text widget
#[derive(Debug, Clone)]
pub struct TextStyle {
    /// `None` or zero means auto-size
    pub font_size: Option<f32>,
    pub quadding: Quadding,
    pub multiline: bool,
}

/// Font size from a default-appearance string such as `/Helv 10 Tf 0 g`
pub fn font_size_from_da(da: &str) -> Option<f32> {
    DA_FONT_SIZE
        .captures(da)
        .and_then(|c| c[1].parse::<f32>().ok())
        .filter(|size| *size > 0.0)
}

/// Map text to WinAnsi bytes; unmappable characters become `?`
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            0x20..=0x7E | 0xA0..=0xFF => c as u8,
            0x2018 => 0x91,
            0x2019 => 0x92,
            0x201C => 0x93,
            0x201D => 0x94,
            0x2013 => 0x96,
            0x2014 => 0x97,
            0x2022 => 0x95,
            0x20AC => 0x80,
            _ => b'?',
        })
        .collect()
}

/// Width of `text` in points at `size`
pub fn text_width(text: &str, size: f32) -> f32 {
    let units: u32 = to_win_ansi(text)
        .iter()
        .map(|&b| match b {
            32..=126 => HELVETICA_WIDTHS[(b - 32) as usize] as u32,
            _ => 556,
        })
        .sum();
    units as f32 * size / 1000.0
}

fn wrap_lines(text: &str, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if !line.is_empty() && text_width(&candidate, size) > max_width {
                lines.push(std::mem::take(&mut line));
                line = word.to_string();
            } else {
                line = candidate;
            }
        }
        lines.push(line);
    }
    lines
}

fn helvetica_resources() -> Dictionary {
    dictionary! {
        "Font" => dictionary! {
            "Helv" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "Helvetica",
                "Encoding" => "WinAnsiEncoding",
            },
        },
    }
}

fn form_xobject(width: f32, height: f32, resources: Dictionary, operations: Vec<Operation>) -> Result<Stream, PdfError> {
    let content = Content { operations }
        .encode()
        .map_err(|e| PdfError::Serialization(e.to_string()))?;
    Ok(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Resources" => resources,
        },
        content,
    ))
}

fn show_text(x: f32, y: f32, text: &str) -> [Operation; 2] {
    [
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(to_win_ansi(text), StringFormat::Literal)],
        ),
    ]
}

/// Appearance for a text field of `width` x `height` showing `value`
pub fn text_appearance(width: f32, height: f32, value: &str, style: &TextStyle) -> Result<Stream, PdfError> {
    let inner_width = (width - 2.0 * PADDING).max(1.0);
    let inner_height = (height - 2.0 * PADDING).max(1.0);

    let mut size = match style.font_size {
        Some(size) if size > 0.0 => size,
        _ if style.multiline => 10.0f32.min(inner_height),
        _ => (inner_height / 1.2).clamp(MIN_FONT_SIZE, MAX_AUTO_FONT_SIZE),
    };

    let mut ops = vec![
        Operation::new("BT", vec![]),
        Operation::new("g", vec![0.into()]),
    ];

    if style.multiline {
        let lines = wrap_lines(value, size, inner_width);
        let leading = size * 1.15;
        ops.push(Operation::new("Tf", vec!["Helv".into(), size.into()]));
        let mut y = height - PADDING - size * 0.8;
        let mut previous = (0.0, 0.0);
        for line in lines {
            if y < PADDING - size * 0.2 {
                break;
            }
            let x = align(&line, size, inner_width, style.quadding);
            ops.extend(show_text(x - previous.0, y - previous.1, &line));
            previous = (x, y);
            y -= leading;
        }
    } else {
        let single = value.replace(['\r', '\n'], " ");
        let natural = text_width(&single, size);
        if style.font_size.unwrap_or(0.0) <= 0.0 && natural > inner_width {
            size = (size * inner_width / natural).max(MIN_FONT_SIZE);
        }
        ops.push(Operation::new("Tf", vec!["Helv".into(), size.into()]));
        let x = align(&single, size, inner_width, style.quadding);
        let y = (height - size) / 2.0 + size * 0.22;
        ops.extend(show_text(x, y, &single));
    }
    ops.push(Operation::new("ET", vec![]));

    let mut clipped = vec![
        Operation::new("q", vec![]),
        Operation::new(
            "re",
            vec![
                PADDING.into(),
                PADDING.into(),
                inner_width.into(),
                inner_height.into(),
            ],
        ),
        Operation::new("W", vec![]),
        Operation::new("n", vec![]),
    ];
    clipped.extend(ops);
    clipped.push(Operation::new("Q", vec![]));

    form_xobject(width, height, helvetica_resources(), clipped)
}

fn align(text: &str, size: f32, inner_width: f32, quadding: Quadding) -> f32 {
    let slack = (inner_width - text_width(text, size)).max(0.0);
    PADDING
        + match quadding {
            Quadding::Left => 0.0,
            Quadding::Center => slack / 2.0,
            Quadding::Right => slack,
        }
}

/// ZapfDingbats check mark centered in the box
pub fn check_appearance(width: f32, height: f32) -> Result<Stream, PdfError> {
    let size = (width.min(height) * 0.8).max(MIN_FONT_SIZE);
    // glyph "4" is the check mark, 0.846 em wide
    let x = (width - size * 0.846) / 2.0;
    let y = (height - size * 0.7) / 2.0;
    let resources = dictionary! {
        "Font" => dictionary! {
            "ZaDb" => dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => "ZapfDingbats",
            },
        },
    };
    let ops = vec![
        Operation::new("q", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("g", vec![0.into()]),
        Operation::new("Tf", vec!["ZaDb".into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new(
            "Tj",
            vec![Object::String(b"4".to_vec(), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
        Operation::new("Q", vec![]),
    ];
    form_xobject(width, height, resources, ops)
}
