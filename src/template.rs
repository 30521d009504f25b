//! Message templates (descriptors) for deferred formatting.
//!
//! A [`Template`] is constant text with at most [`FIELD_COUNT`] integer
//! placeholders. Producers capture a `&'static Template` plus the raw
//! field values; the consumer interpolates them later. Templates are
//! validated when they are defined, so a `static` built with
//! [`Template::new`] that does not satisfy the grammar fails to compile.
//!
//! # Grammar
//!
//! ```text
//! %[flags][width][length]conv
//!
//! flags   0 (zero pad), - (left align)
//! width   0..=32
//! length  l, h (accepted, ignored: every field is 32 bits)
//! conv    u d i x X o c
//! %%      literal percent sign
//! ```
//!
//! A template is one line: newlines may only appear at the end.

use core::fmt::{self, Write};

use crate::error::TemplateError;
use crate::render::LineWriter;

/// Number of numeric fields carried by every message.
pub const FIELD_COUNT: usize = 3;

/// Widest padding a placeholder may request.
pub const MAX_WIDTH: usize = 32;

/// Validated message template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    text: &'static str,
    placeholders: u8,
}

impl Template {
    /// Template with no text, used to fill unused channel slots.
    pub const EMPTY: Template = Template {
        text: "",
        placeholders: 0,
    };

    /// Define a template, failing const evaluation on invalid text.
    ///
    /// Use it in a `static` or `const` initializer so mistakes are build
    /// errors:
    ///
    /// ```
    /// use rtos_debug_log::Template;
    ///
    /// static BUTTON: Template = Template::new("button %u pressed, state %u\n");
    /// assert_eq!(BUTTON.placeholders(), 2);
    /// ```
    pub const fn new(text: &'static str) -> Self {
        match Self::parse(text) {
            Ok(template) => template,
            Err(e) => panic!("{}", e.message()),
        }
    }

    /// Validate `text` and count its placeholders.
    pub const fn parse(text: &'static str) -> Result<Self, TemplateError> {
        let bytes = text.as_bytes();
        let mut count = 0usize;
        let mut i = 0;

        while i < bytes.len() {
            let b = bytes[i];
            if !b.is_ascii() {
                return Err(TemplateError::NonAscii);
            }
            if b == b'\n' && !only_newlines(bytes, i) {
                return Err(TemplateError::EmbeddedNewline);
            }
            if b != b'%' {
                i += 1;
                continue;
            }
            match scan_placeholder(bytes, i + 1) {
                Ok((placeholder, next)) => {
                    if placeholder.is_some() {
                        count += 1;
                        if count > FIELD_COUNT {
                            return Err(TemplateError::TooManyPlaceholders);
                        }
                    }
                    i = next;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Self {
            text,
            placeholders: count as u8,
        })
    }

    /// Raw template text.
    #[inline]
    pub const fn text(&self) -> &'static str {
        self.text
    }

    /// Number of placeholders that consume a field.
    #[inline]
    pub const fn placeholders(&self) -> usize {
        self.placeholders as usize
    }

    /// Interpolate `fields` into the template, writing to `out`.
    ///
    /// Pure function of the template and the field values. Placeholders
    /// consume fields left to right.
    pub fn render<W: Write>(&self, fields: &[u32; FIELD_COUNT], out: &mut W) -> fmt::Result {
        let bytes = self.text.as_bytes();
        let mut literal_start = 0;
        let mut next_field = 0;
        let mut i = 0;

        while i < bytes.len() {
            if bytes[i] != b'%' {
                i += 1;
                continue;
            }
            out.write_str(&self.text[literal_start..i])?;

            match scan_placeholder(bytes, i + 1) {
                Ok((Some(placeholder), next)) => {
                    let value = fields.get(next_field).copied().unwrap_or(0);
                    next_field += 1;
                    placeholder.write(value, out)?;
                    i = next;
                }
                Ok((None, next)) => {
                    out.write_char('%')?;
                    i = next;
                }
                Err(_) => {
                    // Only reachable for text that bypassed `parse`; keep it verbatim.
                    literal_start = i;
                    i += 1;
                    continue;
                }
            }
            literal_start = i;
        }

        out.write_str(&self.text[literal_start..])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Unsigned,
    Signed,
    HexLower,
    HexUpper,
    Octal,
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Placeholder {
    conversion: Conversion,
    width: u8,
    zero_pad: bool,
    left: bool,
}

/// True if `bytes[from..]` is a run of newlines.
const fn only_newlines(bytes: &[u8], mut from: usize) -> bool {
    while from < bytes.len() {
        if bytes[from] != b'\n' {
            return false;
        }
        from += 1;
    }
    true
}

/// Scan one placeholder; `i` points just past the `%`.
///
/// Returns `None` for `%%` and the index after the placeholder.
const fn scan_placeholder(
    bytes: &[u8],
    mut i: usize,
) -> Result<(Option<Placeholder>, usize), TemplateError> {
    if i < bytes.len() && bytes[i] == b'%' {
        return Ok((None, i + 1));
    }

    let mut zero_pad = false;
    let mut left = false;
    while i < bytes.len() && (bytes[i] == b'0' || bytes[i] == b'-') {
        if bytes[i] == b'0' {
            zero_pad = true;
        } else {
            left = true;
        }
        i += 1;
    }

    let mut width = 0usize;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        width = width * 10 + (bytes[i] - b'0') as usize;
        if width > MAX_WIDTH {
            return Err(TemplateError::WidthTooLarge);
        }
        i += 1;
    }

    while i < bytes.len() && (bytes[i] == b'l' || bytes[i] == b'h') {
        i += 1;
    }

    if i >= bytes.len() {
        return Err(TemplateError::Unterminated);
    }

    let conversion = match bytes[i] {
        b'u' => Conversion::Unsigned,
        b'd' | b'i' => Conversion::Signed,
        b'x' => Conversion::HexLower,
        b'X' => Conversion::HexUpper,
        b'o' => Conversion::Octal,
        b'c' => Conversion::Char,
        _ => return Err(TemplateError::UnknownConversion),
    };

    Ok((
        Some(Placeholder {
            conversion,
            width: width as u8,
            zero_pad: zero_pad && !left,
            left,
        }),
        i + 1,
    ))
}

impl Placeholder {
    fn write<W: Write>(&self, value: u32, out: &mut W) -> fmt::Result {
        // u32 in octal is 11 digits, the longest body
        let mut scratch = [0u8; 12];
        let mut digits = LineWriter::new(&mut scratch);
        let mut negative = false;

        match self.conversion {
            Conversion::Unsigned => write!(digits, "{}", value)?,
            Conversion::Signed => {
                let signed = value as i32;
                negative = signed < 0;
                write!(digits, "{}", signed.unsigned_abs())?
            }
            Conversion::HexLower => write!(digits, "{:x}", value)?,
            Conversion::HexUpper => write!(digits, "{:X}", value)?,
            Conversion::Octal => write!(digits, "{:o}", value)?,
            Conversion::Char => {
                let c = char::from_u32(value)
                    .filter(char::is_ascii)
                    .unwrap_or('?');
                digits.write_char(c)?
            }
        }

        let sign = if negative { "-" } else { "" };
        let body = digits.as_str();
        let pad = (self.width as usize).saturating_sub(sign.len() + body.len());
        let numeric = self.conversion != Conversion::Char;

        if self.left {
            out.write_str(sign)?;
            out.write_str(body)?;
            fill(out, ' ', pad)
        } else if self.zero_pad && numeric {
            out.write_str(sign)?;
            fill(out, '0', pad)?;
            out.write_str(body)
        } else {
            fill(out, ' ', pad)?;
            out.write_str(sign)?;
            out.write_str(body)
        }
    }
}

fn fill<W: Write>(out: &mut W, c: char, count: usize) -> fmt::Result {
    for _ in 0..count {
        out.write_char(c)?;
    }
    Ok(())
}
