use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

/// A single decoded path command. Both the binary stream and the textual
/// `M/L/Q/C/Z` form decode to this same structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathCommand {
    MoveTo(f64, f64),
    LineTo(f64, f64),
    QuadTo(f64, f64, f64, f64),
    CubicTo(f64, f64, f64, f64, f64, f64),
    Arc(f64, f64, f64, f64),
    Close,
}

/// Decodes a `(cmd: u8, args: f32...)` stream. Stops, without error, at the
/// first unrecognized command code.
pub fn decode_byte_stream(bytes: &[u8]) -> Vec<PathCommand> {
    let mut cursor = Cursor::new(bytes);
    let mut out = Vec::new();

    loop {
        let code = match cursor.read_u8() {
            Ok(c) => c,
            Err(_) => break,
        };
        let read_f32 = |cursor: &mut Cursor<&[u8]>| -> Option<f64> {
            cursor.read_f32::<LittleEndian>().ok().map(|v| v as f64)
        };

        let command = match code {
            0 => Some(PathCommand::Close),
            1 => (|| Some(PathCommand::MoveTo(read_f32(&mut cursor)?, read_f32(&mut cursor)?)))(),
            2 => (|| Some(PathCommand::LineTo(read_f32(&mut cursor)?, read_f32(&mut cursor)?)))(),
            3 => (|| {
                Some(PathCommand::QuadTo(
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                ))
            })(),
            4 => (|| {
                Some(PathCommand::CubicTo(
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                ))
            })(),
            5 => (|| {
                Some(PathCommand::Arc(
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                    read_f32(&mut cursor)?,
                ))
            })(),
            _ => None,
        };

        match command {
            Some(c) => out.push(c),
            None => break,
        }
    }

    out
}

/// Decodes the alternate textual form: interleaved single-letter commands
/// and numeric operands, e.g. `"M 0 0 L 10 0 Z"`.
pub fn decode_text_form(text: &str) -> Vec<PathCommand> {
    let mut tokens = text.split_whitespace().peekable();
    let mut out = Vec::new();

    let mut next_f64 = |tokens: &mut std::iter::Peekable<std::str::SplitWhitespace>| {
        tokens.next().and_then(|t| t.parse::<f64>().ok())
    };

    while let Some(token) = tokens.next() {
        let command = match token {
            "M" => (|| Some(PathCommand::MoveTo(next_f64(&mut tokens)?, next_f64(&mut tokens)?)))(),
            "L" => (|| Some(PathCommand::LineTo(next_f64(&mut tokens)?, next_f64(&mut tokens)?)))(),
            "Q" => (|| {
                Some(PathCommand::QuadTo(
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                ))
            })(),
            "C" => (|| {
                Some(PathCommand::CubicTo(
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                    next_f64(&mut tokens)?,
                ))
            })(),
            "Z" => Some(PathCommand::Close),
            _ => None,
        };
        match command {
            Some(c) => out.push(c),
            None => break,
        }
    }

    out
}
