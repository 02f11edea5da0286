//! ZEV program image files (`.zimg`).
//!
//! A simple text format holding memory words at explicit addresses:
//! - One word per line: `0xN: tok tok ...`
//! - Lines starting with `;` are comments
//! - Blank lines are ignored

use std::collections::HashSet;
use std::path::Path;
use std::io::{BufRead, BufReader, Write};
use thiserror::Error;
use crate::cpu::memory::{Address, Word};
use crate::asm::Program;

/// Parse an image from text.
pub fn parse_image(text: &str) -> Result<Program, ImageError> {
    parse_lines(text.lines().map(|l| Ok(l.to_string())))
}

/// Load an image file from disk.
pub fn load_image<P: AsRef<Path>>(path: P) -> Result<Program, ImageError> {
    let file = std::fs::File::open(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    let reader = BufReader::new(file);
    parse_lines(reader.lines().map(|l| l.map_err(|e| ImageError::IoError(e.to_string()))))
}

fn parse_lines<I>(lines: I) -> Result<Program, ImageError>
where
    I: Iterator<Item = Result<String, ImageError>>,
{
    let mut program = Program::new();
    let mut seen = HashSet::new();

    for (line_num, line_result) in lines.enumerate() {
        let line = line_result?;
        let trimmed = line.trim();

        // Skip empty lines and comments
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let parse_error = |message: String| ImageError::ParseError { line: line_num + 1, message };

        let (addr, body) = trimmed
            .split_once(':')
            .ok_or_else(|| parse_error("expected `0xN: word`".to_string()))?;
        let addr: Address = addr.trim().parse().map_err(|e| parse_error(format!("{}", e)))?;

        // Drop a trailing comment
        let body = body.split(';').next().unwrap_or_default();
        let word = Word::parse(body).map_err(|e| parse_error(format!("{}", e)))?;
        if word.is_empty() {
            return Err(parse_error(format!("no word at {}", addr)));
        }
        if !seen.insert(addr) {
            return Err(parse_error(format!("{} listed twice", addr)));
        }

        program.push(addr, word);
    }

    Ok(program)
}

/// Render a program in image format.
pub fn render_image(program: &Program) -> String {
    let mut out = String::new();
    out.push_str("; ZEV program image\n");
    out.push_str(&format!("; {} words\n\n", program.len()));
    for (addr, word) in program.iter() {
        out.push_str(&format!("{}: {}\n", addr, word));
    }
    out
}

/// Save a program to an image file on disk.
pub fn save_image<P: AsRef<Path>>(path: P, program: &Program) -> Result<(), ImageError> {
    let mut file = std::fs::File::create(path.as_ref())
        .map_err(|e| ImageError::IoError(e.to_string()))?;
    file.write_all(render_image(program).as_bytes())
        .map_err(|e| ImageError::IoError(e.to_string()))
}

/// Errors that can occur while reading or writing images.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageError {
    #[error("I/O error: {0}")]
    IoError(String),

    #[error("parse error on line {line}: {message}")]
    ParseError { line: usize, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asm::assemble;

    #[test]
    fn test_image_text_roundtrip() {
        let program = assemble("MOV reg0 $7\nOUT reg0\nORG 0x9\nDAT $3").unwrap();
        let text = render_image(&program);
        assert!(text.contains("0x9: 0011"));
        assert_eq!(parse_image(&text).unwrap(), program);
    }

    #[test]
    fn test_image_comments() {
        let text = "; header\n\n0x2: 0101 0000 ; OUT reg0\n";
        let program = parse_image(text).unwrap();
        assert_eq!(program.words()[0], (Address(2), Word::parse("0101 0000").unwrap()));
    }

    #[test]
    fn test_image_errors() {
        assert!(matches!(parse_image("0101 0000"), Err(ImageError::ParseError { line: 1, .. })));
        assert!(matches!(parse_image("0xA: 0101"), Err(ImageError::ParseError { .. })));
        assert!(matches!(parse_image("0x1: 01x1"), Err(ImageError::ParseError { .. })));
        assert!(matches!(parse_image("0x1:"), Err(ImageError::ParseError { .. })));
        assert!(matches!(parse_image("0x1: 1\n0x1: 0"), Err(ImageError::ParseError { line: 2, .. })));
    }

    #[test]
    fn test_image_duplicate_far_apart() {
        let mut text: String = (1..=500).map(|n| format!("0x{}: 1\n", n)).collect();
        text.push_str("0x250: 0\n");
        assert!(matches!(parse_image(&text), Err(ImageError::ParseError { line: 501, .. })));
    }

    #[test]
    fn test_image_file_roundtrip() {
        let program = assemble("OUT reg1\nEXIT $2").unwrap();
        let path = std::env::temp_dir().join(format!("zev-image-{}.zimg", std::process::id()));
        save_image(&path, &program).unwrap();
        let loaded = load_image(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, program);
    }
}
