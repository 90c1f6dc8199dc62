//! Query deserializer
//!
//! Parses the prefix RPC byte grammar into an [`Expr`] tree. The parser
//! reads exactly the bytes of one query from any `Read` stream; a grammar
//! violation or early EOF produces a structured error and unwinds any
//! partially built tree.

use std::io::{self, Read};

use byteorder::{BigEndian, ReadBytesExt};

use super::expr::Expr;
use super::protocol;
use crate::error::{Result, ShardError};

/// Read one complete query, including the terminating QUERY_END marker
pub fn read_query<R: Read>(reader: &mut R) -> Result<Expr> {
    let expr = read_expr(reader)?.ok_or_else(|| {
        ShardError::MalformedQuery("query has no root expression".to_string())
    })?;
    let end = read_byte(reader)?;
    if end != protocol::QUERY_END {
        return Err(ShardError::MalformedQuery(format!(
            "expected QUERY_END marker, got {:?}",
            end as char
        )));
    }
    Ok(expr)
}

/// Read one expression; `Ok(None)` signals an explicitly empty operand
/// (a bare PHRASE_END byte in operand position)
fn read_expr<R: Read>(reader: &mut R) -> Result<Option<Expr>> {
    let op = read_byte(reader)?;
    match op {
        protocol::AND => {
            let left = require_operand(read_expr(reader)?, "AND")?;
            let right = require_operand(read_expr(reader)?, "AND")?;
            Ok(Some(Expr::And(Box::new(left), Box::new(right))))
        }
        protocol::OR => {
            let left = require_operand(read_expr(reader)?, "OR")?;
            let right = require_operand(read_expr(reader)?, "OR")?;
            Ok(Some(Expr::Or(Box::new(left), Box::new(right))))
        }
        protocol::OR_SYN => {
            let left = read_expr(reader)?;
            let right = read_expr(reader)?;
            let advance_right = read_step(reader)?;
            let advance_left = read_step(reader)?;
            match (left, right) {
                (None, None) => Err(ShardError::MalformedQuery(
                    "SynOr with both operands missing".to_string(),
                )),
                (Some(left), None) => Ok(Some(left)),
                (None, Some(right)) => Ok(Some(right)),
                (Some(left), Some(right)) => Ok(Some(Expr::SynOr {
                    original: Box::new(left),
                    synonyms: Box::new(right),
                    advance_right,
                    advance_left,
                })),
            }
        }
        protocol::NOT => {
            let included = require_operand(read_expr(reader)?, "NOT")?;
            let excluded = require_operand(read_expr(reader)?, "NOT")?;
            Ok(Some(Expr::Not {
                included: Box::new(included),
                excluded: Box::new(excluded),
            }))
        }
        protocol::WORD_START => Ok(Some(Expr::Word(read_word(reader)?))),
        protocol::PHRASE_START => Ok(Some(Expr::Phrase(read_phrase(reader)?))),
        protocol::PHRASE_END => Ok(None),
        other => Err(ShardError::MalformedQuery(format!(
            "unknown operator byte {:?}",
            other as char
        ))),
    }
}

fn require_operand(expr: Option<Expr>, operator: &str) -> Result<Expr> {
    expr.ok_or_else(|| {
        ShardError::MalformedQuery(format!("{} is missing an operand", operator))
    })
}

/// Stem bytes until an unescaped PHRASE_END
fn read_word<R: Read>(reader: &mut R) -> Result<String> {
    let mut stem = Vec::new();
    loop {
        let byte = read_byte(reader)?;
        match byte {
            protocol::ESCAPE => stem.push(read_byte(reader)?),
            protocol::PHRASE_END => break,
            _ => stem.push(byte),
        }
    }
    String::from_utf8(stem)
        .map_err(|_| ShardError::MalformedQuery("stem is not valid UTF-8".to_string()))
}

/// Space-separated stems until an unescaped PHRASE_END
fn read_phrase<R: Read>(reader: &mut R) -> Result<Vec<String>> {
    let mut stems = Vec::new();
    let mut current = Vec::new();
    loop {
        let byte = read_byte(reader)?;
        match byte {
            protocol::ESCAPE => current.push(read_byte(reader)?),
            protocol::PHRASE_END => break,
            b' ' => {
                if !current.is_empty() {
                    stems.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(byte),
        }
    }
    if !current.is_empty() {
        stems.push(current);
    }
    stems
        .into_iter()
        .map(|stem| {
            String::from_utf8(stem)
                .map_err(|_| ShardError::MalformedQuery("stem is not valid UTF-8".to_string()))
        })
        .collect()
}

/// A big-endian u32 advance count followed by its STEP_DELIM
fn read_step<R: Read>(reader: &mut R) -> Result<u32> {
    let step = reader.read_u32::<BigEndian>().map_err(map_eof)?;
    let delim = read_byte(reader)?;
    if delim != protocol::STEP_DELIM {
        return Err(ShardError::MalformedQuery(format!(
            "expected step delimiter, got {:?}",
            delim as char
        )));
    }
    Ok(step)
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8> {
    reader.read_u8().map_err(map_eof)
}

fn map_eof(error: io::Error) -> ShardError {
    if error.kind() == io::ErrorKind::UnexpectedEof {
        ShardError::TruncatedStream
    } else {
        ShardError::Io(error)
    }
}
