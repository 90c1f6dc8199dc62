//! RPC byte symbols for the query grammar
//!
//! ```text
//! Query     := Expr QUERY_END
//! Expr      := AndExpr | OrExpr | SynOrExpr | NotExpr | WordExpr | PhraseExpr
//! AndExpr   := '&' Expr Expr
//! OrExpr    := '|' Expr Expr
//! SynOrExpr := '/' Expr Expr uint32_be ';' uint32_be ';'
//! NotExpr   := '-' Expr Expr
//! WordExpr  := '{' stem '>'
//! PhraseExpr:= '<' stem (' ' stem)* '>'
//! ```
//!
//! `'\'` escapes exactly the next byte inside stems. Multibyte integers on
//! the wire are big-endian.

pub const AND: u8 = b'&';
pub const OR: u8 = b'|';
pub const OR_SYN: u8 = b'/';
pub const NOT: u8 = b'-';
pub const WORD_START: u8 = b'{';
pub const PHRASE_START: u8 = b'<';
pub const PHRASE_END: u8 = b'>';
pub const ESCAPE: u8 = b'\\';
pub const STEP_DELIM: u8 = b';';
pub const QUERY_END: u8 = b'#';

/// Default sampling steps for the synonym operator: two documents from the
/// original term for every synonym document
pub const STEP_TERM_ORIGINAL: u32 = 2;
pub const STEP_TERM_SYNONYM: u32 = 1;
