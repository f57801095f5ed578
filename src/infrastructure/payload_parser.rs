// Tolerant JSON payload parser
//
// Producers on the bus are not all strict JSON writers. When strict decoding
// fails the text goes through a fixed recovery pipeline before one more
// strict attempt:
//
//   1. quote normalization  'x'  ‘x’  “x”        ->  "x"
//   2. key quoting          {name: ...}           ->  {"name": ...}
//   3. bareword quoting     :Motor Temp,          ->  :"Motor Temp",
//                           TRUE / +1.5 / Null    ->  true / 1.5 / null
//
// Token grammar used by passes 2 and 3, on the output of pass 1:
//
//   token      := structural | string | ws | bare
//   structural := '{' | '}' | '[' | ']' | ':' | ','
//   string     := '"' ( '\' any | [^"\\] )* '"'
//   ws         := whitespace+
//   bare       := ( any char not structural, not '"' )+   (trimmed of ws)
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("empty payload")]
    Empty,
    #[error("unparseable payload after recovery: {0}")]
    Malformed(String),
}

/// Parses a raw payload, returning `None` for anything unrecoverable.
pub fn parse(bytes: &[u8]) -> Option<Value> {
    match try_parse(bytes) {
        Ok(value) => Some(value),
        Err(PayloadError::Empty) => None,
        Err(e) => {
            tracing::warn!(
                raw = %String::from_utf8_lossy(bytes),
                "dropping payload: {}",
                e
            );
            None
        }
    }
}

pub fn try_parse(bytes: &[u8]) -> Result<Value, PayloadError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    if text.is_empty() {
        return Err(PayloadError::Empty);
    }

    if let Ok(value) = serde_json::from_str(text) {
        return Ok(value);
    }

    let repaired = repair(text);
    tracing::debug!(%repaired, "strict decode failed, retrying repaired payload");
    serde_json::from_str(&repaired).map_err(|e| PayloadError::Malformed(e.to_string()))
}

/// Runs the three recovery passes in order.
pub fn repair(text: &str) -> String {
    let quoted = normalize_quotes(text);
    let tokens = tokenize(&quoted);
    let tokens = quote_keys(tokens);
    let tokens = quote_barewords(tokens);
    render(&tokens)
}

fn closing_quote(open: char) -> Option<char> {
    match open {
        '\'' => Some('\''),
        '\u{2018}' => Some('\u{2019}'),
        '\u{201C}' => Some('\u{201D}'),
        '`' => Some('`'),
        _ => None,
    }
}

/// Rewrites strings delimited by alternate quote characters as `"`-strings.
/// Text already inside a `"`-string is left alone, so apostrophes survive.
/// A quote character only opens a string at the start of a token; inside a
/// bareword such as `Driver's` it is kept as text.
pub fn normalize_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c == '"' {
            out.push(c);
            copy_string_body(&mut chars, &mut out);
            continue;
        }

        let at_token_start = out
            .chars()
            .next_back()
            .is_none_or(|prev| is_structural(prev) || prev.is_whitespace());
        let Some(close) = closing_quote(c).filter(|_| at_token_start) else {
            out.push(c);
            continue;
        };

        out.push('"');
        for inner in chars.by_ref() {
            if inner == close {
                break;
            }
            match inner {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                other => out.push(other),
            }
        }
        out.push('"');
    }

    out
}

/// Copies a `"`-string body up to and including its closing quote.
fn copy_string_body(chars: &mut impl Iterator<Item = char>, out: &mut String) {
    let mut escaped = false;
    for c in chars.by_ref() {
        out.push(c);
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == '"' {
            return;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Structural(char),
    Str(String),
    Whitespace(String),
    Bare(String),
}

fn is_structural(c: char) -> bool {
    matches!(c, '{' | '}' | '[' | ']' | ':' | ',')
}

pub fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&c) = chars.peek() {
        if is_structural(c) {
            chars.next();
            tokens.push(Token::Structural(c));
        } else if c == '"' {
            chars.next();
            let mut s = String::from('"');
            copy_string_body(&mut chars, &mut s);
            tokens.push(Token::Str(s));
        } else if c.is_whitespace() {
            let mut ws = String::new();
            while let Some(&w) = chars.peek() {
                if !w.is_whitespace() {
                    break;
                }
                ws.push(w);
                chars.next();
            }
            tokens.push(Token::Whitespace(ws));
        } else {
            let mut run = String::new();
            while let Some(&b) = chars.peek() {
                if is_structural(b) || b == '"' {
                    break;
                }
                run.push(b);
                chars.next();
            }
            // trailing whitespace belongs outside the bareword
            let trimmed_len = run.trim_end().len();
            let trailing = run.split_off(trimmed_len);
            tokens.push(Token::Bare(run));
            if !trailing.is_empty() {
                tokens.push(Token::Whitespace(trailing));
            }
        }
    }

    tokens
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$' || c == '-')
}

fn json_string(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Quotes identifier-like barewords that are immediately followed by `:`.
pub fn quote_keys(mut tokens: Vec<Token>) -> Vec<Token> {
    for i in 0..tokens.len() {
        let key = match &tokens[i] {
            Token::Bare(word) if is_identifier(word) => json_string(word),
            _ => continue,
        };
        let next = tokens[i + 1..]
            .iter()
            .find(|t| !matches!(t, Token::Whitespace(_)));
        if next == Some(&Token::Structural(':')) {
            tokens[i] = Token::Str(key);
        }
    }
    tokens
}

/// Quotes every remaining bareword except `true`, `false`, `null` and
/// numbers, which are rewritten in their strict spelling.
pub fn quote_barewords(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|t| match t {
            Token::Bare(word) => match literal(&word) {
                Some(lit) => Token::Bare(lit),
                None => Token::Str(json_string(&word)),
            },
            other => other,
        })
        .collect()
}

fn literal(word: &str) -> Option<String> {
    let lower = word.to_ascii_lowercase();
    if matches!(lower.as_str(), "true" | "false" | "null") {
        return Some(lower);
    }
    numeric_literal(word)
}

/// `[+-]? digits ( '.' digits )? ( [eE] [+-]? digits )?`, rewritten without a
/// leading `+` or redundant leading zeros.
fn numeric_literal(word: &str) -> Option<String> {
    let (sign, rest) = match word.as_bytes().first()? {
        b'+' => ("", &word[1..]),
        b'-' => ("-", &word[1..]),
        _ => ("", word),
    };

    let (mantissa, exponent) = match rest.find(['e', 'E']) {
        Some(idx) => (&rest[..idx], Some(&rest[idx + 1..])),
        None => (rest, None),
    };
    let (int_part, frac_part) = match mantissa.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (mantissa, None),
    };

    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(int_part) || frac_part.is_some_and(|f| !all_digits(f)) {
        return None;
    }
    let exponent = match exponent {
        Some(e) => {
            let digits = e.strip_prefix(['+', '-']).unwrap_or(e);
            if !all_digits(digits) {
                return None;
            }
            Some(e)
        }
        None => None,
    };

    let int_part = int_part.trim_start_matches('0');
    let mut out = format!("{}{}", sign, if int_part.is_empty() { "0" } else { int_part });
    if let Some(f) = frac_part {
        out.push('.');
        out.push_str(f);
    }
    if let Some(e) = exponent {
        out.push('e');
        out.push_str(e);
    }
    Some(out)
}

fn render(tokens: &[Token]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            Token::Structural(c) => out.push(*c),
            Token::Str(s) | Token::Whitespace(s) | Token::Bare(s) => out.push_str(s),
        }
    }
    out
}
