//! SMTP reply parser.

use crate::error::{Error, Result};
use crate::types::{Reply, ReplyCode};

/// Parses a complete reply from its lines (CRLF already stripped).
///
/// Replies are single-line (`250 OK`) or multi-line, where every line but
/// the last uses `-` after the code (`250-First`, `250 Last`). All lines
/// must carry the same code.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the reply is empty or malformed.
pub fn parse_reply(lines: &[String]) -> Result<Reply> {
    let first = lines
        .first()
        .ok_or_else(|| Error::Protocol("empty reply".into()))?;
    let code = parse_code(first)?;

    let mut text = Vec::with_capacity(lines.len());
    for line in lines {
        if parse_code(line)? != code {
            return Err(Error::Protocol(format!(
                "reply code changed mid-reply: {line}"
            )));
        }
        text.push(line.get(4..).unwrap_or_default().to_string());
    }

    Ok(Reply::new(ReplyCode::new(code), text))
}

fn parse_code(line: &str) -> Result<u16> {
    let digits = line
        .get(..3)
        .filter(|d| d.bytes().all(|b| b.is_ascii_digit()))
        .ok_or_else(|| Error::Protocol(format!("invalid reply line: {line}")))?;

    match line.as_bytes().get(3) {
        None | Some(b' ' | b'-') => {}
        Some(_) => return Err(Error::Protocol(format!("invalid reply line: {line}"))),
    }

    digits
        .parse()
        .map_err(|_| Error::Protocol(format!("invalid reply code: {digits}")))
}

/// Returns true if `line` ends a reply (`-` marks a continuation).
#[must_use]
pub fn is_last_line(line: &str) -> bool {
    line.as_bytes().get(3) != Some(&b'-')
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_single_line() {
        let reply = parse_reply(&lines(&["220 smtp.example.com ESMTP ready"])).unwrap();
        assert_eq!(reply.code, ReplyCode::SERVICE_READY);
        assert_eq!(reply.lines, vec!["smtp.example.com ESMTP ready"]);
    }

    #[test]
    fn test_multi_line() {
        let reply = parse_reply(&lines(&[
            "250-smtp.example.com",
            "250-STARTTLS",
            "250 AUTH PLAIN LOGIN",
        ]))
        .unwrap();
        assert_eq!(reply.code, ReplyCode::OK);
        assert_eq!(reply.lines, vec!["smtp.example.com", "STARTTLS", "AUTH PLAIN LOGIN"]);
    }

    #[test]
    fn test_bare_code() {
        let reply = parse_reply(&lines(&["250"])).unwrap();
        assert_eq!(reply.lines, vec![""]);
    }

    #[test]
    fn test_malformed() {
        assert!(parse_reply(&[]).is_err());
        assert!(parse_reply(&lines(&["25"])).is_err());
        assert!(parse_reply(&lines(&["ABC OK"])).is_err());
        assert!(parse_reply(&lines(&["250xOK"])).is_err());
        assert!(parse_reply(&lines(&["250-a", "251 b"])).is_err());
    }

    #[test]
    fn test_is_last_line() {
        assert!(is_last_line("250 OK"));
        assert!(is_last_line("250"));
        assert!(!is_last_line("250-more"));
    }
}
