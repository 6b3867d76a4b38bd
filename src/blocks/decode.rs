//! Decoding of raw peer output lines.

/// Result of decoding a single line of peer output.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodedLine {
    /// A parsed JSON value.
    Message(serde_json::Value),
    /// Nothing left after removing the line terminator.
    Empty,
    /// Non-protocol output such as diagnostics.
    Unparseable,
}

impl DecodedLine {
    /// Return the parsed value, discarding empty and unparseable lines.
    #[must_use]
    pub fn into_message(self) -> Option<serde_json::Value> {
        match self {
            Self::Message(value) => Some(value),
            Self::Empty | Self::Unparseable => None,
        }
    }
}

/// Decode one line of peer output.
///
/// A single trailing `\n` or `\r\n` is removed before parsing. Never fails:
/// anything that is not UTF-8 JSON comes back as [`DecodedLine::Unparseable`].
#[must_use]
pub fn decode_line(line: &[u8]) -> DecodedLine {
    let line = line
        .strip_suffix(b"\n")
        .map_or(line, |l| l.strip_suffix(b"\r").unwrap_or(l));

    if line.is_empty() {
        return DecodedLine::Empty;
    }

    match serde_json::from_slice(line) {
        Ok(value) => DecodedLine::Message(value),
        Err(_) => DecodedLine::Unparseable,
    }
}
