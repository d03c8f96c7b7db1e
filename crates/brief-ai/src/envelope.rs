//! Backend-specific response envelopes.
//!
//! Both parsers are pure functions over the captured standard output so they
//! can be tested without spawning anything.

use serde_json::Value;

use crate::error::EnvelopeError;

/// Line that opens the answer block in a transcript.
pub const TRANSCRIPT_START: &str = "codex";
/// Line that closes the answer block in a transcript.
pub const TRANSCRIPT_END: &str = "tokens used";

/// Unpack a JSON envelope: skip any preamble up to the first `{`, parse one
/// JSON value from there and return its `response` string.
///
/// The executable prints status lines (e.g. "Loaded cached credentials.")
/// before the object, and may print more after it.
pub fn parse_json_envelope(stdout: &str) -> Result<String, EnvelopeError> {
  let start = stdout.find('{').ok_or(EnvelopeError::NoJsonObject)?;

  let value: Value = serde_json::Deserializer::from_str(&stdout[start..])
    .into_iter::<Value>()
    .next()
    .ok_or(EnvelopeError::NoJsonObject)??;

  let answer = value
    .get("response")
    .and_then(Value::as_str)
    .ok_or(EnvelopeError::MissingResponse)?
    .trim();

  if answer.is_empty() {
    return Err(EnvelopeError::Empty);
  }
  Ok(answer.to_owned())
}

/// Unpack a line-oriented transcript: the answer is every line strictly
/// between a line equal to [`TRANSCRIPT_START`] and the next line equal to
/// [`TRANSCRIPT_END`].
///
/// When that pair is absent the whole trimmed output is returned instead. A
/// pair enclosing only blank lines is an empty answer.
pub fn parse_transcript(stdout: &str) -> Result<String, EnvelopeError> {
  let lines: Vec<&str> = stdout.lines().collect();

  let enclosed = lines
    .iter()
    .position(|l| l.trim() == TRANSCRIPT_START)
    .and_then(|open| {
      lines[open + 1..]
        .iter()
        .position(|l| l.trim() == TRANSCRIPT_END)
        .map(|len| lines[open + 1..open + 1 + len].join("\n"))
    });

  let answer = match &enclosed {
    Some(block) => block.trim(),
    None => stdout.trim(),
  };
  if answer.is_empty() {
    return Err(EnvelopeError::Empty);
  }
  Ok(answer.to_owned())
}
