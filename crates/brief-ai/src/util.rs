/// Truncate a string to at most `max_chars` characters.
pub fn truncate_to_char_boundary(s: &str, max_chars: usize) -> &str {
  match s.char_indices().nth(max_chars) {
    Some((end, _)) => &s[..end],
    None => s,
  }
}

/// Strip markdown code fences from a model answer.
pub fn strip_code_blocks(response: &str) -> &str {
  response
    .trim()
    .trim_start_matches("```json")
    .trim_start_matches("```")
    .trim_end_matches("```")
    .trim()
}
