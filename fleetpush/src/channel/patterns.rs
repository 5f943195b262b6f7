//! Prompt pattern helpers.

use memchr::memrchr;
use regex::bytes::Regex;

/// Compile a prompt pattern, anchoring it to the end of output.
///
/// Prompts are only meaningful as the last thing a device printed, so a
/// pattern without a trailing `$` anchor gets `\s*$` appended.
pub fn compile_prompt_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    if pattern.ends_with('$') && !pattern.ends_with("\\$") {
        Regex::new(pattern)
    } else {
        Regex::new(&format!("{pattern}\\s*$"))
    }
}

/// Combine several prompt patterns into one alternation.
pub fn combine_patterns<'a>(
    patterns: impl IntoIterator<Item = &'a Regex>,
) -> Result<Regex, regex::Error> {
    let joined = patterns
        .into_iter()
        .map(|p| format!("(?:{})", p.as_str()))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&joined)
}

/// The last non-empty line of `data`, trimmed. This is where the prompt
/// sits once a prompt pattern has matched.
pub fn prompt_line(data: &[u8]) -> String {
    let trimmed = trim_end_ascii(data);
    let start = memrchr(b'\n', trimmed).map_or(0, |pos| pos + 1);
    String::from_utf8_lossy(&trimmed[start..]).trim().to_string()
}

fn trim_end_ascii(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(0, |pos| pos + 1);
    &data[..end]
}
