use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_SNIPPET_CHARS: usize = 150;

// Order matters: fenced blocks go before inline code, bold before italics.
static MARKDOWN_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
	[
		(r"```[\s\S]*?```", ""),
		(r"(?m)^#{1,6}\s+", ""),
		(r"\*\*(.*?)\*\*", "$1"),
		(r"\*(.*?)\*", "$1"),
		(r"\[([^\]]+)\]\([^)]+\)", "$1"),
		(r"`([^`]+)`", "$1"),
		(r"\n+", " "),
	]
	.into_iter()
	.filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
	.collect()
});

/// Plain-text preview of markdown content, cut to `max_chars` characters with a trailing `...`.
pub fn generate_snippet(content: &str, max_chars: usize) -> String {
	if content.trim().is_empty() {
		return String::new();
	}

	let mut plain = content.to_string();

	for (re, replacement) in MARKDOWN_RULES.iter() {
		plain = re.replace_all(&plain, *replacement).into_owned();
	}

	let plain = plain.trim();

	if plain.chars().count() <= max_chars {
		return plain.to_string();
	}

	let cut: String = plain.chars().take(max_chars).collect();

	format!("{}...", cut.trim_end())
}
