use std::{fmt, str::FromStr};

use serde::Serialize;

pub const UNKNOWN_MOOD_EMOJI: &str = "😐";
pub const UNKNOWN_MOOD_COLOR: &str = "bg-gray-500";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
	Excited,
	Pensive,
	Sad,
	Hopeful,
	Confused,
}
impl Mood {
	pub const ALL: [Self; 5] = [Self::Excited, Self::Pensive, Self::Sad, Self::Hopeful, Self::Confused];

	/// Label stored by the server.
	pub fn label(self) -> &'static str {
		match self {
			Self::Excited => "兴奋",
			Self::Pensive => "沉思",
			Self::Sad => "悲伤",
			Self::Hopeful => "充满希望",
			Self::Confused => "困惑",
		}
	}

	pub fn emoji(self) -> &'static str {
		match self {
			Self::Excited => "😃",
			Self::Pensive => "🤔",
			Self::Sad => "😢",
			Self::Hopeful => "🚀",
			Self::Confused => "❓",
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			Self::Excited => "bg-yellow-500",
			Self::Pensive => "bg-blue-500",
			Self::Sad => "bg-gray-500",
			Self::Hopeful => "bg-green-500",
			Self::Confused => "bg-purple-500",
		}
	}

	fn alias(self) -> &'static str {
		match self {
			Self::Excited => "excited",
			Self::Pensive => "pensive",
			Self::Sad => "sad",
			Self::Hopeful => "hopeful",
			Self::Confused => "confused",
		}
	}

	pub fn from_label(label: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|mood| mood.label() == label)
	}
}
impl fmt::Display for Mood {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}
impl FromStr for Mood {
	type Err = UnknownMood;

	fn from_str(raw: &str) -> Result<Self, Self::Err> {
		let raw = raw.trim();

		Self::ALL
			.into_iter()
			.find(|mood| mood.label() == raw || mood.alias().eq_ignore_ascii_case(raw))
			.ok_or_else(|| UnknownMood(raw.to_string()))
	}
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown mood {0:?}; expected one of {known}.", known = known_aliases())]
pub struct UnknownMood(pub String);

fn known_aliases() -> String {
	Mood::ALL.iter().map(|mood| mood.alias()).collect::<Vec<_>>().join(", ")
}

pub fn mood_emoji(label: &str) -> &'static str {
	Mood::from_label(label).map(Mood::emoji).unwrap_or(UNKNOWN_MOOD_EMOJI)
}

pub fn mood_color(label: &str) -> &'static str {
	Mood::from_label(label).map(Mood::color).unwrap_or(UNKNOWN_MOOD_COLOR)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_labels_and_english_aliases() {
		assert_eq!("兴奋".parse::<Mood>(), Ok(Mood::Excited));
		assert_eq!("Hopeful".parse::<Mood>(), Ok(Mood::Hopeful));
		assert_eq!(
			"grumpy".parse::<Mood>().expect_err("unknown mood").to_string(),
			"Unknown mood \"grumpy\"; expected one of excited, pensive, sad, hopeful, confused."
		);
	}

	#[test]
	fn unknown_labels_use_neutral_display() {
		assert_eq!(mood_emoji("困惑"), "❓");
		assert_eq!(mood_color("沉思"), "bg-blue-500");
		assert_eq!(mood_emoji("grumpy"), UNKNOWN_MOOD_EMOJI);
		assert_eq!(mood_color(""), UNKNOWN_MOOD_COLOR);
	}
}
