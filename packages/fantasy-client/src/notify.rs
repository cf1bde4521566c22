//! User-visible, transient notifications ("toasts").

use std::sync::Mutex;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
	Success,
	Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
	pub level: NoticeLevel,
	pub message: String,
}
impl Notice {
	pub fn success(message: impl Into<String>) -> Self {
		Self { level: NoticeLevel::Success, message: message.into() }
	}

	pub fn error(message: impl Into<String>) -> Self {
		Self { level: NoticeLevel::Error, message: message.into() }
	}
}

pub trait Notifier
where
	Self: Send + Sync,
{
	fn notify(&self, notice: Notice);
}

/// Routes notices into the tracing subscriber.
#[derive(Debug, Default)]
pub struct LogNotifier;
impl Notifier for LogNotifier {
	fn notify(&self, notice: Notice) {
		match notice.level {
			NoticeLevel::Success => tracing::info!(notice = %notice.message, "Success."),
			NoticeLevel::Error => tracing::error!(notice = %notice.message, "Failure."),
		}
	}
}

/// Keeps every notice; handy for tests and for callers that render notices themselves.
#[derive(Debug, Default)]
pub struct MemoryNotifier {
	notices: Mutex<Vec<Notice>>,
}
impl MemoryNotifier {
	pub fn notices(&self) -> Vec<Notice> {
		self.notices.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn errors(&self) -> Vec<String> {
		self.notices()
			.into_iter()
			.filter(|notice| notice.level == NoticeLevel::Error)
			.map(|notice| notice.message)
			.collect()
	}
}
impl Notifier for MemoryNotifier {
	fn notify(&self, notice: Notice) {
		self.notices.lock().unwrap_or_else(|err| err.into_inner()).push(notice);
	}
}
