#![forbid(unsafe_code)]

use tracing::{info, warn};

use crate::model::{Notice, NoticeLevel};
use crate::AdminConsole;

impl AdminConsole {
    pub(crate) fn notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        let text = text.into();
        match level {
            NoticeLevel::Warn | NoticeLevel::Error => warn!(level = ?level, text = %text, "console: notice"),
            _ => info!(level = ?level, text = %text, "console: notice"),
        }
        self.notices.push(Notice { level, text });
    }

    /// Notices raised since the last call, oldest first.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}
