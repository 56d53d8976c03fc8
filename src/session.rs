use serde::Serialize;

use crate::config::SessionEntry;
use crate::types::{MeetingInfo, SessionInfo, Timestamp};

/// Everything known about the tracked session before polling starts:
/// discovery results plus the static per-session configuration.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    pub session: SessionInfo,
    pub meeting: Option<MeetingInfo>,
    pub total_laps: Option<u32>,
    pub flag: Option<String>,
}

impl SessionContext {
    pub fn new(session: SessionInfo, meeting: Option<MeetingInfo>, entry: Option<&SessionEntry>) -> Self {
        Self {
            session,
            meeting,
            total_laps: entry.and_then(|e| e.total_laps),
            flag: entry.and_then(|e| e.flag.clone()),
        }
    }

    pub fn session_key(&self) -> u32 {
        self.session.session_key
    }

    /// `"<meeting>: <session>"`, either side possibly empty.
    pub fn title(&self) -> String {
        let meeting = self
            .meeting
            .as_ref()
            .and_then(|m| m.meeting_name.as_deref())
            .unwrap_or("");
        let session = self.session.session_name.as_deref().unwrap_or("");
        format!("{meeting}: {session}")
    }

    pub fn is_live_at(&self, now: Timestamp) -> bool {
        self.session.is_live_at(now)
    }

    pub fn header(&self) -> SessionHeader {
        SessionHeader {
            session_key: self.session_key(),
            title: self.title(),
            country: self.meeting.as_ref().and_then(|m| m.country_name.clone()),
            flag: self.flag.clone(),
        }
    }
}

/// Static part of the board header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionHeader {
    pub session_key: u32,
    pub title: String,
    pub country: Option<String>,
    pub flag: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn title_joins_meeting_and_session() {
        let ctx = SessionContext::new(
            SessionInfo {
                session_key: 9472,
                session_name: Some("Race".into()),
                ..Default::default()
            },
            Some(MeetingInfo {
                meeting_key: Some(1229),
                meeting_name: Some("Bahrain Grand Prix".into()),
                country_name: Some("Bahrain".into()),
            }),
            Some(&SessionEntry {
                total_laps: Some(57),
                flag: None,
            }),
        );
        assert_eq!(ctx.title(), "Bahrain Grand Prix: Race");
        assert_eq!(ctx.total_laps, Some(57));
        assert_eq!(ctx.header().country.as_deref(), Some("Bahrain"));
        assert!(ctx.header().flag.is_none());
    }

    #[test]
    fn missing_meeting_leaves_prefix_empty() {
        let ctx = SessionContext::new(SessionInfo::default(), None, None);
        assert_eq!(ctx.title(), ": ");
        assert_eq!(ctx.total_laps, None);
    }
}
