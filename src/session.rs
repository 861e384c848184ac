// 🔑 Session - explicit credential handle
//
// Callers hold a `Session` and pass it to whatever needs credentials. There
// is no ambient token lookup. A 401 from the backend invalidates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const HTTP_UNAUTHORIZED: u16 = 401;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip_serializing)]
    token: String,
    pub user_id: String,
    pub issued_at: DateTime<Utc>,
    pub invalidated_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(token: &str, user_id: &str) -> Self {
        Session {
            token: token.to_string(),
            user_id: user_id.to_string(),
            issued_at: Utc::now(),
            invalidated_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.invalidated_at.is_none() && !self.token.is_empty()
    }

    /// `Authorization` header value, `None` once invalidated
    pub fn authorization_header(&self) -> Option<String> {
        if self.is_active() {
            Some(format!("Bearer {}", self.token))
        } else {
            None
        }
    }

    pub fn invalidate(&mut self) {
        if self.invalidated_at.is_none() {
            tracing::info!(user_id = %self.user_id, "session invalidated");
            self.invalidated_at = Some(Utc::now());
        }
    }

    /// Feed a response status; returns whether the session is still usable
    pub fn observe_status(&mut self, status: u16) -> bool {
        if status == HTTP_UNAUTHORIZED {
            self.invalidate();
        }
        self.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_is_active() {
        let session = Session::new("tok-123", "user-1");

        assert!(session.is_active());
        assert_eq!(session.authorization_header().unwrap(), "Bearer tok-123");
    }

    #[test]
    fn test_unauthorized_invalidates() {
        let mut session = Session::new("tok-123", "user-1");

        assert!(session.observe_status(200));
        assert!(session.observe_status(403));
        assert!(session.observe_status(500));
        assert!(!session.observe_status(401));

        assert!(!session.is_active());
        assert!(session.authorization_header().is_none());
    }

    #[test]
    fn test_invalidation_time_is_kept() {
        let mut session = Session::new("tok-123", "user-1");
        session.invalidate();
        let first = session.invalidated_at;

        session.invalidate();
        assert_eq!(session.invalidated_at, first);
    }

    #[test]
    fn test_serialized_session_omits_token() {
        let session = Session::new("tok-123", "user-1");
        let json = serde_json::to_string(&session).unwrap();

        assert!(!json.contains("tok-123"));
        assert!(!json.contains("token"));
        assert!(json.contains("user-1"));
    }

    #[test]
    fn test_empty_token_is_inactive() {
        assert!(!Session::new("", "user-1").is_active());
    }
}
