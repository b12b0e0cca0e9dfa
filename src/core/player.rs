use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One player's persisted identity and login metadata.
///
/// The serde representation (camelCase, RFC-3339 timestamps) is both the
/// canonical on-disk line format and the HTTP body representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRecord {
    /// Globally unique, stable for the lifetime of the record.
    pub id: String,

    /// Device fingerprint presented at login. At most one live record
    /// may claim a given device id.
    pub device_id: String,

    /// Display label. Defaults to `Player_<id>` when none is supplied.
    pub username: String,

    /// Set once at creation, never mutated.
    pub created_at: DateTime<Utc>,

    /// Advanced on every successful login.
    pub last_login_at: DateTime<Utc>,
}

impl PlayerRecord {
    /// Build a brand-new record with `created_at == last_login_at == now`.
    pub fn new(id: String, username: Option<&str>, device_id: &str) -> Self {
        let username = match username {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => Self::placeholder_username(&id),
        };
        let now = Utc::now();
        Self {
            id,
            device_id: device_id.to_string(),
            username,
            created_at: now,
            last_login_at: now,
        }
    }

    pub fn placeholder_username(id: &str) -> String {
        format!("Player_{id}")
    }

    /// Advance `last_login_at`. Clamped so the field never moves backwards.
    pub fn touch(&mut self) {
        self.last_login_at = self.last_login_at.max(Utc::now());
    }

    /// Key matching for lookups: canonical id or device fingerprint.
    pub fn matches(&self, key: &str) -> bool {
        self.id == key || self.device_id == key
    }
}

#[cfg(test)]
mod tests {
    use super::PlayerRecord;

    #[test]
    fn new_record_starts_with_equal_timestamps() {
        let record = PlayerRecord::new("p-1".to_string(), Some("alice"), "dev-1");
        assert_eq!(record.created_at, record.last_login_at);
        assert_eq!(record.username, "alice");
    }

    #[test]
    fn blank_username_falls_back_to_placeholder() {
        let record = PlayerRecord::new("p-2".to_string(), Some("   "), "dev-2");
        assert_eq!(record.username, "Player_p-2");

        let record = PlayerRecord::new("p-3".to_string(), None, "dev-3");
        assert_eq!(record.username, "Player_p-3");
    }

    #[test]
    fn touch_never_moves_last_login_backwards() {
        let mut record = PlayerRecord::new("p-4".to_string(), None, "dev-4");
        let before = record.last_login_at;
        record.touch();
        assert!(record.last_login_at >= before);
    }
}
