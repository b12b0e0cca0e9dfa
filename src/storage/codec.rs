//! Line codec for the player list file.
//!
//! The canonical wire format of the store is one JSON object per line with
//! the field names `id`, `deviceId`, `username`, `createdAt`, `lastLoginAt`
//! (RFC-3339 timestamps). Decoding falls back to the legacy `id,deviceId`
//! comma pair so files written by earlier deployments stay readable; the
//! fallback chain lives here and nowhere else.

use chrono::Utc;

use crate::core::{PlayerRecord, Result, StoreError};

/// Encode one record as a single line (no trailing newline).
pub fn encode(record: &PlayerRecord) -> Result<String> {
    serde_json::to_string(record)
        .map_err(|e| StoreError::Decode(format!("failed to encode record '{}': {}", record.id, e)))
}

/// Decode one line into a record.
///
/// Tries the canonical JSON format first, then the legacy comma pair.
/// Legacy lines carry no username or timestamps: the username becomes the
/// `Player_<id>` placeholder and both timestamps are approximated as now,
/// matching what rehydration has always done for that format.
pub fn decode(line: &str) -> Result<PlayerRecord> {
    let line = line.trim();
    if line.is_empty() {
        return Err(StoreError::Decode("empty line".to_string()));
    }

    if line.starts_with('{') {
        return serde_json::from_str(line)
            .map_err(|e| StoreError::Decode(format!("bad record line: {e}")));
    }

    decode_legacy(line)
}

fn decode_legacy(line: &str) -> Result<PlayerRecord> {
    let parts: Vec<&str> = line.split(',').collect();
    // >= 2 tolerates fields appended by later versions of the legacy format
    if parts.len() < 2 || parts[0].is_empty() || parts[1].is_empty() {
        return Err(StoreError::Decode(format!(
            "line is neither JSON nor a legacy id,deviceId pair: {line:?}"
        )));
    }

    let id = parts[0].to_string();
    let now = Utc::now();
    Ok(PlayerRecord {
        username: PlayerRecord::placeholder_username(&id),
        device_id: parts[1].to_string(),
        id,
        created_at: now,
        last_login_at: now,
    })
}

#[cfg(test)]
mod tests {
    use super::{decode, encode};
    use crate::core::PlayerRecord;

    #[test]
    fn json_round_trip_preserves_all_fields() {
        let record = PlayerRecord::new("abc123".to_string(), Some("alice"), "dev-1");
        let line = encode(&record).unwrap();
        assert!(!line.contains('\n'));

        let decoded = decode(&line).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn encoded_line_uses_canonical_field_names() {
        let record = PlayerRecord::new("abc123".to_string(), None, "dev-1");
        let line = encode(&record).unwrap();
        for field in ["\"id\"", "\"deviceId\"", "\"username\"", "\"createdAt\"", "\"lastLoginAt\""] {
            assert!(line.contains(field), "missing {field} in {line}");
        }
    }

    #[test]
    fn legacy_comma_pair_decodes_with_placeholder_fields() {
        let decoded = decode("p-77,device-xyz").unwrap();
        assert_eq!(decoded.id, "p-77");
        assert_eq!(decoded.device_id, "device-xyz");
        assert_eq!(decoded.username, "Player_p-77");
        assert!(decoded.created_at <= decoded.last_login_at);
    }

    #[test]
    fn legacy_decode_tolerates_extra_fields() {
        let decoded = decode("p-1,dev-1,future,fields").unwrap();
        assert_eq!(decoded.id, "p-1");
        assert_eq!(decoded.device_id, "dev-1");
    }

    #[test]
    fn garbage_lines_are_rejected() {
        assert!(decode("").is_err());
        assert!(decode("   ").is_err());
        assert!(decode("not a record").is_err());
        assert!(decode("{\"id\": 42}").is_err());
        assert!(decode(",missing-id").is_err());
    }
}
