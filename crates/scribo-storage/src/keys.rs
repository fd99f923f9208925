//! Shared key generation for storage backends.
//!
//! Key format: `audio/{user_id}/{uuid}_{filename}`.

use uuid::Uuid;

/// Generate a storage key for the given owner and filename.
///
/// A fresh UUID is embedded so repeated uploads of the same filename never
/// collide. All backends must use this format for consistency.
pub fn generate_storage_key(user_id: Uuid, filename: &str) -> String {
    let mut sanitized: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    while sanitized.contains("..") {
        sanitized = sanitized.replace("..", "_");
    }
    format!("audio/{}/{}_{}", user_id, Uuid::new_v4(), sanitized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_owner_scoped() {
        let user_id = Uuid::new_v4();
        let key = generate_storage_key(user_id, "meeting.mp3");
        assert!(key.starts_with(&format!("audio/{}/", user_id)));
        assert!(key.ends_with("_meeting.mp3"));
    }

    #[test]
    fn test_keys_never_collide() {
        let user_id = Uuid::new_v4();
        let a = generate_storage_key(user_id, "same.mp3");
        let b = generate_storage_key(user_id, "same.mp3");
        assert_ne!(a, b);
    }

    #[test]
    fn test_unsafe_characters_replaced() {
        let key = generate_storage_key(Uuid::new_v4(), "../etc/pass wd.mp3");
        assert!(!key.contains(".."));
        assert!(!key.contains(' '));
        assert!(!key.contains("/etc"));
    }
}
