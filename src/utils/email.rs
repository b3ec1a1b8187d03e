use sha2::{Digest, Sha256};

/// Firebase UIDs costumam ter 28 caracteres
pub const UID_LENGTH: usize = 28;

/// Trims and lowercases an email so it can be compared or stored.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Generates a stable UID from an email: hex SHA-256, truncated to 28 chars.
///
/// The same email always maps to the same UID, so re-seeding targets the
/// same document.
pub fn generate_uid(email: &str) -> String {
    let digest = Sha256::digest(email.as_bytes());
    let mut uid = hex::encode(digest);
    uid.truncate(UID_LENGTH);
    uid
}

/// Document id for an `allowedUsers` record: `Ana@Example.com` -> `ana_example_com`.
pub fn allowed_user_doc_id(primary_email: &str) -> String {
    normalize_email(primary_email)
        .chars()
        .map(|c| match c {
            '@' | '.' | '/' => '_',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_uid_empty_email() {
        assert_eq!(generate_uid(""), "e3b0c44298fc1c149afbf4c8996f");
    }

    #[test]
    fn test_generate_uid_is_stable() {
        let first = generate_uid("leader@example.com");
        let second = generate_uid("leader@example.com");
        assert_eq!(first, second);
        assert_eq!(first.len(), UID_LENGTH);
        assert_ne!(first, generate_uid("other@example.com"));
    }

    #[test]
    fn test_allowed_user_doc_id() {
        assert_eq!(allowed_user_doc_id("A@X.com"), "a_x_com");
        assert_eq!(allowed_user_doc_id(" first.last@mail.example.org "), "first_last_mail_example_org");
        assert_eq!(allowed_user_doc_id("weird/name@x.io"), "weird_name_x_io");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  J@X.Com "), "j@x.com");
        assert_eq!(normalize_email(""), "");
    }
}
