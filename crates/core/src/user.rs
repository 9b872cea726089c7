//! User naming rules.

/// Minimum length of a first or last name.
pub const PERSON_NAME_MIN_LEN: u64 = 2;

/// Maximum length of a first or last name.
pub const PERSON_NAME_MAX_LEN: u64 = 50;

/// Maximum length of a company name.
pub const COMPANY_MAX_LEN: u64 = 200;

/// Minimum password length accepted at registration.
pub const PASSWORD_MIN_LEN: u64 = 8;

/// `"first last"`, or the local part of the email when both are blank.
pub fn full_name(first_name: &str, last_name: &str, email: &str) -> String {
    let joined = format!("{} {}", first_name.trim(), last_name.trim());
    let joined = joined.trim();
    if joined.is_empty() {
        email.split('@').next().unwrap_or(email).to_string()
    } else {
        joined.to_string()
    }
}

/// Emails are compared case-insensitively and stored lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_joins_parts() {
        assert_eq!(full_name("Ada", "Lovelace", "ada@example.com"), "Ada Lovelace");
        assert_eq!(full_name("Ada", "", "ada@example.com"), "Ada");
    }

    #[test]
    fn full_name_falls_back_to_email() {
        assert_eq!(full_name(" ", "", "ada@example.com"), "ada");
    }

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }
}
