//! Email identity rules.

/// Lowercases the domain part of an address, leaving the local part as typed.
///
/// Input without an `@` is returned unchanged so the caller's validation can
/// reject it with a field error.
pub fn normalize_email(email: &str) -> String {
    match email.trim().rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

/// Loose structural check used at the signup boundary.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.rsplit_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() {
        return false;
    }
    if domain.eq_ignore_ascii_case("localhost") {
        return true;
    }
    domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains("..")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_domain_only() {
        assert_eq!(normalize_email("tesT@recipeAPI.com"), "tesT@recipeapi.com");
        assert_eq!(normalize_email("MiXeD@EXAMPLE.ORG"), "MiXeD@example.org");
    }

    #[test]
    fn splits_on_last_at_sign() {
        assert_eq!(normalize_email("\"a@b\"@Host.IO"), "\"a@b\"@host.io");
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(normalize_email("  user@Site.com "), "user@site.com");
    }

    #[test]
    fn leaves_non_addresses_alone() {
        assert_eq!(normalize_email("not-an-email"), "not-an-email");
        assert_eq!(normalize_email(""), "");
    }

    #[test]
    fn validates_structure() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("admin@localhost"));
        assert!(!is_valid_email("a@x"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@"));
        assert!(!is_valid_email("a b@x.com"));
        assert!(!is_valid_email("a@.x.com"));
        assert!(!is_valid_email("plain"));
    }
}
