/// Shared input validation for auth and resource routes.
/// Password strength: 8-256 chars, at least one upper, one lower, one digit.
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    if password.len() > 256 {
        return Err("Password must be at most 256 characters");
    }
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_upper || !has_lower || !has_digit {
        return Err("Password must contain an uppercase letter, a lowercase letter and a digit");
    }
    Ok(())
}

/// Minimal user@domain.tld check, no regex.
pub fn is_valid_email(email: &str) -> bool {
    if email.len() > 254 {
        return false;
    }
    let parts: Vec<&str> = email.splitn(2, '@').collect();
    if parts.len() != 2 {
        return false;
    }
    let (local, domain) = (parts[0], parts[1]);
    if local.is_empty() || local.len() > 64 {
        return false;
    }
    if !local
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b'_' || b == b'+' || b == b'-')
    {
        return false;
    }
    if local.starts_with('.') || local.ends_with('.') || local.contains("..") {
        return false;
    }
    if domain.is_empty() || !domain.contains('.') {
        return false;
    }
    if !domain
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'.')
    {
        return false;
    }
    domain
        .split('.')
        .all(|part| !part.is_empty() && !part.starts_with('-') && !part.ends_with('-'))
}

/// Usernames: 2-50 chars, letters/digits/underscore/hyphen/space.
pub fn validate_username(username: &str) -> Result<(), &'static str> {
    let char_count = username.chars().count();
    if char_count < 2 || char_count > 50 {
        return Err("Username must be between 2 and 50 characters");
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '_' || c == '-' || c == ' ')
    {
        return Err("Username may only contain letters, digits, underscores, hyphens and spaces");
    }
    Ok(())
}

/// Quiz and class titles: 1-200 chars after trimming.
pub fn validate_title(title: &str) -> Result<(), &'static str> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err("Title must not be empty");
    }
    if trimmed.chars().count() > 200 {
        return Err("Title must be at most 200 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_password_accepted() {
        assert!(validate_password("Abc12345").is_ok());
    }

    #[test]
    fn short_password_rejected() {
        assert!(validate_password("Ab1").is_err());
    }

    #[test]
    fn no_uppercase_rejected() {
        assert!(validate_password("abcdefg1").is_err());
    }

    #[test]
    fn no_digit_rejected() {
        assert!(validate_password("Abcdefgh").is_err());
    }

    #[test]
    fn valid_email_accepted() {
        assert!(is_valid_email("user@example.com"));
    }

    #[test]
    fn email_without_dot_rejected() {
        assert!(!is_valid_email("user@example"));
    }

    #[test]
    fn email_without_at_rejected() {
        assert!(!is_valid_email("userexample.com"));
    }

    #[test]
    fn email_local_part_consecutive_dots_rejected() {
        assert!(!is_valid_email("user..name@example.com"));
    }

    #[test]
    fn email_local_part_with_plus_accepted() {
        assert!(is_valid_email("user+tag@example.com"));
    }

    #[test]
    fn valid_username_accepted() {
        assert!(validate_username("hello_world").is_ok());
    }

    #[test]
    fn short_username_rejected() {
        assert!(validate_username("a").is_err());
    }

    #[test]
    fn special_chars_in_username_rejected() {
        assert!(validate_username("user@name").is_err());
    }

    #[test]
    fn empty_title_rejected() {
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn reasonable_title_accepted() {
        assert!(validate_title("Week 3: Photosynthesis").is_ok());
    }
}
