/// Password strength rules applied on registration, in addition to the
/// length check on the payload itself.
pub fn password_strength_errors(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < 8 {
        errors.push("Password must be at least 8 characters long".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }

    errors
}

/// Strips anything that is not alphanumeric or whitespace and caps the
/// length, so search terms can be matched verbatim.
pub fn sanitize_search_query(query: &str) -> String {
    let sanitized: String = query
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .take(100)
        .collect();
    sanitized.trim().to_string()
}
