//! Registration input checks

const MIN_PASSWORD_LEN: usize = 8;
const MAX_LOCAL_PART_LEN: usize = 64;

/// Symbols allowed in an unquoted local part besides letters, digits and dots
const LOCAL_PART_SYMBOLS: &str = "!#$%&'*+-/=?^_`{|}~";

fn is_valid_local_part(local: &str) -> bool {
    !local.is_empty()
        && local.len() <= MAX_LOCAL_PART_LEN
        && !local.starts_with('.')
        && !local.ends_with('.')
        && !local.contains("..")
        && local
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || LOCAL_PART_SYMBOLS.contains(c))
}

/// Structural email check: dot-atom local part, one `@`, dotted domain
pub fn is_valid_email(email: &str) -> bool {
    let email = email.trim();
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if !is_valid_local_part(local) || domain.contains('@') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

/// Human-readable reasons `password` is too weak; empty when it is acceptable
pub fn password_issues(password: &str) -> Vec<String> {
    let mut issues = Vec::new();

    if password.chars().count() < MIN_PASSWORD_LEN {
        issues.push(format!("At least {} characters long", MIN_PASSWORD_LEN));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        issues.push("Include at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        issues.push("Include at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        issues.push("Include at least one digit".to_string());
    }
    if !password
        .chars()
        .any(|c| !c.is_alphanumeric() && c != '_' && !c.is_whitespace())
    {
        issues.push("Include at least one special character (e.g. !@#$%)".to_string());
    }

    issues
}
