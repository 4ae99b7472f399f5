//! Formatting helpers for terminal output.

use chrono::NaiveDateTime;
use usermgmt_core::models::User;

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

/// Format an optional string, returning a default if None
pub fn format_optional(value: &Option<String>, default: &str) -> String {
    value.as_deref().filter(|s| !s.is_empty()).unwrap_or(default).to_string()
}

/// Format a server timestamp like `2024-03-01 09:30`
pub fn format_timestamp(value: Option<&NaiveDateTime>) -> String {
    value
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Multi-line detail view of a single user.
pub fn user_details(user: &User) -> String {
    let lines = [
        ("ID", user.id.to_string()),
        ("Username", format_optional(&user.username, "-")),
        ("Name", user.display_name()),
        ("Email", format_optional(&user.email, "-")),
        ("Phone", format_optional(&user.phone, "-")),
        ("Role", if user.role.is_empty() { "-".to_string() } else { user.role.clone() }),
        ("Status", user.status().display_name().to_string()),
        ("Created", format_timestamp(user.created_at.as_ref())),
        ("Last login", format_timestamp(user.last_login.as_ref())),
    ];
    lines
        .iter()
        .map(|(label, value)| format!("{:<11} {}", format!("{}:", label), value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One row per user, fixed-width columns.
pub fn user_table(users: &[User]) -> String {
    let mut out = format!(
        "{:>5}  {:<16}  {:<24}  {:<28}  {:<6}  {:<8}",
        "ID", "USERNAME", "NAME", "EMAIL", "ROLE", "STATUS"
    );
    for user in users {
        out.push('\n');
        out.push_str(&format!(
            "{:>5}  {:<16}  {:<24}  {:<28}  {:<6}  {:<8}",
            user.id,
            truncate_string(&format_optional(&user.username, "-"), 16),
            truncate_string(&format_optional(&user.full_name, "-"), 24),
            truncate_string(&format_optional(&user.email, "-"), 28),
            truncate_string(&user.role, 6),
            user.status().display_name(),
        ));
    }
    out
}
