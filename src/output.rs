use std::fmt::Write as _;

use crate::parse::GroupRecord;

/// Print a Serialize value as pretty JSON, logging errors to stderr.
pub fn print_json(value: &(impl serde::Serialize + ?Sized)) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("[localgroup] JSON serialization error: {e}"),
    }
}

/// Human-readable block for one group: name, comment (or `-`), then one
/// indented line per member.
pub fn format_group(record: &GroupRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "name:    {}", record.name);
    let _ = writeln!(out, "comment: {}", record.comment.as_deref().unwrap_or("-"));
    let _ = writeln!(out, "members: {}", record.members.len());
    for member in &record.members {
        let _ = writeln!(out, "  {member}");
    }
    out
}
