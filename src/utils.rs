/// Escape a string for use as a Prometheus label value.
///
/// Backslashes are escaped before quotes; newlines and carriage returns are
/// removed rather than escaped.
pub fn escape_label_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' | '\r' => {}
            _ => escaped.push(c),
        }
    }
    escaped
}
