use serde_json::Value;

/// Pretty-printed JSON with a trailing newline.
pub fn render_json(value: &Value) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value).map(|mut s| {
        s.push('\n');
        s
    })
}

pub fn print_json(value: &Value) {
    match render_json(value) {
        Ok(s) => print!("{s}"),
        Err(e) => eprintln!("JSON serialization error: {e}"),
    }
}
