pub mod file;
pub mod params;
pub mod stdin;

use serde::de::DeserializeOwned;

/// Typed input from `--input <file>` or, failing that, piped stdin. `None`
/// when neither is available.
pub fn read_input<T: DeserializeOwned>(
    path: Option<&str>,
) -> Result<Option<T>, Box<dyn std::error::Error>> {
    if let Some(path) = path {
        return Ok(Some(file::read_json(path)?));
    }
    match stdin::read_stdin()? {
        Some(data) => Ok(Some(serde_json::from_value(data)?)),
        None => Ok(None),
    }
}

/// Like [`read_input`] but the input is mandatory.
pub fn require_input<T: DeserializeOwned>(
    path: Option<&str>,
    what: &str,
) -> Result<T, Box<dyn std::error::Error>> {
    read_input(path)?.ok_or_else(|| format!("--input <file.json> or stdin required for {what}").into())
}
