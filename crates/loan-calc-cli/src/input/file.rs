use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Read a JSON file and deserialise into a typed struct.
pub fn read_json<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    debug!(path = %canonical.display(), "reading input");
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value: T = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    Ok(value)
}

/// Absolute path for `path`, which must name an existing regular file.
pub fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }
    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let err = resolve_path("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().starts_with("File not found"));
    }

    #[test]
    fn test_directory_is_rejected() {
        let dir = std::env::temp_dir();
        let err = resolve_path(dir.to_str().unwrap()).unwrap_err();
        assert!(err.to_string().starts_with("Not a file"));
    }

    #[test]
    fn test_read_typed_json() {
        let path = std::env::temp_dir().join(format!("lcalc-input-{}.json", std::process::id()));
        fs::write(&path, r#"{"principal": "100000", "annual_rate_percent": "5", "term_years": "10"}"#)
            .unwrap();
        let request: loan_calc_core::engine::LoanRequest =
            read_json(path.to_str().unwrap()).unwrap();
        assert_eq!(request.principal.to_string(), "100000");
        fs::remove_file(path).unwrap();
    }
}
