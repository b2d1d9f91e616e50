//! Append-only audit log of attempted invocations

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Append one line to the audit log, creating the file if needed
pub fn append(path: &Path, line: &str) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    file.flush()
}

/// Number of lines currently in the audit log (0 if it does not exist)
pub fn line_count(path: &Path) -> io::Result<usize> {
    match fs::read_to_string(path) {
        Ok(content) => Ok(content.lines().count()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(0),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_append_creates_and_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("cmd.log");

        assert_eq!(line_count(&path).unwrap(), 0);
        append(&path, "first").unwrap();
        append(&path, "second").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "first\nsecond\n");
        assert_eq!(line_count(&path).unwrap(), 2);
    }
}
