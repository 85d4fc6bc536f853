use std::path::PathBuf;

use async_trait::async_trait;

use super::{Secret, SecretBackend, SecretSource};

/// Reads a secret from a mounted file (e.g. a Kubernetes secret volume).
///
/// The contents are trimmed of surrounding whitespace; a missing,
/// unreadable, or whitespace-only file resolves to `None`. I/O errors are
/// logged and swallowed — they never cross this boundary.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SecretBackend for FileBackend {
    async fn resolve(&self) -> Option<Secret> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read key file");
                return None;
            }
        };

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            tracing::warn!(path = %self.path.display(), "key file is empty");
            return None;
        }

        Some(Secret::new(trimmed, SecretSource::File))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_resolves_and_trims_file_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "  key-from-file\n").unwrap();

        let backend = FileBackend::new(file.path());
        let secret = backend.resolve().await.unwrap();
        assert_eq!(secret.value(), "key-from-file");
        assert_eq!(secret.source(), SecretSource::File);
    }

    #[tokio::test]
    async fn test_missing_file_is_absent() {
        let backend = FileBackend::new("/nonexistent/keygate/api.key");
        assert!(backend.resolve().await.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_only_file_is_absent() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "  \n\t ").unwrap();

        let backend = FileBackend::new(file.path());
        assert!(backend.resolve().await.is_none());
    }
}
