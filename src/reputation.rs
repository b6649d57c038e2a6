use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;

/// Read-only membership query over the known-bad domain set. The set
/// is populated out-of-band by a separate ingestion job; this crate
/// only ever reads it. Queries are exact base-domain string matches.
pub trait ReputationStore: Send + Sync {
    fn contains(&self, domain: &str) -> Result<bool>;
}

/// Snapshot store over a newline-delimited domain list, the format
/// public blocklist feeds publish. Comment lines start with `#`.
#[derive(Debug)]
pub struct FileReputationStore {
    domains: HashSet<String>,
}

impl FileReputationStore {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read reputation snapshot: {}", path.display()))?;
        let domains = content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(|l| l.to_lowercase())
            .collect::<HashSet<_>>();
        log::info!("loaded {} known-bad domains from {}", domains.len(), path.display());
        Ok(Self { domains })
    }

    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}

impl ReputationStore for FileReputationStore {
    fn contains(&self, domain: &str) -> Result<bool> {
        Ok(self.domains.contains(&domain.to_lowercase()))
    }
}

/// In-memory store for tests and embedding.
#[derive(Default)]
pub struct MemoryReputationStore {
    domains: HashSet<String>,
}

impl MemoryReputationStore {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(|d| d.into().to_lowercase()).collect(),
        }
    }
}

impl ReputationStore for MemoryReputationStore {
    fn contains(&self, domain: &str) -> Result<bool> {
        Ok(self.domains.contains(&domain.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn memory_store_matches_exactly() {
        let store = MemoryReputationStore::new(["Evil.example"]);
        assert!(store.contains("evil.example").unwrap());
        assert!(store.contains("EVIL.EXAMPLE").unwrap());
        assert!(!store.contains("sub.evil.example").unwrap());
        assert!(!store.contains("good.example").unwrap());
    }

    #[test]
    fn file_store_skips_comments_and_blanks() {
        let mut file = tempfile_path();
        writeln!(file.1, "# feed header").unwrap();
        writeln!(file.1).unwrap();
        writeln!(file.1, "bad.example").unwrap();
        writeln!(file.1, "  worse.example  ").unwrap();
        file.1.flush().unwrap();

        let store = FileReputationStore::load(&file.0).unwrap();
        assert_eq!(store.len(), 2);
        assert!(store.contains("bad.example").unwrap());
        assert!(store.contains("worse.example").unwrap());
        assert!(!store.contains("# feed header").unwrap());

        std::fs::remove_file(&file.0).ok();
    }

    #[test]
    fn file_store_load_fails_on_missing_file() {
        let err = FileReputationStore::load(Path::new("/nonexistent/feed.txt")).unwrap_err();
        assert!(err.to_string().contains("reputation snapshot"));
    }

    fn tempfile_path() -> (std::path::PathBuf, std::fs::File) {
        let path = std::env::temp_dir().join(format!(
            "phishscore-reputation-test-{}.txt",
            std::process::id()
        ));
        let file = std::fs::File::create(&path).unwrap();
        (path, file)
    }
}
