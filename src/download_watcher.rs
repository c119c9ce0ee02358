use std::collections::HashSet;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use tokio::time::{Instant, sleep};

/// Watches the browser's download directory for the file a save action
/// produces. The caller snapshots the directory before triggering the save,
/// then waits for a new entry to appear.
pub struct DownloadWatcher {
    dir: PathBuf,
    poll_interval: Duration,
}

/// The directory entries present before the triggering action.
pub struct DirSnapshot {
    names: HashSet<OsString>,
}

impl DownloadWatcher {
    pub fn new(dir: PathBuf, poll_interval: Duration) -> Self {
        Self { dir, poll_interval }
    }

    pub fn snapshot(&self) -> anyhow::Result<DirSnapshot> {
        Ok(DirSnapshot {
            names: self.list_names()?,
        })
    }

    /// Polls until a file not present in `before` whose name ends with
    /// `suffix` (case-insensitive) appears, or until `timeout` elapses.
    /// A timeout is an expected outcome, not an error: `None` means the
    /// document was not produced for this attempt.
    pub async fn wait_for_new_file(
        &self,
        before: &DirSnapshot,
        suffix: &str,
        timeout: Duration,
    ) -> anyhow::Result<Option<PathBuf>> {
        let suffix = suffix.to_lowercase();
        let deadline = Instant::now() + timeout;
        loop {
            sleep(self.poll_interval).await;
            for name in self.list_names()? {
                if before.names.contains(&name) {
                    continue;
                }
                if name.to_string_lossy().to_lowercase().ends_with(&suffix) {
                    return Ok(Some(self.dir.join(name)));
                }
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
        }
    }

    fn list_names(&self) -> anyhow::Result<HashSet<OsString>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to read download dir {}", self.dir.display()))?;
        let mut names = HashSet::new();
        for entry in entries {
            names.insert(entry?.file_name());
        }
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watcher_in(dir: &tempfile::TempDir) -> DownloadWatcher {
        DownloadWatcher::new(dir.path().to_path_buf(), Duration::from_millis(500))
    }

    #[tokio::test(start_paused = true)]
    async fn new_matching_file_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "old").unwrap();
        let watcher = watcher_in(&dir);

        let before = watcher.snapshot().unwrap();
        fs::write(dir.path().join("b.pdf"), "new").unwrap();

        let found = watcher
            .wait_for_new_file(&before, ".pdf", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(found, Some(dir.path().join("b.pdf")));
    }

    #[tokio::test(start_paused = true)]
    async fn suffix_match_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = watcher_in(&dir);

        let before = watcher.snapshot().unwrap();
        fs::write(dir.path().join("COURSE.PDF"), "new").unwrap();

        let found = watcher
            .wait_for_new_file(&before, ".pdf", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(found, Some(dir.path().join("COURSE.PDF")));
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_when_nothing_appears() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = watcher_in(&dir);

        let before = watcher.snapshot().unwrap();
        let found = watcher
            .wait_for_new_file(&before, ".pdf", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test(start_paused = true)]
    async fn wrong_suffix_does_not_satisfy_the_wait() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = watcher_in(&dir);

        let before = watcher.snapshot().unwrap();
        fs::write(dir.path().join("b.txt"), "new").unwrap();

        let found = watcher
            .wait_for_new_file(&before, ".pdf", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(found, None);
    }

    #[tokio::test(start_paused = true)]
    async fn files_from_the_snapshot_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("previous.pdf"), "old").unwrap();
        let watcher = watcher_in(&dir);

        let before = watcher.snapshot().unwrap();
        let found = watcher
            .wait_for_new_file(&before, ".pdf", Duration::from_secs(30))
            .await
            .unwrap();
        assert_eq!(found, None);
    }
}
