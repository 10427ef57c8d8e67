//! Polling file watcher
//!
//! Watch mode re-renders whenever the input changes. Changes are detected
//! by comparing the latest modification time of the path (recursively for
//! directories) between polls.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Latest modification time of `path` and, for a directory, of everything in it.
pub fn latest_modification(path: &Path) -> io::Result<SystemTime> {
    let meta = std::fs::metadata(path)?;
    let mut latest = meta.modified()?;
    if meta.is_dir() {
        for entry in std::fs::read_dir(path)? {
            let child = latest_modification(&entry?.path())?;
            if child > latest {
                latest = child;
            }
        }
    }
    Ok(latest)
}

pub struct FileWatcher {
    path: PathBuf,
    interval: Duration,
    last_seen: Option<SystemTime>,
}

impl FileWatcher {
    pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        FileWatcher {
            path: path.into(),
            interval,
            last_seen: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// True when the path changed since the previous poll. The first poll
    /// always reports a change.
    pub fn poll(&mut self) -> io::Result<bool> {
        let stamp = latest_modification(&self.path)?;
        if self.last_seen == Some(stamp) {
            return Ok(false);
        }
        self.last_seen = Some(stamp);
        Ok(true)
    }

    /// Block until the next change.
    ///
    /// A path that disappears for a moment (editors often save by replacing
    /// the file) is waited for rather than reported.
    pub fn wait(&mut self) -> io::Result<()> {
        loop {
            match self.poll() {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    log::debug!("{} is missing; waiting", self.path.display());
                }
                Err(err) => return Err(err),
            }
            std::thread::sleep(self.interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path, time: SystemTime) {
        let file = File::options().write(true).open(path).unwrap();
        file.set_modified(time).unwrap();
    }

    #[test]
    fn test_poll_reports_first_sight_and_changes_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calc.ods");
        std::fs::write(&path, b"one").unwrap();
        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(1_000));

        let mut watcher = FileWatcher::new(&path, Duration::from_millis(1));
        assert!(watcher.poll().unwrap());
        assert!(!watcher.poll().unwrap());

        touch(&path, SystemTime::UNIX_EPOCH + Duration::from_secs(2_000));
        assert!(watcher.poll().unwrap());
        assert!(!watcher.poll().unwrap());
    }

    #[test]
    fn test_latest_modification_looks_into_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        std::fs::create_dir(&nested).unwrap();
        let path = nested.join("calc.ods");
        std::fs::write(&path, b"one").unwrap();

        let future = SystemTime::now() + Duration::from_secs(3_600);
        touch(&path, future);
        assert_eq!(latest_modification(dir.path()).unwrap(), future);
    }

    #[test]
    fn test_missing_path_is_an_error_for_poll() {
        let dir = tempfile::tempdir().unwrap();
        let mut watcher = FileWatcher::new(dir.path().join("nope.ods"), Duration::from_millis(1));
        assert_eq!(watcher.poll().unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_wait_returns_on_first_sight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calc.ods");
        std::fs::write(&path, b"one").unwrap();
        let mut watcher = FileWatcher::new(&path, Duration::from_millis(1));
        watcher.wait().unwrap();
        assert!(!watcher.poll().unwrap());
    }
}
