//! Output destinations owned by the writer thread

use crate::config::FileLoggerConfig;
use crate::error::{Error, Result};
use crate::rotation::{FileNamer, RotationPolicy};
use chrono::{DateTime, Local};
use sluice_logger::Level;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where console output goes
pub(crate) type Console = Box<dyn Write + Send>;

const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// One open log file and the number of bytes it holds
struct FileSink {
    path: PathBuf,
    writer: BufWriter<File>,
    size: u64,
    /// Written to since the last sync
    dirty: bool,
}

impl FileSink {
    fn open(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| Error::OpenFile {
                path: path.clone(),
                source,
            })?;
        let size = file
            .metadata()
            .map_err(|e| Error::Io("failed to read log file metadata", e))?
            .len();

        Ok(Self {
            path,
            writer: BufWriter::with_capacity(FILE_BUFFER_SIZE, file),
            size,
            dirty: false,
        })
    }

    fn write_line(&mut self, line: &[u8]) -> Result<()> {
        self.writer
            .write_all(line)
            .map_err(|e| Error::Io("failed to write log line", e))?;
        self.size += line.len() as u64;
        self.dirty = true;
        Ok(())
    }

    /// Flush and sync, skipping files with nothing new since the last sync
    fn sync(&mut self) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        self.writer
            .flush()
            .map_err(|e| Error::Io("failed to flush log file", e))?;
        self.writer
            .get_ref()
            .sync_data()
            .map_err(|e| Error::Io("failed to sync log file", e))?;
        self.dirty = false;
        Ok(true)
    }
}

/// A log stream that moves to a new file on size or time rotation
pub(crate) struct RotatingFile {
    namer: FileNamer,
    policy: RotationPolicy,
    /// Date stamp of the period the current file belongs to
    stamp: String,
    current: Option<FileSink>,
}

impl RotatingFile {
    /// Open the stream, continuing today's last file when it still has room
    pub(crate) fn open(
        namer: FileNamer,
        policy: RotationPolicy,
        now: DateTime<Local>,
    ) -> Result<Self> {
        create_dir(namer.dir())?;
        let stamp = policy.stamp(now);
        let path = namer.resume(&stamp, policy.max_size);
        let sink = FileSink::open(path)?;
        debug!(path = %sink.path.display(), size = sink.size, "opened log file");

        Ok(Self {
            namer,
            policy,
            stamp,
            current: Some(sink),
        })
    }

    /// Path of the file currently written to
    #[cfg(test)]
    pub(crate) fn path(&self) -> Option<&Path> {
        self.current.as_ref().map(|sink| sink.path.as_path())
    }

    pub(crate) fn write_line(&mut self, line: &[u8], now: DateTime<Local>) -> Result<()> {
        let current_size = self.current.as_ref().map_or(0, |sink| sink.size);
        if self.policy.should_rotate(current_size, line.len() as u64) {
            self.rotate(now)?;
        }

        match self.current.as_mut() {
            Some(sink) => sink.write_line(line),
            None => Err(Error::Rotation("no log file is open".to_string())),
        }
    }

    /// Close the current file and open the next one.
    ///
    /// The old file is synced and closed before the new one is created, and
    /// is never reopened by this stream.
    pub(crate) fn rotate(&mut self, now: DateTime<Local>) -> Result<()> {
        self.close()?;

        self.stamp = self.policy.stamp(now);
        let path = self.namer.fresh(&self.stamp);
        let sink = FileSink::open(path)?;
        debug!(path = %sink.path.display(), "rotated log file");
        self.current = Some(sink);
        Ok(())
    }

    /// Rotate if `now` falls in a later period than the current file.
    /// Returns whether a new file was opened.
    pub(crate) fn roll_over(&mut self, now: DateTime<Local>) -> Result<bool> {
        if self.policy.stamp(now) == self.stamp {
            return Ok(false);
        }
        self.rotate(now)?;
        Ok(true)
    }

    pub(crate) fn sync(&mut self) -> Result<()> {
        if let Some(sink) = self.current.as_mut() {
            sink.sync()?;
        }
        Ok(())
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        if let Some(mut sink) = self.current.take() {
            sink.sync()?;
        }
        Ok(())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }
    fs::create_dir_all(dir).map_err(|source| Error::CreateDirectory {
        path: dir.to_path_buf(),
        source,
    })
}

/// Console, primary file and error mirror for one logger
pub(crate) struct SinkSet {
    console: Option<Console>,
    primary: Option<RotatingFile>,
    errors: Option<RotatingFile>,
}

impl SinkSet {
    /// Open the configured sinks. With an empty `log_path` only the console
    /// is used.
    pub(crate) fn open(
        config: &FileLoggerConfig,
        policy: RotationPolicy,
        console: Option<Console>,
        now: DateTime<Local>,
    ) -> Result<Self> {
        if !config.has_files() {
            return Ok(Self {
                console,
                primary: None,
                errors: None,
            });
        }

        let primary = RotatingFile::open(
            FileNamer::primary(&config.log_path, config.file_prefix.as_str()),
            policy,
            now,
        )?;
        let errors = RotatingFile::open(
            FileNamer::error_mirror(config.error_log_dir(), config.file_prefix.as_str()),
            policy,
            now,
        )?;

        Ok(Self {
            console,
            primary: Some(primary),
            errors: Some(errors),
        })
    }

    pub(crate) fn has_files(&self) -> bool {
        self.primary.is_some()
    }

    /// Paths currently written to, primary first
    #[cfg(test)]
    pub(crate) fn paths(&self) -> (Option<&Path>, Option<&Path>) {
        (
            self.primary.as_ref().and_then(RotatingFile::path),
            self.errors.as_ref().and_then(RotatingFile::path),
        )
    }

    /// Write one rendered entry. Errors and above also go to the error mirror.
    pub(crate) fn write(
        &mut self,
        level: Level,
        console_line: &[u8],
        file_line: &[u8],
        now: DateTime<Local>,
    ) -> Result<()> {
        if let Some(console) = self.console.as_mut() {
            // console failures (closed pipe, detached terminal) do not stop file output
            let _ = console.write_all(console_line);
            let _ = console.flush();
        }
        if let Some(primary) = self.primary.as_mut() {
            primary.write_line(file_line, now)?;
        }
        if level.is_error() {
            if let Some(errors) = self.errors.as_mut() {
                errors.write_line(file_line, now)?;
            }
        }
        Ok(())
    }

    /// Flush buffered output and sync files to disk
    pub(crate) fn sync(&mut self) -> Result<()> {
        if let Some(console) = self.console.as_mut() {
            let _ = console.flush();
        }
        for file in [self.primary.as_mut(), self.errors.as_mut()].into_iter().flatten() {
            file.sync()?;
        }
        Ok(())
    }

    /// Move every file stream whose period has ended to a new file.
    ///
    /// Daily and hourly boundaries can coincide; only the first one to fire
    /// opens new files. Returns whether any stream rotated.
    pub(crate) fn roll_over(&mut self, now: DateTime<Local>) -> Result<bool> {
        let mut rotated = false;
        for file in [self.primary.as_mut(), self.errors.as_mut()].into_iter().flatten() {
            rotated |= file.roll_over(now)?;
        }
        Ok(rotated)
    }

    /// Sync and close every file
    pub(crate) fn close(&mut self) -> Result<()> {
        if let Some(console) = self.console.as_mut() {
            let _ = console.flush();
        }
        for file in [self.primary.as_mut(), self.errors.as_mut()].into_iter().flatten() {
            file.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Clone, Default)]
    struct Shared(Arc<Mutex<Vec<u8>>>);

    impl Write for Shared {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 14, 12, 0, 0).unwrap()
    }

    fn config(dir: &Path) -> FileLoggerConfig {
        FileLoggerConfig {
            log_path: dir.to_path_buf(),
            ..FileLoggerConfig::default()
        }
    }

    #[test]
    fn rotates_before_exceeding_size() {
        let dir = TempDir::new().unwrap();
        let policy = RotationPolicy {
            max_size: 25,
            ..RotationPolicy::default()
        };
        let namer = FileNamer::primary(dir.path(), "");
        let mut file = RotatingFile::open(namer.clone(), policy, noon()).unwrap();

        file.write_line(b"0123456789\n", noon()).unwrap();
        file.write_line(b"0123456789\n", noon()).unwrap();
        file.write_line(b"0123456789\n", noon()).unwrap();
        assert_eq!(file.path(), Some(namer.path("20240314", 2).as_path()));
        file.close().unwrap();

        assert_eq!(fs::read(namer.path("20240314", 1)).unwrap().len(), 22);
        assert_eq!(fs::read(namer.path("20240314", 2)).unwrap().len(), 11);
    }

    #[test]
    fn sync_skips_clean_files() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::open(dir.path().join("a.log")).unwrap();

        assert!(!sink.sync().unwrap(), "nothing written yet");
        sink.write_line(b"hello\n").unwrap();
        assert!(sink.sync().unwrap());
        assert!(!sink.sync().unwrap(), "already synced");
        assert_eq!(fs::read(dir.path().join("a.log")).unwrap(), b"hello\n");
    }

    #[test]
    fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("a/b/c");

        let sinks =
            SinkSet::open(&config(&nested), RotationPolicy::default(), None, noon()).unwrap();

        assert!(nested.is_dir());
        let (primary, errors) = sinks.paths();
        assert_eq!(primary.unwrap(), nested.join("20240314.01.log"));
        assert_eq!(errors.unwrap(), nested.join("20240314.01.error.log"));
    }

    #[test]
    fn streams_resume_their_own_last_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("20240314.01.log"), vec![b'x'; 100]).unwrap();
        fs::write(dir.path().join("20240314.02.log"), b"x\n").unwrap();
        fs::write(dir.path().join("20240314.01.error.log"), b"e\n").unwrap();

        let policy = RotationPolicy {
            max_size: 100,
            ..RotationPolicy::default()
        };
        let sinks = SinkSet::open(&config(dir.path()), policy, None, noon()).unwrap();

        let (primary, errors) = sinks.paths();
        assert_eq!(primary.unwrap(), dir.path().join("20240314.02.log"));
        assert_eq!(errors.unwrap(), dir.path().join("20240314.01.error.log"));
    }

    #[test]
    fn error_mirror_receives_only_errors() {
        let dir = TempDir::new().unwrap();
        let console = Shared::default();
        let mut sinks = SinkSet::open(
            &config(dir.path()),
            RotationPolicy::default(),
            Some(Box::new(console.clone())),
            noon(),
        )
        .unwrap();

        sinks.write(Level::Info, b"c-info\n", b"f-info\n", noon()).unwrap();
        sinks.write(Level::Error, b"c-error\n", b"f-error\n", noon()).unwrap();
        sinks.write(Level::Fatal, b"c-fatal\n", b"f-fatal\n", noon()).unwrap();
        sinks.close().unwrap();

        let primary = fs::read_to_string(dir.path().join("20240314.01.log")).unwrap();
        let errors = fs::read_to_string(dir.path().join("20240314.01.error.log")).unwrap();
        let console = String::from_utf8(console.0.lock().unwrap().clone()).unwrap();

        assert_eq!(primary, "f-info\nf-error\nf-fatal\n");
        assert_eq!(errors, "f-error\nf-fatal\n");
        assert_eq!(console, "c-info\nc-error\nc-fatal\n");
    }

    #[test]
    fn console_only_without_log_path() {
        let console = Shared::default();
        let mut sinks = SinkSet::open(
            &FileLoggerConfig::default(),
            RotationPolicy::default(),
            Some(Box::new(console.clone())),
            noon(),
        )
        .unwrap();

        assert!(!sinks.has_files());
        sinks.write(Level::Error, b"only here\n", b"", noon()).unwrap();
        let tomorrow = Local.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap();
        assert!(!sinks.roll_over(tomorrow).unwrap());
        sinks.close().unwrap();

        assert_eq!(console.0.lock().unwrap().as_slice(), b"only here\n");
    }

    #[test]
    fn time_rotation_moves_both_streams() {
        let dir = TempDir::new().unwrap();
        let policy = RotationPolicy {
            daily: true,
            ..RotationPolicy::default()
        };
        let mut sinks = SinkSet::open(&config(dir.path()), policy, None, noon()).unwrap();

        assert!(!sinks.roll_over(noon()).unwrap(), "same day keeps the files");

        let tomorrow = Local.with_ymd_and_hms(2024, 3, 15, 0, 0, 1).unwrap();
        assert!(sinks.roll_over(tomorrow).unwrap());

        let (primary, errors) = sinks.paths();
        assert_eq!(primary.unwrap(), dir.path().join("20240315.01.log"));
        assert_eq!(errors.unwrap(), dir.path().join("20240315.01.error.log"));
    }

    #[test]
    fn coinciding_boundaries_rotate_once() {
        let dir = TempDir::new().unwrap();
        let policy = RotationPolicy {
            daily: true,
            hourly_interval: 6,
            ..RotationPolicy::default()
        };
        let evening = Local.with_ymd_and_hms(2024, 3, 14, 23, 0, 0).unwrap();
        let mut sinks = SinkSet::open(&config(dir.path()), policy, None, evening).unwrap();

        let midnight = Local.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap();
        assert!(sinks.roll_over(midnight).unwrap());
        assert!(!sinks.roll_over(midnight).unwrap());

        let (primary, _) = sinks.paths();
        assert_eq!(primary.unwrap(), dir.path().join("2024031500.01.log"));
        assert!(!dir.path().join("2024031500.02.log").exists());
    }
}
