#![allow(dead_code)]

use sluice_logger_file::{ConsoleTarget, FileLoggerConfig, FileLoggerConfigBuilder};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// In-memory console
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Builder writing to `dir` with the console switched off
pub fn config_in(dir: &Path) -> FileLoggerConfigBuilder {
    FileLoggerConfig::builder()
        .log_path(dir)
        .console(ConsoleTarget::Disabled)
}

/// Primary log files in `dir`, in name order
pub fn primary_files(dir: &Path) -> Vec<PathBuf> {
    files_matching(dir, |name| name.ends_with(".log") && !name.ends_with(".error.log"))
}

/// Error mirror files in `dir`, in name order
pub fn error_files(dir: &Path) -> Vec<PathBuf> {
    files_matching(dir, |name| name.ends_with(".error.log"))
}

fn files_matching(dir: &Path, keep: impl Fn(&str) -> bool) -> Vec<PathBuf> {
    let mut files: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .filter(|path| keep(&path.file_name().unwrap().to_string_lossy()))
        .collect();
    files.sort();
    files
}

/// Concatenated contents of `files`
pub fn read_all(files: &[PathBuf]) -> String {
    files
        .iter()
        .map(|path| fs::read_to_string(path).unwrap())
        .collect()
}

/// File name of `path` as a string
pub fn name_of(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}
