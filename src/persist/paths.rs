//! Calendar-based path derivation
//!
//! Records are routed by the date at the moment of the operation, not by
//! their own timestamp, into `root/YYYY/MM/DD[.suffix].log`.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Local};

/// Year, 1-based month, day snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDay {
    pub fn today() -> Self {
        let now = Local::now().date_naive();
        Self {
            year: now.year(),
            month: now.month(),
            day: now.day(),
        }
    }
}

/// Source of the current calendar date, injectable for tests
pub trait Clock: Send + Sync {
    fn today(&self) -> CalendarDay;
}

/// Wall-clock calendar in the local timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalClock;

impl Clock for LocalClock {
    fn today(&self) -> CalendarDay {
        CalendarDay::today()
    }
}

pub fn year_dir(root: &Path, year: i32) -> PathBuf {
    root.join(year.to_string())
}

pub fn month_dir(root: &Path, year: i32, month: u32) -> PathBuf {
    year_dir(root, year).join(format!("{month:02}"))
}

pub fn day_file(root: &Path, day: &CalendarDay, suffix: &str) -> PathBuf {
    month_dir(root, day.year, day.month).join(format!("{:02}{}.log", day.day, suffix))
}

/// Strip a trailing extension-like suffix from a configured root, so a root
/// of `logs/app.log` partitions under `logs/app/`.
pub fn normalize_root(root: &Path) -> PathBuf {
    if let (Some(stem), Some(extension)) = (root.file_stem(), root.extension()) {
        let extension = extension.to_string_lossy();
        if (1..=10).contains(&extension.len())
            && extension.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return root.with_file_name(stem);
        }
    }
    root.to_path_buf()
}
