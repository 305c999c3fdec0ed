use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{Duration, Local, NaiveDateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;

const BACKUP_TIME_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.3f";
const COMPRESS_SUFFIX: &str = ".gz";
const MEGABYTE: u64 = 1024 * 1024;

/// When and how a [`RollingFile`] rotates. A zero limit disables that limit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollPolicy {
    pub max_bytes: u64,
    pub max_backups: usize,
    pub max_age_days: u32,
    pub compress: bool,
    pub local_time: bool,
}

impl RollPolicy {
    pub fn megabytes(max_size_mb: u64, max_backups: usize, max_age_days: u32) -> Self {
        Self {
            max_bytes: max_size_mb * MEGABYTE,
            max_backups,
            max_age_days,
            compress: true,
            local_time: true,
        }
    }
}

/// Append-only log file that rotates once it grows past `max_bytes`.
///
/// The active file is renamed to `<stem>-<timestamp>.<ext>`, optionally
/// gzipped, and backups beyond the count or age limits are removed.
pub struct RollingFile {
    path: PathBuf,
    policy: RollPolicy,
    file: Option<File>,
    size: u64,
}

impl RollingFile {
    pub fn open(path: impl Into<PathBuf>, policy: RollPolicy) -> io::Result<Self> {
        let path = path.into();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            policy,
            file: Some(file),
            size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Moves the active file aside and opens a fresh one. Returns the backup.
    fn rotate(&mut self) -> io::Result<PathBuf> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
        }

        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;
        self.file = Some(open_append(&self.path)?);
        self.size = 0;
        Ok(backup)
    }

    fn tidy_backups(&self, backup: &Path) -> io::Result<()> {
        if self.policy.compress {
            compress(backup)?;
        }
        self.prune()
    }

    fn now(&self) -> NaiveDateTime {
        if self.policy.local_time {
            Local::now().naive_local()
        } else {
            Utc::now().naive_utc()
        }
    }

    /// Backup name for the current instant, nudged forward a millisecond at a
    /// time so two rotations within the same millisecond never collide.
    fn backup_path(&self) -> PathBuf {
        let (stem, ext) = self.name_parts();
        let dir = self.dir();
        let mut at = self.now();
        loop {
            let name = format!("{stem}-{}{ext}", at.format(BACKUP_TIME_FORMAT));
            let candidate = dir.join(&name);
            let compressed = dir.join(format!("{name}{COMPRESS_SUFFIX}"));
            if !candidate.exists() && !compressed.exists() {
                return candidate;
            }
            at += Duration::milliseconds(1);
        }
    }

    fn dir(&self) -> PathBuf {
        self.path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    fn name_parts(&self) -> (String, String) {
        let stem = self
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let ext = self
            .path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        (stem, ext)
    }

    /// Existing backups, newest first.
    pub fn backups(&self) -> io::Result<Vec<(NaiveDateTime, PathBuf)>> {
        let (stem, ext) = self.name_parts();
        let prefix = format!("{stem}-");

        let mut found = Vec::new();
        for entry in fs::read_dir(self.dir())? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(rest) = name.strip_prefix(&prefix) else {
                continue;
            };
            let rest = rest.strip_suffix(COMPRESS_SUFFIX).unwrap_or(rest);
            let Some(stamp) = rest.strip_suffix(ext.as_str()) else {
                continue;
            };
            if let Ok(at) = NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT) {
                found.push((at, entry.path()));
            }
        }
        found.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(found)
    }

    fn prune(&self) -> io::Result<()> {
        let mut backups = self.backups()?;
        let mut doomed = Vec::new();

        if self.policy.max_backups > 0 && backups.len() > self.policy.max_backups {
            doomed.extend(backups.split_off(self.policy.max_backups));
        }
        if self.policy.max_age_days > 0 {
            let cutoff = self.now() - Duration::days(i64::from(self.policy.max_age_days));
            doomed.extend(backups.into_iter().filter(|(at, _)| *at < cutoff));
        }

        for (_, path) in doomed {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

impl Write for RollingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let incoming = buf.len() as u64;
        let rotated = if self.policy.max_bytes > 0
            && self.size > 0
            && self.size + incoming > self.policy.max_bytes
        {
            Some(self.rotate()?)
        } else {
            None
        };

        let file = match self.file.take() {
            Some(file) => file,
            None => open_append(&self.path)?,
        };
        let file = self.file.insert(file);
        let written = file.write(buf)?;
        self.size += written as u64;

        // The line is already in the new file; a failed cleanup must not lose it.
        if let Some(Err(err)) = rotated.map(|backup| self.tidy_backups(&backup)) {
            eprintln!(
                "[RollingFile] cleaning up after rotating {} failed: {err}",
                self.path.display()
            );
        }
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn compress(path: &Path) -> io::Result<()> {
    let mut target = path.as_os_str().to_owned();
    target.push(COMPRESS_SUFFIX);

    let mut source = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
    io::copy(&mut source, &mut encoder)?;
    encoder.finish()?;
    fs::remove_file(path)
}
