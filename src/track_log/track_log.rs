use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::error::TrackLogError;
use super::rows::{RawRow, RawRows};
use super::TrackStore;
use crate::fix::{Fix, GeoPoint, CSV_HEADER};

/// Append-only CSV log of fixes for one session.
///
/// Mutations (`append`, `clear`) are serialized by a single writer lock.
/// Readers take no lock: every row is written with one `write_all` call on an
/// append-mode handle, and the row iterator never yields an unterminated line.
pub struct TrackLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TrackLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, writing the header first if the log is empty.
    pub fn append(&self, fix: &Fix) -> Result<(), TrackLogError> {
        let _guard = self.write_lock.lock().unwrap();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| TrackLogError::io(parent, e))?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| TrackLogError::io(&self.path, e))?;
        let len = drop_torn_tail(&mut file).map_err(|e| TrackLogError::io(&self.path, e))?;

        let mut chunk = String::new();
        if len == 0 {
            chunk.push_str(CSV_HEADER);
            chunk.push('\n');
        }
        chunk.push_str(&fix.to_record());
        chunk.push('\n');

        file.write_all(chunk.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|e| TrackLogError::io(&self.path, e))
    }

    /// Empties the log. The next append rewrites the header.
    ///
    /// The file is unlinked rather than truncated in place, so a reader that
    /// already opened it keeps reading its old, complete contents.
    pub fn clear(&self) -> Result<(), TrackLogError> {
        let _guard = self.write_lock.lock().unwrap();

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(TrackLogError::io(&self.path, e)),
        }
        log::info!("Cleared track log {}", self.path.display());
        Ok(())
    }

    /// Data rows in persisted order. A missing log has no rows; any other
    /// failure to open it is an error.
    pub fn try_rows(&self) -> Result<RawRows, TrackLogError> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(RawRows::empty()),
            Err(e) => return Err(TrackLogError::io(&self.path, e)),
        };
        let len = file
            .metadata()
            .map_err(|e| TrackLogError::io(&self.path, e))?
            .len();
        Ok(RawRows::open(file, len))
    }

    /// Like `try_rows`, but degrades to an empty sequence on failure.
    pub fn rows(&self) -> RawRows {
        self.try_rows().unwrap_or_else(|e| {
            log::warn!("Failed to read track log: {}", e);
            RawRows::empty()
        })
    }

    /// Well-formed fixes in persisted order; malformed rows are passed over.
    pub fn fixes(&self) -> impl Iterator<Item = Fix> {
        self.rows().filter_map(|row| row.to_fix())
    }

    /// Positions of all rows with readable coordinates, including rows whose
    /// time or altitude doesn't parse.
    pub fn points(&self) -> impl Iterator<Item = GeoPoint> {
        self.rows().filter_map(|row| row.geo_point())
    }

    pub fn last_record(&self) -> Option<RawRow> {
        self.rows().last()
    }

    pub fn is_empty(&self) -> bool {
        self.rows().next().is_none()
    }

    /// Whole file as text, header included. `None` if there is no log yet.
    pub fn contents(&self) -> Result<Option<String>, TrackLogError> {
        match fs::read_to_string(&self.path) {
            Ok(s) if s.is_empty() => Ok(None),
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TrackLogError::io(&self.path, e)),
        }
    }
}

/// Cuts the file back to its last line terminator, discarding the fragment
/// left by a write that failed part-way. Returns the resulting length.
fn drop_torn_tail(file: &mut File) -> io::Result<u64> {
    const CHUNK: u64 = 4096;

    let len = file.metadata()?.len();
    let mut end = len;
    let mut buf = vec![0u8; CHUNK as usize];

    while end > 0 {
        let start = end.saturating_sub(CHUNK);
        let chunk = &mut buf[..(end - start) as usize];
        file.seek(SeekFrom::Start(start))?;
        file.read_exact(chunk)?;

        if end == len && chunk.last() == Some(&b'\n') {
            return Ok(len);
        }
        if let Some(pos) = chunk.iter().rposition(|&b| b == b'\n') {
            let keep = start + pos as u64 + 1;
            log::warn!("Discarding {} bytes of unterminated row", len - keep);
            file.set_len(keep)?;
            return Ok(keep);
        }
        end = start;
    }

    if len > 0 {
        log::warn!("Discarding {} bytes of unterminated row", len);
        file.set_len(0)?;
    }
    Ok(0)
}

impl TrackStore for TrackLog {
    fn append(&self, fix: &Fix) -> Result<(), TrackLogError> {
        TrackLog::append(self, fix)
    }

    fn last_record(&self) -> Option<RawRow> {
        TrackLog::last_record(self)
    }
}
