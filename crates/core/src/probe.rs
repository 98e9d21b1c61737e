use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use exif::{In, Reader, Tag, Value};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupMiss {
    #[error("値がありません")]
    Absent,
    #[error("値を解釈できません: {0}")]
    Malformed(String),
}

pub type Lookup<T> = Result<T, LookupMiss>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTimes {
    pub modified: Option<i64>,
    pub changed: Option<i64>,
    pub created: Option<i64>,
}

impl FileTimes {
    pub fn read(path: &Path) -> Lookup<Self> {
        let meta =
            fs::metadata(path).map_err(|err| LookupMiss::Malformed(format!("stat: {err}")))?;
        Ok(Self {
            modified: meta.modified().ok().and_then(system_time_to_epoch),
            changed: changed_epoch(&meta),
            created: meta.created().ok().and_then(system_time_to_epoch),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.modified.is_none() && self.changed.is_none() && self.created.is_none()
    }
}

#[cfg(unix)]
fn changed_epoch(meta: &fs::Metadata) -> Option<i64> {
    use std::os::unix::fs::MetadataExt;
    Some(meta.ctime())
}

#[cfg(not(unix))]
fn changed_epoch(_meta: &fs::Metadata) -> Option<i64> {
    None
}

fn system_time_to_epoch(time: SystemTime) -> Option<i64> {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).ok(),
        Err(before) => i64::try_from(before.duration().as_secs()).ok().map(|s| -s),
    }
}

pub trait MediaProbe: Sync {
    fn exif_capture_time(&self, path: &Path) -> Lookup<NaiveDateTime>;
    // UTC; may return the 1904 sentinel.
    fn container_creation_time(&self, path: &Path) -> Lookup<NaiveDateTime>;
    fn file_times(&self, path: &Path) -> Lookup<FileTimes>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NativeProbe;

impl MediaProbe for NativeProbe {
    fn exif_capture_time(&self, path: &Path) -> Lookup<NaiveDateTime> {
        read_exif_original(path)
    }

    fn container_creation_time(&self, path: &Path) -> Lookup<NaiveDateTime> {
        read_container_creation(path)
    }

    fn file_times(&self, path: &Path) -> Lookup<FileTimes> {
        FileTimes::read(path)
    }
}

fn read_exif_original(path: &Path) -> Lookup<NaiveDateTime> {
    let file = File::open(path).map_err(|err| LookupMiss::Malformed(err.to_string()))?;
    let mut buf = BufReader::new(file);
    let exif = match Reader::new().read_from_container(&mut buf) {
        Ok(exif) => exif,
        Err(exif::Error::NotFound(_)) => return Err(LookupMiss::Absent),
        Err(err) => return Err(LookupMiss::Malformed(err.to_string())),
    };

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or(LookupMiss::Absent)?;
    let raw = match &field.value {
        Value::Ascii(values) => values
            .first()
            .map(|bytes| String::from_utf8_lossy(bytes).to_string())
            .ok_or(LookupMiss::Absent)?,
        _ => field.display_value().to_string(),
    };
    parse_exif_datetime(&raw)
}

pub(crate) fn parse_exif_datetime(raw: &str) -> Lookup<NaiveDateTime> {
    let cleaned = raw.trim().trim_matches(|c: char| c == '"' || c == '\0');
    if cleaned.is_empty() {
        return Err(LookupMiss::Absent);
    }
    NaiveDateTime::parse_from_str(cleaned, "%Y:%m:%d %H:%M:%S")
        .map_err(|_| LookupMiss::Malformed(cleaned.to_string()))
}

fn read_container_creation(path: &Path) -> Lookup<NaiveDateTime> {
    let file = File::open(path).map_err(|err| LookupMiss::Malformed(err.to_string()))?;
    let size = file
        .metadata()
        .map_err(|err| LookupMiss::Malformed(err.to_string()))?
        .len();
    let reader = BufReader::new(file);
    let mp4 = mp4::Mp4Reader::read_header(reader, size)
        .map_err(|err| LookupMiss::Malformed(err.to_string()))?;
    container_seconds_to_utc(mp4.moov.mvhd.creation_time)
}

pub fn container_epoch() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1904, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

pub(crate) fn container_seconds_to_utc(seconds: u64) -> Lookup<NaiveDateTime> {
    let seconds = i64::try_from(seconds).map_err(|_| LookupMiss::Malformed(seconds.to_string()))?;
    TimeDelta::try_seconds(seconds)
        .and_then(|delta| container_epoch().checked_add_signed(delta))
        .ok_or_else(|| LookupMiss::Malformed(seconds.to_string()))
}

pub(crate) fn epoch_to_utc(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(epoch, 0)
}
