use crate::config::RenameConfig;
use crate::filename::timestamp_from_filename;
use crate::media::{FileCandidate, FileKind};
use crate::probe::{epoch_to_utc, MediaProbe};
use chrono::{Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileAttribute {
    Modified,
    Changed,
    Created,
    FilenamePattern,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TimestampSource {
    FilenamePattern(NaiveDateTime),
    EmbeddedMetadataExif(NaiveDateTime),
    EmbeddedMetadataContainer(NaiveDateTime),
    FilesystemAttribute {
        timestamp: NaiveDateTime,
        attribute: FileAttribute,
    },
}

impl TimestampSource {
    pub fn timestamp(&self) -> NaiveDateTime {
        match self {
            TimestampSource::FilenamePattern(ts)
            | TimestampSource::EmbeddedMetadataExif(ts)
            | TimestampSource::EmbeddedMetadataContainer(ts) => *ts,
            TimestampSource::FilesystemAttribute { timestamp, .. } => *timestamp,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimestampSource::FilenamePattern(_) => "filename",
            TimestampSource::EmbeddedMetadataExif(_) => "exif",
            TimestampSource::EmbeddedMetadataContainer(_) => "container",
            TimestampSource::FilesystemAttribute { attribute, .. } => match attribute {
                FileAttribute::Modified => "fs-modified",
                FileAttribute::Changed => "fs-changed",
                FileAttribute::Created => "fs-created",
                FileAttribute::FilenamePattern => "fs-filename",
            },
        }
    }
}

pub struct ResolveContext<'a> {
    pub candidate: &'a FileCandidate,
    pub config: &'a RenameConfig,
    pub probe: &'a dyn MediaProbe,
}

pub trait TimestampStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource>;
}

pub struct FilenamePatternStrategy;

impl TimestampStrategy for FilenamePatternStrategy {
    fn name(&self) -> &'static str {
        "filename"
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource> {
        if !ctx.config.extract_from_filename {
            return None;
        }
        timestamp_from_filename(&ctx.candidate.stem(), ctx.config.filename_hour_offset)
            .map(TimestampSource::FilenamePattern)
    }
}

pub struct ExifStrategy;

impl TimestampStrategy for ExifStrategy {
    fn name(&self) -> &'static str {
        "exif"
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource> {
        if ctx.candidate.kind != FileKind::Photo {
            return None;
        }
        match ctx.probe.exif_capture_time(&ctx.candidate.path) {
            Ok(ts) => Some(TimestampSource::EmbeddedMetadataExif(ts)),
            Err(miss) => {
                debug!(path = %ctx.candidate.path.display(), reason = %miss, "EXIF撮影日時なし");
                None
            }
        }
    }
}

pub struct ContainerStrategy;

impl TimestampStrategy for ContainerStrategy {
    fn name(&self) -> &'static str {
        "container"
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource> {
        let utc = match ctx.probe.container_creation_time(&ctx.candidate.path) {
            Ok(utc) => utc.and_utc(),
            Err(miss) => {
                debug!(path = %ctx.candidate.path.display(), reason = %miss, "コンテナ作成日時なし");
                return None;
            }
        };
        // 1904 sentinel and other pre-epoch placeholders mean "unknown".
        if utc.timestamp() <= 0 {
            debug!(path = %ctx.candidate.path.display(), value = %utc, "コンテナ作成日時がプレースホルダです");
            return None;
        }
        Some(TimestampSource::EmbeddedMetadataContainer(
            utc.with_timezone(&Local).naive_local(),
        ))
    }
}

pub struct FilesystemStrategy;

impl TimestampStrategy for FilesystemStrategy {
    fn name(&self) -> &'static str {
        "filesystem"
    }

    fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource> {
        let mut candidates = Vec::with_capacity(4);
        match ctx.probe.file_times(&ctx.candidate.path) {
            Ok(times) => {
                candidates.extend(times.modified.map(|v| (v, FileAttribute::Modified)));
                candidates.extend(times.changed.map(|v| (v, FileAttribute::Changed)));
                candidates.extend(times.created.map(|v| (v, FileAttribute::Created)));
            }
            Err(miss) => {
                debug!(path = %ctx.candidate.path.display(), reason = %miss, "ファイル時刻を取得できません");
            }
        }

        if !ctx.config.extract_from_filename {
            let from_name =
                timestamp_from_filename(&ctx.candidate.stem(), ctx.config.filename_hour_offset)
                    .and_then(|ts| Local.from_local_datetime(&ts).earliest())
                    .map(|local| local.timestamp());
            candidates.extend(from_name.map(|v| (v, FileAttribute::FilenamePattern)));
        }

        let (epoch, attribute) = earliest_epoch(&candidates)?;
        let timestamp = epoch_to_utc(epoch)?.with_timezone(&Local).naive_local();
        Some(TimestampSource::FilesystemAttribute {
            timestamp,
            attribute,
        })
    }
}

// Copies and edits only ever move these forward.
pub fn earliest_epoch(candidates: &[(i64, FileAttribute)]) -> Option<(i64, FileAttribute)> {
    candidates.iter().copied().min_by_key(|(epoch, _)| *epoch)
}

pub struct Resolver {
    strategies: Vec<Box<dyn TimestampStrategy>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::with_strategies(vec![
            Box::new(FilenamePatternStrategy),
            Box::new(ExifStrategy),
            Box::new(ContainerStrategy),
            Box::new(FilesystemStrategy),
        ])
    }
}

impl Resolver {
    pub fn with_strategies(strategies: Vec<Box<dyn TimestampStrategy>>) -> Self {
        Self { strategies }
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub fn resolve(&self, ctx: &ResolveContext<'_>) -> Option<TimestampSource> {
        self.strategies.iter().find_map(|strategy| {
            let found = strategy.resolve(ctx);
            if let Some(source) = &found {
                debug!(
                    path = %ctx.candidate.path.display(),
                    strategy = strategy.name(),
                    timestamp = %source.timestamp(),
                    "日時を決定しました"
                );
            }
            found
        })
    }
}
