use crate::apply::apply_decision;
use crate::config::{ConfigError, RenameConfig};
use crate::media::FileKind;
use crate::planner::{plan_with, PlanError, RenameAction, RenameDecision};
use crate::probe::MediaProbe;
use crate::resolver::Resolver;
use crate::walker::{walk, WalkEntry};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    Planned {
        kind: FileKind,
        decision: RenameDecision,
        applied: bool,
    },
    Unsupported {
        path: PathBuf,
    },
    Hidden {
        path: PathBuf,
    },
    Unknown {
        path: PathBuf,
    },
    Failed {
        path: PathBuf,
        reason: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub scanned: usize,
    pub photos: usize,
    pub videos: usize,
    pub unsupported: usize,
    pub hidden: usize,
    pub unknown: usize,
    pub renamed: usize,
    pub collision_renamed: usize,
    pub skipped_named: usize,
    pub skipped_no_timestamp: usize,
    pub previewed: usize,
    pub failed: usize,
}

impl BatchStats {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut stats = BatchStats {
            scanned: outcomes.len(),
            ..BatchStats::default()
        };
        for outcome in outcomes {
            match outcome {
                FileOutcome::Planned {
                    kind,
                    decision,
                    applied,
                } => {
                    match kind {
                        FileKind::Photo => stats.photos += 1,
                        FileKind::Video => stats.videos += 1,
                        FileKind::Unsupported => {}
                    }
                    match decision.action {
                        RenameAction::Rename if *applied => stats.renamed += 1,
                        RenameAction::CollisionRenamed if *applied => stats.collision_renamed += 1,
                        RenameAction::SkipAlreadyNamed => stats.skipped_named += 1,
                        RenameAction::SkipNoTimestamp => stats.skipped_no_timestamp += 1,
                        RenameAction::PreviewOnly => stats.previewed += 1,
                        _ => {}
                    }
                }
                FileOutcome::Unsupported { .. } => stats.unsupported += 1,
                FileOutcome::Hidden { .. } => stats.hidden += 1,
                FileOutcome::Unknown { .. } => stats.unknown += 1,
                FileOutcome::Failed { .. } => stats.failed += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub root: PathBuf,
    pub preview: bool,
    pub outcomes: Vec<FileOutcome>,
    pub stats: BatchStats,
}

pub fn plan_and_execute(
    directory: &Path,
    config: &RenameConfig,
    probe: &dyn MediaProbe,
) -> Result<BatchReport, ConfigError> {
    config.validate(directory)?;
    let root = fs::canonicalize(directory).map_err(|source| ConfigError::RootUnreadable {
        path: directory.to_path_buf(),
        source,
    })?;
    let entries = walk(&root, config.recursive, config.include_hidden).map_err(|source| {
        ConfigError::RootUnreadable {
            path: root.clone(),
            source,
        }
    })?;

    let resolver = Resolver::default();
    let outcomes = if config.parallel {
        group_by_directory(entries)
            .into_par_iter()
            .map(|group| {
                group
                    .into_iter()
                    .map(|entry| process_entry(entry, &resolver, config, probe))
                    .collect::<Vec<_>>()
            })
            .collect::<Vec<_>>()
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
    } else {
        entries
            .into_iter()
            .map(|entry| process_entry(entry, &resolver, config, probe))
            .collect()
    };

    let stats = BatchStats::from_outcomes(&outcomes);
    info!(
        root = %root.display(),
        scanned = stats.scanned,
        renamed = stats.renamed + stats.collision_renamed,
        failed = stats.failed,
        preview = config.preview,
        "処理が完了しました"
    );

    Ok(BatchReport {
        root,
        preview: config.preview,
        outcomes,
        stats,
    })
}

// One sequential group per directory: collision check and rename never interleave within it.
fn group_by_directory(entries: Vec<WalkEntry>) -> Vec<Vec<WalkEntry>> {
    let mut groups = Vec::<Vec<WalkEntry>>::new();
    let mut index = HashMap::<PathBuf, usize>::new();
    for entry in entries {
        let dir = entry_path(&entry)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let slot = *index.entry(dir).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(entry);
    }
    groups
}

fn entry_path(entry: &WalkEntry) -> &Path {
    match entry {
        WalkEntry::File(candidate) => &candidate.path,
        WalkEntry::Hidden(path) | WalkEntry::Unknown(path) => path,
        WalkEntry::Failed { path, .. } => path,
    }
}

fn process_entry(
    entry: WalkEntry,
    resolver: &Resolver,
    config: &RenameConfig,
    probe: &dyn MediaProbe,
) -> FileOutcome {
    let candidate = match entry {
        WalkEntry::File(candidate) => candidate,
        WalkEntry::Hidden(path) => {
            info!(path = %path.display(), "隠しファイルをスキップしました");
            return FileOutcome::Hidden { path };
        }
        WalkEntry::Unknown(path) => {
            warn!(path = %path.display(), "通常ファイルではないためスキップしました");
            return FileOutcome::Unknown { path };
        }
        WalkEntry::Failed { path, reason } => {
            error!(path = %path.display(), %reason, "エントリを読めませんでした");
            return FileOutcome::Failed { path, reason };
        }
    };

    if !config.filter.admits(&candidate) {
        info!(path = %candidate.path.display(), "対象外の形式です");
        return FileOutcome::Unsupported {
            path: candidate.path,
        };
    }

    let decision = match plan_with(resolver, &candidate, config, probe) {
        Ok(decision) => decision,
        Err(PlanError::Unsupported(path)) => {
            info!(path = %path.display(), "対象外の形式です");
            return FileOutcome::Unsupported { path };
        }
    };

    let applied = match apply_decision(&decision) {
        Ok(applied) => applied,
        Err(err) => {
            error!(
                source = %decision.source.display(),
                destination = %decision.destination.display(),
                error = %err,
                "リネームに失敗しました"
            );
            return FileOutcome::Failed {
                path: decision.source,
                reason: err.to_string(),
            };
        }
    };

    log_decision(&decision);
    FileOutcome::Planned {
        kind: candidate.kind,
        decision,
        applied,
    }
}

fn log_decision(decision: &RenameDecision) {
    let source = decision.source.display();
    let destination = decision.destination.display();
    let via = decision.timestamp.as_ref().map(|t| t.label()).unwrap_or("-");
    match decision.action {
        RenameAction::Rename => {
            info!(%source, %destination, via, outcome = "success", "リネームしました")
        }
        RenameAction::CollisionRenamed => info!(
            %source,
            %destination,
            via,
            outcome = "success",
            "名前が衝突したため元の名前を付けてリネームしました"
        ),
        RenameAction::PreviewOnly => {
            info!(%source, %destination, via, "プレビュー: リネーム予定")
        }
        RenameAction::SkipAlreadyNamed => info!(%source, "既に命名済みのためスキップしました"),
        RenameAction::SkipNoTimestamp => {
            warn!(%source, "日時を特定できないためスキップしました")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaFilter;
    use crate::probe::NativeProbe;
    use crate::resolver::tests::{at, StubProbe};
    use std::fs::File;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        File::create(path).expect("file must be creatable");
    }

    fn names(dir: &Path) -> Vec<String> {
        let mut out: Vec<String> = fs::read_dir(dir)
            .expect("read_dir")
            .map(|e| e.expect("entry").file_name().to_string_lossy().to_string())
            .collect();
        out.sort();
        out
    }

    fn planned_actions(report: &BatchReport) -> Vec<RenameAction> {
        report
            .outcomes
            .iter()
            .filter_map(|outcome| match outcome {
                FileOutcome::Planned { decision, .. } => Some(decision.action),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn second_run_skips_everything() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_20240316_101520.jpg"));
        touch(&temp.path().join("VID_20240317_080000.mp4"));
        touch(&temp.path().join("random.jpg"));

        let config = RenameConfig::default();
        let first = plan_and_execute(temp.path(), &config, &NativeProbe).expect("first run");
        assert_eq!(first.stats.renamed, 3);
        assert!(names(temp.path()).contains(&"2024-03-16 10.15.20.jpg".to_string()));
        assert!(names(temp.path()).contains(&"2024-03-17 08.00.00.mp4".to_string()));

        let second = plan_and_execute(temp.path(), &config, &NativeProbe).expect("second run");
        assert_eq!(
            planned_actions(&second),
            vec![RenameAction::SkipAlreadyNamed; 3]
        );
        assert_eq!(second.stats.renamed, 0);
    }

    #[test]
    fn preview_touches_nothing() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_20240316_101520.jpg"));
        touch(&temp.path().join("2024-03-16 10.15.20.png"));
        touch(&temp.path().join("foo.jpg"));
        let before = names(temp.path());

        let config = RenameConfig {
            preview: true,
            ..RenameConfig::default()
        };
        let probe = StubProbe {
            exif: Ok(at(2024, 3, 16, 10, 15, 20)),
            ..StubProbe::default()
        };
        let report = plan_and_execute(temp.path(), &config, &probe).expect("run");

        assert_eq!(names(temp.path()), before);
        assert_eq!(report.stats.previewed, 2);
        assert_eq!(report.stats.skipped_named, 1);
        assert!(report
            .outcomes
            .iter()
            .all(|o| !matches!(o, FileOutcome::Planned { applied: true, .. })));
    }

    #[test]
    fn collision_in_same_batch_is_disambiguated() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("a.jpg"));
        touch(&temp.path().join("b.jpg"));
        let probe = StubProbe {
            exif: Ok(at(2024, 3, 16, 10, 15, 20)),
            ..StubProbe::default()
        };

        let report =
            plan_and_execute(temp.path(), &RenameConfig::default(), &probe).expect("run");
        assert_eq!(report.stats.renamed, 1);
        assert_eq!(report.stats.collision_renamed, 1);
        assert_eq!(
            names(temp.path()),
            vec!["2024-03-16 10.15.20.jpg", "2024-03-16 10.15.20_b.jpg"]
        );
    }

    #[test]
    fn second_level_collision_fails_only_that_file() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("2024-03-16 10.15.20.jpg"));
        touch(&temp.path().join("2024-03-16 10.15.20_foo.jpg"));
        touch(&temp.path().join("foo.jpg"));
        touch(&temp.path().join("IMG_20240101_000000.jpg"));

        let probe = StubProbe {
            exif: Ok(at(2024, 3, 16, 10, 15, 20)),
            ..StubProbe::default()
        };
        let report =
            plan_and_execute(temp.path(), &RenameConfig::default(), &probe).expect("run");
        assert_eq!(report.stats.failed, 1);
        assert_eq!(report.stats.renamed, 1);
        assert!(names(temp.path()).contains(&"foo.jpg".to_string()));
        assert!(names(temp.path()).contains(&"2024-01-01 00.00.00.jpg".to_string()));
    }

    #[test]
    fn unsupported_and_filtered_files_are_reported() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("notes.txt"));
        touch(&temp.path().join("IMG_20240316_101520.jpg"));
        touch(&temp.path().join("VID_20240316_101520.mp4"));

        let config = RenameConfig {
            filter: MediaFilter {
                videos_only: true,
                ..MediaFilter::default()
            },
            ..RenameConfig::default()
        };
        let report = plan_and_execute(temp.path(), &config, &StubProbe::default()).expect("run");
        assert_eq!(report.stats.unsupported, 2);
        assert_eq!(report.stats.videos, 1);
        assert_eq!(report.stats.renamed, 1);
        assert!(names(temp.path()).contains(&"IMG_20240316_101520.jpg".to_string()));
    }

    #[test]
    fn invalid_configuration_aborts_before_touching_files() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_20240316_101520.jpg"));
        let config = RenameConfig {
            filter: MediaFilter {
                extensions: vec!["docx".to_string()],
                ..MediaFilter::default()
            },
            ..RenameConfig::default()
        };

        let err = plan_and_execute(temp.path(), &config, &NativeProbe).expect_err("must fail");
        assert!(matches!(err, ConfigError::UnsupportedExtension(_)));
        assert_eq!(names(temp.path()), vec!["IMG_20240316_101520.jpg"]);

        assert!(matches!(
            plan_and_execute(&temp.path().join("missing"), &RenameConfig::default(), &NativeProbe),
            Err(ConfigError::RootMissing(_))
        ));
    }

    #[test]
    fn recursive_parallel_run_renames_every_directory() {
        let temp = tempdir().expect("tempdir");
        touch(&temp.path().join("IMG_20240316_101520.jpg"));
        touch(&temp.path().join("day1/IMG_20240316_101520.jpg"));
        touch(&temp.path().join("day1/IMG_20240316_101520_1.jpg"));
        touch(&temp.path().join("day2/VID_20240318_120000.mp4"));

        let config = RenameConfig {
            recursive: true,
            parallel: true,
            ..RenameConfig::default()
        };
        let report =
            plan_and_execute(temp.path(), &config, &StubProbe::default()).expect("run");
        assert_eq!(report.stats.scanned, 4);
        assert_eq!(report.stats.renamed + report.stats.collision_renamed, 4);
        assert_eq!(
            names(&temp.path().join("day1")),
            vec![
                "2024-03-16 10.15.20.jpg",
                "2024-03-16 10.15.20_IMG_20240316_101520_1.jpg"
            ]
        );
        assert_eq!(
            names(&temp.path().join("day2")),
            vec!["2024-03-18 12.00.00.mp4"]
        );
    }

    #[test]
    fn stats_count_every_outcome_kind() {
        let outcomes = vec![
            FileOutcome::Unsupported {
                path: PathBuf::from("a.txt"),
            },
            FileOutcome::Hidden {
                path: PathBuf::from(".b"),
            },
            FileOutcome::Unknown {
                path: PathBuf::from("c"),
            },
            FileOutcome::Failed {
                path: PathBuf::from("d.jpg"),
                reason: "boom".to_string(),
            },
        ];
        let stats = BatchStats::from_outcomes(&outcomes);
        assert_eq!(stats.scanned, 4);
        assert_eq!(stats.unsupported, 1);
        assert_eq!(stats.hidden, 1);
        assert_eq!(stats.unknown, 1);
        assert_eq!(stats.failed, 1);
    }
}
