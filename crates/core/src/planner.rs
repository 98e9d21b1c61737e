use crate::config::RenameConfig;
use crate::format::COLLISION_SEPARATOR;
use crate::media::{FileCandidate, FileKind};
use crate::probe::MediaProbe;
use crate::resolver::{ResolveContext, Resolver, TimestampSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RenameAction {
    Rename,
    SkipAlreadyNamed,
    SkipNoTimestamp,
    CollisionRenamed,
    PreviewOnly,
}

impl RenameAction {
    pub fn renames(self) -> bool {
        matches!(self, RenameAction::Rename | RenameAction::CollisionRenamed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameDecision {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub action: RenameAction,
    pub timestamp: Option<TimestampSource>,
}

impl RenameDecision {
    fn unchanged(file: &FileCandidate, action: RenameAction, timestamp: Option<TimestampSource>) -> Self {
        Self {
            source: file.path.clone(),
            destination: file.path.clone(),
            action,
            timestamp,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("未対応のファイル形式です: {0}")]
    Unsupported(PathBuf),
}

pub fn plan(
    file: &FileCandidate,
    config: &RenameConfig,
    probe: &dyn MediaProbe,
) -> Result<RenameDecision, PlanError> {
    plan_with(&Resolver::default(), file, config, probe)
}

pub fn plan_with(
    resolver: &Resolver,
    file: &FileCandidate,
    config: &RenameConfig,
    probe: &dyn MediaProbe,
) -> Result<RenameDecision, PlanError> {
    if file.kind == FileKind::Unsupported {
        return Err(PlanError::Unsupported(file.path.clone()));
    }

    let stem = file.stem();
    if !config.force && config.format.parse_base_name(&stem).is_some() {
        return Ok(RenameDecision::unchanged(
            file,
            RenameAction::SkipAlreadyNamed,
            None,
        ));
    }

    let ctx = ResolveContext {
        candidate: file,
        config,
        probe,
    };
    let Some(source) = resolver.resolve(&ctx) else {
        return Ok(RenameDecision::unchanged(
            file,
            RenameAction::SkipNoTimestamp,
            None,
        ));
    };

    let date_taken = config.format.render(&source.timestamp());
    let extension = file.original_extension();
    let parent = file.parent();
    let destination = parent.join(format!("{}{}", date_taken, extension));

    if destination == file.path || stem.starts_with(&date_taken) {
        return Ok(RenameDecision::unchanged(
            file,
            RenameAction::SkipAlreadyNamed,
            Some(source),
        ));
    }

    if config.preview {
        return Ok(RenameDecision {
            source: file.path.clone(),
            destination,
            action: RenameAction::PreviewOnly,
            timestamp: Some(source),
        });
    }

    if destination.exists() {
        let disambiguated = parent.join(format!(
            "{}{}{}{}",
            date_taken, COLLISION_SEPARATOR, stem, extension
        ));
        return Ok(RenameDecision {
            source: file.path.clone(),
            destination: disambiguated,
            action: RenameAction::CollisionRenamed,
            timestamp: Some(source),
        });
    }

    Ok(RenameDecision {
        source: file.path.clone(),
        destination,
        action: RenameAction::Rename,
        timestamp: Some(source),
    })
}
