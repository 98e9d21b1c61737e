use crate::planner::RenameDecision;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("リネーム先が既に存在します: {0}")]
    DestinationExists(PathBuf),
    #[error("リネームに失敗しました: {from} -> {to}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

// Re-stat the destination; a file that appeared since planning is reported, never overwritten.
pub fn apply_decision(decision: &RenameDecision) -> Result<bool, ApplyError> {
    if !decision.action.renames() {
        return Ok(false);
    }

    if decision.destination.exists() {
        return Err(ApplyError::DestinationExists(decision.destination.clone()));
    }

    fs::rename(&decision.source, &decision.destination).map_err(|source| ApplyError::Rename {
        from: decision.source.clone(),
        to: decision.destination.clone(),
        source,
    })?;
    Ok(true)
}
