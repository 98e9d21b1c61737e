mod apply;
mod batch;
mod config;
mod filename;
mod format;
mod media;
mod planner;
mod probe;
mod resolver;
mod walker;

pub use apply::{apply_decision, ApplyError};
pub use batch::{plan_and_execute, BatchReport, BatchStats, FileOutcome};
pub use config::{
    app_paths, load_config, load_config_from, save_config, save_config_to, AppConfig, AppPaths,
    ConfigError, RenameConfig, MAX_FILENAME_HOUR_OFFSET,
};
pub use filename::timestamp_from_filename;
pub use format::{DestinationFormat, FormatError, DEFAULT_FORMAT};
pub use media::{FileCandidate, FileKind, MediaFilter, PHOTO_EXTENSIONS, VIDEO_EXTENSIONS};
pub use planner::{plan, plan_with, PlanError, RenameAction, RenameDecision};
pub use probe::{FileTimes, Lookup, LookupMiss, MediaProbe, NativeProbe};
pub use resolver::{
    earliest_epoch, ContainerStrategy, ExifStrategy, FileAttribute, FilenamePatternStrategy,
    FilesystemStrategy, ResolveContext, Resolver, TimestampSource, TimestampStrategy,
};
pub use walker::{walk, WalkEntry};
