use crate::format::{DestinationFormat, FormatError, DEFAULT_FORMAT};
use crate::media::MediaFilter;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_FILENAME_HOUR_OFFSET: i64 = 48;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("対象フォルダが存在しません: {0}")]
    RootMissing(PathBuf),
    #[error("対象パスがフォルダではありません: {0}")]
    RootNotDirectory(PathBuf),
    #[error("対象フォルダを読めませんでした: {path}")]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("未対応の拡張子が指定されました: {0}")]
    UnsupportedExtension(String),
    #[error("時差の指定が範囲外です (±{MAX_FILENAME_HOUR_OFFSET} 時間まで): {0}")]
    HourOffsetOutOfRange(i64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConfig {
    pub format: DestinationFormat,
    pub recursive: bool,
    pub include_hidden: bool,
    pub filter: MediaFilter,
    pub extract_from_filename: bool,
    pub force: bool,
    pub filename_hour_offset: i64,
    pub preview: bool,
    pub parallel: bool,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self {
            format: DestinationFormat::default(),
            recursive: false,
            include_hidden: false,
            filter: MediaFilter::default(),
            extract_from_filename: true,
            force: false,
            filename_hour_offset: 0,
            preview: false,
            parallel: false,
        }
    }
}

impl RenameConfig {
    pub fn validate(&self, root: &Path) -> Result<(), ConfigError> {
        if let Some(ext) = self.filter.unknown_extension() {
            return Err(ConfigError::UnsupportedExtension(ext.to_string()));
        }
        let offset = self.filename_hour_offset;
        if !(-MAX_FILENAME_HOUR_OFFSET..=MAX_FILENAME_HOUR_OFFSET).contains(&offset) {
            return Err(ConfigError::HourOffsetOutOfRange(offset));
        }
        if !root.exists() {
            return Err(ConfigError::RootMissing(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root.to_path_buf()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub format: String,
    pub recursive_default: bool,
    pub include_hidden_default: bool,
    pub extract_from_filename: bool,
    pub filename_hour_offset: i64,
    pub images_only: bool,
    pub videos_only: bool,
    pub extensions: Vec<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            format: DEFAULT_FORMAT.to_string(),
            recursive_default: false,
            include_hidden_default: false,
            extract_from_filename: true,
            filename_hour_offset: 0,
            images_only: false,
            videos_only: false,
            extensions: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn to_rename_config(&self) -> Result<RenameConfig, ConfigError> {
        Ok(RenameConfig {
            format: DestinationFormat::parse(&self.format)?,
            recursive: self.recursive_default,
            include_hidden: self.include_hidden_default,
            filter: MediaFilter {
                images_only: self.images_only,
                videos_only: self.videos_only,
                extensions: self.extensions.clone(),
            },
            extract_from_filename: self.extract_from_filename,
            filename_hour_offset: self.filename_hour_offset,
            ..RenameConfig::default()
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "autoname", "autoname")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

pub fn load_config() -> Result<AppConfig> {
    load_config_from(&app_paths()?.config_path)
}

pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }

    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;

    let config = toml::from_str::<AppConfig>(&raw).context("設定ファイルのパースに失敗しました")?;
    Ok(config)
}

pub fn save_config(config: &AppConfig) -> Result<()> {
    save_config_to(config, &app_paths()?.config_path)
}

pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("設定ディレクトリを作成できませんでした: {}", dir.display())
        })?;
    }
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    fs::write(path, body)
        .with_context(|| format!("設定ファイルを書き込めませんでした: {}", path.display()))?;
    Ok(())
}
