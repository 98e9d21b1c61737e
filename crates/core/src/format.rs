use chrono::format::{Item, StrftimeItems};
use chrono::{NaiveDate, NaiveDateTime};
use std::fmt::Write;
use thiserror::Error;

pub const DEFAULT_FORMAT: &str = "%Y-%m-%d %H.%M.%S";

pub const COLLISION_SEPARATOR: char = '_';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("出力フォーマットが空です")]
    Empty,
    #[error("出力フォーマットに不正な指定子があります: {0}")]
    InvalidSpecifier(String),
    #[error("出力フォーマットがパス区切り文字を生成します: {0}")]
    PathSeparator(String),
    #[error("出力フォーマットから日時を逆算できません (日付と時刻の両方が必要です): {0}")]
    NotReversible(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationFormat {
    pattern: String,
}

impl Default for DestinationFormat {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_FORMAT.to_string(),
        }
    }
}

impl DestinationFormat {
    pub fn parse(pattern: &str) -> Result<Self, FormatError> {
        if pattern.trim().is_empty() {
            return Err(FormatError::Empty);
        }
        if StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error)) {
            return Err(FormatError::InvalidSpecifier(pattern.to_string()));
        }

        let format = Self {
            pattern: pattern.to_string(),
        };
        let sample = sample_timestamp();
        let rendered = format
            .try_render(&sample)
            .ok_or_else(|| FormatError::InvalidSpecifier(pattern.to_string()))?;
        if rendered.contains(['/', '\\']) {
            return Err(FormatError::PathSeparator(pattern.to_string()));
        }
        if NaiveDateTime::parse_from_str(&rendered, pattern).is_err() {
            return Err(FormatError::NotReversible(pattern.to_string()));
        }

        Ok(format)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn render(&self, timestamp: &NaiveDateTime) -> String {
        self.try_render(timestamp).unwrap_or_default()
    }

    // Timezone specifiers (%z, %Z, %+) cannot be rendered from a naive value.
    fn try_render(&self, timestamp: &NaiveDateTime) -> Option<String> {
        let mut out = String::new();
        write!(out, "{}", timestamp.format(&self.pattern)).ok()?;
        Some(out)
    }

    pub fn parse_base_name(&self, stem: &str) -> Option<NaiveDateTime> {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(stem, &self.pattern) {
            return Some(parsed);
        }
        let (parsed, rest) = NaiveDateTime::parse_and_remainder(stem, &self.pattern).ok()?;
        rest.starts_with(COLLISION_SEPARATOR).then_some(parsed)
    }
}

fn sample_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2001, 2, 3)
        .and_then(|d| d.and_hms_milli_opt(4, 5, 6, 789))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .and_then(|v| v.and_hms_opt(h, mi, s))
            .expect("valid timestamp")
    }

    #[test]
    fn default_format_renders_dotted_time() {
        let format = DestinationFormat::default();
        assert_eq!(
            format.render(&at(2024, 3, 16, 10, 15, 20)),
            "2024-03-16 10.15.20"
        );
    }

    #[test]
    fn parse_rejects_empty_and_invalid_patterns() {
        assert_eq!(DestinationFormat::parse(""), Err(FormatError::Empty));
        assert!(matches!(
            DestinationFormat::parse("%Y-%m-%d %Q"),
            Err(FormatError::InvalidSpecifier(_))
        ));
        for tz in ["%Y-%m-%d %H.%M.%S %z", "%Y-%m-%d %H.%M.%S %Z", "%+"] {
            assert!(matches!(
                DestinationFormat::parse(tz),
                Err(FormatError::InvalidSpecifier(_))
            ));
        }
        assert!(matches!(
            DestinationFormat::parse("%D %H%M%S"),
            Err(FormatError::PathSeparator(_))
        ));
        assert!(matches!(
            DestinationFormat::parse("%Y-%m-%d"),
            Err(FormatError::NotReversible(_))
        ));
    }

    #[test]
    fn parse_accepts_compact_pattern() {
        let format = DestinationFormat::parse("%Y%m%d_%H%M%S").expect("must parse");
        assert_eq!(format.render(&at(2024, 3, 16, 10, 15, 20)), "20240316_101520");
        assert_eq!(
            format.parse_base_name("20240316_101520"),
            Some(at(2024, 3, 16, 10, 15, 20))
        );
    }

    #[test]
    fn parse_base_name_accepts_collision_suffix_only() {
        let format = DestinationFormat::default();
        let expected = Some(at(2024, 3, 16, 10, 15, 20));
        assert_eq!(format.parse_base_name("2024-03-16 10.15.20"), expected);
        assert_eq!(format.parse_base_name("2024-03-16 10.15.20_foo"), expected);
        assert_eq!(format.parse_base_name("2024-03-16 10.15.20 copy"), None);
        assert_eq!(format.parse_base_name("IMG_20240316_101520"), None);
    }
}
