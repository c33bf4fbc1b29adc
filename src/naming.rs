//! Output naming and timestamp rendering.
//!
//! Every codec derives its output name the same way:
//! `trim_trailing_slash(input) [+ "_" + timestamp] + "." + suffix`.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::JczError;

/// Timestamp segment inserted into output names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum TimestampOption {
    #[default]
    None,
    /// `YYYYMMDD`
    Date,
    /// `YYYYMMDD_HHMMSS`
    DateTime,
    /// `YYYYMMDD_HHMMSS_NNNNNNNNN`
    HighRes,
}

impl TimestampOption {
    /// Renders the timestamp segment for `now`, or `None` when no
    /// timestamp is requested.
    pub fn render(self, now: &DateTime<Local>) -> Option<String> {
        let format = match self {
            TimestampOption::None => return None,
            TimestampOption::Date => "%Y%m%d",
            TimestampOption::DateTime => "%Y%m%d_%H%M%S",
            TimestampOption::HighRes => "%Y%m%d_%H%M%S_%9f",
        };
        Some(now.format(format).to_string())
    }

    /// Only high-resolution timestamps keep same-named files apart once
    /// they land in one directory.
    pub fn disambiguates(self) -> bool {
        self == TimestampOption::HighRes
    }
}

impl TryFrom<i64> for TimestampOption {
    type Error = JczError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TimestampOption::None),
            1 => Ok(TimestampOption::Date),
            2 => Ok(TimestampOption::DateTime),
            3 => Ok(TimestampOption::HighRes),
            other => Err(JczError::InvalidTimestampOption(other)),
        }
    }
}

impl From<TimestampOption> for i64 {
    fn from(option: TimestampOption) -> Self {
        match option {
            TimestampOption::None => 0,
            TimestampOption::Date => 1,
            TimestampOption::DateTime => 2,
            TimestampOption::HighRes => 3,
        }
    }
}

impl fmt::Display for TimestampOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimestampOption::None => "none",
            TimestampOption::Date => "date",
            TimestampOption::DateTime => "datetime",
            TimestampOption::HighRes => "highres",
        };
        f.write_str(name)
    }
}

/// Removes a trailing path separator, so `dir/` names `dir.tar`, not `dir/.tar`.
pub fn trim_trailing_slash(path: &Path) -> PathBuf {
    path.components().collect()
}

/// Computes the output name for `input` compressed by a codec with `suffix`.
pub fn output_name(input: &Path, suffix: &str, option: TimestampOption) -> PathBuf {
    output_name_at(input, suffix, option, &Local::now())
}

pub(crate) fn output_name_at(
    input: &Path,
    suffix: &str,
    option: TimestampOption,
    now: &DateTime<Local>,
) -> PathBuf {
    let mut name: OsString = trim_trailing_slash(input).into_os_string();
    if let Some(ts) = option.render(now) {
        name.push("_");
        name.push(ts);
    }
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}

/// Inverse of [`output_name`] without the timestamp: strips `.suffix` from
/// the file name. Returns `None` when the name does not end in the dotted
/// suffix or nothing would remain.
pub fn strip_suffix(input: &Path, suffix: &str) -> Option<PathBuf> {
    if input.extension()? != OsStr::new(suffix) {
        return None;
    }
    Some(input.with_file_name(input.file_stem()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 7, 9, 5, 2)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn test_render_is_zero_padded() {
        let now = fixed_now();
        assert_eq!(TimestampOption::None.render(&now), None);
        assert_eq!(TimestampOption::Date.render(&now).unwrap(), "20240307");
        assert_eq!(
            TimestampOption::DateTime.render(&now).unwrap(),
            "20240307_090502"
        );
        let highres = TimestampOption::HighRes.render(&now).unwrap();
        assert!(highres.starts_with("20240307_090502_"));
        assert_eq!(highres.len(), "20240307_090502_".len() + 9);
    }

    #[test]
    fn test_output_name_without_timestamp() {
        let name = output_name(Path::new("f"), "gz", TimestampOption::None);
        assert_eq!(name, PathBuf::from("f.gz"));
    }

    #[test]
    fn test_output_name_with_date() {
        let name = output_name_at(Path::new("f"), "gz", TimestampOption::Date, &fixed_now());
        assert_eq!(name, PathBuf::from("f_20240307.gz"));

        let name = output_name(Path::new("f"), "gz", TimestampOption::Date);
        let name = name.to_str().unwrap();
        let digits = name
            .strip_prefix("f_")
            .and_then(|s| s.strip_suffix(".gz"))
            .unwrap();
        assert!(!digits.is_empty());
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_output_name_trims_trailing_slash() {
        let name = output_name(Path::new("some/dir/"), "tar", TimestampOption::None);
        assert_eq!(name, PathBuf::from("some/dir.tar"));
    }

    #[test]
    fn test_strip_suffix() {
        assert_eq!(
            strip_suffix(Path::new("a/x.tar.gz"), "gz"),
            Some(PathBuf::from("a/x.tar"))
        );
        assert_eq!(strip_suffix(Path::new("x.tar"), "tar"), Some(PathBuf::from("x")));
        assert_eq!(strip_suffix(Path::new("xgz"), "gz"), None);
        assert_eq!(strip_suffix(Path::new(".gz"), "gz"), None);
        assert_eq!(strip_suffix(Path::new("x.tgz"), "gz"), None);
    }

    #[cfg(unix)]
    #[test]
    fn test_strip_suffix_non_utf8_name() {
        use std::os::unix::ffi::OsStrExt;

        let input = Path::new(OsStr::from_bytes(b"caf\xff.tar.gz"));
        let expected = PathBuf::from(OsStr::from_bytes(b"caf\xff.tar"));
        assert_eq!(strip_suffix(input, "gz"), Some(expected));
    }

    #[test]
    fn test_timestamp_option_from_raw() {
        assert_eq!(TimestampOption::try_from(0).unwrap(), TimestampOption::None);
        assert_eq!(TimestampOption::try_from(3).unwrap(), TimestampOption::HighRes);
        assert!(matches!(
            TimestampOption::try_from(4),
            Err(JczError::InvalidTimestampOption(4))
        ));
        assert!(TimestampOption::try_from(-1).is_err());
    }
}
