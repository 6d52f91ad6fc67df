use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where a dataset's bytes live, or why they cannot be fetched.
///
/// Only [`Locator::LocalPath`] ever yields data. The other variants record
/// sources that need a manual download, sit behind access restrictions, or
/// would require a network fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Locator {
    LocalPath { path: PathBuf },
    ManualOnly { hint: String },
    RestrictedOnly { note: String },
    Remote { url: String },
}

impl Locator {
    pub const MANUAL_PREFIX: &'static str = "manual:";
    pub const RESTRICTED_PREFIX: &'static str = "restricted:";

    /// Parse a raw locator string from the source registry or config.
    ///
    /// ```
    /// use bhd_model::Locator;
    ///
    /// assert!(matches!(Locator::parse("manual:https://example.org"), Locator::ManualOnly { .. }));
    /// assert!(matches!(Locator::parse("https://example.org/x.csv"), Locator::Remote { .. }));
    /// assert!(Locator::parse("mat/annual.csv").is_local());
    /// ```
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if let Some(hint) = raw.strip_prefix(Self::MANUAL_PREFIX) {
            return Self::ManualOnly {
                hint: hint.trim().to_string(),
            };
        }
        if let Some(note) = raw.strip_prefix(Self::RESTRICTED_PREFIX) {
            return Self::RestrictedOnly {
                note: note.trim().to_string(),
            };
        }
        let lower = raw.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Self::Remote {
                url: raw.to_string(),
            };
        }
        Self::LocalPath {
            path: PathBuf::from(raw),
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::LocalPath { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            Self::LocalPath { .. } => "local",
            Self::ManualOnly { .. } => "manual",
            Self::RestrictedOnly { .. } => "restricted",
            Self::Remote { .. } => "remote",
        }
    }

    /// Resolve a relative local path against `base`. Other variants are unchanged.
    pub fn resolve(&self, base: &Path) -> Self {
        match self {
            Self::LocalPath { path } if path.is_relative() => Self::LocalPath {
                path: base.join(path),
            },
            other => other.clone(),
        }
    }

    /// The text after the kind prefix (path, hint, note or URL).
    pub fn location(&self) -> String {
        match self {
            Self::LocalPath { path } => path.display().to_string(),
            Self::ManualOnly { hint } => hint.clone(),
            Self::RestrictedOnly { note } => note.clone(),
            Self::Remote { url } => url.clone(),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LocalPath { path } => write!(f, "{}", path.display()),
            Self::ManualOnly { hint } => write!(f, "{}{hint}", Self::MANUAL_PREFIX),
            Self::RestrictedOnly { note } => write!(f, "{}{note}", Self::RESTRICTED_PREFIX),
            Self::Remote { url } => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_kind() {
        assert_eq!(
            Locator::parse("manual:https://www.hudexchange.info/"),
            Locator::ManualOnly {
                hint: "https://www.hudexchange.info/".to_string()
            }
        );
        assert_eq!(
            Locator::parse("restricted: CHIS confidential file"),
            Locator::RestrictedOnly {
                note: "CHIS confidential file".to_string()
            }
        );
        assert_eq!(Locator::parse("HTTPS://x.org/a.csv").kind_label(), "remote");
        assert_eq!(
            Locator::parse("abgar/appeals.csv"),
            Locator::LocalPath {
                path: PathBuf::from("abgar/appeals.csv")
            }
        );
    }

    #[test]
    fn resolves_relative_paths_only() {
        let base = Path::new("/data/downloads");
        let local = Locator::parse("mat/annual.csv").resolve(base);
        assert_eq!(
            local,
            Locator::LocalPath {
                path: PathBuf::from("/data/downloads/mat/annual.csv")
            }
        );
        let manual = Locator::parse("manual:https://example.org");
        assert_eq!(manual.resolve(base), manual);
    }

    #[test]
    fn display_round_trips_through_parse() {
        for raw in [
            "manual:https://example.org",
            "restricted:ask the county",
            "https://example.org/a.csv",
            "tobacco/data.csv",
        ] {
            assert_eq!(Locator::parse(&Locator::parse(raw).to_string()).to_string(), raw);
        }
    }
}
