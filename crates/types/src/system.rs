//! Classification systems and result sources.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the classification systems served by the terminology backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerminologySystem {
    Ayurveda,
    Siddha,
    Unani,
    Icd11,
}

impl TerminologySystem {
    /// All systems, ICD-11 last.
    pub const ALL: [TerminologySystem; 4] = [
        TerminologySystem::Ayurveda,
        TerminologySystem::Siddha,
        TerminologySystem::Unani,
        TerminologySystem::Icd11,
    ];

    /// The three traditional medicine systems.
    pub const TRADITIONAL: [TerminologySystem; 3] = [
        TerminologySystem::Ayurveda,
        TerminologySystem::Siddha,
        TerminologySystem::Unani,
    ];

    /// Path segment used by the backend (`/terminologies/{slug}/...`).
    pub fn slug(self) -> &'static str {
        match self {
            Self::Ayurveda => "ayurveda",
            Self::Siddha => "siddha",
            Self::Unani => "unani",
            Self::Icd11 => "icd11",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Ayurveda => "Ayurveda",
            Self::Siddha => "Siddha",
            Self::Unani => "Unani",
            Self::Icd11 => "ICD-11",
        }
    }
}

impl fmt::Display for TerminologySystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Error returned when a system or source name is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown terminology system: {0}")]
pub struct UnknownSystem(pub String);

impl FromStr for TerminologySystem {
    type Err = UnknownSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ayurveda" => Ok(Self::Ayurveda),
            "siddha" => Ok(Self::Siddha),
            "unani" => Ok(Self::Unani),
            "icd11" | "icd-11" | "icd" => Ok(Self::Icd11),
            other => Err(UnknownSystem(other.to_string())),
        }
    }
}

/// A result source: the combined endpoint or one of the per-system endpoints.
///
/// Loading flags and pagination are tracked independently per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Combined,
    Icd11,
    Ayurveda,
    Siddha,
    Unani,
}

impl SourceKind {
    pub const ALL: [SourceKind; 5] = [
        SourceKind::Combined,
        SourceKind::Icd11,
        SourceKind::Ayurveda,
        SourceKind::Siddha,
        SourceKind::Unani,
    ];

    /// The per-system endpoint behind this source, `None` for the combined endpoint.
    pub fn system(self) -> Option<TerminologySystem> {
        match self {
            Self::Combined => None,
            Self::Icd11 => Some(TerminologySystem::Icd11),
            Self::Ayurveda => Some(TerminologySystem::Ayurveda),
            Self::Siddha => Some(TerminologySystem::Siddha),
            Self::Unani => Some(TerminologySystem::Unani),
        }
    }
}

impl From<TerminologySystem> for SourceKind {
    fn from(system: TerminologySystem) -> Self {
        match system {
            TerminologySystem::Ayurveda => Self::Ayurveda,
            TerminologySystem::Siddha => Self::Siddha,
            TerminologySystem::Unani => Self::Unani,
            TerminologySystem::Icd11 => Self::Icd11,
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.system() {
            Some(system) => f.write_str(system.slug()),
            None => f.write_str("combined"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = UnknownSystem;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("combined") {
            return Ok(Self::Combined);
        }
        s.parse::<TerminologySystem>().map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_icd_aliases() {
        assert_eq!(
            "ICD-11".parse::<TerminologySystem>().unwrap(),
            TerminologySystem::Icd11
        );
        assert_eq!(
            "icd11".parse::<TerminologySystem>().unwrap(),
            TerminologySystem::Icd11
        );
    }

    #[test]
    fn rejects_unknown_system() {
        let err = "homeopathy".parse::<TerminologySystem>().unwrap_err();
        assert_eq!(err.to_string(), "unknown terminology system: homeopathy");
    }

    #[test]
    fn source_round_trips_through_display() {
        for source in SourceKind::ALL {
            assert_eq!(source.to_string().parse::<SourceKind>().unwrap(), source);
        }
    }

    #[test]
    fn serializes_as_lowercase_slug() {
        let json = serde_json::to_string(&TerminologySystem::Icd11).unwrap();
        assert_eq!(json, "\"icd11\"");
    }
}
