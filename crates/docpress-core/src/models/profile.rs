use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Named quality profile applied uniformly to one compression pass.
///
/// The set is closed: new profiles are a code change, not data, since their
/// tuning is a domain decision.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum QualityProfile {
    Extreme,
    Medium,
    Basic,
}

/// JPEG chroma subsampling mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromaSubsampling {
    /// 4:4:4, full chroma resolution
    Cs444,
    /// 4:2:2, chroma halved horizontally
    Cs422,
    /// 4:2:0, chroma halved in both directions
    Cs420,
}

/// Fixed encoding parameters for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileSettings {
    pub jpeg_quality: u8,
    pub max_dimension_px: u32,
    pub chroma_subsampling: ChromaSubsampling,
}

impl QualityProfile {
    pub const ALL: [QualityProfile; 3] = [
        QualityProfile::Extreme,
        QualityProfile::Medium,
        QualityProfile::Basic,
    ];

    pub fn settings(self) -> ProfileSettings {
        match self {
            QualityProfile::Extreme => ProfileSettings {
                jpeg_quality: 45,
                max_dimension_px: 1024,
                chroma_subsampling: ChromaSubsampling::Cs422,
            },
            QualityProfile::Medium => ProfileSettings {
                jpeg_quality: 70,
                max_dimension_px: 1600,
                chroma_subsampling: ChromaSubsampling::Cs420,
            },
            QualityProfile::Basic => ProfileSettings {
                jpeg_quality: 85,
                max_dimension_px: 2400,
                chroma_subsampling: ChromaSubsampling::Cs444,
            },
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            QualityProfile::Extreme => "extreme",
            QualityProfile::Medium => "medium",
            QualityProfile::Basic => "basic",
        }
    }
}

impl Display for QualityProfile {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for QualityProfile {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "extreme" => Ok(QualityProfile::Extreme),
            "medium" => Ok(QualityProfile::Medium),
            "basic" => Ok(QualityProfile::Basic),
            _ => Err(anyhow::anyhow!("Invalid quality profile: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_table() {
        let extreme = QualityProfile::Extreme.settings();
        assert_eq!(extreme.jpeg_quality, 45);
        assert_eq!(extreme.max_dimension_px, 1024);
        assert_eq!(extreme.chroma_subsampling, ChromaSubsampling::Cs422);

        let medium = QualityProfile::Medium.settings();
        assert_eq!(medium.jpeg_quality, 70);
        assert_eq!(medium.max_dimension_px, 1600);
        assert_eq!(medium.chroma_subsampling, ChromaSubsampling::Cs420);

        let basic = QualityProfile::Basic.settings();
        assert_eq!(basic.jpeg_quality, 85);
        assert_eq!(basic.max_dimension_px, 2400);
        assert_eq!(basic.chroma_subsampling, ChromaSubsampling::Cs444);
    }

    #[test]
    fn test_profile_display() {
        assert_eq!(QualityProfile::Extreme.to_string(), "extreme");
        assert_eq!(QualityProfile::Medium.to_string(), "medium");
        assert_eq!(QualityProfile::Basic.to_string(), "basic");
    }

    #[test]
    fn test_profile_from_str() {
        assert_eq!(
            "extreme".parse::<QualityProfile>().unwrap(),
            QualityProfile::Extreme
        );
        assert_eq!(
            "basic".parse::<QualityProfile>().unwrap(),
            QualityProfile::Basic
        );
        assert!("ultra".parse::<QualityProfile>().is_err());
    }

    #[test]
    fn test_all_covers_every_profile() {
        assert_eq!(QualityProfile::ALL.len(), 3);
        for profile in QualityProfile::ALL {
            assert_eq!(profile.as_str().parse::<QualityProfile>().unwrap(), profile);
        }
    }
}
