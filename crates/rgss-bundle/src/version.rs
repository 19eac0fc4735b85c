//! RGSS engine generations and their container file names

use serde::{Deserialize, Serialize};

/// The RGSS generation a game was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RgssVersion {
    /// RPG Maker XP
    Rgss1,
    /// RPG Maker VX
    Rgss2,
    /// RPG Maker VX Ace
    Rgss3,
}

impl RgssVersion {
    /// Newest generation first, the order used when probing a game folder.
    pub const PROBE_ORDER: [RgssVersion; 3] = [Self::Rgss3, Self::Rgss2, Self::Rgss1];

    /// File name of the script container inside the `Data` directory.
    pub fn container_file_name(&self) -> &'static str {
        match self {
            Self::Rgss1 => "Scripts.rxdata",
            Self::Rgss2 => "Scripts.rvdata",
            Self::Rgss3 => "Scripts.rvdata2",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgss1 => "rgss1",
            Self::Rgss2 => "rgss2",
            Self::Rgss3 => "rgss3",
        }
    }
}

impl std::fmt::Display for RgssVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RgssVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgss1" | "xp" => Ok(Self::Rgss1),
            "rgss2" | "vx" => Ok(Self::Rgss2),
            "rgss3" | "vxace" | "vx-ace" => Ok(Self::Rgss3),
            other => Err(format!("unknown RGSS version: {}", other)),
        }
    }
}
