pub mod parser;

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

const GIB: u64 = 1024 * 1024 * 1024;
const MAX_SIZE_BONUS: u32 = 10;

/// Resolution tier inferred from filename tokens. `Unknown` loses every comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Quality {
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "480p")]
    Sd480p,
    #[serde(rename = "720p")]
    Hd720p,
    #[serde(rename = "1080p")]
    Fhd1080p,
    #[serde(rename = "4K")]
    Uhd4k,
    #[serde(rename = "8K")]
    Uhd8k,
}

impl Quality {
    pub fn base_score(self) -> u32 {
        match self {
            Quality::Unknown => 0,
            Quality::Sd480p => 10,
            Quality::Hd720p => 20,
            Quality::Fhd1080p => 30,
            Quality::Uhd4k => 40,
            Quality::Uhd8k => 50,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Quality::Unknown => "unknown",
            Quality::Sd480p => "480p",
            Quality::Hd720p => "720p",
            Quality::Fhd1080p => "1080p",
            Quality::Uhd4k => "4K",
            Quality::Uhd8k => "8K",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Where a scanned episode sits relative to a tidy `Root/Show/Season NN` layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpisodeStatus {
    Organized,
    /// Directly inside a TV root.
    LooseRoot,
    /// Inside a downloads-style folder or a folder holding just that episode.
    LooseGeneric,
    /// Inside a season folder that sits directly in a TV root, with no show folder above it.
    LooseSeasonFolder,
    /// Inside a show folder named for a different show.
    MisnamedFolder,
}

impl EpisodeStatus {
    /// Episodes the path resolver should try to relocate.
    pub fn needs_resolution(self) -> bool {
        matches!(
            self,
            EpisodeStatus::LooseRoot | EpisodeStatus::LooseGeneric | EpisodeStatus::LooseSeasonFolder
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            EpisodeStatus::Organized => "organized",
            EpisodeStatus::LooseRoot => "loose in root",
            EpisodeStatus::LooseGeneric => "loose in generic folder",
            EpisodeStatus::LooseSeasonFolder => "loose season folder",
            EpisodeStatus::MisnamedFolder => "misnamed folder",
        }
    }
}

/// One video file identified as a TV episode. Built once by the scanner and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Episode {
    pub path: PathBuf,
    pub size: u64,
    pub extension: String,
    pub show_name: String,
    pub season: u32,
    pub episode: u32,
    pub title: Option<String>,
    pub quality: Quality,
    pub source: Option<String>,
    pub status: EpisodeStatus,
}

impl Episode {
    /// Build an episode from a file on disk. `None` when the name carries no episode marker.
    pub fn from_file(path: &Path, size: u64, status: EpisodeStatus) -> Option<Self> {
        let file_name = path.file_name()?.to_string_lossy();
        let parsed = parser::parse_episode_name(&file_name)?;

        Some(Self {
            path: path.to_path_buf(),
            size,
            extension: path
                .extension()
                .map(|e| format!(".{}", e.to_string_lossy().to_lowercase()))
                .unwrap_or_default(),
            show_name: parsed.show_name,
            season: parsed.season,
            episode: parsed.episode,
            title: parsed.title,
            quality: parser::detect_quality(&file_name),
            source: parser::detect_source(&file_name),
            status,
        })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn parent_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Grouping key: lowercase show name plus season and episode.
    pub fn identity(&self) -> String {
        format!(
            "{}:s{:02}e{:02}",
            self.show_name.to_lowercase(),
            self.season,
            self.episode
        )
    }

    pub fn is_same_episode(&self, other: &Episode) -> bool {
        self.show_name.eq_ignore_ascii_case(&other.show_name)
            && self.season == other.season
            && self.episode == other.episode
    }

    /// Tier base score plus one point per whole GiB, capped.
    pub fn quality_score(&self) -> u32 {
        let size_bonus = (self.size / GIB).min(MAX_SIZE_BONUS as u64) as u32;
        self.quality.base_score() + size_bonus
    }

    pub fn version_marker(&self) -> Option<u32> {
        parser::version_marker(&self.file_name())
    }

    pub fn size_mb(&self) -> f64 {
        self.size as f64 / (1024.0 * 1024.0)
    }

    pub fn size_gb(&self) -> f64 {
        self.size as f64 / GIB as f64
    }
}

impl fmt::Display for Episode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} S{:02}E{:02}", self.show_name, self.season, self.episode)?;
        if let Some(title) = &self.title {
            write!(f, " - {}", title)?;
        }
        write!(f, " [{}]", self.quality)
    }
}
