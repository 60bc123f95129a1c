use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::path::Path;

const GIB: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub tv_directories: Vec<String>,
    pub ignore_patterns: Vec<String>,
    pub video_extensions: Vec<String>,
    pub duplicates: DuplicateSettings,
    pub deletion: DeletionSettings,
    pub resolver: ResolverSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tv_directories: Vec::new(),
            ignore_patterns: Vec::new(),
            video_extensions: [
                ".mp4", ".mkv", ".avi", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".ts", ".mpg",
                ".mpeg",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            duplicates: DuplicateSettings::default(),
            deletion: DeletionSettings::default(),
            resolver: ResolverSettings::default(),
        }
    }
}

/// Thresholds and weights for the enhanced duplicate filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DuplicateSettings {
    pub min_confidence: f64,
    /// Pairwise Jaccard similarity below which two content signatures are different episodes.
    pub min_signature_similarity: f64,
    pub base_confidence: f64,
    pub version_marker_bonus: f64,
    pub similarity_weight: f64,
    pub size_weight: f64,
}

impl Default for DuplicateSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.7,
            min_signature_similarity: 0.3,
            base_confidence: 0.3,
            version_marker_bonus: 0.5,
            similarity_weight: 0.3,
            size_weight: 0.2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeletionSettings {
    pub min_file_size_bytes: u64,
    pub max_file_size_bytes: u64,
    /// Holding area for trashed files. `None` uses a `.trash` folder next to each file.
    pub trash_directory: Option<String>,
    pub confirm_each: bool,
    pub trash_phrase: String,
    pub permanent_phrase: String,
}

impl Default for DeletionSettings {
    fn default() -> Self {
        Self {
            min_file_size_bytes: 100 * 1024,
            max_file_size_bytes: 50 * GIB,
            trash_directory: None,
            confirm_each: false,
            trash_phrase: "MOVE TO TRASH".to_string(),
            permanent_phrase: "DELETE PERMANENTLY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverSettings {
    pub similarity_threshold: f64,
    pub min_free_space_gb: f64,
    /// Show directories holding more than this much content earn the size bonus.
    pub min_content_size_gb: f64,
    pub move_phrase: String,
    pub weights: ScoringWeights,
    pub root_weights: RootWeights,
    pub confidence: ConfidenceThresholds,
}

impl Default for ResolverSettings {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.8,
            min_free_space_gb: 1.0,
            min_content_size_gb: 1.0,
            move_phrase: "MOVE FILES".to_string(),
            weights: ScoringWeights::default(),
            root_weights: RootWeights::default(),
            confidence: ConfidenceThresholds::default(),
        }
    }
}

/// Weights combining the four destination component scores.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub name_match: f64,
    pub organization: f64,
    pub space: f64,
    pub proximity: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            name_match: 0.4,
            organization: 0.3,
            space: 0.2,
            proximity: 0.1,
        }
    }
}

/// Weights for choosing the TV root that receives a brand new show.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RootWeights {
    pub space: f64,
    pub show_count: f64,
    pub preference: f64,
}

impl Default for RootWeights {
    fn default() -> Self {
        Self {
            space: 0.5,
            show_count: 0.25,
            preference: 0.25,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceRule {
    pub min_similarity: f64,
    pub min_score: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    pub high: ConfidenceRule,
    pub medium: ConfidenceRule,
    pub low: ConfidenceRule,
    /// Destination score a new-show resolution needs for medium (its ceiling) and low.
    pub new_show_medium_score: f64,
    pub new_show_low_score: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: ConfidenceRule {
                min_similarity: 0.95,
                min_score: 80.0,
            },
            medium: ConfidenceRule {
                min_similarity: 0.85,
                min_score: 60.0,
            },
            low: ConfidenceRule {
                min_similarity: 0.80,
                min_score: 40.0,
            },
            new_show_medium_score: 75.0,
            new_show_low_score: 60.0,
        }
    }
}

impl AppConfig {
    /// Replace the configured TV directories with a caller-supplied list, if any.
    pub fn with_directory_override(mut self, directories: Option<Vec<String>>) -> Self {
        if let Some(dirs) = directories {
            if !dirs.is_empty() {
                self.tv_directories = dirs;
            }
        }
        self
    }

    pub fn is_video_extension(&self, path: &Path) -> bool {
        let ext = match path.extension() {
            Some(ext) => format!(".{}", ext.to_string_lossy().to_lowercase()),
            None => return false,
        };
        self.video_extensions
            .iter()
            .any(|candidate| candidate.eq_ignore_ascii_case(&ext))
    }
}

/// Load `Config.toml` (optional) layered with `TVORG__*` environment variables.
pub fn load_configuration() -> Result<AppConfig, ConfigError> {
    let builder = Config::builder()
        .add_source(ConfigFile::with_name("Config").required(false))
        .add_source(
            Environment::with_prefix("TVORG")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("tv_directories")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}

/// Remove directories that are subdirectories of other directories in the list.
pub fn non_overlapping_directories(dirs: Vec<String>) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();

    for dir in dirs {
        let dir_path = Path::new(&dir);
        if result.iter().any(|kept| dir_path.starts_with(Path::new(kept))) {
            continue;
        }
        result.retain(|kept| !Path::new(kept).starts_with(dir_path));
        result.push(dir);
    }

    result
}
