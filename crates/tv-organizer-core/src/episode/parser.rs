//! Filename parsing for TV episodes.
//!
//! Recognises names like:
//! - "Breaking.Bad.S05E10.Buried.720p.HDTV.x264-GRP.mkv"
//! - "The Office - 2x05 - Halloween.mkv"
//! - "Planet Earth Season 1 Episode 03.mp4"
//! - "[SubGroup] Frieren - 07 [1080p].mkv"
//!
//! Every token vocabulary lives in a static table so the matchers stay free of branching.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::Quality;

/// Show identity extracted from a filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub show_name: String,
    pub season: u32,
    pub episode: u32,
    pub title: Option<String>,
}

struct EpisodePattern {
    regex: Regex,
    /// Patterns without a season group (anime-style absolute numbering) imply season 1.
    has_season: bool,
}

impl EpisodePattern {
    fn new(pattern: &str, has_season: bool) -> Self {
        Self {
            regex: Regex::new(pattern).unwrap(),
            has_season,
        }
    }
}

lazy_static! {
    static ref EPISODE_PATTERNS: Vec<EpisodePattern> = vec![
        // Show.Name.S01E01.Title.mkv
        EpisodePattern::new(r"(?i)^(.+?)\.S(\d{1,3})\.?E(\d{1,3})", true),
        // Show Name - S01E01 - Title.mkv
        EpisodePattern::new(r"(?i)^(.+?)\s*-\s*S(\d{1,3})\s?E(\d{1,3})", true),
        // Show Name S01E01 Title.mkv, Show_Name_S01E01.mkv
        EpisodePattern::new(r"(?i)^(.+?)[\s_]+S(\d{1,3})\s?E(\d{1,3})", true),
        // Show.Name.1x01.Title.mkv
        EpisodePattern::new(r"(?i)^(.+?)\.(\d{1,2})x(\d{1,3})(?:\D|$)", true),
        // Show Name - 1x01 - Title.mkv
        EpisodePattern::new(r"(?i)^(.+?)\s*-\s*(\d{1,2})x(\d{1,3})(?:\D|$)", true),
        // Show Name 1x01 Title.mkv
        EpisodePattern::new(r"(?i)^(.+?)[\s_]+(\d{1,2})x(\d{1,3})(?:\D|$)", true),
        // Show Name Season 1 Episode 01.mkv
        EpisodePattern::new(
            r"(?i)^(.+?)[\s._-]+Season[\s._-]*(\d{1,3})[\s._-]*Episode[\s._-]*(\d{1,3})",
            true,
        ),
        // [Group] Show Name - 07 [1080p].mkv
        EpisodePattern::new(
            r"(?i)^\[[^\]]*\][\s_]*(.+?)[\s_]+-[\s_]+(\d{1,4})(?:v\d+)?(?:[\s_.\[(]|$)",
            false,
        ),
    ];

    /// Explicit copy markers: `name_1`, `name (2)`, `name.1`.
    static ref VERSION_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"_(\d{1,2})$").unwrap(),
        Regex::new(r"\s*\((\d{1,2})\)$").unwrap(),
        Regex::new(r"\.(\d{1,2})$").unwrap(),
    ];

    static ref MULTI_EPISODE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)S\d+E\d+.*S\d+E\d+").unwrap(),
        Regex::new(r"(?i)S\d+E\d+-?E\d+").unwrap(),
        Regex::new(r"(?i)E\d+-E\d+").unwrap(),
        Regex::new(r"(?i)Episodes?\s+\d+\s*-\s*\d+").unwrap(),
    ];

    /// Season folder names: "Season 1", "Season 01 (2008)", "S01", "S01 Extras", "01".
    static ref SEASON_FOLDER_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(?i)^Season\s*(\d{1,3})$").unwrap(),
        Regex::new(r"(?i)^Season\s*(\d{1,3})\s+").unwrap(),
        Regex::new(r"(?i)^S(\d{1,3})$").unwrap(),
        Regex::new(r"(?i)^S(\d{1,3})\s+").unwrap(),
        Regex::new(r"^(\d{1,3})$").unwrap(),
    ];

    static ref BRACKETED_PREFIX: Regex = Regex::new(r"^\[.*?\]\s*").unwrap();
    static ref TRAILING_YEAR: Regex = Regex::new(r"\s*\(\d{4}\).*$").unwrap();
    static ref NAME_PUNCTUATION: Regex = Regex::new(r"[._\-]+").unwrap();

    static ref RESOLUTION_TOKEN: Regex = Regex::new(r"^\d{3,4}[pi]$").unwrap();
    static ref EPISODE_TOKEN: Regex = Regex::new(r"^(?:s\d+)?e\d+$").unwrap();
}

/// Resolution markers, best first. The first tier with a matching token wins.
const QUALITY_MARKERS: &[(Quality, &[&str])] = &[
    (Quality::Uhd8k, &["8k", "4320p"]),
    (Quality::Uhd4k, &["4k", "2160p", "uhd"]),
    (Quality::Fhd1080p, &["1080p", "1080i", "fhd"]),
    (Quality::Hd720p, &["720p"]),
    (Quality::Sd480p, &["480p", "576p", "sd"]),
];

/// Release sources. Markers are space-separated token phrases.
const SOURCE_MARKERS: &[(&str, &[&str])] = &[
    ("BluRay", &["bluray", "blu ray", "bdrip", "brrip", "bdremux"]),
    ("WEB-DL", &["web dl", "webdl"]),
    ("WEBRip", &["webrip", "web rip"]),
    ("HDTV", &["hdtv", "pdtv"]),
    ("DVDRip", &["dvdrip", "dvd rip"]),
    ("CAM", &["cam", "camrip", "hdcam"]),
    ("TS", &["telesync", "hdts"]),
    ("WEB", &["web"]),
];

/// Tokens that describe a release rather than its content.
const RELEASE_TOKENS: &[&str] = &[
    "4k", "8k", "uhd", "fhd", "sd", "hdr", "hdr10", "dv", "bluray", "blu", "ray", "bdrip",
    "brrip", "bdremux", "remux", "web", "dl", "webdl", "webrip", "rip", "hdtv", "pdtv", "dvdrip",
    "dvd", "cam", "camrip", "hdcam", "telesync", "hdts", "x264", "x265", "h264", "h265", "hevc",
    "avc", "xvid", "divx", "10bit", "8bit", "aac", "ac3", "eac3", "dts", "ddp", "ddp5", "dd5",
    "atmos", "truehd", "proper", "repack", "internal", "amzn", "nf", "hulu", "dsnp", "hmax",
];

/// Folder names that hold unsorted downloads rather than a show.
const GENERIC_FOLDERS: &[&str] = &[
    "downloads", "download", "completed", "complete", "incoming", "unsorted", "new", "misc",
    "temp", "tmp", "tv", "to sort",
];

const SHOW_NAME_ABBREVIATIONS: &[&str] = &["TV", "UK", "US", "FBI", "CSI", "NCIS", "NYPD"];

/// Parse a filename into show identity. Returns `None` when no episode marker is present.
pub fn parse_episode_name(file_name: &str) -> Option<ParsedName> {
    let stem = file_stem(file_name);
    let stem = strip_version_marker(&stem);

    EPISODE_PATTERNS.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(stem)?;
        let raw_show = caps.get(1)?.as_str();
        let (season, episode, tail_start) = if pattern.has_season {
            let episode = caps.get(3)?;
            (
                caps.get(2)?.as_str().parse::<u32>().ok()?,
                episode.as_str().parse::<u32>().ok()?,
                episode.end(),
            )
        } else {
            let episode = caps.get(2)?;
            (1, episode.as_str().parse::<u32>().ok()?, episode.end())
        };

        let show_name = normalize_show_name(raw_show);
        if show_name.is_empty() {
            return None;
        }

        Some(ParsedName {
            show_name,
            season,
            episode,
            title: extract_title(&stem[tail_start..]),
        })
    })
}

/// Detect the resolution tier from filename tokens. Unknown when no marker is present.
pub fn detect_quality(file_name: &str) -> Quality {
    let tokens = tokenize(&file_stem(file_name));
    QUALITY_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| tokens.iter().any(|t| t == m)))
        .map(|(quality, _)| *quality)
        .unwrap_or(Quality::Unknown)
}

/// Detect the release source ("BluRay", "WEB-DL", "HDTV", ...).
pub fn detect_source(file_name: &str) -> Option<String> {
    let joined = joined_tokens(&file_stem(file_name));
    SOURCE_MARKERS
        .iter()
        .find(|(_, markers)| markers.iter().any(|m| contains_phrase(&joined, m)))
        .map(|(source, _)| source.to_string())
}

/// Version number from an explicit copy marker, e.g. `Show.S01E01_2.mkv` -> 2.
pub fn version_marker(file_name: &str) -> Option<u32> {
    let stem = file_stem(file_name);
    VERSION_PATTERNS.iter().find_map(|re| {
        re.captures(&stem)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Remove a trailing copy marker from a filename stem.
pub fn strip_version_marker(stem: &str) -> &str {
    VERSION_PATTERNS
        .iter()
        .find_map(|re| re.find(stem))
        .map(|m| &stem[..m.start()])
        .unwrap_or(stem)
}

/// Whether a filename spans a range of episodes ("S01E01-E02", "Episodes 1-2").
pub fn is_multi_episode(file_name: &str) -> bool {
    MULTI_EPISODE_PATTERNS.iter().any(|re| re.is_match(file_name))
}

/// Whether a lowercase token describes the release (resolution, source, codec, tags).
pub fn is_release_token(token: &str) -> bool {
    RELEASE_TOKENS.contains(&token) || RESOLUTION_TOKEN.is_match(token)
}

/// Lowercase alphanumeric tokens of `s`.
pub fn tokenize(s: &str) -> Vec<String> {
    s.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a space-padded token string contains the space-separated `phrase` on token boundaries.
pub fn contains_phrase(joined: &str, phrase: &str) -> bool {
    joined.contains(&format!(" {} ", phrase))
}

/// Tokens joined by single spaces and padded on both ends for `contains_phrase`.
pub fn joined_tokens(s: &str) -> String {
    format!(" {} ", tokenize(s).join(" "))
}

/// Normalize a raw show name from a filename for consistent grouping.
pub fn normalize_show_name(raw: &str) -> String {
    raw.replace(['.', '_', '-'], " ")
        .split_whitespace()
        .map(title_case_word)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Season number of a season-style folder name.
pub fn season_folder_number(folder_name: &str) -> Option<u32> {
    let name = folder_name.trim();
    SEASON_FOLDER_PATTERNS.iter().find_map(|re| {
        re.captures(name)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    })
}

pub fn is_generic_folder(folder_name: &str) -> bool {
    let lower = folder_name.trim().to_lowercase();
    GENERIC_FOLDERS.contains(&lower.as_str())
}

/// Lowercase comparison form of a show or folder name: no release-group prefix,
/// no trailing "(year)", punctuation as spaces, collapsed whitespace.
pub fn comparable_name(name: &str) -> String {
    let name = BRACKETED_PREFIX.replace(name.trim(), "");
    let name = TRAILING_YEAR.replace(&name, "");
    let name = NAME_PUNCTUATION.replace_all(&name, " ");
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn title_case_word(word: &str) -> String {
    if let Some(abbrev) = SHOW_NAME_ABBREVIATIONS
        .iter()
        .find(|a| a.eq_ignore_ascii_case(word))
    {
        return abbrev.to_string();
    }
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

fn extract_title(tail: &str) -> Option<String> {
    let words: Vec<&str> = tail
        .split(|c: char| c == '.' || c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .take_while(|w| {
            let lower = w.to_lowercase();
            let lower = lower.trim_matches(|c: char| !c.is_alphanumeric());
            !lower.is_empty() && !is_release_token(lower) && !EPISODE_TOKEN.is_match(lower)
        })
        .collect();

    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

fn file_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}
