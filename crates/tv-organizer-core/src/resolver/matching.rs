use rapidfuzz::distance::indel;
use std::collections::HashSet;

use super::show_directory::ShowDirectory;
use crate::episode::parser::comparable_name;

/// Normalized sequence similarity of two names (0.0 to 1.0).
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    indel::normalized_similarity(a.chars(), b.chars())
}

/// Lowercased spellings a show folder is known by: its own name, the comparable form,
/// and dotted, underscored and spaced variants.
pub fn name_variations(actual_name: &str, normalized_name: &str) -> Vec<String> {
    let candidates = [
        actual_name.to_string(),
        normalized_name.to_string(),
        actual_name.replace(' ', "."),
        actual_name.replace(' ', "_"),
        actual_name.replace('.', " "),
        actual_name.replace('_', " "),
    ];

    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .map(|v| v.to_lowercase())
        .filter(|v| seen.insert(v.clone()))
        .collect()
}

/// A show directory that plausibly holds a given show.
#[derive(Debug, Clone, Copy)]
pub struct ShowMatch<'a> {
    pub show: &'a ShowDirectory,
    pub similarity: f64,
}

/// Show directories whose name (or a variation) is at least `threshold` similar to
/// `show_name`. Best first, one entry per directory.
pub fn find_matching_shows<'a>(
    show_name: &str,
    shows: &'a [ShowDirectory],
    threshold: f64,
) -> Vec<ShowMatch<'a>> {
    let wanted = comparable_name(show_name);
    let mut matches: Vec<ShowMatch<'a>> = Vec::new();

    for show in shows {
        if wanted == show.normalized_name {
            matches.push(ShowMatch {
                show,
                similarity: 1.0,
            });
            continue;
        }

        let direct = name_similarity(&wanted, &show.normalized_name);
        if direct >= threshold {
            matches.push(ShowMatch {
                show,
                similarity: direct,
            });
        }

        if let Some(similarity) = name_variations(&show.actual_name, &show.normalized_name)
            .iter()
            .map(|variation| name_similarity(&wanted, variation))
            .find(|s| *s >= threshold)
        {
            matches.push(ShowMatch { show, similarity });
        }
    }

    matches.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
    let mut seen = HashSet::new();
    matches.retain(|m| seen.insert(m.show.path.clone()));
    matches
}
