//! Author attribution from git blame statistics.
//!
//! Attribution turns raw blame lines into a normalized author -> share
//! distribution; selection reduces that distribution to the stable, ordered
//! list written into the Author field.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::git::BlameLine;

use super::fields::ET_AL;

/// Cumulative share covered before the candidate list is cut off.
pub const NAMES_SHARE: f64 = 0.66;
/// Candidate count at which the list collapses to the top mentions.
pub const ET_AL_THRESHOLD: usize = 8;
/// Number of names kept when the list collapses.
pub const ET_AL_MENTIONS: usize = 4;

/// Author -> normalized share. Keyed lexicographically so that iteration
/// order, and therefore tie-breaking, is reproducible across runs.
pub type AuthorShares = BTreeMap<String, f64>;

/// Build the share distribution for one file.
///
/// The first `header_end_line` blame lines cover the header itself and are
/// not attributable. Lines from commits in `skip_commits` are dropped, and
/// raw author tokens are canonicalized through the alias map (an absent key
/// leaves the token unchanged). Shares are normalized to sum to 1 when any
/// line survives.
pub fn blame_shares(
    blame: &[BlameLine],
    skip_commits: &HashSet<String>,
    header_end_line: usize,
    aliases: &HashMap<String, String>,
) -> AuthorShares {
    let mut shares = AuthorShares::new();
    let mut total = 0.0f64;

    for line in blame.iter().skip(header_end_line) {
        if skip_commits.contains(&line.hash) {
            log::debug!("Skipping commit {}", line.hash);
            continue;
        }
        let author = aliases
            .get(&line.author)
            .cloned()
            .unwrap_or_else(|| line.author.clone());
        *shares.entry(author).or_insert(0.0) += 1.0;
        total += 1.0;
    }

    if total > 0.0 {
        for share in shares.values_mut() {
            *share /= total;
        }
    }
    shares
}

/// Rank authors by descending share and cut off at the first author whose
/// cumulative share strictly exceeds `cap`. Returns the retained authors and
/// their cumulative share.
pub(crate) fn filter_authors(shares: &AuthorShares, cap: f64) -> (Vec<(String, f64)>, f64) {
    let mut ranked: Vec<(String, f64)> = shares
        .iter()
        .map(|(name, share)| (name.clone(), *share))
        .collect();
    // Stable sort: equal shares keep the map's lexicographic order.
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut cumulative = 0.0;
    let mut keep = ranked.len();
    for (index, (_, share)) in ranked.iter().enumerate() {
        cumulative += share;
        if cumulative > cap {
            keep = index + 1;
            break;
        }
    }
    ranked.truncate(keep);
    (ranked, cumulative)
}

/// Reduce a distribution to the ordered author list.
///
/// Few candidates: all retained names, lexicographic, with the sentinel when
/// coverage is low. Many candidates: the top mentions, lexicographic, always
/// with the sentinel.
pub fn select_authors(shares: &AuthorShares) -> Vec<String> {
    let candidate_count = shares.len();
    let (retained, retained_share) = filter_authors(shares, NAMES_SHARE);

    if candidate_count < ET_AL_THRESHOLD {
        let mut names: Vec<String> = retained.into_iter().map(|(name, _)| name).collect();
        names.sort();
        if retained_share < NAMES_SHARE {
            names.push(ET_AL.to_string());
        }
        return names;
    }

    let mut names: Vec<String> = retained
        .into_iter()
        .take(ET_AL_MENTIONS)
        .map(|(name, _)| name)
        .collect();
    names.sort();
    names.push(ET_AL.to_string());
    names
}
