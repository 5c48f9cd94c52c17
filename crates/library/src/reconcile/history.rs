use ctrlrepo_models::RepoVersion;
use std::collections::HashSet;

/// Merge an incoming version record into the one already in the repository.
///
/// - If the incoming `latest` has a different code, the existing `latest`
///   moves into `history` (unless it's unset or already there).
/// - `latest`, `author` and `description` are taken from `incoming`.
/// - `screenshot` is the number of screenshots in the package, or the
///   incoming record's own count if that's larger.
/// - Incoming `history` entries are appended when their code isn't already
///   known.
///
/// The result never lists `latest`'s code in `history`, nor any code twice,
/// and existing entries keep their order. Merging the same record twice
/// changes nothing the second time.
pub fn merge_history(existing: Option<RepoVersion>, incoming: &RepoVersion, package_screenshots: usize) -> RepoVersion {
    let mut merged = existing.unwrap_or_default();
    let previous = &merged.latest;
    if incoming.latest.version_code != previous.version_code
        && previous.is_set()
        && !merged.has_history(previous.version_code)
    {
        merged.history.push(previous.clone());
    }

    merged.latest = incoming.latest.clone();
    merged.author = incoming.author.clone();
    merged.description = incoming.description.clone();
    merged.screenshot = u32::try_from(package_screenshots).unwrap_or(u32::MAX).max(incoming.screenshot);

    merged.history.extend(incoming.history.iter().cloned());
    let latest = merged.latest.version_code;
    let mut seen = HashSet::new();
    merged.history.retain(|v| v.version_code != latest && seen.insert(v.version_code));
    merged
}
