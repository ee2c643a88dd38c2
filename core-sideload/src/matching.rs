//! Title matching between the owned and installed catalogs.
//!
//! The two catalogs share no identifier, so installed-ness is decided by a
//! documented heuristic: case-insensitive substring containment in either
//! direction. Real catalogs rely on its looseness (store titles often carry
//! suffixes the device strips, and vice versa), so it is deliberately not
//! strengthened; ambiguous matches are logged for observability instead of
//! failing the run.

use tracing::warn;

use crate::model::{InstalledEntry, OwnedItem};

/// Whether an owned title and an installed title refer to the same item.
///
/// Case-insensitive containment, checked in both directions.
pub fn titles_match(owned_title: &str, installed_title: &str) -> bool {
    let owned = owned_title.to_lowercase();
    let installed = installed_title.to_lowercase();
    owned.contains(&installed) || installed.contains(&owned)
}

/// Whether an owned item matches any installed entry.
///
/// Logs a warning when an item matches more than one installed entry; the
/// classification still proceeds on the single owned-catalog fingerprint, so
/// a multi-match can silently misclassify and is worth surfacing.
pub fn is_installed(item: &OwnedItem, installed: &[InstalledEntry]) -> bool {
    let matches: Vec<&InstalledEntry> = installed
        .iter()
        .filter(|entry| titles_match(&item.title, &entry.title))
        .collect();

    if matches.len() > 1 {
        warn!(
            title = %item.title,
            count = matches.len(),
            "owned title matches multiple installed entries; classification \
             uses the owned-catalog fingerprint only"
        );
    }

    !matches.is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ItemId;

    fn owned(title: &str) -> OwnedItem {
        OwnedItem {
            id: ItemId(1),
            title: title.to_string(),
            download_key_id: 10,
        }
    }

    fn installed(title: &str) -> InstalledEntry {
        InstalledEntry {
            title: title.to_string(),
            version: "1.0".to_string(),
            date: "2024-01-01".to_string(),
        }
    }

    #[test]
    fn test_exact_match() {
        assert!(titles_match("Bloom", "Bloom"));
    }

    #[test]
    fn test_case_insensitive() {
        assert!(titles_match("BLOOM", "bloom"));
    }

    #[test]
    fn test_containment_owned_longer() {
        assert!(titles_match("Bloom: Deluxe Edition", "Bloom"));
    }

    #[test]
    fn test_containment_installed_longer() {
        assert!(titles_match("Bloom", "Bloom (sideloaded)"));
    }

    #[test]
    fn test_no_match() {
        assert!(!titles_match("Bloom", "Echoes"));
    }

    #[test]
    fn test_is_installed() {
        let entries = vec![installed("Echoes"), installed("Bloom")];
        assert!(is_installed(&owned("Bloom"), &entries));
        assert!(!is_installed(&owned("Orbit"), &entries));
    }

    #[test]
    fn test_is_installed_multi_match_still_true() {
        // "Play" is contained in both entries; the heuristic stays loose.
        let entries = vec![installed("Playtime"), installed("Playmaker")];
        assert!(is_installed(&owned("Play"), &entries));
    }
}
