use crate::types::RepositoryEntry;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

#[derive(Serialize, Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Stars,
    Owner,
    Url,
    Plugins,
    Updated,
}

impl SortKey {
    fn compare(self, a: &RepositoryEntry, b: &RepositoryEntry) -> Ordering {
        match self {
            SortKey::Stars => a.stars.cmp(&b.stars),
            SortKey::Owner => a.owner.to_lowercase().cmp(&b.owner.to_lowercase()),
            SortKey::Url => a.url.cmp(&b.url),
            SortKey::Plugins => a.plugins.len().cmp(&b.plugins.len()),
            SortKey::Updated => a.last_updated.cmp(&b.last_updated),
        }
    }
}

/// Stable sort. Repositories whose URL is not in `seen` come first
/// regardless of key; within each group the key decides.
pub fn sort_entries(
    entries: &mut [RepositoryEntry],
    key: SortKey,
    descending: bool,
    seen: &BTreeSet<String>,
) {
    entries.sort_by(|a, b| {
        let a_seen = seen.contains(&a.url);
        let b_seen = seen.contains(&b.url);
        a_seen.cmp(&b_seen).then_with(|| {
            let ord = key.compare(a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Generation;
    use crate::types::RepoDescriptor;
    use pretty_assertions::assert_eq;

    fn repo(url: &str, owner: &str, stars: u32, plugins: usize) -> RepositoryEntry {
        let descriptor = RepoDescriptor {
            owner: owner.to_string(),
            stargazers_count: stars,
            plugin_master_url: url.to_string(),
            ..Default::default()
        };
        let mut entry = RepositoryEntry::shell(&descriptor, Generation(1));
        entry.plugins = (0..plugins)
            .map(|i| crate::types::PluginEntry {
                name: format!("p{}", i),
                description: String::new(),
                punchline: String::new(),
                repo_url: String::new(),
                api_level: 9,
                tags: BTreeSet::new(),
                category_tags: BTreeSet::new(),
            })
            .collect();
        entry
    }

    fn urls(entries: &[RepositoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.url.as_str()).collect()
    }

    fn all_seen(entries: &[RepositoryEntry]) -> BTreeSet<String> {
        entries.iter().map(|e| e.url.clone()).collect()
    }

    #[test]
    fn stars_descending() {
        let mut entries = vec![repo("a", "x", 1, 1), repo("b", "y", 10, 1), repo("c", "z", 5, 1)];
        let seen = all_seen(&entries);
        sort_entries(&mut entries, SortKey::Stars, true, &seen);
        assert_eq!(urls(&entries), vec!["b", "c", "a"]);
    }

    #[test]
    fn owner_ascending_ignores_case() {
        let mut entries = vec![repo("a", "bob", 0, 1), repo("b", "Alice", 0, 1), repo("c", "carol", 0, 1)];
        let seen = all_seen(&entries);
        sort_entries(&mut entries, SortKey::Owner, false, &seen);
        assert_eq!(urls(&entries), vec!["b", "a", "c"]);
    }

    #[test]
    fn plugin_count_and_stability() {
        let mut entries = vec![
            repo("a", "x", 0, 2),
            repo("b", "x", 0, 3),
            repo("c", "x", 0, 2),
        ];
        let seen = all_seen(&entries);
        sort_entries(&mut entries, SortKey::Plugins, true, &seen);
        assert_eq!(urls(&entries), vec!["b", "a", "c"]);
    }

    #[test]
    fn unseen_repositories_lead_regardless_of_key() {
        let mut entries = vec![repo("a", "x", 100, 1), repo("new", "x", 1, 1), repo("b", "x", 50, 1)];
        let seen: BTreeSet<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
        sort_entries(&mut entries, SortKey::Stars, true, &seen);
        assert_eq!(urls(&entries), vec!["new", "a", "b"]);
    }
}
