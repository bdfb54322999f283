use super::contributor::{Contributor, ContributorFragment};
use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

/// Merge per-repository fragments into one record per login.
///
/// Bot accounts are skipped. Counts are summed, repositories are unioned and the most recent
/// activity wins. Identity fields (id, avatar, profile URL) come from the fragment of the
/// alphabetically first repository, so the result does not depend on the order of `fragments`.
#[must_use]
pub fn aggregate(fragments: impl IntoIterator<Item = ContributorFragment>) -> BTreeMap<String, Contributor> {
    let mut merged: BTreeMap<String, Contributor> = BTreeMap::new();

    for fragment in fragments.into_iter().filter(|f| !f.is_bot) {
        match merged.entry(fragment.login.clone()) {
            Entry::Vacant(entry) => {
                let _ = entry.insert(Contributor {
                    id: fragment.id,
                    login: fragment.login,
                    avatar_url: fragment.avatar_url,
                    html_url: fragment.html_url,
                    contributions: fragment.contributions,
                    repositories: [fragment.repository].into(),
                    activity: fragment.activity,
                });
            }
            Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();

                if existing.repositories.first().is_none_or(|first| fragment.repository < *first) {
                    existing.id = fragment.id;
                    existing.avatar_url = fragment.avatar_url;
                    existing.html_url = fragment.html_url;
                }

                existing.contributions += fragment.contributions;
                existing.activity.merge(&fragment.activity);
                let _ = existing.repositories.insert(fragment.repository);
            }
        }
    }

    merged
}
