use crate::codepoint_ty::Codepoint;
use crate::dataset::Dataset;
use crate::model::{NamedCharacter, UnicodeCharacter, UnicodeCharacterAlias, UnicodeGroup};
use smallvec::SmallVec;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Result cap used when the caller has no preference.
pub const DEFAULT_SEARCH_LIMIT: usize = 250;

/// Display name used for characters that have neither a name nor an alias,
/// or that are missing from the catalog.
pub const UNNAMED_PLACEHOLDER: &str = "(unnamed)";

const CANCEL_CHECK_INTERVAL: usize = 512;

pub(crate) type AliasVec = SmallVec<[UnicodeCharacterAlias; 2]>;
type FoldedNameVec = SmallVec<[String; 2]>;

/// Folds text for case-insensitive matching.
pub(crate) fn fold_for_search(text: &str) -> String {
    use unicode_normalization::UnicodeNormalization;

    text.nfkc().flat_map(char::to_lowercase).collect()
}

/// An immutable index over one loaded [`Dataset`].
///
/// All lookups are read-only, so a catalog is shared between threads as
/// `Arc<Catalog>`.
pub struct Catalog {
    groups: Vec<UnicodeGroup>,
    group_positions: HashMap<String, usize>,
    characters: BTreeMap<Codepoint, UnicodeCharacter>,
    members: HashMap<String, Vec<Codepoint>>,
    aliases: HashMap<Codepoint, AliasVec>,
    // codepoint order; folded canonical name first, then folded aliases
    search_index: Vec<(Codepoint, FoldedNameVec)>,
}

impl Catalog {
    /// Creates a catalog with no groups and no characters.
    pub fn empty() -> Self {
        Catalog::new(&Dataset::new())
    }

    /// Indexes a dataset.
    pub fn new(dataset: &Dataset) -> Self {
        let groups = dataset.groups().to_vec();
        let group_positions = groups
            .iter()
            .enumerate()
            .map(|(pos, group)| (group.name.clone(), pos))
            .collect();

        let mut characters = BTreeMap::new();
        let mut members: HashMap<String, Vec<Codepoint>> = HashMap::new();
        for ch in dataset.characters() {
            members
                .entry(ch.group_name.clone())
                .or_default()
                .push(ch.codepoint);
            characters.insert(ch.codepoint, ch.clone());
        }
        for codepoints in members.values_mut() {
            codepoints.sort_unstable();
        }

        let mut aliases: HashMap<Codepoint, AliasVec> = HashMap::new();
        for alias in dataset.aliases() {
            aliases
                .entry(alias.codepoint)
                .or_default()
                .push(alias.clone());
        }

        let search_index = characters
            .values()
            .map(|ch: &UnicodeCharacter| {
                let mut names = FoldedNameVec::new();
                if let Some(name) = ch.canonical_name() {
                    names.push(fold_for_search(name));
                }
                if let Some(list) = aliases.get(&ch.codepoint) {
                    names.extend(list.iter().map(|a| fold_for_search(&a.alias)));
                }
                (ch.codepoint, names)
            })
            .collect();

        Catalog {
            groups,
            group_positions,
            characters,
            members,
            aliases,
            search_index,
        }
    }

    /// Returns the number of characters.
    pub fn len(&self) -> usize {
        self.characters.len()
    }

    /// Returns whether the catalog has no characters.
    pub fn is_empty(&self) -> bool {
        self.characters.is_empty()
    }

    /// Groups in load order.
    pub fn list_groups(&self) -> &[UnicodeGroup] {
        &self.groups
    }

    /// Looks up a group by key.
    pub fn group(&self, name: &str) -> Option<&UnicodeGroup> {
        self.group_positions.get(name).map(|&pos| &self.groups[pos])
    }

    /// Looks up a group by its display form (`Basic Latin`).
    pub fn group_by_display_name(&self, display: &str) -> Option<&UnicodeGroup> {
        self.group(&UnicodeGroup::from_display_name(display).name)
    }

    /// Characters of a group, ordered by codepoint. Unknown groups yield nothing.
    pub fn characters_in_group(&self, group_name: &str) -> Vec<&UnicodeCharacter> {
        self.members
            .get(group_name)
            .map(|codepoints| {
                codepoints
                    .iter()
                    .filter_map(|cp| self.characters.get(cp))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Exact lookup.
    pub fn get_character(&self, codepoint: Codepoint) -> Option<&UnicodeCharacter> {
        self.characters.get(&codepoint)
    }

    /// Aliases of a codepoint in load order; empty if there are none.
    pub fn aliases_for(&self, codepoint: Codepoint) -> &[UnicodeCharacterAlias] {
        self.aliases
            .get(&codepoint)
            .map(|list| &list[..])
            .unwrap_or(&[])
    }

    /// The canonical name if it is non-empty, otherwise the text of the
    /// first alias in load order.
    pub fn resolve_display_name(&self, codepoint: Codepoint) -> Option<&str> {
        if let Some(name) = self
            .get_character(codepoint)
            .and_then(UnicodeCharacter::canonical_name)
        {
            return Some(name);
        }
        self.aliases_for(codepoint)
            .first()
            .map(|a| a.alias.as_str())
    }

    /// Like [`resolve_display_name`](Self::resolve_display_name), substituting
    /// [`UNNAMED_PLACEHOLDER`] when there is no name or the name is empty.
    pub fn display_name_or_placeholder(&self, codepoint: Codepoint) -> &str {
        self.resolve_display_name(codepoint)
            .filter(|name| !name.is_empty())
            .unwrap_or(UNNAMED_PLACEHOLDER)
    }

    /// Resolves `codepoint` for display. Unknown codepoints are not an error.
    pub fn named(&self, codepoint: Codepoint) -> NamedCharacter {
        NamedCharacter {
            codepoint,
            text: codepoint.to_text().ok(),
            name: self.display_name_or_placeholder(codepoint).to_owned(),
            favorite_id: None,
        }
    }

    /// Case-insensitive substring search over names and aliases.
    ///
    /// Results are unique, ordered by codepoint and capped at `limit`.
    /// An empty query matches nothing.
    pub fn search(&self, query: &str, limit: usize) -> Vec<&UnicodeCharacter> {
        self.search_until(query, limit, || false)
            .unwrap_or_default()
    }

    /// Like [`search`](Self::search), polling `is_cancelled` while scanning.
    /// Returns `None` if the search was abandoned.
    pub fn search_until<C>(
        &self,
        query: &str,
        limit: usize,
        mut is_cancelled: C,
    ) -> Option<Vec<&UnicodeCharacter>>
    where
        C: FnMut() -> bool,
    {
        let mut results = Vec::new();
        if query.is_empty() || limit == 0 {
            return Some(results);
        }
        let needle = fold_for_search(query);
        for (idx, (codepoint, names)) in self.search_index.iter().enumerate() {
            if idx % CANCEL_CHECK_INTERVAL == 0 && is_cancelled() {
                return None;
            }
            if !names.iter().any(|name| name.contains(needle.as_str())) {
                continue;
            }
            if let Some(ch) = self.characters.get(codepoint) {
                results.push(ch);
                if results.len() >= limit {
                    break;
                }
            }
        }
        Some(results)
    }

    /// Finds the character typed as `text`, which must be a single grapheme
    /// cluster made of a single scalar value.
    pub fn lookup_text(&self, text: &str) -> Option<&UnicodeCharacter> {
        use unicode_segmentation::UnicodeSegmentation;

        let mut graphemes = text.graphemes(true);
        let grapheme = graphemes.next()?;
        if graphemes.next().is_some() {
            return None;
        }
        let mut chars = grapheme.chars();
        let ch = chars.next()?;
        if chars.next().is_some() {
            return None;
        }
        self.get_character(Codepoint::from(ch))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Catalog::empty()
    }
}

impl fmt::Debug for Catalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Catalog")
            .field("groups", &self.groups.len())
            .field("characters", &self.characters.len())
            .field("aliased", &self.aliases.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cp(hex: &str) -> Codepoint {
        Codepoint::from_hex(hex).unwrap()
    }

    fn sample() -> Catalog {
        let mut dataset = Dataset::new();
        dataset.push_group("Emoticons");
        dataset.push_group("Basic_Latin");
        dataset.push_group("Empty_Block");
        dataset.push_character(cp("1F60A"), "SMILING FACE WITH SMILING EYES", "Emoticons");
        dataset.push_character(cp("1F600"), "GRINNING FACE", "Emoticons");
        dataset.push_character(cp("1F642"), "SLIGHTLY SMILING FACE", "Emoticons");
        dataset.push_character(cp("0000"), "", "Basic_Latin");
        dataset.push_character(cp("0041"), "LATIN CAPITAL LETTER A", "Basic_Latin");
        dataset.push_character(cp("0046"), "", "Basic_Latin");
        dataset.push_alias(cp("0000"), "NULL");
        dataset.push_alias(cp("0000"), "NUL");
        dataset.push_alias(cp("0046"), "FOO");
        dataset.push_alias(cp("1F600"), "HAPPY");
        Catalog::new(&dataset)
    }

    fn codepoints(chars: &[&UnicodeCharacter]) -> Vec<String> {
        chars.iter().map(|ch| ch.codepoint.to_hex()).collect()
    }

    #[test]
    fn test_groups_keep_load_order() {
        let catalog = sample();
        let names: Vec<_> = catalog
            .list_groups()
            .iter()
            .map(|g| g.name.as_str())
            .collect();
        assert_eq!(names, ["Emoticons", "Basic_Latin", "Empty_Block"]);
        assert_eq!(catalog.list_groups(), catalog.list_groups());
        assert!(catalog.group_by_display_name("Basic Latin").is_some());
        assert!(catalog.group("Basic Latin").is_none());
    }

    #[test]
    fn test_characters_in_group_sorted() {
        let catalog = sample();
        assert_eq!(
            codepoints(&catalog.characters_in_group("Emoticons")),
            ["1F600", "1F60A", "1F642"]
        );
        assert!(catalog.characters_in_group("Empty_Block").is_empty());
        assert!(catalog.characters_in_group("Nope").is_empty());
    }

    #[test]
    fn test_lookup_and_aliases() {
        let catalog = sample();
        assert_eq!(catalog.get_character(cp("41")).unwrap().name, "LATIN CAPITAL LETTER A");
        assert!(catalog.get_character(cp("42")).is_none());
        let aliases: Vec<_> = catalog
            .aliases_for(cp("0"))
            .iter()
            .map(|a| a.alias.as_str())
            .collect();
        assert_eq!(aliases, ["NULL", "NUL"]);
        assert!(catalog.aliases_for(cp("41")).is_empty());
    }

    #[test]
    fn test_display_name_fallback() {
        let catalog = sample();
        assert_eq!(catalog.resolve_display_name(cp("0046")), Some("FOO"));
        assert_eq!(catalog.resolve_display_name(cp("0000")), Some("NULL"));
        // canonical name wins over alias
        assert_eq!(catalog.resolve_display_name(cp("1F600")), Some("GRINNING FACE"));
        assert_eq!(catalog.resolve_display_name(cp("10FFFF")), None);
        assert_eq!(
            catalog.display_name_or_placeholder(cp("10FFFF")),
            UNNAMED_PLACEHOLDER
        );
    }

    #[test]
    fn test_display_name_takes_first_alias_as_is() {
        let mut dataset = Dataset::new();
        dataset.push_group("Basic_Latin");
        dataset.push_character(cp("0001"), "", "Basic_Latin");
        dataset.push_alias(cp("0001"), "");
        dataset.push_alias(cp("0001"), "START OF HEADING");
        let catalog = Catalog::new(&dataset);
        assert_eq!(catalog.resolve_display_name(cp("0001")), Some(""));
        assert_eq!(
            catalog.display_name_or_placeholder(cp("0001")),
            UNNAMED_PLACEHOLDER
        );
    }

    #[test]
    fn test_named_unknown_codepoint() {
        let catalog = sample();
        let named = catalog.named(cp("D800"));
        assert_eq!(named.text, None);
        assert_eq!(named.name, UNNAMED_PLACEHOLDER);
        assert_eq!(catalog.named(cp("0")).name, "NULL");
    }

    #[test]
    fn test_search_is_case_insensitive() {
        let catalog = sample();
        let upper = catalog.search("SMILING", DEFAULT_SEARCH_LIMIT);
        let lower = catalog.search("smiling", DEFAULT_SEARCH_LIMIT);
        assert_eq!(upper, lower);
        assert_eq!(codepoints(&upper), ["1F60A", "1F642"]);
    }

    #[test]
    fn test_search_matches_aliases_once() {
        let catalog = sample();
        // both aliases of U+0000 contain "nul"
        assert_eq!(codepoints(&catalog.search("nul", 10)), ["0000"]);
        assert_eq!(codepoints(&catalog.search("happy", 10)), ["1F600"]);
        assert_eq!(codepoints(&catalog.search("face", 10)), ["1F600", "1F60A", "1F642"]);
    }

    #[test]
    fn test_search_limits() {
        let catalog = sample();
        assert!(catalog.search("", DEFAULT_SEARCH_LIMIT).is_empty());
        assert!(catalog.search("face", 0).is_empty());
        assert_eq!(codepoints(&catalog.search("face", 2)), ["1F600", "1F60A"]);
        assert!(catalog.search("zebra", 10).is_empty());
    }

    #[test]
    fn test_search_until_cancelled() {
        let catalog = sample();
        assert_eq!(catalog.search_until("face", 10, || true), None);
        assert_eq!(catalog.search_until("face", 10, || false).map(|r| r.len()), Some(3));
    }

    #[test]
    fn test_lookup_text() {
        let catalog = sample();
        assert_eq!(catalog.lookup_text("\u{1F600}").unwrap().codepoint, cp("1F600"));
        assert_eq!(catalog.lookup_text("A").unwrap().codepoint, cp("41"));
        assert!(catalog.lookup_text("").is_none());
        assert!(catalog.lookup_text("AA").is_none());
        // a single grapheme cluster of two scalars
        assert!(catalog.lookup_text("A\u{0301}").is_none());
    }

    #[test]
    fn test_empty_catalog() {
        let catalog = Catalog::empty();
        assert!(catalog.is_empty());
        assert!(catalog.list_groups().is_empty());
        assert!(catalog.search("a", 10).is_empty());
    }
}
