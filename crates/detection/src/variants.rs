use crate::path_text;
use crate::tables::{
    DEVELOPER_ALIASES, GENERIC_INSTALL_LEAVES, NUMBER_WORDS, TRANSLITERATIONS,
    WORD_SIMPLIFICATIONS,
};
use protocol::models::GameIdentity;
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::{Arc, OnceLock};

const NAME_SEPARATORS: [char; 4] = [' ', '_', '-', '.'];
const INVALID_FILE_NAME_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];
const MIN_INSTALL_LEAF_LEN: usize = 3;

pub type VariantSet = Arc<BTreeSet<String>>;

fn word_splitter() -> Option<&'static Regex> {
    static SPLITTER: OnceLock<Option<Regex>> = OnceLock::new();
    SPLITTER
        .get_or_init(|| Regex::new(r"[\s_.\-]+").ok())
        .as_ref()
}

/// Every lowercase string a save folder for `game` might be named after.
pub fn generate_variants(game: &GameIdentity) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for name in game.name_fields() {
        expand_name(name, &mut out);
    }

    if let Some(developer) = game.developer_name() {
        expand_name(developer, &mut out);
        let developer = developer.trim().to_lowercase();
        for (fragment, aliases) in DEVELOPER_ALIASES {
            if developer.contains(fragment) {
                for alias in *aliases {
                    push(&mut out, alias);
                }
            }
        }
    }

    for category in &game.categories {
        push(&mut out, category);
    }

    if let Some(install_root) = game.install_root() {
        let leaf = path_text::file_name(install_root);
        if leaf.chars().count() >= MIN_INSTALL_LEAF_LEN && !is_generic_install_leaf(leaf) {
            expand_name(leaf, &mut out);
        }
    }

    out
}

fn is_generic_install_leaf(leaf: &str) -> bool {
    let leaf = leaf.trim().to_lowercase();
    GENERIC_INSTALL_LEAVES.contains(&leaf.as_str())
}

/// The narrow set used for fuzzy comparison: lowercase name fields, their
/// file-system-safe forms and separator-free concatenations.
pub fn core_variants(game: &GameIdentity) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    for name in game.name_fields() {
        let lower = name.trim().to_lowercase();
        let safe = file_system_safe(&lower);
        push(&mut out, &strip_separators(&lower));
        push(&mut out, &strip_separators(&safe));
        push(&mut out, &safe);
        push(&mut out, &lower);
    }
    out
}

/// Replaces characters Windows forbids in file names with a space, trims, and
/// joins the remaining words with `_`.
pub fn file_system_safe(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|ch| {
            if INVALID_FILE_NAME_CHARS.contains(&ch) || ch.is_control() {
                ' '
            } else {
                ch
            }
        })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join("_")
}

fn expand_name(raw: &str, out: &mut BTreeSet<String>) {
    let raw = raw.trim();
    if raw.is_empty() {
        return;
    }
    let mut forms = vec![raw.to_string()];
    let safe = file_system_safe(raw);
    if !safe.is_empty() && safe != raw {
        forms.push(safe);
    }

    for form in &forms {
        let lower = form.to_lowercase();
        push(out, form);
        push(out, &lower);
        separator_permutations(&lower, out);
        acronym(form, out);
        simplifications(&lower, out);
        transliterations(&lower, out);
        number_words(&lower, out);
    }
}

fn separator_permutations(name: &str, out: &mut BTreeSet<String>) {
    for separator in NAME_SEPARATORS {
        if !name.contains(separator) {
            continue;
        }
        let parts: Vec<&str> = name.split(separator).filter(|part| !part.is_empty()).collect();
        for other in NAME_SEPARATORS {
            if other != separator {
                push(out, &parts.join(other.to_string().as_str()));
            }
        }
        push(out, &parts.concat());
    }
}

fn acronym(name: &str, out: &mut BTreeSet<String>) {
    let Some(splitter) = word_splitter() else {
        return;
    };
    let words: Vec<&str> = splitter
        .split(name)
        .filter(|word| !word.is_empty())
        .collect();
    if words.len() < 2 {
        return;
    }
    let letters: String = words
        .iter()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    push(out, &letters);
}

fn simplifications(lower: &str, out: &mut BTreeSet<String>) {
    for (word, replacements) in WORD_SIMPLIFICATIONS {
        if !lower.contains(word) {
            continue;
        }
        for replacement in *replacements {
            let simplified = lower.replace(word, replacement);
            push(out, &simplified);
            push(out, &strip_separators(&simplified));
        }
    }
}

fn transliterations(lower: &str, out: &mut BTreeSet<String>) {
    for (source, latin_forms) in TRANSLITERATIONS {
        if !lower.contains(source) {
            continue;
        }
        for latin in *latin_forms {
            push(out, &lower.replace(source, latin));
        }
    }
}

/// Replacements compound: each digit is rewritten on top of the previous
/// rewrite, and every intermediate string is kept.
fn number_words(lower: &str, out: &mut BTreeSet<String>) {
    let mut current = lower.to_string();
    for (digit, word) in NUMBER_WORDS {
        if current.contains(digit) {
            current = current.replace(digit, word);
            push(out, &current);
        }
    }
}

fn strip_separators(value: &str) -> String {
    value
        .chars()
        .filter(|ch| !NAME_SEPARATORS.contains(ch))
        .collect()
}

fn push(out: &mut BTreeSet<String>, value: &str) {
    let value = value.trim();
    if !value.is_empty() {
        out.insert(value.to_lowercase());
    }
}

/// Single-entry cache keyed by [`GameIdentity::composite_key`].
#[derive(Debug, Default)]
pub struct VariantCache {
    key: Option<String>,
    variants: VariantSet,
    core: VariantSet,
}

impl VariantCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regenerates both sets only when the identity's composite key changed.
    pub fn prepare(&mut self, game: &GameIdentity) -> (VariantSet, VariantSet) {
        let key = game.composite_key();
        if self.key.as_deref() != Some(key.as_str()) {
            self.variants = Arc::new(generate_variants(game));
            self.core = Arc::new(core_variants(game));
            tracing::debug!(
                event = "variant_cache_rebuilt",
                variant_count = self.variants.len(),
                core_count = self.core.len()
            );
            self.key = Some(key);
        }
        (Arc::clone(&self.variants), Arc::clone(&self.core))
    }
}

#[cfg(test)]
#[path = "../tests/variants_tests.inc"]
mod variants_tests;
