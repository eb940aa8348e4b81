//! Grade key normalization
//!
//! Supplier sheets, RFQs and the reference table spell the same steel grade
//! in different ways ("Steel Grade S235 JR", "s235jr", "S235-JR"). A
//! [`GradeKey`] is the canonical form used for equality joins.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Substrings removed from an uppercased grade before comparison
pub const NOISE_TOKENS: [&str; 2] = ["STEEL", "GRADE"];

/// Canonical grade designation. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GradeKey(String);

impl GradeKey {
    /// Canonicalize a raw grade string.
    ///
    /// Uppercases, trims, strips the noise tokens and then every space,
    /// underscore and hyphen. Returns `None` when nothing is left, so two
    /// missing grades can never join with each other.
    pub fn normalize(raw: &str) -> Option<GradeKey> {
        let mut grade = raw.trim().to_uppercase();
        for token in NOISE_TOKENS {
            grade = grade.replace(token, "");
        }
        grade.retain(|c| !matches!(c, ' ' | '_' | '-'));

        if grade.is_empty() {
            None
        } else {
            Some(GradeKey(grade))
        }
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for GradeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Canonical-form overrides applied before grade keys are joined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<(String, String)>", into = "Vec<(String, String)>")]
pub struct GradeAliases {
    aliases: AHashMap<GradeKey, GradeKey>,
}

impl GradeAliases {
    /// An alias table with no entries
    pub fn empty() -> Self {
        Self {
            aliases: AHashMap::new(),
        }
    }

    /// Register an alias. Both sides are normalized first; blank sides are ignored.
    #[must_use]
    pub fn with_alias(mut self, from: &str, to: &str) -> Self {
        self.insert(from, to);
        self
    }

    pub fn insert(&mut self, from: &str, to: &str) {
        if let (Some(from), Some(to)) = (GradeKey::normalize(from), GradeKey::normalize(to)) {
            self.aliases.insert(from, to);
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Substitute an alias if one is registered
    pub fn resolve(&self, key: GradeKey) -> GradeKey {
        match self.aliases.get(&key) {
            Some(canonical) => canonical.clone(),
            None => key,
        }
    }

    /// Normalize a raw grade and resolve its alias in one step
    pub fn join_key(&self, raw: Option<&str>) -> Option<GradeKey> {
        raw.and_then(GradeKey::normalize).map(|key| self.resolve(key))
    }
}

impl Default for GradeAliases {
    fn default() -> Self {
        Self::empty()
            .with_alias("S235J0", "S235JR")
            .with_alias("S235J2", "S235JR")
    }
}

impl From<Vec<(String, String)>> for GradeAliases {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut aliases = Self::empty();
        for (from, to) in &pairs {
            aliases.insert(from, to);
        }
        aliases
    }
}

impl From<GradeAliases> for Vec<(String, String)> {
    fn from(aliases: GradeAliases) -> Self {
        let mut pairs: Vec<(String, String)> = aliases
            .aliases
            .into_iter()
            .map(|(from, to)| (from.0, to.0))
            .collect();
        pairs.sort();
        pairs
    }
}
