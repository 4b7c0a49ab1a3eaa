//! Anchor-safe identifiers derived from heading names

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());
static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9\-_]+").unwrap());
static HYPHEN_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"-+").unwrap());
static EDGE_HYPHEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^-|-$").unwrap());
static LEADING_NON_LETTERS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[^a-z]+").unwrap());

/// Base used by [`IdPool::unique_id`] when a name formats to nothing
pub const FALLBACK_ID: &str = "section";

/// Replace the accented characters the slug knows about with their base letter
fn fold_accent(c: char) -> char {
    match c {
        'ã' | 'à' | 'á' | 'ä' | 'â' => 'a',
        'ẽ' | 'è' | 'é' | 'ë' | 'ê' => 'e',
        'ì' | 'í' | 'ï' | 'î' => 'i',
        'õ' | 'ò' | 'ó' | 'ö' | 'ô' => 'o',
        'ù' | 'ú' | 'ü' | 'û' => 'u',
        'ñ' => 'n',
        'ç' => 'c',
        other => other,
    }
}

/// Format text into an ID/anchor safe value
///
/// # Examples
/// "Getting Started" -> "getting-started", "2. Über Café" -> "uber-cafe"
pub fn format_id(text: &str) -> String {
    let folded: String = text.to_lowercase().chars().map(fold_accent).collect();
    let s = WHITESPACE.replace_all(&folded, "-");
    let s = DISALLOWED.replace_all(&s, "-");
    let s = HYPHEN_RUNS.replace_all(&s, "-");
    let s = EDGE_HYPHEN.replace_all(&s, "");
    LEADING_NON_LETTERS.replace_all(&s, "").into_owned()
}

/// Ids already handed out within one namespace
///
/// A pool can be shared by several documents that end up on the same page.
#[derive(Debug, Clone, Default)]
pub struct IdPool {
    assigned: HashSet<String>,
}

impl IdPool {
    /// Create an empty pool
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pool that already reserves `ids`
    pub fn seeded<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assigned: ids.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `id` has been handed out
    pub fn contains(&self, id: &str) -> bool {
        self.assigned.contains(id)
    }

    /// Number of reserved ids
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Whether nothing has been reserved
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Format `id` and make it unique within the pool, reserving the result
    ///
    /// Collisions get an incrementing suffix: "intro", "intro-1", "intro-2", ...
    /// Names with nothing left after formatting (like "1234" or "!!") start
    /// from [`FALLBACK_ID`], so the result is never empty.
    pub fn unique_id(&mut self, id: &str) -> String {
        let mut base = format_id(id);
        if base.is_empty() {
            base = FALLBACK_ID.to_string();
        }
        let mut assigned = base.clone();
        let mut i = 1;

        while self.assigned.contains(&assigned) {
            assigned = format!("{}-{}", base, i);
            i += 1;
        }

        self.assigned.insert(assigned.clone());
        assigned
    }
}
