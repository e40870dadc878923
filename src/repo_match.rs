//! Fuzzy repository-name resolution.
//!
//! Maps a free-text topic ("make me a graphflix clone") onto the single most
//! plausible repository in a user's repository list. Tokens survive a
//! stop-word pass, get joined into naming-convention variants, and every
//! known repository name is scored against the variants through a tiered
//! rule: the first tier that matches decides the score, and the
//! highest-scoring candidate wins.
//!
//! When nothing scores above zero the caller falls back to a fixed chain of
//! platform search queries, from most to least precise.

/// Words that never contribute to a repository name.
const STOP_WORDS: &[&str] = &[
    // articles and glue
    "a", "an", "the", "and", "or", "of", "for", "with", "in", "on", "to", "from", "about",
    // request verbs
    "make", "create", "build", "made", "making", "creating", "building", "want", "need",
    "use", "using", "get", "show", "find", "help", "generate", "write",
    // pronouns
    "i", "me", "my", "we", "us", "our", "you", "your", "it", "its", "this", "that", "them",
    "is", "are", "was", "how", "please",
];

/// A scored match against a known repository name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoMatch {
    /// The repository name as it appears in the known list (may be
    /// `owner/name` or bare `name`).
    pub name: String,
    pub score: u32,
}

/// Extract candidate name tokens from a topic: lowercase, stop words
/// removed, and only tokens longer than two characters kept.
pub fn extract_tokens(topic: &str) -> Vec<String> {
    topic
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric() && c != '-' && c != '_')
        .map(|t| t.trim_matches(|c| c == '-' || c == '_'))
        .filter(|t| t.len() > 2 && !STOP_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

/// Generate repository-name variants from extracted tokens.
///
/// Multi-token topics produce hyphen-, underscore-, space-joined, and
/// concatenated forms; single-token topics produce the token plus common
/// affix spellings.
pub fn name_variants(tokens: &[String]) -> Vec<String> {
    match tokens {
        [] => Vec::new(),
        [single] => vec![
            single.clone(),
            format!("{}-api", single),
            format!("{}-app", single),
            format!("{}-project", single),
        ],
        many => vec![
            many.join("-"),
            many.join("_"),
            many.concat(),
            many.join(" "),
        ],
    }
}

/// Score one known repository name against the variants.
///
/// Tiers, highest priority first; the first matching tier wins:
/// 1. exact match against a token-join form: 100
/// 2. name starts with a variant at a `-`/`_` boundary: 90
/// 3. name ends with a variant at a `-`/`_` boundary: 85
/// 4. a variant is contained in the name: 80
/// 5. the name is contained in a variant: 75
/// 6. the name contains every extracted token: 70 + 5 x token count
///
/// The affix spellings (`foo-api` and friends) never claim the exact tier;
/// a repo named `foo-api` scores 90 for the topic "foo", so the true exact
/// match `foo` still outranks it. Prefixes without a separator boundary
/// (`foobar`) fall to the contains tier.
pub fn score_name(known: &str, variants: &[String], tokens: &[String]) -> u32 {
    let name = bare_name(known).to_lowercase();

    if exact_forms(tokens).iter().any(|v| name == *v) {
        return 100;
    }
    if variants.iter().any(|v| starts_at_boundary(&name, v)) {
        return 90;
    }
    if variants.iter().any(|v| ends_at_boundary(&name, v)) {
        return 85;
    }
    if variants.iter().any(|v| name.contains(v.as_str())) {
        return 80;
    }
    if variants.iter().any(|v| v.contains(name.as_str())) {
        return 75;
    }
    if !tokens.is_empty() && tokens.iter().all(|t| name.contains(t.as_str())) {
        return 70 + 5 * tokens.len() as u32;
    }
    0
}

/// The forms eligible for the exact tier: the token itself for a single
/// token, the join spellings for multiple. Never the affix spellings.
fn exact_forms(tokens: &[String]) -> Vec<String> {
    match tokens {
        [single] => vec![single.clone()],
        many => name_variants(many),
    }
}

fn starts_at_boundary(name: &str, variant: &str) -> bool {
    name.len() > variant.len()
        && name.starts_with(variant)
        && matches!(name.as_bytes()[variant.len()], b'-' | b'_')
}

fn ends_at_boundary(name: &str, variant: &str) -> bool {
    name.len() > variant.len()
        && name.ends_with(variant)
        && matches!(name.as_bytes()[name.len() - variant.len() - 1], b'-' | b'_')
}

/// Pick the single best-scoring repository from the known list, or `None`
/// when nothing scores above zero. Earlier entries win exact score ties.
pub fn best_match(topic: &str, known_repos: &[String]) -> Option<RepoMatch> {
    let tokens = extract_tokens(topic);
    let variants = name_variants(&tokens);
    if variants.is_empty() {
        return None;
    }

    let mut best: Option<RepoMatch> = None;
    for known in known_repos {
        let score = score_name(known, &variants, &tokens);
        if score == 0 {
            continue;
        }
        match &best {
            Some(current) if current.score >= score => {}
            _ => {
                best = Some(RepoMatch {
                    name: known.clone(),
                    score,
                })
            }
        }
    }
    best
}

/// Direct platform search queries to try, most precise first, when no known
/// repository matched. The caller stops at the first strategy returning at
/// least one result.
pub fn fallback_queries(topic: &str, login: &str) -> Vec<String> {
    let tokens = extract_tokens(topic);
    let variants = name_variants(&tokens);
    let keywords = if tokens.is_empty() {
        topic.to_string()
    } else {
        tokens.join(" ")
    };

    let mut queries = Vec::new();
    if let Some(first) = variants.first() {
        queries.push(format!("repo:{}/{}", login, first));
    }
    if let Some(second) = variants.get(1) {
        queries.push(format!("repo:{}/{}", login, second));
    }
    queries.push(format!("{} user:{} in:name", keywords, login));
    queries.push(format!("{} in:name,description", keywords));
    queries
}

/// Unscoped keyword query for when identity or repository listing is
/// unavailable. Lower precision, acknowledged.
pub fn unscoped_query(topic: &str) -> String {
    let tokens = extract_tokens(topic);
    let keywords = if tokens.is_empty() {
        topic.to_string()
    } else {
        tokens.join(" ")
    };
    format!("{} in:name,description", keywords)
}

/// Strip an `owner/` prefix if present.
fn bare_name(known: &str) -> &str {
    known.rsplit('/').next().unwrap_or(known)
}
