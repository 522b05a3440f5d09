//! Text rendering utilities for human-friendly diagnostics.
//!
//! Provides helpers to format provider chains, shorten type names,
//! and rank binding keys for "did you mean?" hints.

/// Separator placed between links of a rendered chain.
pub const CHAIN_SEPARATOR: &str = " -> ";

/// Renders a chain of names as a single line.
///
/// # Examples
/// ```
/// use tartib_support::rendering::render_chain;
///
/// let chain = vec!["CacheProvider", "QueueProvider", "MailProvider", "CacheProvider"];
/// assert_eq!(
///     render_chain(&chain),
///     "CacheProvider -> QueueProvider -> MailProvider -> CacheProvider"
/// );
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(CHAIN_SEPARATOR)
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use tartib_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::providers::cache::CacheProvider");
/// assert_eq!(short, "CacheProvider");
///
/// let short = shorten_type_name("my_app::Wrapper<my_app::db::OrmProvider>");
/// assert_eq!(short, "Wrapper<OrmProvider>");
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Ranks `available` names by similarity to `requested`.
///
/// Substring matches score highest, then matches on the shortened name,
/// then names sharing a prefix of at least three characters. Names with no
/// resemblance are dropped.
///
/// ```
/// use tartib_support::rendering::suggest_similar;
///
/// let available = ["app.cache", "app.queue", "app.config"];
/// let hints = suggest_similar("cache", &available, 3);
/// assert_eq!(hints, vec!["app.cache".to_string()]);
/// ```
pub fn suggest_similar(requested: &str, available: &[&str], max_suggestions: usize) -> Vec<String> {
    let requested_lower = requested.to_lowercase();
    let requested_short = shorten_type_name(requested).to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();
            let name_short = shorten_type_name(name).to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            if name_short.contains(&requested_short) || requested_short.contains(&name_short) {
                return Some((name, 80));
            }

            let common = name_short
                .chars()
                .zip(requested_short.chars())
                .take_while(|(a, b)| a == b)
                .count();

            (common >= 3).then_some((name, common * 10))
        })
        .collect();

    // stable: equal scores keep the caller's order
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}
