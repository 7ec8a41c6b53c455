use lazy_static::lazy_static;
use regex::Regex;

/// Maximum number of account identifiers accepted by a single run.
pub const MAX_ACCOUNT_IDS: usize = 200;

lazy_static! {
    static ref ACCOUNT_ID_RE: Regex = Regex::new(r"^[a-zA-Z0-9]{15,18}$").unwrap();
    static ref SEPARATOR_RE: Regex = Regex::new(r"[\s,;]+").unwrap();
}

/// Sanitize candidate account identifiers: tokens are trimmed, tokens which
/// aren't 15 to 18 alphanumeric characters are dropped, duplicates are removed
/// preserving first occurrence, and the result is capped at MAX_ACCOUNT_IDS.
pub fn sanitize_account_ids<I, S>(candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();

    for candidate in candidates {
        let token = candidate.as_ref().trim();

        if !ACCOUNT_ID_RE.is_match(token) {
            if !token.is_empty() {
                tracing::debug!(token, "dropping invalid account identifier");
            }
            continue;
        }
        if out.iter().any(|id| id == token) {
            continue;
        }
        if out.len() == MAX_ACCOUNT_IDS {
            tracing::debug!(max = MAX_ACCOUNT_IDS, "truncating account identifiers");
            break;
        }
        out.push(token.to_string());
    }
    out
}

/// Parse account identifiers from free text, separated by whitespace, commas
/// or semicolons, and sanitize them.
pub fn parse_account_ids(text: &str) -> Vec<String> {
    sanitize_account_ids(SEPARATOR_RE.split(text))
}
