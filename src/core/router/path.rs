use std::borrow::Cow;
use std::sync::OnceLock;

use regex::Regex;

fn multi_slash() -> &'static Regex {
    static MULTI_SLASH: OnceLock<Regex> = OnceLock::new();
    MULTI_SLASH.get_or_init(|| Regex::new("/{2,}").expect("multi slash regexp"))
}

/// Collapses every run of consecutive slashes into a single `/`.
///
/// The input is borrowed back unchanged when it holds no `//`.
pub fn fix_path(path: &str) -> Cow<'_, str> {
    if !path.contains("//") {
        return Cow::Borrowed(path);
    }
    multi_slash().replace_all(path, "/")
}
