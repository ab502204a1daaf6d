use serde::Deserialize;

/// Options for the trie, fixed at construction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Options {
    // Ignore case when matching literal URL path segments.
    pub ignore_case: bool,

    // If enabled, the trie detects when the current path can't be matched
    // but a handler for the fixed path exists.
    // Matched::fpr then carries the redirect path.
    // For example when "/api/foo" is defined and "/api//foo" is matched,
    // Matched::fpr is "/api/foo".
    pub fixed_path_redirect: bool,

    // If enabled, the trie detects when the current path can't be matched
    // but a handler for the path with (without) the trailing slash exists.
    // For example when "/api/foo" is defined and "/api/foo/" is matched,
    // Matched::tsr is "/api/foo".
    pub trailing_slash_redirect: bool,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            ignore_case: true,
            fixed_path_redirect: true,
            trailing_slash_redirect: true,
        }
    }
}
