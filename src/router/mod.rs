pub mod options;
pub mod trie;
