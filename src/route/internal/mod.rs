pub(crate) mod trie;
