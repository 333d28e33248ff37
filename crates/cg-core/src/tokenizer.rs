/// Tokenize text for similarity scoring.
/// Case-folds, then splits on any run of whitespace.
/// No stemming, no punctuation stripping: `"mat."` and `"mat"` differ.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
