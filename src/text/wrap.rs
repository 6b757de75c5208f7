//! Greedy word wrapping.

/// Splits `text` on whitespace and packs words into lines no wider than
/// `max_width` as reported by `measure`.
///
/// A word that does not fit closes the current line and starts the next
/// one. A single word wider than `max_width` still gets a line of its own;
/// words are never split.
pub fn wrap_text(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_owned()
        } else {
            format!("{current} {word}")
        };

        if measure(&candidate) <= max_width {
            current = candidate;
        } else {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            current = word.to_owned();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
