/// Converts an arbitrary header column into a snake case key.
///
/// ASCII letters are lowercased, ASCII digits are kept, `%` becomes the word
/// `percent` and every other character separates words.
///
/// ```
/// use turbostat_events::sanitize_key;
///
/// assert_eq!(sanitize_key("CPU%c1"), "cpu_percent_c1");
/// ```
pub fn sanitize_key(raw: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut word = String::new();

    for ch in raw.chars() {
        match ch {
            'A'..='Z' => word.push(ch.to_ascii_lowercase()),
            'a'..='z' | '0'..='9' => word.push(ch),
            _ => {
                if !word.is_empty() {
                    words.push(std::mem::take(&mut word));
                }
                if ch == '%' {
                    words.push("percent".to_string());
                }
            }
        }
    }
    if !word.is_empty() {
        words.push(word);
    }

    words.join("_")
}
