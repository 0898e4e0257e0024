/// Pick the word form that agrees with `pretext`.
///
/// `plural_word` is the plural (or third-person-silent) form; the singular
/// is derived by dropping the trailing character. A bare `1` takes the
/// singular; any other bare integer keeps the plural; a task-set
/// description containing the word `tasks` denotes more than one task and
/// takes the dropped-character form; anything else is left unchanged.
pub fn word_form(pretext: &str, plural_word: &str) -> String {
    let trimmed = pretext.trim();
    if !trimmed.is_empty() && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if trimmed == "1" {
            return drop_last(plural_word);
        }
        return plural_word.to_string();
    }
    if trimmed.split_whitespace().any(|w| w == "tasks") {
        return drop_last(plural_word);
    }
    plural_word.to_string()
}

/// Drop a trailing `s` if present, else return the word unchanged.
pub fn to_singular(word: &str) -> String {
    word.strip_suffix('s').unwrap_or(word).to_string()
}

fn drop_last(word: &str) -> String {
    let mut s = word.to_string();
    s.pop();
    s
}
