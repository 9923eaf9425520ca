/// Levenshtein edit distance between two strings, counted in `char`s.
///
/// Uses the classic dynamic-programming recurrence with two rolling rows.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = if a[i - 1] == b[j - 1] { 0 } else { 1 };
            current[j] = (previous[j] + 1) // deletion
                .min(current[j - 1] + 1) // insertion
                .min(previous[j - 1] + cost); // substitution
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Similarity score in `0.0..=1.0` derived from the edit distance.
///
/// Identical names score `1.0`; if either name is empty the score is `0.0`.
/// Otherwise the score is `(len(longer) - distance) / len(longer)`.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let (longer, shorter, longer_len) = if len_a > len_b {
        (a, b, len_a)
    } else {
        (b, a, len_b)
    };

    let distance = levenshtein_distance(longer, shorter);
    (longer_len - distance) as f64 / longer_len as f64
}

/// Turns an arbitrary plugin name into an identifier made of `[a-z0-9_]`.
///
/// Lowercases, replaces every other character with `_`, collapses runs of
/// underscores and strips them from both ends.
pub fn sanitize_identifier(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut last_was_underscore = false;

    for ch in name.chars().flat_map(char::to_lowercase) {
        let ch = if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '_' {
            ch
        } else {
            '_'
        };

        if ch == '_' {
            if last_was_underscore {
                continue;
            }
            last_was_underscore = true;
        } else {
            last_was_underscore = false;
        }
        sanitized.push(ch);
    }

    sanitized.trim_matches('_').to_string()
}
