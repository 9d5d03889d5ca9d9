const PREFIX_SCALE: f64 = 0.1;
const MAX_PREFIX: usize = 4;

/// Jaro similarity over Unicode scalar values. Two empty strings are equal;
/// one empty string matches nothing.
pub fn jaro(left: &str, right: &str) -> f64 {
    let left: Vec<char> = left.chars().collect();
    let right: Vec<char> = right.chars().collect();
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let window = (left.len().max(right.len()) / 2).saturating_sub(1);
    let mut left_matched = vec![false; left.len()];
    let mut right_matched = vec![false; right.len()];
    let mut matches = 0usize;

    for (index, ch) in left.iter().enumerate() {
        let start = index.saturating_sub(window);
        let end = (index + window + 1).min(right.len());
        for other in start..end {
            if right_matched[other] || right[other] != *ch {
                continue;
            }
            left_matched[index] = true;
            right_matched[other] = true;
            matches += 1;
            break;
        }
    }

    if matches == 0 {
        return 0.0;
    }

    let mut transpositions = 0usize;
    let mut cursor = 0usize;
    for (index, ch) in left.iter().enumerate() {
        if !left_matched[index] {
            continue;
        }
        while !right_matched[cursor] {
            cursor += 1;
        }
        if right[cursor] != *ch {
            transpositions += 1;
        }
        cursor += 1;
    }

    let matches = matches as f64;
    let half_transpositions = transpositions as f64 / 2.0;
    (matches / left.len() as f64
        + matches / right.len() as f64
        + (matches - half_transpositions) / matches)
        / 3.0
}

/// Jaro-Winkler similarity in `[0, 1]`, boosting a shared prefix of up to four
/// characters.
pub fn jaro_winkler(left: &str, right: &str) -> f64 {
    let similarity = jaro(left, right);
    let prefix = left
        .chars()
        .zip(right.chars())
        .take(MAX_PREFIX)
        .take_while(|(a, b)| a == b)
        .count();
    similarity + prefix as f64 * PREFIX_SCALE * (1.0 - similarity)
}

#[cfg(test)]
#[path = "../tests/similarity_tests.inc"]
mod similarity_tests;
