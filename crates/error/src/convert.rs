use crate::{ErrorCode, QueryTrailError};

impl From<std::io::Error> for QueryTrailError {
    fn from(err: std::io::Error) -> Self {
        QueryTrailError::new(ErrorCode::Io, err.to_string())
    }
}

impl From<serde_json::Error> for QueryTrailError {
    fn from(err: serde_json::Error) -> Self {
        QueryTrailError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for QueryTrailError {
    fn from(err: serde_yaml::Error) -> Self {
        QueryTrailError::new(ErrorCode::InvalidYaml, err.to_string())
    }
}

impl From<csv::Error> for QueryTrailError {
    fn from(err: csv::Error) -> Self {
        QueryTrailError::new(ErrorCode::OutputWriteFailed, err.to_string())
    }
}

/// Suggest the option closest to `target`, if any is within edit distance 3.
pub fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = if ca == *cb { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_chars.len()]
}
