/* src/server/engine/rust/src/suggest.rs */

//! "Did you mean" suggestions for mistyped variant names.

/// Number of suggestions attached to an unknown-variant diagnostic.
pub const SUGGESTION_LIMIT: usize = 3;

/// Edit distance between two strings, counted in chars.
pub fn levenshtein(a: &str, b: &str) -> usize {
  let b: Vec<char> = b.chars().collect();
  let mut prev: Vec<usize> = (0..=b.len()).collect();
  let mut curr = vec![0; b.len() + 1];
  for (i, ca) in a.chars().enumerate() {
    curr[0] = i + 1;
    for (j, cb) in b.iter().enumerate() {
      let cost = usize::from(ca != *cb);
      curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
    }
    std::mem::swap(&mut prev, &mut curr);
  }
  prev[b.len()]
}

/// Up to `limit` candidates closest to `name`, compared case-insensitively.
/// Equal distances keep the candidates' original order.
pub fn closest<'a>(
  name: &str,
  candidates: impl IntoIterator<Item = &'a str>,
  limit: usize,
) -> Vec<&'a str> {
  let needle = name.to_lowercase();
  let mut scored: Vec<(usize, &'a str)> =
    candidates.into_iter().map(|c| (levenshtein(&needle, &c.to_lowercase()), c)).collect();
  scored.sort_by_key(|(distance, _)| *distance);
  scored.into_iter().take(limit).map(|(_, c)| c).collect()
}
