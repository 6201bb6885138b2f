//! Lexical similarity features shared by the reference embedder and reranker
//!
//! All similarity functions return a score in range [0.0, 1.0] where 1.0 means
//! identical.

use ahash::AHashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Lowercased alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// Fraction of query tokens that also occur in the document
pub fn token_coverage(query: &str, document: &str) -> f32 {
    let query_tokens: AHashSet<String> = tokenize(query).into_iter().collect();
    if query_tokens.is_empty() {
        return 0.0;
    }
    let doc_tokens: AHashSet<String> = tokenize(document).into_iter().collect();
    let hits = query_tokens.iter().filter(|t| doc_tokens.contains(*t)).count();
    hits as f32 / query_tokens.len() as f32
}

/// Trigram similarity between two strings
pub fn trigram_similarity(a: &str, b: &str) -> f32 {
    let trigrams_a = generate_trigrams(&a.to_lowercase());
    let trigrams_b = generate_trigrams(&b.to_lowercase());

    if trigrams_a.is_empty() && trigrams_b.is_empty() {
        return 1.0;
    }

    if trigrams_a.is_empty() || trigrams_b.is_empty() {
        return 0.0;
    }

    let intersection = trigrams_a.intersection(&trigrams_b).count();
    let union = trigrams_a.union(&trigrams_b).count();

    if union == 0 { 0.0 } else { intersection as f32 / union as f32 }
}

/// Generate character trigrams from a string
pub fn generate_trigrams(s: &str) -> AHashSet<String> {
    let padded = format!("  {}  ", s);
    let chars: Vec<char> = padded.chars().collect();

    if chars.len() < 3 {
        return AHashSet::new();
    }

    chars.windows(3)
        .map(|w| w.iter().collect::<String>())
        .collect()
}

/// Feature-hash text into a unit vector of `dim` components.
///
/// Character trigrams add 1.0 to their bucket, whole tokens add 2.0.
pub fn hash_text_to_vector(text: &str, dim: usize) -> Vec<f32> {
    let mut vector = vec![0.0f32; dim];
    if dim == 0 {
        return vector;
    }
    let normalized = text.to_lowercase();

    for trigram in generate_trigrams(&normalized) {
        vector[bucket(&trigram, dim)] += 1.0;
    }

    for word in tokenize(&normalized) {
        vector[bucket(&word, dim)] += 2.0;
    }

    let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if magnitude > 0.0 {
        for v in &mut vector {
            *v /= magnitude;
        }
    }

    vector
}

fn bucket(feature: &str, dim: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    feature.hash(&mut hasher);
    (hasher.finish() % dim as u64) as usize
}
