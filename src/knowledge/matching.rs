use super::cosine_similarity;
use super::index::CorpusEntry;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matched {
    pub index: usize,
    pub similarity: f32,
}

/// Exhaustive scan for the most similar entry. Ties keep the earliest
/// entry. `None` only for an empty corpus.
pub fn best_match(entries: &[CorpusEntry], vector: &[f32]) -> Option<Matched> {
    let mut best: Option<Matched> = None;
    for (index, entry) in entries.iter().enumerate() {
        let similarity = cosine_similarity(vector, &entry.embedding);
        trace!("index: {}, similarity: {}", index, similarity);
        match best {
            Some(b) if similarity <= b.similarity => {}
            _ => best = Some(Matched { index, similarity }),
        }
    }
    debug!("best match: {:?}", best);

    best
}
