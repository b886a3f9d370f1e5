use std::collections::HashSet;

use crate::entities::{blog_post::BlogPost, project::Project};

/// Something the related-content ranker can score: an id and a list of
/// labels compared against the reference entity's labels.
pub trait Labelled {
    fn id(&self) -> &str;
    fn labels(&self) -> &[String];
}

impl Labelled for Project {
    fn id(&self) -> &str {
        &self.id
    }

    fn labels(&self) -> &[String] {
        &self.technologies
    }
}

impl Labelled for BlogPost {
    fn id(&self) -> &str {
        &self.id
    }

    fn labels(&self) -> &[String] {
        &self.tags
    }
}

/// Whether candidates sharing no label with the reference stay in the
/// result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZeroScorePolicy {
    Keep,
    Drop,
}

/// Number of the candidate's labels found in the reference set. A label
/// repeated on the candidate counts each time.
pub fn relevance_score(candidate: &[String], reference: &HashSet<&str>) -> usize {
    candidate
        .iter()
        .filter(|label| reference.contains(label.as_str()))
        .count()
}

/// Orders `candidates` by shared labels, highest first, keeping store order
/// among equal scores, and returns at most `limit` of them. The entity
/// identified by `exclude_id` never appears in the result.
pub fn rank_related<T: Labelled>(
    candidates: Vec<T>,
    exclude_id: &str,
    reference: &[String],
    limit: usize,
    zero_scores: ZeroScorePolicy,
) -> Vec<T> {
    let reference: HashSet<&str> = reference.iter().map(String::as_str).collect();

    let mut scored: Vec<(usize, T)> = candidates
        .into_iter()
        .filter(|c| c.id() != exclude_id)
        .map(|c| (relevance_score(c.labels(), &reference), c))
        .filter(|(score, _)| zero_scores == ZeroScorePolicy::Keep || *score > 0)
        .collect();

    // `sort_by` is stable, so ties keep store order.
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.truncate(limit);
    scored.into_iter().map(|(_, c)| c).collect()
}
