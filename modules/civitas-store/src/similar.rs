use chrono::{Duration, Utc};
use regex::{Regex, RegexBuilder};
use uuid::Uuid;

use civitas_common::{geo, CivitasError, ComplaintCategory, GeoPoint, Result, SimilarComplaint};

use crate::rows::db_err;
use crate::StoreClient;

/// Search radius around the candidate submission.
const SIMILAR_RADIUS_M: f64 = 200.0;

/// Only complaints submitted within this window qualify.
const SIMILAR_WINDOW_DAYS: i64 = 14;

/// Maximum number of matches surfaced to the citizen.
const SIMILAR_LIMIT: usize = 5;

/// Parameters for a duplicate search, taken from the complaint form the
/// citizen is still composing.
#[derive(Debug, Clone)]
pub struct SimilarQuery {
    pub lat: f64,
    pub lng: f64,
    pub category: ComplaintCategory,
    pub description: String,
    /// The requesting citizen; their own complaints never match.
    pub exclude_user: Uuid,
}

/// Finds nearby, textually overlapping, still-open complaints so citizens
/// can support an existing report instead of filing a duplicate.
#[derive(Clone)]
pub struct SimilarityMatcher {
    client: StoreClient,
}

/// A candidate row with its location, before distance/keyword filtering.
struct Candidate {
    similar: SimilarComplaint,
    location: GeoPoint,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    id: Uuid,
    category: String,
    sub_type: String,
    description: String,
    status: String,
    lat: f64,
    lng: f64,
    submitted_at: chrono::DateTime<chrono::Utc>,
    support_count: i64,
    user_supported: bool,
}

impl SimilarityMatcher {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    /// Find open complaints the candidate submission likely duplicates,
    /// ranked by support count then recency, capped at five.
    pub async fn find_similar(&self, query: &SimilarQuery) -> Result<Vec<SimilarComplaint>> {
        let probe = GeoPoint::new(query.lat, query.lng);
        if !probe.is_valid() || query.description.trim().is_empty() {
            return Err(CivitasError::Validation(
                "location, category, and description are required to find similar complaints"
                    .to_string(),
            ));
        }

        let cells = geo::bucket_cells(query.lat, query.lng);
        let cutoff = Utc::now() - Duration::days(SIMILAR_WINDOW_DAYS);

        let rows = sqlx::query_as::<_, CandidateRow>(
            "SELECT c.id, c.category, c.sub_type, c.description, c.status, c.lat, c.lng, \
                    c.submitted_at, \
                    COUNT(s.user_id) AS support_count, \
                    COUNT(*) FILTER (WHERE s.user_id = $5) > 0 AS user_supported \
             FROM complaints c \
             LEFT JOIN complaint_supporters s ON s.complaint_id = c.id \
             WHERE c.geohash6 = ANY($1) \
               AND c.category = $2 \
               AND c.status NOT IN ('Resolved', 'Rejected') \
               AND c.submitted_at >= $3 \
               AND c.submitted_by <> $4 \
             GROUP BY c.id",
        )
        .bind(&cells)
        .bind(query.category.as_str())
        .bind(cutoff)
        .bind(query.exclude_user)
        .bind(query.exclude_user)
        .fetch_all(&self.client.pool)
        .await
        .map_err(db_err)?;

        let candidates = rows
            .into_iter()
            .map(Candidate::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(filter_and_rank(probe, &query.description, candidates))
    }
}

impl TryFrom<CandidateRow> for Candidate {
    type Error = CivitasError;

    fn try_from(row: CandidateRow) -> Result<Self> {
        Ok(Candidate {
            location: GeoPoint::new(row.lat, row.lng),
            similar: SimilarComplaint {
                id: row.id,
                category: row.category.parse().map_err(CivitasError::Database)?,
                sub_type: row.sub_type,
                description: row.description,
                status: row.status.parse().map_err(CivitasError::Database)?,
                support_count: row.support_count.max(0) as u32,
                user_supported: row.user_supported,
                submitted_at: row.submitted_at,
            },
        })
    }
}

/// One case-insensitive pattern per word of the draft description.
fn keyword_patterns(description: &str) -> Vec<Regex> {
    description
        .split_whitespace()
        .filter_map(|word| {
            RegexBuilder::new(&regex::escape(word))
                .case_insensitive(true)
                .build()
                .ok()
        })
        .collect()
}

/// Keyword containment: any single shared word counts as overlap. Common
/// words ("the", "road") match broadly, so this over-reports rather than
/// under-reports; the support counts in the ranking push the noise down.
fn matches_any(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Distance + keyword filter, then rank by support count descending and
/// recency descending, capped at [`SIMILAR_LIMIT`].
fn filter_and_rank(
    probe: GeoPoint,
    description: &str,
    candidates: Vec<Candidate>,
) -> Vec<SimilarComplaint> {
    let patterns = keyword_patterns(description);
    let mut hits: Vec<SimilarComplaint> = candidates
        .into_iter()
        .filter(|c| {
            geo::haversine_m(probe.lat, probe.lng, c.location.lat, c.location.lng)
                <= SIMILAR_RADIUS_M
        })
        .filter(|c| matches_any(&patterns, &c.similar.description))
        .map(|c| c.similar)
        .collect();
    hits.sort_by(|a, b| {
        b.support_count
            .cmp(&a.support_count)
            .then(b.submitted_at.cmp(&a.submitted_at))
    });
    hits.truncate(SIMILAR_LIMIT);
    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Utc};
    use civitas_common::ComplaintStatus;

    fn probe() -> GeoPoint {
        GeoPoint::new(12.9716, 77.5946)
    }

    fn candidate(
        description: &str,
        location: GeoPoint,
        support_count: u32,
        submitted_at: DateTime<Utc>,
    ) -> Candidate {
        Candidate {
            location,
            similar: SimilarComplaint {
                id: Uuid::new_v4(),
                category: ComplaintCategory::RoadInfrastructure,
                sub_type: "Pothole / Damaged Road".to_string(),
                description: description.to_string(),
                status: ComplaintStatus::Pending,
                support_count,
                user_supported: false,
                submitted_at,
            },
        }
    }

    fn hours_ago(h: i64) -> DateTime<Utc> {
        Utc::now() - Duration::hours(h)
    }

    #[test]
    fn overlapping_nearby_complaint_matches() {
        // ~100 m east of the probe.
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "large pothole on main road",
            vec![candidate("big pothole near main street", near, 0, hours_ago(2))],
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn distant_complaint_is_cut() {
        // ~500 m east of the probe — outside the 200 m radius.
        let far = GeoPoint::new(12.9716, 77.5992);
        let hits = filter_and_rank(
            probe(),
            "large pothole on main road",
            vec![candidate("big pothole near main street", far, 3, hours_ago(2))],
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn no_shared_word_no_match() {
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "streetlight flickering",
            vec![candidate("garbage overflowing", near, 0, hours_ago(2))],
        );
        assert!(hits.is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "POTHOLE spotted",
            vec![candidate("deep pothole here today", near, 0, hours_ago(2))],
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn common_word_overlap_still_matches() {
        // The heuristic's known weakness: "the" alone is enough.
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "the drain overflowed",
            vec![candidate("cow blocking the junction", near, 0, hours_ago(2))],
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn ranked_by_support_then_recency() {
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "pothole report",
            vec![
                candidate("pothole a", near, 1, hours_ago(1)),
                candidate("pothole b", near, 5, hours_ago(48)),
                candidate("pothole c", near, 5, hours_ago(2)),
            ],
        );
        let descriptions: Vec<&str> = hits.iter().map(|h| h.description.as_str()).collect();
        assert_eq!(descriptions, vec!["pothole c", "pothole b", "pothole a"]);
    }

    #[test]
    fn capped_at_five() {
        let near = GeoPoint::new(12.9716, 77.59552);
        let candidates = (0..8)
            .map(|i| candidate("pothole again", near, i, hours_ago(i as i64)))
            .collect();
        let hits = filter_and_rank(probe(), "pothole", candidates);
        assert_eq!(hits.len(), SIMILAR_LIMIT);
        // Highest support first.
        assert_eq!(hits[0].support_count, 7);
    }

    #[test]
    fn regex_metacharacters_in_description_are_literal() {
        let near = GeoPoint::new(12.9716, 77.59552);
        let hits = filter_and_rank(
            probe(),
            "broken (footpath)",
            vec![candidate("broken slab on footpath", near, 0, hours_ago(2))],
        );
        // "broken" matches literally; "(footpath)" must not panic the matcher.
        assert_eq!(hits.len(), 1);
    }
}
