use crate::models::Profile;

// Weighted-sum compatibility, 0-100. Overlap components scale by how much of
// the viewer's own set the candidate covers, so the score is not symmetric
// unless both sides have reciprocal sets of equal size.
const W_AGE_RANGE: f64 = 20.0;
const W_ENTREPRENEUR_TYPE: f64 = 15.0;
const W_BUSINESS_STAGE: f64 = 15.0;
const W_LOOKING_FOR: f64 = 20.0;
const W_INTERESTS: f64 = 20.0;
const W_RELATIONSHIP_GOALS: f64 = 10.0;

/// Fraction of the viewer's set the candidate covers. Empty sets on either
/// side contribute nothing (divide-by-zero guard).
fn overlap_fraction(viewer_set: &[String], candidate_set: &[String]) -> f64 {
    if viewer_set.is_empty() || candidate_set.is_empty() {
        return 0.0;
    }
    let intersection = viewer_set
        .iter()
        .filter(|item| candidate_set.contains(item))
        .count();
    intersection as f64 / viewer_set.len() as f64
}

fn exact_match(a: &Option<String>, b: &Option<String>) -> bool {
    matches!((a, b), (Some(x), Some(y)) if x == y)
}

fn age_in_preferred_range(viewer: &Profile, candidate: &Profile) -> bool {
    match (candidate.age, viewer.age_min_pref, viewer.age_max_pref) {
        (Some(age), Some(min), Some(max)) => age >= min && age <= max,
        _ => false,
    }
}

/// Compatibility of `candidate` as seen by `viewer`.
pub fn compatibility_score(viewer: &Profile, candidate: &Profile) -> f64 {
    let mut score = 0.0;

    if age_in_preferred_range(viewer, candidate) {
        score += W_AGE_RANGE;
    }

    if exact_match(&viewer.entrepreneur_type, &candidate.entrepreneur_type) {
        score += W_ENTREPRENEUR_TYPE;
    }

    if exact_match(&viewer.business_stage, &candidate.business_stage) {
        score += W_BUSINESS_STAGE;
    }

    score += W_LOOKING_FOR * overlap_fraction(&viewer.looking_for_set(), &candidate.looking_for_set());
    score += W_INTERESTS * overlap_fraction(&viewer.interests_set(), &candidate.interests_set());

    if exact_match(&viewer.relationship_goals, &candidate.relationship_goals) {
        score += W_RELATIONSHIP_GOALS;
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn profile() -> Profile {
        Profile {
            id: Uuid::new_v4(),
            credential_id: Uuid::new_v4(),
            display_name: None,
            age: None,
            gender: None,
            interested_in: None,
            location: None,
            nationality: None,
            entrepreneur_type: None,
            business_stage: None,
            looking_for: serde_json::json!([]),
            interests: serde_json::json!([]),
            relationship_goals: None,
            age_min_pref: None,
            age_max_pref: None,
            bio: None,
            photos: serde_json::json!([]),
            onboarding_complete: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn looking_for_overlap_contributes_proportionally() {
        let mut viewer = profile();
        viewer.looking_for = serde_json::json!(["A", "B"]);
        let mut candidate = profile();
        candidate.looking_for = serde_json::json!(["A", "C"]);

        // 20 x (1/2) = 10
        assert_eq!(compatibility_score(&viewer, &candidate), 10.0);
    }

    #[test]
    fn empty_sets_score_zero_without_panicking() {
        let viewer = profile();
        let candidate = profile();
        assert_eq!(compatibility_score(&viewer, &candidate), 0.0);
    }

    #[test]
    fn age_range_fit_scores_twenty() {
        let mut viewer = profile();
        viewer.age_min_pref = Some(25);
        viewer.age_max_pref = Some(35);
        let mut candidate = profile();
        candidate.age = Some(30);

        assert_eq!(compatibility_score(&viewer, &candidate), 20.0);

        candidate.age = Some(36);
        assert_eq!(compatibility_score(&viewer, &candidate), 0.0);
    }

    #[test]
    fn full_match_scores_one_hundred() {
        let mut viewer = profile();
        viewer.age_min_pref = Some(25);
        viewer.age_max_pref = Some(35);
        viewer.entrepreneur_type = Some("founder".into());
        viewer.business_stage = Some("growth".into());
        viewer.relationship_goals = Some("long-term".into());
        viewer.looking_for = serde_json::json!(["cofounder"]);
        viewer.interests = serde_json::json!(["hiking"]);

        let mut candidate = profile();
        candidate.age = Some(30);
        candidate.entrepreneur_type = Some("founder".into());
        candidate.business_stage = Some("growth".into());
        candidate.relationship_goals = Some("long-term".into());
        candidate.looking_for = serde_json::json!(["cofounder"]);
        candidate.interests = serde_json::json!(["hiking"]);

        assert_eq!(compatibility_score(&viewer, &candidate), 100.0);
    }

    #[test]
    fn missing_fields_never_count_as_matching() {
        let viewer = profile();
        let candidate = profile();
        // Both entrepreneur_type are None; None == None must not score
        assert_eq!(compatibility_score(&viewer, &candidate), 0.0);
    }

    #[test]
    fn asymmetric_sets_give_asymmetric_scores() {
        let mut a = profile();
        a.looking_for = serde_json::json!(["A"]);
        let mut b = profile();
        b.looking_for = serde_json::json!(["A", "B", "C", "D"]);

        // A's whole set is covered; B's is only a quarter covered
        assert_eq!(compatibility_score(&a, &b), 20.0);
        assert_eq!(compatibility_score(&b, &a), 5.0);
    }
}
