use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::collections::HashSet;
use uuid::Uuid;

use ematch_shared::errors::{AppError, AppResult, ErrorCode};

use crate::models::{Profile, RejectedProfile};
use crate::schema::{profiles, rejected_profiles};

/// Which genders the viewer should see. `None` means no gender filter.
///
/// `interested_in` wins when set ("both" drops the filter); profiles that
/// never set it fall back to the complement of their own gender.
pub fn show_genders(viewer: &Profile) -> Option<Vec<String>> {
    match viewer.interested_in.as_deref() {
        Some("both") => None,
        Some(gender) => Some(vec![gender.to_string()]),
        None => match viewer.gender.as_deref() {
            Some("male") => Some(vec!["female".to_string()]),
            Some("female") => Some(vec!["male".to_string()]),
            _ => None,
        },
    }
}

/// Profile ids suppressed by a rejection that has not yet expired.
/// Expired rejections (`expires_at <= now`) must not hide anyone.
pub fn active_rejection_ids(rejections: &[RejectedProfile], now: DateTime<Utc>) -> HashSet<Uuid> {
    rejections
        .iter()
        .filter(|r| r.expires_at > now)
        .map(|r| r.rejected_profile_id)
        .collect()
}

/// Load discovery candidates for the viewer: completed onboarding, matching
/// gender filter, never the viewer, minus actively rejected profiles.
pub fn load_candidates(
    conn: &mut diesel::pg::PgConnection,
    viewer: &Profile,
    limit: i64,
) -> AppResult<Vec<Profile>> {
    if !viewer.onboarding_complete {
        return Err(AppError::new(
            ErrorCode::OnboardingIncomplete,
            "complete onboarding before browsing profiles",
        ));
    }

    let rejections: Vec<RejectedProfile> = rejected_profiles::table
        .filter(rejected_profiles::user_id.eq(viewer.id))
        .load::<RejectedProfile>(conn)?;

    let excluded = active_rejection_ids(&rejections, Utc::now());

    let mut query = profiles::table
        .filter(profiles::onboarding_complete.eq(true))
        .filter(profiles::id.ne(viewer.id))
        .into_boxed();

    if let Some(genders) = show_genders(viewer) {
        query = query.filter(profiles::gender.eq_any(genders));
    }

    if !excluded.is_empty() {
        let excluded: Vec<Uuid> = excluded.into_iter().collect();
        query = query.filter(profiles::id.ne_all(excluded));
    }

    let candidates = query
        .order(profiles::created_at.asc())
        .limit(limit)
        .load::<Profile>(conn)?;

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn profile(gender: Option<&str>, interested_in: Option<&str>) -> Profile {
        Profile {
            id: Uuid::new_v4(),
            credential_id: Uuid::new_v4(),
            display_name: None,
            age: None,
            gender: gender.map(String::from),
            interested_in: interested_in.map(String::from),
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

    fn rejection(rejected_id: Uuid, expires_at: DateTime<Utc>) -> RejectedProfile {
        RejectedProfile {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            rejected_profile_id: rejected_id,
            rejected_at: expires_at - Duration::days(183),
            expires_at,
        }
    }

    #[test]
    fn gender_complement_when_interested_in_unset() {
        assert_eq!(
            show_genders(&profile(Some("male"), None)),
            Some(vec!["female".to_string()])
        );
        assert_eq!(
            show_genders(&profile(Some("female"), None)),
            Some(vec!["male".to_string()])
        );
    }

    #[test]
    fn interested_in_overrides_complement() {
        assert_eq!(
            show_genders(&profile(Some("male"), Some("male"))),
            Some(vec!["male".to_string()])
        );
        assert_eq!(show_genders(&profile(Some("male"), Some("both"))), None);
    }

    #[test]
    fn no_gender_and_no_preference_means_no_filter() {
        assert_eq!(show_genders(&profile(None, None)), None);
    }

    #[test]
    fn expired_rejections_do_not_suppress() {
        let now = Utc::now();
        let fresh = Uuid::new_v4();
        let stale = Uuid::new_v4();

        let rejections = vec![
            rejection(fresh, now + Duration::days(30)),
            rejection(stale, now - Duration::seconds(1)),
        ];

        let active = active_rejection_ids(&rejections, now);
        assert!(active.contains(&fresh));
        assert!(!active.contains(&stale));
    }

    #[test]
    fn rejection_expiring_exactly_now_is_inactive() {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let active = active_rejection_ids(&[rejection(id, now)], now);
        assert!(active.is_empty());
    }
}
