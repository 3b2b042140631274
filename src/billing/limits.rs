//! Quota enforcement for gated actions
//!
//! Pure decisions over a profile snapshot. Callers check before the side
//! effect and commit only after it succeeded; the engine never combines the two.
//!
//! Daily windows compare calendar dates in the caller's timezone (the offset of
//! `now`), so 23:59 → 00:01 grants a fresh quota while 00:01 → 23:59 does not.

use chrono::{DateTime, TimeZone, Utc};

use super::types::{
    FreeTierLimits, LimitCheckResult, LimitDenialReason, QuotaAction, QuotaSummary, QuotaUsage,
    QuotaWindow, UsageStats,
};
use crate::models::UserProfile;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

/// Days after which the weekly scan window is considered expired
const WEEK_WINDOW_DAYS: i64 = 7;

/// Quota engine for the Free tier; Pro bypasses everything
#[derive(Debug, Clone, Default)]
pub struct QuotaEngine {
    limits: FreeTierLimits,
}

impl QuotaEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_limits(limits: FreeTierLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &FreeTierLimits {
        &self.limits
    }

    /// Check whether `action` may run now
    pub fn check<Tz: TimeZone>(
        &self,
        action: QuotaAction,
        profile: &UserProfile,
        now: &DateTime<Tz>,
    ) -> LimitCheckResult {
        if profile.is_pro() {
            return LimitCheckResult::Allowed { remaining: None };
        }

        let limit = self.limits.limit_for(action);
        let used = effective_count(&profile.usage_stats, action, now);

        if used < limit {
            LimitCheckResult::Allowed {
                remaining: Some(limit - used),
            }
        } else {
            LimitCheckResult::Denied {
                reason: LimitDenialReason {
                    action,
                    window: action.window(),
                    limit,
                    used,
                },
            }
        }
    }

    /// Record one successful use of `action`, returning the next profile.
    ///
    /// Does not re-check the limit: committing past it keeps counting.
    pub fn commit<Tz: TimeZone>(
        &self,
        action: QuotaAction,
        profile: &UserProfile,
        now: &DateTime<Tz>,
    ) -> UserProfile {
        let mut next = profile.clone();
        if profile.is_pro() {
            return next;
        }

        let expired = window_expired(&profile.usage_stats, action, now);
        let now_utc = now.with_timezone(&Utc);
        let stats = &mut next.usage_stats;

        match action {
            QuotaAction::GenerateRecipe => {
                stats.recipes_generated_today = bump(stats.recipes_generated_today, expired);
                stats.last_generation_date = Some(now_utc);
            }
            QuotaAction::TransformDesire => {
                stats.desires_transformed_today = bump(stats.desires_transformed_today, expired);
                stats.last_desire_date = Some(now_utc);
            }
            QuotaAction::ScanPantry => {
                stats.pantry_scans_this_week = bump(stats.pantry_scans_this_week, expired);
                stats.last_scan_date = Some(now_utc);
            }
            QuotaAction::SaveRecipe => {
                stats.saved_recipes_count = stats.saved_recipes_count.saturating_add(1);
            }
        }

        tracing::debug!(
            uid = %profile.uid,
            action = %action,
            reset = expired,
            "Committed quota usage"
        );

        next
    }

    pub fn can_generate_recipe<Tz: TimeZone>(&self, p: &UserProfile, now: &DateTime<Tz>) -> bool {
        self.check(QuotaAction::GenerateRecipe, p, now).is_allowed()
    }

    pub fn increment_recipe_count<Tz: TimeZone>(
        &self,
        p: &UserProfile,
        now: &DateTime<Tz>,
    ) -> UserProfile {
        self.commit(QuotaAction::GenerateRecipe, p, now)
    }

    pub fn can_transform_desire<Tz: TimeZone>(&self, p: &UserProfile, now: &DateTime<Tz>) -> bool {
        self.check(QuotaAction::TransformDesire, p, now).is_allowed()
    }

    pub fn increment_desire_count<Tz: TimeZone>(
        &self,
        p: &UserProfile,
        now: &DateTime<Tz>,
    ) -> UserProfile {
        self.commit(QuotaAction::TransformDesire, p, now)
    }

    pub fn can_scan_pantry<Tz: TimeZone>(&self, p: &UserProfile, now: &DateTime<Tz>) -> bool {
        self.check(QuotaAction::ScanPantry, p, now).is_allowed()
    }

    pub fn increment_scan_count<Tz: TimeZone>(
        &self,
        p: &UserProfile,
        now: &DateTime<Tz>,
    ) -> UserProfile {
        self.commit(QuotaAction::ScanPantry, p, now)
    }

    pub fn can_save_recipe(&self, p: &UserProfile) -> bool {
        self.check(QuotaAction::SaveRecipe, p, &Utc::now()).is_allowed()
    }

    pub fn increment_saved_count(&self, p: &UserProfile) -> UserProfile {
        self.commit(QuotaAction::SaveRecipe, p, &Utc::now())
    }

    /// Usage of every action as the user would see it now
    pub fn summary<Tz: TimeZone>(&self, profile: &UserProfile, now: &DateTime<Tz>) -> QuotaSummary {
        let usage = QuotaAction::ALL
            .iter()
            .map(|&action| {
                let used = effective_count(&profile.usage_stats, action, now);
                if profile.is_pro() {
                    QuotaUsage {
                        action,
                        used,
                        limit: None,
                        remaining: None,
                    }
                } else {
                    let limit = self.limits.limit_for(action);
                    QuotaUsage {
                        action,
                        used,
                        limit: Some(limit),
                        remaining: Some(limit.saturating_sub(used)),
                    }
                }
            })
            .collect();

        QuotaSummary {
            plan: profile.subscription.plan,
            is_pro: profile.is_pro(),
            usage,
        }
    }
}

fn bump(counter: u32, expired: bool) -> u32 {
    if expired {
        1
    } else {
        counter.saturating_add(1)
    }
}

/// Stored counter, or 0 when its window has lapsed
fn effective_count<Tz: TimeZone>(stats: &UsageStats, action: QuotaAction, now: &DateTime<Tz>) -> u32 {
    if window_expired(stats, action, now) {
        return 0;
    }
    match action {
        QuotaAction::GenerateRecipe => stats.recipes_generated_today,
        QuotaAction::TransformDesire => stats.desires_transformed_today,
        QuotaAction::ScanPantry => stats.pantry_scans_this_week,
        QuotaAction::SaveRecipe => stats.saved_recipes_count,
    }
}

fn window_expired<Tz: TimeZone>(stats: &UsageStats, action: QuotaAction, now: &DateTime<Tz>) -> bool {
    let last = match action {
        QuotaAction::GenerateRecipe => stats.last_generation_date,
        QuotaAction::TransformDesire => stats.last_desire_date,
        QuotaAction::ScanPantry => stats.last_scan_date,
        QuotaAction::SaveRecipe => return false,
    };

    // Never used: nothing to count against
    let Some(last) = last else {
        return true;
    };

    match action.window() {
        QuotaWindow::CalendarDay => !same_calendar_date(&last, now),
        QuotaWindow::Week => elapsed_days_ceil(&last, now) > WEEK_WINDOW_DAYS,
        QuotaWindow::Lifetime => false,
    }
}

/// YYYY-MM-DD equality in the timezone of `now`
fn same_calendar_date<Tz: TimeZone>(last: &DateTime<Utc>, now: &DateTime<Tz>) -> bool {
    last.with_timezone(&now.timezone()).date_naive() == now.date_naive()
}

/// `ceil((now - last) / 1 day)`
fn elapsed_days_ceil<Tz: TimeZone>(last: &DateTime<Utc>, now: &DateTime<Tz>) -> i64 {
    let ms = (now.with_timezone(&Utc) - *last).num_milliseconds();
    if ms > 0 {
        (ms + DAY_MS - 1) / DAY_MS
    } else {
        // Integer division truncates toward zero, which is the ceiling here
        ms / DAY_MS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::Plan;
    use chrono::{Duration, FixedOffset};

    fn brt() -> FixedOffset {
        FixedOffset::west_opt(3 * 3600).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        brt().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn utc(t: &DateTime<FixedOffset>) -> DateTime<Utc> {
        t.with_timezone(&Utc)
    }

    fn free_profile() -> UserProfile {
        UserProfile::new("free_user")
    }

    fn pro_profile() -> UserProfile {
        let mut p = UserProfile::new("pro_user");
        p.subscription.is_pro = true;
        p.subscription.plan = Plan::Yearly;
        p
    }

    #[test]
    fn test_custom_limits() {
        let engine = QuotaEngine::with_limits(FreeTierLimits {
            recipes_per_day: 3,
            ..FreeTierLimits::default()
        });
        assert_eq!(engine.limits().recipes_per_day, 3);

        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        for _ in 0..3 {
            assert!(engine.can_generate_recipe(&profile, &now));
            profile = engine.increment_recipe_count(&profile, &now);
        }
        assert!(!engine.can_generate_recipe(&profile, &now));
        assert!(engine.can_transform_desire(&profile, &now));
    }

    #[test]
    fn test_fresh_profile_allows_everything() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let profile = free_profile();

        assert!(engine.can_generate_recipe(&profile, &now));
        assert!(engine.can_transform_desire(&profile, &now));
        assert!(engine.can_scan_pantry(&profile, &now));
        assert!(engine.can_save_recipe(&profile));
    }

    #[test]
    fn test_stale_counter_from_yesterday_resets() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        profile.usage_stats.recipes_generated_today = 5;
        profile.usage_stats.last_generation_date = Some(utc(&(now - Duration::days(1))));

        assert!(engine.can_generate_recipe(&profile, &now));

        let next = engine.increment_recipe_count(&profile, &now);
        assert_eq!(next.usage_stats.recipes_generated_today, 1);
        assert_eq!(next.usage_stats.last_generation_date, Some(utc(&now)));
    }

    #[test]
    fn test_same_day_saturation_does_not_clamp() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 15, 0);
        let mut profile = free_profile();
        profile.usage_stats.recipes_generated_today = 1;
        profile.usage_stats.last_generation_date = Some(utc(&at(2026, 10, 19, 9, 0)));

        let result = engine.check(QuotaAction::GenerateRecipe, &profile, &now);
        assert!(!result.is_allowed());
        assert_eq!(
            result.denial_reason().map(|r| (r.limit, r.used)),
            Some((1, 1))
        );

        let next = engine.increment_recipe_count(&profile, &now);
        assert_eq!(next.usage_stats.recipes_generated_today, 2);
        assert_eq!(next.usage_stats.last_generation_date, Some(utc(&now)));
    }

    #[test]
    fn test_calendar_date_boundary_not_rolling() {
        let engine = QuotaEngine::new();

        // 23:59 then 00:01 the next day: fresh quota
        let mut late = free_profile();
        late.usage_stats.desires_transformed_today = 1;
        late.usage_stats.last_desire_date = Some(utc(&at(2026, 10, 18, 23, 59)));
        assert!(engine.can_transform_desire(&late, &at(2026, 10, 19, 0, 1)));

        // 00:01 then 23:59 the same day: blocked
        let mut early = free_profile();
        early.usage_stats.desires_transformed_today = 1;
        early.usage_stats.last_desire_date = Some(utc(&at(2026, 10, 19, 0, 1)));
        assert!(!engine.can_transform_desire(&early, &at(2026, 10, 19, 23, 59)));
    }

    #[test]
    fn test_calendar_date_uses_caller_timezone() {
        let engine = QuotaEngine::new();
        let mut profile = free_profile();
        profile.usage_stats.recipes_generated_today = 1;
        // 02:30 UTC on the 20th is still the 19th in UTC-3
        profile.usage_stats.last_generation_date =
            Some(Utc.with_ymd_and_hms(2026, 10, 20, 2, 30, 0).unwrap());

        assert!(!engine.can_generate_recipe(&profile, &at(2026, 10, 19, 23, 50)));
        assert!(engine.can_generate_recipe(&profile, &at(2026, 10, 20, 0, 10)));
    }

    #[test]
    fn test_pro_bypasses_checks_and_commits() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = pro_profile();
        profile.usage_stats = UsageStats {
            recipes_generated_today: 99,
            last_generation_date: Some(utc(&now)),
            desires_transformed_today: 99,
            last_desire_date: Some(utc(&now)),
            pantry_scans_this_week: 99,
            last_scan_date: Some(utc(&now)),
            saved_recipes_count: 99,
        };

        for action in QuotaAction::ALL {
            assert!(engine.check(action, &profile, &now).is_allowed(), "{}", action);
            assert_eq!(engine.commit(action, &profile, &now), profile);
        }
        assert_eq!(engine.increment_saved_count(&profile), profile);
    }

    #[test]
    fn test_weekly_scan_window_boundaries() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        profile.usage_stats.pantry_scans_this_week = 2;

        profile.usage_stats.last_scan_date = Some(utc(&(now - Duration::days(8))));
        assert!(engine.can_scan_pantry(&profile, &now));

        profile.usage_stats.last_scan_date = Some(utc(&(now - Duration::days(7))));
        assert!(!engine.can_scan_pantry(&profile, &now));

        profile.usage_stats.last_scan_date = Some(utc(&(now - Duration::days(6))));
        assert!(!engine.can_scan_pantry(&profile, &now));
    }

    #[test]
    fn test_weekly_partial_day_rounds_up() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        profile.usage_stats.pantry_scans_this_week = 2;
        // 7 days and 1 minute is 8 days after ceil
        profile.usage_stats.last_scan_date =
            Some(utc(&(now - Duration::days(7) - Duration::minutes(1))));
        assert!(engine.can_scan_pantry(&profile, &now));
    }

    #[test]
    fn test_scan_commit_resets_or_increments() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        profile.usage_stats.pantry_scans_this_week = 2;
        profile.usage_stats.last_scan_date = Some(utc(&(now - Duration::days(10))));

        let next = engine.increment_scan_count(&profile, &now);
        assert_eq!(next.usage_stats.pantry_scans_this_week, 1);
        assert_eq!(next.usage_stats.last_scan_date, Some(utc(&now)));

        let after = engine.increment_scan_count(&next, &now);
        assert_eq!(after.usage_stats.pantry_scans_this_week, 2);
        assert!(!engine.can_scan_pantry(&after, &now));
    }

    #[test]
    fn test_save_cap_has_no_window() {
        let engine = QuotaEngine::new();
        let profile = free_profile();
        assert!(engine.can_save_recipe(&profile));

        let saved = engine.increment_saved_count(&profile);
        assert_eq!(saved.usage_stats.saved_recipes_count, 1);
        assert!(!engine.can_save_recipe(&saved));

        let again = engine.increment_saved_count(&saved);
        assert_eq!(again.usage_stats.saved_recipes_count, 2);
    }

    #[test]
    fn test_commit_leaves_input_untouched() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let profile = free_profile();
        let _ = engine.increment_recipe_count(&profile, &now);
        assert_eq!(profile.usage_stats, UsageStats::default());
    }

    #[test]
    fn test_summary_for_free_and_pro() {
        let engine = QuotaEngine::new();
        let now = at(2026, 10, 19, 12, 0);
        let mut profile = free_profile();
        profile.usage_stats.pantry_scans_this_week = 1;
        profile.usage_stats.last_scan_date = Some(utc(&(now - Duration::days(2))));

        let summary = engine.summary(&profile, &now);
        let scan = summary
            .usage
            .iter()
            .find(|u| u.action == QuotaAction::ScanPantry)
            .unwrap();
        assert_eq!((scan.used, scan.limit, scan.remaining), (1, Some(2), Some(1)));

        let pro = engine.summary(&pro_profile(), &now);
        assert!(pro.is_pro);
        assert!(pro.usage.iter().all(|u| u.limit.is_none()));
    }
}
