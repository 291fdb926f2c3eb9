use std::collections::BTreeSet;
use std::time::{Duration, Instant, SystemTime};

use crate::config::SkillLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, strum::Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum ActionKind {
    Route,
    Catalog,
    Detail,
    SubResource,
    Endpoint,
}

/// One entry of a user's action log.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Action {
    pub kind: ActionKind,
    pub target: String,
    pub succeeded: bool,
    /// This action's failure ended the journey.
    pub fatal: bool,
    pub status: Option<u16>,
    pub duration_ms: f64,
}

/// A simulated actor. Mutated only by its own journey.
#[derive(Debug, Clone)]
pub struct VirtualUser {
    pub id: String,
    pub skill_level: SkillLevel,
    pub index: u64,
    pub visited_resource_ids: BTreeSet<u64>,
    pub visited_routes: BTreeSet<String>,
    pub action_log: Vec<Action>,
    overall_succeeded: bool,
    failure: Option<String>,
    started_at: SystemTime,
    started: Instant,
    elapsed: Option<Duration>,
}

impl VirtualUser {
    pub fn new(skill_level: SkillLevel, index: u64) -> Self {
        Self {
            id: user_id(skill_level, index),
            skill_level,
            index,
            visited_resource_ids: BTreeSet::new(),
            visited_routes: BTreeSet::new(),
            action_log: Vec::new(),
            overall_succeeded: true,
            failure: None,
            started_at: SystemTime::now(),
            started: Instant::now(),
            elapsed: None,
        }
    }

    /// Appends to the action log. A fatal action marks the user failed.
    pub fn record(&mut self, action: Action) {
        if action.fatal {
            self.overall_succeeded = false;
        }
        self.action_log.push(action);
    }

    /// Records the reason for the fatal failure that ended the journey.
    pub fn set_failure(&mut self, reason: impl Into<String>) {
        self.failure = Some(reason.into());
    }

    pub fn finish(&mut self) {
        self.elapsed = Some(self.started.elapsed());
    }

    pub fn overall_succeeded(&self) -> bool {
        self.overall_succeeded
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.unwrap_or_else(|| self.started.elapsed())
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            skill_level: self.skill_level,
            succeeded: self.overall_succeeded,
            failure: self.failure.clone(),
            resources_visited: self.visited_resource_ids.len(),
            routes_visited: self.visited_routes.len(),
            actions: self.action_log.len(),
            failed_actions: self.action_log.iter().filter(|a| !a.succeeded).count(),
            duration_ms: self.elapsed().as_secs_f64() * 1000.0,
            started_at: humantime::format_rfc3339_millis(self.started_at).to_string(),
        }
    }
}

pub fn user_id(skill_level: SkillLevel, index: u64) -> String {
    format!("{skill_level}-{index}")
}

/// What remains of a user once its journey is over.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub skill_level: SkillLevel,
    pub succeeded: bool,
    pub failure: Option<String>,
    pub resources_visited: usize,
    pub routes_visited: usize,
    pub actions: usize,
    pub failed_actions: usize,
    pub duration_ms: f64,
    pub started_at: String,
}

/// Outcome of one journey driver. `error` is set when the driver itself died (e.g. panicked).
#[derive(Debug, Clone, PartialEq)]
pub struct JourneyResult {
    pub user: UserSummary,
    pub error: Option<String>,
}

impl JourneyResult {
    pub fn completed(user: &VirtualUser) -> Self {
        Self {
            user: user.summary(),
            error: None,
        }
    }

    /// A journey that never reported back; counted as a failed user.
    pub fn aborted(skill_level: SkillLevel, index: u64, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            user: UserSummary {
                id: user_id(skill_level, index),
                skill_level,
                succeeded: false,
                failure: Some(format!("journey aborted: {error}")),
                resources_visited: 0,
                routes_visited: 0,
                actions: 0,
                failed_actions: 0,
                duration_ms: 0.0,
                started_at: humantime::format_rfc3339_millis(SystemTime::now()).to_string(),
            },
            error: Some(error),
        }
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.user.succeeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn action(fatal: bool, succeeded: bool) -> Action {
        Action {
            kind: ActionKind::Route,
            target: "/".to_string(),
            succeeded,
            fatal,
            status: None,
            duration_ms: 1.0,
        }
    }

    #[test]
    fn soft_failures_keep_the_user_successful() {
        let mut user = VirtualUser::new(SkillLevel::Beginner, 3);
        user.record(action(false, false));
        user.record(action(false, true));
        assert!(user.overall_succeeded());
        assert_eq!(user.summary().failed_actions, 1);
        assert_eq!(user.id, "beginner-3");
    }

    #[test]
    fn fatal_failure_marks_the_user_failed() {
        let mut user = VirtualUser::new(SkillLevel::Advanced, 0);
        user.record(action(false, true));
        assert!(user.overall_succeeded());
        user.record(action(true, false));
        user.set_failure("catalog unavailable");
        assert!(!user.overall_succeeded());

        let summary = user.summary();
        assert!(!summary.succeeded);
        assert_eq!(summary.failure.as_deref(), Some("catalog unavailable"));
    }

    #[test]
    fn aborted_journey_counts_as_failed_user() {
        let r = JourneyResult::aborted(SkillLevel::Intermediate, 9, "task panicked");
        assert!(!r.succeeded());
        assert_eq!(r.user.id, "intermediate-9");
        assert_eq!(r.error.as_deref(), Some("task panicked"));
    }
}
