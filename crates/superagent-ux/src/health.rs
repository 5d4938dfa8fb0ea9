use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use superagent_types::UnifiedContext;

const TOKEN_CRITICAL_RATIO: f32 = 0.9;
const TOKEN_WARNING_RATIO: f32 = 0.75;
const REDUNDANCY_WARNING_RATIO: f32 = 0.3;
const COHERENCE_WARNING_THRESHOLD: f32 = 0.7;
const FRESHNESS_WARNING_HOURS: f32 = 24.0;

const CRITICAL_PENALTY: i32 = 30;
const WARNING_PENALTY: i32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum Severity {
    Warning,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthIssue {
    pub check: &'static str,
    severity: Severity,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    pub token_utilization: f32,
    pub redundancy: f32,
    pub coherence: f32,
    pub freshness_hours: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextHealth {
    pub status: HealthStatus,
    pub score: u8,
    pub issues: Vec<HealthIssue>,
    pub metrics: HealthMetrics,
}

/// Scores a [`UnifiedContext`] against the four checks in spec §4.7 and
/// derives an overall status and penalty-based score. Stateless: every
/// call is a fresh scoring pass, matching "periodically or on demand".
#[derive(Debug, Default)]
pub struct ContextHealthMonitor;

impl ContextHealthMonitor {
    pub fn new() -> Self {
        Self
    }

    pub fn score(
        &self,
        context: &UnifiedContext,
        created_at: i64,
        now: i64,
        current_tokens: u32,
        token_limit: u32,
    ) -> ContextHealth {
        let mut issues = Vec::new();

        let token_utilization =
            if token_limit == 0 { 0.0 } else { current_tokens as f32 / token_limit as f32 };
        if token_utilization > TOKEN_CRITICAL_RATIO {
            issues.push(HealthIssue {
                check: "token_utilization",
                severity: Severity::Critical,
                detail: format!("token usage at {:.0}% of limit", token_utilization * 100.0),
            });
        } else if token_utilization > TOKEN_WARNING_RATIO {
            issues.push(HealthIssue {
                check: "token_utilization",
                severity: Severity::Warning,
                detail: format!("token usage at {:.0}% of limit", token_utilization * 100.0),
            });
        }

        let redundancy = redundancy_ratio(context);
        if redundancy > REDUNDANCY_WARNING_RATIO {
            issues.push(HealthIssue {
                check: "redundancy",
                severity: Severity::Warning,
                detail: format!("{:.0}% of words are repeated", redundancy * 100.0),
            });
        }

        let coherence = mean_adjacent_jaccard(context);
        if coherence < COHERENCE_WARNING_THRESHOLD {
            issues.push(HealthIssue {
                check: "coherence",
                severity: Severity::Warning,
                detail: format!("adjacent-message overlap only {:.2}", coherence),
            });
        }

        let freshness_hours = (now.saturating_sub(created_at)).max(0) as f32 / 3600.0;
        if freshness_hours > FRESHNESS_WARNING_HOURS {
            issues.push(HealthIssue {
                check: "freshness",
                severity: Severity::Warning,
                detail: format!("context is {freshness_hours:.1}h old"),
            });
        }

        let mut score: i32 = 100;
        let mut any_critical = false;
        for issue in &issues {
            match issue.severity {
                Severity::Critical => {
                    any_critical = true;
                    score -= CRITICAL_PENALTY;
                }
                Severity::Warning => score -= WARNING_PENALTY,
            }
        }
        let score = score.clamp(0, 100) as u8;

        let status = if any_critical {
            HealthStatus::Critical
        } else if score < 70 {
            HealthStatus::Warning
        } else {
            HealthStatus::Healthy
        };

        ContextHealth {
            status,
            score,
            issues,
            metrics: HealthMetrics { token_utilization, redundancy, coherence, freshness_hours },
        }
    }
}

fn redundancy_ratio(context: &UnifiedContext) -> f32 {
    let words: Vec<String> = context
        .conversation_history
        .iter()
        .flat_map(|m| m.content.as_text().split_whitespace().map(str::to_lowercase).collect::<Vec<_>>())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let unique: HashSet<&String> = words.iter().collect();
    1.0 - (unique.len() as f32 / words.len() as f32)
}

fn mean_adjacent_jaccard(context: &UnifiedContext) -> f32 {
    let messages = &context.conversation_history;
    if messages.len() < 2 {
        return 1.0;
    }
    let mut total = 0.0f32;
    let mut pairs = 0u32;
    for window in messages.windows(2) {
        let a: HashSet<String> = window[0].content.as_text().split_whitespace().map(str::to_lowercase).collect();
        let b: HashSet<String> = window[1].content.as_text().split_whitespace().map(str::to_lowercase).collect();
        if a.is_empty() && b.is_empty() {
            continue;
        }
        let intersection = a.intersection(&b).count() as f32;
        let union = a.union(&b).count() as f32;
        if union > 0.0 {
            total += intersection / union;
            pairs += 1;
        }
    }
    if pairs == 0 {
        1.0
    } else {
        total / pairs as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use superagent_types::{Message, Role, SessionId};

    fn context_with(messages: Vec<&str>) -> UnifiedContext {
        let mut context = UnifiedContext::empty(SessionId::generate());
        context.conversation_history =
            messages.into_iter().enumerate().map(|(i, m)| Message::text(Role::User, m, i as i64)).collect();
        context
    }

    #[test]
    fn healthy_context_scores_100() {
        let context = context_with(vec!["the quick brown fox", "jumps over the lazy dog"]);
        let health = ContextHealthMonitor::new().score(&context, 0, 0, 100, 10_000);
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.score, 100);
    }

    #[test]
    fn token_overuse_is_critical() {
        let context = context_with(vec!["hello"]);
        let health = ContextHealthMonitor::new().score(&context, 0, 0, 9_500, 10_000);
        assert_eq!(health.status, HealthStatus::Critical);
        assert!(health.issues.iter().any(|i| i.check == "token_utilization"));
    }

    #[test]
    fn stale_context_is_a_warning_not_critical() {
        let context = context_with(vec!["hello", "world"]);
        let health = ContextHealthMonitor::new().score(&context, 0, 25 * 3600, 0, 10_000);
        assert_eq!(health.status, HealthStatus::Warning);
        assert!(health.issues.iter().any(|i| i.check == "freshness"));
    }
}
