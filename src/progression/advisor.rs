//! Next-cycle target proposals.

use super::rules::{ProgressionConfig, RuleContext, RULES};
use crate::goals::types::{Goal, ProposedGoal};
use crate::metrics::performance::PerformanceSnapshot;

/// Proposes next-cycle targets from a goal and its last-cycle performance.
#[derive(Debug, Clone, Default)]
pub struct ProgressionAdvisor {
    config: ProgressionConfig,
}

impl ProgressionAdvisor {
    pub fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Propose a target for the next cycle.
    ///
    /// Sets and reps in the proposal are never below one. Weight and duration
    /// targets carry over unchanged.
    pub fn suggest(&self, goal: &Goal, snapshot: Option<&PerformanceSnapshot>) -> ProposedGoal {
        let ctx = RuleContext {
            goal,
            snapshot,
            config: &self.config,
        };

        let mut proposal = ProposedGoal::from_goal(goal, snapshot.cloned());

        if let Some(rule) = RULES.iter().find(|rule| rule.applies(&ctx)) {
            let adjustment = rule.adjustment(&ctx);
            proposal.target_sets = goal.target_sets.saturating_add(adjustment.extra_sets);
            proposal.target_reps = goal.target_reps
                .map(|reps| reps.saturating_add(adjustment.extra_reps));
            proposal.progression = rule.kind;
            proposal.rationale = rule.kind.rationale(&self.config);
        }

        proposal.target_sets = proposal.target_sets.max(1);
        proposal.target_reps = proposal.target_reps.map(|reps| reps.max(1));

        tracing::debug!(
            "Proposed {} for {}: {}",
            proposal.progression,
            goal.exercise_name,
            proposal.rationale
        );
        proposal
    }

    /// Propose targets for every goal, using each goal's attached performance.
    pub fn suggest_all(&self, goals: &[Goal]) -> Vec<ProposedGoal> {
        goals
            .iter()
            .map(|goal| self.suggest(goal, goal.performance.as_ref()))
            .collect()
    }
}
