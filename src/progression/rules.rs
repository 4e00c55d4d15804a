//! Ordered progression rules.
//!
//! Each rule pairs a guard with the adjustment it applies. Rules are tried in
//! table order and the first matching guard wins; the last rule always
//! matches.

use serde::{Deserialize, Serialize};

use crate::goals::types::Goal;
use crate::metrics::performance::{compliance, PerformanceSnapshot};

/// Tunable thresholds for next-cycle proposals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Sets and average reps must both reach this multiple of plan to count
    /// as significantly exceeded
    pub significant_factor: f64,
    /// Reps are only added while the average stays below this
    pub strong_rep_ceiling: f64,
    /// Sets are only added while the result stays below this
    pub set_ceiling: u32,
    /// Compliance below this fraction repeats the target as "below target"
    pub compliance_floor: f64,
    /// Reps added after significantly exceeding the plan
    pub strong_rep_step: u32,
    /// Reps added after meeting the plan
    pub rep_step: u32,
    /// Sets added when reps are already high
    pub set_step: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            significant_factor: 1.2,
            strong_rep_ceiling: 12.0,
            set_ceiling: 5,
            compliance_floor: 0.7,
            strong_rep_step: 2,
            rep_step: 1,
            set_step: 1,
        }
    }
}

/// Which tier produced a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressionKind {
    /// Never attempted; repeat
    NoData,
    /// Significantly exceeded; add reps
    StrongAddReps,
    /// Significantly exceeded with high reps; add a set
    StrongAddSet,
    /// Significantly exceeded at the ceilings; go heavier instead
    StrongMaintain,
    /// Met the plan; add a rep
    AddReps,
    /// Met the plan with high reps; add a set
    AddSet,
    /// Met the plan at the ceilings; go heavier instead
    Maintain,
    /// Well short of the plan; repeat
    RepeatBelowTarget,
    /// Nearly met the plan; repeat
    RepeatConsolidate,
}

impl ProgressionKind {
    /// Human-readable rationale for the proposal.
    pub fn rationale(&self, config: &ProgressionConfig) -> String {
        match self {
            ProgressionKind::NoData => "Repeat: no performance data".to_string(),
            ProgressionKind::StrongAddReps => {
                format!("Strong progress: +{} reps per set", config.strong_rep_step)
            }
            ProgressionKind::StrongAddSet => format!("Strong progress: +{} set", config.set_step),
            ProgressionKind::StrongMaintain => {
                "Strong progress: maintain sets and reps, increase weight instead".to_string()
            }
            ProgressionKind::AddReps => format!("Target met: +{} rep per set", config.rep_step),
            ProgressionKind::AddSet => format!("Target met: +{} set", config.set_step),
            ProgressionKind::Maintain => {
                "Target met: maintain sets and reps, increase weight instead".to_string()
            }
            ProgressionKind::RepeatBelowTarget => format!(
                "Repeat: performance below {:.0}% of target",
                config.compliance_floor * 100.0
            ),
            ProgressionKind::RepeatConsolidate => {
                "Repeat: close to meeting target, consolidate".to_string()
            }
        }
    }

}

impl std::fmt::Display for ProgressionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ProgressionKind::NoData => "No data",
            ProgressionKind::StrongAddReps | ProgressionKind::AddReps => "Add reps",
            ProgressionKind::StrongAddSet | ProgressionKind::AddSet => "Add set",
            ProgressionKind::StrongMaintain | ProgressionKind::Maintain => "Increase weight",
            ProgressionKind::RepeatBelowTarget => "Below target",
            ProgressionKind::RepeatConsolidate => "Consolidate",
        };
        write!(f, "{}", label)
    }
}

/// Inputs a rule inspects.
pub struct RuleContext<'a> {
    pub goal: &'a Goal,
    pub snapshot: Option<&'a PerformanceSnapshot>,
    pub config: &'a ProgressionConfig,
}

impl RuleContext<'_> {
    fn completed(&self) -> Option<&PerformanceSnapshot> {
        self.snapshot.filter(|s| s.was_completed)
    }

    fn significantly_exceeded(&self) -> bool {
        self.completed().is_some_and(|s| {
            let factor = self.config.significant_factor;
            s.total_sets as f64 >= self.goal.target_sets as f64 * factor
                && s.average_reps >= self.goal.planned_reps() as f64 * factor
        })
    }

    /// Timed goals have no rep target to raise.
    fn reps_below_ceiling(&self) -> bool {
        self.goal.target_reps.is_some()
            && self
                .snapshot
                .is_some_and(|s| s.average_reps < self.config.strong_rep_ceiling)
    }

    fn room_for_set(&self) -> bool {
        self.snapshot.is_some_and(|s| {
            s.total_sets.saturating_add(self.config.set_step) < self.config.set_ceiling
        })
    }

    fn below_floor(&self) -> bool {
        self.snapshot.is_some_and(|s| {
            let planned_reps = self.goal.planned_reps();
            let sets = compliance(s.total_sets as f64, self.goal.target_sets);
            let reps = compliance(s.average_reps, planned_reps);
            sets < self.config.compliance_floor || reps < self.config.compliance_floor
        })
    }
}

/// Change to apply to the current target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Adjustment {
    pub extra_sets: u32,
    pub extra_reps: u32,
}

/// A guard/action pair in the progression table.
pub struct ProgressionRule {
    pub kind: ProgressionKind,
    pub guard: fn(&RuleContext<'_>) -> bool,
    pub action: fn(&RuleContext<'_>) -> Adjustment,
}

impl ProgressionRule {
    pub fn applies(&self, ctx: &RuleContext<'_>) -> bool {
        (self.guard)(ctx)
    }

    pub fn adjustment(&self, ctx: &RuleContext<'_>) -> Adjustment {
        (self.action)(ctx)
    }
}

fn keep(_: &RuleContext<'_>) -> Adjustment {
    Adjustment::default()
}

fn add_strong_reps(ctx: &RuleContext<'_>) -> Adjustment {
    Adjustment {
        extra_reps: ctx.config.strong_rep_step,
        ..Default::default()
    }
}

fn add_reps(ctx: &RuleContext<'_>) -> Adjustment {
    Adjustment {
        extra_reps: ctx.config.rep_step,
        ..Default::default()
    }
}

fn add_set(ctx: &RuleContext<'_>) -> Adjustment {
    Adjustment {
        extra_sets: ctx.config.set_step,
        ..Default::default()
    }
}

/// The progression table, in evaluation order.
pub const RULES: &[ProgressionRule] = &[
    ProgressionRule {
        kind: ProgressionKind::NoData,
        guard: |ctx| ctx.snapshot.is_none(),
        action: keep,
    },
    ProgressionRule {
        kind: ProgressionKind::StrongAddReps,
        guard: |ctx| ctx.significantly_exceeded() && ctx.reps_below_ceiling(),
        action: add_strong_reps,
    },
    ProgressionRule {
        kind: ProgressionKind::StrongAddSet,
        guard: |ctx| ctx.significantly_exceeded() && ctx.room_for_set(),
        action: add_set,
    },
    ProgressionRule {
        kind: ProgressionKind::StrongMaintain,
        guard: |ctx| ctx.significantly_exceeded(),
        action: keep,
    },
    ProgressionRule {
        kind: ProgressionKind::AddReps,
        guard: |ctx| ctx.completed().is_some() && ctx.reps_below_ceiling(),
        action: add_reps,
    },
    ProgressionRule {
        kind: ProgressionKind::AddSet,
        guard: |ctx| ctx.completed().is_some() && ctx.room_for_set(),
        action: add_set,
    },
    ProgressionRule {
        kind: ProgressionKind::Maintain,
        guard: |ctx| ctx.completed().is_some(),
        action: keep,
    },
    ProgressionRule {
        kind: ProgressionKind::RepeatBelowTarget,
        guard: |ctx| ctx.below_floor(),
        action: keep,
    },
    ProgressionRule {
        kind: ProgressionKind::RepeatConsolidate,
        guard: |_| true,
        action: keep,
    },
];
