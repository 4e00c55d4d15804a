//! Working set of goals for the selected cycle, with tag filters.

use std::collections::BTreeSet;
use uuid::Uuid;

use super::types::Goal;
use crate::metrics::performance::PerformanceSnapshot;

/// Holds the active cycle's goals and the current category/equipment filters.
#[derive(Debug, Clone, Default)]
pub struct GoalPool {
    goals: Vec<Goal>,
    categories: BTreeSet<String>,
    equipment: BTreeSet<String>,
}

impl GoalPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the working set.
    pub fn set_goals(&mut self, goals: Vec<Goal>) {
        self.goals = goals;
    }

    /// Replace both filter dimensions. An empty set disables that dimension.
    pub fn set_filters(&mut self, categories: BTreeSet<String>, equipment: BTreeSet<String>) {
        self.categories = categories;
        self.equipment = equipment;
    }

    pub fn category_filter(&self) -> &BTreeSet<String> {
        &self.categories
    }

    pub fn equipment_filter(&self) -> &BTreeSet<String> {
        &self.equipment
    }

    /// Every goal in the working set, filters ignored.
    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn get(&self, id: Uuid) -> Option<&Goal> {
        self.goals.iter().find(|g| g.id == id)
    }

    /// Drop a goal from the working set, returning it if present.
    pub fn remove(&mut self, id: Uuid) -> Option<Goal> {
        let index = self.goals.iter().position(|g| g.id == id)?;
        Some(self.goals.remove(index))
    }

    /// Attach a freshly computed snapshot to a goal.
    pub fn set_performance(&mut self, id: Uuid, snapshot: PerformanceSnapshot) {
        if let Some(goal) = self.goals.iter_mut().find(|g| g.id == id) {
            goal.performance = Some(snapshot);
        }
    }

    /// Goals passing both filters.
    ///
    /// Within a dimension a goal matches if it shares any tag with the
    /// filter; both dimensions must match. Inactive goals never pass.
    pub fn filtered_candidates(&self) -> Vec<Goal> {
        self.goals
            .iter()
            .filter(|goal| self.matches(goal))
            .cloned()
            .collect()
    }

    /// Whether `id` is currently a filtered candidate.
    pub fn is_candidate(&self, id: Uuid) -> bool {
        self.goals.iter().any(|g| g.id == id && self.matches(g))
    }

    fn matches(&self, goal: &Goal) -> bool {
        goal.active
            && shares_tag(&self.categories, &goal.categories)
            && shares_tag(&self.equipment, &goal.equipment)
    }

    pub fn len(&self) -> usize {
        self.goals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.goals.is_empty()
    }
}

fn shares_tag(filter: &BTreeSet<String>, tags: &BTreeSet<String>) -> bool {
    filter.is_empty() || !filter.is_disjoint(tags)
}

/// Build a tag set from string slices.
pub fn tag_set<I, S>(tags: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    tags.into_iter().map(Into::into).collect()
}
