//! Lifecycle hooks running around record writes.

use crate::Record;

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Before,
    After,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Save,
    Update,
}

/// Hooks mutate the record in place; they have no return value and cannot
/// veto the surrounding operation.
pub type Hook = fn(&mut Record);

#[derive(Clone)]
pub struct Filter {
    name: &'static str,
    hook: Hook,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.name)
    }
}

/// Ordered hook registry for one model, keyed by phase and action.
#[derive(Debug, Clone, Default)]
pub struct Filters {
    entries: Vec<(Phase, Action, Filter)>,
}

impl Filters {
    pub fn add(&mut self, phase: Phase, action: Action, name: &'static str, hook: Hook) {
        self.entries.push((phase, action, Filter { name, hook }));
    }

    /// Run every hook registered for the phase/action pair, in declaration
    /// order. No-op when nothing is registered.
    pub fn run(&self, record: &mut Record, phase: Phase, action: Action) {
        for (_, _, filter) in self
            .entries
            .iter()
            .filter(|(p, a, _)| *p == phase && *a == action)
        {
            (filter.hook)(record);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
