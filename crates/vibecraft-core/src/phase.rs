use crate::manifest::Manifest;
use crate::types::{Phase, Skill};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fmt;

/// Returned by [`next_phase`] once every phase is complete.
pub const DONE: &str = "done";

const SUB_PHASE_PREFIX: &str = "implement_phase_";

// ---------------------------------------------------------------------------
// CompletionMarker
// ---------------------------------------------------------------------------

/// One entry of a manifest's `phases_completed` list.
///
/// Parsing never fails: anything that is not a skill marker or a canonical
/// `implement_phase_<n>` is kept verbatim as a phase name. `Display` gives
/// back exactly the persisted string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CompletionMarker {
    Skill(Skill),
    SubPhase(u32),
    Phase(String),
}

impl CompletionMarker {
    pub fn parse(s: &str) -> Self {
        if let Some(skill) = Skill::from_marker(s) {
            return CompletionMarker::Skill(skill);
        }
        if let Some(n) = s.strip_prefix(SUB_PHASE_PREFIX).and_then(parse_canonical) {
            return CompletionMarker::SubPhase(n);
        }
        CompletionMarker::Phase(s.to_string())
    }

    pub fn sub_phase(n: u32) -> Self {
        CompletionMarker::SubPhase(n)
    }
}

/// Digits only and no leading zeros, so that `Display` reproduces the input.
fn parse_canonical(digits: &str) -> Option<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let n: u32 = digits.parse().ok()?;
    (n.to_string() == digits).then_some(n)
}

impl std::str::FromStr for CompletionMarker {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CompletionMarker::parse(s))
    }
}

impl fmt::Display for CompletionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompletionMarker::Skill(skill) => f.write_str(skill.marker()),
            CompletionMarker::SubPhase(n) => write!(f, "{SUB_PHASE_PREFIX}{n}"),
            CompletionMarker::Phase(name) => f.write_str(name),
        }
    }
}

// ---------------------------------------------------------------------------
// Logical completion
// ---------------------------------------------------------------------------

/// Completion markers folded into logical phase names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogicalCompletion {
    pub phases: HashSet<String>,
    pub sub_phases: BTreeSet<u32>,
}

impl LogicalCompletion {
    pub fn from_markers<'a, I>(markers: I, total_implement_phases: Option<u32>) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut done = LogicalCompletion::default();
        for raw in markers {
            match CompletionMarker::parse(raw) {
                CompletionMarker::Skill(skill) => {
                    done.phases.insert(skill.phase().as_str().to_string());
                }
                CompletionMarker::SubPhase(n) => {
                    done.sub_phases.insert(n);
                }
                CompletionMarker::Phase(name) => {
                    done.phases.insert(name);
                }
            }
        }

        if let Some(total) = total_implement_phases.filter(|&t| t > 0) {
            if done.sub_phases.len() >= total as usize {
                done.phases.insert(Phase::Implement.as_str().to_string());
            }
        }
        done
    }

    pub fn contains(&self, phase: &str) -> bool {
        self.phases.contains(phase)
    }
}

pub fn logical_completed(manifest: &Manifest) -> LogicalCompletion {
    LogicalCompletion::from_markers(
        manifest.phases_completed.iter().map(String::as_str),
        manifest.total_implement_phases,
    )
}

/// First phase in `manifest.phases` that is not logically complete, or
/// [`DONE`].
pub fn next_phase(manifest: &Manifest) -> String {
    let done = logical_completed(manifest);
    manifest
        .phases
        .iter()
        .find(|p| !done.contains(p))
        .cloned()
        .unwrap_or_else(|| DONE.to_string())
}

/// `(distinct sub-phases completed, total)`.
pub fn implement_progress(manifest: &Manifest) -> (usize, Option<u32>) {
    let done = logical_completed(manifest);
    (done.sub_phases.len(), manifest.total_implement_phases)
}

// ---------------------------------------------------------------------------
// PhaseStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseStatus {
    Done,
    Current,
    Pending,
}

impl PhaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PhaseStatus::Done => "done",
            PhaseStatus::Current => "current",
            PhaseStatus::Pending => "pending",
        }
    }
}

impl fmt::Display for PhaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every phase in manifest order with its status. Only the phase
/// [`next_phase`] returns is `Current`.
pub fn phase_statuses(manifest: &Manifest) -> Vec<(String, PhaseStatus)> {
    let done = logical_completed(manifest);
    let next = next_phase(manifest);
    manifest
        .phases
        .iter()
        .map(|p| {
            let status = if *p == next {
                PhaseStatus::Current
            } else if done.contains(p) {
                PhaseStatus::Done
            } else {
                PhaseStatus::Pending
            };
            (p.clone(), status)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ProjectMode;

    fn manifest(completed: &[&str], total: Option<u32>) -> Manifest {
        let mut m = Manifest::new("demo", ProjectMode::Simple, Vec::new());
        m.phases_completed = completed.iter().map(|s| s.to_string()).collect();
        m.total_implement_phases = total;
        m
    }

    // -- markers -------------------------------------------------------------

    #[test]
    fn marker_parsing() {
        assert_eq!(
            CompletionMarker::parse("plan_skill"),
            CompletionMarker::Skill(Skill::Plan)
        );
        assert_eq!(
            CompletionMarker::parse("implement_phase_12"),
            CompletionMarker::SubPhase(12)
        );
        assert_eq!(
            CompletionMarker::parse("implement"),
            CompletionMarker::Phase("implement".to_string())
        );
        assert_eq!(
            CompletionMarker::parse("design_phase_2"),
            CompletionMarker::Phase("design_phase_2".to_string())
        );
    }

    #[test]
    fn non_canonical_sub_phase_stays_verbatim() {
        for raw in ["implement_phase_", "implement_phase_x", "implement_phase_01", "implement_phase_-1"] {
            assert_eq!(CompletionMarker::parse(raw), CompletionMarker::Phase(raw.to_string()));
        }
    }

    #[test]
    fn marker_display_reproduces_input() {
        for raw in [
            "research_skill",
            "review_skill",
            "implement_phase_0",
            "implement_phase_7",
            "implement",
            "custom step",
        ] {
            assert_eq!(CompletionMarker::parse(raw).to_string(), raw);
        }
    }

    // -- next_phase ----------------------------------------------------------

    #[test]
    fn fresh_manifest_starts_at_research() {
        assert_eq!(next_phase(&manifest(&[], None)), "research");
    }

    #[test]
    fn research_skill_moves_to_design() {
        assert_eq!(next_phase(&manifest(&["research_skill"], None)), "design");
    }

    #[test]
    fn sub_phase_alone_never_completes_implement() {
        let m = manifest(
            &["research_skill", "design_skill", "plan_skill", "implement_phase_1"],
            None,
        );
        assert_eq!(next_phase(&m), "implement");

        let zero = manifest(
            &["research_skill", "design_skill", "plan_skill", "implement_phase_1"],
            Some(0),
        );
        assert_eq!(next_phase(&zero), "implement");
    }

    #[test]
    fn reaching_total_completes_implement() {
        let m = manifest(
            &[
                "research_skill",
                "design_skill",
                "plan_skill",
                "implement_phase_1",
                "implement_phase_2",
                "implement_phase_3",
            ],
            Some(3),
        );
        assert_eq!(next_phase(&m), "review");
    }

    #[test]
    fn repeated_sub_phase_counts_once() {
        let m = manifest(
            &[
                "research_skill",
                "design_skill",
                "plan_skill",
                "implement_phase_1",
                "implement_phase_1",
            ],
            Some(2),
        );
        assert_eq!(next_phase(&m), "implement");
        assert_eq!(implement_progress(&m), (1, Some(2)));
    }

    #[test]
    fn explicit_implement_marker_completes_implement() {
        let m = manifest(&["research_skill", "design_skill", "plan_skill", "implement"], None);
        assert_eq!(next_phase(&m), "review");
    }

    #[test]
    fn raw_phase_names_count() {
        let m = manifest(&["research", "design"], None);
        assert_eq!(next_phase(&m), "plan");
    }

    #[test]
    fn all_phases_done() {
        let m = manifest(
            &["research_skill", "design_skill", "plan_skill", "implement", "review_skill"],
            None,
        );
        assert_eq!(next_phase(&m), DONE);
    }

    #[test]
    fn next_phase_follows_manifest_phase_list() {
        let mut m = manifest(&["research_skill"], None);
        m.phases = vec!["research".to_string(), "ship".to_string()];
        assert_eq!(next_phase(&m), "ship");
    }

    // -- statuses ------------------------------------------------------------

    #[test]
    fn statuses_mark_current_once() {
        let m = manifest(&["research_skill", "review_skill"], None);
        let statuses = phase_statuses(&m);
        assert_eq!(statuses[0], ("research".to_string(), PhaseStatus::Done));
        assert_eq!(statuses[1], ("design".to_string(), PhaseStatus::Current));
        assert_eq!(statuses[2].1, PhaseStatus::Pending);
        assert_eq!(statuses[4], ("review".to_string(), PhaseStatus::Done));
        assert_eq!(
            statuses.iter().filter(|(_, s)| *s == PhaseStatus::Current).count(),
            1
        );
    }

    #[test]
    fn statuses_when_done_have_no_current() {
        let m = manifest(
            &["research_skill", "design_skill", "plan_skill", "implement", "review_skill"],
            None,
        );
        assert!(phase_statuses(&m).iter().all(|(_, s)| *s == PhaseStatus::Done));
    }
}
