use itertools::Itertools;
use thiserror::Error;

/// A start group in a staggered race. Created from organizer input before
/// the race; its offset is assigned by the scheduler when the race clock
/// reaches it and is never retracted except by a full reset.
#[derive(Debug, Clone, PartialEq)]
pub struct StartGroup {
    pub id: usize,
    pub name: String,
    pub participants: Vec<String>,
    pub start_offset_secs: Option<u32>,
}

/// A recorded finish, relative to the participant's group offset.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantFinish {
    pub name: String,
    pub group_id: usize,
    pub finish_secs: f64,
    /// Dense 1..N by ascending finish time; recomputed on every change.
    pub placement: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RaceError {
    /// PreconditionNotMet: shown as a blocking notice, never a crash.
    #[error("{group} has not started yet")]
    GroupNotStarted { group: String },
    #[error("no participant named {0}")]
    UnknownParticipant(String),
}

/// Staggers group starts on a fixed interval and records finishes.
///
/// Driven by a race clock in stopwatch mode: `observe(elapsed)` runs every
/// tick and assigns group `i` its offset `i * start_interval_secs` the moment
/// elapsed time reaches that value, never before. Group 0 starts at offset 0
/// with the race clock itself.
#[derive(Debug)]
pub struct RaceScheduler {
    groups: Vec<StartGroup>,
    start_interval_secs: u32,
    finishes: Vec<ParticipantFinish>,
}

impl RaceScheduler {
    pub fn new(groups: Vec<(String, Vec<String>)>, start_interval_secs: u32) -> Self {
        let groups = groups
            .into_iter()
            .enumerate()
            .map(|(id, (name, participants))| StartGroup {
                id,
                name,
                participants,
                start_offset_secs: if id == 0 { Some(0) } else { None },
            })
            .collect();
        Self {
            groups,
            start_interval_secs,
            finishes: Vec::new(),
        }
    }

    pub fn groups(&self) -> &[StartGroup] {
        &self.groups
    }

    pub fn finishes(&self) -> &[ParticipantFinish] {
        &self.finishes
    }

    pub fn start_interval_secs(&self) -> u32 {
        self.start_interval_secs
    }

    /// All participants in group order, paired with their group id.
    pub fn participants(&self) -> impl Iterator<Item = (usize, &str)> {
        self.groups
            .iter()
            .flat_map(|g| g.participants.iter().map(move |p| (g.id, p.as_str())))
    }

    pub fn participant_count(&self) -> usize {
        self.groups.iter().map(|g| g.participants.len()).sum()
    }

    pub fn is_finished(&self, name: &str) -> bool {
        self.finishes.iter().any(|f| f.name == name)
    }

    pub fn finish_for(&self, name: &str) -> Option<&ParticipantFinish> {
        self.finishes.iter().find(|f| f.name == name)
    }

    /// Finish flags in participant order, for the finish coordinator.
    pub fn finished_flags(&self) -> Vec<bool> {
        self.participants()
            .map(|(_, name)| self.is_finished(name))
            .collect()
    }

    /// Assigns start offsets that the race clock has reached. Idempotent;
    /// an assigned offset is never changed here.
    pub fn observe(&mut self, elapsed_secs: f64) {
        for group in &mut self.groups {
            if group.start_offset_secs.is_none() {
                let due = group.id as u32 * self.start_interval_secs;
                if elapsed_secs >= f64::from(due) {
                    group.start_offset_secs = Some(due);
                }
            }
        }
    }

    /// Records a finish at the current race clock time. The stored time is
    /// relative to the participant's group offset. Marking someone whose
    /// group has not started is rejected; marking an already-finished
    /// participant keeps the first recorded time.
    pub fn mark_finished(&mut self, name: &str, elapsed_secs: f64) -> Result<(), RaceError> {
        let group = self
            .groups
            .iter()
            .find(|g| g.participants.iter().any(|p| p == name))
            .ok_or_else(|| RaceError::UnknownParticipant(name.to_string()))?;
        let offset = group
            .start_offset_secs
            .ok_or_else(|| RaceError::GroupNotStarted {
                group: group.name.clone(),
            })?;
        if self.is_finished(name) {
            return Ok(());
        }
        self.finishes.push(ParticipantFinish {
            name: name.to_string(),
            group_id: group.id,
            finish_secs: elapsed_secs - f64::from(offset),
            placement: 0,
        });
        self.recompute_placements();
        Ok(())
    }

    /// No-op when the participant is not currently finished.
    pub fn undo_finish(&mut self, name: &str) {
        let before = self.finishes.len();
        self.finishes.retain(|f| f.name != name);
        if self.finishes.len() != before {
            self.recompute_placements();
        }
    }

    /// Clears all offsets except group 0 (reassigned 0) and all finishes.
    pub fn reset(&mut self) {
        for group in &mut self.groups {
            group.start_offset_secs = if group.id == 0 { Some(0) } else { None };
        }
        self.finishes.clear();
    }

    // Full recomputation from scratch, never patched incrementally: simpler
    // and still correct after any undo.
    fn recompute_placements(&mut self) {
        let order: Vec<usize> = (0..self.finishes.len())
            .sorted_by(|&a, &b| {
                self.finishes[a]
                    .finish_secs
                    .partial_cmp(&self.finishes[b].finish_secs)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .collect();
        for (rank, idx) in order.into_iter().enumerate() {
            self.finishes[idx].placement = rank as u32 + 1;
        }
    }
}
