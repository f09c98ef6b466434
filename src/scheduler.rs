use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

#[derive(Debug, Clone)]
struct Task<K> {
    id: TaskId,
    due: Instant,
    every: Option<Duration>,
    kind: K,
}

/// Cancellable one-shot and repeating tasks on explicit time.
///
/// Nothing runs on its own: the owner calls [`Scheduler::pop_due`] with the
/// current instant and handles what comes back.
#[derive(Debug, Clone)]
pub struct Scheduler<K> {
    next_id: u64,
    tasks: Vec<Task<K>>,
}

impl<K> Default for Scheduler<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            tasks: Vec::new(),
        }
    }
}

impl<K: Copy> Scheduler<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn once(&mut self, now: Instant, delay: Duration, kind: K) -> TaskId {
        self.push(now + delay, None, kind)
    }

    /// Repeat every `period`, first firing one period from `now`
    pub fn every(&mut self, now: Instant, period: Duration, kind: K) -> TaskId {
        self.push(now + period, Some(period), kind)
    }

    fn push(&mut self, due: Instant, every: Option<Duration>, kind: K) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(Task {
            id,
            due,
            every,
            kind,
        });
        id
    }

    /// Returns true when the task was still scheduled
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Earliest task due at or before `now`, with the instant it was due.
    /// Repeating tasks are re-armed one period later; ties go to the
    /// task scheduled first.
    pub fn pop_due(&mut self, now: Instant) -> Option<(TaskId, K, Instant)> {
        let idx = self
            .tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= now)
            .min_by_key(|(_, t)| (t.due, t.id.0))
            .map(|(idx, _)| idx)?;

        let Task {
            id,
            due,
            every,
            kind,
        } = self.tasks[idx].clone();
        match every {
            Some(period) => self.tasks[idx].due = due + period,
            None => {
                self.tasks.remove(idx);
            }
        }
        Some((id, kind, due))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Kind {
        A,
        B,
    }

    #[test]
    fn once_fires_a_single_time() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        let id = s.once(t0, Duration::from_secs(2), Kind::A);

        assert!(s.pop_due(t0 + Duration::from_secs(1)).is_none());
        assert_eq!(
            s.pop_due(t0 + Duration::from_secs(2)),
            Some((id, Kind::A, t0 + Duration::from_secs(2)))
        );
        assert!(s.pop_due(t0 + Duration::from_secs(10)).is_none());
        assert!(!s.is_scheduled(id));
    }

    #[test]
    fn every_catches_up_one_period_at_a_time() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.every(t0, Duration::from_secs(1), Kind::A);

        let mut fired = 0;
        while s.pop_due(t0 + Duration::from_secs(5)).is_some() {
            fired += 1;
        }
        assert_eq!(fired, 5);
    }

    #[test]
    fn cancel_stops_repeats() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        let id = s.every(t0, Duration::from_secs(1), Kind::A);
        assert!(s.pop_due(t0 + Duration::from_secs(1)).is_some());
        assert!(s.cancel(id));
        assert!(!s.cancel(id));
        assert!(s.pop_due(t0 + Duration::from_secs(60)).is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn earliest_due_wins() {
        let t0 = Instant::now();
        let mut s = Scheduler::new();
        s.once(t0, Duration::from_secs(3), Kind::A);
        s.once(t0, Duration::from_secs(1), Kind::B);

        let later = t0 + Duration::from_secs(5);
        assert_eq!(s.pop_due(later).map(|(_, k, _)| k), Some(Kind::B));
        assert_eq!(s.pop_due(later).map(|(_, k, _)| k), Some(Kind::A));
    }
}
