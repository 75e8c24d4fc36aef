//! Timed action sequences advanced by the frame tick.
//!
//! A [`Sequence`] is a list of waits and cues. Running it under a key
//! replaces whatever was running under that key, and removing the key cancels
//! it on the spot. Cues come back from [`Scheduler::advance`] together with how
//! far past their deadline the frame ran, so callers can stay exact in virtual
//! time even when frames are coarse.

#[derive(Debug, Clone, PartialEq)]
pub enum Step<E> {
    Wait(f64),
    Emit(E),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sequence<E> {
    steps: Vec<Step<E>>,
    repeat_from: Option<usize>,
}

impl<E> Sequence<E> {
    pub fn once(steps: Vec<Step<E>>) -> Self {
        Self {
            steps,
            repeat_from: None,
        }
    }

    /// Runs `prelude` once, then `body` forever.
    ///
    /// A body without any positive wait would fire unboundedly within one
    /// frame, so such a body runs a single time instead.
    pub fn forever(prelude: Vec<Step<E>>, body: Vec<Step<E>>) -> Self {
        let has_wait = body.iter().any(|s| matches!(s, Step::Wait(d) if *d > 0.0));
        let repeat_from = has_wait.then_some(prelude.len());
        let mut steps = prelude;
        steps.extend(body);
        Self { steps, repeat_from }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fired<E> {
    pub cue: E,
    /// Time between the cue's deadline and the end of the frame.
    pub late_by: f64,
}

#[derive(Debug)]
struct Task<E> {
    key: &'static str,
    /// Order of `run` calls, for [`Scheduler::checkpoint`].
    serial: u64,
    sequence: Sequence<E>,
    cursor: usize,
    waited: f64,
}

impl<E: Clone> Task<E> {
    /// Returns true once the sequence has run out of steps.
    fn advance(&mut self, dt: f64, fired: &mut Vec<Fired<E>>) -> bool {
        let mut budget = dt;
        loop {
            if self.cursor >= self.sequence.steps.len() {
                match self.sequence.repeat_from {
                    Some(start) => self.cursor = start,
                    None => return true,
                }
            }
            match &self.sequence.steps[self.cursor] {
                Step::Wait(duration) => {
                    let remaining = duration - self.waited;
                    if budget >= remaining {
                        budget -= remaining.max(0.0);
                        self.waited = 0.0;
                        self.cursor += 1;
                    } else {
                        self.waited += budget;
                        return false;
                    }
                }
                Step::Emit(cue) => {
                    fired.push(Fired {
                        cue: cue.clone(),
                        late_by: budget,
                    });
                    self.cursor += 1;
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct Scheduler<E> {
    tasks: Vec<Task<E>>,
    next_serial: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            next_serial: 0,
        }
    }
}

impl<E: Clone> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn run(&mut self, key: &'static str, sequence: Sequence<E>) {
        self.remove(key);
        let serial = self.next_serial;
        self.next_serial += 1;
        self.tasks.push(Task {
            key,
            serial,
            sequence,
            cursor: 0,
            waited: 0.0,
        });
    }

    /// Cancels the task under `key`. Returns whether one was running.
    pub fn remove(&mut self, key: &'static str) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.key != key);
        self.tasks.len() != before
    }

    pub fn is_running(&self, key: &'static str) -> bool {
        self.tasks.iter().any(|t| t.key == key)
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn advance(&mut self, dt: f64) -> Vec<Fired<E>> {
        self.advance_since(u64::MAX, dt)
    }

    /// Marks the tasks running now. Pass it to [`Scheduler::advance_since`].
    pub fn checkpoint(&self) -> u64 {
        self.next_serial
    }

    /// Advances tasks run before `checkpoint` by `dt`. Tasks run after it
    /// only fire their leading cues; their waits start counting next frame.
    pub fn advance_since(&mut self, checkpoint: u64, dt: f64) -> Vec<Fired<E>> {
        let mut fired = Vec::new();
        self.tasks.retain_mut(|task| {
            let dt = if task.serial < checkpoint { dt } else { 0.0 };
            !task.advance(dt, &mut fired)
        });
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cues(fired: &[Fired<u32>]) -> Vec<u32> {
        fired.iter().map(|f| f.cue).collect()
    }

    #[test]
    fn test_wait_then_emit() {
        let mut s = Scheduler::new();
        s.run("a", Sequence::once(vec![Step::Wait(0.5), Step::Emit(1)]));
        assert!(s.advance(0.25).is_empty());
        let fired = s.advance(0.5);
        assert_eq!(cues(&fired), vec![1]);
        assert!((fired[0].late_by - 0.25).abs() < 1e-12);
        assert!(!s.is_running("a"));
    }

    #[test]
    fn test_exact_deadline_fires_on_time() {
        let mut s = Scheduler::new();
        s.run("a", Sequence::once(vec![Step::Wait(0.5), Step::Emit(7)]));
        let fired = s.advance(0.5);
        assert_eq!(cues(&fired), vec![7]);
        assert_eq!(fired[0].late_by, 0.0);
    }

    #[test]
    fn test_forever_repeats_body_only() {
        let mut s = Scheduler::new();
        s.run(
            "spawn",
            Sequence::forever(vec![Step::Wait(0.5)], vec![Step::Emit(1), Step::Wait(2.0)]),
        );
        assert_eq!(cues(&s.advance(0.5)), vec![1]);
        assert!(s.advance(1.5).is_empty());
        assert_eq!(cues(&s.advance(0.5)), vec![1]);
        // one long frame covering two periods fires twice
        let fired = s.advance(4.0);
        assert_eq!(cues(&fired), vec![1, 1]);
        assert!((fired[0].late_by - 2.0).abs() < 1e-12);
        assert_eq!(fired[1].late_by, 0.0);
    }

    #[test]
    fn test_remove_cancels() {
        let mut s = Scheduler::new();
        s.run("spawn", Sequence::forever(vec![], vec![Step::Wait(1.0), Step::Emit(1)]));
        assert!(s.remove("spawn"));
        assert!(!s.remove("spawn"));
        assert!(s.advance(10.0).is_empty());
    }

    #[test]
    fn test_run_replaces_same_key() {
        let mut s = Scheduler::new();
        s.run("k", Sequence::once(vec![Step::Wait(1.0), Step::Emit(1)]));
        s.run("k", Sequence::once(vec![Step::Wait(1.0), Step::Emit(2)]));
        assert_eq!(cues(&s.advance(1.0)), vec![2]);
    }

    #[test]
    fn test_forever_without_wait_runs_once() {
        let mut s = Scheduler::new();
        s.run("k", Sequence::forever(vec![], vec![Step::Emit(3)]));
        assert_eq!(cues(&s.advance(0.1)), vec![3]);
        assert!(s.advance(0.1).is_empty());
    }

    #[test]
    fn test_task_run_after_checkpoint_waits_for_next_frame() {
        let mut s = Scheduler::new();
        s.run("old", Sequence::once(vec![Step::Wait(0.5), Step::Emit(1)]));
        let mark = s.checkpoint();
        s.run("new", Sequence::once(vec![Step::Emit(2), Step::Wait(0.5), Step::Emit(3)]));

        // the new task's leading cue fires now, its wait doesn't start yet
        assert_eq!(cues(&s.advance_since(mark, 0.5)), vec![1, 2]);
        assert!(s.advance(0.25).is_empty());
        assert_eq!(cues(&s.advance(0.25)), vec![3]);
    }
}
