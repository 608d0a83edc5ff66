use std::collections::VecDeque;
use std::time::{Duration, Instant};

use env0_core::config::TypingConfig;
use unicode_segmentation::UnicodeSegmentation;

use crate::features::scrollback::{LineId, NewLine, Scrollback};

/// Ticket identifying one queued reveal or pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RevealId(u64);

impl RevealId {
    #[cfg(test)]
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug)]
enum TaskBody {
    Line { line: NewLine, instant: bool },
    Pause(Duration),
}

#[derive(Debug)]
struct TypingTask {
    id: RevealId,
    body: TaskBody,
}

#[derive(Debug)]
enum Active {
    /// Revealing `text` into line `line`, one grapheme per step.
    Typing {
        id: RevealId,
        line: LineId,
        text: String,
        /// Byte offset of the end of each grapheme.
        ends: Vec<usize>,
        shown: usize,
        started: Instant,
    },
    /// Waiting out a pause or the post-line delay.
    Holding { id: RevealId, until: Instant },
}

/// Serialized line reveal queue.
#[derive(Debug)]
pub struct Animator {
    config: TypingConfig,
    queue: VecDeque<TypingTask>,
    active: Option<Active>,
    /// Deadline the previous task resolved at, while tasks keep running
    /// back to back. The next task starts from here, not from the tick.
    resume_at: Option<Instant>,
    completed: Vec<RevealId>,
    next_id: u64,
}

impl Animator {
    pub fn new(config: TypingConfig) -> Self {
        Self {
            config,
            queue: VecDeque::new(),
            active: None,
            resume_at: None,
            completed: Vec::new(),
            next_id: 0,
        }
    }

    pub fn config(&self) -> &TypingConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns true while a task is running or queued.
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.queue.is_empty()
    }

    /// Queues `line` for a typed reveal.
    ///
    /// With animation disabled the line goes straight to the scrollback
    /// batch and the ticket completes immediately.
    pub fn reveal(&mut self, scrollback: &mut Scrollback, line: NewLine) -> RevealId {
        self.enqueue_line(scrollback, line, false)
    }

    /// Queues `line` to appear in full once the tasks ahead of it finish.
    pub fn reveal_instant(&mut self, scrollback: &mut Scrollback, line: NewLine) -> RevealId {
        self.enqueue_line(scrollback, line, true)
    }

    /// Queues a pause. Skipped when animation is disabled.
    pub fn pause(&mut self, duration: Duration) -> RevealId {
        let id = self.next_id();
        if self.config.enabled {
            self.queue.push_back(TypingTask {
                id,
                body: TaskBody::Pause(duration),
            });
        } else {
            self.completed.push(id);
        }
        id
    }

    /// Enables or disables animation.
    ///
    /// Disabling completes every running and queued task at once, in order.
    pub fn set_enabled(&mut self, enabled: bool, scrollback: &mut Scrollback) {
        self.config.enabled = enabled;
        if enabled {
            return;
        }

        scrollback.flush();
        match self.active.take() {
            Some(Active::Typing { id, line, text, .. }) => {
                scrollback.set_text(line, &text);
                self.completed.push(id);
            }
            Some(Active::Holding { id, .. }) => self.completed.push(id),
            None => {}
        }
        for task in self.queue.drain(..) {
            if let TaskBody::Line { line, .. } = task.body {
                scrollback.commit(line);
            }
            self.completed.push(task.id);
        }
        self.resume_at = None;
    }

    /// Drains tickets completed since the last call, oldest first.
    pub fn take_completed(&mut self) -> Vec<RevealId> {
        std::mem::take(&mut self.completed)
    }

    /// Advances the queue to `now`.
    ///
    /// Steps whose deadlines passed between ticks are applied in one go, so
    /// the reveal rate does not depend on how often this is called.
    pub fn tick(&mut self, now: Instant, scrollback: &mut Scrollback) {
        loop {
            if self.active.is_none() {
                let Some(task) = self.queue.pop_front() else {
                    self.resume_at = None;
                    return;
                };
                let start = self.resume_at.unwrap_or(now);
                self.start(task, start, scrollback);
                continue;
            }
            if !self.advance(now, scrollback) {
                return;
            }
        }
    }

    fn next_id(&mut self) -> RevealId {
        let id = RevealId(self.next_id);
        self.next_id += 1;
        id
    }

    fn enqueue_line(&mut self, scrollback: &mut Scrollback, line: NewLine, instant: bool) -> RevealId {
        let id = self.next_id();
        if self.config.enabled {
            self.queue.push_back(TypingTask {
                id,
                body: TaskBody::Line { line, instant },
            });
        } else {
            scrollback.append(line);
            self.completed.push(id);
        }
        id
    }

    fn start(&mut self, task: TypingTask, start: Instant, scrollback: &mut Scrollback) {
        match task.body {
            TaskBody::Pause(duration) => {
                self.active = Some(Active::Holding {
                    id: task.id,
                    until: start + duration,
                });
            }
            TaskBody::Line { line, instant } => {
                let ends: Vec<usize> = line
                    .text
                    .grapheme_indices(true)
                    .map(|(idx, grapheme)| idx + grapheme.len())
                    .collect();
                if instant || !self.config.enabled || ends.len() > self.config.max_chars_per_line
                {
                    scrollback.commit(line);
                    self.finish(task.id, start);
                    return;
                }
                let text = line.text.clone();
                let line_id = scrollback.commit(NewLine {
                    text: String::new(),
                    ..line
                });
                self.active = Some(Active::Typing {
                    id: task.id,
                    line: line_id,
                    text,
                    ends,
                    shown: 0,
                    started: start,
                });
            }
        }
    }

    /// Moves the active task forward. Returns true if it completed.
    fn advance(&mut self, now: Instant, scrollback: &mut Scrollback) -> bool {
        let char_delay = self.config.char_delay();
        let line_delay = self.config.line_delay();

        match &mut self.active {
            Some(Active::Typing {
                id,
                line,
                text,
                ends,
                shown,
                started,
            }) => {
                // An empty line still takes one step.
                let steps = ends.len().max(1);
                let due = if char_delay.is_zero() {
                    steps
                } else {
                    let elapsed = now.saturating_duration_since(*started);
                    usize::try_from(elapsed.as_nanos() / char_delay.as_nanos()).unwrap_or(steps)
                }
                .min(steps);

                if due > *shown {
                    *shown = due;
                    let end = match due.min(ends.len()) {
                        0 => 0,
                        n => ends[n - 1],
                    };
                    scrollback.set_text(*line, &text[..end]);
                }
                if *shown < steps {
                    return false;
                }

                let revealed_at = *started + char_delay.saturating_mul(steps as u32);
                self.active = Some(Active::Holding {
                    id: *id,
                    until: revealed_at + line_delay,
                });
                self.advance(now, scrollback)
            }
            Some(Active::Holding { id, until }) => {
                if *until > now {
                    return false;
                }
                let (id, until) = (*id, *until);
                self.finish(id, until);
                true
            }
            None => false,
        }
    }

    fn finish(&mut self, id: RevealId, at: Instant) {
        self.active = None;
        self.resume_at = Some(at);
        self.completed.push(id);
    }
}
