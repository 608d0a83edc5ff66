//! Scrollback buffer state.

use std::collections::VecDeque;

use env0_types::LineKind;

use crate::common::{sanitize_for_display, wrap_line};

/// Distance from the bottom, in rows, that still counts as "at the bottom".
pub const NEAR_BOTTOM_ROWS: usize = 1;

/// Stable identity of a committed line.
///
/// Ids increase monotonically and are never reused, so a stale id (line
/// evicted or cleared) simply no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(u64);

/// A line waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLine {
    pub text: String,
    pub kind: LineKind,
    /// 1-based choice index, set only for choice lines.
    pub choice: Option<usize>,
}

impl NewLine {
    pub fn new(text: impl Into<String>, kind: LineKind) -> Self {
        Self {
            text: text.into(),
            kind,
            choice: None,
        }
    }

    pub fn standard(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Standard)
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::System)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, LineKind::Error)
    }

    /// A blank separator line.
    pub fn spacer() -> Self {
        Self::new(" ", LineKind::Spacer)
    }

    pub fn choice(index: usize, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::Choice,
            choice: Some(index),
        }
    }
}

/// A committed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    pub id: LineId,
    pub text: String,
    pub kind: LineKind,
    pub choice: Option<usize>,
}

impl LineRecord {
    /// Display rows for this line at `width` columns.
    pub fn rows(&self, width: usize) -> Vec<String> {
        wrap_line(&sanitize_for_display(&self.text), width)
    }

    pub fn row_count(&self, width: usize) -> usize {
        self.rows(width).len()
    }
}

/// Scroll mode for the scrollback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    /// Auto-scroll to show the latest line.
    FollowLatest,
    /// User scrolled manually; offset is the row index from the top.
    Anchored { offset: usize },
}

/// Scroll position in wrapped rows.
///
/// Row totals are passed in by the caller since they depend on the
/// viewport width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollState {
    pub mode: ScrollMode,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            mode: ScrollMode::FollowLatest,
        }
    }
}

impl ScrollState {
    /// Returns true if currently following output (auto-scroll).
    pub fn is_following(&self) -> bool {
        matches!(self.mode, ScrollMode::FollowLatest)
    }

    /// Returns the first visible row.
    pub fn get_offset(&self, total_rows: usize, viewport_height: usize) -> usize {
        let max_offset = total_rows.saturating_sub(viewport_height);
        match self.mode {
            ScrollMode::FollowLatest => max_offset,
            ScrollMode::Anchored { offset } => offset.min(max_offset),
        }
    }

    pub fn scroll_up(&mut self, rows: usize, total_rows: usize, viewport_height: usize) {
        let offset = self.get_offset(total_rows, viewport_height);
        self.settle(offset.saturating_sub(rows), total_rows, viewport_height);
    }

    pub fn scroll_down(&mut self, rows: usize, total_rows: usize, viewport_height: usize) {
        if self.is_following() {
            return;
        }
        let offset = self.get_offset(total_rows, viewport_height);
        self.settle(offset + rows, total_rows, viewport_height);
    }

    /// Re-enables auto-scroll.
    pub fn scroll_to_bottom(&mut self) {
        self.mode = ScrollMode::FollowLatest;
    }

    /// Shifts an anchored view up after `rows` rows were removed above it.
    pub fn rows_removed(&mut self, rows: usize) {
        if let ScrollMode::Anchored { offset } = &mut self.mode {
            *offset = offset.saturating_sub(rows);
        }
    }

    fn settle(&mut self, offset: usize, total_rows: usize, viewport_height: usize) {
        let max_offset = total_rows.saturating_sub(viewport_height);
        if offset + NEAR_BOTTOM_ROWS >= max_offset {
            self.mode = ScrollMode::FollowLatest;
        } else {
            self.mode = ScrollMode::Anchored { offset };
        }
    }
}

/// Viewport size of the scrollback pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 80,
            height: 24,
        }
    }
}

/// The bounded, ordered line buffer.
#[derive(Debug)]
pub struct Scrollback {
    lines: VecDeque<LineRecord>,
    pending: Vec<NewLine>,
    capacity: usize,
    next_id: u64,
    pub scroll: ScrollState,
    pub viewport: Viewport,
}

impl Scrollback {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            pending: Vec::new(),
            capacity: capacity.max(1),
            next_id: 0,
            scroll: ScrollState::default(),
            viewport: Viewport::default(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of committed lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns true if appends are waiting for the next flush.
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &LineRecord> {
        self.lines.iter()
    }

    pub fn last(&self) -> Option<&LineRecord> {
        self.lines.back()
    }

    pub fn get(&self, id: LineId) -> Option<&LineRecord> {
        self.position(id).and_then(|idx| self.lines.get(idx))
    }

    /// Queues a line for the next flush.
    pub fn append(&mut self, line: NewLine) {
        self.pending.push(line);
    }

    /// Commits every queued line in call order. Returns how many were
    /// committed.
    pub fn flush(&mut self) -> usize {
        if self.pending.is_empty() {
            return 0;
        }
        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        for line in pending {
            self.push(line);
        }
        count
    }

    /// Commits a line immediately, after anything already queued.
    pub fn commit(&mut self, line: NewLine) -> LineId {
        self.flush();
        self.push(line)
    }

    /// Replaces the text of the newest line, and its kind when given.
    ///
    /// Queued appends are flushed first so the update targets the newest
    /// line. Returns false when there is no line to update.
    pub fn update_last(&mut self, text: &str, kind: Option<LineKind>) -> bool {
        self.flush();
        let Some(last) = self.lines.back_mut() else {
            return false;
        };
        last.text = text.to_string();
        if let Some(kind) = kind {
            last.kind = kind;
            if kind != LineKind::Choice {
                last.choice = None;
            }
        }
        true
    }

    /// Replaces the text of line `id`. Returns false if the line is gone.
    pub fn set_text(&mut self, id: LineId, text: &str) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        self.lines[idx].text.clear();
        self.lines[idx].text.push_str(text);
        true
    }

    /// Drops every committed and queued line and resumes following.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.pending.clear();
        self.scroll.scroll_to_bottom();
    }

    /// Total wrapped rows at the current viewport width.
    pub fn row_count(&self) -> usize {
        self.lines
            .iter()
            .map(|line| line.row_count(self.viewport.width))
            .sum()
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        self.viewport = Viewport {
            width: width.max(1),
            height,
        };
    }

    pub fn scroll_up(&mut self, rows: usize) {
        let total = self.row_count();
        self.scroll.scroll_up(rows, total, self.viewport.height);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        let total = self.row_count();
        self.scroll.scroll_down(rows, total, self.viewport.height);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.viewport.height.max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.viewport.height.max(1));
    }

    pub fn jump_to_latest(&mut self) {
        self.scroll.scroll_to_bottom();
    }

    fn push(&mut self, line: NewLine) -> LineId {
        let id = LineId(self.next_id);
        self.next_id += 1;
        self.lines.push_back(LineRecord {
            id,
            text: line.text,
            kind: line.kind,
            choice: line.choice,
        });
        while self.lines.len() > self.capacity {
            if let Some(evicted) = self.lines.pop_front() {
                self.scroll
                    .rows_removed(evicted.row_count(self.viewport.width));
            }
        }
        id
    }

    /// Index of line `id`. Ids are ascending, so this is a binary search.
    fn position(&self, id: LineId) -> Option<usize> {
        self.lines.binary_search_by_key(&id, |line| line.id).ok()
    }
}
