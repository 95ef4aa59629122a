#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionalKind {
    If,
    Ifdef,
    Ifndef,
}

/// One entry per nested `#if`/`#ifdef`/`#ifndef`. `skip_block` is whether the
/// *currently active* group within this conditional should be emitted;
/// `skip_group` additionally silences the current `#elif`/`#else` group once
/// a prior group in the same conditional has already been taken
/// (`found_valid_group`), per the edge policy that a `#elif` following the
/// first true group sets `skip_group` without evaluating its expression.
#[derive(Debug, Clone, Copy)]
pub struct ConditionalFrame {
    pub kind: ConditionalKind,
    pub skip_block: bool,
    pub skip_group: bool,
    pub found_else_group: bool,
    pub found_valid_group: bool,
}

impl ConditionalFrame {
    pub fn new(kind: ConditionalKind, taken: bool, parent_active: bool) -> ConditionalFrame {
        ConditionalFrame {
            kind,
            skip_block: !taken || !parent_active,
            skip_group: !taken,
            found_else_group: false,
            found_valid_group: taken,
        }
    }
}

/// A stack of conditional frames; a line is emitted only while every frame
/// on the stack has `skip_block == false` for the direct branch it belongs
/// to and no ancestor frame is itself skipped.
#[derive(Default)]
pub struct ConditionalStack {
    frames: Vec<ConditionalFrame>,
    parent_active: Vec<bool>,
}

impl ConditionalStack {
    pub fn is_active(&self) -> bool {
        self.frames.last().map(|f| !f.skip_block).unwrap_or(true)
    }

    pub fn push(&mut self, kind: ConditionalKind, taken: bool) {
        let parent_active = self.is_active();
        self.parent_active.push(parent_active);
        self.frames.push(ConditionalFrame::new(kind, taken, parent_active));
    }

    pub fn enter_elif(&mut self, taken: bool) -> bool {
        let parent_active = *self.parent_active.last().unwrap_or(&true);
        let Some(top) = self.frames.last_mut() else { return false };
        if top.found_else_group {
            return false; // malformed: #elif after #else; caller reports.
        }
        if top.found_valid_group {
            top.skip_group = true;
            top.skip_block = true;
            return true;
        }
        top.skip_block = !taken || !parent_active;
        top.skip_group = !taken;
        if taken {
            top.found_valid_group = true;
        }
        true
    }

    pub fn enter_else(&mut self) -> bool {
        let parent_active = *self.parent_active.last().unwrap_or(&true);
        let Some(top) = self.frames.last_mut() else { return false };
        if top.found_else_group {
            return false;
        }
        top.found_else_group = true;
        let taken = !top.found_valid_group;
        top.skip_block = !taken || !parent_active;
        if taken {
            top.found_valid_group = true;
        }
        true
    }

    pub fn pop(&mut self) -> bool {
        self.parent_active.pop();
        self.frames.pop().is_some()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether the innermost conditional has already taken a group; callers
    /// use this to skip evaluating a `#elif` expression once a prior group
    /// in the same conditional has already matched.
    pub fn innermost_found_valid_group(&self) -> bool {
        self.frames.last().map(|f| f.found_valid_group).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elif_after_taken_group_is_skipped_without_evaluation() {
        let mut stack = ConditionalStack::default();
        stack.push(ConditionalKind::If, true);
        assert!(stack.is_active());
        stack.enter_elif(true); // would normally be skipped regardless of `taken`
        assert!(!stack.is_active());
        stack.pop();
    }

    #[test]
    fn else_taken_when_no_group_matched() {
        let mut stack = ConditionalStack::default();
        stack.push(ConditionalKind::If, false);
        assert!(!stack.is_active());
        stack.enter_else();
        assert!(stack.is_active());
        stack.pop();
    }

    #[test]
    fn nested_inactive_parent_suppresses_child() {
        let mut stack = ConditionalStack::default();
        stack.push(ConditionalKind::If, false);
        stack.push(ConditionalKind::If, true);
        assert!(!stack.is_active());
        stack.pop();
        stack.pop();
    }
}
