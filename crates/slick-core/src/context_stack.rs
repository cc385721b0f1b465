//! Frame stack for rules that track enclosing constructs.
//!
//! Rules following the enter/leave protocol push a frame when entering a
//! construct and pop it when leaving. Because subtree skips still deliver
//! the exit visit, pushes and pops stay balanced; popping an empty stack is
//! therefore a broken rule, not a recoverable condition.

/// A stack of per-construct frames.
#[derive(Debug)]
pub struct ContextStack<T> {
    frames: Vec<T>,
}

impl<T> Default for ContextStack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ContextStack<T> {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    /// Pushes a frame on construct entry.
    pub fn push(&mut self, frame: T) {
        self.frames.push(frame);
    }

    /// Pops the frame on construct exit.
    ///
    /// # Panics
    ///
    /// Panics when the stack is empty: an exit without a matching entry
    /// violates the visiting protocol.
    pub fn pop(&mut self) -> T {
        match self.frames.pop() {
            Some(frame) => frame,
            None => panic!("context stack underflow: exit visited without a matching entry"),
        }
    }

    /// The innermost frame, if any.
    #[must_use]
    pub fn top(&self) -> Option<&T> {
        self.frames.last()
    }

    /// Mutable access to the innermost frame, if any.
    pub fn top_mut(&mut self) -> Option<&mut T> {
        self.frames.last_mut()
    }

    /// Number of frames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Returns true when no construct is open.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}
