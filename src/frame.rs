//! Control Stack Frames
//!
//! The interpreter keeps a single stack for both subroutine return points
//! and `for`-loop bookkeeping (spec section 3's "Control stack"). The
//! original untagged design layers two frame shapes on one stack and
//! distinguishes them only by which statement happens to pop next; here
//! each entry carries its own tag, so `next` popping a `Return` frame (or
//! `return` popping a `ForLoop` frame) is a caught error instead of a
//! misread.

use crate::error::{BasicError, Result};

/// One entry in the control stack.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlFrame {
    /// Pushed by `gosub`; popped by `return`. Holds the instruction
    /// pointer to resume at (the index into the line index right after
    /// the `gosub`/`do`).
    Return(usize),
    /// Pushed by `for`; popped by `next` once the loop is done. `header_ip`
    /// is the instruction pointer of the line immediately after `for`,
    /// which `next` jumps back to for another pass.
    ForLoop {
        step: f64,
        limit: f64,
        header_ip: usize,
    },
}

/// The control stack itself, plus the two operations that assert the
/// expected frame shape on top.
#[derive(Default)]
pub struct ControlStack {
    frames: Vec<ControlFrame>,
}

impl ControlStack {
    pub fn new() -> Self {
        Self { frames: Vec::new() }
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn push_return(&mut self, ip: usize) {
        self.frames.push(ControlFrame::Return(ip));
    }

    pub fn push_for_loop(&mut self, step: f64, limit: f64, header_ip: usize) {
        self.frames.push(ControlFrame::ForLoop {
            step,
            limit,
            header_ip,
        });
    }

    /// `return` requires a single-integer frame on top.
    pub fn pop_return(&mut self) -> Result<usize> {
        match self.frames.pop() {
            Some(ControlFrame::Return(ip)) => Ok(ip),
            Some(other) => {
                // Put it back — popping on a mismatch is a user error, not
                // a state mutation.
                self.frames.push(other);
                Err(BasicError::RuntimeError(
                    "RETURN without matching GOSUB".to_string(),
                ))
            }
            None => Err(BasicError::RuntimeError(
                "RETURN without matching GOSUB".to_string(),
            )),
        }
    }

    /// `next V` requires a three-slot for-frame on top; returns it by value
    /// so the caller can decide whether to re-push (loop continues) or
    /// drop it (loop done).
    pub fn peek_for_loop(&self) -> Result<(f64, f64, usize)> {
        match self.frames.last() {
            Some(ControlFrame::ForLoop {
                step,
                limit,
                header_ip,
            }) => Ok((*step, *limit, *header_ip)),
            _ => Err(BasicError::RuntimeError(
                "NEXT without matching FOR".to_string(),
            )),
        }
    }

    pub fn pop_for_loop(&mut self) {
        self.frames.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_pop_on_empty_stack_errors() {
        let mut stack = ControlStack::new();
        assert!(stack.pop_return().is_err());
    }

    #[test]
    fn return_pop_mismatched_frame_errors_and_preserves_stack() {
        let mut stack = ControlStack::new();
        stack.push_for_loop(1.0, 10.0, 3);
        assert!(stack.pop_return().is_err());
        assert!(stack.peek_for_loop().is_ok());
    }

    #[test]
    fn for_loop_round_trip() {
        let mut stack = ControlStack::new();
        stack.push_for_loop(1.0, 10.0, 3);
        let (step, limit, header_ip) = stack.peek_for_loop().unwrap();
        assert_eq!((step, limit, header_ip), (1.0, 10.0, 3));
        stack.pop_for_loop();
        assert!(stack.peek_for_loop().is_err());
    }

    #[test]
    fn return_round_trip() {
        let mut stack = ControlStack::new();
        stack.push_return(7);
        assert_eq!(stack.pop_return().unwrap(), 7);
    }
}
