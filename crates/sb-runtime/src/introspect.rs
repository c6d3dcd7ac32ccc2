use rhai::EvalAltResult;
use sb_core::{BackendFailure, EvalError, StackFrame};

use crate::helpers::rhai_bridge::position_frame;
use crate::rhai_backend::{call_frame, root_frame};

/// Uniform view over a failure's captured call history.
///
/// Index 0 is the innermost frame. Out-of-range indices, negative ones
/// included, resolve to `None`.
pub trait StackIntrospector {
    type Failure: ?Sized;

    fn depth(&self, failure: &Self::Failure) -> usize;

    fn frame_at(&self, failure: &Self::Failure, index: isize) -> Option<StackFrame>;

    /// Index of the innermost frame matching `predicate`.
    fn find_frame<P>(&self, failure: &Self::Failure, mut predicate: P) -> Option<usize>
    where
        P: FnMut(&StackFrame) -> bool,
    {
        (0..self.depth(failure)).find(|&index| {
            self.frame_at(failure, index as isize)
                .is_some_and(|frame| predicate(&frame))
        })
    }
}

fn pick(frames: &[StackFrame], index: isize) -> Option<StackFrame> {
    usize::try_from(index)
        .ok()
        .and_then(|index| frames.get(index))
        .cloned()
}

#[derive(Debug, Default, Clone, Copy)]
pub struct FailureIntrospector;

impl StackIntrospector for FailureIntrospector {
    type Failure = BackendFailure;

    fn depth(&self, failure: &BackendFailure) -> usize {
        failure.frames().len()
    }

    fn frame_at(&self, failure: &BackendFailure, index: isize) -> Option<StackFrame> {
        pick(&failure.frames(), index)
    }
}

/// Reads rhai's own error nesting, before any conversion.
#[derive(Debug, Clone)]
pub struct RhaiIntrospector {
    label: String,
}

impl RhaiIntrospector {
    /// `label` names frames whose error carries no source of its own.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    fn frames(&self, error: &EvalAltResult) -> Vec<StackFrame> {
        let mut frames = Vec::new();
        let mut current = error;
        loop {
            match current {
                EvalAltResult::ErrorInFunctionCall(function, source, inner, position) => {
                    frames.push(call_frame(&self.label, function, source, *position));
                    current = inner.as_ref();
                }
                EvalAltResult::ErrorInModule(_, inner, position) => {
                    frames.push(position_frame(&self.label, *position));
                    current = inner.as_ref();
                }
                root => {
                    frames.extend(root_frame(&self.label, root));
                    break;
                }
            }
        }
        frames.reverse();
        frames
    }
}

impl StackIntrospector for RhaiIntrospector {
    type Failure = EvalAltResult;

    fn depth(&self, failure: &EvalAltResult) -> usize {
        self.frames(failure).len()
    }

    fn frame_at(&self, failure: &EvalAltResult, index: isize) -> Option<StackFrame> {
        pick(&self.frames(failure), index)
    }
}

/// Reads the trace kept by a normalized [`EvalError::ScriptFailure`]; other
/// kinds have no history.
#[derive(Debug, Default, Clone, Copy)]
pub struct EvalErrorIntrospector;

impl StackIntrospector for EvalErrorIntrospector {
    type Failure = EvalError;

    fn depth(&self, failure: &EvalError) -> usize {
        match failure {
            EvalError::ScriptFailure { trace, .. } => trace.len(),
            _ => 0,
        }
    }

    fn frame_at(&self, failure: &EvalError, index: isize) -> Option<StackFrame> {
        match failure {
            EvalError::ScriptFailure { trace, .. } => pick(trace, index),
            _ => None,
        }
    }
}
