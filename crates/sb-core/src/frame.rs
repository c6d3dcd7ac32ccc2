use std::fmt;

use serde::{Deserialize, Serialize};

/// One entry of a captured call history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackFrame {
    pub function: Option<String>,
    pub source: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

impl StackFrame {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            function: None,
            source: source.into(),
            line: None,
            column: None,
        }
    }

    pub fn in_function(mut self, function: impl Into<String>) -> Self {
        self.function = Some(function.into());
        self
    }

    pub fn at(mut self, line: Option<usize>, column: Option<usize>) -> Self {
        self.line = line;
        self.column = column;
        self
    }
}

impl fmt::Display for StackFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(function) = &self.function {
            write!(f, "{} ", function)?;
        }
        write!(f, "({}", self.source)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        write!(f, ")")
    }
}
