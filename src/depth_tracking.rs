use crate::error::{Error, Result};

/// The kind of container a start marker opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Nest {
    Object,
    Array,
}

#[derive(Clone, Debug)]
pub struct DepthTracker {
    tracking: Vec<Nest>,
    max_depth: usize,
}

impl DepthTracker {
    /// Create a new depth tracker that fails once more than `max_depth` containers are open.
    pub fn new(max_depth: usize) -> Self {
        Self {
            tracking: Vec::new(),
            max_depth,
        }
    }

    /// Record a start marker.
    pub fn enter(&mut self, nest: Nest) -> Result<()> {
        self.tracking.push(nest);
        if self.tracking.len() > self.max_depth {
            return Err(Error::MalformedDocument(format!(
                "Depth limit of {} exceeded",
                self.max_depth
            )));
        }
        Ok(())
    }

    /// Record an end marker, failing if it doesn't close the innermost open container.
    pub fn exit(&mut self, nest: Nest) -> Result<()> {
        match self.tracking.last() {
            Some(open) if *open == nest => {
                self.tracking.pop();
                Ok(())
            }
            Some(open) => Err(Error::MalformedDocument(format!(
                "{:?} end marker found while an {:?} is open",
                nest, open
            ))),
            None => Err(Error::MalformedDocument(format!(
                "{:?} end marker found with nothing open",
                nest
            ))),
        }
    }

    /// Number of currently open containers.
    pub fn depth(&self) -> usize {
        self.tracking.len()
    }

    /// The innermost open container, if any.
    pub fn current(&self) -> Option<Nest> {
        self.tracking.last().copied()
    }
}
