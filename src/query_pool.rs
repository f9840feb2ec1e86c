use heapless::Vec;

use crate::protocol::{codes, Code};

pub const MAX_QUERIES: usize = 24;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PoolError {
    Full(Code),
    Duplicate(Code),
}

/// Queries polled each scan, in order, with the position of the scan.
///
/// The cursor is a plain index: it either names a live entry or equals the
/// pool length, which means no scan is in progress.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueryPool {
    queries: Vec<Code, MAX_QUERIES>,
    cursor: usize,
}

impl QueryPool {
    /// Builds a pool with a scan already pending from its first entry.
    pub fn new(queries: &[Code]) -> Result<Self, PoolError> {
        let mut pool: Vec<Code, MAX_QUERIES> = Vec::new();
        for &query in queries {
            if pool.contains(&query) {
                return Err(PoolError::Duplicate(query));
            }
            pool.push(query).map_err(PoolError::Full)?;
        }
        Ok(QueryPool { queries: pool, cursor: 0 })
    }

    pub fn current(&self) -> Option<Code> {
        self.queries.get(self.cursor).copied()
    }

    pub fn is_scanning(&self) -> bool {
        self.cursor < self.queries.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Moves on to the next query, the scan ends after the last one.
    pub fn advance(&mut self) {
        if self.is_scanning() {
            self.cursor += 1;
        }
    }

    /// Starts a new scan from the first query.
    pub fn restart(&mut self) -> Option<Code> {
        self.cursor = 0;
        self.current()
    }

    pub fn abort(&mut self) {
        self.cursor = self.queries.len();
    }

    /// Drops the query under the cursor. The cursor keeps its index and so
    /// lands on the query that followed, or on the end of the pool.
    pub fn remove_current(&mut self) -> Option<Code> {
        if self.is_scanning() {
            Some(self.queries.remove(self.cursor))
        } else {
            None
        }
    }

    /// Drops `query` wherever it is, keeping the cursor on the same entry.
    pub fn remove(&mut self, query: Code) -> bool {
        match self.queries.iter().position(|&q| q == query) {
            Some(index) => {
                self.queries.remove(index);
                if index < self.cursor {
                    self.cursor -= 1;
                }
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, query: Code) -> bool {
        self.queries.contains(&query)
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Code> + '_ {
        self.queries.iter().copied()
    }
}

impl Default for QueryPool {
    fn default() -> Self {
        QueryPool {
            queries: Vec::from_slice(&codes::DEFAULT_QUERIES).unwrap_or_default(),
            cursor: 0,
        }
    }
}
