//! Sort-merge join
//!
//! Equality join of two inputs already sorted ascending by their key
//! column. Runs of equal keys are buffered on both sides and their full
//! cross product is emitted, so duplicate-to-duplicate matches survive.
//!
//! Memory grows with the largest equal-key run: O(|left run| + |right run|)
//! buffered, O(|left run| * |right run|) rows emitted. A key shared by many
//! rows on both sides is expensive; size inputs accordingly.

use std::cmp::Ordering;

use crate::error::{RecFileError, Result};

use super::source::Row;

/// Position of the join key in a column list (case-insensitive)
pub fn key_index(columns: &[String], key: &str) -> Result<usize> {
    let wanted = key.to_lowercase();
    columns
        .iter()
        .position(|c| c.to_lowercase() == wanted)
        .ok_or_else(|| {
            RecFileError::SchemaMismatch(format!(
                "join key '{}' not found in columns [{}]",
                key,
                columns.join(", ")
            ))
        })
}

fn key_of(row: &Row, index: usize) -> Option<&str> {
    row.get(index).and_then(|v| v.as_deref())
}

/// Cross product of one equal-key run, emitted lazily
struct Group {
    left: Vec<Row>,
    right: Vec<Row>,
    i: usize,
    j: usize,
}

impl Group {
    fn next_pair(&mut self) -> Option<Row> {
        if self.i >= self.left.len() {
            return None;
        }

        let mut joined = self.left[self.i].clone();
        joined.extend(self.right[self.j].iter().cloned());

        self.j += 1;
        if self.j >= self.right.len() {
            self.j = 0;
            self.i += 1;
        }
        Some(joined)
    }
}

/// Streaming merge join; yields left columns followed by right columns
pub struct SortMergeJoin<L, R>
where
    L: Iterator<Item = Result<Row>>,
    R: Iterator<Item = Result<Row>>,
{
    left: L,
    right: R,
    left_key: usize,
    right_key: usize,
    /// Current row of each cursor, `None` once exhausted
    current_left: Option<Row>,
    current_right: Option<Row>,
    group: Option<Group>,
    started: bool,
    finished: bool,
}

impl<L, R> SortMergeJoin<L, R>
where
    L: Iterator<Item = Result<Row>>,
    R: Iterator<Item = Result<Row>>,
{
    pub fn new(left: L, left_key: usize, right: R, right_key: usize) -> Self {
        Self {
            left,
            right,
            left_key,
            right_key,
            current_left: None,
            current_right: None,
            group: None,
            started: false,
            finished: false,
        }
    }

    /// Move both cursors to the next run of equal keys and buffer it.
    ///
    /// Returns false once either side is exhausted.
    fn next_group(&mut self) -> Result<bool> {
        if !self.started {
            self.current_left = self.left.next().transpose()?;
            self.current_right = self.right.next().transpose()?;
            self.started = true;
        }

        loop {
            let (Some(l), Some(r)) = (&self.current_left, &self.current_right) else {
                return Ok(false);
            };

            // Nulls never match
            let Some(left_key) = key_of(l, self.left_key) else {
                self.current_left = self.left.next().transpose()?;
                continue;
            };
            let Some(right_key) = key_of(r, self.right_key) else {
                self.current_right = self.right.next().transpose()?;
                continue;
            };

            match left_key.cmp(right_key) {
                Ordering::Less => self.current_left = self.left.next().transpose()?,
                Ordering::Greater => self.current_right = self.right.next().transpose()?,
                Ordering::Equal => {
                    let key = left_key.to_string();
                    let left = take_run(&mut self.current_left, &mut self.left, self.left_key, &key)?;
                    let right =
                        take_run(&mut self.current_right, &mut self.right, self.right_key, &key)?;

                    self.group = Some(Group {
                        left,
                        right,
                        i: 0,
                        j: 0,
                    });
                    return Ok(true);
                }
            }
        }
    }
}

/// Drain every consecutive row whose key equals `key`, leaving the cursor
/// on the first row past the run
fn take_run<I>(cursor: &mut Option<Row>, input: &mut I, index: usize, key: &str) -> Result<Vec<Row>>
where
    I: Iterator<Item = Result<Row>>,
{
    let mut run = Vec::new();
    while cursor.as_ref().is_some_and(|row| key_of(row, index) == Some(key)) {
        if let Some(row) = cursor.take() {
            run.push(row);
        }
        *cursor = input.next().transpose()?;
    }
    Ok(run)
}

impl<L, R> Iterator for SortMergeJoin<L, R>
where
    L: Iterator<Item = Result<Row>>,
    R: Iterator<Item = Result<Row>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(row) = self.group.as_mut().and_then(Group::next_pair) {
                return Some(Ok(row));
            }
            self.group = None;

            if self.finished {
                return None;
            }

            match self.next_group() {
                Ok(true) => continue,
                Ok(false) => {
                    self.finished = true;
                    return None;
                }
                Err(e) => {
                    self.finished = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
