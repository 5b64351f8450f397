use std::fmt;

use crate::error::GridError;

/// Fixed-shape character grid: `rows` rows of exactly `cols` glyphs each.
///
/// Rows are stored as `Vec<char>` so single cells can be overwritten in place
/// without re-slicing strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlyphGrid {
    cols: usize,
    rows: Vec<Vec<char>>,
}

impl GlyphGrid {
    /// Grid of `rows` rows of `cols` spaces.
    pub fn blank(rows: usize, cols: usize) -> Self {
        Self {
            cols,
            rows: vec![vec![' '; cols]; rows],
        }
    }

    /// Builds a grid from text rows, truncating or space-padding each row to
    /// `cols` and padding missing rows with blanks.
    pub fn from_lines<I>(lines: I, rows: usize, cols: usize) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut normalized = lines
            .into_iter()
            .take(rows)
            .map(|line| normalize_row(line.as_ref(), cols))
            .collect::<Vec<_>>();

        if normalized.len() < rows {
            normalized.resize(rows, vec![' '; cols]);
        }

        Self {
            cols,
            rows: normalized,
        }
    }

    pub(crate) fn from_rows(rows: Vec<Vec<char>>, cols: usize) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == cols));
        Self { cols, rows }
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<char> {
        self.rows.get(row).and_then(|cells| cells.get(col)).copied()
    }

    /// Overwrites one cell. Out-of-range positions are ignored.
    pub fn set(&mut self, row: usize, col: usize, glyph: char) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|cells| cells.get_mut(col)) {
            *cell = glyph;
        }
    }

    pub fn same_shape(&self, other: &GlyphGrid) -> bool {
        self.rows() == other.rows() && self.cols == other.cols
    }

    pub(crate) fn ensure_same_shape(&self, other: &GlyphGrid) -> Result<(), GridError> {
        if self.same_shape(other) {
            return Ok(());
        }
        Err(GridError::ShapeMismatch {
            rows: self.rows(),
            cols: self.cols,
            actual_rows: other.rows(),
            actual_cols: other.cols,
        })
    }

    /// Positions where `self` disagrees with `other`, in row-major order.
    /// Both grids must have the same shape.
    pub fn diff_positions(&self, other: &GlyphGrid) -> Vec<(usize, usize)> {
        self.rows
            .iter()
            .zip(&other.rows)
            .enumerate()
            .flat_map(|(row, (ours, theirs))| {
                ours.iter()
                    .zip(theirs)
                    .enumerate()
                    .filter(|(_, (a, b))| a != b)
                    .map(move |(col, _)| (row, col))
            })
            .collect()
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.rows.iter().map(|row| row.iter().collect())
    }

    /// Rows joined by `\n`, no trailing newline.
    pub fn to_text(&self) -> String {
        let mut value = String::with_capacity(self.rows() * (self.cols + 1));
        for (index, row) in self.rows.iter().enumerate() {
            if index > 0 {
                value.push('\n');
            }
            value.extend(row.iter());
        }
        value
    }
}

impl fmt::Display for GlyphGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn normalize_row(line: &str, cols: usize) -> Vec<char> {
    let mut row = line.chars().take(cols).collect::<Vec<_>>();
    row.resize(cols, ' ');
    row
}
