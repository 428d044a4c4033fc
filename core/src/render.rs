use core::fmt;

use crate::*;

/// Text projection of a [`KnowledgeGrid`], one board row per line.
///
/// Each cell takes three columns; the highlighted cell, if any, is drawn in brackets.
#[derive(Copy, Clone, Debug)]
pub struct GridView<'a> {
    grid: &'a KnowledgeGrid,
    highlight: Option<Coord2>,
}

impl<'a> GridView<'a> {
    pub fn new(grid: &'a KnowledgeGrid) -> Self {
        Self {
            grid,
            highlight: None,
        }
    }

    pub fn with_highlight(self, highlight: Option<Coord2>) -> Self {
        Self { highlight, ..self }
    }
}

impl fmt::Display for GridView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (width, height) = self.grid.size();
        let rule_len = usize::from(width) * 3;

        write_rule(f, rule_len)?;
        for y in 0..height {
            for x in 0..width {
                let symbol = self.grid.cell_at((x, y)).as_char();
                if self.highlight == Some((x, y)) {
                    write!(f, "[{symbol}]")?;
                } else {
                    write!(f, " {symbol} ")?;
                }
            }
            writeln!(f)?;
        }
        write_rule(f, rule_len)
    }
}

fn write_rule(f: &mut fmt::Formatter<'_>, len: usize) -> fmt::Result {
    for _ in 0..len {
        f.write_str("-")?;
    }
    writeln!(f)
}
