use std::borrow::Cow;
use std::sync::Arc;

/// One value as delivered by a file parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
}

impl Cell {
    pub fn text(s: &str) -> Self {
        if s.trim().is_empty() {
            Cell::Empty
        } else {
            Cell::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }

    /// The cell rendered as text, trimmed. Numbers use their shortest form.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Cell::Empty => Cow::Borrowed(""),
            Cell::Text(s) => Cow::Borrowed(s.trim()),
            Cell::Number(n) => Cow::Owned(n.to_string()),
        }
    }
}

/// An ordered row with the header names of the file it came from.
///
/// Fields are reachable both by position and by header name; positional
/// access is what the bill-split format relies on.
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    headers: Arc<[String]>,
    cells: Vec<Cell>,
}

impl RowRecord {
    pub fn new(headers: Arc<[String]>, cells: Vec<Cell>) -> Self {
        RowRecord { headers, cells }
    }

    pub fn from_pairs<S: Into<String>>(pairs: impl IntoIterator<Item = (S, Cell)>) -> Self {
        let (headers, cells): (Vec<String>, Vec<Cell>) =
            pairs.into_iter().map(|(h, c)| (h.into(), c)).unzip();
        RowRecord {
            headers: headers.into(),
            cells,
        }
    }

    /// Number of fields, counting header columns the row left blank.
    pub fn len(&self) -> usize {
        self.cells.len().max(self.headers.len())
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Cell::is_empty)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn get(&self, index: usize) -> Option<&Cell> {
        self.cells.get(index)
    }

    pub fn get_named(&self, name: &str) -> Option<&Cell> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .and_then(|i| self.cells.get(i))
    }

    /// First of `names` present with a non-empty value.
    pub fn get_any(&self, names: &[&str]) -> Option<&Cell> {
        names
            .iter()
            .filter_map(|n| self.get_named(n))
            .find(|c| !c.is_empty())
    }
}
