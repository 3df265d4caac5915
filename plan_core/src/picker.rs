use crate::config::{Catalog, ExerciseTemplate};
use crate::grid::CellPos;

/// Indices of templates whose name contains `query`, ignoring case.
/// An empty query matches everything.
pub fn filter_templates(catalog: &Catalog, query: &str) -> Vec<usize> {
    let needle = query.trim().to_lowercase();
    catalog
        .templates()
        .iter()
        .enumerate()
        .filter(|(_, t)| t.name.to_lowercase().contains(&needle))
        .map(|(i, _)| i)
        .collect()
}

/// Search dropdown for the exercise column.
///
/// The picker is anchored to the exercise cell of the selected row while
/// the selection sits there, and is only visible while that cell is being
/// edited. Nothing is highlighted until the user moves into the list, so
/// Enter on a typed name commits the text as-is.
#[derive(Debug, Clone, Default)]
pub struct ItemPicker {
    anchor: Option<CellPos>,
    visible: bool,
    query: String,
    matches: Vec<usize>,
    highlighted: Option<usize>,
}

impl ItemPicker {
    pub fn anchor(&self) -> Option<CellPos> {
        self.anchor
    }

    /// Re-anchor after a selection change. Moving to another anchor, or
    /// to none, closes the dropdown.
    pub fn anchor_to(&mut self, anchor: Option<CellPos>) {
        if self.anchor != anchor {
            self.close();
            self.anchor = anchor;
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible && self.anchor.is_some()
    }

    /// Show the dropdown pre-filtered by `query`; needs an anchor
    pub fn open(&mut self, query: &str, catalog: &Catalog) -> bool {
        if self.anchor.is_none() {
            return false;
        }
        self.visible = true;
        self.highlighted = None;
        self.set_query(query, catalog);
        true
    }

    pub fn set_query(&mut self, query: &str, catalog: &Catalog) {
        if !self.visible {
            return;
        }
        self.query = query.to_string();
        self.matches = filter_templates(catalog, query);
        if self.highlighted.is_some_and(|h| h >= self.matches.len()) {
            self.highlighted = self.matches.len().checked_sub(1);
        }
    }

    /// Hide and discard the search; the anchor stays
    pub fn close(&mut self) {
        self.visible = false;
        self.query.clear();
        self.matches.clear();
        self.highlighted = None;
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn match_count(&self) -> usize {
        self.matches.len()
    }

    pub fn matches<'a>(&'a self, catalog: &'a Catalog) -> impl Iterator<Item = &'a ExerciseTemplate> {
        self.matches
            .iter()
            .filter_map(|&i| catalog.templates().get(i))
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn highlight_next(&mut self) {
        if self.matches.is_empty() {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(h) => (h + 1).min(self.matches.len() - 1),
        });
    }

    /// Moving up from the first entry returns to the typed text
    pub fn highlight_prev(&mut self) {
        self.highlighted = match self.highlighted {
            None | Some(0) => None,
            Some(h) => Some(h - 1),
        };
    }

    pub fn highlighted_template<'a>(&self, catalog: &'a Catalog) -> Option<&'a ExerciseTemplate> {
        let index = *self.matches.get(self.highlighted?)?;
        catalog.templates().get(index)
    }
}
