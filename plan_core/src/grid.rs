use crate::config::{ExerciseTemplate, GridSettings};
use crate::draft::DraftBuffer;
use crate::types::ExerciseSet;
use std::ops::Range;

/// Shown in the metric columns of an exercise row
pub const ITEM_METRIC_PLACEHOLDER: &str = "-";

/// Fixed column schema of the plan grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Exercise,
    Sets,
    Reps,
    Weight,
    Rest,
    Notes,
}

impl Column {
    pub const COUNT: usize = 6;

    pub const ALL: [Column; Column::COUNT] = [
        Column::Exercise,
        Column::Sets,
        Column::Reps,
        Column::Weight,
        Column::Rest,
        Column::Notes,
    ];

    pub fn index(&self) -> usize {
        match self {
            Column::Exercise => 0,
            Column::Sets => 1,
            Column::Reps => 2,
            Column::Weight => 3,
            Column::Rest => 4,
            Column::Notes => 5,
        }
    }

    pub fn from_index(index: usize) -> Option<Column> {
        Self::ALL.get(index).copied()
    }

    pub fn title(&self) -> &'static str {
        match self {
            Column::Exercise => "Exercise",
            Column::Sets => "Sets",
            Column::Reps => "Reps",
            Column::Weight => "Weight",
            Column::Rest => "Rest",
            Column::Notes => "Notes",
        }
    }

    pub fn value_kind(&self) -> ValueKind {
        match self {
            Column::Exercise | Column::Notes => ValueKind::Text,
            Column::Sets | Column::Reps | Column::Rest => ValueKind::Integer,
            Column::Weight => ValueKind::Decimal,
        }
    }
}

/// What a column expects to hold. Used for display hints only; flushing
/// coerces malformed numbers instead of rejecting them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Text,
    Integer,
    Decimal,
}

impl ValueKind {
    /// Blank counts as well formed for every kind
    pub fn accepts(&self, s: &str) -> bool {
        let s = s.trim();
        match self {
            ValueKind::Text => true,
            _ if s.is_empty() => true,
            ValueKind::Integer => s.parse::<u64>().is_ok(),
            ValueKind::Decimal => s.parse::<f64>().is_ok_and(|v| v.is_finite()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RowId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellId(pub u64);

/// Hands out row and cell ids from one sequence, unique within a grid
#[derive(Debug, Clone)]
pub struct IdAllocator {
    next: u64,
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator { next: 1 }
    }
}

impl IdAllocator {
    pub fn starting_at(next: u64) -> Self {
        IdAllocator { next }
    }

    fn bump(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn next_row(&mut self) -> RowId {
        RowId(self.bump())
    }

    pub fn next_cell(&mut self) -> CellId {
        CellId(self.bump())
    }
}

/// Grid coordinates, both zero based
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellPos {
    pub row: usize,
    pub col: usize,
}

impl CellPos {
    pub fn new(row: usize, col: usize) -> Self {
        CellPos { row, col }
    }

    pub fn column(&self) -> Option<Column> {
        Column::from_index(self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    /// Exercise row, linked to the exercise id
    Item { item_ref: String },
    /// One set of the exercise above it; `ordinal` is 1 based
    SubItem { item_ref: String, ordinal: usize },
    /// Padding with no domain linkage
    Empty,
}

impl RowKind {
    pub fn item_ref(&self) -> Option<&str> {
        match self {
            RowKind::Item { item_ref } | RowKind::SubItem { item_ref, .. } => Some(item_ref),
            RowKind::Empty => None,
        }
    }

    pub fn ordinal(&self) -> Option<usize> {
        match self {
            RowKind::SubItem { ordinal, .. } => Some(*ordinal),
            _ => None,
        }
    }

    pub fn is_sub_item(&self) -> bool {
        matches!(self, RowKind::SubItem { .. })
    }
}

/// Edit state of a single cell. The draft only exists while editing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CellState {
    #[default]
    Viewing,
    Editing(DraftBuffer),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub id: CellId,
    pub value: String,
    pub state: CellState,
}

impl Cell {
    fn new(id: CellId, value: impl Into<String>) -> Self {
        Cell {
            id,
            value: value.into(),
            state: CellState::Viewing,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self.state, CellState::Editing(_))
    }

    pub fn draft(&self) -> Option<&DraftBuffer> {
        match &self.state {
            CellState::Editing(draft) => Some(draft),
            CellState::Viewing => None,
        }
    }

    /// The uncommitted value, if the cell is being edited
    pub fn temp_value(&self) -> Option<&str> {
        self.draft().map(|d| d.value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub id: RowId,
    pub kind: RowKind,
    pub cells: Vec<Cell>,
}

impl Row {
    fn with_values(ids: &mut IdAllocator, kind: RowKind, values: [String; Column::COUNT]) -> Self {
        let id = ids.next_row();
        let cells = values
            .into_iter()
            .map(|v| Cell::new(ids.next_cell(), v))
            .collect();
        Row { id, kind, cells }
    }

    pub fn item(
        ids: &mut IdAllocator,
        item_ref: impl Into<String>,
        name: impl Into<String>,
        set_count: usize,
        notes: impl Into<String>,
    ) -> Self {
        Self::with_values(
            ids,
            RowKind::Item {
                item_ref: item_ref.into(),
            },
            [
                name.into(),
                set_count.to_string(),
                ITEM_METRIC_PLACEHOLDER.to_string(),
                ITEM_METRIC_PLACEHOLDER.to_string(),
                ITEM_METRIC_PLACEHOLDER.to_string(),
                notes.into(),
            ],
        )
    }

    /// A set row; `metrics` holds the Reps, Weight and Rest texts
    pub fn sub_item(
        ids: &mut IdAllocator,
        item_ref: impl Into<String>,
        ordinal: usize,
        metrics: [String; 3],
    ) -> Self {
        let [reps, weight, rest] = metrics;
        Self::with_values(
            ids,
            RowKind::SubItem {
                item_ref: item_ref.into(),
                ordinal,
            },
            [
                sub_item_label(ordinal),
                String::new(),
                reps,
                weight,
                rest,
                String::new(),
            ],
        )
    }

    pub fn empty(ids: &mut IdAllocator) -> Self {
        Self::with_values(ids, RowKind::Empty, Default::default())
    }

    pub fn cell(&self, col: Column) -> &Cell {
        &self.cells[col.index()]
    }

    pub fn value(&self, col: Column) -> &str {
        &self.cell(col).value
    }

    fn is_blank_padding(&self) -> bool {
        self.kind == RowKind::Empty
            && self
                .cells
                .iter()
                .all(|c| c.value.is_empty() && !c.is_editing())
    }
}

pub fn sub_item_label(ordinal: usize) -> String {
    format!("Set {ordinal}")
}

/// Texts shown in the Reps, Weight and Rest columns for a set
pub fn set_metrics(set: &ExerciseSet) -> [String; 3] {
    [
        set.reps.to_string(),
        set.weight.to_string(),
        set.rest.to_string(),
    ]
}

/// Whether a cell of a row of this kind may be changed by the user.
/// Name, Sets and Notes of a set row are derived and read only.
pub fn can_edit(kind: &RowKind, col: usize) -> bool {
    let Some(column) = Column::from_index(col) else {
        return false;
    };
    match kind {
        RowKind::SubItem { .. } => {
            !matches!(column, Column::Exercise | Column::Sets | Column::Notes)
        }
        RowKind::Item { .. } | RowKind::Empty => true,
    }
}

/// Flat row/cell matrix for one day of the plan.
///
/// Every mutation checks [`can_edit`] first and is a no-op (returning
/// `false`) when the cell is read only. At most one cell is in the
/// editing state; `editing` always points at it.
#[derive(Debug, Clone)]
pub struct GridModel {
    rows: Vec<Row>,
    settings: GridSettings,
    editing: Option<CellPos>,
    ids: IdAllocator,
}

impl GridModel {
    pub fn new(rows: Vec<Row>, settings: GridSettings) -> Self {
        let max_id = rows
            .iter()
            .flat_map(|r| std::iter::once(r.id.0).chain(r.cells.iter().map(|c| c.id.0)))
            .max()
            .unwrap_or(0);
        let editing = rows.iter().enumerate().find_map(|(r, row)| {
            row.cells
                .iter()
                .position(|c| c.is_editing())
                .map(|c| CellPos::new(r, c))
        });

        let mut model = GridModel {
            rows,
            settings,
            editing,
            ids: IdAllocator::starting_at(max_id + 1),
        };
        model.normalize_padding();
        model
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        Column::COUNT
    }

    pub fn settings(&self) -> &GridSettings {
        &self.settings
    }

    pub fn contains(&self, pos: CellPos) -> bool {
        pos.row < self.rows.len() && pos.col < Column::COUNT
    }

    pub fn cell(&self, pos: CellPos) -> Option<&Cell> {
        self.rows.get(pos.row).and_then(|r| r.cells.get(pos.col))
    }

    fn cell_mut(&mut self, pos: CellPos) -> Option<&mut Cell> {
        self.rows.get_mut(pos.row).and_then(|r| r.cells.get_mut(pos.col))
    }

    /// Committed value of a cell
    pub fn value(&self, pos: CellPos) -> Option<&str> {
        self.cell(pos).map(|c| c.value.as_str())
    }

    pub fn can_edit(&self, pos: CellPos) -> bool {
        self.rows
            .get(pos.row)
            .is_some_and(|row| can_edit(&row.kind, pos.col))
    }

    /// The cell currently in the editing state
    pub fn editing(&self) -> Option<CellPos> {
        self.editing
    }

    pub fn editing_count(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|r| r.cells.iter())
            .filter(|c| c.is_editing())
            .count()
    }

    pub fn draft(&self) -> Option<&DraftBuffer> {
        self.editing.and_then(|pos| self.cell(pos)).and_then(Cell::draft)
    }

    pub fn draft_mut(&mut self) -> Option<&mut DraftBuffer> {
        let pos = self.editing?;
        match &mut self.cell_mut(pos)?.state {
            CellState::Editing(draft) => Some(draft),
            CellState::Viewing => None,
        }
    }

    /// Put a cell into the editing state, seeding the draft with its value.
    /// Any other editing cell is forced back to viewing without committing.
    pub fn begin_edit(&mut self, pos: CellPos) -> bool {
        if !self.can_edit(pos) {
            return false;
        }
        if self.editing == Some(pos) {
            return true;
        }

        for row in &mut self.rows {
            for cell in &mut row.cells {
                cell.state = CellState::Viewing;
            }
        }

        let Some(cell) = self.cell_mut(pos) else {
            return false;
        };
        cell.state = CellState::Editing(DraftBuffer::new(cell.value.clone()));
        self.editing = Some(pos);
        debug_assert_eq!(self.editing_count(), 1);
        log::debug!("editing cell {:?} at {:?}", cell_id_of(self, pos), pos);
        true
    }

    /// Move the draft of the editing cell into its value
    pub fn commit_edit(&mut self) -> Option<CellPos> {
        let pos = self.editing.take()?;
        let cell = self.cell_mut(pos)?;
        if let CellState::Editing(draft) = std::mem::take(&mut cell.state) {
            cell.value = draft.into_value();
        }
        log::debug!("committed {:?} = {:?}", pos, cell.value);
        self.after_commit(pos);
        Some(pos)
    }

    /// Set a cell's value to the empty string
    pub fn clear_cell(&mut self, pos: CellPos) -> bool {
        self.write_cell(pos, "")
    }

    /// Commit text straight into a cell's value, skipping the draft stage
    pub fn write_cell(&mut self, pos: CellPos, text: &str) -> bool {
        if !self.can_edit(pos) {
            return false;
        }
        let Some(cell) = self.cell_mut(pos) else {
            return false;
        };
        cell.value = text.to_string();
        self.after_commit(pos);
        true
    }

    /// A committed Sets value on an exercise row regenerates its set rows
    /// to match; a count that does not parse reverts to the actual number
    /// of sets.
    fn after_commit(&mut self, pos: CellPos) {
        let is_item_row = matches!(self.rows[pos.row].kind, RowKind::Item { .. });
        if !is_item_row || pos.column() != Some(Column::Sets) {
            return;
        }

        let typed = self.rows[pos.row].value(Column::Sets).trim().to_string();
        let actual = self.sub_item_range(pos.row).len();
        match typed.parse::<usize>() {
            Ok(count) if count != actual => {
                self.regenerate_sets(pos.row, count);
            }
            Ok(_) => {
                self.rows[pos.row].cells[Column::Sets.index()].value = actual.to_string();
            }
            Err(_) => {
                log::debug!("ignoring set count {typed:?}, keeping {actual}");
                self.rows[pos.row].cells[Column::Sets.index()].value = actual.to_string();
            }
        }
    }

    /// Current index of the row with this id
    pub fn row_index_of(&self, id: RowId) -> Option<usize> {
        self.rows.iter().position(|r| r.id == id)
    }

    /// Rows holding the sets of the exercise at `item_row`
    pub fn sub_item_range(&self, item_row: usize) -> Range<usize> {
        let start = item_row + 1;
        let Some(item_ref) = self.rows.get(item_row).and_then(|r| match &r.kind {
            RowKind::Item { item_ref } => Some(item_ref.as_str()),
            _ => None,
        }) else {
            return start..start;
        };

        let len = self.rows[start.min(self.rows.len())..]
            .iter()
            .take_while(|r| r.kind.is_sub_item() && r.kind.item_ref() == Some(item_ref))
            .count();
        start..start + len
    }

    /// Grow or shrink the set rows of an exercise to `count`. Growth stops
    /// at `max_sets`, but sets that already exist are never dropped by the
    /// cap. New sets repeat the metrics of the last existing set (zeros
    /// when there is none); shrinking drops trailing sets.
    /// Returns the resulting number of sets, or `None` for non-exercise rows.
    pub fn regenerate_sets(&mut self, item_row: usize, count: usize) -> Option<usize> {
        let item_ref = match &self.rows.get(item_row)?.kind {
            RowKind::Item { item_ref } => item_ref.clone(),
            _ => return None,
        };
        if self.editing.is_some_and(|p| p.row > item_row) {
            self.commit_edit();
        }

        let range = self.sub_item_range(item_row);
        let current = range.len();
        let target = if count > current {
            count.min(self.settings.max_sets).max(current)
        } else {
            count
        };

        if target > current {
            let seed = match range.clone().last() {
                Some(last) => {
                    let row = &self.rows[last];
                    [
                        row.value(Column::Reps).to_string(),
                        row.value(Column::Weight).to_string(),
                        row.value(Column::Rest).to_string(),
                    ]
                }
                None => set_metrics(&ExerciseSet::default()),
            };
            let new_rows: Vec<Row> = (current + 1..=target)
                .map(|ordinal| Row::sub_item(&mut self.ids, item_ref.clone(), ordinal, seed.clone()))
                .collect();
            self.rows.splice(range.end..range.end, new_rows);
        } else if target < current {
            self.rows.drain(range.start + target..range.end);
        }

        self.rows[item_row].cells[Column::Sets.index()].value = target.to_string();
        log::debug!("exercise {item_ref} now has {target} sets (was {current})");
        self.normalize_padding();
        Some(target)
    }

    /// Turn a row into the given exercise: name it, replace its sets with
    /// the template's default sets. Empty rows become new exercises; set
    /// rows are refused. Existing notes are kept, blank notes take the
    /// template's.
    pub fn apply_template(&mut self, row_index: usize, template: &ExerciseTemplate) -> bool {
        let Some(row) = self.rows.get(row_index) else {
            return false;
        };
        let item_ref = match &row.kind {
            RowKind::Item { item_ref } => item_ref.clone(),
            RowKind::Empty => uuid::Uuid::new_v4().to_string(),
            RowKind::SubItem { .. } => return false,
        };
        if self.editing.is_some_and(|p| p.row >= row_index) {
            self.commit_edit();
        }

        let existing = self.sub_item_range(row_index);
        self.rows.drain(existing);

        let row = &mut self.rows[row_index];
        row.kind = RowKind::Item {
            item_ref: item_ref.clone(),
        };
        let notes = if row.value(Column::Notes).trim().is_empty() {
            template.notes.clone()
        } else {
            row.value(Column::Notes).to_string()
        };
        let values = [
            template.name.clone(),
            template.default_sets.len().to_string(),
            ITEM_METRIC_PLACEHOLDER.to_string(),
            ITEM_METRIC_PLACEHOLDER.to_string(),
            ITEM_METRIC_PLACEHOLDER.to_string(),
            notes,
        ];
        for (cell, value) in row.cells.iter_mut().zip(values) {
            cell.value = value;
        }

        let new_rows: Vec<Row> = template
            .default_sets
            .iter()
            .enumerate()
            .map(|(i, set)| Row::sub_item(&mut self.ids, item_ref.clone(), i + 1, set_metrics(set)))
            .collect();
        self.rows.splice(row_index + 1..row_index + 1, new_rows);

        log::debug!(
            "applied template {} to row {row_index} ({} sets)",
            template.id,
            template.default_sets.len()
        );
        self.normalize_padding();
        true
    }

    /// Drop surplus blank padding at the bottom, then pad up to `min_rows`
    fn normalize_padding(&mut self) {
        while self.rows.len() > self.settings.min_rows
            && self.rows.last().is_some_and(Row::is_blank_padding)
        {
            self.rows.pop();
        }
        while self.rows.len() < self.settings.min_rows {
            let row = Row::empty(&mut self.ids);
            self.rows.push(row);
        }
    }
}

fn cell_id_of(model: &GridModel, pos: CellPos) -> Option<CellId> {
    model.cell(pos).map(|c| c.id)
}
