use crate::adapter::build_rows;
use crate::clipboard::{self, ClipboardProvider};
use crate::config::{Catalog, ExerciseTemplate, GridSettings};
use crate::draft::DraftBuffer;
use crate::flush::flush;
use crate::grid::{CellPos, Column, GridModel};
use crate::keys::{GridKey, KeyBus, KeySubscription};
use crate::picker::ItemPicker;
use crate::types::{Day, WeeklyPlan};
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Interactive state of the plan grid for one day: the row model, the
/// single selected cell, the exercise picker and the clipboard bridge.
///
/// Every operation is synchronous and total. Read-only cells, moves past
/// an edge and clipboard failures all leave the grid unchanged and report
/// `false`.
pub struct GridEditor {
    day: Day,
    model: GridModel,
    selection: Option<CellPos>,
    picker: ItemPicker,
    catalog: Rc<Catalog>,
    clipboard: Box<dyn ClipboardProvider>,
    show_help: bool,
}

impl GridEditor {
    pub fn new(
        plan: &WeeklyPlan,
        day: Day,
        settings: GridSettings,
        catalog: Rc<Catalog>,
        clipboard: Box<dyn ClipboardProvider>,
    ) -> Self {
        let model = GridModel::new(build_rows(plan, day, &settings), settings);
        GridEditor {
            day,
            model,
            selection: None,
            picker: ItemPicker::default(),
            catalog,
            clipboard,
            show_help: false,
        }
    }

    /// Throw the rows away and build them again from `plan`
    pub fn rebuild(&mut self, plan: &WeeklyPlan, day: Day) {
        let settings = *self.model.settings();
        self.model = GridModel::new(build_rows(plan, day, &settings), settings);
        self.day = day;
        self.selection = None;
        self.picker = ItemPicker::default();
    }

    pub fn day(&self) -> Day {
        self.day
    }

    pub fn model(&self) -> &GridModel {
        &self.model
    }

    pub fn selection(&self) -> Option<CellPos> {
        self.selection
    }

    pub fn picker(&self) -> &ItemPicker {
        &self.picker
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn is_editing(&self) -> bool {
        self.model.editing().is_some()
    }

    pub fn clipboard_name(&self) -> String {
        self.clipboard.name().into_owned()
    }

    pub fn handle_key(&mut self, key: GridKey) -> bool {
        match key {
            GridKey::ToggleHelp => {
                self.show_help = !self.show_help;
                true
            }
            GridKey::Copy => self.copy_selected(),
            GridKey::Paste => self.paste_into_selected(),
            GridKey::Blur => self.blur(),
            _ if self.is_editing() => self.handle_editing_key(key),
            _ => self.handle_viewing_key(key),
        }
    }

    fn handle_viewing_key(&mut self, key: GridKey) -> bool {
        match key {
            GridKey::Up => self.move_selection(Direction::Up),
            GridKey::Down => self.move_selection(Direction::Down),
            GridKey::Left => self.move_selection(Direction::Left),
            GridKey::Right => self.move_selection(Direction::Right),
            GridKey::Enter | GridKey::F2 => self.begin_edit(),
            GridKey::Delete => self.clear_selected(),
            GridKey::Escape => self.escape(),
            _ => false,
        }
    }

    fn handle_editing_key(&mut self, key: GridKey) -> bool {
        let picker_open = self.picker.is_visible();
        match key {
            GridKey::Char(c) => self.edit_draft(|d| d.insert(c)),
            GridKey::Backspace => self.edit_draft(DraftBuffer::backspace),
            GridKey::Delete => self.edit_draft(DraftBuffer::delete),
            GridKey::Left => self.edit_draft(DraftBuffer::move_left),
            GridKey::Right => self.edit_draft(DraftBuffer::move_right),
            GridKey::Home => self.edit_draft(DraftBuffer::move_home),
            GridKey::End => self.edit_draft(DraftBuffer::move_end),
            GridKey::Down if picker_open && self.picker.match_count() > 0 => {
                self.picker.highlight_next();
                true
            }
            GridKey::Up if picker_open && self.picker.highlighted().is_some() => {
                self.picker.highlight_prev();
                true
            }
            GridKey::Up => {
                self.commit();
                self.move_selection(Direction::Up);
                true
            }
            GridKey::Down => {
                self.commit();
                self.move_selection(Direction::Down);
                true
            }
            GridKey::Enter if self.picker.highlighted().is_some() => self.pick_highlighted(),
            GridKey::Enter | GridKey::F2 => self.commit(),
            GridKey::Escape => self.escape(),
            _ => false,
        }
    }

    /// Select a cell. An edit in progress elsewhere is committed first;
    /// if that commit adds or removes set rows, the target follows its
    /// row. A target row removed by the commit leaves the selection on
    /// the committed cell.
    pub fn select(&mut self, pos: CellPos) -> bool {
        if !self.model.contains(pos) {
            return false;
        }
        let mut pos = pos;
        if let Some(editing) = self.model.editing().filter(|&e| e != pos) {
            let target = self.model.row(pos.row).map(|r| r.id);
            self.model.commit_edit();
            self.picker.close();

            match target.and_then(|id| self.model.row_index_of(id)) {
                Some(row) => pos.row = row,
                None => {
                    log::debug!("row under {pos:?} was removed by the commit");
                    self.selection = Some(editing);
                    self.after_structure_change();
                    return false;
                }
            }
        }
        self.selection = Some(pos);
        self.after_structure_change();
        true
    }

    /// Move one cell, clamped at the grid edges. With nothing selected
    /// yet, any direction selects the top-left cell.
    pub fn move_selection(&mut self, direction: Direction) -> bool {
        let rows = self.model.row_count();
        if rows == 0 {
            return false;
        }
        let Some(current) = self.selection else {
            return self.select(CellPos::new(0, 0));
        };

        let last_col = self.model.column_count() - 1;
        let next = match direction {
            Direction::Up => CellPos::new(current.row.saturating_sub(1), current.col),
            Direction::Down => CellPos::new((current.row + 1).min(rows - 1), current.col),
            Direction::Left => CellPos::new(current.row, current.col.saturating_sub(1)),
            Direction::Right => CellPos::new(current.row, (current.col + 1).min(last_col)),
        };
        if next == current {
            return false;
        }
        self.select(next)
    }

    /// Enter editing on the selected cell if it is editable. On the
    /// exercise column this also opens the picker, searching for the
    /// current name.
    pub fn begin_edit(&mut self) -> bool {
        let Some(pos) = self.selection else {
            return false;
        };
        if self.model.editing() == Some(pos) {
            return true;
        }
        if !self.model.begin_edit(pos) {
            return false;
        }
        if self.picker.anchor() == Some(pos) {
            let query = self.model.value(pos).unwrap_or_default().to_string();
            self.picker.open(&query, &self.catalog);
        }
        true
    }

    /// Select a cell and start editing it
    pub fn click_to_edit(&mut self, pos: CellPos) -> bool {
        self.select(pos) && self.begin_edit()
    }

    fn edit_draft(&mut self, f: impl FnOnce(&mut DraftBuffer)) -> bool {
        let Some(draft) = self.model.draft_mut() else {
            return false;
        };
        f(draft);
        let query = draft.value().to_string();
        self.picker.set_query(&query, &self.catalog);
        true
    }

    /// Commit the editing cell's draft and close the picker
    pub fn commit(&mut self) -> bool {
        let committed = self.model.commit_edit().is_some();
        self.picker.close();
        self.after_structure_change();
        committed
    }

    /// Focus left the grid: commit like Enter would
    pub fn blur(&mut self) -> bool {
        let was_open = self.picker.is_visible();
        self.commit() || was_open
    }

    /// Close the picker without touching the cell. Editing itself has no
    /// cancel; the draft stays until committed.
    pub fn escape(&mut self) -> bool {
        if self.picker.is_visible() {
            self.picker.close();
            return true;
        }
        false
    }

    /// Delete key: set the selected cell to the empty string
    pub fn clear_selected(&mut self) -> bool {
        let Some(pos) = self.selection else {
            return false;
        };
        let cleared = self.model.clear_cell(pos);
        self.after_structure_change();
        cleared
    }

    /// Put the selected cell's committed value on the clipboard
    pub fn copy_selected(&mut self) -> bool {
        let Some(text) = self
            .selection
            .and_then(|pos| self.model.value(pos))
            .map(str::to_string)
        else {
            return false;
        };
        clipboard::write_text(self.clipboard.as_mut(), &text)
    }

    /// Write clipboard text into the selected cell's value directly. While
    /// the cell is being edited the text goes into the draft instead.
    pub fn paste_into_selected(&mut self) -> bool {
        let Some(pos) = self.selection else {
            return false;
        };
        if !self.model.can_edit(pos) {
            return false;
        }
        let Some(text) = clipboard::read_text(self.clipboard.as_mut()) else {
            return false;
        };
        let text = text.trim_end_matches(['\r', '\n']);

        if self.model.editing() == Some(pos) {
            return self.edit_draft(|d| d.insert_str(text));
        }
        let written = self.model.write_cell(pos, text);
        self.after_structure_change();
        written
    }

    pub fn pick_highlighted(&mut self) -> bool {
        let Some(template) = self.picker.highlighted_template(&self.catalog).cloned() else {
            return false;
        };
        self.pick_template(&template)
    }

    /// Pick the `index`-th entry currently listed by the picker
    pub fn pick_match(&mut self, index: usize) -> bool {
        let Some(template) = self.picker.matches(&self.catalog).nth(index).cloned() else {
            return false;
        };
        self.pick_template(&template)
    }

    /// Commit a template into the anchored exercise cell: set the name,
    /// replace the sets with its defaults, close the picker and put the
    /// selection back on the cell.
    pub fn pick_template(&mut self, template: &ExerciseTemplate) -> bool {
        let Some(anchor) = self.picker.anchor() else {
            return false;
        };
        if !self.picker.is_visible() {
            return false;
        }

        self.model.commit_edit();
        let applied = self.model.apply_template(anchor.row, template);
        self.picker.close();
        self.selection = Some(anchor);
        self.after_structure_change();
        applied
    }

    /// Flush the committed grid into a copy of `original`. Drafts are not
    /// included.
    pub fn flush(&self, original: &WeeklyPlan) -> WeeklyPlan {
        flush(self.model.rows(), original, self.day)
    }

    /// Commit any edit in progress, flush, and hand the result to `save`
    pub fn save<R>(&mut self, original: &WeeklyPlan, save: impl FnOnce(WeeklyPlan) -> R) -> R {
        self.commit();
        save(self.flush(original))
    }

    /// Keep the selection inside the grid after rows were added or
    /// removed, and re-anchor the picker to it
    fn after_structure_change(&mut self) {
        let rows = self.model.row_count();
        self.selection = match self.selection {
            _ if rows == 0 => None,
            Some(sel) if sel.row >= rows => Some(CellPos::new(rows - 1, sel.col)),
            other => other,
        };

        let anchor = self.selection.filter(|pos| {
            pos.col == Column::Exercise.index()
                && self
                    .model
                    .row(pos.row)
                    .is_some_and(|row| !row.kind.is_sub_item())
        });
        self.picker.anchor_to(anchor);
        if self.picker.is_visible() && self.model.editing() != anchor {
            self.picker.close();
        }
    }
}

/// A grid editor attached to a [`KeyBus`].
///
/// Mounting registers exactly one key listener; unmounting, or dropping
/// the mount, removes it. The listener holds only a weak handle, so keys
/// dispatched after teardown reach nothing.
pub struct MountedGrid {
    editor: Rc<RefCell<GridEditor>>,
    subscription: KeySubscription,
}

impl MountedGrid {
    pub fn mount(editor: GridEditor, bus: &KeyBus) -> Self {
        let editor = Rc::new(RefCell::new(editor));
        let handle = Rc::downgrade(&editor);
        let subscription = bus.subscribe(move |key| {
            let Some(editor) = handle.upgrade() else {
                return false;
            };
            let Ok(mut editor) = editor.try_borrow_mut() else {
                return false;
            };
            editor.handle_key(key)
        });
        log::debug!("grid mounted with listener {:?}", subscription.id());
        MountedGrid {
            editor,
            subscription,
        }
    }

    pub fn editor(&self) -> Ref<'_, GridEditor> {
        self.editor.borrow()
    }

    pub fn editor_mut(&self) -> RefMut<'_, GridEditor> {
        self.editor.borrow_mut()
    }

    /// Remove the key listener and take the editor back. `None` only if
    /// the editor is still borrowed elsewhere.
    pub fn unmount(self) -> Option<GridEditor> {
        let MountedGrid {
            editor,
            subscription,
        } = self;
        log::debug!("grid unmounted, listener {:?}", subscription.id());
        drop(subscription);
        Rc::try_unwrap(editor).ok().map(RefCell::into_inner)
    }
}
