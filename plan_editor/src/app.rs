use plan_core::clipboard::ClipboardProvider;
use plan_core::grid::{CellPos, Column, RowKind, ITEM_METRIC_PLACEHOLDER};
use plan_core::{Config, Day, GridEditor, GridKey, KeyBus, MountedGrid, WeeklyPlan};
use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState,
        Tabs,
    },
    Frame,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Widths of the fixed grid columns; the last one takes what is left
const COLUMN_WIDTHS: [u16; Column::COUNT] = [24, 5, 6, 8, 6, 20];
const COLUMN_SPACING: u16 = 1;
const PICKER_WIDTH: u16 = 36;
const PICKER_MAX_ROWS: u16 = 8;

pub struct App {
    pub config: Config,
    pub plan_path: PathBuf,
    /// Working copy of the plan; days other than the shown one are kept
    /// here while they are not on screen
    pub plan: WeeklyPlan,
    saved: WeeklyPlan,

    pub bus: KeyBus,
    pub grid: MountedGrid,

    pub message: Option<String>,
    pub show_quit_confirm: bool,
    pub load_error: Option<String>,

    table_state: TableState,
    picker_state: ListState,
    grid_area: Rect,
    /// Where the exercise dropdown was last drawn, if it is open
    picker_area: Option<Rect>,
}

impl App {
    pub fn new(
        config_dir: &Path,
        plan_path: &Path,
        day: Day,
        clipboard: Box<dyn ClipboardProvider>,
    ) -> Self {
        let mut errors = Vec::new();
        let config = match Config::load_from_dir(config_dir) {
            Ok(config) => config,
            Err(e) => {
                log::error!("failed to load config: {e}");
                errors.push(format!("{e}\n{}", e.location_description()));
                Config::default()
            }
        };
        let plan = match WeeklyPlan::load_from_file(plan_path) {
            Ok(plan) => plan,
            Err(e) => {
                log::error!("failed to load plan {}: {e}", plan_path.display());
                errors.push(format!("{}: {e}", plan_path.display()));
                WeeklyPlan::default()
            }
        };
        log::info!(
            "loaded {} templates, plan with {} days",
            config.catalog.len(),
            plan.days.len()
        );

        let bus = KeyBus::new();
        let editor = GridEditor::new(
            &plan,
            day,
            config.grid,
            Rc::new(config.catalog.clone()),
            clipboard,
        );
        let grid = MountedGrid::mount(editor, &bus);

        Self {
            config,
            plan_path: plan_path.to_path_buf(),
            saved: plan.clone(),
            plan,
            bus,
            grid,
            message: None,
            show_quit_confirm: false,
            load_error: (!errors.is_empty()).then(|| errors.join("\n\n")),
            table_state: TableState::default(),
            picker_state: ListState::default(),
            grid_area: Rect::default(),
            picker_area: None,
        }
    }

    pub fn day(&self) -> Day {
        self.grid.editor().day()
    }

    pub fn is_editing(&self) -> bool {
        self.grid.editor().is_editing()
    }

    /// Whether the grid, flushed, differs from what was last loaded or saved
    pub fn is_dirty(&self) -> bool {
        self.grid.editor().flush(&self.plan) != self.saved
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn dispatch(&mut self, key: GridKey) -> bool {
        self.bus.dispatch(key)
    }

    pub fn switch_day(&mut self, day: Day) {
        if day == self.day() {
            return;
        }
        let mut editor = self.grid.editor_mut();
        self.plan = editor.save(&self.plan, |plan| plan);
        editor.rebuild(&self.plan, day);
        log::debug!("switched to {}", day.as_str());
    }

    pub fn next_day(&mut self) {
        self.switch_day(self.day().next());
    }

    pub fn prev_day(&mut self) {
        self.switch_day(self.day().prev());
    }

    pub fn save(&mut self) {
        let path = self.plan_path.clone();
        let (plan, result) = self
            .grid
            .editor_mut()
            .save(&self.plan, |plan| {
                let result = plan.save_to_file(&path);
                (plan, result)
            });

        match result {
            Ok(()) => {
                log::info!("saved plan to {}", path.display());
                self.message = Some(format!("Saved to {}", path.display()));
                self.saved = plan.clone();
            }
            Err(e) => {
                log::error!("failed to save plan to {}: {e}", path.display());
                self.message = Some(format!("Save failed: {e}"));
            }
        }
        self.plan = plan;
    }

    /// Left click. A click on an entry of the open exercise dropdown picks
    /// it. A click on the selected cell starts editing it; a click anywhere
    /// outside the grid takes focus away from it.
    pub fn click(&mut self, x: u16, y: u16) {
        if let Some(area) = self.picker_area.filter(|a| a.contains(Position::new(x, y))) {
            if let Some(index) = list_index_at(area, self.picker_state.offset(), x, y) {
                self.grid.editor_mut().pick_match(index);
            }
            return;
        }

        let offset = self.table_state.offset();
        let Some(pos) = cell_at(self.grid_area, offset, x, y) else {
            self.dispatch(GridKey::Blur);
            return;
        };

        let mut editor = self.grid.editor_mut();
        if !editor.model().contains(pos) {
            drop(editor);
            self.dispatch(GridKey::Blur);
            return;
        }
        if editor.selection() == Some(pos) {
            editor.click_to_edit(pos);
        } else {
            editor.select(pos);
        }
    }

    // Rendering
    pub fn render(&mut self, f: &mut Frame) {
        if let Some(ref error) = self.load_error {
            self.render_load_error(f, error.clone());
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Day tabs
                Constraint::Min(0),    // Grid
                Constraint::Length(3), // Help bar
            ])
            .split(f.area());

        self.render_tabs(f, chunks[0]);
        self.render_grid(f, chunks[1]);
        self.render_help(f, chunks[2]);

        self.render_picker(f);
        if self.grid.editor().show_help() {
            self.render_legend(f);
        }
        if self.show_quit_confirm {
            self.render_quit_confirm(f);
        }
    }

    fn render_load_error(&self, f: &mut Frame, error: String) {
        let area = centered_rect(60, 40, f.area());
        f.render_widget(Clear, area);

        let mut text = vec![
            Line::from(Span::styled(
                "Failed to load",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ];
        text.extend(error.lines().map(|l| Line::from(l.to_string())));
        text.push(Line::from(""));
        text.push(Line::from(Span::styled(
            "Press q to quit",
            Style::default().fg(Color::DarkGray),
        )));

        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
        f.render_widget(paragraph, area);
    }

    fn render_tabs(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<String> = Day::ALL
            .iter()
            .map(|d| format!("{}:{}", d.index() + 1, &d.as_str()[..3]))
            .collect();

        let tabs = Tabs::new(titles)
            .select(self.day().index())
            .style(Style::default())
            .highlight_style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .divider("|")
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Plan Editor "),
            );

        f.render_widget(tabs, area);
    }

    fn render_grid(&mut self, f: &mut Frame, area: Rect) {
        let editor = self.grid.editor();
        let model = editor.model();
        let selection = editor.selection();

        let header = Row::new(
            Column::ALL
                .iter()
                .map(|c| Cell::from(c.title()))
                .collect::<Vec<_>>(),
        )
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = model
            .rows()
            .iter()
            .enumerate()
            .map(|(r, row)| {
                let cells: Vec<Cell> = row
                    .cells
                    .iter()
                    .enumerate()
                    .map(|(c, cell)| {
                        let pos = CellPos::new(r, c);
                        let text = match cell.draft() {
                            Some(draft) => draft.display_with_cursor(),
                            None => cell.value.clone(),
                        };
                        let mut style = base_style(&row.kind, c);
                        if is_malformed(&row.kind, c, &cell.value) {
                            style = style.fg(Color::Red);
                        }
                        if cell.is_editing() {
                            style = Style::default().fg(Color::Black).bg(Color::Cyan);
                        } else if selection == Some(pos) {
                            style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                        }
                        Cell::from(text).style(style)
                    })
                    .collect();
                Row::new(cells)
            })
            .collect();

        let widths = COLUMN_WIDTHS
            .iter()
            .enumerate()
            .map(|(i, &w)| {
                if i + 1 == Column::COUNT {
                    Constraint::Min(w)
                } else {
                    Constraint::Length(w)
                }
            })
            .collect::<Vec<_>>();

        let border_style = if editor.is_editing() {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default()
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(format!(" {} ", editor.day().as_str()));
        self.grid_area = block.inner(area);

        let table = Table::new(rows, widths)
            .header(header)
            .column_spacing(COLUMN_SPACING)
            .block(block);

        self.table_state.select(selection.map(|p| p.row));
        drop(editor);
        f.render_stateful_widget(table, area, &mut self.table_state);
    }

    /// Dropdown under the edited exercise cell, flipped above it when
    /// there is no room below
    fn render_picker(&mut self, f: &mut Frame) {
        self.picker_area = None;
        let editor = self.grid.editor();
        let picker = editor.picker();
        let Some(anchor) = picker.anchor().filter(|_| picker.is_visible()) else {
            return;
        };
        let offset = self.table_state.offset();
        let Some(cell_y) = row_screen_y(self.grid_area, offset, anchor.row) else {
            return;
        };

        let catalog = editor.catalog();
        let items: Vec<ListItem> = picker
            .matches(catalog)
            .map(|t| {
                ListItem::new(Line::from(vec![
                    Span::raw(t.name.clone()),
                    Span::styled(
                        format!(" ({} sets)", t.default_sets.len()),
                        Style::default().fg(Color::DarkGray),
                    ),
                ]))
            })
            .collect();
        let empty = items.is_empty();

        let screen = f.area();
        let height = (items.len() as u16).clamp(1, PICKER_MAX_ROWS) + 2;
        let width = PICKER_WIDTH.min(screen.width.saturating_sub(self.grid_area.x));
        let below = cell_y + 1;
        let y = if below + height <= screen.bottom() {
            below
        } else {
            cell_y.saturating_sub(height)
        };
        let area = Rect::new(self.grid_area.x, y, width, height).intersection(screen);

        self.picker_state.select(picker.highlighted());
        drop(editor);
        self.picker_area = Some(area);

        f.render_widget(Clear, area);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Exercises ");
        if empty {
            let paragraph = Paragraph::new(Span::styled(
                "No matches, Enter keeps the typed name",
                Style::default().fg(Color::DarkGray),
            ))
            .block(block);
            f.render_widget(paragraph, area);
            return;
        }

        let list = List::new(items)
            .block(block)
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        f.render_stateful_widget(list, area, &mut self.picker_state);
    }

    fn render_help(&self, f: &mut Frame, area: Rect) {
        let help_text = if let Some(ref msg) = self.message {
            Span::styled(msg.clone(), Style::default().fg(Color::Yellow))
        } else if self.is_editing() {
            Span::raw("Enter:Commit | Up/Down:Pick | Esc:Close list | Ctrl+V:Paste | Ctrl+S:Save")
        } else {
            Span::raw(
                "Arrows:Move | Enter/F2:Edit | Del:Clear | Ctrl+C/V:Copy/Paste | Tab/1-7:Day | Ctrl+S:Save | ?:Help | q:Quit",
            )
        };

        let dirty_indicator = if self.is_dirty() {
            Span::styled(" [*Modified] ", Style::default().fg(Color::Yellow))
        } else {
            Span::raw("")
        };

        let help = Paragraph::new(Line::from(vec![help_text, dirty_indicator]))
            .block(Block::default().borders(Borders::ALL).title(" Help "));
        f.render_widget(help, area);
    }

    fn render_legend(&self, f: &mut Frame) {
        let area = centered_rect(60, 70, f.area());
        f.render_widget(Clear, area);

        let key = |k: &str, what: &str| {
            Line::from(vec![
                Span::styled(format!("{k:<16}"), Style::default().fg(Color::Cyan)),
                Span::raw(what.to_string()),
            ])
        };
        let section = |title: &str| {
            Line::from(Span::styled(
                title.to_string(),
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
            ))
        };

        let text = vec![
            section("Grid"),
            key("Arrows", "Move the selection"),
            key("Enter / F2", "Edit the selected cell"),
            key("Delete", "Clear the selected cell"),
            key("Ctrl+C", "Copy the cell value"),
            key("Ctrl+V", "Paste into the cell"),
            key("Click", "Select, click again to edit"),
            Line::from(""),
            section("Editing"),
            key("Enter", "Commit the edit"),
            key("Up / Down", "Move in the exercise list"),
            key("Esc", "Close the exercise list"),
            key("Sets column", "Typing a count adds or removes sets"),
            Line::from(""),
            section("Plan"),
            key("Tab / 1-7", "Switch day"),
            key("Ctrl+S", "Save the plan"),
            key("q / Ctrl+Q", "Quit"),
            Line::from(""),
            Line::from(Span::styled(
                format!("Clipboard: {}", self.grid.editor().clipboard_name()),
                Style::default().fg(Color::DarkGray),
            )),
        ];

        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Keys (F1 or ? to close) "),
        );
        f.render_widget(paragraph, area);
    }

    fn render_quit_confirm(&self, f: &mut Frame) {
        let area = centered_rect(40, 20, f.area());
        f.render_widget(Clear, area);

        let text = vec![
            Line::from("You have unsaved changes."),
            Line::from(""),
            Line::from("Quit without saving? (y/n)"),
        ];

        let paragraph = Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow))
                .title(" Confirm Quit "),
        );
        f.render_widget(paragraph, area);
    }
}

fn base_style(kind: &RowKind, col: usize) -> Style {
    match kind {
        RowKind::Item { .. } if col == Column::Exercise.index() => {
            Style::default().add_modifier(Modifier::BOLD)
        }
        RowKind::Item { .. } => Style::default().fg(Color::Gray),
        RowKind::SubItem { .. } if !plan_core::grid::can_edit(kind, col) => {
            Style::default().fg(Color::DarkGray)
        }
        _ => Style::default(),
    }
}

/// Numbers that will be coerced on save are shown in red
fn is_malformed(kind: &RowKind, col: usize, value: &str) -> bool {
    let Some(column) = Column::from_index(col) else {
        return false;
    };
    match kind {
        RowKind::Item { .. } => {
            value != ITEM_METRIC_PLACEHOLDER && !column.value_kind().accepts(value)
        }
        RowKind::SubItem { .. } => !column.value_kind().accepts(value),
        RowKind::Empty => false,
    }
}

/// Screen row of a grid row, if it is scrolled into view
fn row_screen_y(area: Rect, offset: usize, row: usize) -> Option<u16> {
    let visible = row.checked_sub(offset)?;
    let y = area.y as usize + 1 + visible;
    (y < area.bottom() as usize).then_some(y as u16)
}

/// Grid cell under a screen position inside the table area
fn cell_at(area: Rect, offset: usize, x: u16, y: u16) -> Option<CellPos> {
    // first line of the area is the header
    if x < area.x || x >= area.right() || y <= area.y || y >= area.bottom() {
        return None;
    }
    let row = offset + (y - area.y - 1) as usize;

    let dx = x - area.x;
    let mut start = 0;
    let mut col = 0;
    for (i, w) in COLUMN_WIDTHS.iter().enumerate() {
        if dx >= start {
            col = i;
        }
        start += w + COLUMN_SPACING;
    }
    Some(CellPos::new(row, col))
}

/// Entry of a bordered list under a screen position
fn list_index_at(area: Rect, offset: usize, x: u16, y: u16) -> Option<usize> {
    if x <= area.x || x + 1 >= area.right() || y <= area.y || y + 1 >= area.bottom() {
        return None;
    }
    Some(offset + (y - area.y - 1) as usize)
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::clipboard::MemoryClipboard;
    use plan_core::{Exercise, ExerciseSet};
    use ratatui::{backend::TestBackend, Terminal};
    use std::fs;

    const UPPER_TOML: &str = r#"
[[templates]]
id = "bench_press"
name = "Bench Press"
default_sets = [
    { reps = 5, weight = 80.0, rest = 150 },
    { reps = 5, weight = 80.0, rest = 150 },
    { reps = 5, weight = 80.0, rest = 150 },
]

[[templates]]
id = "walking_lunge"
name = "Walking Lunge"
default_sets = [{ reps = 12, weight = 20.0, rest = 60 }]
"#;

    fn app_with_plan(dir: &Path) -> App {
        let mut plan = WeeklyPlan::new();
        plan.set_exercises(
            Day::Monday,
            vec![Exercise::new("squat", "Squat").with_sets(vec![ExerciseSet::new(5, 100.0, 180)])],
        );
        let plan_path = dir.join("plan.json");
        plan.save_to_file(&plan_path).unwrap();
        App::new(
            &dir.join("config"),
            &plan_path,
            Day::Monday,
            Box::new(MemoryClipboard::default()),
        )
    }

    #[test]
    fn test_cell_at_maps_columns_and_rows() {
        let area = Rect::new(1, 4, 100, 20);
        assert_eq!(cell_at(area, 0, 1, 4), None);
        assert_eq!(cell_at(area, 0, 1, 5), Some(CellPos::new(0, 0)));
        assert_eq!(cell_at(area, 0, 24, 6), Some(CellPos::new(1, 0)));
        assert_eq!(cell_at(area, 0, 26, 6), Some(CellPos::new(1, 1)));
        assert_eq!(cell_at(area, 3, 80, 5), Some(CellPos::new(3, 5)));
        assert_eq!(cell_at(area, 0, 0, 5), None);
    }

    #[test]
    fn test_list_index_skips_borders() {
        let area = Rect::new(1, 8, 36, 5);
        assert_eq!(list_index_at(area, 0, 3, 8), None);
        assert_eq!(list_index_at(area, 0, 3, 9), Some(0));
        assert_eq!(list_index_at(area, 0, 3, 11), Some(2));
        assert_eq!(list_index_at(area, 4, 3, 10), Some(5));
        assert_eq!(list_index_at(area, 0, 3, 12), None);
        assert_eq!(list_index_at(area, 0, 1, 9), None);
        assert_eq!(list_index_at(area, 0, 36, 9), None);
    }

    #[test]
    fn test_row_screen_y() {
        let area = Rect::new(1, 4, 100, 10);
        assert_eq!(row_screen_y(area, 0, 0), Some(5));
        assert_eq!(row_screen_y(area, 2, 1), None);
        assert_eq!(row_screen_y(area, 2, 4), Some(7));
        assert_eq!(row_screen_y(area, 0, 9), None);
    }

    #[test]
    fn test_malformed_numbers() {
        let item = RowKind::Item {
            item_ref: "x".to_string(),
        };
        let set = RowKind::SubItem {
            item_ref: "x".to_string(),
            ordinal: 1,
        };
        assert!(!is_malformed(&item, 2, "-"));
        assert!(is_malformed(&item, 1, "three"));
        assert!(is_malformed(&set, 3, "heavy"));
        assert!(!is_malformed(&set, 3, "62.5"));
        assert!(!is_malformed(&RowKind::Empty, 3, "heavy"));
    }

    #[test]
    fn test_day_switch_keeps_edits_and_save_clears_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_plan(dir.path());
        assert!(app.load_error.is_none());
        assert!(!app.is_dirty());

        app.grid.editor_mut().click_to_edit(CellPos::new(1, 2));
        app.dispatch(GridKey::Backspace);
        app.dispatch(GridKey::Char('8'));
        assert!(app.is_editing());

        app.next_day();
        assert_eq!(app.day(), Day::Tuesday);
        assert!(!app.is_editing());
        assert_eq!(app.plan.exercises(Day::Monday)[0].sets[0].reps, 8);
        assert!(app.is_dirty());

        app.save();
        assert!(!app.is_dirty());
        let saved = WeeklyPlan::load_from_file(&app.plan_path).unwrap();
        assert_eq!(saved.exercises(Day::Monday)[0].sets[0].reps, 8);

        app.prev_day();
        assert_eq!(
            app.grid.editor().model().value(CellPos::new(1, 2)),
            Some("8")
        );
    }

    #[test]
    fn test_keys_reach_grid_through_bus() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app_with_plan(dir.path());
        assert_eq!(app.bus.listener_count(), 1);
        assert!(app.dispatch(GridKey::Down));
        assert_eq!(app.grid.editor().selection(), Some(CellPos::new(0, 0)));
    }

    #[test]
    fn test_click_on_picker_entry_picks_it() {
        let dir = tempfile::tempdir().unwrap();
        let catalog_dir = dir.path().join("config").join("catalog");
        fs::create_dir_all(&catalog_dir).unwrap();
        fs::write(catalog_dir.join("upper.toml"), UPPER_TOML).unwrap();
        let mut app = app_with_plan(dir.path());
        assert!(app.load_error.is_none());

        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        app.grid.editor_mut().click_to_edit(CellPos::new(2, 0));
        for c in "ben".chars() {
            app.dispatch(GridKey::Char(c));
        }
        terminal.draw(|f| app.render(f)).unwrap();
        assert!(app.grid.editor().picker().is_visible());

        // row 2 is drawn at y=7, the dropdown border right under it
        app.click(3, 8);
        assert!(app.grid.editor().picker().is_visible());
        assert!(app.is_editing());

        app.click(3, 9);
        let editor = app.grid.editor();
        let model = editor.model();
        assert_eq!(model.value(CellPos::new(2, 0)), Some("Bench Press"));
        assert!(matches!(model.row(2).unwrap().kind, RowKind::Item { .. }));
        assert_eq!(model.sub_item_range(2), 3..6);
        assert!(!editor.picker().is_visible());
        assert_eq!(editor.selection(), Some(CellPos::new(2, 0)));
    }
}
