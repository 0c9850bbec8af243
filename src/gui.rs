use crate::config::AppConfig;
use crate::extract::{ExtractionContext, ExtractionService, WorkflowClient, WorkflowError};
use crate::locate::locate_order;
use crate::mutate::{PartLineEdit, PartLineOp, apply_part_line_op};
use crate::order::{DetailRow, SummaryRow, expand_details, line_amount_total};
use crate::session::{Session, SessionEvent, read_document_file};
use crate::statics;
use crate::store::{JsonFileStore, SaveRecord, SaveStore};
use crate::value::{format_cell, format_number};
use eframe::egui;
use egui_extras::{Column, TableBuilder};
use serde_json::Value;
use std::{
    cell::RefCell,
    collections::{BTreeSet, HashSet},
    path::{Path, PathBuf},
    rc::Rc,
    sync::mpsc::{self, Receiver, TryRecvError},
    time::{Duration, Instant},
};
use tracing::{error, info};

pub fn run_gui(config: AppConfig) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 900.0]),
        ..Default::default()
    };
    let title = format!("{} {}", statics::EN_APP_TITLE, env!("CARGO_PKG_VERSION"));
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let app = OrderIntakeApp::new(config, cc.egui_ctx.clone());
            Ok(Box::new(app))
        }),
    )
}

/// A summary row's part lines, as shown in the parts window.
#[derive(Clone, Debug)]
struct PartsView {
    row_index: usize,
    row: SummaryRow,
}

#[derive(Clone, Debug)]
struct RowEdit {
    index: usize,
    buffers: Vec<String>,
}

#[derive(Clone, Debug)]
struct PartEdit {
    line: usize,
    form: PartLineEdit,
}

#[derive(Clone, Copy, Debug)]
enum RowAction {
    Parts(usize),
    Edit(usize),
    Delete(usize),
}

#[derive(Clone, Copy, Debug)]
enum PartAction {
    Edit(usize),
    Delete(usize),
}

/// The main application state and GUI logic.
/// Owns the session and the save store; everything else is view state.
struct OrderIntakeApp {
    config: AppConfig,
    session: Session,
    store: JsonFileStore,
    session_events: Rc<RefCell<Vec<SessionEvent>>>,
    dialog_dir: Option<PathBuf>,
    status: String,
    last_error: Option<String>,

    selected: BTreeSet<usize>,
    images: Vec<PathBuf>,
    extraction: Option<Receiver<Result<Value, WorkflowError>>>,

    parts_view: Option<PartsView>,
    row_edit: Option<RowEdit>,
    part_edit: Option<PartEdit>,

    saves_open: bool,
    saves: Vec<SaveRecord>,
    saves_loaded_at: Option<Instant>,
    expanded_saves: HashSet<i64>,

    about_open: bool,
    theme_dark: bool,
}

impl OrderIntakeApp {
    fn new(config: AppConfig, ctx: egui::Context) -> Self {
        let mut last_error = None;
        let session_dir = config.session_dir();
        let mut session = match Session::open(&session_dir) {
            Ok(session) => session,
            Err(e) => {
                error!(error = %format!("{e:#}"), "falling back to in-memory session");
                last_error = Some(format!("Session storage unavailable: {e:#}"));
                Session::in_memory()
            }
        };

        let session_events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&session_events);
        session.subscribe(move |event| {
            sink.borrow_mut().push(*event);
            ctx.request_repaint();
        });

        let store = JsonFileStore::new(config.saves_path());
        Self {
            config,
            session,
            store,
            session_events,
            dialog_dir: None,
            status: String::new(),
            last_error,
            selected: BTreeSet::new(),
            images: Vec::new(),
            extraction: None,
            parts_view: None,
            row_edit: None,
            part_edit: None,
            saves_open: false,
            saves: Vec::new(),
            saves_loaded_at: None,
            expanded_saves: HashSet::new(),
            about_open: false,
            theme_dark: true,
        }
    }

    fn report<T>(&mut self, what: &str, result: anyhow::Result<T>) -> Option<T> {
        match result {
            Ok(v) => Some(v),
            Err(e) => {
                self.last_error = Some(format!("{what}: {e:#}"));
                None
            }
        }
    }

    /// Row indices shift whenever the rows are rebuilt, so the selection goes with them.
    fn drain_session_events(&mut self) {
        let events: Vec<SessionEvent> = self.session_events.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                SessionEvent::DocumentReplaced | SessionEvent::RowsChanged => {
                    self.selected.clear();
                }
                SessionEvent::Cleared => {
                    self.selected.clear();
                    self.parts_view = None;
                    self.row_edit = None;
                    self.part_edit = None;
                }
            }
        }
    }

    fn file_dialog(&self) -> rfd::FileDialog {
        let mut dlg = rfd::FileDialog::new();
        if let Some(dir) = self.dialog_dir.clone() {
            dlg = dlg.set_directory(dir);
        }
        dlg
    }

    fn open_json(&mut self) {
        let Some(path) = self
            .file_dialog()
            .add_filter(statics::EN_FILTER_JSON, &statics::JSON_EXTENSIONS)
            .pick_file()
        else {
            return;
        };
        self.load_json(&path);
    }

    fn load_json(&mut self, path: &Path) {
        let loaded = read_document_file(path)
            .and_then(|doc| self.session.replace_document(doc));
        if self.report("Failed to load", loaded).is_some() {
            self.dialog_dir = path.parent().map(PathBuf::from);
            self.status = format!("Loaded {}", path.display());
            self.last_error = None;
        }
    }

    fn pick_images(&mut self) {
        let Some(paths) = self
            .file_dialog()
            .add_filter(statics::EN_FILTER_PNG, &statics::PNG_EXTENSIONS)
            .pick_files()
        else {
            return;
        };
        self.dialog_dir = paths.first().and_then(|p| p.parent()).map(PathBuf::from);
        self.images = paths;
    }

    /// Files dropped onto the window: the first JSON file becomes the document,
    /// PNG files replace the image selection.
    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let paths: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        if paths.is_empty() {
            return;
        }

        let dropped = DroppedFiles::sort(paths);
        if dropped.is_empty() {
            self.last_error = Some(statics::EN_ERR_DROP_UNSUPPORTED.to_string());
            return;
        }
        if let Some(path) = dropped.json {
            self.load_json(&path);
        }
        if !dropped.images.is_empty() {
            info!(images = dropped.images.len(), "images dropped");
            self.images = dropped.images;
        }
    }

    fn start_extraction(&mut self) {
        let client = match WorkflowClient::new(&self.config) {
            Ok(client) => client,
            Err(e) => {
                self.last_error = Some(format!("Extraction unavailable: {e}"));
                return;
            }
        };
        let context = ExtractionContext {
            document: self.session.document().cloned(),
            working_rows: rows_as_json(self.session.rows()),
        };
        let images = self.images.clone();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let result = client.extract(&images, &context);
            // The receiver is gone only if the app closed mid-run.
            let _ = tx.send(result);
        });
        info!(images = self.images.len(), "extraction started");
        self.extraction = Some(rx);
        self.last_error = None;
    }

    fn poll_extraction(&mut self, ctx: &egui::Context) {
        let Some(rx) = &self.extraction else {
            return;
        };
        let outcome = match rx.try_recv() {
            Ok(outcome) => outcome,
            Err(TryRecvError::Empty) => {
                ctx.request_repaint_after(Duration::from_millis(200));
                return;
            }
            Err(TryRecvError::Disconnected) => {
                self.extraction = None;
                self.last_error = Some(statics::EN_ERR_EXTRACTION_GONE.to_string());
                return;
            }
        };
        self.extraction = None;

        match outcome {
            Ok(result) => {
                let ingested = self.session.ingest_extraction(&result);
                match self.report("Failed to store extraction result", ingested) {
                    Some(true) => {
                        self.images.clear();
                        self.status = statics::EN_STATUS_EXTRACTED.to_string();
                    }
                    Some(false) => self.last_error = Some(statics::EN_ERR_NO_TEXT.to_string()),
                    None => {}
                }
            }
            Err(e) => {
                error!(error = %e, "extraction failed");
                self.last_error = Some(format!("Extraction failed: {e}"));
            }
        }
    }

    fn save_selected(&mut self) {
        if self.selected.is_empty() {
            self.last_error = Some(statics::EN_ERR_NO_SELECTION.to_string());
            return;
        }
        let rows = self.session.rows();
        let chosen: Vec<Value> = self
            .selected
            .iter()
            .filter_map(|&i| rows.get(i))
            .filter_map(|row| serde_json::to_value(row).ok())
            .collect();
        let raw = self.session.document().cloned().unwrap_or(Value::Null);

        match self.store.append(raw, chosen) {
            Ok(record) => {
                let selected = std::mem::take(&mut self.selected);
                let removed = self.session.retain_rows(|i, _| !selected.contains(&i));
                if let Some(removed) = self.report("Failed to update rows", removed) {
                    self.status = format!("Saved {removed} rows (id {})", record.id);
                }
                self.saves_loaded_at = None;
            }
            Err(e) => self.last_error = Some(format!("Failed to save: {e}")),
        }
    }

    fn clear_all(&mut self) {
        let cleared = self.session.clear();
        if self.report("Failed to clear", cleared).is_some() {
            self.images.clear();
            self.status = statics::EN_STATUS_CLEARED.to_string();
        }
    }

    fn apply_row_action(&mut self, action: RowAction) {
        let rows = self.session.rows();
        match action {
            RowAction::Parts(i) => {
                if let Some(row) = rows.get(i) {
                    self.parts_view = Some(PartsView {
                        row_index: i,
                        row: row.clone(),
                    });
                }
            }
            RowAction::Edit(i) => {
                if let Some(row) = rows.get(i) {
                    self.row_edit = Some(RowEdit {
                        index: i,
                        buffers: row_edit_buffers(row),
                    });
                }
            }
            RowAction::Delete(i) => {
                let deleted = self.session.delete_row(i);
                self.report("Failed to delete row", deleted);
            }
        }
    }

    fn apply_part_op(&mut self, view: &PartsView, op: PartLineOp) {
        let Some(doc) = self.session.document() else {
            return;
        };
        let Some(located) = locate_order(doc, Some(view.row_index), Some(&view.row)) else {
            self.last_error = Some(statics::EN_PARTS_NOT_FOUND.to_string());
            return;
        };
        match apply_part_line_op(doc, &located.location, &op) {
            Ok(next) => {
                let committed = self.session.commit_document(next);
                self.report("Failed to commit edit", committed);
            }
            Err(e) => self.last_error = Some(format!("Edit rejected: {e}")),
        }
    }

    fn refresh_saves_if_due(&mut self, ctx: &egui::Context) {
        let every = Duration::from_secs(statics::SAVES_REFRESH_SECS);
        if self.saves_loaded_at.is_none_or(|at| at.elapsed() >= every) {
            match self.store.list() {
                Ok(saves) => self.saves = saves,
                Err(e) => self.last_error = Some(format!("Failed to read saves: {e}")),
            }
            self.saves_loaded_at = Some(Instant::now());
        }
        ctx.request_repaint_after(every);
    }

    fn render_summary_table(&mut self, ui: &mut egui::Ui, rows: &[SummaryRow]) {
        let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
        let mut action = None;

        ui.push_id("summary_table", |ui| {
            let mut table = TableBuilder::new(ui)
                .striped(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
            for _ in statics::SUMMARY_COLUMNS {
                table = table.column(Column::initial(110.0).resizable(true));
            }
            table
                .column(Column::initial(170.0))
                .column(Column::remainder())
                .header(row_h, |mut header| {
                    for col in statics::SUMMARY_COLUMNS {
                        header.col(|ui| {
                            ui.strong(col);
                        });
                    }
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_ACTIONS);
                    });
                    header.col(|ui| {
                        ui.strong(statics::EN_COL_SELECT);
                    });
                })
                .body(|mut body| {
                    for (i, summary) in rows.iter().enumerate() {
                        body.row(row_h, |mut row| {
                            for col in statics::SUMMARY_COLUMNS {
                                row.col(|ui| {
                                    ui.label(summary.cell(col).map(format_cell).unwrap_or_default());
                                });
                            }
                            row.col(|ui| {
                                if ui.small_button(statics::EN_BTN_PARTS).clicked() {
                                    action = Some(RowAction::Parts(i));
                                }
                                if ui.small_button(statics::EN_BTN_EDIT).clicked() {
                                    action = Some(RowAction::Edit(i));
                                }
                                if ui.small_button(statics::EN_BTN_DELETE).clicked() {
                                    action = Some(RowAction::Delete(i));
                                }
                            });
                            row.col(|ui| {
                                let mut checked = self.selected.contains(&i);
                                if ui.checkbox(&mut checked, statics::EN_EMPTY).changed() {
                                    if checked {
                                        self.selected.insert(i);
                                    } else {
                                        self.selected.remove(&i);
                                    }
                                }
                            });
                        });
                    }
                });
        });

        if let Some(action) = action {
            self.apply_row_action(action);
        }
    }

    fn render_parts_window(&mut self, ctx: &egui::Context) {
        let Some(view) = self.parts_view.clone() else {
            return;
        };
        let details: Option<Vec<DetailRow>> = self
            .session
            .document()
            .and_then(|doc| locate_order(doc, Some(view.row_index), Some(&view.row)))
            .map(|located| expand_details(&located.order));

        let mut open = true;
        let mut action = None;
        egui::Window::new(statics::EN_WINDOW_PARTS)
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                let details = details.unwrap_or_default();
                if details.is_empty() {
                    ui.label(statics::EN_PARTS_NOT_FOUND);
                    return;
                }
                ui.label(format!(
                    "{} {}",
                    statics::EN_LABEL_LINE_TOTAL,
                    format_number(line_amount_total(&details))
                ));

                let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
                ui.push_id("parts_table", |ui| {
                    let mut table = TableBuilder::new(ui)
                        .striped(true)
                        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
                    for _ in statics::DETAIL_COLUMNS {
                        table = table.column(Column::initial(110.0).resizable(true));
                    }
                    table
                        .column(Column::remainder())
                        .header(row_h, |mut header| {
                            for col in statics::DETAIL_COLUMNS {
                                header.col(|ui| {
                                    ui.strong(col);
                                });
                            }
                            header.col(|ui| {
                                ui.strong(statics::EN_COL_ACTIONS);
                            });
                        })
                        .body(|mut body| {
                            for (i, detail) in details.iter().enumerate() {
                                body.row(row_h, |mut row| {
                                    let cells = [
                                        format_cell(&detail.part_number),
                                        format_cell(&detail.part_name),
                                        format_cell(&detail.quantity),
                                        format_cell(&detail.unit_price),
                                        detail.amount.map(format_number).unwrap_or_default(),
                                    ];
                                    for cell in cells {
                                        row.col(|ui| {
                                            ui.label(cell);
                                        });
                                    }
                                    row.col(|ui| {
                                        if ui.small_button(statics::EN_BTN_EDIT).clicked() {
                                            action = Some((PartAction::Edit(i), detail.clone()));
                                        }
                                        if ui.small_button(statics::EN_BTN_DELETE).clicked() {
                                            action = Some((PartAction::Delete(i), detail.clone()));
                                        }
                                    });
                                });
                            }
                        });
                });
            });

        if !open {
            self.parts_view = None;
            self.part_edit = None;
            return;
        }
        match action {
            Some((PartAction::Edit(line), detail)) => {
                self.part_edit = Some(PartEdit {
                    line,
                    form: PartLineEdit::from_row(&detail),
                });
            }
            Some((PartAction::Delete(line), _)) => {
                self.apply_part_op(&view, PartLineOp::Delete(line));
            }
            None => {}
        }
    }

    fn render_part_edit_window(&mut self, ctx: &egui::Context) {
        let (Some(view), Some(edit)) = (self.parts_view.clone(), self.part_edit.as_mut()) else {
            return;
        };

        let mut open = true;
        let mut apply = false;
        let mut cancel = false;
        egui::Window::new(statics::EN_WINDOW_EDIT_PART)
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::Grid::new("part_edit_grid").num_columns(2).show(ui, |ui| {
                    let fields = [
                        (statics::F_PART_NUMBER, &mut edit.form.part_number),
                        (statics::F_PART_NAME, &mut edit.form.part_name),
                        (statics::F_QUANTITY, &mut edit.form.quantity),
                        (statics::F_UNIT_PRICE, &mut edit.form.unit_price),
                    ];
                    for (label, buf) in fields {
                        ui.label(label);
                        ui.text_edit_singleline(buf);
                        ui.end_row();
                    }
                });
                ui.horizontal(|ui| {
                    apply = ui.button(statics::EN_BTN_APPLY).clicked();
                    cancel = ui.button(statics::EN_BTN_CANCEL).clicked();
                });
            });

        if apply {
            let edit = edit.clone();
            self.part_edit = None;
            self.apply_part_op(&view, PartLineOp::Update(edit.line, edit.form));
        } else if cancel || !open {
            self.part_edit = None;
        }
    }

    fn render_row_edit_window(&mut self, ctx: &egui::Context) {
        let Some(edit) = self.row_edit.as_mut() else {
            return;
        };

        let mut open = true;
        let mut apply = false;
        let mut cancel = false;
        egui::Window::new(statics::EN_WINDOW_EDIT_ROW)
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                egui::Grid::new("row_edit_grid").num_columns(2).show(ui, |ui| {
                    for (col, buf) in statics::SUMMARY_COLUMNS.iter().zip(edit.buffers.iter_mut()) {
                        ui.label(*col);
                        ui.text_edit_singleline(buf);
                        ui.end_row();
                    }
                });
                ui.horizontal(|ui| {
                    apply = ui.button(statics::EN_BTN_APPLY).clicked();
                    cancel = ui.button(statics::EN_BTN_CANCEL).clicked();
                });
            });

        if apply {
            let edit = edit.clone();
            self.row_edit = None;
            let Some(current) = self.session.rows().get(edit.index).cloned() else {
                return;
            };
            let updated = apply_row_edit(&current, &edit.buffers);
            let result = self.session.update_row(edit.index, updated);
            self.report("Failed to update row", result);
        } else if cancel || !open {
            self.row_edit = None;
        }
    }

    fn render_saves_window(&mut self, ctx: &egui::Context) {
        if !self.saves_open {
            return;
        }
        self.refresh_saves_if_due(ctx);

        let mut open = self.saves_open;
        let mut toggle = None;
        let mut refresh = false;
        egui::Window::new(statics::EN_WINDOW_SAVES)
            .collapsible(false)
            .open(&mut open)
            .show(ctx, |ui| {
                if ui.button(statics::EN_BTN_REFRESH).clicked() {
                    refresh = true;
                }
                ui.separator();
                if self.saves.is_empty() {
                    ui.label(statics::EN_SAVES_NONE);
                    return;
                }
                ui.push_id("saves_scroll", |ui| {
                    egui::ScrollArea::vertical()
                        .auto_shrink([false, false])
                        .show(ui, |ui| {
                            for record in self.saves.iter().rev() {
                                let expanded = self.expanded_saves.contains(&record.id);
                                ui.horizontal(|ui| {
                                    ui.monospace(format!("{} {}", statics::EN_COL_ID, record.id));
                                    ui.separator();
                                    ui.label(format!(
                                        "{} {}",
                                        statics::EN_COL_CREATED_AT,
                                        record.created_at
                                    ));
                                    ui.separator();
                                    ui.label(format!(
                                        "{} {}",
                                        statics::EN_COL_ROW_COUNT,
                                        record.rows.len()
                                    ));
                                    let label = if expanded {
                                        statics::EN_BTN_HIDE
                                    } else {
                                        statics::EN_BTN_SHOW
                                    };
                                    if ui.small_button(label).clicked() {
                                        toggle = Some(record.id);
                                    }
                                });
                                if expanded {
                                    ui.push_id(record.id, |ui| render_preview(ui, record));
                                }
                                ui.separator();
                            }
                        });
                });
            });
        self.saves_open = open;

        if refresh {
            self.saves_loaded_at = None;
        }
        if let Some(id) = toggle
            && !self.expanded_saves.remove(&id)
        {
            self.expanded_saves.insert(id);
        }
    }
}

fn render_preview(ui: &mut egui::Ui, record: &SaveRecord) {
    let preview = record.preview(statics::PREVIEW_ROW_LIMIT);
    ui.label(statics::EN_LABEL_PREVIEW);
    if preview.cells.is_empty() {
        ui.label(statics::EN_PREVIEW_NONE);
        return;
    }
    let row_h = ui.text_style_height(&egui::TextStyle::Body) + 6.0;
    let mut table = TableBuilder::new(ui)
        .striped(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center));
    for _ in &preview.columns {
        table = table.column(Column::auto().resizable(true));
    }
    table
        .header(row_h, |mut header| {
            for col in &preview.columns {
                header.col(|ui| {
                    ui.strong(col);
                });
            }
        })
        .body(|mut body| {
            for cells in &preview.cells {
                body.row(row_h, |mut row| {
                    for cell in cells {
                        row.col(|ui| {
                            ui.label(cell);
                        });
                    }
                });
            }
        });
}

fn rows_as_json(rows: &[SummaryRow]) -> Vec<Value> {
    rows.iter()
        .filter_map(|row| serde_json::to_value(row).ok())
        .collect()
}

fn row_edit_buffers(row: &SummaryRow) -> Vec<String> {
    statics::SUMMARY_COLUMNS
        .iter()
        .map(|col| row.cell(col).map(format_cell).unwrap_or_default())
        .collect()
}

/// Applies edited text to a row. Cells whose text is unchanged keep their
/// original value (and type); changed cells become strings.
fn apply_row_edit(row: &SummaryRow, buffers: &[String]) -> SummaryRow {
    let mut out = row.clone();
    for (col, buf) in statics::SUMMARY_COLUMNS.iter().zip(buffers) {
        let Some(cell) = out.cell_mut(col) else {
            continue;
        };
        if format_cell(cell) != *buf {
            *cell = Value::String(buf.clone());
        }
    }
    out
}

/// Dropped paths split by kind.
#[derive(Debug, Default, PartialEq)]
struct DroppedFiles {
    json: Option<PathBuf>,
    images: Vec<PathBuf>,
}

impl DroppedFiles {
    fn sort(paths: Vec<PathBuf>) -> Self {
        let mut out = Self::default();
        for path in paths {
            if has_extension(&path, &statics::JSON_EXTENSIONS) {
                out.json.get_or_insert(path);
            } else if has_extension(&path, &statics::PNG_EXTENSIONS) {
                out.images.push(path);
            }
        }
        out
    }

    fn is_empty(&self) -> bool {
        self.json.is_none() && self.images.is_empty()
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
}

impl eframe::App for OrderIntakeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_session_events();
        self.poll_extraction(ctx);
        self.handle_dropped_files(ctx);

        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                if ui.button(statics::EN_BTN_OPEN_JSON).clicked() {
                    self.open_json();
                }
                if ui.button(statics::EN_BTN_PICK_IMAGES).clicked() {
                    self.pick_images();
                }
                let can_extract = !self.images.is_empty() && self.extraction.is_none();
                if ui
                    .add_enabled(can_extract, egui::Button::new(statics::EN_BTN_RUN_EXTRACTION))
                    .clicked()
                {
                    self.start_extraction();
                }

                ui.separator();
                let can_save = !self.selected.is_empty();
                if ui
                    .add_enabled(can_save, egui::Button::new(statics::EN_BTN_SAVE_SELECTED))
                    .clicked()
                {
                    self.save_selected();
                }
                if ui.button(statics::EN_BTN_CLEAR_ALL).clicked() {
                    self.clear_all();
                }
                if ui.button(statics::EN_BTN_SAVES).clicked() {
                    self.saves_open = true;
                    self.saves_loaded_at = None;
                }

                ui.separator();
                if ui.button(statics::EN_BTN_ABOUT).clicked() {
                    self.about_open = true;
                }
                if ui.button(statics::EN_BTN_TOGGLE_THEME).clicked() {
                    self.theme_dark = !self.theme_dark;
                    if self.theme_dark {
                        ctx.set_visuals(egui::Visuals::dark());
                    } else {
                        ctx.set_visuals(egui::Visuals::light());
                    }
                }

                if self.extraction.is_some() {
                    ui.separator();
                    ui.spinner();
                    ui.label(statics::EN_LABEL_EXTRACTING);
                } else if !self.images.is_empty() {
                    ui.separator();
                    ui.label(format!("{} {}", statics::EN_LABEL_IMAGES, self.images.len()));
                }
                if !self.status.is_empty() {
                    ui.separator();
                    ui.label(&self.status);
                }
            });
        });

        if self.about_open {
            let mut open = self.about_open;
            egui::Window::new(statics::EN_WINDOW_ABOUT)
                .collapsible(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.heading(statics::EN_APP_TITLE);
                    ui.label(format!(
                        "{} {}",
                        statics::EN_ABOUT_VERSION,
                        env!("CARGO_PKG_VERSION")
                    ));
                    ui.separator();
                    ui.label(format!("data: {}", self.config.data_dir.display()));
                    ui.label(format!("service: {}", self.config.api_base_url));
                });
            self.about_open = open;
        }

        if let Some(err) = self.last_error.clone() {
            egui::TopBottomPanel::top("error_bar").show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, err);
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button(statics::EN_BTN_CLEAR).clicked() {
                            self.last_error = None;
                        }
                    });
                });
            });
        }

        self.render_saves_window(ctx);
        self.render_parts_window(ctx);
        self.render_part_edit_window(ctx);
        self.render_row_edit_window(ctx);

        let rows = self.session.rows().to_vec();
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        egui::CentralPanel::default().show(ctx, |ui| {
            if hovering {
                ui.heading(statics::EN_DROP_HINT);
                return;
            }
            if rows.is_empty() {
                ui.heading(statics::EN_HOME_HEADING);
                ui.label(statics::EN_HOME_INSTRUCTIONS);
                return;
            }
            egui::ScrollArea::horizontal()
                .auto_shrink([false, false])
                .show(ui, |ui| self.render_summary_table(ui, &rows));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{DroppedFiles, apply_row_edit, row_edit_buffers, rows_as_json};
    use crate::order::SummaryRow;
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};
    use std::path::PathBuf;

    #[test]
    fn dropped_files_split_into_document_and_images() {
        let dropped = DroppedFiles::sort(vec![
            PathBuf::from("scan1.PNG"),
            PathBuf::from("notes.txt"),
            PathBuf::from("orders.json"),
            PathBuf::from("second.json5"),
            PathBuf::from("scan2.png"),
            PathBuf::from("no_extension"),
        ]);
        assert_eq!(
            dropped,
            DroppedFiles {
                json: Some(PathBuf::from("orders.json")),
                images: vec![PathBuf::from("scan1.PNG"), PathBuf::from("scan2.png")],
            }
        );

        let unsupported = DroppedFiles::sort(vec![PathBuf::from("a.jpg")]);
        assert!(unsupported.is_empty());
    }

    #[test]
    fn row_edit_keeps_untouched_cells_as_they_were() {
        let row = SummaryRow {
            page: json!(3),
            order_number: json!("A1"),
            freight: json!(500),
            ..SummaryRow::default()
        };
        let mut buffers = row_edit_buffers(&row);
        assert_eq!(buffers[0], "3");
        assert_eq!(buffers[3], "");

        buffers[5] = "650".to_string();
        let edited = apply_row_edit(&row, &buffers);
        assert_eq!(edited.page, json!(3));
        assert_eq!(edited.destination_number, Value::Null);
        assert_eq!(edited.freight, json!("650"));
    }

    #[test]
    fn rows_serialize_with_data_keys_for_the_workflow() {
        let row = SummaryRow {
            order_number: json!("A1"),
            parts_total: json!(""),
            ..SummaryRow::default()
        };
        assert_eq!(rows_as_json(&[row]), vec![json!({"受注番号": "A1", "部品合計": ""})]);
    }
}
