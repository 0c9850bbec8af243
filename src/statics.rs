// Central place for data keys, UI strings and other non-localized constants.
// Keep these out of gui.rs and the core modules to reduce duplication.

// Order data keys (F_ prefix). These are the field names used by the upstream
// exports and the AI workflow, kept verbatim.
pub const F_PAGE: &str = "ページ";
pub const F_SHIPMENT_DATE: &str = "出荷日";
pub const F_ORDER_NUMBER: &str = "受注番号";
pub const F_DESTINATION_NUMBER: &str = "納入先番号";
pub const F_PERSON_IN_CHARGE: &str = "担当者";
pub const F_FREIGHT: &str = "運賃";
pub const F_PARTS_TOTAL: &str = "部品合計";
pub const F_TAX_EXCLUDED_TOTAL: &str = "税抜合計";

// Part-line keys: legacy nested detail collection and the parallel arrays.
pub const F_DETAIL: &str = "明細";
pub const F_PART_NUMBER: &str = "部品番号";
pub const F_PART_NAME: &str = "部品名";
pub const F_QUANTITY: &str = "数量";
pub const F_UNIT_PRICE: &str = "売上単価";
pub const F_LINE_AMOUNT: &str = "売上金額";

// Wrapper field holding a JSON or key:value payload.
pub const F_TEXT: &str = "text";

/// Summary table columns, in display order.
pub const SUMMARY_COLUMNS: [&str; 8] = [
    F_PAGE,
    F_SHIPMENT_DATE,
    F_ORDER_NUMBER,
    F_DESTINATION_NUMBER,
    F_PERSON_IN_CHARGE,
    F_FREIGHT,
    F_PARTS_TOTAL,
    F_TAX_EXCLUDED_TOTAL,
];

/// Keys used to find the order behind a summary row.
pub const IDENTITY_KEYS: [&str; 3] = [F_ORDER_NUMBER, F_DESTINATION_NUMBER, F_SHIPMENT_DATE];

/// The four editable parallel part-line arrays.
pub const PARALLEL_KEYS: [&str; 4] = [F_PART_NUMBER, F_PART_NAME, F_QUANTITY, F_UNIT_PRICE];

/// Part-line columns, in display order.
pub const DETAIL_COLUMNS: [&str; 5] = [
    F_PART_NUMBER,
    F_PART_NAME,
    F_QUANTITY,
    F_UNIT_PRICE,
    F_LINE_AMOUNT,
];

// Key/value separators accepted by the key:value list parser (ASCII and full-width).
pub const KV_SEPARATORS: [char; 4] = [':', '=', '＝', '：'];

// Session storage keys (file stems under the session directory).
pub const KEY_UPLOADED_JSON: &str = "uploaded-json";
pub const KEY_WORKING_ROWS: &str = "working-rows-v1";

// Save store defaults.
pub const SAVES_FILE_NAME: &str = "saves.json";
pub const PREVIEW_ROW_LIMIT: usize = 5;
pub const SAVES_REFRESH_SECS: u64 = 4;
pub const SESSION_DIR_NAME: &str = "session";

// Environment variables (ENV_ prefix).
pub const ENV_API_BASE_URL: &str = "DIFY_API_BASE_URL";
pub const ENV_API_KEY: &str = "DIFY_API_KEY";
pub const ENV_WORKFLOW_ID: &str = "DIFY_WORKFLOW_ID";
pub const ENV_RUN_ENDPOINT: &str = "WORKFLOW_RUN_ENDPOINT";
pub const ENV_DETAIL_ENDPOINT: &str = "WORKFLOW_DETAIL_ENDPOINT";
pub const ENV_USER: &str = "DIFY_USER";
pub const ENV_TIMEOUT_SECS: &str = "DIFY_TIMEOUT_SECS";
pub const ENV_DATA_DIR: &str = "ORDER_INTAKE_DATA_DIR";

pub const DEFAULT_API_BASE_URL: &str = "https://api.dify.ai";
pub const DEFAULT_RUN_ENDPOINT: &str = "/v1/workflows/run";
pub const DEFAULT_DETAIL_ENDPOINT: &str = "/v1/workflows/run/{workflow_run_id}";
pub const DEFAULT_USER: &str = "purchases-maintenance-app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const RUN_ID_PLACEHOLDER: &str = "{workflow_run_id}";

// English UI strings (EN_ prefix to make future localization easier)
pub const EN_APP_TITLE: &str = "Order Intake";

pub const EN_BTN_OPEN_JSON: &str = "Open JSON...";
pub const EN_BTN_PICK_IMAGES: &str = "Images...";
pub const EN_BTN_RUN_EXTRACTION: &str = "Run extraction";
pub const EN_BTN_SAVE_SELECTED: &str = "Save selected";
pub const EN_BTN_CLEAR_ALL: &str = "Clear all";
pub const EN_BTN_SAVES: &str = "Saves";
pub const EN_BTN_ABOUT: &str = "About";
pub const EN_BTN_TOGGLE_THEME: &str = "Theme";
pub const EN_BTN_PARTS: &str = "Parts";
pub const EN_BTN_EDIT: &str = "Edit";
pub const EN_BTN_DELETE: &str = "Delete";
pub const EN_BTN_APPLY: &str = "Apply";
pub const EN_BTN_CANCEL: &str = "Cancel";
pub const EN_BTN_CLEAR: &str = "Clear";
pub const EN_BTN_REFRESH: &str = "Refresh";
pub const EN_BTN_SHOW: &str = "Show";
pub const EN_BTN_HIDE: &str = "Hide";

pub const EN_WINDOW_ABOUT: &str = "About";
pub const EN_WINDOW_EDIT_ROW: &str = "Edit row";
pub const EN_WINDOW_PARTS: &str = "Part lines";
pub const EN_WINDOW_EDIT_PART: &str = "Edit part line";
pub const EN_WINDOW_SAVES: &str = "Saved records";

pub const EN_ABOUT_VERSION: &str = "Version:";
pub const EN_HOME_HEADING: &str = "Order Intake";
pub const EN_HOME_INSTRUCTIONS: &str =
    "Open a JSON export or run extraction on scanned PNG images to begin.";

pub const EN_COL_ACTIONS: &str = "Actions";
pub const EN_COL_SELECT: &str = "Select";
pub const EN_COL_ID: &str = "ID";
pub const EN_COL_CREATED_AT: &str = "Created";
pub const EN_COL_ROW_COUNT: &str = "Rows";

pub const EN_LABEL_IMAGES: &str = "images:";
pub const EN_LABEL_LINE_TOTAL: &str = "Line amount total:";
pub const EN_LABEL_PREVIEW: &str = "Preview (first rows)";
pub const EN_LABEL_EXTRACTING: &str = "Extracting...";

pub const EN_PARTS_NOT_FOUND: &str = "No part lines found for this row.";
pub const EN_SAVES_NONE: &str = "No saved records yet.";
pub const EN_PREVIEW_NONE: &str = "No rows to preview.";

pub const EN_STATUS_CLEARED: &str = "Cleared all loaded data";
pub const EN_STATUS_EXTRACTED: &str = "Extraction finished and result loaded";
pub const EN_ERR_NO_SELECTION: &str = "No rows selected. Tick the rows to save first.";
pub const EN_ERR_NO_TEXT: &str = "Extraction succeeded but the result had no text field";
pub const EN_ERR_EXTRACTION_GONE: &str = "Extraction worker stopped unexpectedly";

pub const EN_FILTER_JSON: &str = "JSON document";
pub const EN_FILTER_PNG: &str = "PNG image";
pub const EN_DROP_HINT: &str = "Drop a .json document or .png images";
pub const EN_ERR_DROP_UNSUPPORTED: &str = "Dropped files were not .json or .png";

// File extensions accepted from dialogs and drag-and-drop.
pub const JSON_EXTENSIONS: [&str; 2] = ["json", "json5"];
pub const PNG_EXTENSIONS: [&str; 1] = ["png"];

pub const EN_EMPTY: &str = "";
