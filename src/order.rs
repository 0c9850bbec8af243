//! Order records, their part-line storage shapes, and the derived row types.

use crate::statics;
use crate::value::{amount_cell, product, to_finite_number};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub type OrderRecord = Map<String, Value>;

/// How an order stores its part lines.
///
/// Classified once per order; the expander, locator and writer all branch on
/// this instead of probing the structure themselves.
#[derive(Debug, Clone, Copy)]
pub enum OrderShape<'a> {
    /// Legacy nested `明細` array.
    DetailList(&'a [Value]),
    /// Legacy nested `明細` holding a single object.
    DetailObject(&'a OrderRecord),
    /// Positionally aligned part-number / part-name / quantity / unit-price arrays.
    Parallel(ParallelColumns<'a>),
    /// No part-line data at all.
    Bare,
}

/// Storage-shape discriminant without the borrow, for code that needs `&mut` access afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    DetailList,
    DetailObject,
    Parallel,
    Bare,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelColumns<'a> {
    pub part_numbers: Option<&'a [Value]>,
    pub part_names: Option<&'a [Value]>,
    pub quantities: Option<&'a [Value]>,
    pub unit_prices: Option<&'a [Value]>,
}

impl<'a> ParallelColumns<'a> {
    pub fn of(order: &'a OrderRecord) -> Self {
        let column = |key: &str| order.get(key).and_then(Value::as_array).map(Vec::as_slice);
        Self {
            part_numbers: column(statics::F_PART_NUMBER),
            part_names: column(statics::F_PART_NAME),
            quantities: column(statics::F_QUANTITY),
            unit_prices: column(statics::F_UNIT_PRICE),
        }
    }

    pub fn any_present(&self) -> bool {
        self.part_numbers.is_some()
            || self.part_names.is_some()
            || self.quantities.is_some()
            || self.unit_prices.is_some()
    }

    /// Maximum length among the present arrays.
    pub fn line_count(&self) -> usize {
        [
            self.part_numbers,
            self.part_names,
            self.quantities,
            self.unit_prices,
        ]
        .into_iter()
        .flatten()
        .map(<[Value]>::len)
        .max()
        .unwrap_or(0)
    }

    fn cell(column: Option<&[Value]>, index: usize) -> Value {
        column
            .and_then(|c| c.get(index))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn row(&self, index: usize) -> DetailRow {
        DetailRow::new(
            Self::cell(self.part_numbers, index),
            Self::cell(self.part_names, index),
            Self::cell(self.quantities, index),
            Self::cell(self.unit_prices, index),
        )
    }
}

impl<'a> OrderShape<'a> {
    pub fn classify(order: &'a OrderRecord) -> Self {
        match order.get(statics::F_DETAIL) {
            Some(Value::Array(items)) => return OrderShape::DetailList(items),
            Some(Value::Object(detail)) => return OrderShape::DetailObject(detail),
            _ => {}
        }
        let columns = ParallelColumns::of(order);
        if columns.any_present() {
            OrderShape::Parallel(columns)
        } else {
            OrderShape::Bare
        }
    }

    pub fn kind(&self) -> ShapeKind {
        match self {
            OrderShape::DetailList(_) => ShapeKind::DetailList,
            OrderShape::DetailObject(_) => ShapeKind::DetailObject,
            OrderShape::Parallel(_) => ShapeKind::Parallel,
            OrderShape::Bare => ShapeKind::Bare,
        }
    }

    pub fn has_parts(&self) -> bool {
        !matches!(self, OrderShape::Bare)
    }

    /// Number of part lines the expander will produce for this shape.
    pub fn line_count(&self) -> usize {
        match self {
            OrderShape::DetailList(items) => items.len(),
            OrderShape::DetailObject(_) => 1,
            OrderShape::Parallel(columns) => columns.line_count(),
            OrderShape::Bare => 0,
        }
    }
}

/// One row of the summary table.
///
/// Cells are dynamic JSON values because working rows can be hand-edited;
/// `null` means absent and is omitted when serialized. The two totals hold a
/// number or `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryRow {
    #[serde(rename = "ページ", default, skip_serializing_if = "Value::is_null")]
    pub page: Value,
    #[serde(rename = "出荷日", default, skip_serializing_if = "Value::is_null")]
    pub shipment_date: Value,
    #[serde(rename = "受注番号", default, skip_serializing_if = "Value::is_null")]
    pub order_number: Value,
    #[serde(rename = "納入先番号", default, skip_serializing_if = "Value::is_null")]
    pub destination_number: Value,
    #[serde(rename = "担当者", default, skip_serializing_if = "Value::is_null")]
    pub person_in_charge: Value,
    #[serde(rename = "運賃", default, skip_serializing_if = "Value::is_null")]
    pub freight: Value,
    #[serde(rename = "部品合計", default, skip_serializing_if = "Value::is_null")]
    pub parts_total: Value,
    #[serde(rename = "税抜合計", default, skip_serializing_if = "Value::is_null")]
    pub tax_excluded_total: Value,
}

impl SummaryRow {
    /// Cell for one of [`statics::SUMMARY_COLUMNS`].
    pub fn cell(&self, column: &str) -> Option<&Value> {
        Some(match column {
            statics::F_PAGE => &self.page,
            statics::F_SHIPMENT_DATE => &self.shipment_date,
            statics::F_ORDER_NUMBER => &self.order_number,
            statics::F_DESTINATION_NUMBER => &self.destination_number,
            statics::F_PERSON_IN_CHARGE => &self.person_in_charge,
            statics::F_FREIGHT => &self.freight,
            statics::F_PARTS_TOTAL => &self.parts_total,
            statics::F_TAX_EXCLUDED_TOTAL => &self.tax_excluded_total,
            _ => return None,
        })
    }

    pub fn cell_mut(&mut self, column: &str) -> Option<&mut Value> {
        Some(match column {
            statics::F_PAGE => &mut self.page,
            statics::F_SHIPMENT_DATE => &mut self.shipment_date,
            statics::F_ORDER_NUMBER => &mut self.order_number,
            statics::F_DESTINATION_NUMBER => &mut self.destination_number,
            statics::F_PERSON_IN_CHARGE => &mut self.person_in_charge,
            statics::F_FREIGHT => &mut self.freight,
            statics::F_PARTS_TOTAL => &mut self.parts_total,
            statics::F_TAX_EXCLUDED_TOTAL => &mut self.tax_excluded_total,
            _ => return None,
        })
    }

    /// The row's identity key set, as an object for fuzzy order matching.
    pub fn identity(&self) -> OrderRecord {
        let mut out = Map::new();
        for key in statics::IDENTITY_KEYS {
            if let Some(v) = self.cell(key) {
                out.insert(key.to_string(), v.clone());
            }
        }
        out
    }
}

/// One part line of an order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailRow {
    pub part_number: Value,
    pub part_name: Value,
    pub quantity: Value,
    pub unit_price: Value,
    /// quantity × unit price, `None` when either is not numeric.
    pub amount: Option<f64>,
}

impl DetailRow {
    pub fn new(part_number: Value, part_name: Value, quantity: Value, unit_price: Value) -> Self {
        let amount = product(&quantity, &unit_price);
        Self {
            part_number,
            part_name,
            quantity,
            unit_price,
            amount,
        }
    }

    fn from_detail(detail: &Value) -> Self {
        let field = |key: &str| detail.get(key).cloned().unwrap_or(Value::Null);
        Self::new(
            field(statics::F_PART_NUMBER),
            field(statics::F_PART_NAME),
            field(statics::F_QUANTITY),
            field(statics::F_UNIT_PRICE),
        )
    }
}

/// Expands an order into its part lines, whichever shape it uses.
pub fn expand_details(order: &OrderRecord) -> Vec<DetailRow> {
    match OrderShape::classify(order) {
        // Non-object elements become blank rows so indices match storage.
        OrderShape::DetailList(items) => items.iter().map(DetailRow::from_detail).collect(),
        OrderShape::DetailObject(detail) => {
            vec![DetailRow::from_detail(&Value::Object(detail.clone()))]
        }
        OrderShape::Parallel(columns) => {
            (0..columns.line_count()).map(|i| columns.row(i)).collect()
        }
        OrderShape::Bare => Vec::new(),
    }
}

/// Sum of line amounts that could be computed.
pub fn line_amount_total(rows: &[DetailRow]) -> f64 {
    rows.iter().filter_map(|r| r.amount).sum()
}

/// Running sum that remembers whether anything qualified.
#[derive(Default)]
struct Tally {
    total: f64,
    counted: usize,
}

impl Tally {
    fn add(&mut self, amount: Option<f64>) {
        if let Some(v) = amount {
            self.total += v;
            self.counted += 1;
        }
    }

    fn result(&self) -> Option<f64> {
        (self.counted > 0).then_some(self.total)
    }
}

/// Sums quantity × unit price over the legacy detail collection and the parallel
/// arrays together. `None` when no pair had two numeric sides.
pub fn parts_total(order: &OrderRecord) -> Option<f64> {
    let mut tally = Tally::default();
    let pair = |d: &Value| {
        product(
            d.get(statics::F_QUANTITY).unwrap_or(&Value::Null),
            d.get(statics::F_UNIT_PRICE).unwrap_or(&Value::Null),
        )
    };

    match order.get(statics::F_DETAIL) {
        Some(Value::Array(items)) => {
            for item in items.iter().filter(|d| d.is_object()) {
                tally.add(pair(item));
            }
        }
        Some(detail @ Value::Object(_)) => tally.add(pair(detail)),
        _ => {}
    }

    let columns = ParallelColumns::of(order);
    let quantities = columns.quantities.unwrap_or_default();
    let unit_prices = columns.unit_prices.unwrap_or_default();
    for i in 0..quantities.len().max(unit_prices.len()) {
        tally.add(product(
            quantities.get(i).unwrap_or(&Value::Null),
            unit_prices.get(i).unwrap_or(&Value::Null),
        ));
    }

    tally.result()
}

/// Freight plus parts total, each included only when numeric.
pub fn tax_excluded_total(order: &OrderRecord, parts: Option<f64>) -> Option<f64> {
    let mut tally = Tally::default();
    tally.add(order.get(statics::F_FREIGHT).and_then(to_finite_number));
    tally.add(parts);
    tally.result()
}

/// Projects an order object onto the fixed summary columns.
pub fn project_summary(order: &OrderRecord) -> SummaryRow {
    let copy = |key: &str| order.get(key).cloned().unwrap_or(Value::Null);
    let parts = parts_total(order);
    SummaryRow {
        page: copy(statics::F_PAGE),
        shipment_date: copy(statics::F_SHIPMENT_DATE),
        order_number: copy(statics::F_ORDER_NUMBER),
        destination_number: copy(statics::F_DESTINATION_NUMBER),
        person_in_charge: copy(statics::F_PERSON_IN_CHARGE),
        freight: copy(statics::F_FREIGHT),
        parts_total: amount_cell(parts),
        tax_excluded_total: amount_cell(tax_excluded_total(order, parts)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(v: Value) -> OrderRecord {
        match v {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn classify_prefers_legacy_detail() {
        let order = record(json!({"明細": [], "数量": [1]}));
        assert_eq!(OrderShape::classify(&order).kind(), ShapeKind::DetailList);

        let order = record(json!({"明細": {"数量": 1}}));
        assert_eq!(OrderShape::classify(&order).kind(), ShapeKind::DetailObject);

        let order = record(json!({"明細": "n/a", "部品名": ["x"]}));
        assert_eq!(OrderShape::classify(&order).kind(), ShapeKind::Parallel);

        let order = record(json!({"受注番号": "A1", "数量": 3}));
        assert_eq!(OrderShape::classify(&order).kind(), ShapeKind::Bare);
        assert!(!OrderShape::classify(&order).has_parts());
    }

    #[test]
    fn expand_legacy_list_computes_line_amounts() {
        let order = record(json!({
            "明細": [
                {"部品番号": "P1", "部品名": "Bolt", "数量": "2", "売上単価": 15},
                {"部品番号": "P2", "部品名": "Nut", "数量": "abc", "売上単価": 5},
            ]
        }));
        let rows = expand_details(&order);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].part_number, json!("P1"));
        assert_eq!(rows[0].amount, Some(30.0));
        assert_eq!(rows[1].amount, None);
    }

    #[test]
    fn expand_legacy_list_keeps_non_object_elements_as_blank_rows() {
        let order = record(json!({"明細": [{"数量": 1, "売上単価": 1}, "junk"]}));
        let rows = expand_details(&order);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], DetailRow::default());
    }

    #[test]
    fn expand_single_detail_object() {
        let order = record(json!({"明細": {"部品名": "Gear", "数量": 4, "売上単価": "2.5"}}));
        let rows = expand_details(&order);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].part_name, json!("Gear"));
        assert_eq!(rows[0].amount, Some(10.0));
    }

    #[test]
    fn expand_parallel_uses_longest_array() {
        let order = record(json!({
            "部品番号": ["A", "B", "C"],
            "数量": [1, 2],
            "売上単価": [10, 20, 30],
        }));
        let rows = expand_details(&order);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2].part_number, json!("C"));
        assert_eq!(rows[2].quantity, Value::Null);
        assert_eq!(rows[2].part_name, Value::Null);
        assert_eq!(rows[2].amount, None);
        assert_eq!(rows[1].amount, Some(40.0));
        assert_eq!(line_amount_total(&rows), 50.0);
    }

    #[test]
    fn expand_bare_order_is_empty() {
        assert!(expand_details(&record(json!({"受注番号": "X"}))).is_empty());
    }

    #[test]
    fn parts_total_sums_both_sources() {
        let order = record(json!({
            "明細": [{"数量": 1, "売上単価": 100}],
            "数量": [2, 3],
            "売上単価": [10, 20],
        }));
        assert_eq!(parts_total(&order), Some(180.0));
    }

    #[test]
    fn parts_total_is_empty_when_nothing_qualifies() {
        let order = record(json!({"数量": ["x"], "売上単価": [1]}));
        assert_eq!(parts_total(&order), None);
        let row = project_summary(&order);
        assert_eq!(row.parts_total, json!(""));
    }

    #[test]
    fn tax_excluded_total_uses_whatever_is_numeric() {
        let order = record(json!({"運賃": "n/a", "数量": [2], "売上単価": [5]}));
        let row = project_summary(&order);
        assert_eq!(row.parts_total, json!(10));
        assert_eq!(row.tax_excluded_total, json!(10));

        let order = record(json!({"運賃": "300"}));
        let row = project_summary(&order);
        assert_eq!(row.tax_excluded_total, json!(300));

        let order = record(json!({"運賃": ""}));
        assert_eq!(project_summary(&order).tax_excluded_total, json!(""));
    }

    #[test]
    fn projection_copies_fields_verbatim() {
        let order = record(json!({
            "ページ": 2,
            "出荷日": "2025/07/10",
            "受注番号": "1002889",
            "担当者": "山田",
            "運賃": 500,
            "extra": true,
        }));
        let row = project_summary(&order);
        assert_eq!(row.page, json!(2));
        assert_eq!(row.destination_number, Value::Null);
        assert_eq!(row.freight, json!(500));
        assert_eq!(row.tax_excluded_total, json!(500));
    }

    #[test]
    fn summary_row_serializes_with_data_keys() {
        let row = SummaryRow {
            order_number: json!("A1"),
            parts_total: json!(""),
            tax_excluded_total: json!(100),
            ..SummaryRow::default()
        };
        let v = serde_json::to_value(&row).unwrap();
        assert_eq!(v, json!({"受注番号": "A1", "部品合計": "", "税抜合計": 100}));

        let back: SummaryRow = serde_json::from_value(v).unwrap();
        assert_eq!(back, row);
    }

    #[test]
    fn summary_cells_are_addressable_by_column() {
        let mut row = SummaryRow::default();
        for column in statics::SUMMARY_COLUMNS {
            assert!(row.cell(column).is_some());
        }
        *row.cell_mut(statics::F_FREIGHT).unwrap() = json!("10");
        assert_eq!(row.freight, json!("10"));
        assert!(row.cell("unknown").is_none());
    }
}
