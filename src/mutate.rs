//! Part-line edits applied to a copy of the document.

use crate::locate::OrderLocation;
use crate::order::{DetailRow, OrderRecord, OrderShape, ShapeKind};
use crate::statics;
use crate::value::{amount_cell, format_cell, product};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

/// Form values for one part line. Stored as strings, the way they were typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartLineEdit {
    pub part_number: String,
    pub part_name: String,
    pub quantity: String,
    pub unit_price: String,
}

impl PartLineEdit {
    /// Prefills the form from an expanded row; absent cells become empty strings.
    pub fn from_row(row: &DetailRow) -> Self {
        Self {
            part_number: format_cell(&row.part_number),
            part_name: format_cell(&row.part_name),
            quantity: format_cell(&row.quantity),
            unit_price: format_cell(&row.unit_price),
        }
    }

    fn fields(&self) -> [(&'static str, Value); 4] {
        [
            (statics::F_PART_NUMBER, Value::String(self.part_number.clone())),
            (statics::F_PART_NAME, Value::String(self.part_name.clone())),
            (statics::F_QUANTITY, Value::String(self.quantity.clone())),
            (statics::F_UNIT_PRICE, Value::String(self.unit_price.clone())),
        ]
    }

    fn amount(&self) -> Value {
        amount_cell(product(
            &Value::String(self.quantity.clone()),
            &Value::String(self.unit_price.clone()),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PartLineOp {
    Delete(usize),
    Update(usize, PartLineEdit),
}

impl PartLineOp {
    fn index(&self) -> usize {
        match self {
            PartLineOp::Delete(i) | PartLineOp::Update(i, _) => *i,
        }
    }
}

#[derive(Debug, Error)]
pub enum MutationError {
    #[error("order location no longer resolves in the document")]
    OrderMissing,
    #[error("part line {index} out of range (order has {count} lines)")]
    LineOutOfRange { index: usize, count: usize },
    #[error("order has a single detail object; it can only be deleted")]
    SingleDetailObject,
    #[error("order has no part lines")]
    NoPartLines,
    #[error("re-encoding text payload: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Applies `op` to the order at `location` inside a deep copy of `doc` and
/// returns the copy. `doc` is never modified.
pub fn apply_part_line_op(
    doc: &Value,
    location: &OrderLocation,
    op: &PartLineOp,
) -> Result<Value, MutationError> {
    let mut next = doc.clone();
    match *location {
        OrderLocation::Root => apply_to_order(as_order(&mut next)?, op)?,
        OrderLocation::Element(i) => {
            let element = next.get_mut(i).ok_or(MutationError::OrderMissing)?;
            apply_to_order(as_order(element)?, op)?;
        }
        OrderLocation::TextObject { element } => {
            let host = host_mut(&mut next, element)?;
            let inner = host
                .get_mut(statics::F_TEXT)
                .ok_or(MutationError::OrderMissing)?;
            apply_to_order(as_order(inner)?, op)?;
        }
        OrderLocation::TextString { element, item } => {
            let host = host_mut(&mut next, element)?;
            let text = host
                .get(statics::F_TEXT)
                .and_then(Value::as_str)
                .ok_or(MutationError::OrderMissing)?;
            let mut parsed: Value =
                serde_json::from_str(text).map_err(|_| MutationError::OrderMissing)?;
            let order = match item {
                None => &mut parsed,
                Some(j) => parsed.get_mut(j).ok_or(MutationError::OrderMissing)?,
            };
            apply_to_order(as_order(order)?, op)?;
            let encoded = serde_json::to_string(&parsed)?;
            host.insert(statics::F_TEXT.to_string(), Value::String(encoded));
        }
    }
    debug!(?location, ?op, "applied part line edit");
    Ok(next)
}

fn as_order(value: &mut Value) -> Result<&mut OrderRecord, MutationError> {
    value.as_object_mut().ok_or(MutationError::OrderMissing)
}

fn host_mut(doc: &mut Value, element: Option<usize>) -> Result<&mut OrderRecord, MutationError> {
    match element {
        None => as_order(doc),
        Some(i) => as_order(doc.get_mut(i).ok_or(MutationError::OrderMissing)?),
    }
}

fn apply_to_order(order: &mut OrderRecord, op: &PartLineOp) -> Result<(), MutationError> {
    let shape = OrderShape::classify(order);
    let (kind, count) = (shape.kind(), shape.line_count());
    if kind == ShapeKind::Bare {
        return Err(MutationError::NoPartLines);
    }
    let index = op.index();
    if index >= count {
        return Err(MutationError::LineOutOfRange { index, count });
    }

    match kind {
        ShapeKind::DetailList => {
            let items = order
                .get_mut(statics::F_DETAIL)
                .and_then(Value::as_array_mut)
                .ok_or(MutationError::OrderMissing)?;
            match op {
                PartLineOp::Delete(_) => {
                    items.remove(index);
                }
                PartLineOp::Update(_, edit) => {
                    let slot = &mut items[index];
                    if !slot.is_object() {
                        *slot = Value::Object(Map::new());
                    }
                    let detail = as_order(slot)?;
                    for (key, value) in edit.fields() {
                        detail.insert(key.to_string(), value);
                    }
                    detail.insert(statics::F_LINE_AMOUNT.to_string(), edit.amount());
                }
            }
        }
        ShapeKind::DetailObject => match op {
            PartLineOp::Delete(_) => {
                order.insert(statics::F_DETAIL.to_string(), Value::Array(Vec::new()));
            }
            PartLineOp::Update(..) => return Err(MutationError::SingleDetailObject),
        },
        ShapeKind::Parallel => match op {
            PartLineOp::Delete(_) => {
                for key in statics::PARALLEL_KEYS
                    .into_iter()
                    .chain([statics::F_LINE_AMOUNT])
                {
                    if let Some(Value::Array(column)) = order.get_mut(key)
                        && index < column.len()
                    {
                        column.remove(index);
                    }
                }
            }
            PartLineOp::Update(_, edit) => {
                let amount = (statics::F_LINE_AMOUNT, edit.amount());
                for (key, value) in edit.fields().into_iter().chain(std::iter::once(amount)) {
                    if let Some(Value::Array(column)) = order.get_mut(key) {
                        if column.len() <= index {
                            column.resize(index + 1, Value::Null);
                        }
                        column[index] = value;
                    }
                }
            }
        },
        ShapeKind::Bare => return Err(MutationError::NoPartLines),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::expand_details;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn edit(quantity: &str, unit_price: &str) -> PartLineEdit {
        PartLineEdit {
            part_number: "PN".into(),
            part_name: "Name".into(),
            quantity: quantity.into(),
            unit_price: unit_price.into(),
        }
    }

    #[test]
    fn delete_from_detail_list() {
        let doc = json!({"明細": [{"部品番号": "A"}, {"部品番号": "B"}, {"部品番号": "C"}]});
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &PartLineOp::Delete(1)).unwrap();
        assert_eq!(next, json!({"明細": [{"部品番号": "A"}, {"部品番号": "C"}]}));
        assert_eq!(doc["明細"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn update_detail_list_writes_line_amount() {
        let doc = json!([{"明細": [{"部品番号": "A", "数量": 1, "売上単価": 1}]}]);
        let op = PartLineOp::Update(0, edit("3", "25"));
        let next = apply_part_line_op(&doc, &OrderLocation::Element(0), &op).unwrap();
        assert_eq!(
            next[0]["明細"][0],
            json!({"部品番号": "PN", "数量": "3", "売上単価": "25", "部品名": "Name", "売上金額": 75})
        );
    }

    #[test]
    fn update_non_object_detail_replaces_it() {
        let doc = json!({"明細": ["junk"]});
        let op = PartLineOp::Update(0, edit("x", "1"));
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &op).unwrap();
        assert_eq!(next["明細"][0]["売上金額"], json!(""));
        assert_eq!(next["明細"][0]["部品番号"], json!("PN"));
    }

    #[test]
    fn single_detail_object() {
        let doc = json!({"明細": {"部品番号": "A"}});
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &PartLineOp::Delete(0)).unwrap();
        assert_eq!(next, json!({"明細": []}));

        let err = apply_part_line_op(&doc, &OrderLocation::Root, &PartLineOp::Update(0, edit("1", "1")))
            .unwrap_err();
        assert!(matches!(err, MutationError::SingleDetailObject));
    }

    #[test]
    fn delete_from_parallel_arrays_keeps_alignment() {
        let doc = json!({
            "部品番号": ["A", "B", "C"],
            "数量": [1, 2],
            "売上単価": [10, 20, 30],
            "売上金額": [10, 40, 90],
        });
        let before = expand_details(doc.as_object().unwrap());
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &PartLineOp::Delete(0)).unwrap();
        assert_eq!(
            next,
            json!({
                "部品番号": ["B", "C"],
                "数量": [2],
                "売上単価": [20, 30],
                "売上金額": [40, 90],
            })
        );
        let after = expand_details(next.as_object().unwrap());
        assert_eq!(after.len(), before.len() - 1);
        assert_eq!(after[0], before[1]);
    }

    #[test]
    fn update_parallel_pads_short_arrays() {
        let doc = json!({"部品番号": ["A", "B"], "数量": [1], "売上単価": [5, 6]});
        let op = PartLineOp::Update(1, edit("2", "6"));
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &op).unwrap();
        assert_eq!(
            next,
            json!({"部品番号": ["A", "PN"], "数量": [1, "2"], "売上単価": [5, "6"]})
        );
    }

    #[test]
    fn update_parallel_overwrites_existing_line_amounts() {
        let doc = json!({"数量": [1], "売上単価": [5], "売上金額": [5]});
        let op = PartLineOp::Update(0, edit("4", "2.5"));
        let next = apply_part_line_op(&doc, &OrderLocation::Root, &op).unwrap();
        assert_eq!(next["売上金額"], json!([10]));
    }

    #[test]
    fn text_string_order_is_reencoded() {
        let doc = json!({"text": r#"[{"受注番号":"A","数量":[1,2],"売上単価":[3,4]}]"#});
        let location = OrderLocation::TextString {
            element: None,
            item: Some(0),
        };
        let next = apply_part_line_op(&doc, &location, &PartLineOp::Delete(0)).unwrap();
        let text = next["text"].as_str().unwrap();
        let parsed: Value = serde_json::from_str(text).unwrap();
        assert_eq!(parsed, json!([{"受注番号": "A", "数量": [2], "売上単価": [4]}]));
    }

    #[test]
    fn text_object_order() {
        let doc = json!([{"text": {"明細": [{"部品番号": "A"}]}}]);
        let location = OrderLocation::TextObject { element: Some(0) };
        let next = apply_part_line_op(&doc, &location, &PartLineOp::Delete(0)).unwrap();
        assert_eq!(next, json!([{"text": {"明細": []}}]));
    }

    #[test]
    fn errors_for_stale_locations_and_bad_indices() {
        let doc = json!([{"数量": [1]}]);
        let err = apply_part_line_op(&doc, &OrderLocation::Element(4), &PartLineOp::Delete(0))
            .unwrap_err();
        assert!(matches!(err, MutationError::OrderMissing));

        let err = apply_part_line_op(&doc, &OrderLocation::Element(0), &PartLineOp::Delete(1))
            .unwrap_err();
        assert!(matches!(err, MutationError::LineOutOfRange { index: 1, count: 1 }));

        let bare = json!({"受注番号": "A"});
        let err = apply_part_line_op(&bare, &OrderLocation::Root, &PartLineOp::Delete(0)).unwrap_err();
        assert!(matches!(err, MutationError::NoPartLines));
    }

    #[test]
    fn edit_form_prefills_from_row() {
        let row = DetailRow::new(json!("P"), Value::Null, json!(2), json!(1.5));
        assert_eq!(
            PartLineEdit::from_row(&row),
            PartLineEdit {
                part_number: "P".into(),
                part_name: String::new(),
                quantity: "2".into(),
                unit_price: "1.5".into(),
            }
        );
    }
}
