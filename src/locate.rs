//! Finding the order object behind a summary row.

use crate::order::{OrderRecord, OrderShape, SummaryRow};
use crate::statics;
use crate::value::{is_truthy, strict_equals};
use serde_json::Value;

/// Where an order lives inside a document.
///
/// A location is a path, not a reference, so it can be followed again inside a
/// deep copy of the document by the mutation writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderLocation {
    /// The document itself is the order.
    Root,
    /// An element of an array document.
    Element(usize),
    /// The `text` object of the document (`element: None`) or of an array element.
    TextObject { element: Option<usize> },
    /// Inside the JSON string held by `text`: the parsed object (`item: None`)
    /// or one object of a parsed array.
    TextString {
        element: Option<usize>,
        item: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedOrder {
    pub location: OrderLocation,
    /// Snapshot of the order at the time it was located.
    pub order: OrderRecord,
}

/// Locates the order for a summary row.
///
/// A positional `row_index` wins when the document is an array and the element
/// at that index carries part-line data. Otherwise the identity keys of
/// `selected` are matched against every candidate order; the first match wins.
pub fn locate_order(
    doc: &Value,
    row_index: Option<usize>,
    selected: Option<&SummaryRow>,
) -> Option<LocatedOrder> {
    if let (Some(i), Value::Array(items)) = (row_index, doc)
        && let Some(Value::Object(order)) = items.get(i)
        && OrderShape::classify(order).has_parts()
    {
        return Some(LocatedOrder {
            location: OrderLocation::Element(i),
            order: order.clone(),
        });
    }

    let selected = selected?;
    candidates(doc)
        .into_iter()
        .find(|c| identity_matches(&c.order, selected))
}

/// True when every identity key that is truthy in `selected` is strictly equal
/// in `order`. Keys that are blank in `selected` act as wildcards.
pub fn identity_matches(order: &OrderRecord, selected: &SummaryRow) -> bool {
    statics::IDENTITY_KEYS.iter().all(|key| {
        let Some(wanted) = selected.cell(key).filter(|v| is_truthy(v)) else {
            return true;
        };
        order
            .get(*key)
            .is_some_and(|actual| strict_equals(actual, wanted))
    })
}

/// Every order object in enumeration order.
fn candidates(doc: &Value) -> Vec<LocatedOrder> {
    let mut out = Vec::new();
    match doc {
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                if let Value::Object(order) = item {
                    push_with_text(&mut out, order, Some(i));
                }
            }
        }
        Value::Object(order) => push_with_text(&mut out, order, None),
        _ => {}
    }
    out
}

fn push_with_text(out: &mut Vec<LocatedOrder>, order: &OrderRecord, element: Option<usize>) {
    out.push(LocatedOrder {
        location: element.map_or(OrderLocation::Root, OrderLocation::Element),
        order: order.clone(),
    });

    match order.get(statics::F_TEXT) {
        Some(Value::Object(inner)) => out.push(LocatedOrder {
            location: OrderLocation::TextObject { element },
            order: inner.clone(),
        }),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(parsed)) => {
                for (item, value) in parsed.into_iter().enumerate() {
                    if let Value::Object(inner) = value {
                        out.push(LocatedOrder {
                            location: OrderLocation::TextString {
                                element,
                                item: Some(item),
                            },
                            order: inner,
                        });
                    }
                }
            }
            Ok(Value::Object(inner)) => out.push(LocatedOrder {
                location: OrderLocation::TextString {
                    element,
                    item: None,
                },
                order: inner,
            }),
            _ => {}
        },
        _ => {}
    }
}
