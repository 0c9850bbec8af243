use pretty_assertions::assert_eq;

use order_intake::{
    OrderLocation, expand_details, locate_order, normalize_document, parse_key_value_list,
};
use serde_json::{Value, json};

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[test]
fn export_with_mixed_order_shapes_normalizes_and_expands() -> Result<()> {
    // One legacy order, one parallel-array order and one AI text wrapper.
    let doc: Value = serde_json::from_str(
        r#"[
  {
    "ページ": 1,
    "出荷日": "2025/07/10",
    "受注番号": "1002889",
    "納入先番号": "D-01",
    "担当者": "山田",
    "運賃": 800,
    "明細": [
      {"部品番号": "P-1", "部品名": "Bolt", "数量": 10, "売上単価": 12},
      {"部品番号": "P-2", "部品名": "Nut", "数量": "abc", "売上単価": 5}
    ]
  },
  {
    "受注番号": "1002890",
    "部品番号": ["A", "B", "C"],
    "数量": [2, 3],
    "売上単価": [10, 20, 30]
  },
  {"ページ": 3, "text": "[出荷日:2025/07/12, 受注番号:1002891, 運賃:100]"}
]"#,
    )?;

    let rows = normalize_document(&doc);
    assert_eq!(rows.len(), 3);

    assert_eq!(rows[0].parts_total, json!(120));
    assert_eq!(rows[0].tax_excluded_total, json!(920));
    assert_eq!(rows[1].parts_total, json!(80));
    assert_eq!(rows[1].tax_excluded_total, json!(80));
    assert_eq!(rows[2].page, json!(3));
    assert_eq!(rows[2].order_number, json!("1002891"));
    assert_eq!(rows[2].parts_total, json!(""));
    assert_eq!(rows[2].tax_excluded_total, json!(100));

    let legacy = locate_order(&doc, Some(0), Some(&rows[0])).ok_or("legacy order")?;
    let details = expand_details(&legacy.order);
    assert_eq!(details.len(), 2);
    assert_eq!(details[0].amount, Some(120.0));
    assert_eq!(details[1].amount, None);

    let parallel = locate_order(&doc, Some(1), Some(&rows[1])).ok_or("parallel order")?;
    let details = expand_details(&parallel.order);
    assert_eq!(details.len(), 3);
    assert_eq!(details[2].quantity, Value::Null);
    assert_eq!(details[2].amount, None);

    // The text-wrapped order has no part lines and no JSON text to descend into.
    assert_eq!(locate_order(&doc, Some(2), Some(&rows[2])), None);
    Ok(())
}

#[test]
fn ai_wrapper_rows_are_located_inside_the_text_string() -> Result<()> {
    let doc = json!({
        "text": r#"[{"受注番号":"A1","運賃":"100","数量":[1],"売上単価":[50]},{"受注番号":"A2"}]"#
    });
    let rows = normalize_document(&doc);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].parts_total, json!(50));
    assert_eq!(rows[0].tax_excluded_total, json!(150));

    // Not an array document, so the positional index is ignored.
    let found = locate_order(&doc, Some(0), Some(&rows[0])).ok_or("order A1")?;
    assert_eq!(
        found.location,
        OrderLocation::TextString {
            element: None,
            item: Some(0)
        }
    );
    assert_eq!(expand_details(&found.order).len(), 1);
    Ok(())
}

#[test]
fn key_value_lists_feed_the_summary() {
    let parsed = parse_key_value_list(r#"["出荷日:2025/07/10","受注番号:1002889"]"#);
    assert_eq!(
        parsed.map(Value::Object),
        Some(json!({"出荷日": "2025/07/10", "受注番号": "1002889"}))
    );

    let rows = normalize_document(&json!(["受注番号：Z9", "運賃＝70", "no separator"]));
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].order_number, json!("Z9"));
    assert_eq!(rows[1].tax_excluded_total, json!(70));
}
