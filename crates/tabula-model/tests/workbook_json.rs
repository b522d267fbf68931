use pretty_assertions::assert_eq;
use proptest::prelude::*;
use tabula_model::charts::{ChartCreationContext, ChartDefinition, ChartKind, DataSet};
use tabula_model::format::{format_number, parse_format};
use tabula_model::{
    CellData, CellIsOperator, CellIsRule, CfRule, CfStyle, ConditionalFormat, Figure,
    NormalizedFormula, SheetData, Style, WorkbookData,
};

fn sample_workbook() -> WorkbookData {
    let mut data = WorkbookData::default();
    data.styles.insert(
        1,
        Style {
            bold: true,
            fill_color: Some("#FF0000".to_string()),
            ..Default::default()
        },
    );
    data.formats.insert(1, "0.00%".to_string());

    let mut sheet = SheetData::new("sheet1", "Sheet1");
    sheet.cells.insert(
        "A1".to_string(),
        CellData {
            content: Some("hello".to_string()),
            style: Some(1),
            ..Default::default()
        },
    );
    sheet.cells.insert(
        "B1".to_string(),
        CellData {
            formula: Some(NormalizedFormula {
                text: "=SUM(|0|)".to_string(),
                dependencies: vec!["A2:A5".to_string()],
                value: None,
            }),
            format: Some(1),
            ..Default::default()
        },
    );
    sheet.conditional_formats.push(ConditionalFormat {
        id: "cf-1".to_string(),
        ranges: vec!["A1:A10".to_string()],
        stop_if_true: false,
        rule: CfRule::CellIsRule(CellIsRule {
            operator: CellIsOperator::GreaterThan,
            values: vec!["3".to_string()],
            style: CfStyle {
                bold: Some(true),
                ..Default::default()
            },
        }),
    });
    let chart = ChartDefinition::from_context(
        ChartKind::Pie,
        &ChartCreationContext {
            title: Some("Share".to_string()),
            data_sets: Some(vec![DataSet::new("Sheet1!B1:B4")]),
            hole_size: Some(50),
            ..Default::default()
        },
    );
    sheet.figures.push(Figure::chart("chart-1", [10.0, 20.0, 480.0, 290.0], chart));
    data.sheets.push(sheet);
    data
}

#[test]
fn workbook_persists_as_json() {
    let data = sample_workbook();
    let json = serde_json::to_string(&data).unwrap();
    let back: WorkbookData = serde_json::from_str(&json).unwrap();
    assert_eq!(back, data);
    assert!(back.dangling_references().is_empty());
}

#[test]
fn json_uses_camel_case_fields() {
    let value = serde_json::to_value(sample_workbook()).unwrap();
    let sheet = &value["sheets"][0];
    assert_eq!(sheet["areGridLinesVisible"], true);
    assert_eq!(sheet["conditionalFormats"][0]["rule"]["type"], "cellIsRule");
    assert_eq!(sheet["figures"][0]["data"]["chart"]["type"], "pie");
    assert_eq!(sheet["figures"][0]["data"]["chart"]["holeSize"], 50);
}

proptest! {
    #[test]
    fn parsed_formats_always_render(value in -1.0e9f64..1.0e9f64, idx in 0usize..8) {
        let formats = [
            "0", "0.00", "#,##0", "0.0%", "[$$]#,##0.00", "yyyy-mm-dd", "hh:mm:ss a", "dddd d mmmm",
        ];
        let format = parse_format(formats[idx]).unwrap();
        let _ = format_number(value, &format);
    }
}
