use pretty_assertions::assert_eq;
use tabula_formula::{denormalize_formula, normalize_formula};
use tabula_model::{
    CellData, CellIsOperator, CellIsRule, CellValue, CfRule, CfStyle, ComparisonOperator,
    ConditionalFormat, DataValidationCriterion, DataValidationRule, HeaderData, HeaderGroup,
    ListDisplayStyle, PaneDivisions, SheetData, Style, Table, TableConfig, WorkbookData,
};
use tabula_xlsx::{export_xlsx, import_xlsx, ExportOptions, ImportOptions, XlsxPart};

fn content(text: &str) -> CellData {
    CellData { content: Some(text.into()), ..Default::default() }
}

fn round_trip(data: &WorkbookData) -> WorkbookData {
    let exported = export_xlsx(data, &ExportOptions::default()).unwrap();
    let imported = import_xlsx(&exported.files, &ImportOptions::default()).unwrap();
    assert_eq!(imported.warnings, Vec::<String>::new());
    imported.data
}

fn sample() -> WorkbookData {
    let mut data = WorkbookData::default();
    data.styles.insert(
        1,
        Style { bold: true, fill_color: Some("#FFFF00".into()), ..Default::default() },
    );

    let mut sheet = SheetData::new("1", "Data");
    sheet.cells.insert("A1".into(), CellData { style: Some(1), ..content("Item") });
    sheet.cells.insert("B1".into(), CellData { style: Some(1), ..content("Qty") });
    sheet.cells.insert("A2".into(), content("Pens"));
    sheet.cells.insert("B2".into(), content("12"));
    sheet.cells.insert("A3".into(), content("Ink"));
    sheet.cells.insert("B3".into(), content("3.5"));
    sheet.cells.insert("C1".into(), content("TRUE"));
    sheet.cells.insert(
        "B4".into(),
        CellData {
            formula: Some(normalize_formula("=SUM(B2:B3)", Some(CellValue::Number(15.5)))),
            ..Default::default()
        },
    );
    sheet.cells.insert("D1".into(), content("[Docs](https://example.com/docs)"));
    sheet.cells.insert("D2".into(), content("[Summary](sheet://2)"));
    sheet.merges.push("E1:F2".into());
    sheet.cols.insert(0, HeaderData { size: Some(144.0), is_hidden: false });
    sheet.rows.insert(1, HeaderData { size: Some(40.0), is_hidden: false });
    sheet.rows.insert(5, HeaderData { size: None, is_hidden: true });
    sheet.pane_divisions = PaneDivisions { x_split: 0, y_split: 1 };
    sheet.color = Some("#00B050".into());
    sheet.tables.push(Table { range: "A1:B3".into(), config: TableConfig::default() });
    sheet.conditional_formats.push(ConditionalFormat {
        id: "1".into(),
        ranges: vec!["B2:B3".into()],
        stop_if_true: false,
        rule: CfRule::CellIsRule(CellIsRule {
            operator: CellIsOperator::GreaterThan,
            values: vec!["10".into()],
            style: CfStyle { fill_color: Some("#FF0000".into()), ..Default::default() },
        }),
    });
    sheet.data_validation_rules.push(DataValidationRule {
        id: "1".into(),
        ranges: vec!["B2:B3".into()],
        is_blocking: true,
        criterion: DataValidationCriterion::DecimalCompare {
            operator: ComparisonOperator::GreaterThan,
            values: vec!["0".into()],
        },
    });
    data.sheets.push(sheet);

    let mut summary = SheetData::new("2", "Summary");
    summary.is_visible = false;
    summary.are_grid_lines_visible = false;
    data.sheets.push(summary);
    data
}

#[test]
fn cells_and_styles_survive() {
    let imported = round_trip(&sample());
    let sheet = &imported.sheets[0];

    assert_eq!(sheet.name, "Data");
    assert_eq!(sheet.cell("A2").and_then(|c| c.content.as_deref()), Some("Pens"));
    assert_eq!(sheet.cell("B3").and_then(|c| c.content.as_deref()), Some("3.5"));
    assert_eq!(sheet.cell("C1").and_then(|c| c.content.as_deref()), Some("TRUE"));

    let formula = sheet.cell("B4").and_then(|c| c.formula.as_ref()).unwrap();
    assert_eq!(denormalize_formula(formula), "=SUM(B2:B3)");
    assert_eq!(formula.value, Some(CellValue::Number(15.5)));

    let header = sheet.cell("A1").unwrap();
    let style = &imported.styles[&header.style.unwrap()];
    assert!(style.bold);
    assert_eq!(style.fill_color.as_deref(), Some("#FFFF00"));
    assert_eq!(sheet.cell("B1").unwrap().style, header.style);
    assert_eq!(imported.styles.len(), 1);
}

#[test]
fn sheet_layout_survives() {
    let imported = round_trip(&sample());
    let (data, summary) = (&imported.sheets[0], &imported.sheets[1]);

    assert_eq!(data.merges, vec!["E1:F2".to_string()]);
    assert_eq!(data.cols[&0].size, Some(144.0));
    assert_eq!(data.rows[&1].size, Some(40.0));
    assert!(data.rows[&5].is_hidden);
    assert_eq!(data.pane_divisions, PaneDivisions { x_split: 0, y_split: 1 });
    assert_eq!(data.color.as_deref(), Some("#00B050"));
    assert!(data.are_grid_lines_visible);
    assert!(data.row_number >= 100 && data.col_number >= 30);

    assert!(!summary.is_visible);
    assert!(!summary.are_grid_lines_visible);
}

#[test]
fn links_rules_and_tables_survive() {
    let imported = round_trip(&sample());
    let sheet = &imported.sheets[0];

    assert_eq!(
        sheet.cell("D1").and_then(|c| c.content.as_deref()),
        Some("[Docs](https://example.com/docs)")
    );
    assert_eq!(sheet.cell("D2").and_then(|c| c.content.as_deref()), Some("[Summary](sheet://2)"));

    assert_eq!(sheet.tables, vec![Table { range: "A1:B3".into(), config: TableConfig::default() }]);

    let [cf] = sheet.conditional_formats.as_slice() else {
        panic!("expected one conditional format, got {:?}", sheet.conditional_formats);
    };
    assert_eq!(cf.ranges, vec!["B2:B3".to_string()]);
    match &cf.rule {
        CfRule::CellIsRule(rule) => {
            assert_eq!(rule.operator, CellIsOperator::GreaterThan);
            assert_eq!(rule.values, vec!["10".to_string()]);
            assert_eq!(rule.style.fill_color.as_deref(), Some("#FF0000"));
        }
        other => panic!("unexpected rule {other:?}"),
    }

    let [dv] = sheet.data_validation_rules.as_slice() else {
        panic!("expected one validation rule");
    };
    assert!(dv.is_blocking);
    assert_eq!(dv.ranges, vec!["B2:B3".to_string()]);
    assert_eq!(
        dv.criterion,
        DataValidationCriterion::DecimalCompare {
            operator: ComparisonOperator::GreaterThan,
            values: vec!["0".into()],
        }
    );
}

#[test]
fn package_lists_every_part() {
    let exported = export_xlsx(&sample(), &ExportOptions::default()).unwrap();
    let names: Vec<&str> = exported.files.keys().map(String::as_str).collect();
    for part in [
        "[Content_Types].xml",
        "_rels/.rels",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/sharedStrings.xml",
        "xl/worksheets/sheet1.xml",
        "xl/worksheets/sheet2.xml",
        "xl/worksheets/_rels/sheet1.xml.rels",
        "xl/tables/table1.xml",
    ] {
        assert!(names.contains(&part), "missing {part} in {names:?}");
    }
    let Some(XlsxPart::Xml(content_types)) = exported.files.get("[Content_Types].xml") else {
        panic!("content types must be xml");
    };
    assert!(content_types.contains(r#"PartName="/xl/tables/table1.xml""#));
    assert!(exported.warnings.is_empty());
}

#[test]
fn equal_styles_share_one_cell_format() {
    let exported = export_xlsx(&sample(), &ExportOptions::default()).unwrap();
    let Some(XlsxPart::Xml(styles)) = exported.files.get("xl/styles.xml") else {
        panic!("styles must be xml");
    };
    assert!(styles.contains(r#"<cellXfs count="2">"#));
    assert!(styles.contains(r#"<dxfs count="1">"#));
}

#[test]
fn unknown_dictionary_ids_abort_the_export() {
    let mut data = sample();
    data.sheets[0].cells.insert("Z9".into(), CellData { border: Some(4), ..Default::default() });
    let err = export_xlsx(&data, &ExportOptions::default()).unwrap_err();
    assert_eq!(err.to_string(), "cell Data!Z9 references unknown border id 4");
}

#[test]
fn list_and_date_validations_survive() {
    let mut data = WorkbookData::default();
    let mut sheet = SheetData::new("1", "Sheet1");
    sheet.data_validation_rules.push(DataValidationRule {
        id: "1".into(),
        ranges: vec!["A1:A4".into()],
        is_blocking: false,
        criterion: DataValidationCriterion::ValueInList {
            values: vec!["low".into(), "high".into()],
            display_style: ListDisplayStyle::PlainText,
        },
    });
    sheet.data_validation_rules.push(DataValidationRule {
        id: "2".into(),
        ranges: vec!["B1".into()],
        is_blocking: true,
        criterion: DataValidationCriterion::DateCompare {
            operator: ComparisonOperator::Between,
            values: vec!["2024-01-01".into(), "2024-12-31".into()],
        },
    });
    data.sheets.push(sheet);

    let imported = round_trip(&data);
    let criteria: Vec<_> = imported.sheets[0]
        .data_validation_rules
        .iter()
        .map(|dv| (dv.is_blocking, dv.criterion.clone()))
        .collect();
    assert_eq!(
        criteria,
        vec![
            (
                false,
                DataValidationCriterion::ValueInList {
                    values: vec!["low".into(), "high".into()],
                    display_style: ListDisplayStyle::PlainText,
                }
            ),
            (
                true,
                DataValidationCriterion::DateCompare {
                    operator: ComparisonOperator::Between,
                    values: vec!["2024-01-01".into(), "2024-12-31".into()],
                }
            ),
        ]
    );
}

#[test]
fn header_groups_survive_without_extra_hidden_headers() {
    let mut data = WorkbookData::default();
    let mut sheet = SheetData::new("1", "Sheet1");
    sheet.header_groups.rows = vec![HeaderGroup { start: 1, end: 3, is_folded: true }];
    sheet.header_groups.cols = vec![HeaderGroup { start: 2, end: 4, is_folded: false }];
    sheet.rows.insert(2, HeaderData { size: Some(40.0), is_hidden: false });
    sheet.rows.insert(8, HeaderData { size: None, is_hidden: true });
    data.sheets.push(sheet.clone());

    let imported = round_trip(&data);
    let sheet_back = &imported.sheets[0];
    assert_eq!(sheet_back.header_groups, sheet.header_groups);
    assert_eq!(sheet_back.rows, sheet.rows);
    assert!(sheet_back.cols.is_empty());
}
