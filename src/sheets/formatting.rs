use crate::models::Status;
use google_sheets4::FieldMask;
use google_sheets4::api::{
    AddConditionalFormatRuleRequest, BooleanCondition, BooleanRule, CellData, CellFormat, Color,
    ConditionValue, ConditionalFormatRule, DeleteConditionalFormatRuleRequest, GridProperties,
    GridRange, RepeatCellRequest, Request, Sheet, SheetProperties, TextFormat,
    UpdateSheetPropertiesRequest,
};

// Status coloring covers columns A:E down to row 81.
const STATUS_RANGE_ROWS: i32 = 81;
const STATUS_RANGE_COLS: i32 = 5;

/// Make header row bold.
pub(super) fn bold_header_rule(sheet_id: i32) -> Request {
    Request {
        repeat_cell: Some(RepeatCellRequest {
            range: Some(GridRange {
                sheet_id: Some(sheet_id),
                start_row_index: Some(0),
                end_row_index: Some(1),
                start_column_index: None,
                end_column_index: None,
            }),
            cell: Some(CellData {
                user_entered_format: Some(CellFormat {
                    text_format: Some(TextFormat {
                        bold: Some(true),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["userEnteredFormat.textFormat.bold"])),
        }),
        ..Default::default()
    }
}

/// Freeze header row.
pub(super) fn freeze_header_rule(sheet_id: i32) -> Request {
    Request {
        update_sheet_properties: Some(UpdateSheetPropertiesRequest {
            properties: Some(SheetProperties {
                sheet_id: Some(sheet_id),
                grid_properties: Some(GridProperties {
                    frozen_row_count: Some(1),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            fields: Some(FieldMask::new(&["gridProperties.frozenRowCount"])),
        }),
        ..Default::default()
    }
}

/// Color cells in the status range by their numeric progress value.
///
/// Clears every conditional format rule already on the sheet, then installs
/// one rule per status, so the sheet ends up with exactly these three rules
/// no matter how often they are reapplied.
pub(super) fn status_color_rules(sheet_id: i32, sheet: &Sheet) -> Vec<Request> {
    let mut requests = Vec::new();

    for _ in sheet
        .conditional_formats
        .as_deref()
        .unwrap_or_default()
        .iter()
    {
        requests.push(Request {
            delete_conditional_format_rule: Some(DeleteConditionalFormatRuleRequest {
                index: Some(0), // Delete the first rule repeatedly
                sheet_id: Some(sheet_id),
            }),
            ..Default::default()
        });
    }

    for (index, status) in Status::ALL.into_iter().enumerate() {
        requests.push(Request {
            add_conditional_format_rule: Some(AddConditionalFormatRuleRequest {
                index: Some(index as i32),
                rule: Some(ConditionalFormatRule {
                    ranges: Some(vec![status_range(sheet_id)]),
                    boolean_rule: Some(BooleanRule {
                        condition: Some(BooleanCondition {
                            type_: Some("NUMBER_EQ".to_string()),
                            values: Some(vec![ConditionValue {
                                user_entered_value: Some(status.value().to_string()),
                                ..Default::default()
                            }]),
                        }),
                        format: Some(CellFormat {
                            background_color: Some(status_background(status)),
                            ..Default::default()
                        }),
                    }),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        });
    }

    requests
}

fn status_range(sheet_id: i32) -> GridRange {
    GridRange {
        sheet_id: Some(sheet_id),
        start_row_index: Some(0),
        end_row_index: Some(STATUS_RANGE_ROWS),
        start_column_index: Some(0),
        end_column_index: Some(STATUS_RANGE_COLS),
    }
}

fn status_background(status: Status) -> Color {
    let (red, green, blue) = match status {
        Status::NotStarted => (0.96, 0.73, 0.48),
        Status::InProgress => (0.9, 0.96, 0.48),
        Status::Complete => (0.56, 0.95, 0.48),
    };

    Color {
        red: Some(red),
        green: Some(green),
        blue: Some(blue),
        alpha: Some(1.0),
    }
}
