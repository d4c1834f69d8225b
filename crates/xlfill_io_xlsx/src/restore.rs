//! Formatting restorer: replays column fill/protection and re-registers dropdowns.

use umya_spreadsheet::{
    DataValidation, DataValidationValues, DataValidations, Fill, PatternValues, Protection,
    Spreadsheet, Worksheet,
};

use crate::conf::N_ROW_STYLE;
use crate::error::XlsxIoError;
use crate::spec::{SpecDropdownRule, SpecTemplateSchema};
use crate::util::{cast_col_num, cast_row_num, normalize_formula, normalize_sqref};

////////////////////////////////////////////////////////////////////////////////
// #region ColumnStyles

/// Fill and protection captured from one column of the style row.
#[derive(Debug, Clone, Default)]
pub struct SpecColumnStyle {
    /// Cell fill; `None` means the cell had no fill.
    pub fill: Option<Fill>,
    /// Cell protection; `None` means the template default lock and is replayed as locked.
    pub protection: Option<Protection>,
}

/// Capture one [`SpecColumnStyle`] per column of the style row.
///
/// Editable columns are unlocked on the style row before capture, so the
/// captured protection of an editable column is always unlocked.
pub fn capture_column_styles(
    sheet: &mut Worksheet,
    cols_editable: &[usize],
) -> Result<Vec<SpecColumnStyle>, XlsxIoError> {
    let n_row_style = cast_row_num(N_ROW_STYLE).map_err(XlsxIoError::IndexOverflow)?;
    let n_cols = sheet.get_highest_column() as usize;

    let mut l_styles = Vec::with_capacity(n_cols);
    for idx_col in 0..n_cols {
        let n_col = cast_col_num(idx_col).map_err(XlsxIoError::IndexOverflow)?;
        if cols_editable.contains(&idx_col) {
            let style = sheet.get_cell_mut((n_col, n_row_style)).get_style_mut();
            let mut protection = style.get_protection().cloned().unwrap_or_default();
            protection.set_locked(false);
            style.set_protection(protection);
        }

        let column_style = match sheet.get_cell((n_col, n_row_style)) {
            Some(cell) => SpecColumnStyle {
                fill: cell.get_style().get_fill().cloned(),
                protection: cell.get_style().get_protection().cloned(),
            },
            None => SpecColumnStyle::default(),
        };
        l_styles.push(column_style);
    }
    Ok(l_styles)
}

/// Replay the style row onto data rows `N_ROW_STYLE + 1 ..= min(last row, cap)`.
///
/// Every cell gets its own clone of the column fill and protection, so a data
/// cell is unlocked only when its column is unlocked on the style row. Rows past
/// `n_row_restore_max` are left as pasted. Returns the number of restyled rows.
pub fn restore_column_styles(
    sheet: &mut Worksheet,
    cols_editable: &[usize],
    n_row_restore_max: usize,
) -> Result<usize, XlsxIoError> {
    let l_styles = capture_column_styles(sheet, cols_editable)?;

    let n_row_highest = sheet.get_highest_row() as usize;
    let Some(idx_row_last) = n_row_highest.checked_sub(1) else {
        return Ok(0);
    };
    let idx_row_last = idx_row_last.min(n_row_restore_max);
    if idx_row_last <= N_ROW_STYLE {
        return Ok(0);
    }
    if n_row_highest > n_row_restore_max + 1 {
        tracing::warn!(
            n_row_highest,
            n_row_restore_max,
            "rows past the restore cap keep pasted formatting"
        );
    }

    let fill_blank = derive_blank_fill();
    let protection_locked = derive_locked_protection();
    for idx_row in (N_ROW_STYLE + 1)..=idx_row_last {
        let n_row = cast_row_num(idx_row).map_err(XlsxIoError::IndexOverflow)?;
        for (idx_col, column_style) in l_styles.iter().enumerate() {
            let n_col = cast_col_num(idx_col).map_err(XlsxIoError::IndexOverflow)?;
            let style = sheet.get_cell_mut((n_col, n_row)).get_style_mut();
            style.set_fill(column_style.fill.clone().unwrap_or_else(|| fill_blank.clone()));
            style.set_protection(
                column_style
                    .protection
                    .clone()
                    .unwrap_or_else(|| protection_locked.clone()),
            );
        }
    }
    Ok(idx_row_last - N_ROW_STYLE)
}

/// Explicit form of the sheet default lock, so pasted unlocked cells relock.
fn derive_locked_protection() -> Protection {
    let mut protection = Protection::default();
    protection.set_locked(true);
    protection
}

fn derive_blank_fill() -> Fill {
    let mut fill = Fill::default();
    fill.get_pattern_fill_mut()
        .set_pattern_type(PatternValues::None);
    fill
}

// #endregion
////////////////////////////////////////////////////////////////////////////////
// #region Dropdowns

/// Ensure each rule exists exactly once: drop the rule's range from existing
/// validations (whole validations when nothing else is left), then add it.
pub fn register_dropdown_rules(
    book: &mut Spreadsheet,
    rules: &[SpecDropdownRule],
) -> Result<usize, XlsxIoError> {
    let mut n_replaced = 0usize;
    for rule in rules {
        let sheet = book
            .get_sheet_by_name_mut(&rule.sheet)
            .ok_or_else(|| XlsxIoError::SheetNotFound(rule.sheet.clone()))?;
        n_replaced += register_dropdown_rule(sheet, rule);
    }
    if n_replaced > 0 {
        tracing::debug!(n_replaced, "replaced existing dropdown validations");
    }
    Ok(n_replaced)
}

fn register_dropdown_rule(sheet: &mut Worksheet, rule: &SpecDropdownRule) -> usize {
    let sqref = normalize_sqref(&rule.range);

    if sheet.get_data_validations().is_none() {
        sheet.set_data_validations(DataValidations::default());
    }
    let Some(dvs) = sheet.get_data_validations_mut() else {
        return 0;
    };

    let list = dvs.get_data_validation_list_mut();
    let mut n_removed = 0usize;
    list.retain_mut(|dv| {
        let sqref_existing = dv.get_sequence_of_references().get_sqref().to_string();
        let l_ranges: Vec<&str> = sqref_existing.split_whitespace().collect();
        let l_kept: Vec<&str> = l_ranges
            .iter()
            .copied()
            .filter(|range| normalize_sqref(range) != sqref)
            .collect();
        if l_kept.len() == l_ranges.len() {
            return true;
        }
        n_removed += 1;
        if l_kept.is_empty() {
            return false;
        }
        dv.get_sequence_of_references_mut().set_sqref(l_kept.join(" "));
        true
    });

    let mut dv = DataValidation::default();
    dv.set_type(DataValidationValues::List);
    dv.set_allow_blank(true);
    dv.get_sequence_of_references_mut().set_sqref(sqref);
    dv.set_formula1(normalize_formula(&rule.formula));
    dvs.add_data_validation_list(dv);

    n_removed
}

// #endregion
////////////////////////////////////////////////////////////////////////////////

/// Restore one sheet's column styles, then register the schema's dropdowns.
pub fn restore_formatting(
    book: &mut Spreadsheet,
    sheet_name: &str,
    cols_editable: &[usize],
    schema: &SpecTemplateSchema,
) -> Result<(), XlsxIoError> {
    let sheet = book
        .get_sheet_by_name_mut(sheet_name)
        .ok_or_else(|| XlsxIoError::SheetNotFound(sheet_name.to_string()))?;
    let n_rows = restore_column_styles(sheet, cols_editable, schema.n_row_restore_max)?;
    tracing::debug!(sheet = sheet_name, n_rows, "column styles restored");

    register_dropdown_rules(book, &schema.dropdowns)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use umya_spreadsheet::{
        DataValidation, DataValidationValues, DataValidations, Protection, Spreadsheet, Worksheet,
    };

    use super::{register_dropdown_rules, restore_column_styles, restore_formatting};
    use crate::error::XlsxIoError;
    use crate::spec::{SpecDropdownRule, SpecTemplateSchema};

    const C_RED: &str = "FFFF0000";

    fn derive_template_book() -> Spreadsheet {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        for name in ["Template", "Add New Records", "Lists"] {
            book.new_sheet(name).expect("new sheet");
        }
        let sheet = book.get_sheet_by_name_mut("Template").expect("sheet");
        sheet.get_cell_mut((1, 1)).set_value_string("Title");

        let style = sheet.get_cell_mut((1, 3)).get_style_mut();
        style.set_background_color(C_RED);
        let mut protection = Protection::default();
        protection.set_locked(true);
        style.set_protection(protection.clone());

        let style = sheet.get_cell_mut((23, 3)).get_style_mut();
        style.set_protection(protection);
        book
    }

    fn is_locked(sheet: &Worksheet, n_col: u32, n_row: u32) -> Option<bool> {
        sheet
            .get_cell((n_col, n_row))
            .and_then(|cell| cell.get_style().get_protection())
            .map(|p| p.get_locked().to_owned())
    }

    fn has_red_fill(sheet: &Worksheet, n_col: u32, n_row: u32) -> bool {
        sheet
            .get_cell((n_col, n_row))
            .and_then(|cell| cell.get_style().get_background_color())
            .is_some_and(|color| color.get_argb() == C_RED)
    }

    #[test]
    fn styles_propagate_up_to_cap_and_editable_columns_unlock() {
        let mut book = derive_template_book();
        let sheet = book.get_sheet_by_name_mut("Template").expect("sheet");
        sheet.get_cell_mut((5, 351)).set_value_string("tail");

        let n_rows = restore_column_styles(sheet, &[22], 300).expect("restore");
        assert_eq!(n_rows, 298);

        // zero-based rows 3 and 300 are one-based rows 4 and 301
        assert!(has_red_fill(sheet, 1, 4));
        assert!(has_red_fill(sheet, 1, 301));
        assert!(!has_red_fill(sheet, 1, 302));
        assert_eq!(is_locked(sheet, 1, 150), Some(true));

        assert_eq!(is_locked(sheet, 23, 3), Some(false));
        assert_eq!(is_locked(sheet, 23, 4), Some(false));
        assert_eq!(is_locked(sheet, 23, 301), Some(false));
        assert_eq!(is_locked(sheet, 23, 302), None);
    }

    #[test]
    fn unlocked_data_cell_relocks_under_default_style_row() {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        book.new_sheet("Template").expect("new sheet");
        let sheet = book.get_sheet_by_name_mut("Template").expect("sheet");
        sheet.get_cell_mut((1, 3)).set_value_string("style row");
        let mut protection = Protection::default();
        protection.set_locked(false);
        let cell = sheet.get_cell_mut((1, 5));
        cell.set_value_string("pasted");
        cell.get_style_mut().set_protection(protection);

        restore_column_styles(sheet, &[], 300).expect("restore");
        assert_eq!(is_locked(sheet, 1, 3), None);
        assert_eq!(is_locked(sheet, 1, 4), Some(true));
        assert_eq!(is_locked(sheet, 1, 5), Some(true));
    }

    #[test]
    fn rows_above_style_row_are_untouched() {
        let mut book = derive_template_book();
        let sheet = book.get_sheet_by_name_mut("Template").expect("sheet");
        sheet.get_cell_mut((1, 10)).set_value_string("x");

        assert_eq!(restore_column_styles(sheet, &[], 300).expect("restore"), 7);
        assert!(!has_red_fill(sheet, 1, 1));
        assert!(!has_red_fill(sheet, 1, 2));
        assert!(has_red_fill(sheet, 1, 10));
    }

    #[test]
    fn dropdowns_exist_exactly_once_after_repeated_registration() {
        let mut book = derive_template_book();
        let schema = SpecTemplateSchema::default();

        register_dropdown_rules(&mut book, &schema.dropdowns).expect("first");
        let n_replaced = register_dropdown_rules(&mut book, &schema.dropdowns).expect("second");
        assert_eq!(n_replaced, 6);

        let sheet = book.get_sheet_by_name("Template").expect("sheet");
        let l_validations = sheet
            .get_data_validations()
            .expect("validations")
            .get_data_validation_list();
        assert_eq!(l_validations.len(), 4);
        let dv_w = l_validations
            .iter()
            .find(|dv| dv.get_sequence_of_references().get_sqref() == "W3:W301")
            .expect("W rule");
        assert_eq!(dv_w.get_formula1(), "Lists!$A$2:$A$200");

        let sheet = book.get_sheet_by_name("Add New Records").expect("sheet");
        assert_eq!(
            sheet
                .get_data_validations()
                .expect("validations")
                .get_data_validation_list()
                .len(),
            2
        );
    }

    #[test]
    fn rule_range_is_cut_out_of_multi_range_validation() {
        let mut book = derive_template_book();
        let sheet = book.get_sheet_by_name_mut("Template").expect("sheet");
        let mut dv = DataValidation::default();
        dv.set_type(DataValidationValues::List);
        dv.get_sequence_of_references_mut().set_sqref("A3:A10 $W$3:$W$301");
        dv.set_formula1("Lists!$C$2:$C$9");
        let mut dvs = DataValidations::default();
        dvs.add_data_validation_list(dv);
        sheet.set_data_validations(dvs);

        let rules = vec![SpecDropdownRule::new("Template", "W3:W301", "=Lists!$A$2:$A$200")];
        assert_eq!(register_dropdown_rules(&mut book, &rules).expect("register"), 1);

        let sheet = book.get_sheet_by_name("Template").expect("sheet");
        let l_pairs: Vec<(String, String)> = sheet
            .get_data_validations()
            .expect("validations")
            .get_data_validation_list()
            .iter()
            .map(|dv| {
                (
                    dv.get_sequence_of_references().get_sqref().to_string(),
                    dv.get_formula1().to_string(),
                )
            })
            .collect();
        assert_eq!(
            l_pairs,
            vec![
                ("A3:A10".to_string(), "Lists!$C$2:$C$9".to_string()),
                ("W3:W301".to_string(), "Lists!$A$2:$A$200".to_string()),
            ]
        );
    }

    #[test]
    fn dropdown_on_missing_sheet_is_error() {
        let mut book = umya_spreadsheet::new_file_empty_worksheet();
        book.new_sheet("Template").expect("new sheet");
        let rules = vec![SpecDropdownRule::new("Missing", "A1:A2", "=Lists!$A$1")];
        assert!(matches!(
            register_dropdown_rules(&mut book, &rules),
            Err(XlsxIoError::SheetNotFound(_))
        ));
    }

    #[test]
    fn restore_formatting_runs_both_steps() {
        let mut book = derive_template_book();
        book.get_sheet_by_name_mut("Template")
            .expect("sheet")
            .get_cell_mut((5, 5))
            .set_value_string("data");

        restore_formatting(&mut book, "Template", &[22], &SpecTemplateSchema::default())
            .expect("restore");
        let sheet = book.get_sheet_by_name("Template").expect("sheet");
        assert!(has_red_fill(sheet, 1, 5));
        assert_eq!(is_locked(sheet, 23, 5), Some(false));
        assert!(sheet.get_data_validations().is_some());
    }
}
