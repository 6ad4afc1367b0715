use libcaixa::address::{Area, CellRef};
use libcaixa::cache::{ManualClock, MemoryCache};
use libcaixa::import::StaticSource;
use libcaixa::lookup::ReferenceKind;
use libcaixa::notify::ToastLog;
use libcaixa::paint::Color;
use libcaixa::sort::SortPreset;
use libcaixa::{Action, Book, BookError, Layout, Sheet, Value, Workbook};

use anyhow::Result;
use chrono::{NaiveDate, NaiveDateTime};
use pretty_assertions::assert_eq;

type TestBook = Book<MemoryCache<ManualClock>>;

fn at(y: i32, m: u32, d: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(12, 0, 0))
        .unwrap()
}

fn setup(ledger: Sheet, reference: Sheet) -> (TestBook, ManualClock, ToastLog) {
    let clock = ManualClock::new(at(2025, 10, 1));
    let toasts = ToastLog::new();
    let workbook = Workbook::new().with_sheet(ledger).with_sheet(reference);
    let book = Book::with_store(workbook, Layout::default(), MemoryCache::with_clock(clock.clone()))
        .with_clock(clock.clone())
        .with_notifier(toasts.clone());
    (book, clock, toasts)
}

fn ledger(book: &TestBook) -> &Sheet {
    book.workbook().sheet("LD").unwrap()
}

fn backgrounds(sheet: &Sheet, rows: u32) -> Vec<Option<Color>> {
    Area::new(1, 1, rows, 23)
        .cells()
        .map(|(row, column)| sheet.background(row, column))
        .collect()
}

#[test]
fn paint_all_colors_rows_and_clears_stale_ones() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(4, 13, Value::from("Conta"));
    sheet.set(5, 13, Value::from("Itaú"));
    sheet.set(5, 16, Value::Number(-50f64));
    sheet.set(5, 19, Value::from("Pago"));
    sheet.set(6, 13, Value::from("Caixa"));
    sheet.set(6, 16, Value::Number(20f64));
    sheet.set(6, 19, Value::from("Agendado"));
    // a note below the table, over a row colored by an earlier run
    sheet.set(9, 1, Value::from("obs"));
    sheet.set_background(Area::new(9, 1, 1, 23), Some(Color::BALANCE));

    let (mut book, _, toasts) = setup(sheet, Sheet::new("CADASTRO"));
    assert_eq!(book.paint_all()?, 2);

    let sheet = ledger(&book);
    assert_eq!(sheet.background(5, 1), Some(Color::NEGATIVE));
    assert_eq!(sheet.background(5, 5), Some(Color::NEGATIVE));
    assert_eq!(sheet.background(5, 4), Some(Color::PAID_OUTFLOW));
    assert_eq!(sheet.background(5, 16), Some(Color::PAID_OUTFLOW));
    assert_eq!(sheet.background(6, 1), Some(Color::WHITE));
    assert_eq!(sheet.background(6, 6), Some(Color::SCHEDULED));
    assert_eq!(sheet.background(6, 19), Some(Color::SCHEDULED));
    assert_eq!(sheet.background(9, 1), None);
    assert_eq!(toasts.last().map(|t| t.message), Some("Formatting applied".to_string()));

    let first = backgrounds(ledger(&book), 9);
    book.paint_all()?;
    assert_eq!(backgrounds(ledger(&book), 9), first);
    Ok(())
}

#[test]
fn paint_all_on_header_only_clears_below_header() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(4, 13, Value::from("Conta"));
    sheet.set_background(Area::cell(3, 1), Some(Color::BALANCE));
    sheet.set_background(Area::cell(7, 1), Some(Color::BALANCE));

    let (mut book, _, toasts) = setup(sheet, Sheet::new("CADASTRO"));
    assert_eq!(book.paint_all()?, 0);
    assert_eq!(ledger(&book).background(3, 1), Some(Color::BALANCE));
    assert_eq!(ledger(&book).background(7, 1), None);
    assert_eq!(
        toasts.last().map(|t| t.message),
        Some("No data to format (header only)".to_string())
    );
    Ok(())
}

#[test]
fn refresh_rewrites_matching_blocks_only() -> Result<()> {
    let mut reference = Sheet::new("CADASTRO");
    reference.set_values(
        5,
        10,
        &[vec![Value::from("ITAU-01"), Value::from("Itaú"), Value::from("Banco")]],
    );

    let mut sheet = Sheet::new("LD");
    for row in 5..=7 {
        sheet.set(row, 16, Value::Number(1f64));
    }
    sheet.set_values(5, 10, &[vec![Value::from(" ITAU-01 "), Value::from("antigo")]]);
    sheet.set_values(6, 10, &[vec![Value::from("XX"), Value::from("mantido")]]);
    sheet.set_values(7, 10, &[vec![Value::from("itau-01"), Value::from("mantido")]]);

    let (mut book, _, _) = setup(sheet, reference);
    assert_eq!(book.refresh_from_reference()?, 1);

    let sheet = ledger(&book);
    assert_eq!(
        sheet.values(Area::new(5, 10, 1, 3)),
        vec![vec![Value::from("ITAU-01"), Value::from("Itaú"), Value::from("Banco")]]
    );
    assert_eq!(sheet.get(6, 11), &Value::from("mantido"));
    assert_eq!(sheet.get(7, 11), &Value::from("mantido"));
    Ok(())
}

#[test]
fn refresh_needs_the_reference_sheet() {
    let workbook = Workbook::new().with_sheet(Sheet::new("LD"));
    let mut book = Book::new(workbook);
    let err = book.refresh_from_reference().unwrap_err();
    assert!(matches!(err.downcast_ref::<BookError>(), Some(BookError::MissingSheet(name)) if name == "CADASTRO"));
}

#[test]
fn sort_by_due_date_moves_whole_rows() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(4, 3, Value::from("Vencimento"));
    sheet.set(5, 3, Value::Date(at(2025, 10, 20)));
    sheet.set(5, 16, Value::Number(1f64));
    sheet.set(6, 16, Value::Number(2f64));
    sheet.set(7, 3, Value::Date(at(2025, 10, 5)));
    sheet.set(7, 16, Value::Number(3f64));
    sheet.set_background(Area::cell(7, 1), Some(Color::SCHEDULED));

    let (mut book, _, _) = setup(sheet, Sheet::new("CADASTRO"));
    book.sort(SortPreset::ByDueDate)?;

    let sheet = ledger(&book);
    let amounts: Vec<&Value> = (5..=7).map(|row| sheet.get(row, 16)).collect();
    assert_eq!(
        amounts,
        vec![&Value::Number(3f64), &Value::Number(1f64), &Value::Number(2f64)]
    );
    assert_eq!(sheet.background(5, 1), Some(Color::SCHEDULED));
    assert_eq!(sheet.get(4, 3), &Value::from("Vencimento"));
    Ok(())
}

#[test]
fn last_cash_row_finds_the_bottom_cash_date() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(5, 4, Value::Date(at(2025, 10, 1)));
    sheet.set(6, 4, Value::Date(at(2025, 10, 2)));
    sheet.set(7, 16, Value::Number(3f64));

    let (mut book, _, toasts) = setup(sheet, Sheet::new("CADASTRO"));
    assert_eq!(book.workbook().active(), None);
    book.run(Action::LastCashRow)?;
    assert_eq!(book.workbook().active(), Some(("LD", CellRef::new(4, 6))));
    assert!(toasts.last().unwrap().message.contains("row 6"));

    assert_eq!(book.last_cash_row()?, Some(CellRef::new(4, 6)));
    Ok(())
}

#[test]
fn last_cash_row_without_cash_dates_keeps_focus() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(5, 16, Value::Number(3f64));

    let (mut book, _, toasts) = setup(sheet, Sheet::new("CADASTRO"));
    book.workbook_mut().activate("LD", CellRef::new(16, 5));
    assert_eq!(book.last_cash_row()?, None);
    assert_eq!(book.workbook().active(), Some(("LD", CellRef::new(16, 5))));
    assert_eq!(toasts.last().map(|t| t.message), Some("No cash dates found".to_string()));
    Ok(())
}

#[test]
fn extra_highlight_ranges_follow_row_colors() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(5, 16, Value::Number(10f64));
    sheet.set(6, 16, Value::Number(5f64));
    sheet.set(6, 19, Value::from("SALDO"));
    sheet.set(7, 16, Value::Number(-1f64));
    sheet.set(8, 16, Value::Number(-2f64));

    let (mut book, _, _) = setup(sheet, Sheet::new("CADASTRO"));
    book.set_option("extra_highlight_ranges", "B6:C10, X7, Y2:Y6, H20")?;
    assert_eq!(book.paint_all()?, 4);

    let sheet = ledger(&book);
    // B6:C10 is cut at the last data row
    assert_eq!(sheet.background(6, 2), Some(Color::BALANCE));
    assert_eq!(sheet.background(6, 3), Some(Color::BALANCE));
    assert_eq!(sheet.background(7, 2), Some(Color::NEGATIVE));
    assert_eq!(sheet.background(8, 3), Some(Color::NEGATIVE));
    assert_eq!(sheet.background(9, 2), None);
    assert_eq!(sheet.background(10, 3), None);
    // outside the painted span, so only the extra range colors it
    assert_eq!(sheet.background(7, 24), Some(Color::NEGATIVE));
    assert_eq!(sheet.background(6, 24), None);
    // starting above the first data row or below the last skips the range
    assert_eq!(sheet.background(6, 25), None);
    assert_eq!(sheet.background(5, 25), None);
    assert_eq!(sheet.background(20, 8), None);
    Ok(())
}

#[test]
fn visible_total_skips_filtered_rows() -> Result<()> {
    let mut sheet = Sheet::new("LD");
    sheet.set(4, 17, Value::from("A"));
    sheet.set(5, 13, Value::from("A"));
    sheet.set(5, 16, Value::Number(100f64));
    sheet.set(6, 13, Value::from("B"));
    sheet.set(6, 16, Value::Number(50f64));
    sheet.set(7, 13, Value::from("A"));
    sheet.hide_row(6);

    let (mut book, _, _) = setup(sheet, Sheet::new("CADASTRO"));
    book.enter("LD", 7, 16, Value::from("-30"));

    let sheet = ledger(&book);
    assert_eq!(sheet.get(7, 17), &Value::Number(70f64));
    assert_eq!(sheet.get(7, 18), &Value::Number(120f64));
    assert_eq!(sheet.get(2, 15), &Value::Number(70f64));
    assert_eq!(book.visible_total()?, 70f64);
    Ok(())
}

#[test]
fn reference_reads_are_cached_until_cleared_or_expired() {
    let mut reference = Sheet::new("CADASTRO");
    reference.set_values(
        5,
        51,
        &[vec![Value::from("P-01"), Value::from("Obra"), Value::from("Cliente")]],
    );
    let (mut book, clock, _) = setup(Sheet::new("LD"), reference);
    let rename = |book: &mut TestBook, name: &str| {
        book.workbook_mut()
            .sheet_mut("CADASTRO")
            .unwrap()
            .set(5, 52, Value::from(name));
    };

    book.enter("LD", 5, 7, Value::from("P-01"));
    assert_eq!(ledger(&book).get(5, 8), &Value::from("Obra"));

    rename(&mut book, "Obra Nova");
    book.enter("LD", 6, 7, Value::from("P-01"));
    assert_eq!(ledger(&book).get(6, 8), &Value::from("Obra"));

    book.run(Action::ClearCache).unwrap();
    book.enter("LD", 7, 7, Value::from("P-01"));
    assert_eq!(ledger(&book).get(7, 8), &Value::from("Obra Nova"));

    rename(&mut book, "Obra Final");
    clock.advance(599);
    book.enter("LD", 8, 7, Value::from("P-01"));
    assert_eq!(ledger(&book).get(8, 8), &Value::from("Obra Nova"));
    clock.advance(2);
    book.enter("LD", 9, 7, Value::from("P-01"));
    assert_eq!(ledger(&book).get(9, 8), &Value::from("Obra Final"));
}

#[test]
fn import_keeps_going_after_a_failed_source() -> Result<()> {
    let remote = StaticSource::new().with_range(
        "",
        "CONTAS CONTÁBEIS!A:H",
        vec![
            vec![Value::from("Código"), Value::from("Conta")],
            vec![Value::from("1.01"), Value::from("Caixa")],
        ],
    );
    let mut reference = Sheet::new("CADASTRO");
    reference.set(5, 10, Value::from("1.01"));
    let (mut book, _, _) = setup(Sheet::new("LD"), reference);
    assert_eq!(book.reference_table(ReferenceKind::Accounts)?.len(), 1);
    assert!(!book.cache().store().is_empty());

    let report = book.import_reference(&remote)?;
    assert_eq!(report.imported, vec![(ReferenceKind::Accounts, 2)]);
    assert_eq!(report.failed.len(), 1);
    assert!(matches!(
        report.failed[0],
        BookError::Import {
            kind: ReferenceKind::Projects,
            ..
        }
    ));
    assert!(!report.is_complete());

    let reference = book.workbook().sheet("CADASTRO").unwrap();
    assert_eq!(reference.get(3, 2), &Value::from("Caixa"));
    assert!(book.cache().store().is_empty());
    Ok(())
}

#[test]
fn import_needs_the_reference_sheet() {
    let mut book = Book::new(Workbook::new().with_sheet(Sheet::new("LD")));
    assert!(book.import_reference(&StaticSource::new()).is_err());
}

#[test]
fn layout_options_retarget_the_ledger() -> Result<()> {
    let layout = Layout::from_options(
        r#"
        ; ledger kept on a renamed sheet
        option "ledger_sheet" "Lançamentos"
        option "header_row" "2"
        "#,
    )?;
    let workbook = Workbook::new().with_sheet(Sheet::new("Lançamentos"));
    let mut book = Book::with_store(workbook, layout, MemoryCache::new()).with_notifier(ToastLog::new());

    book.enter("Lançamentos", 3, 16, Value::from("-10,00"));
    let sheet = book.workbook().sheet("Lançamentos").unwrap();
    assert_eq!(sheet.background(3, 1), Some(Color::NEGATIVE));
    Ok(())
}
