use chrono::{Days, NaiveDate, NaiveDateTime};

/// Two-digit years below 80 belong to the 2000s.
fn expand_year(yy: u32) -> i32 {
    if yy < 80 {
        2000 + yy as i32
    } else {
        1900 + yy as i32
    }
}

fn number(digits: &str, from: usize, to: usize) -> Option<u32> {
    digits.get(from..to)?.parse().ok()
}

/// Read a date typed as bare digits, e.g. `0110`, `11025`, `01/10/2025`.
///
/// Non-digits are dropped first; 4 to 8 digits are read positionally as
/// `DDMM`, `DMMYY` (or `DDMYY` when the month would exceed 12), `DDMMYY`,
/// `DMMYYYY` and `DDMMYYYY`. Four digits take `reference_year`. Only the day
/// (1..=31) and month (1..=12) ranges are checked; a day past the end of its
/// month rolls into the next one. The result is set at noon to survive
/// timezone shifts on the host.
pub fn parse_shorthand(input: &str, reference_year: i32) -> Option<NaiveDateTime> {
    let digits: String = input.chars().filter(|c| c.is_ascii_digit()).collect();

    let (day, month, year) = match digits.len() {
        4 => (
            number(&digits, 0, 2)?,
            number(&digits, 2, 4)?,
            reference_year,
        ),
        5 => {
            let year = expand_year(number(&digits, 3, 5)?);
            let month = number(&digits, 1, 3)?;
            if month > 12 {
                (number(&digits, 0, 2)?, number(&digits, 2, 3)?, year)
            } else {
                (number(&digits, 0, 1)?, month, year)
            }
        }
        6 => (
            number(&digits, 0, 2)?,
            number(&digits, 2, 4)?,
            expand_year(number(&digits, 4, 6)?),
        ),
        7 => (
            number(&digits, 0, 1)?,
            number(&digits, 1, 3)?,
            number(&digits, 3, 7)? as i32,
        ),
        8 => (
            number(&digits, 0, 2)?,
            number(&digits, 2, 4)?,
            number(&digits, 4, 8)? as i32,
        ),
        _ => return None,
    };

    if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
        return None;
    }

    NaiveDate::from_ymd_opt(year, month, 1)?
        .checked_add_days(Days::new(u64::from(day - 1)))?
        .and_hms_opt(12, 0, 0)
}
