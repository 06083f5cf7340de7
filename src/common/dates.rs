// src/common/dates.rs

use chrono::{Datelike, Months, NaiveDate};

/// Soma meses de calendário. O dia é ajustado para o último dia válido
/// (31/01 + 1 mês = 28/02 ou 29/02).
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

pub fn first_day_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

pub fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    add_months(first_day_of_month(date), 1)
        .pred_opt()
        .unwrap_or(date)
}

/// Lê datas no formato brasileiro `dd/mm/aaaa`.
pub fn parse_br_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d/%m/%Y").ok()
}

pub fn format_br_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_arithmetic_clamps_to_month_end() {
        assert_eq!(add_months(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months(d(2023, 11, 15), 3), d(2024, 2, 15));
        assert_eq!(last_day_of_month(d(2023, 2, 10)), d(2023, 2, 28));
        assert_eq!(last_day_of_month(d(2024, 12, 1)), d(2024, 12, 31));
        assert_eq!(first_day_of_month(d(2024, 7, 19)), d(2024, 7, 1));
    }

    #[test]
    fn brazilian_date_format() {
        assert_eq!(parse_br_date(" 05/03/2024 "), Some(d(2024, 3, 5)));
        assert_eq!(parse_br_date("2024-03-05"), None);
        assert_eq!(parse_br_date("31/02/2024"), None);
        assert_eq!(format_br_date(d(2024, 3, 5)), "05/03/2024");
    }
}
