//! Options trade record built from one row of an order-flow export.
//!
//! All parsing, unit normalisation and derived fields (moneyness, days to
//! expiry) happen once in [`Trade::from_fields`]. Equality and hashing use the
//! identity tuple returned by [`Trade::identity`], which is what collapses
//! overlapping exports during loading.

use crate::domain::error::RecordError;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

/// Number of fields in an export row.
pub const FIELD_COUNT: usize = 15;

/// Sentinel the exporter writes when it loses the trade time.
pub const UNDEFINED_TIME: &str = "undefined";

/// Time of day substituted for [`UNDEFINED_TIME`].
pub const DEFAULT_TIME: &str = "9:00:00";

const AT_THE_MONEY_BAND: Decimal = dec!(0.05);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionSide {
    Call,
    Put,
}

impl OptionSide {
    pub fn parse(raw: &str) -> Result<Self, RecordError> {
        match raw.to_ascii_uppercase().as_str() {
            "CALLS" | "CALL" | "C" => Ok(OptionSide::Call),
            "PUTS" | "PUT" | "P" => Ok(OptionSide::Put),
            _ => Err(RecordError::invalid(
                "call/put flag",
                raw,
                "expected CALLS or PUTS",
            )),
        }
    }

    /// Lower-case suffix used in group labels.
    pub fn label_suffix(self) -> char {
        match self {
            OptionSide::Call => 'c',
            OptionSide::Put => 'p',
        }
    }
}

#[derive(Debug, Clone)]
pub struct Trade {
    pub date: NaiveDate,
    /// Time-of-day text as exported, after the undefined-time substitution.
    pub time: String,
    pub placed_at: NaiveDateTime,
    pub ticker: String,
    pub expiry: NaiveDate,
    pub strike: Decimal,
    pub side: OptionSide,
    pub spot: Decimal,
    pub quantity: i64,
    pub price: Decimal,
    pub trade_type: String,
    pub volume: i64,
    pub open_interest: i64,
    pub premium: i64,
    pub sector: String,
    pub is_unusual: bool,

    /// Expiry (midnight) minus placement time.
    pub days_to_expiry: TimeDelta,
    /// Negative when in the money.
    pub percent_otm: Decimal,
    pub is_at_the_money: bool,
    pub is_in_the_money: bool,
    pub is_out_of_the_money: bool,
}

/// Fields that identify a trade (not a contract) across exports.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TradeKey<'a> {
    pub date: NaiveDate,
    pub time: &'a str,
    pub ticker: &'a str,
    pub price: Decimal,
    pub expiry: NaiveDate,
    pub side: OptionSide,
    pub spot: Decimal,
    pub quantity: i64,
    pub volume: i64,
    pub premium: i64,
}

impl Trade {
    /// Build a trade from the export's fixed field order:
    /// date, time, ticker, expiry, strike, call/put, spot, quantity, price,
    /// trade type, volume, open interest, premium, sector, unusual.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, RecordError> {
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::Arity {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }
        // Text fields are taken verbatim; only the numeric parsers skip
        // surrounding whitespace.
        let field = |i: usize| fields[i].as_ref();

        let date = NaiveDate::parse_from_str(field(0), "%m/%d/%y")
            .map_err(|e| RecordError::invalid("date", field(0), e))?;

        let time = match field(1) {
            UNDEFINED_TIME => DEFAULT_TIME,
            t => t,
        };
        let time_format = if time.contains('.') {
            "%H:%M:%S%.f"
        } else {
            "%H:%M:%S"
        };
        let time_of_day = NaiveTime::parse_from_str(time, time_format)
            .map_err(|e| RecordError::invalid("time", time, e))?;
        let placed_at = date.and_time(time_of_day);

        let ticker = field(2).to_string();
        let expiry = NaiveDate::parse_from_str(field(3), "%Y-%m-%d")
            .map_err(|e| RecordError::invalid("expiry", field(3), e))?;
        let strike = parse_positive_decimal("strike", field(4))?;
        let side = OptionSide::parse(field(5))?;
        let spot = parse_positive_decimal("spot", field(6))?;
        let quantity = parse_int("quantity", field(7))?;
        let price = parse_decimal("price", field(8))?;
        let trade_type = field(9).to_string();
        let volume = parse_int("volume", field(10))?;
        let open_interest = parse_int("open interest", field(11))?;
        let premium = parse_premium(field(12))?;
        let sector = field(13).to_string();
        let is_unusual = field(14) != "FALSE";

        let days_to_expiry = expiry.and_time(NaiveTime::MIN) - placed_at;

        let ratio = match side {
            OptionSide::Call => spot.checked_div(strike),
            OptionSide::Put => strike.checked_div(spot),
        }
        .ok_or_else(|| RecordError::invalid("strike", field(4), "moneyness overflow"))?;
        let percent_otm = Decimal::ONE - ratio;

        let is_at_the_money = (-AT_THE_MONEY_BAND..=AT_THE_MONEY_BAND).contains(&percent_otm);
        let is_in_the_money = match side {
            OptionSide::Call => spot >= strike,
            OptionSide::Put => spot <= strike,
        };
        let is_out_of_the_money = percent_otm > AT_THE_MONEY_BAND;

        Ok(Trade {
            date,
            time: time.to_string(),
            placed_at,
            ticker,
            expiry,
            strike,
            side,
            spot,
            quantity,
            price,
            trade_type,
            volume,
            open_interest,
            premium,
            sector,
            is_unusual,
            days_to_expiry,
            percent_otm,
            is_at_the_money,
            is_in_the_money,
            is_out_of_the_money,
        })
    }

    pub fn identity(&self) -> TradeKey<'_> {
        TradeKey {
            date: self.date,
            time: &self.time,
            ticker: &self.ticker,
            price: self.price,
            expiry: self.expiry,
            side: self.side,
            spot: self.spot,
            quantity: self.quantity,
            volume: self.volume,
            premium: self.premium,
        }
    }

    /// Whole days to expiry, rounded towards negative infinity so that a
    /// same-day expiry placed after midnight counts as -1.
    pub fn dte_days(&self) -> i64 {
        let days = self.days_to_expiry.num_days();
        if self.days_to_expiry < TimeDelta::days(days) {
            days - 1
        } else {
            days
        }
    }

    /// e.g. `SPY $180.0p 04/24`
    pub fn contract_label(&self) -> String {
        format!(
            "{} ${}{} {}",
            self.ticker,
            format_strike(self.strike),
            self.side.label_suffix(),
            self.expiry.format("%m/%d")
        )
    }

    /// e.g. `SPY 04/24p`
    pub fn ticker_expiry_label(&self) -> String {
        format!(
            "{} {}{}",
            self.ticker,
            self.expiry.format("%m/%d"),
            self.side.label_suffix()
        )
    }

    /// Thinkorswim option symbol, e.g. `.AAPL190621C197.5`.
    pub fn tos_symbol(&self) -> String {
        let strike = if self.strike.fract().is_zero() {
            self.strike.trunc()
        } else {
            self.strike.round_dp(1)
        };
        let side = match self.side {
            OptionSide::Call => 'C',
            OptionSide::Put => 'P',
        };
        format!(
            ".{}{}{}{}",
            self.ticker,
            self.expiry.format("%y%m%d"),
            side,
            strike.normalize()
        )
    }

    pub fn minute_of_day(&self) -> i64 {
        i64::from(self.placed_at.hour() * 60 + self.placed_at.minute())
    }

    /// Three-letter weekday, e.g. `Mon`.
    pub fn day_of_week(&self) -> String {
        self.placed_at.format("%a").to_string()
    }

    pub fn day_of_month(&self) -> i64 {
        i64::from(self.placed_at.day())
    }

    pub fn month_of_year(&self) -> u32 {
        self.placed_at.month()
    }

    /// Total order over every field, used to make grouping reproducible
    /// regardless of set iteration order.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.placed_at
            .cmp(&other.placed_at)
            .then_with(|| self.ticker.cmp(&other.ticker))
            .then_with(|| self.expiry.cmp(&other.expiry))
            .then_with(|| self.side.cmp(&other.side))
            .then_with(|| self.strike.cmp(&other.strike))
            .then_with(|| self.price.cmp(&other.price))
            .then_with(|| self.spot.cmp(&other.spot))
            .then_with(|| self.quantity.cmp(&other.quantity))
            .then_with(|| self.volume.cmp(&other.volume))
            .then_with(|| self.premium.cmp(&other.premium))
            .then_with(|| self.time.cmp(&other.time))
            .then_with(|| self.trade_type.cmp(&other.trade_type))
            .then_with(|| self.open_interest.cmp(&other.open_interest))
            .then_with(|| self.sector.cmp(&other.sector))
            .then_with(|| self.is_unusual.cmp(&other.is_unusual))
    }
}

impl PartialEq for Trade {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for Trade {}

impl Hash for Trade {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

/// Strike in its natural decimal form with at least one fractional digit.
pub fn format_strike(strike: Decimal) -> String {
    let strike = strike.normalize();
    if strike.scale() == 0 {
        format!("{strike}.0")
    } else {
        strike.to_string()
    }
}

fn parse_decimal(field: &'static str, raw: &str) -> Result<Decimal, RecordError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|e| RecordError::invalid(field, raw, e))
}

fn parse_positive_decimal(field: &'static str, raw: &str) -> Result<Decimal, RecordError> {
    let value = parse_decimal(field, raw)?;
    if value <= Decimal::ZERO {
        return Err(RecordError::invalid(field, raw, "must be positive"));
    }
    Ok(value)
}

fn parse_int(field: &'static str, raw: &str) -> Result<i64, RecordError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|e| RecordError::invalid(field, raw, e))
}

/// `$1,234,567` -> 1234567
fn parse_premium(raw: &str) -> Result<i64, RecordError> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    digits
        .parse::<i64>()
        .map_err(|e| RecordError::invalid("premium", raw, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SAMPLE: [&str; FIELD_COUNT] = [
        "1/2/23",
        "9:30:00.000",
        "XYZ",
        "2023-02-17",
        "100",
        "CALLS",
        "95.0",
        "10",
        "1.20",
        "SWEEP",
        "50",
        "200",
        "$6,000",
        "Tech",
        "FALSE",
    ];

    fn with(index: usize, value: &'static str) -> [&'static str; FIELD_COUNT] {
        let mut row = SAMPLE;
        row[index] = value;
        row
    }

    #[test]
    fn parses_sample_row() {
        let trade = Trade::from_fields(&SAMPLE).unwrap();

        assert_eq!(trade.date, NaiveDate::from_ymd_opt(2023, 1, 2).unwrap());
        assert_eq!(trade.ticker, "XYZ");
        assert_eq!(trade.strike, dec!(100));
        assert_eq!(trade.side, OptionSide::Call);
        assert_eq!(trade.spot, dec!(95));
        assert_eq!(trade.quantity, 10);
        assert_eq!(trade.price, dec!(1.2));
        assert_eq!(trade.volume, 50);
        assert_eq!(trade.open_interest, 200);
        assert_eq!(trade.premium, 6000);
        assert!(!trade.is_unusual);
        assert_eq!(trade.percent_otm, dec!(0.05));
        assert!(trade.is_at_the_money);
        assert!(!trade.is_out_of_the_money);
        assert!(!trade.is_in_the_money);
    }

    #[test]
    fn construction_is_deterministic() {
        let a = Trade::from_fields(&SAMPLE).unwrap();
        let b = Trade::from_fields(&SAMPLE).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.placed_at, b.placed_at);
        assert_eq!(a.percent_otm, b.percent_otm);
    }

    #[test]
    fn undefined_time_defaults_to_nine_am() {
        let trade = Trade::from_fields(&with(1, "undefined")).unwrap();
        let expected = NaiveDate::from_ymd_opt(2023, 1, 2)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(trade.placed_at, expected);
        assert_eq!(trade.time, DEFAULT_TIME);
    }

    #[test]
    fn time_without_fraction_is_accepted() {
        let trade = Trade::from_fields(&with(1, "14:05:09")).unwrap();
        assert_eq!(trade.placed_at.hour(), 14);
        assert_eq!(trade.placed_at.minute(), 5);
        assert_eq!(trade.placed_at.second(), 9);
    }

    #[test]
    fn fractional_seconds_are_kept() {
        let trade = Trade::from_fields(&with(1, "10:15:30.250")).unwrap();
        assert_eq!(trade.placed_at.nanosecond(), 250_000_000);
    }

    #[test]
    fn unusual_is_true_for_anything_but_false() {
        assert!(Trade::from_fields(&with(14, "TRUE")).unwrap().is_unusual);
        assert!(Trade::from_fields(&with(14, "false")).unwrap().is_unusual);
        assert!(Trade::from_fields(&with(14, "")).unwrap().is_unusual);
        assert!(Trade::from_fields(&with(14, " FALSE")).unwrap().is_unusual);
        assert!(Trade::from_fields(&with(14, "FALSE ")).unwrap().is_unusual);
        assert!(!Trade::from_fields(&with(14, "FALSE")).unwrap().is_unusual);
    }

    #[test]
    fn text_fields_are_not_trimmed() {
        let padded = Trade::from_fields(&with(2, " XYZ")).unwrap();
        assert_eq!(padded.ticker, " XYZ");
        assert_ne!(padded, Trade::from_fields(&SAMPLE).unwrap());
    }

    #[test]
    fn numeric_fields_tolerate_padding() {
        let trade = Trade::from_fields(&with(10, " 50 ")).unwrap();
        assert_eq!(trade.volume, 50);
        assert_eq!(Trade::from_fields(&with(6, " 95.0")).unwrap().spot, dec!(95.0));
    }

    #[test]
    fn premium_strips_currency_formatting() {
        let trade = Trade::from_fields(&with(12, "$1,234,567")).unwrap();
        assert_eq!(trade.premium, 1_234_567);
        let trade = Trade::from_fields(&with(12, "850")).unwrap();
        assert_eq!(trade.premium, 850);
    }

    #[test]
    fn wrong_arity_fails() {
        let err = Trade::from_fields(&SAMPLE[..14]).unwrap_err();
        assert_eq!(
            err,
            RecordError::Arity {
                expected: 15,
                found: 14
            }
        );
    }

    #[test]
    fn malformed_fields_fail() {
        for (index, value) in [
            (0, "2023-01-02"),
            (1, "noon"),
            (3, "02/17/23"),
            (4, "abc"),
            (5, "STRADDLE"),
            (6, ""),
            (7, "1.5"),
            (8, "x"),
            (10, "lots"),
            (11, "?"),
            (12, "$6k"),
        ] {
            let err = Trade::from_fields(&with(index, value)).unwrap_err();
            assert!(
                matches!(err, RecordError::InvalidField { .. }),
                "field {index} = {value:?} should fail"
            );
        }
    }

    #[test]
    fn zero_strike_is_rejected() {
        let err = Trade::from_fields(&with(4, "0")).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "strike", .. }));
    }

    #[test]
    fn put_moneyness_uses_strike_over_spot() {
        // 1 - 90/100 = 0.10 -> out of the money
        let mut row = with(5, "PUTS");
        row[4] = "90";
        row[6] = "100";
        let trade = Trade::from_fields(&row).unwrap();
        assert_eq!(trade.percent_otm, dec!(0.1));
        assert!(trade.is_out_of_the_money);
        assert!(!trade.is_at_the_money);
        assert!(!trade.is_in_the_money);
    }

    #[test]
    fn deep_in_the_money_call() {
        // 1 - 120/100 = -0.2
        let trade = Trade::from_fields(&with(6, "120")).unwrap();
        assert_eq!(trade.percent_otm, dec!(-0.2));
        assert!(trade.is_in_the_money);
        assert!(!trade.is_at_the_money);
        assert!(!trade.is_out_of_the_money);
    }

    #[test]
    fn moneyness_predicates_overlap_at_the_boundary() {
        // spot == strike: at the money and in the money at once
        let trade = Trade::from_fields(&with(6, "100")).unwrap();
        assert!(trade.is_at_the_money);
        assert!(trade.is_in_the_money);
    }

    #[test]
    fn days_to_expiry_floors_partial_days() {
        // 46 days to midnight minus 9.5h
        let trade = Trade::from_fields(&SAMPLE).unwrap();
        assert_eq!(trade.dte_days(), 45);

        let same_day = Trade::from_fields(&with(3, "2023-01-02")).unwrap();
        assert_eq!(same_day.dte_days(), -1);
    }

    #[test]
    fn identity_ignores_strike_trade_type_and_sector() {
        let base = Trade::from_fields(&SAMPLE).unwrap();
        let mut row = with(4, "105");
        row[9] = "BLOCK";
        row[13] = "Energy";
        row[11] = "999";
        let other = Trade::from_fields(&row).unwrap();
        assert_eq!(base, other);

        let mut set = HashSet::new();
        set.insert(base);
        set.insert(other);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn identity_distinguishes_volume_and_time() {
        let base = Trade::from_fields(&SAMPLE).unwrap();
        assert_ne!(base, Trade::from_fields(&with(10, "51")).unwrap());
        assert_ne!(base, Trade::from_fields(&with(1, "9:30:00")).unwrap());
    }

    #[test]
    fn equivalent_decimals_share_identity() {
        let a = Trade::from_fields(&SAMPLE).unwrap();
        let b = Trade::from_fields(&with(8, "1.2")).unwrap();
        let set: HashSet<Trade> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn labels() {
        let trade = Trade::from_fields(&SAMPLE).unwrap();
        assert_eq!(trade.contract_label(), "XYZ $100.0c 02/17");
        assert_eq!(trade.ticker_expiry_label(), "XYZ 02/17c");

        let mut row = with(4, "97.50");
        row[5] = "PUTS";
        let put = Trade::from_fields(&row).unwrap();
        assert_eq!(put.contract_label(), "XYZ $97.5p 02/17");
        assert_eq!(put.ticker_expiry_label(), "XYZ 02/17p");
    }

    #[test]
    fn tos_symbol() {
        let trade = Trade::from_fields(&SAMPLE).unwrap();
        assert_eq!(trade.tos_symbol(), ".XYZ230217C100");

        let mut row = with(4, "197.5");
        row[5] = "PUTS";
        let put = Trade::from_fields(&row).unwrap();
        assert_eq!(put.tos_symbol(), ".XYZ230217P197.5");

        let odd = Trade::from_fields(&with(4, "12.25")).unwrap();
        assert_eq!(odd.tos_symbol(), ".XYZ230217C12.2");
    }

    #[test]
    fn calendar_extractions() {
        let trade = Trade::from_fields(&SAMPLE).unwrap();
        assert_eq!(trade.minute_of_day(), 9 * 60 + 30);
        assert_eq!(trade.day_of_week(), "Mon");
        assert_eq!(trade.day_of_month(), 2);
        assert_eq!(trade.month_of_year(), 1);
    }

    #[test]
    fn canonical_order_is_by_placement_first() {
        let early = Trade::from_fields(&with(1, "9:31:00")).unwrap();
        let late = Trade::from_fields(&with(1, "15:59:00")).unwrap();
        assert_eq!(early.canonical_cmp(&late), Ordering::Less);
        assert_eq!(late.canonical_cmp(&early), Ordering::Greater);
        assert_eq!(early.canonical_cmp(&early.clone()), Ordering::Equal);
    }
}
