use chrono::Local;
use watch_core::{Condition, Granularity, NotificationEvent, PriceSample};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One-line status shown on the display surface, e.g.
/// `2024-05-02 13:30:00 | 2330.TW price: 951.00 (above upper 950)`.
pub fn format_status_line(event: &NotificationEvent) -> String {
    status_line(&event.symbol, event.price, &event.condition, event.timestamp)
}

/// Same line for a sample that did not cross anything. A price taken from
/// the daily fallback also names the session it closed in.
pub fn format_sample_line(sample: &PriceSample, condition: &Condition) -> String {
    let line = status_line(&sample.symbol, sample.price, condition, chrono::Utc::now());
    match sample.granularity {
        Granularity::IntraDay => line,
        Granularity::Daily => format!(
            "{} [last close {}]",
            line,
            sample.observed_at.with_timezone(&Local).format("%Y-%m-%d")
        ),
    }
}

fn status_line(
    symbol: &str,
    price: f64,
    condition: &Condition,
    at: chrono::DateTime<chrono::Utc>,
) -> String {
    format!(
        "{} | {} price: {:.2} ({})",
        at.with_timezone(&Local).format(TIME_FORMAT),
        symbol,
        price,
        condition
    )
}

pub struct EmailTemplate;

impl EmailTemplate {
    pub fn subject(event: &NotificationEvent) -> String {
        format!(
            "[Price Watch] {} {} @ {:.2}",
            event.symbol, event.condition, event.price
        )
    }

    /// Plain-text body: one labelled field per line.
    pub fn render(event: &NotificationEvent) -> String {
        let banner = match event.condition {
            Condition::AboveUpper(_) => "ABOVE UPPER BOUND",
            Condition::BelowLower(_) => "BELOW LOWER BOUND",
            Condition::Normal => "NORMAL",
        };

        format!(
            "{banner}: {symbol}\n\n\
             Time:      {ts}\n\
             Symbol:    {symbol}\n\
             Price:     {price:.2}\n\
             Condition: {condition}\n\n\
             -- \nPrice Watch\n",
            symbol = event.symbol,
            price = event.price,
            condition = event.condition,
            ts = event.timestamp.with_timezone(&Local).format(TIME_FORMAT),
        )
    }
}
