use std::fmt::Write as _;

use chrono::NaiveDateTime;

use crate::{
    config::RenderSettings,
    error::LookupError,
    types::{LineItemEntry, MatchResult, PaymentMethod, TransactionRecord},
};

const STORED_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders matched orders as the sidebar HTML fragment, in the given order.
pub fn render_report(result: &MatchResult, settings: &RenderSettings) -> String {
    if result.is_empty() {
        return escape_html(&LookupError::NoMatchFound.to_string());
    }

    let mut output = String::new();
    if result.fuzzy {
        output.push_str("<p>Matches based on customer name:</p>");
    }
    for record in &result.records {
        render_order(&mut output, record, result.fuzzy, settings);
    }
    output
}

fn render_order(
    output: &mut String,
    record: &TransactionRecord,
    fuzzy: bool,
    settings: &RenderSettings,
) {
    output.push_str(&format!(
        "<strong><i class=\"icon-cart\"></i> <a target=\"_blank\" href=\"{}\">#{}</a></strong>",
        escape_html(&order_url(settings, record.id)),
        record.id
    ));
    if !record.is_completed() {
        output.push_str(&format!(
            " - <span style=\"color:orange;font-weight:bold;\">{}</span>",
            escape_html(&record.status)
        ));
    }

    output.push_str(&format!(
        "<p><span class=\"muted\">{}</span><br/>",
        escape_html(&format_date(&record.created_at, &settings.date_format))
    ));
    if fuzzy {
        output.push_str(&format!(
            "{}<br/>{}<br/>",
            escape_html(&record.customer_name),
            escape_html(&record.customer_email)
        ));
    }
    let payment = match &record.payment {
        Some(payment) => payment_markup(payment),
        None => escape_html(&record.gateway),
    };
    output.push_str(&format!("${:.2} - {payment}</p>", record.amount));

    output.push_str(&format!(
        "<p><i class=\"icon-pointer\"></i><a target=\"_blank\" href=\"{}\">Resend Purchase Receipt</a></p>",
        escape_html(&resend_receipt_url(settings, record.id))
    ));

    output.push_str("<ul>");
    for item in &record.items {
        output.push_str(&format!("<li>{}</li>", line_item_markup(item)));
    }
    output.push_str("</ul>");
}

fn payment_markup(payment: &PaymentMethod) -> String {
    match &payment.link {
        Some(link) => format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            escape_html(link),
            escape_html(&payment.label)
        ),
        None => escape_html(&payment.label),
    }
}

fn line_item_markup(item: &LineItemEntry) -> String {
    let mut markup = format!("<strong>{}</strong><br/>", escape_html(&item.title));
    if item.licensed {
        if let Some(label) = &item.price_label {
            markup.push_str(&format!("{}<br/>", escape_html(label)));
        }
        if let Some(key) = &item.license_key {
            markup.push_str(&format!("{}<br/>", escape_html(key)));
        }
        markup.push_str("<br/>");
    }
    markup
}

pub fn order_url(settings: &RenderSettings, order_id: i64) -> String {
    format!(
        "{}edit.php?post_type=download&page=edd-payment-history&view=view-order-details&id={order_id}",
        settings.admin_url
    )
}

pub fn resend_receipt_url(settings: &RenderSettings, order_id: i64) -> String {
    format!(
        "{}edit.php?post_type=download&page=edd-payment-history&edd-action=email_links&purchase_id={order_id}",
        settings.admin_url
    )
}

/// Formats a stored `YYYY-MM-DD HH:MM:SS` date; anything else is shown as is.
fn format_date(raw: &str, pattern: &str) -> String {
    let Ok(parsed) = NaiveDateTime::parse_from_str(raw.trim(), STORED_DATE_FORMAT) else {
        return raw.to_string();
    };
    let mut formatted = String::new();
    match write!(formatted, "{}", parsed.format(pattern)) {
        Ok(()) => formatted,
        Err(_) => raw.to_string(),
    }
}

pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PurchasedItem;

    fn record(status: &str) -> TransactionRecord {
        TransactionRecord {
            id: 42,
            status: status.to_string(),
            created_at: "2024-03-05 14:07:00".to_string(),
            amount: 49.5,
            gateway: "manual".to_string(),
            customer_name: "Jane <Doe>".to_string(),
            customer_email: "jane@example.com".to_string(),
            purchased: vec![PurchasedItem::Legacy(1)],
            payment: None,
            items: vec![
                LineItemEntry {
                    product_id: 1,
                    title: "Plugin".to_string(),
                    licensed: true,
                    price_label: Some("Personal".to_string()),
                    license_key: Some("KEY-1".to_string()),
                },
                LineItemEntry {
                    product_id: 2,
                    title: "E-book".to_string(),
                    licensed: false,
                    price_label: None,
                    license_key: None,
                },
            ],
        }
    }

    fn settings() -> RenderSettings {
        RenderSettings {
            admin_url: "https://shop.test/wp-admin/".to_string(),
            date_format: "%Y-%m-%d".to_string(),
        }
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn empty_result_renders_no_match_message() {
        assert_eq!(
            render_report(&MatchResult::default(), &settings()),
            "No license data found."
        );
    }

    #[test]
    fn completed_order_is_not_highlighted() {
        let html = render_report(
            &MatchResult {
                records: vec![record("publish")],
                fuzzy: false,
            },
            &settings(),
        );

        assert!(!html.contains("color:orange"));
        assert!(!html.contains("Matches based on customer name"));
        assert!(!html.contains("jane@example.com"));
        assert!(html.contains(">#42</a>"));
        assert!(html.contains("2024-03-05"));
        assert!(html.contains("$49.50 - manual</p>"));
        assert!(html.contains(
            "<li><strong>Plugin</strong><br/>Personal<br/>KEY-1<br/><br/></li>\
             <li><strong>E-book</strong><br/></li>"
        ));
        assert!(html.contains(
            "edit.php?post_type=download&amp;page=edd-payment-history&amp;edd-action=email_links&amp;purchase_id=42"
        ));
    }

    #[test]
    fn refunded_fuzzy_order_shows_status_and_customer() {
        let html = render_report(
            &MatchResult {
                records: vec![record("refunded")],
                fuzzy: true,
            },
            &settings(),
        );

        assert!(html.starts_with("<p>Matches based on customer name:</p>"));
        assert!(html.contains("<span style=\"color:orange;font-weight:bold;\">refunded</span>"));
        assert!(html.contains("Jane &lt;Doe&gt;<br/>jane@example.com<br/>"));
    }

    #[test]
    fn unparseable_date_is_shown_raw() {
        assert_eq!(format_date("yesterday", "%Y"), "yesterday");
        assert_eq!(
            format_date("2024-03-05 14:07:00", "%B %-d, %Y, %-I:%M %p"),
            "March 5, 2024, 2:07 PM"
        );
    }
}
