//! Notification rendering

use chrono::NaiveDate;
use referral_core::dates::format_mm_dd_yyyy;
use referral_core::ReferralSummary;

use crate::types::{Attachment, ReferralEmail};

pub const SUBJECT: &str = "CCP: Auto Referral Generated!";

const INTRO: &str = "A new CCP referral has been generated and is attached as a PDF.";
const FOOTER: &str = "This email was sent automatically by the Safe Life CCP Referral system.";

/// Build the notification that carries a merged referral PDF
pub fn compose_referral_email(
    summary: &ReferralSummary,
    filename: &str,
    pdf: Vec<u8>,
    recipients: Vec<String>,
    from: &str,
    today: NaiveDate,
) -> ReferralEmail {
    let date = format_mm_dd_yyyy(today);

    let mut text = vec![
        INTRO.to_string(),
        String::new(),
        format!("Date: {}", date),
        format!("Referral Date (form): {}", summary.referral_date),
        format!("Individual: {}", summary.individual_name),
    ];
    if let Some(zip) = &summary.zip {
        text.push(format!("ZIP: {}", zip));
    }
    text.push(String::new());
    text.push(FOOTER.to_string());

    let zip_item = summary
        .zip
        .as_deref()
        .map(|zip| format!("\n      <li><strong>ZIP:</strong> {}</li>", escape_html(zip)))
        .unwrap_or_default();
    let html = format!(
        r#"<div style="font-family:Arial,Helvetica,sans-serif;line-height:1.5">
  <h2 style="margin:0 0 8px">CCP Referral Generated</h2>
  <p>{intro}</p>
  <ul>
      <li><strong>Date:</strong> {date}</li>
      <li><strong>Referral Date (form):</strong> {referral_date}</li>
      <li><strong>Individual:</strong> {name}</li>{zip_item}
  </ul>
  <p style="margin-top:12px;">{footer}</p>
</div>"#,
        intro = INTRO,
        date = date,
        referral_date = escape_html(&summary.referral_date),
        name = escape_html(&summary.individual_name),
        zip_item = zip_item,
        footer = FOOTER,
    );

    ReferralEmail {
        from: from.to_string(),
        to: recipients,
        subject: SUBJECT.to_string(),
        text: text.join("\n"),
        html,
        attachment: Attachment::pdf(filename, pdf),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            c => out.push(c),
        }
    }
    out
}
