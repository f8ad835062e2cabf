//! HTML pages
//!
//! Three pages share one minimal layout: the plan form, the outcome, and
//! the error page. Every interpolated value is escaped.

use crate::signing::Locale;

/// Plans offered on the application form
pub const PLANS: [&str; 3] = ["高速プラン", "中速プラン", "低速プラン"];

/// Escape text for HTML element content and double-quoted attributes
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

struct PageText {
    lang: &'static str,
    title: &'static str,
    apply_heading: &'static str,
    apply_lead: &'static str,
    submit: &'static str,
    done_heading: &'static str,
    error_heading: &'static str,
}

fn page_text(locale: Locale) -> PageText {
    match locale {
        Locale::Ja => PageText {
            lang: "ja",
            title: "ポケットサインターネット　お申し込みページ",
            apply_heading: "ポケットサインターネット　お申し込み",
            apply_lead: "お申し込みはこちらから",
            submit: "申し込む",
            done_heading: "ポケットサインターネット　お申し込み完了",
            error_heading: "エラー",
        },
        Locale::En => PageText {
            lang: "en",
            title: "PocketSign Internet - Application",
            apply_heading: "PocketSign Internet - Apply",
            apply_lead: "Apply here",
            submit: "Apply",
            done_heading: "PocketSign Internet - Application complete",
            error_heading: "Error",
        },
    }
}

fn layout(text: &PageText, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="{lang}">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{title}</title>
</head>
<body>
<main>
{body}
</main>
</body>
</html>
"#,
        lang = text.lang,
        title = escape(text.title),
        body = body
    )
}

/// Plan selection form posting to `/apply`
pub fn index_page(locale: Locale) -> String {
    let text = page_text(locale);
    let options: String = PLANS
        .iter()
        .map(|plan| {
            let plan = escape(plan);
            format!("<option value=\"{0}\">{0}</option>\n", plan)
        })
        .collect();

    let body = format!(
        r#"<h1>{heading}</h1>
<p>{lead}</p>
<form action="/apply" method="post">
<select name="plan">
{options}</select>
<br>
<input type="submit" value="{submit}">
</form>"#,
        heading = escape(text.apply_heading),
        lead = escape(text.apply_lead),
        options = options,
        submit = escape(text.submit)
    );
    layout(&text, &body)
}

/// Reconciled outcome; newlines in `content` are preserved
pub fn outcome_page(locale: Locale, content: &str) -> String {
    let text = page_text(locale);
    let body = format!(
        "<h1>{}</h1>\n<p style=\"white-space: pre-wrap\">{}</p>",
        escape(text.done_heading),
        escape(content)
    );
    layout(&text, &body)
}

/// Error page; the message is shown preformatted
pub fn error_page(locale: Locale, message: &str) -> String {
    let text = page_text(locale);
    let body = format!(
        "<h1>{}</h1>\n<pre>{}</pre>",
        escape(text.error_heading),
        escape(message)
    );
    layout(&text, &body)
}
