//! Owned snapshot of a page, extracted once when the page is loaded into a tab.
//!
//! `scraper::Html` is not `Send`, so parsing happens synchronously and only the
//! extracted data is kept; nothing here is held across an await.

use scraper::{ElementRef, Html, Selector};

use crate::autofill::field_mapper::{FieldKind, FormInput};
use crate::models::job::JobPosting;

/// Upper bound on description text taken from the page body.
pub const BODY_TEXT_LIMIT: usize = 5000;

const TITLE_SELECTORS: &[&str] = &["h1", "[class*=\"job-title\"]", "title"];
const COMPANY_SELECTORS: &[&str] = &["[class*=\"company\"]", "[class*=\"employer\"]"];
const DESCRIPTION_SELECTORS: &[&str] = &["[class*=\"description\"]", "[class*=\"job-details\"]"];
const APPLICATION_MARKERS: &[&str] = &[
    "form[class*=\"application\"]",
    "input[name*=\"resume\"]",
    "input[type=\"file\"]",
];

#[derive(Debug, Clone, Default)]
pub struct PageDocument {
    pub url: String,
    pub job: JobPosting,
    /// Fillable inputs in document order. Indices in a `FillPlan` refer to this list.
    pub inputs: Vec<FormInput>,
    pub has_application_markers: bool,
}

impl PageDocument {
    pub fn parse(url: &str, html: &str) -> Self {
        let document = Html::parse_document(html);

        let title = first_text(&document, TITLE_SELECTORS).unwrap_or_default();
        let company = first_text(&document, COMPANY_SELECTORS).unwrap_or_default();
        let description = first_text(&document, DESCRIPTION_SELECTORS)
            .unwrap_or_else(|| body_text(&document, BODY_TEXT_LIMIT));

        Self {
            url: url.to_string(),
            job: JobPosting {
                title,
                company,
                description,
                url: url.to_string(),
            },
            inputs: form_inputs(&document),
            has_application_markers: APPLICATION_MARKERS
                .iter()
                .filter_map(|s| Selector::parse(s).ok())
                .any(|selector| document.select(&selector).next().is_some()),
        }
    }

    /// True when the page looks like an application form rather than a listing.
    pub fn is_application_page(&self) -> bool {
        let url = self.url.to_lowercase();
        url.contains("apply") || url.contains("application") || self.has_application_markers
    }

    /// The job this page describes, if it yielded anything usable.
    pub fn job_posting(&self) -> Option<&JobPosting> {
        let job = &self.job;
        if job.title.is_empty() && job.company.is_empty() && job.description.is_empty() {
            None
        } else {
            Some(job)
        }
    }
}

/// Text of the first element, across the selectors in order, whose collapsed
/// text is non-empty.
fn first_text(document: &Html, selectors: &[&str]) -> Option<String> {
    selectors
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|selector| {
            document
                .select(&selector)
                .map(|el| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
                .find(|text| !text.is_empty())
        })
}

fn body_text(document: &Html, limit: usize) -> String {
    let Ok(selector) = Selector::parse("body") else {
        return String::new();
    };
    let Some(body) = document.select(&selector).next() else {
        return String::new();
    };

    let mut raw = String::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        // Skip script and style contents; they are not visible text.
        let hidden = node
            .parent()
            .and_then(|p| p.value().as_element())
            .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"));
        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }
    collapse_whitespace(&raw).chars().take(limit).collect()
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn form_inputs(document: &Html) -> Vec<FormInput> {
    let Ok(selector) = Selector::parse("input, textarea") else {
        return Vec::new();
    };
    document.select(&selector).filter_map(classify).collect()
}

fn classify(element: ElementRef<'_>) -> Option<FormInput> {
    let el = element.value();
    let kind = if el.name() == "textarea" {
        FieldKind::LongText
    } else {
        match el.attr("type").map(|t| t.trim().to_lowercase()).as_deref() {
            None | Some("") | Some("text") | Some("email") | Some("tel") => FieldKind::ShortText,
            Some("file") => FieldKind::File,
            _ => return None,
        }
    };

    let candidates: &[&str] = match kind {
        FieldKind::File => &["name", "id"],
        _ => &["name", "id", "placeholder"],
    };
    let descriptor = candidates
        .iter()
        .filter_map(|attr| el.attr(attr))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .unwrap_or("");

    Some(FormInput::new(descriptor, kind))
}
