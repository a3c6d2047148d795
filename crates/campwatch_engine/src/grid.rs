//! Parses the availability grid markup into a [`Page`].
//!
//! Expected shape:
//! - period label: `.rec-month-availability-date-title`
//! - table: `table#availability-table`, day labels in `thead th span.date`
//! - rows: `tbody tr`; the row `th` names the site (optional `a[href]`),
//!   `td.rec-site-loop` tags the group, every other `td` is a date cell,
//!   available when it carries the `available` class
//! - navigation: `a.load-more[href]` reveals more rows, `a.next-page[href]`
//!   moves to the next window

use campwatch_core::{Cell, Page, Row};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::SourceError;

const LOOP_CLASS: &str = "rec-site-loop";
const AVAILABLE_CLASS: &str = "available";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridPage {
    pub page: Page,
    pub load_more: Option<Url>,
    pub next_page: Option<Url>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoreRows {
    pub rows: Vec<Row>,
    pub load_more: Option<Url>,
}

/// Parses a full grid page. Relative links resolve against `base`.
pub fn parse_grid(html: &str, base: &Url) -> Result<GridPage, SourceError> {
    let doc = Html::parse_document(html);

    let header_label = doc
        .select(&selector(".rec-month-availability-date-title")?)
        .next()
        .map(collapsed_text)
        .filter(|label| !label.is_empty())
        .ok_or_else(|| SourceError::Structure("period label missing".into()))?;

    let table = doc
        .select(&selector("table#availability-table")?)
        .next()
        .ok_or_else(|| SourceError::Structure("availability table missing".into()))?;

    let day_labels = table
        .select(&selector("thead th span.date")?)
        .map(collapsed_text)
        .collect::<Vec<_>>();
    if day_labels.is_empty() {
        return Err(SourceError::Structure("availability table has no date columns".into()));
    }

    Ok(GridPage {
        page: Page {
            header_label,
            day_labels,
            rows: parse_rows(table, base)?,
        },
        load_more: find_link(&doc, "a.load-more[href]", base)?,
        next_page: find_link(&doc, "a.next-page[href]", base)?,
    })
}

/// Parses the response of a "load more" request: further rows for the
/// window already on screen.
pub fn parse_more_rows(html: &str, base: &Url) -> Result<MoreRows, SourceError> {
    let doc = Html::parse_document(html);
    Ok(MoreRows {
        rows: parse_rows(doc.root_element(), base)?,
        load_more: find_link(&doc, "a.load-more[href]", base)?,
    })
}

fn parse_rows(scope: ElementRef<'_>, base: &Url) -> Result<Vec<Row>, SourceError> {
    let row_sel = selector("tbody tr")?;
    let th_sel = selector("th")?;
    let link_sel = selector("a[href]")?;

    let mut rows = Vec::new();
    for tr in scope.select(&row_sel) {
        let Some(th) = tr.select(&th_sel).next() else {
            continue;
        };
        let site_id = collapsed_text(th);
        if site_id.is_empty() {
            continue;
        }

        let mut row = Row::new(site_id);
        row.link = first_link(th, &link_sel, base);

        let tds = tr
            .children()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().name() == "td");
        for td in tds {
            if has_class(td, LOOP_CLASS) {
                row.group = Some(collapsed_text(td));
                continue;
            }
            row.cells.push(Cell {
                column: row.cells.len(),
                available: has_class(td, AVAILABLE_CLASS),
                link: first_link(td, &link_sel, base),
            });
        }
        rows.push(row);
    }
    Ok(rows)
}

fn selector(css: &'static str) -> Result<Selector, SourceError> {
    Selector::parse(css).map_err(|err| SourceError::Structure(format!("selector {css}: {err}")))
}

fn has_class(el: ElementRef<'_>, class: &str) -> bool {
    el.value().classes().any(|c| c == class)
}

fn collapsed_text(el: ElementRef<'_>) -> String {
    el.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn first_link(scope: ElementRef<'_>, link_sel: &Selector, base: &Url) -> Option<String> {
    scope
        .select(link_sel)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve(href, base))
        .map(|url| url.to_string())
}

fn find_link(doc: &Html, css: &'static str, base: &Url) -> Result<Option<Url>, SourceError> {
    Ok(doc
        .select(&selector(css)?)
        .filter_map(|a| a.value().attr("href"))
        .find_map(|href| resolve(href, base)))
}

fn resolve(href: &str, base: &Url) -> Option<Url> {
    let trimmed = href.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("javascript:") {
        return None;
    }
    base.join(trimmed).ok()
}
