//! Display decomposition of a finalized digest.
//!
//! Dates reaching this module have already passed the minimum-length
//! filter; grouping here is purely for presentation.

use std::fmt::Write;

use chrono::NaiveDate;

use crate::{Digest, Site};

/// Number of distinct presentation bands; group `n` uses band `n % BAND_COUNT`.
pub const BAND_COUNT: usize = 5;

pub const DIGEST_TITLE: &str = "Campsites available!";

/// A maximal run of consecutive days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateGroup {
    pub band: usize,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateGroup {
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `Fri 3/9` for one day, `Fri 3/9 - Sun 3/11` for longer groups.
    pub fn label(&self) -> String {
        if self.start == self.end {
            format_day(self.start)
        } else {
            format!("{} - {}", format_day(self.start), format_day(self.end))
        }
    }
}

/// Splits ascending dates into maximal consecutive groups. Repeated dates
/// are ignored.
pub fn decompose(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<DateGroup> {
    let mut groups: Vec<DateGroup> = Vec::new();
    for date in dates {
        if let Some(group) = groups.last_mut() {
            if group.end == date {
                continue;
            }
            if group.end.succ_opt() == Some(date) {
                group.end = date;
                continue;
            }
        }
        let band = groups.len() % BAND_COUNT;
        groups.push(DateGroup {
            band,
            start: date,
            end: date,
        });
    }
    groups
}

/// Background colour of a band in the HTML digest.
pub fn band_color(band: usize) -> (u8, u8, u8) {
    let step = ((band % BAND_COUNT) as u8 + 1) * 30;
    (102 + step, 255 - step, 204)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteView {
    pub site_id: String,
    pub group_id: String,
    pub link: Option<String>,
    pub groups: Vec<DateGroup>,
}

pub fn site_view(site: &Site) -> SiteView {
    SiteView {
        site_id: site.site_id.clone(),
        group_id: site.group_id.clone(),
        link: site.link.clone(),
        groups: decompose(site.dates.iter().copied()),
    }
}

/// One line per site, or a single "Nothing found." line.
pub fn render_text(digest: &Digest) -> Vec<String> {
    if digest.nothing_found() {
        return vec!["Nothing found.".to_string()];
    }
    digest
        .sites()
        .map(|site| {
            let mut line = format!(
                "Site #{} in facility area '{}' available on dates: ",
                site.site_id, site.group_id
            );
            for date in &site.dates {
                let _ = write!(line, "{date}; ");
            }
            line.trim_end().to_string()
        })
        .collect()
}

pub fn render_html(digest: &Digest) -> String {
    let mut html = format!("<h4 class=\"green\">{DIGEST_TITLE}</h4>");
    if digest.nothing_found() {
        html.push_str("<p>Nothing found</p>");
        return html;
    }

    const CELL: &str = "<td style=\"border: 1px solid black;\">";
    html.push_str(
        "<table style=\"border: 1px solid black;width:100%;border-collapse: collapse;\">\
         <tr style=\"color: green\"><th>Site #</th><th>Facility Area</th><th>Available dates</th></tr>",
    );
    for view in digest.sites().map(site_view) {
        let name = match &view.link {
            Some(link) => format!(
                "<a href=\"{}\">{}</a>",
                escape_html(link),
                escape_html(&view.site_id)
            ),
            None => escape_html(&view.site_id),
        };
        let _ = write!(
            html,
            "<tr>{CELL}{name}</td>{CELL}{}</td>{CELL}",
            escape_html(&view.group_id)
        );
        for group in &view.groups {
            let (r, g, b) = band_color(group.band);
            let _ = write!(
                html,
                "<span style=\"background-color: rgb({r},{g},{b});\">{}</span> ",
                group.label()
            );
        }
        html.push_str("</td></tr>");
    }
    html.push_str("</table>");
    html
}

fn format_day(date: NaiveDate) -> String {
    date.format("%a %-m/%-d").to_string()
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, day).unwrap()
    }

    #[test]
    fn two_groups_change_band_once() {
        let groups = decompose([d(3, 4), d(3, 5), d(3, 6), d(3, 8), d(3, 9)]);
        assert_eq!(
            groups,
            vec![
                DateGroup {
                    band: 0,
                    start: d(3, 4),
                    end: d(3, 6)
                },
                DateGroup {
                    band: 1,
                    start: d(3, 8),
                    end: d(3, 9)
                },
            ]
        );
        assert_eq!(groups[0].days(), 3);
    }

    #[test]
    fn bands_cycle() {
        let dates = (0..7).map(|i| d(3, 1 + 2 * i));
        let bands: Vec<usize> = decompose(dates).iter().map(|g| g.band).collect();
        assert_eq!(bands, vec![0, 1, 2, 3, 4, 0, 1]);
    }

    #[test]
    fn labels_use_weekday_and_month_day() {
        let single = decompose([d(3, 9)]);
        assert_eq!(single[0].label(), "Sat 3/9");
        let span = decompose([d(3, 8), d(3, 9), d(3, 10)]);
        assert_eq!(span[0].label(), "Fri 3/8 - Sun 3/10");
    }

    #[test]
    fn duplicates_do_not_split_groups() {
        assert_eq!(decompose([d(3, 1), d(3, 1), d(3, 2)]).len(), 1);
    }

    #[test]
    fn band_colors_stay_in_range() {
        assert_eq!(band_color(0), (132, 225, 204));
        assert_eq!(band_color(4), (252, 105, 204));
        assert_eq!(band_color(5), band_color(0));
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }
}
