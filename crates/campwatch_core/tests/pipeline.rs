use campwatch_core::{
    decompose, extract_page, render_html, render_text, should_continue, DigestBuilder, GroupScan,
    Page, Row, SearchCriteria,
};
use chrono::{NaiveDate, Weekday};
use pretty_assertions::assert_eq;

const ALL_DAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn d(m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, m, day).unwrap()
}

/// Page showing `first..=last` of March 2024, with `site` available on `days`.
fn march_page(first: u32, last: u32, site: &str, days: &[u32]) -> Page {
    let day_labels: Vec<String> = (first..=last).map(|day| day.to_string()).collect();
    let available: Vec<usize> = days.iter().map(|day| (day - first) as usize).collect();
    Page {
        header_label: "MAR 2024".into(),
        rows: vec![Row::new(site)
            .in_group("Oceanside")
            .with_available(day_labels.len(), &available)],
        day_labels,
    }
}

fn scan_pages(criteria: &SearchCriteria, pages: &[Page]) -> campwatch_core::GroupResult {
    campwatch_logging::initialize_for_tests();
    let mut scan = GroupScan::new("Oceanside", criteria.min_length());
    for page in pages {
        let extract = extract_page(page, "Oceanside", criteria).unwrap();
        let window_end = extract.window_end;
        scan.ingest(extract);
        if !should_continue(window_end, criteria.stop()) {
            break;
        }
    }
    scan.finish()
}

#[test]
fn qualifying_runs_survive_page_boundaries() {
    let criteria = SearchCriteria::new(["Oceanside"], ALL_DAYS, d(3, 1), d(3, 14), 2).unwrap();
    let pages = [
        march_page(1, 5, "G5", &[1, 4, 5]),
        march_page(6, 10, "G5", &[6, 8, 9]),
        march_page(11, 15, "G5", &[11]),
    ];

    let result = scan_pages(&criteria, &pages);
    assert_eq!(result.pages, 3);
    assert_eq!(
        result.sites[0].dates.iter().copied().collect::<Vec<_>>(),
        vec![d(3, 4), d(3, 5), d(3, 6), d(3, 8), d(3, 9)]
    );

    let groups = decompose(result.sites[0].dates.iter().copied());
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].band, 0);
    assert_eq!(groups[1].band, 1);
    assert_eq!(groups[0].end, d(3, 6));
    assert_eq!(groups[1].start, d(3, 8));
}

#[test]
fn pagination_stops_once_window_reaches_stop() {
    let criteria = SearchCriteria::new(["Oceanside"], ALL_DAYS, d(3, 1), d(3, 10), 1).unwrap();
    let pages = [
        march_page(1, 5, "G5", &[2]),
        march_page(6, 10, "G5", &[7]),
        march_page(11, 15, "G5", &[12]),
    ];
    let result = scan_pages(&criteria, &pages);
    assert_eq!(result.pages, 2);
}

#[test]
fn digest_renders_text_and_html() {
    let criteria = SearchCriteria::new(
        ["Oceanside"],
        [Weekday::Fri, Weekday::Sat, Weekday::Sun],
        d(3, 1),
        d(3, 31),
        2,
    )
    .unwrap();
    let mut page = march_page(8, 14, "G5", &[8, 9, 10, 11]);
    page.rows[0].link = Some("https://example.com/site?id=1&loop=2".into());

    let mut builder = DigestBuilder::new(criteria.clone());
    builder.merge_group(scan_pages(&criteria, &[page]));
    let digest = builder.finish();

    assert_eq!(
        render_text(&digest),
        vec!["Site #G5 in facility area 'Oceanside' available on dates: 2024-03-08; 2024-03-09; 2024-03-10;".to_string()]
    );
    let html = render_html(&digest);
    assert!(html.contains("<a href=\"https://example.com/site?id=1&amp;loop=2\">G5</a>"));
    assert!(html.contains("Fri 3/8 - Sun 3/10"));
    assert!(!html.contains("3/11"));
}

#[test]
fn empty_digest_renders_nothing_found() {
    let criteria = SearchCriteria::new(["Oceanside"], ALL_DAYS, d(3, 1), d(3, 5), 3).unwrap();
    let mut builder = DigestBuilder::new(criteria.clone());
    builder.merge_group(scan_pages(&criteria, &[march_page(1, 5, "G5", &[1, 3, 5])]));
    let digest = builder.finish();

    assert!(digest.nothing_found());
    assert_eq!(render_text(&digest), vec!["Nothing found.".to_string()]);
    assert!(render_html(&digest).contains("<p>Nothing found</p>"));
}
