//! Page-number link window

use serde::Serialize;

use super::request::PageUrl;

pub const PREVIOUS_LABEL: &str = "&laquo; Previous";
pub const NEXT_LABEL: &str = "Next &raquo;";
pub const GAP_LABEL: &str = "...";

/// Pages shown on each side of the current page
const ON_EACH_SIDE: u64 = 1;

/// Smallest run of page numbers shown when near either edge
const MIN_WINDOW: u64 = 5;

/// One entry of a paginator's link structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub url: Option<String>,
    pub label: String,
    pub active: bool,
    pub disabled: bool,
}

impl Link {
    fn page(url: &PageUrl, page: u64, current: u64) -> Self {
        Self {
            url: Some(url.with("page", &page.to_string())),
            label: page.to_string(),
            active: page == current,
            disabled: false,
        }
    }

    fn gap() -> Self {
        Self {
            url: None,
            label: GAP_LABEL.to_string(),
            active: false,
            disabled: true,
        }
    }

    fn nav(url: &PageUrl, target: Option<u64>, label: &str) -> Self {
        Self {
            url: target.map(|page| url.with("page", &page.to_string())),
            label: label.to_string(),
            active: false,
            disabled: target.is_none(),
        }
    }
}

/// Entry in the numbered part of the window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Page(u64),
    Gap,
}

/// Page numbers to display around `current`, with gaps where the run
/// does not reach the first or last page
pub fn window(current: u64, last: u64) -> Vec<Slot> {
    let last = last.max(1);
    let current = current.clamp(1, last);

    let (start, end) = if current <= ON_EACH_SIDE + 2 {
        (1, last.min(MIN_WINDOW))
    } else if current + ON_EACH_SIDE + 1 >= last {
        (last.saturating_sub(MIN_WINDOW - 1).max(1), last)
    } else {
        (current - ON_EACH_SIDE, current + ON_EACH_SIDE)
    };

    let mut slots = Vec::with_capacity((end - start + 5) as usize);
    // a gap never hides a single page
    if start > 1 {
        slots.push(Slot::Page(1));
        match start {
            3 => slots.push(Slot::Page(2)),
            s if s > 3 => slots.push(Slot::Gap),
            _ => {}
        }
    }
    slots.extend((start..=end).map(Slot::Page));
    if end < last {
        if end + 2 == last {
            slots.push(Slot::Page(last - 1));
        } else if end + 2 < last {
            slots.push(Slot::Gap);
        }
        slots.push(Slot::Page(last));
    }
    slots
}

/// Full link structure: previous, numbered window, next
pub fn build(url: &PageUrl, current: u64, last: u64) -> Vec<Link> {
    let previous = (current > 1).then(|| current - 1);
    let next = (current < last).then(|| current + 1);

    let mut links = vec![Link::nav(url, previous, PREVIOUS_LABEL)];
    links.extend(window(current, last).into_iter().map(|slot| match slot {
        Slot::Page(page) => Link::page(url, page, current),
        Slot::Gap => Link::gap(),
    }));
    links.push(Link::nav(url, next, NEXT_LABEL));
    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use Slot::{Gap, Page};

    #[test]
    fn test_small_page_count_shows_every_page() {
        assert_eq!(window(1, 1), vec![Page(1)]);
        assert_eq!(window(2, 3), vec![Page(1), Page(2), Page(3)]);
        assert_eq!(window(5, 5), vec![Page(1), Page(2), Page(3), Page(4), Page(5)]);
    }

    #[test]
    fn test_window_near_start_widens() {
        assert_eq!(
            window(1, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Gap, Page(10)]
        );
        assert_eq!(
            window(3, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Gap, Page(10)]
        );
    }

    #[test]
    fn test_window_in_the_middle_has_two_gaps() {
        assert_eq!(
            window(5, 10),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Gap, Page(10)]
        );
    }

    #[test]
    fn test_window_near_end_widens() {
        assert_eq!(
            window(10, 10),
            vec![Page(1), Gap, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
        assert_eq!(
            window(8, 10),
            vec![Page(1), Gap, Page(6), Page(7), Page(8), Page(9), Page(10)]
        );
    }

    #[test]
    fn test_adjacent_edges_need_no_gap() {
        assert_eq!(
            window(4, 7),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7)]
        );
    }

    #[test]
    fn test_prev_next_disabled_at_boundaries() {
        let url = PageUrl::parse("/users");
        let links = build(&url, 1, 3);
        assert!(links[0].disabled);
        assert_eq!(links[0].url, None);
        assert_eq!(links[1].url.as_deref(), Some("/users?page=1"));
        assert!(links[1].active);
        let next = links.last().unwrap();
        assert!(!next.disabled);
        assert_eq!(next.url.as_deref(), Some("/users?page=2"));

        let links = build(&url, 3, 3);
        assert!(!links[0].disabled);
        assert!(links.last().unwrap().disabled);
    }
}
