//! Label state derived from the titles on the page and the lanes configured for it.

use label_config::Lane;

/// One entry of the rendered sidebar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub title: String,
    /// Set exactly when `is_cyclable`, except on imitated entries where it repeats `title`.
    pub next_title: Option<String>,
    pub is_cyclable: bool,
    pub is_imitated: bool,
}

impl Label {
    /// An on-page label that belongs to no lane.
    pub fn plain(title: &str) -> Self {
        Self {
            title: title.to_owned(),
            next_title: None,
            is_cyclable: false,
            is_imitated: false,
        }
    }

    pub fn cyclable(title: &str, next_title: &str) -> Self {
        Self {
            title: title.to_owned(),
            next_title: Some(next_title.to_owned()),
            is_cyclable: true,
            is_imitated: false,
        }
    }

    /// Placeholder that adds `head` when clicked.
    pub fn imitated(head: &str) -> Self {
        Self {
            title: head.to_owned(),
            next_title: Some(head.to_owned()),
            is_cyclable: false,
            is_imitated: true,
        }
    }
}

/// Derive the sidebar entries: every on-page title in order, then one imitated entry
/// per lane that has no member on the page.
///
/// A title listed in several lanes cycles in the first of them, and only that lane counts
/// as present. A lane head that is already on the page, or already imitated, is not
/// imitated again.
pub fn derive_labels<S: AsRef<str>>(titles: &[S], lanes: &[Lane]) -> Vec<Label> {
    let mut present = vec![false; lanes.len()];
    let mut labels: Vec<Label> = titles
        .iter()
        .map(|title| {
            let title = title.as_ref();
            let hit = lanes.iter().enumerate().find_map(|(lane_index, lane)| {
                lane.next_after(title).map(|next| (lane_index, next))
            });
            match hit {
                Some((lane_index, next)) => {
                    present[lane_index] = true;
                    Label::cyclable(title, next)
                }
                None => Label::plain(title),
            }
        })
        .collect();

    for (lane, _) in lanes.iter().zip(&present).filter(|(_, is_present)| !**is_present) {
        let head = lane.head();
        let on_page = titles.iter().any(|title| title.as_ref() == head);
        let imitated = labels
            .iter()
            .any(|label| label.is_imitated && label.title == head);
        if !on_page && !imitated {
            labels.push(Label::imitated(head));
        }
    }
    labels
}

/// Titles a submission selects: every on-page label, with `prev` renamed to `next`, or
/// `next` appended when `prev` is `None`.
pub fn selected_titles(labels: &[Label], next: &str, prev: Option<&str>) -> Vec<String> {
    let mut titles: Vec<String> = labels
        .iter()
        .filter(|label| !label.is_imitated)
        .map(|label| match prev {
            Some(prev) if label.title == prev => next.to_owned(),
            _ => label.title.clone(),
        })
        .collect();
    if prev.is_none() {
        titles.push(next.to_owned());
    }
    titles
}
