//! Outline (grouping) metadata in both directions.
//!
//! A group is a maximal run of consecutive headers whose outline level is at least the group
//! level. The header carrying the `collapsed` flag sits right after the group when the summary
//! is placed after it (`summaryBelow`/`summaryRight`, the default) and right before it otherwise.

use std::collections::BTreeMap;

use tabula_model::HeaderGroup;

use crate::extraction::records::{XlsxHeader, XlsxOutlineGroup};

pub fn groups_from_headers(headers: &[XlsxHeader], summary_after: bool) -> Vec<XlsxOutlineGroup> {
    let by_index: BTreeMap<u32, &XlsxHeader> = headers.iter().map(|h| (h.index, h)).collect();
    let collapsed_at = |index: Option<u32>| {
        index
            .and_then(|i| by_index.get(&i))
            .is_some_and(|h| h.collapsed)
    };
    let max_level = headers.iter().map(|h| h.outline_level).max().unwrap_or(0);

    let mut groups = Vec::new();
    for level in 1..=max_level {
        let mut run: Option<(u32, u32)> = None;
        let members = by_index
            .values()
            .filter(|h| h.outline_level >= level)
            .map(|h| h.index);
        let mut runs = Vec::new();
        for index in members {
            run = match run {
                Some((start, end)) if index == end + 1 => Some((start, index)),
                Some(done) => {
                    runs.push(done);
                    Some((index, index))
                }
                None => Some((index, index)),
            };
        }
        runs.extend(run);
        for (start, end) in runs {
            let summary = if summary_after {
                end.checked_add(1)
            } else {
                start.checked_sub(1)
            };
            groups.push(XlsxOutlineGroup {
                start,
                end,
                collapsed: collapsed_at(summary),
            });
        }
    }
    groups
}

pub fn convert_groups(groups: &[XlsxOutlineGroup]) -> Vec<HeaderGroup> {
    groups
        .iter()
        .map(|g| HeaderGroup {
            start: g.start,
            end: g.end,
            is_folded: g.collapsed,
        })
        .collect()
}

/// Outline attributes of one exported header.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutlineAttrs {
    pub level: u32,
    pub collapsed: bool,
    pub hidden: bool,
}

/// Inverse of [`groups_from_headers`], with the summary placed after each group.
pub fn headers_from_groups(groups: &[HeaderGroup]) -> BTreeMap<u32, OutlineAttrs> {
    let mut headers: BTreeMap<u32, OutlineAttrs> = BTreeMap::new();
    for group in groups {
        for index in group.start..=group.end {
            let attrs = headers.entry(index).or_default();
            attrs.level += 1;
            attrs.hidden |= group.is_folded;
        }
        if group.is_folded {
            headers.entry(group.end + 1).or_default().collapsed = true;
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn header(index: u32, level: u32, collapsed: bool) -> XlsxHeader {
        XlsxHeader {
            index,
            outline_level: level,
            collapsed,
            ..Default::default()
        }
    }

    #[test]
    fn nested_groups_with_summary_after() {
        let headers = vec![
            header(1, 1, false),
            header(2, 2, false),
            header(3, 2, false),
            header(4, 1, false),
            header(5, 0, true),
            header(7, 1, false),
            header(8, 0, false),
        ];
        let groups = groups_from_headers(&headers, true);
        assert_eq!(
            groups,
            vec![
                XlsxOutlineGroup { start: 1, end: 4, collapsed: true },
                XlsxOutlineGroup { start: 7, end: 7, collapsed: false },
                XlsxOutlineGroup { start: 2, end: 3, collapsed: false },
            ]
        );
    }

    #[test]
    fn summary_before_reads_the_preceding_header() {
        let headers = vec![header(0, 0, true), header(1, 1, false), header(2, 1, false)];
        let groups = groups_from_headers(&headers, false);
        assert_eq!(groups, vec![XlsxOutlineGroup { start: 1, end: 2, collapsed: true }]);
        assert!(!groups_from_headers(&headers, true)[0].collapsed);
    }

    #[test]
    fn export_levels_invert_import() {
        let groups = vec![
            HeaderGroup { start: 1, end: 4, is_folded: true },
            HeaderGroup { start: 2, end: 3, is_folded: false },
        ];
        let attrs = headers_from_groups(&groups);
        assert_eq!(attrs[&2], OutlineAttrs { level: 2, collapsed: false, hidden: true });
        assert_eq!(attrs[&5], OutlineAttrs { level: 0, collapsed: true, hidden: false });

        let headers: Vec<XlsxHeader> = attrs
            .iter()
            .map(|(i, a)| header(*i, a.level, a.collapsed))
            .collect();
        let back = convert_groups(&groups_from_headers(&headers, true));
        assert_eq!(back, groups);
    }
}
