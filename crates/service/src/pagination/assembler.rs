//! Turns one fetched window into a page, and a page into the cursors of
//! its neighbours.

use model::{
    pagination::{Cursor, Ordering, Page},
    records::row::RowData,
};

/// Projects `row` onto the ordering's fields, in ordering order.
pub fn position_of(row: &RowData, ordering: &Ordering) -> Vec<String> {
    ordering
        .fields()
        .iter()
        .map(|order| row.get_value(&order.field).to_position_string())
        .collect()
}

/// Builds a page from `rows`, fetched with a limit of `page_size + 1` in
/// query order (reversed when `cursor.reverse` is set).
///
/// The extra row only tells whether something follows the page; its
/// position becomes the marker in the direction of travel. Backward pages
/// are restored to natural order.
pub fn assemble(
    mut rows: Vec<RowData>,
    page_size: usize,
    cursor: &Cursor,
    ordering: &Ordering,
) -> Page<RowData> {
    let following = rows.get(page_size).map(|row| position_of(row, ordering));
    let has_following = following.is_some();
    rows.truncate(page_size);

    let prior_set = cursor.position.is_some() || cursor.offset > 0;
    let prior = if prior_set {
        cursor.position.clone()
    } else {
        None
    };

    if cursor.reverse {
        rows.reverse();
        Page {
            items: rows,
            has_next: prior_set,
            has_previous: has_following,
            next_position: prior,
            previous_position: following,
        }
    } else {
        Page {
            items: rows,
            has_next: has_following,
            has_previous: prior_set,
            next_position: following,
            previous_position: prior,
        }
    }
}

/// Cursor for the page after `page`, or `None` on the last page.
///
/// The marker is the last row whose position differs from the row after
/// it; rows sharing that position are skipped with the cursor offset.
pub fn next_cursor(
    page: &Page<RowData>,
    ordering: &Ordering,
    cursor: &Cursor,
    page_size: u64,
) -> Option<Cursor> {
    if !page.has_next {
        return None;
    }

    let positions: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|row| position_of(row, ordering))
        .collect();

    // After a backward page reached with an offset, the cursor position
    // lies beyond rows that were skipped, so the last row is compared
    // against instead.
    let compare = match positions.last() {
        Some(last) if cursor.reverse && cursor.offset > 0 => Some(last.clone()),
        _ => page.next_position.clone(),
    };
    let marker = find_marker(positions.iter().rev(), compare);

    let (offset, position) = if positions.is_empty() {
        (0, page.next_position.clone())
    } else if let Some((offset, position)) = marker {
        (offset, Some(position))
    } else if !page.has_previous {
        // First page, no usable position: skip the whole page.
        (page_size, None)
    } else if cursor.reverse {
        (0, page.previous_position.clone())
    } else {
        (
            cursor.offset.saturating_add(page_size),
            page.previous_position.clone(),
        )
    };

    Some(Cursor::new(offset, false, position))
}

/// Cursor for the page before `page`, or `None` on the first page.
pub fn previous_cursor(
    page: &Page<RowData>,
    ordering: &Ordering,
    cursor: &Cursor,
    page_size: u64,
) -> Option<Cursor> {
    if !page.has_previous {
        return None;
    }

    let positions: Vec<Vec<String>> = page
        .items
        .iter()
        .map(|row| position_of(row, ordering))
        .collect();

    let compare = match positions.first() {
        Some(first) if !cursor.reverse && cursor.offset > 0 => Some(first.clone()),
        _ => page.previous_position.clone(),
    };
    let marker = find_marker(positions.iter(), compare);

    let (offset, position) = if positions.is_empty() {
        (0, page.previous_position.clone())
    } else if let Some((offset, position)) = marker {
        (offset, Some(position))
    } else if !page.has_next {
        (page_size, None)
    } else if cursor.reverse {
        (
            cursor.offset.saturating_add(page_size),
            page.next_position.clone(),
        )
    } else {
        (0, page.next_position.clone())
    };

    Some(Cursor::new(offset, true, position))
}

// Walks `positions` until one differs from its predecessor (starting with
// `compare`). Returns that position and how many rows were passed.
fn find_marker<'a, I>(positions: I, mut compare: Option<Vec<String>>) -> Option<(u64, Vec<String>)>
where
    I: Iterator<Item = &'a Vec<String>>,
{
    let mut offset = 0;
    for position in positions {
        if compare.as_ref() != Some(position) {
            return Some((offset, position.clone()));
        }
        compare = Some(position.clone());
        offset += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::core::value::Value;

    fn ordering() -> Ordering {
        Ordering::from_tokens(&["-rank", "id"])
    }

    fn row(rank: i64, id: i64) -> RowData {
        RowData::from_pairs("t", [("rank", Value::Int(rank)), ("id", Value::Int(id))])
    }

    fn pos(rank: i64, id: i64) -> Vec<String> {
        vec![rank.to_string(), id.to_string()]
    }

    fn ids(page: &Page<RowData>) -> Vec<i64> {
        page.items
            .iter()
            .filter_map(|r| r.get_value("id").as_i64())
            .collect()
    }

    #[test]
    fn test_forward_first_page_with_following_row() {
        let rows = vec![row(5, 1), row(4, 2), row(3, 3), row(2, 4)];
        let page = assemble(rows, 3, &Cursor::default(), &ordering());

        assert_eq!(ids(&page), vec![1, 2, 3]);
        assert!(page.has_next);
        assert!(!page.has_previous);
        assert_eq!(page.next_position, Some(pos(2, 4)));
        assert_eq!(page.previous_position, None);
    }

    #[test]
    fn test_forward_flags_table() {
        let with_prior = Cursor::new(0, false, Some(pos(9, 0)));
        let offset_only = Cursor::new(2, false, None);

        let cases = [
            (Cursor::default(), 4, true, false),
            (Cursor::default(), 3, false, false),
            (with_prior.clone(), 4, true, true),
            (with_prior, 3, false, true),
            (offset_only, 3, false, true),
        ];
        for (cursor, fetched, has_next, has_previous) in cases {
            let rows = (0..fetched).map(|i| row(10 - i, i)).collect();
            let page = assemble(rows, 3, &cursor, &ordering());
            assert_eq!(page.has_next, has_next, "{cursor:?} {fetched}");
            assert_eq!(page.has_previous, has_previous, "{cursor:?} {fetched}");
        }
    }

    #[test]
    fn test_backward_page_is_restored_to_natural_order() {
        let cursor = Cursor::new(0, true, Some(pos(1, 9)));
        // Fetched in reversed order: ascending rank.
        let rows = vec![row(2, 4), row(3, 3), row(4, 2), row(5, 1)];
        let page = assemble(rows, 3, &cursor, &ordering());

        assert_eq!(ids(&page), vec![2, 3, 4]);
        assert!(page.has_next);
        assert!(page.has_previous);
        assert_eq!(page.next_position, Some(pos(1, 9)));
        assert_eq!(page.previous_position, Some(pos(5, 1)));

        let page = assemble(vec![row(2, 4)], 3, &cursor, &ordering());
        assert!(page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn test_next_cursor_uses_last_row_as_marker() {
        let rows = vec![row(5, 1), row(4, 2), row(3, 3), row(2, 4)];
        let cursor = Cursor::default();
        let page = assemble(rows, 3, &cursor, &ordering());

        let next = next_cursor(&page, &ordering(), &cursor, 3).unwrap();
        assert_eq!(next, Cursor::new(0, false, Some(pos(3, 3))));
        assert_eq!(previous_cursor(&page, &ordering(), &cursor, 3), None);
    }

    #[test]
    fn test_previous_cursor_uses_first_row_as_marker() {
        let cursor = Cursor::new(0, false, Some(pos(5, 1)));
        let rows = vec![row(4, 2), row(3, 3), row(2, 4), row(1, 5)];
        let page = assemble(rows, 3, &cursor, &ordering());

        let previous = previous_cursor(&page, &ordering(), &cursor, 3).unwrap();
        assert_eq!(previous, Cursor::new(0, true, Some(pos(4, 2))));

        // A single-row last page still points just past its own row.
        let page = assemble(vec![row(1, 5)], 3, &cursor, &ordering());
        let previous = previous_cursor(&page, &ordering(), &cursor, 3).unwrap();
        assert_eq!(previous, Cursor::new(0, true, Some(pos(1, 5))));
    }

    #[test]
    fn test_previous_cursor_after_offset_skips_shared_rows() {
        let ordering = Ordering::from_tokens(&["-rank"]);
        let cursor = Cursor::new(2, false, Some(vec!["5".to_string()]));
        let rows = vec![row(4, 1), row(4, 2), row(3, 3), row(2, 4)];
        let page = assemble(rows, 3, &cursor, &ordering);

        let previous = previous_cursor(&page, &ordering, &cursor, 3).unwrap();
        assert_eq!(previous, Cursor::new(2, true, Some(vec!["3".to_string()])));
    }

    #[test]
    fn test_next_cursor_offsets_past_shared_positions() {
        // Ordering on rank alone: the last two rows share a position with
        // the following row.
        let ordering = Ordering::from_tokens(&["-rank"]);
        let cursor = Cursor::default();
        let rows = vec![row(5, 1), row(4, 2), row(4, 3), row(4, 4)];
        let page = assemble(rows, 3, &cursor, &ordering);

        let next = next_cursor(&page, &ordering, &cursor, 3).unwrap();
        assert_eq!(next, Cursor::new(2, false, Some(vec!["5".to_string()])));
    }

    #[test]
    fn test_page_without_unique_position_falls_back_to_offset() {
        let ordering = Ordering::from_tokens(&["-rank"]);
        let rows = vec![row(4, 1), row(4, 2), row(4, 3), row(4, 4)];

        let first = Cursor::default();
        let page = assemble(rows.clone(), 3, &first, &ordering);
        assert_eq!(
            next_cursor(&page, &ordering, &first, 3).unwrap(),
            Cursor::new(3, false, None)
        );

        let later = Cursor::new(3, false, Some(vec!["4".to_string()]));
        let page = assemble(rows, 3, &later, &ordering);
        assert_eq!(
            next_cursor(&page, &ordering, &later, 3).unwrap(),
            Cursor::new(6, false, Some(vec!["4".to_string()]))
        );
    }

    #[test]
    fn test_empty_page_keeps_marker() {
        let cursor = Cursor::new(0, true, Some(pos(9, 9)));
        let page = assemble(Vec::new(), 3, &cursor, &ordering());
        assert_eq!(
            next_cursor(&page, &ordering(), &cursor, 3).unwrap(),
            Cursor::new(0, false, Some(pos(9, 9)))
        );
    }
}
