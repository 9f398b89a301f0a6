use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct PageContext<T> {
    pub results: Vec<T>,
    pub count: i64,
    pub next_offset: Option<i64>,
    pub previous_offset: Option<i64>,
}

impl<T> PageContext<T> {
    pub fn from_rows(rows: Vec<T>, total_rows: i64, page_size: i64, current_offset: i64) -> Self {
        if rows.is_empty() {
            return Self::no_rows();
        }
        let next_offset =
            (current_offset + page_size < total_rows).then(|| current_offset + page_size);
        let previous_offset = (current_offset > 0).then(|| (current_offset - page_size).max(0));

        Self {
            results: rows,
            count: total_rows,
            next_offset,
            previous_offset,
        }
    }

    pub fn no_rows() -> Self {
        Self {
            results: vec![],
            count: 0,
            next_offset: None,
            previous_offset: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_page() {
        let page = PageContext::<i32>::from_rows(vec![], 0, 10, 0);
        assert_eq!(page, PageContext::no_rows());
    }

    #[test]
    fn first_page_of_many() {
        let rows: Vec<i32> = (0..10).collect();
        let page = PageContext::from_rows(rows, 25, 10, 0);

        assert_eq!(page.count, 25);
        assert_eq!(page.next_offset, Some(10));
        assert_eq!(page.previous_offset, None);
    }

    #[test]
    fn middle_page_windows_both_ways() {
        let rows: Vec<i32> = (10..20).collect();
        let page = PageContext::from_rows(rows, 25, 10, 10);

        assert_eq!(page.next_offset, Some(20));
        assert_eq!(page.previous_offset, Some(0));
    }

    #[test]
    fn last_page_has_no_next() {
        let rows: Vec<i32> = (20..25).collect();
        let page = PageContext::from_rows(rows, 25, 10, 20);

        assert_eq!(page.next_offset, None);
        assert_eq!(page.previous_offset, Some(10));
    }

    #[test]
    fn short_offset_clamps_previous_to_zero() {
        let rows: Vec<i32> = (5..15).collect();
        let page = PageContext::from_rows(rows, 25, 10, 5);

        assert_eq!(page.previous_offset, Some(0));
    }
}
