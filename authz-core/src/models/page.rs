use serde::{Deserialize, Serialize};

pub const DEFAULT_LIMIT: u64 = 10;

/// Sort key a caller may request instead of insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Order {
    Name,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// Paging and ordering parameters for list operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub order: Option<Order>,
    #[serde(default)]
    pub dir: Direction,
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

impl Default for PageMeta {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_LIMIT,
            order: None,
            dir: Direction::Asc,
        }
    }
}

impl PageMeta {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self {
            offset,
            limit,
            ..Default::default()
        }
    }

    pub fn ordered_by(mut self, order: Order, dir: Direction) -> Self {
        self.order = Some(order);
        self.dir = dir;
        self
    }

    /// Slice an already ordered list. Returns the total and the requested window.
    pub fn paginate<T: Clone>(&self, items: &[T]) -> (u64, Vec<T>) {
        let total = items.len() as u64;
        let window = items
            .iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .cloned()
            .collect();
        (total, window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_window() {
        let items: Vec<u32> = (0..25).collect();
        let (total, page) = PageMeta::new(20, 10).paginate(&items);
        assert_eq!(total, 25);
        assert_eq!(page, vec![20, 21, 22, 23, 24]);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let items = vec!["a", "b"];
        let (total, page) = PageMeta::new(5, 10).paginate(&items);
        assert_eq!(total, 2);
        assert!(page.is_empty());
    }
}
