// Layout/placement engine - grid placement, drag/resize reconciliation, free cells
use super::palette::WidgetSize;
use super::widget::{LayoutRect, Widget};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const GRID_COLUMNS: u32 = 12;
pub const DEFAULT_GRID_ROWS: u32 = 32;
pub const MAX_WIDGET_HEIGHT: u32 = 8;

/// One entry of a grid layout as reported by a drag/resize interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutItem {
    pub i: String,
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub row: u32,
    pub col: u32,
}

/// Greedy placement for a new widget: to the right of the widest extent when
/// it still fits on the row, otherwise column 0, and always below the lowest
/// existing widget. Gaps left by deleted widgets are not backfilled.
pub fn place_new_widget(existing: &[Widget], size: WidgetSize) -> LayoutRect {
    let w = size.w.clamp(1, GRID_COLUMNS);
    let h = size.h.max(1);

    let next_x = existing.iter().map(|widget| widget.layout.right()).max().unwrap_or(0);
    let x = if next_x >= GRID_COLUMNS || next_x + w > GRID_COLUMNS {
        0
    } else {
        next_x
    };

    let y = existing.iter().map(|widget| widget.layout.bottom()).max().unwrap_or(0);

    LayoutRect { x, y, w, h }
}

/// Current layout in the shape the grid collaborator reports back.
pub fn layout_items(widgets: &[Widget]) -> Vec<LayoutItem> {
    widgets
        .iter()
        .map(|w| LayoutItem {
            i: w.widget_id.clone(),
            x: w.layout.x,
            y: w.layout.y,
            w: w.layout.w,
            h: w.layout.h,
        })
        .collect()
}

/// Merges reported positions into the widget list by id. Widgets without an
/// entry are left as they are; entries for unknown ids are ignored. Merged
/// rects are normalized onto the grid.
pub fn apply_layout_change(widgets: &[Widget], items: &[LayoutItem]) -> Vec<Widget> {
    let by_id: HashMap<&str, &LayoutItem> = items.iter().map(|item| (item.i.as_str(), item)).collect();

    let unknown = items
        .iter()
        .filter(|item| !widgets.iter().any(|w| w.widget_id == item.i))
        .count();
    if unknown > 0 {
        tracing::debug!("Ignoring {} layout entries for unknown widgets", unknown);
    }

    widgets
        .iter()
        .map(|widget| match by_id.get(widget.widget_id.as_str()) {
            Some(item) => Widget {
                layout: LayoutRect {
                    x: item.x,
                    y: item.y,
                    w: item.w,
                    h: item.h,
                }
                .normalized(),
                ..widget.clone()
            },
            None => widget.clone(),
        })
        .collect()
}

/// Cells of a `rows x 12` grid not covered by any widget, in row-major order.
/// Only used to draw the background guide.
pub fn free_cells(widgets: &[Widget], rows: u32) -> Vec<GridCell> {
    let cols = GRID_COLUMNS as usize;
    let mut occupied = vec![false; rows as usize * cols];

    for widget in widgets {
        let rect = widget.layout;
        for row in rect.y..rect.bottom().min(rows) {
            for col in rect.x..rect.right().min(GRID_COLUMNS) {
                occupied[row as usize * cols + col as usize] = true;
            }
        }
    }

    (0..rows)
        .flat_map(|row| (0..GRID_COLUMNS).map(move |col| GridCell { row, col }))
        .filter(|cell| !occupied[cell.row as usize * cols + cell.col as usize])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::settings::{PieSettings, WidgetSettings};

    fn widget(id: &str, layout: LayoutRect) -> Widget {
        Widget {
            widget_id: id.to_string(),
            title: id.to_string(),
            description: String::new(),
            layout,
            settings: WidgetSettings::Pie(PieSettings::default()),
        }
    }

    fn size(w: u32, h: u32) -> WidgetSize {
        WidgetSize { w, h }
    }

    #[test]
    fn test_first_widget_at_origin() {
        assert_eq!(place_new_widget(&[], size(5, 5)), LayoutRect::new(0, 0, 5, 5));
    }

    #[test]
    fn test_next_widget_goes_right_and_below() {
        let existing = vec![widget("a", LayoutRect::new(0, 0, 5, 5))];
        assert_eq!(place_new_widget(&existing, size(4, 4)), LayoutRect::new(5, 5, 4, 4));
    }

    #[test]
    fn test_wraps_to_column_zero() {
        let full = vec![widget("a", LayoutRect::new(0, 0, 12, 2))];
        assert_eq!(place_new_widget(&full, size(2, 2)), LayoutRect::new(0, 2, 2, 2));

        let no_room = vec![widget("a", LayoutRect::new(0, 0, 9, 2))];
        assert_eq!(place_new_widget(&no_room, size(5, 5)), LayoutRect::new(0, 2, 5, 5));
    }

    #[test]
    fn test_gaps_are_not_backfilled() {
        let existing = vec![widget("b", LayoutRect::new(0, 10, 4, 4))];
        assert_eq!(place_new_widget(&existing, size(4, 4)).y, 14);
    }

    #[test]
    fn test_sequential_additions_never_overlap() {
        let sizes = [(5, 5), (5, 5), (4, 4), (2, 2), (12, 1), (3, 7), (1, 1), (11, 2), (4, 4)];
        let mut widgets: Vec<Widget> = Vec::new();

        for round in 0..4 {
            for (n, (w, h)) in sizes.iter().enumerate() {
                let layout = place_new_widget(&widgets, size(*w, *h));
                assert!(layout.right() <= GRID_COLUMNS);
                widgets.push(widget(&format!("{round}-{n}"), layout));
            }
        }

        for (i, a) in widgets.iter().enumerate() {
            for b in &widgets[i + 1..] {
                assert!(!a.layout.overlaps(&b.layout), "{} overlaps {}", a.widget_id, b.widget_id);
            }
        }
    }

    #[test]
    fn test_identity_layout_change_is_noop() {
        let widgets = vec![
            widget("a", LayoutRect::new(0, 0, 5, 5)),
            widget("b", LayoutRect::new(5, 5, 4, 4)),
        ];
        let items = layout_items(&widgets);
        assert_eq!(apply_layout_change(&widgets, &items), widgets);
    }

    #[test]
    fn test_layout_change_merges_by_id() {
        let widgets = vec![
            widget("a", LayoutRect::new(0, 0, 5, 5)),
            widget("b", LayoutRect::new(5, 5, 4, 4)),
        ];
        let items = vec![
            LayoutItem {
                i: "b".to_string(),
                x: 5,
                y: 0,
                w: 6,
                h: 3,
            },
            LayoutItem {
                i: "ghost".to_string(),
                x: 0,
                y: 0,
                w: 1,
                h: 1,
            },
        ];

        let updated = apply_layout_change(&widgets, &items);

        assert_eq!(updated.len(), 2);
        assert_eq!(updated[0], widgets[0]);
        assert_eq!(updated[1].layout, LayoutRect::new(5, 0, 6, 3));
        assert_eq!(updated[1].title, "b");
    }

    #[test]
    fn test_layout_change_is_normalized() {
        let widgets = vec![widget("a", LayoutRect::new(0, 0, 4, 4))];
        let items = vec![LayoutItem {
            i: "a".to_string(),
            x: 20,
            y: 0,
            w: 0,
            h: 0,
        }];

        let updated = apply_layout_change(&widgets, &items);

        assert_eq!(updated[0].layout, LayoutRect::new(11, 0, 1, 1));
        assert!(updated[0].layout.right() <= GRID_COLUMNS);
    }

    #[test]
    fn test_free_cells() {
        let widgets = vec![
            widget("a", LayoutRect::new(0, 0, 2, 2)),
            widget("b", LayoutRect::new(11, 2, 4, 4)),
        ];
        let cells = free_cells(&widgets, 3);

        assert_eq!(cells.len(), 3 * 12 - 4 - 1);
        assert_eq!(cells[0], GridCell { row: 0, col: 2 });
        assert!(!cells.contains(&GridCell { row: 1, col: 1 }));
        assert!(!cells.contains(&GridCell { row: 2, col: 11 }));
        assert!(cells.contains(&GridCell { row: 2, col: 10 }));
    }

    #[test]
    fn test_free_cells_clips_below_grid() {
        let widgets = vec![widget("a", LayoutRect::new(0, 40, 12, 4))];
        assert_eq!(free_cells(&widgets, DEFAULT_GRID_ROWS).len(), (DEFAULT_GRID_ROWS * 12) as usize);
    }
}
