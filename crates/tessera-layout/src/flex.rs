//! The flex algorithm: base sizes, grow/shrink distribution, placement,
//! wrapping, and `align_content` across wrapped lines.

use tracing::warn;

use crate::dimension::resolve_dimension;
use crate::node::{LayoutNode, Rect};
use crate::style::{Align, Justify, Wrap};

/// Lay out `viewport` as the root box and recurse into every descendant,
/// stopping (and marking the remainder invalid) at `depth_cap`.
pub fn compute(root: &mut LayoutNode, viewport: Rect, depth_cap: usize) {
    root.computed = viewport;
    root.valid = root.style.visible;
    if root.valid {
        layout_children(root, 0, depth_cap);
    }
}

fn layout_children(node: &mut LayoutNode, depth: usize, depth_cap: usize) {
    if depth >= depth_cap {
        if !node.children.is_empty() {
            warn!(depth, "layout depth cap reached, remaining subtree left unresolved");
        }
        for child in &mut node.children {
            child.valid = false;
        }
        return;
    }

    let content = node.computed;
    let is_row = node.style.direction.is_row();
    let reversed = node.style.direction.is_reversed();
    let gap = node.style.gap;

    for child in node.children.iter_mut() {
        if !child.style.visible {
            child.valid = false;
            child.computed = Rect::new(content.x, content.y, 0, 0);
        }
    }

    let visible: Vec<usize> = node
        .children
        .iter()
        .enumerate()
        .filter(|(_, c)| c.style.visible)
        .map(|(i, _)| i)
        .collect();
    if visible.is_empty() {
        return;
    }

    let main_avail = if is_row { content.width as f32 } else { content.height as f32 };
    let cross_avail = if is_row { content.height as f32 } else { content.width as f32 };

    let bases: Vec<f32> = visible.iter().map(|&i| base_size(node, i, is_row, main_avail)).collect();

    let lines: Vec<Vec<usize>> = if node.style.wrap == Wrap::Wrap {
        wrap_into_lines(&visible, &bases, gap, main_avail)
    } else {
        vec![visible.clone()]
    };

    let cross_sizes_per_line: Vec<f32> = lines
        .iter()
        .map(|line| {
            line.iter()
                .map(|&i| cross_size(node, i, is_row, cross_avail))
                .fold(0.0_f32, f32::max)
        })
        .collect();

    let total_cross: f32 = cross_sizes_per_line.iter().sum();
    let line_offsets = distribute_lines(node.style.align_content, total_cross, cross_avail, lines.len());

    for (line_idx, line) in lines.iter().enumerate() {
        let line_bases: Vec<f32> = line.iter().map(|&i| base_size(node, i, is_row, main_avail)).collect();
        let main_sizes = distribute_main(node, line, &line_bases, main_avail, gap);
        let positions = place_main(node.style.justify_content, &main_sizes, main_avail, gap);
        let line_cross = cross_sizes_per_line[line_idx];
        let line_cross_start = line_offsets[line_idx];

        for (k, &i) in line.iter().enumerate() {
            let main_pos = if reversed {
                main_avail - positions[k] - main_sizes[k]
            } else {
                positions[k]
            };
            let cross_size_k = if node.style.align_items == Align::Stretch {
                line_cross
            } else {
                cross_size(node, i, is_row, cross_avail).min(line_cross)
            };
            let cross_pos = line_cross_start
                + match node.style.align_items {
                    Align::Start | Align::Stretch => 0.0,
                    Align::End => line_cross - cross_size_k,
                    Align::Center => (line_cross - cross_size_k) / 2.0,
                };

            let rect = if is_row {
                Rect::from_f32(
                    content.x as f32 + main_pos,
                    content.y as f32 + cross_pos,
                    main_sizes[k],
                    cross_size_k,
                )
            } else {
                Rect::from_f32(
                    content.x as f32 + cross_pos,
                    content.y as f32 + main_pos,
                    cross_size_k,
                    main_sizes[k],
                )
            };

            node.children[i].computed = rect;
            node.children[i].valid = true;
            layout_children(&mut node.children[i], depth + 1, depth_cap);
        }
    }
}

fn base_size(node: &LayoutNode, child_idx: usize, is_row: bool, main_avail: f32) -> f32 {
    let c = &node.children[child_idx];
    if let Some(basis) = c.style.flex_basis {
        return basis;
    }
    if is_row {
        resolve_dimension(c.style.width, main_avail, c.intrinsic.0, c.style.min_width, c.style.max_width)
    } else {
        resolve_dimension(c.style.height, main_avail, c.intrinsic.1, c.style.min_height, c.style.max_height)
    }
}

fn cross_size(node: &LayoutNode, child_idx: usize, is_row: bool, cross_avail: f32) -> f32 {
    let c = &node.children[child_idx];
    if node.style.align_items == Align::Stretch {
        return cross_avail;
    }
    if is_row {
        resolve_dimension(c.style.height, cross_avail, c.intrinsic.1, c.style.min_height, c.style.max_height)
    } else {
        resolve_dimension(c.style.width, cross_avail, c.intrinsic.0, c.style.min_width, c.style.max_width)
    }
}

fn wrap_into_lines(visible: &[usize], bases: &[f32], gap: f32, main_avail: f32) -> Vec<Vec<usize>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut used = 0.0_f32;
    for (k, &i) in visible.iter().enumerate() {
        let needed = bases[k] + if current.is_empty() { 0.0 } else { gap };
        if !current.is_empty() && used + needed > main_avail {
            lines.push(std::mem::take(&mut current));
            used = 0.0;
        }
        used += if current.is_empty() { bases[k] } else { gap + bases[k] };
        current.push(i);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn distribute_main(node: &LayoutNode, line: &[usize], bases: &[f32], main_avail: f32, gap: f32) -> Vec<f32> {
    let gap_total = gap * line.len().saturating_sub(1) as f32;
    let sum_base: f32 = bases.iter().sum::<f32>() + gap_total;
    let mut sizes = bases.to_vec();

    if sum_base < main_avail {
        let total_grow: f32 = line.iter().map(|&i| node.children[i].style.flex_grow).sum();
        if total_grow > 0.0 {
            let surplus = main_avail - sum_base;
            for (k, &i) in line.iter().enumerate() {
                let grow = node.children[i].style.flex_grow;
                if grow > 0.0 {
                    sizes[k] += surplus * (grow / total_grow);
                }
            }
        }
    } else if sum_base > main_avail {
        let total_weight: f32 = line.iter().zip(bases).map(|(&i, &b)| node.children[i].style.flex_shrink * b).sum();
        if total_weight > 0.0 {
            let overflow = sum_base - main_avail;
            for (k, &i) in line.iter().enumerate() {
                let weight = node.children[i].style.flex_shrink * bases[k];
                if weight > 0.0 {
                    sizes[k] = (sizes[k] - overflow * (weight / total_weight)).max(0.0);
                }
            }
        }
    }
    sizes
}

fn place_main(justify: Justify, sizes: &[f32], main_avail: f32, gap: f32) -> Vec<f32> {
    let n = sizes.len();
    let used: f32 = sizes.iter().sum::<f32>() + gap * n.saturating_sub(1) as f32;
    let free = (main_avail - used).max(0.0);

    let (start, between_extra) = match justify {
        Justify::Start => (0.0, 0.0),
        Justify::End => (free, 0.0),
        Justify::Center => (free / 2.0, 0.0),
        Justify::SpaceBetween => (0.0, if n > 1 { free / (n - 1) as f32 } else { 0.0 }),
        Justify::SpaceAround => {
            let each = if n > 0 { free / n as f32 } else { 0.0 };
            (each / 2.0, each)
        }
        Justify::SpaceEvenly => {
            let each = free / (n + 1) as f32;
            (each, each)
        }
    };

    let mut positions = Vec::with_capacity(n);
    let mut cursor = start;
    for (k, size) in sizes.iter().enumerate() {
        positions.push(cursor);
        cursor += size;
        if k + 1 < n {
            cursor += gap + between_extra;
        }
    }
    positions
}

fn distribute_lines(align_content: Align, total_cross: f32, cross_avail: f32, line_count: usize) -> Vec<f32> {
    if line_count == 0 {
        return Vec::new();
    }
    let free = (cross_avail - total_cross).max(0.0);
    let start = match align_content {
        Align::Start | Align::Stretch => 0.0,
        Align::End => free,
        Align::Center => free / 2.0,
    };
    // Offsets are filled in by the caller walking lines in order; here we
    // only need the starting cursor since each line's own height already
    // accounts for how much cross space it consumes.
    let mut offsets = Vec::with_capacity(line_count);
    let mut cursor = start;
    offsets.push(cursor);
    cursor += total_cross / line_count as f32;
    for _ in 1..line_count {
        offsets.push(cursor);
        cursor += total_cross / line_count as f32;
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{Direction, Style};

    fn child(width: crate::dimension::Dimension, grow: f32) -> LayoutNode {
        let mut style = Style::default();
        style.width = width;
        style.flex_grow = grow;
        LayoutNode::new(style)
    }

    #[test]
    fn row_children_distribute_grow_surplus() {
        use crate::dimension::Dimension;
        let mut root = LayoutNode::with_children(
            Style { direction: Direction::Row, ..Style::default() },
            vec![child(Dimension::Absolute(10.0), 1.0), child(Dimension::Absolute(10.0), 1.0)],
        );
        compute(&mut root, Rect::new(0, 0, 100, 10), 32);
        assert_eq!(root.children[0].computed.width, 50);
        assert_eq!(root.children[1].computed.width, 50);
    }

    #[test]
    fn hidden_child_is_skipped_and_marked_invalid() {
        use crate::dimension::Dimension;
        let mut hidden = child(Dimension::Absolute(10.0), 0.0);
        hidden.style.visible = false;
        let mut root = LayoutNode::with_children(Style::default(), vec![hidden, child(Dimension::Absolute(10.0), 0.0)]);
        compute(&mut root, Rect::new(0, 0, 100, 10), 32);
        assert!(!root.children[0].valid);
        assert!(root.children[1].valid);
    }

    #[test]
    fn stretch_align_items_fills_cross_axis() {
        use crate::dimension::Dimension;
        let root_style = Style { direction: Direction::Row, align_items: Align::Stretch, ..Style::default() };
        let mut root = LayoutNode::with_children(root_style, vec![child(Dimension::Absolute(10.0), 0.0)]);
        compute(&mut root, Rect::new(0, 0, 100, 24), 32);
        assert_eq!(root.children[0].computed.height, 24);
    }

    #[test]
    fn justify_center_centers_a_single_fixed_child() {
        use crate::dimension::Dimension;
        let root_style = Style { direction: Direction::Row, justify_content: Justify::Center, ..Style::default() };
        let mut root = LayoutNode::with_children(root_style, vec![child(Dimension::Absolute(10.0), 0.0)]);
        compute(&mut root, Rect::new(0, 0, 100, 10), 32);
        assert_eq!(root.children[0].computed.x, 45);
    }

    #[test]
    fn depth_cap_stops_recursion_and_invalidates_remainder() {
        use crate::dimension::Dimension;
        let leaf = child(Dimension::Absolute(5.0), 0.0);
        let mid = LayoutNode::with_children(Style::default(), vec![leaf]);
        let mut root = LayoutNode::with_children(Style::default(), vec![mid]);
        compute(&mut root, Rect::new(0, 0, 50, 10), 1);
        assert!(root.children[0].valid);
        assert!(!root.children[0].children[0].valid);
    }
}
