/// Paint commands for a laid-out subtree

use crate::rendering::layout::{Fragment, NodeId, NodeKind, Rect};
use crate::rendering::style::Color;

#[derive(Debug, Clone, PartialEq)]
pub enum PaintCommand {
    SolidRect {
        rect: Rect,
        color: Color,
    },
    Text {
        x: f32,
        baseline: f32,
        text: String,
        size: f32,
        bold: bool,
        color: Color,
    },
    Image {
        rect: Rect,
        src: String,
    },
}

/// Build the paint list for `root` and its descendants in document order
/// (parents before children, so children paint on top).
pub fn paint_subtree(fragment: &Fragment, root: NodeId) -> Vec<PaintCommand> {
    let mut cmds = Vec::new();
    let mut stack = vec![root];
    while let Some(id) = stack.pop() {
        let node = fragment.node(id);
        if node.is_hidden() {
            continue;
        }
        if let NodeKind::Element { tag, .. } = &node.kind {
            let r = node.rect;
            if let Some(bg) = node.style.background.filter(Color::is_visible) {
                cmds.push(PaintCommand::SolidRect { rect: r, color: bg });
            }
            push_borders(&mut cmds, r, node.style.border, node.style.border_color);
            if tag == "img" {
                if let Some(src) = node.attr("src") {
                    cmds.push(PaintCommand::Image { rect: r, src: src.to_string() });
                }
            }
            for run in &node.runs {
                cmds.push(PaintCommand::Text {
                    x: run.x,
                    baseline: run.baseline,
                    text: run.text.clone(),
                    size: run.style.font_size,
                    bold: run.style.bold,
                    color: run.style.color,
                });
            }
        }
        stack.extend(node.children.iter().rev().copied());
    }
    cmds
}

fn push_borders(cmds: &mut Vec<PaintCommand>, r: Rect, w: crate::rendering::style::Edges, color: Color) {
    if !color.is_visible() {
        return;
    }
    let edges = [
        Rect { x: r.x, y: r.y, width: r.width, height: w.top },
        Rect { x: r.x, y: r.bottom() - w.bottom, width: r.width, height: w.bottom },
        Rect { x: r.x, y: r.y, width: w.left, height: r.height },
        Rect { x: r.x + r.width - w.right, y: r.y, width: w.right, height: r.height },
    ];
    for rect in edges.into_iter().filter(|e| e.width > 0.0 && e.height > 0.0) {
        cmds.push(PaintCommand::SolidRect { rect, color });
    }
}
