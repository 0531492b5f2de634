/// Container sizing and object-fit framing for media surfaces

use crate::rendering::RenderOutput;
use crate::Dimension;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// Container box plus the rectangle the media is drawn into.
/// With cover fitting the content rect may overflow the container; the
/// container clips it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Framing {
    pub container: Rect,
    pub content: Rect,
}

fn resolve(dim: Dimension, parent: f32) -> Option<f32> {
    match dim {
        Dimension::Auto => None,
        Dimension::Percent(p) => Some(parent * p / 100.0),
        Dimension::Pixels(px) => Some(px as f32),
    }
}

/// Size of the container inside `parent` for media of `intrinsic` size.
/// An auto height follows the media's aspect ratio; an auto width fills
/// the parent like a block element.
pub fn container_size(width: Dimension, height: Dimension, parent: Size, intrinsic: Size) -> Size {
    let w = resolve(width, parent.width).unwrap_or(parent.width);
    let h = match resolve(height, parent.height) {
        Some(h) => h,
        None if !intrinsic.is_empty() => w * intrinsic.height / intrinsic.width,
        None => 0.0,
    };
    Size::new(w, h)
}

/// Scale `intrinsic` to cover `bounds` completely, centered.
pub fn cover(bounds: Rect, intrinsic: Size) -> Rect {
    if intrinsic.is_empty() || bounds.width <= 0.0 || bounds.height <= 0.0 {
        return bounds;
    }
    let scale = (bounds.width / intrinsic.width).max(bounds.height / intrinsic.height);
    let width = intrinsic.width * scale;
    let height = intrinsic.height * scale;
    Rect {
        x: bounds.x + (bounds.width - width) / 2.0,
        y: bounds.y + (bounds.height - height) / 2.0,
        width,
        height,
    }
}

/// Frame a render output at the origin of `parent`
pub fn frame(output: &RenderOutput, parent: Size, intrinsic: Size) -> Framing {
    let size = container_size(output.container.width, output.container.height, parent, intrinsic);
    let container = Rect {
        x: 0.0,
        y: 0.0,
        width: size.width,
        height: size.height,
    };
    Framing {
        container,
        content: cover(container, intrinsic),
    }
}
