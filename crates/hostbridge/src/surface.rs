//! Presentation target contract.
//!
//! The bridge never manages surface lifecycles; embedders hand a
//! [`PresentationSurface`] to whatever renders into it.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Size {
    pub width: u32,
    pub height: u32,
}

impl Size {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Opaque rendering context that a surface can be made current for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderContext(pub u64);

/// Viewport description forwarded to the engine at startup and on resize.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportMetrics {
    pub physical_width: u32,
    pub physical_height: u32,
    pub device_pixel_ratio: f64,
}

impl ViewportMetrics {
    pub const fn physical_size(&self) -> Size {
        Size::new(self.physical_width, self.physical_height)
    }
}

impl Default for ViewportMetrics {
    fn default() -> Self {
        Self {
            physical_width: 640,
            physical_height: 480,
            device_pixel_ratio: 1.0,
        }
    }
}

pub trait PresentationSurface {
    fn swap_buffers(&mut self) -> bool;

    fn resize(&mut self, size: Size) -> bool;

    fn make_current(&mut self, context: RenderContext) -> bool;

    fn size(&self) -> Size;

    fn destroy(&mut self);

    fn is_offscreen(&self) -> bool;
}

/// Offscreen surface without a backing window.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: Size,
    current: Option<RenderContext>,
    frames: u64,
    destroyed: bool,
}

impl HeadlessSurface {
    pub const fn new(size: Size) -> Self {
        Self {
            size,
            current: None,
            frames: 0,
            destroyed: false,
        }
    }

    pub const fn frames_presented(&self) -> u64 {
        self.frames
    }

    pub const fn current_context(&self) -> Option<RenderContext> {
        self.current
    }
}

impl PresentationSurface for HeadlessSurface {
    fn swap_buffers(&mut self) -> bool {
        if self.destroyed || self.current.is_none() {
            return false;
        }
        self.frames += 1;
        true
    }

    fn resize(&mut self, size: Size) -> bool {
        if self.destroyed || size.is_empty() {
            return false;
        }
        self.size = size;
        true
    }

    fn make_current(&mut self, context: RenderContext) -> bool {
        if self.destroyed {
            return false;
        }
        self.current = Some(context);
        true
    }

    fn size(&self) -> Size {
        self.size
    }

    fn destroy(&mut self) {
        self.destroyed = true;
        self.current = None;
    }

    fn is_offscreen(&self) -> bool {
        true
    }
}
