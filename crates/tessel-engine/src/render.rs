//! Drawing entities onto a host-provided canvas.
//!
//! The engine never talks to a graphics API. A host implements [`Canvas`]
//! for its window surface; [`DrawList`] records the calls instead, for tests
//! and headless runs.

use serde::Serialize;
use tessel_ecs::prelude::*;
use tracing::trace;

/// Tag holding an entity's [`ImageHandle`].
pub const IMAGE: &str = "image";
/// Tag holding an entity's top-left position in display coordinates.
pub const POSITION: &str = "position";

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// A drawing surface.
pub trait Canvas {
    /// Clear the surface before a frame is drawn.
    fn clear(&mut self);

    /// Draw `image` with its top-left corner at `position`.
    fn blit(&mut self, image: ImageHandle, position: Vec2);
}

/// Clear `canvas` and blit every entity holding both an `image` and a
/// `position`, in ascending entity id order. Later entities draw on top.
///
/// Entities whose tags hold the wrong payload variant are skipped. Returns
/// the number of images drawn.
pub fn draw_entities(store: &ComponentStore, canvas: &mut impl Canvas) -> usize {
    canvas.clear();
    let mut drawn = 0;
    for (entity, row) in store.query([IMAGE, POSITION]) {
        let Some([image, position]) = row.to_array() else {
            continue;
        };
        match (image.as_image(), position.as_vec2()) {
            (Some(image), Some(position)) => {
                canvas.blit(*image, *position);
                drawn += 1;
            }
            _ => trace!(%entity, "skipping entity with non-drawable payloads"),
        }
    }
    drawn
}

// ---------------------------------------------------------------------------
// DrawList
// ---------------------------------------------------------------------------

/// One recorded [`Canvas::blit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DrawCommand {
    pub image: ImageHandle,
    pub position: Vec2,
}

/// A canvas that records the draw calls of the most recent frame.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DrawList {
    pub commands: Vec<DrawCommand>,
    /// Number of times the canvas was cleared.
    pub frames: u64,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Canvas for DrawList {
    fn clear(&mut self) {
        self.commands.clear();
        self.frames += 1;
    }

    fn blit(&mut self, image: ImageHandle, position: Vec2) {
        self.commands.push(DrawCommand { image, position });
    }
}
