use crate::error::GfxError;

use super::targets::TargetView;

/// Cursor value meaning "no view visited yet this frame".
pub const NO_VIEW: usize = usize::MAX;

#[derive(Debug, Clone, Default)]
pub enum ViewPhase {
    #[default]
    Idle,
    /// The current view holds a swapchain image until `end_view`.
    Acquired(TargetView),
    /// The current view was not ready; it advances without drawing.
    Skipped,
}

/// Walks the render views of one frame in order.
#[derive(Debug)]
pub struct FrameCursor {
    in_frame: bool,
    current: usize,
    phase: ViewPhase,
}

impl Default for FrameCursor {
    fn default() -> Self {
        Self {
            in_frame: false,
            current: NO_VIEW,
            phase: ViewPhase::Idle,
        }
    }
}

impl FrameCursor {
    pub fn begin_frame(&mut self) {
        self.in_frame = true;
        self.current = NO_VIEW;
        self.phase = ViewPhase::Idle;
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    /// Index of the view the next `begin_view` would target. A view counts
    /// as visited only once `end_view` has closed it.
    pub fn next_index(&self) -> usize {
        match self.phase {
            ViewPhase::Acquired(_) | ViewPhase::Skipped => self.current,
            ViewPhase::Idle => self.current.wrapping_add(1),
        }
    }

    pub fn current(&self) -> Option<usize> {
        (self.current != NO_VIEW).then_some(self.current)
    }

    pub fn has_next(&self, view_count: usize) -> bool {
        self.in_frame && self.next_index() < view_count
    }

    /// Moves to the next view. A skipped view may be retried.
    pub fn begin_view(&mut self, view_count: usize) -> Result<usize, GfxError> {
        if !self.in_frame {
            return Err(GfxError::FrameOrder("begin_render_view outside a frame"));
        }
        if matches!(self.phase, ViewPhase::Acquired(_)) {
            return Err(GfxError::FrameOrder(
                "begin_render_view while the previous view is still open",
            ));
        }
        let index = self.next_index();
        if index >= view_count {
            return Err(GfxError::InvalidView {
                index,
                count: view_count,
            });
        }
        self.current = index;
        self.phase = ViewPhase::Idle;
        Ok(index)
    }

    pub fn acquired(&mut self, image: TargetView) {
        self.phase = ViewPhase::Acquired(image);
    }

    pub fn skipped(&mut self) {
        self.phase = ViewPhase::Skipped;
    }

    /// Closes the current view, handing back its image if one was acquired.
    pub fn end_view(&mut self) -> Result<(usize, Option<TargetView>), GfxError> {
        if !self.in_frame || self.current == NO_VIEW {
            return Err(GfxError::FrameOrder("end_render_view without begin_render_view"));
        }
        match std::mem::take(&mut self.phase) {
            ViewPhase::Acquired(image) => Ok((self.current, Some(image))),
            ViewPhase::Skipped => Ok((self.current, None)),
            ViewPhase::Idle => Err(GfxError::FrameOrder(
                "end_render_view called twice for the same view",
            )),
        }
    }

    pub fn end_frame(&mut self) -> Result<(), GfxError> {
        if matches!(self.phase, ViewPhase::Acquired(_)) {
            return Err(GfxError::FrameOrder("end_frame while a render view is open"));
        }
        self.in_frame = false;
        self.current = NO_VIEW;
        self.phase = ViewPhase::Idle;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> TargetView {
        TargetView::Null {
            width: 1,
            height: 1,
            format: wgpu::TextureFormat::Bgra8Unorm,
        }
    }

    #[test]
    fn views_are_visited_in_order() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        assert!(cursor.has_next(2));
        assert_eq!(cursor.begin_view(2).unwrap(), 0);
        cursor.acquired(image());
        assert_eq!(cursor.end_view().unwrap().0, 0);
        assert_eq!(cursor.begin_view(2).unwrap(), 1);
        cursor.acquired(image());
        assert!(cursor.end_view().unwrap().1.is_some());
        assert!(!cursor.has_next(2));
        cursor.end_frame().unwrap();
        assert!(!cursor.in_frame());
    }

    #[test]
    fn last_view_stays_pending_until_ended() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        cursor.begin_view(1).unwrap();
        cursor.acquired(image());
        assert!(cursor.has_next(1));
        assert_eq!(cursor.next_index(), 0);
        cursor.end_view().unwrap();
        assert!(!cursor.has_next(1));
        cursor.end_frame().unwrap();
    }

    #[test]
    fn begin_outside_frame_is_an_error() {
        let mut cursor = FrameCursor::default();
        assert!(matches!(cursor.begin_view(1), Err(GfxError::FrameOrder(_))));
        assert!(matches!(cursor.end_view(), Err(GfxError::FrameOrder(_))));
    }

    #[test]
    fn open_view_blocks_begin_and_end_frame() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        cursor.begin_view(2).unwrap();
        cursor.acquired(image());
        assert!(cursor.begin_view(2).is_err());
        assert!(cursor.end_frame().is_err());
    }

    #[test]
    fn skipped_view_can_be_retried_or_ended() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        assert_eq!(cursor.begin_view(2).unwrap(), 0);
        cursor.skipped();
        assert_eq!(cursor.next_index(), 0);
        assert_eq!(cursor.begin_view(2).unwrap(), 0);
        cursor.skipped();
        let (index, image) = cursor.end_view().unwrap();
        assert_eq!(index, 0);
        assert!(image.is_none());
        assert_eq!(cursor.begin_view(2).unwrap(), 1);
    }

    #[test]
    fn double_end_is_rejected() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        cursor.begin_view(1).unwrap();
        cursor.skipped();
        cursor.end_view().unwrap();
        assert!(cursor.end_view().is_err());
    }

    #[test]
    fn running_past_the_last_view_is_reported() {
        let mut cursor = FrameCursor::default();
        cursor.begin_frame();
        cursor.begin_view(1).unwrap();
        cursor.skipped();
        cursor.end_view().unwrap();
        assert!(matches!(
            cursor.begin_view(1),
            Err(GfxError::InvalidView { index: 1, count: 1 })
        ));
    }
}
