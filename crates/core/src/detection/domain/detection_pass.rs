use crate::annotation::domain::region_renderer::RegionRenderer;
use crate::shared::frame::Frame;
use crate::shared::region::Region;

use super::object_detector::ObjectDetector;

/// One detector plus how its hits are drawn onto the frame.
pub struct DetectionPass {
    label: String,
    detector: Box<dyn ObjectDetector>,
    renderer: Box<dyn RegionRenderer>,
    color: [u8; 3],
    thickness: u32,
}

impl DetectionPass {
    pub fn new(
        label: impl Into<String>,
        detector: Box<dyn ObjectDetector>,
        renderer: Box<dyn RegionRenderer>,
        color: [u8; 3],
        thickness: u32,
    ) -> Self {
        Self {
            label: label.into(),
            detector,
            renderer,
            color,
            thickness,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn detect(&mut self, frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
        self.detector.detect(frame)
    }

    /// Outlines `regions` in this pass's colour.
    pub fn draw(
        &self,
        frame: &mut Frame,
        regions: &[Region],
    ) -> Result<(), Box<dyn std::error::Error>> {
        self.renderer.draw(frame, regions, self.color, self.thickness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::domain::rectangle_drawer::PixelRectangleDrawer;

    struct StubDetector {
        regions: Vec<Region>,
    }

    impl ObjectDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Ok(self.regions.clone())
        }
    }

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<Region>, Box<dyn std::error::Error>> {
            Err("classifier not loaded".into())
        }
    }

    #[test]
    fn test_detect_then_draw_outlines_hits() {
        let mut pass = DetectionPass::new(
            "face",
            Box::new(StubDetector {
                regions: vec![Region::new(2, 2, 4, 4)],
            }),
            Box::new(PixelRectangleDrawer),
            [0, 0, 255],
            1,
        );
        let mut frame = Frame::filled(10, 10, 3, 0, 0);
        let found = pass.detect(&frame).unwrap();
        assert_eq!(found.len(), 1);
        pass.draw(&mut frame, &found).unwrap();

        assert_eq!(pass.label(), "face");
        let px = frame.as_ndarray();
        assert_eq!(px[[2, 2, 2]], 255);
        assert_eq!(px[[4, 4, 2]], 0);
    }

    #[test]
    fn test_no_hits_leaves_frame_untouched() {
        let mut pass = DetectionPass::new(
            "eyes",
            Box::new(StubDetector { regions: vec![] }),
            Box::new(PixelRectangleDrawer),
            [0, 255, 0],
            2,
        );
        let mut frame = Frame::filled(10, 10, 3, 77, 0);
        let before = frame.clone();
        let found = pass.detect(&frame).unwrap();
        pass.draw(&mut frame, &found).unwrap();
        assert_eq!(frame, before);
    }

    #[test]
    fn test_detector_error_propagates() {
        let mut pass = DetectionPass::new(
            "eyes",
            Box::new(FailingDetector),
            Box::new(PixelRectangleDrawer),
            [0, 255, 0],
            2,
        );
        let frame = Frame::filled(4, 4, 3, 0, 0);
        assert!(pass.detect(&frame).is_err());
    }

    struct FailingRenderer;

    impl RegionRenderer for FailingRenderer {
        fn draw(
            &self,
            _frame: &mut Frame,
            _regions: &[Region],
            _color: [u8; 3],
            _thickness: u32,
        ) -> Result<(), Box<dyn std::error::Error>> {
            Err("no drawing backend".into())
        }
    }

    #[test]
    fn test_renderer_error_propagates() {
        let pass = DetectionPass::new(
            "face",
            Box::new(StubDetector { regions: vec![] }),
            Box::new(FailingRenderer),
            [0, 0, 255],
            2,
        );
        let mut frame = Frame::filled(4, 4, 3, 0, 0);
        let err = pass.draw(&mut frame, &[Region::new(0, 0, 2, 2)]).unwrap_err();
        assert!(err.to_string().contains("backend"));
    }
}
