use ab_glyph::{Font, FontRef, InvalidFont, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;

use crate::application::ports::AnnotatorPort;
use crate::domain::detection::Detection;

const FONT_BYTES: &[u8] = include_bytes!("../../../assets/DejaVuSans.ttf");

const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_PADDING: u32 = 2;
const LINE_WIDTH: u32 = 2;

// Class color cycle, indexed by class id.
const PALETTE: [[u8; 3]; 20] = [
    [0xFF, 0x38, 0x38], [0xFF, 0x9D, 0x97], [0xFF, 0x70, 0x1F], [0xFF, 0xB2, 0x1D],
    [0xCF, 0xD2, 0x31], [0x48, 0xF9, 0x0A], [0x92, 0xCC, 0x17], [0x3D, 0xDB, 0x86],
    [0x1A, 0x93, 0x34], [0x00, 0xD4, 0xBB], [0x2C, 0x99, 0xA8], [0x00, 0xC2, 0xFF],
    [0x34, 0x45, 0x93], [0x64, 0x73, 0xFF], [0x00, 0x18, 0xEC], [0x84, 0x38, 0xFF],
    [0x52, 0x00, 0x85], [0xCB, 0x38, 0xFF], [0xFF, 0x95, 0xC8], [0xFF, 0x37, 0xC7],
];

pub fn color_for(class_id: usize) -> Rgb<u8> {
    Rgb(PALETTE[class_id % PALETTE.len()])
}

/// Black text on light boxes, white on dark ones.
fn text_color_on(bg: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = bg.0;
    let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
    if luma > 160.0 {
        Rgb([0, 0, 0])
    } else {
        Rgb([255, 255, 255])
    }
}

/// Draws one box plus a `label score` tag per detection, straight onto RGB pixels.
pub struct BoxAnnotator {
    font: FontRef<'static>,
    font_size: f32,
    line_width: u32,
}

impl BoxAnnotator {
    pub fn new() -> Result<Self, InvalidFont> {
        Ok(Self {
            font: FontRef::try_from_slice(FONT_BYTES)?,
            font_size: LABEL_FONT_SIZE,
            line_width: LINE_WIDTH,
        })
    }

    fn draw_detection(&self, image: &mut RgbImage, det: &Detection) {
        let (w, h) = (image.width() as i32, image.height() as i32);
        let x_min = (det.x1.floor() as i32).clamp(0, w - 1);
        let y_min = (det.y1.floor() as i32).clamp(0, h - 1);
        let x_max = (det.x2.ceil() as i32).clamp(0, w - 1);
        let y_max = (det.y2.ceil() as i32).clamp(0, h - 1);
        if x_min >= x_max || y_min >= y_max {
            return;
        }

        let color = color_for(det.class_id);
        for t in 0..self.line_width as i32 {
            let bw = x_max - x_min + 1 - 2 * t;
            let bh = y_max - y_min + 1 - 2 * t;
            if bw <= 0 || bh <= 0 {
                break;
            }
            let rect = Rect::at(x_min + t, y_min + t).of_size(bw as u32, bh as u32);
            draw_hollow_rect_mut(image, rect, color);
        }

        let label = format!("{} {:.2}", det.label, det.score);
        let scale = PxScale::from(self.font_size);
        let (tw, _) = text_size(scale, &self.font, &label);
        let scaled = self.font.as_scaled(scale);
        let line_height = (scaled.ascent() - scaled.descent()).ceil() as u32;
        let tag_w = tw + 2 * LABEL_PADDING;
        let tag_h = line_height + 2 * LABEL_PADDING;

        // Tag sits above the box, or just inside it at the top edge.
        let tag_y = if y_min >= tag_h as i32 { y_min - tag_h as i32 } else { y_min };
        draw_filled_rect_mut(image, Rect::at(x_min, tag_y).of_size(tag_w, tag_h), color);
        draw_text_mut(
            image,
            text_color_on(color),
            x_min + LABEL_PADDING as i32,
            tag_y + LABEL_PADDING as i32,
            scale,
            &self.font,
            &label,
        );
    }
}

impl AnnotatorPort for BoxAnnotator {
    fn annotate(&self, frame: &RgbImage, detections: &[Detection]) -> RgbImage {
        let mut image = frame.clone();
        for det in detections {
            self.draw_detection(&mut image, det);
        }
        image
    }
}
