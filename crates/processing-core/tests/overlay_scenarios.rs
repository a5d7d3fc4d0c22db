use proptest::prelude::*;

use runstamp_image_model::{BoundingBox, ColorMode, CropSensitivity, PixelBuffer, Rgba};
use runstamp_processing_core::{BackgroundEstimate, BackgroundMatte, CropDetector};

fn fill_rect(buf: &mut PixelBuffer, x0: u32, y0: u32, x1: u32, y1: u32, color: Rgba) {
    for y in y0..=y1 {
        for x in x0..=x1 {
            buf.set_pixel(x, y, color);
        }
    }
}

#[test]
fn stats_text_near_top_is_cropped_with_margin() {
    let mut shot = PixelBuffer::filled(400, 800, Rgba::WHITE).unwrap();
    fill_rect(&mut shot, 100, 50, 300, 120, Rgba::opaque(20, 20, 20));

    let b = CropDetector::default().detect(&shot);

    // margin = 10% of min(400, 800) = 40
    assert_eq!(b.y, 10);
    assert_eq!(b.bottom(), 161);
    assert_eq!(b.x, 60);
    assert_eq!(b.right(), 341);
    assert!(b.is_within(400, 800));
}

#[test]
fn gray_card_with_black_text_is_matted() {
    let gray = Rgba::opaque(128, 128, 128);
    let mut card = PixelBuffer::filled(120, 90, gray).unwrap();
    fill_rect(&mut card, 40, 30, 79, 59, Rgba::BLACK);
    // near-gray antialiasing noise inside the border tolerance
    card.set_pixel(5, 45, Rgba::opaque(150, 150, 150));

    let matte = BackgroundMatte::default();
    assert_eq!(
        matte.estimate_background(&card),
        BackgroundEstimate::Color {
            r: 128.0,
            g: 128.0,
            b: 128.0
        }
    );

    let out = matte.matte(&card, ColorMode::Black);
    for y in 0..90 {
        for x in 0..120 {
            let px = out.pixel(x, y).unwrap();
            let is_text = (40..80).contains(&x) && (30..60).contains(&y);
            if is_text {
                assert_eq!(px.a, 255, "text pixel ({x},{y}) must be opaque");
            } else {
                assert_eq!(px.a, 0, "background pixel ({x},{y}) must be transparent");
            }
        }
    }
}

#[test]
fn crop_then_matte_keeps_only_text() {
    let mut shot = PixelBuffer::filled(300, 300, Rgba::opaque(245, 245, 245)).unwrap();
    fill_rect(&mut shot, 120, 40, 180, 70, Rgba::opaque(10, 10, 10));

    let detector = CropDetector::with_sensitivity(CropSensitivity::Standard);
    let bounds = detector.detect(&shot);
    let cropped = shot.crop(&bounds);
    let out = BackgroundMatte::default().matte(&cropped, ColorMode::White);

    let opaque = out.samples().chunks_exact(4).filter(|p| p[3] == 255).count();
    assert_eq!(opaque, 61 * 31);
}

fn arb_buffer() -> impl Strategy<Value = PixelBuffer> {
    (1u32..40, 1u32..40).prop_flat_map(|(w, h)| {
        prop::collection::vec(any::<u8>(), (w * h * 4) as usize)
            .prop_map(move |samples| PixelBuffer::new(w, h, samples).unwrap())
    })
}

fn arb_sensitivity() -> impl Strategy<Value = CropSensitivity> {
    prop_oneof![
        Just(CropSensitivity::Standard),
        Just(CropSensitivity::Extended)
    ]
}

fn arb_mode() -> impl Strategy<Value = ColorMode> {
    prop_oneof![Just(ColorMode::White), Just(ColorMode::Black)]
}

proptest! {
    #[test]
    fn detected_box_is_within_source(buf in arb_buffer(), sensitivity in arb_sensitivity()) {
        let b = CropDetector::with_sensitivity(sensitivity).detect(&buf);
        prop_assert!(b.is_within(buf.width(), buf.height()));
    }

    #[test]
    fn bright_images_keep_full_frame(
        w in 1u32..60,
        h in 1u32..60,
        level in 120u8..=255,
    ) {
        let buf = PixelBuffer::filled(w, h, Rgba::opaque(level, level, level)).unwrap();
        let b = CropDetector::default().detect(&buf);
        prop_assert_eq!(b, BoundingBox::full(w, h));
    }

    #[test]
    fn white_mode_foreground_is_pure_white(buf in arb_buffer()) {
        let out = BackgroundMatte::default().matte(&buf, ColorMode::White);
        for px in out.samples().chunks_exact(4) {
            prop_assert!(px[3] == 0 || px == [255, 255, 255, 255]);
        }
    }

    #[test]
    fn black_mode_only_darkens_dark_pixels(buf in arb_buffer()) {
        let out = BackgroundMatte::default().matte(&buf, ColorMode::Black);
        for (src, dst) in buf.samples().chunks_exact(4).zip(out.samples().chunks_exact(4)) {
            if dst[3] == 0 {
                continue;
            }
            prop_assert_eq!(dst[3], 255);
            let sum = src[0] as u32 + src[1] as u32 + src[2] as u32;
            for c in 0..3 {
                let expected = if sum < 300 { src[c].saturating_sub(20) } else { src[c] };
                prop_assert_eq!(dst[c], expected);
            }
        }
    }

    #[test]
    fn matting_never_revives_transparent_pixels(buf in arb_buffer(), mode in arb_mode()) {
        let matte = BackgroundMatte::default();
        let once = matte.matte(&buf, mode);
        let twice = matte.matte(&once, mode);
        for (a, b) in once.samples().chunks_exact(4).zip(twice.samples().chunks_exact(4)) {
            if a[3] == 0 {
                prop_assert_eq!(b[3], 0);
            }
        }
    }
}
