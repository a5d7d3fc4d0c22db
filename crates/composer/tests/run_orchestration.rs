use runstamp_composer::{Composer, ImageSource, RunOutcome, RunRequest, SessionConfig};
use runstamp_image_model::{CanvasSize, ColorMode, CropSensitivity, DragDelta, PixelBuffer, Rgba};
use runstamp_render_engine::{encode_png, Compositor};

fn background_png(w: u32, h: u32) -> ImageSource {
    let buf = PixelBuffer::filled(w, h, Rgba::opaque(30, 90, 40)).unwrap();
    ImageSource::Bytes(encode_png(&buf).unwrap())
}

fn screenshot_png() -> ImageSource {
    let mut shot = PixelBuffer::filled(400, 800, Rgba::WHITE).unwrap();
    for y in 50..=120 {
        for x in 100..=300 {
            shot.set_pixel(x, y, Rgba::opaque(20, 20, 20));
        }
    }
    ImageSource::Bytes(encode_png(&shot).unwrap())
}

fn request(config: SessionConfig) -> RunRequest {
    RunRequest::new(background_png(1200, 1600), screenshot_png(), config)
}

fn expect_ready(outcome: RunOutcome) -> Box<runstamp_composer::RunOutput> {
    match outcome {
        RunOutcome::Ready(output) => output,
        RunOutcome::Superseded { ticket } => panic!("run {ticket} was superseded"),
    }
}

#[tokio::test]
async fn full_run_exports_native_resolution() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let output = expect_ready(composer.run(request(SessionConfig::default())).await.unwrap());

    assert_eq!(output.preview_canvas, CanvasSize::new(300, 400));
    assert_eq!(output.preview.size(), CanvasSize::new(300, 400));
    assert_eq!(output.export.size(), CanvasSize::new(1200, 1600));
    assert!((output.placement.left - 15.0).abs() < 1e-9);
    assert!((output.placement.top - 20.0).abs() < 1e-9);
    assert!(!output.crop.fell_back_to_full);
    assert!(output.matte.opaque_pixels > 0);
}

#[tokio::test]
async fn older_ticket_is_superseded() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let stale = composer.begin();
    let fresh = composer.begin();

    let outcome = composer
        .run_with_ticket(stale, request(SessionConfig::default()))
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Superseded { ticket } if ticket == stale.id()));

    let outcome = composer
        .run_with_ticket(fresh, request(SessionConfig::default()))
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Ready(_)));
}

#[tokio::test]
async fn nudges_move_the_overlay() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let mut req = request(SessionConfig::new(ColorMode::Black, CropSensitivity::Extended));
    req.nudges = vec![DragDelta::new(10.0, 5.0), DragDelta::new(-4.0, 20.0)];

    let output = expect_ready(composer.run(req).await.unwrap());
    assert!((output.placement.left - 21.0).abs() < 1e-9);
    assert!((output.placement.top - 45.0).abs() < 1e-9);
}

#[tokio::test]
async fn reset_undoes_nudges() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let mut req = request(SessionConfig::default());
    req.nudges = vec![DragDelta::new(100.0, 100.0)];
    req.reset_position = true;

    let output = expect_ready(composer.run(req).await.unwrap());
    assert!((output.placement.left - 15.0).abs() < 1e-9);
    assert!((output.placement.top - 20.0).abs() < 1e-9);
}

#[tokio::test]
async fn corrupt_input_is_a_decode_failure() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let req = RunRequest::new(
        background_png(10, 10),
        ImageSource::Bytes(b"GIF89a-not-really".to_vec()),
        SessionConfig::default(),
    );
    let err = composer.run(req).await.unwrap_err();
    assert!(err.is_decode_failure());
}

#[tokio::test]
async fn saved_export_decodes_to_the_same_pixels() {
    let composer = Composer::new(Compositor::cpu().unwrap());
    let req = RunRequest::new(
        background_png(320, 240),
        screenshot_png(),
        SessionConfig::default(),
    );
    let output = expect_ready(composer.run(req).await.unwrap());

    let dir = std::env::temp_dir().join(format!("runstamp-run-{}", std::process::id()));
    let path = output.save(&dir, "running_stamp").unwrap();
    assert_eq!(path.extension().and_then(|e| e.to_str()), Some("png"));

    let decoded = runstamp_composer::load_image(&path).unwrap();
    assert_eq!(decoded, output.export);

    let _ = std::fs::remove_dir_all(&dir);
}
