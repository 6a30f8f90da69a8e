use render::{colors, Canvas, Viewport};

fn painted(canvas: &Canvas, color: [u8; 3]) -> usize {
    canvas.image().pixels().filter(|p| p.0 == color).count()
}

#[test]
fn clear_fills_every_pixel() {
    let mut canvas = Canvas::new(32, 16, Viewport::centered(1.0, 0.5)).unwrap();
    canvas.clear(colors::BACKGROUND);
    assert_eq!(painted(&canvas, colors::BACKGROUND), 32 * 16);
}

#[test]
fn circle_lands_where_the_viewport_says() {
    let mut canvas = Canvas::new(100, 100, Viewport::new(0.0, 10.0, 0.0, 10.0)).unwrap();
    canvas.clear(colors::BACKGROUND);
    canvas.circle((7.5, 7.5), 1.0, colors::GOAL);

    // Upper right quadrant in world space is the top right of the image.
    assert_eq!(canvas.pixel(75, 25), Some(colors::GOAL));
    assert_eq!(canvas.pixel(25, 75), Some(colors::BACKGROUND));
    let area = painted(&canvas, colors::GOAL) as f32;
    let expected = std::f32::consts::PI * 100.0;
    assert!((area - expected).abs() / expected < 0.1, "area {area}");
}

#[test]
fn off_screen_primitives_are_clipped() {
    let mut canvas = Canvas::new(20, 20, Viewport::centered(1.0, 1.0)).unwrap();
    canvas.clear(colors::BACKGROUND);
    canvas.circle((50.0, 50.0), 3.0, colors::BODY);
    canvas.line((-5.0, -5.0), (-3.0, -3.0), 0.5, colors::BODY);
    assert_eq!(painted(&canvas, colors::BODY), 0);

    canvas.rect((-10.0, -10.0), (10.0, 0.0), colors::GROUND);
    assert_eq!(painted(&canvas, colors::GROUND), 20 * 10);

    canvas.line((-10.0, 0.5), (10.0, 0.5), 0.1, colors::LINK);
    assert!(painted(&canvas, colors::LINK) >= 20);
}

#[test]
fn polyline_connects_points() {
    let mut canvas = Canvas::new(40, 40, Viewport::new(0.0, 4.0, 0.0, 4.0)).unwrap();
    canvas.clear(colors::BACKGROUND);
    canvas.polyline(&[(0.5, 0.5), (3.5, 0.5), (3.5, 3.5)], 0.2, colors::LINK);
    assert_eq!(canvas.pixel(20, 35), Some(colors::LINK));
    assert_eq!(canvas.pixel(35, 20), Some(colors::LINK));
    assert_eq!(canvas.pixel(10, 10), Some(colors::BACKGROUND));
}
