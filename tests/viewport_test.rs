use approx::assert_relative_eq;
use carousel::viewport::Viewport;

#[test]
fn aspect_is_width_over_height() {
    let viewport = Viewport::from_container(1280.0, 720.0, 1.0);
    assert_eq!(viewport.aspect, 1280.0 / 720.0);
    assert_eq!(viewport.size(), [1280, 720]);
}

#[test]
fn surface_scales_with_pixel_ratio() {
    let viewport = Viewport::from_container(801.0, 601.0, 1.5);
    assert_relative_eq!(viewport.aspect, 801.0 / 601.0);
    assert_eq!(viewport.size(), [1202, 902]);
}

#[test]
fn degenerate_sizes_clamp_to_one_pixel() {
    let viewport = Viewport::from_container(640.0, 0.0, 2.0);
    assert_eq!(viewport.aspect, 640.0);
    assert_eq!(viewport.size(), [1280, 2]);

    let viewport = Viewport::from_container(f64::NAN, -3.0, 1.0);
    assert_eq!(viewport.size(), [1, 1]);
    assert_eq!(viewport.aspect, 1.0);
}

#[test]
fn resizing_twice_gives_the_same_viewport() {
    let first = Viewport::from_container(1024.0, 768.0, 2.0);
    assert_eq!(first, Viewport::from_container(1024.0, 768.0, 2.0));
}
