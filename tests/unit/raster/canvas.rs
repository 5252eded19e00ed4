use super::*;

fn run(text: &str) -> TextRun {
    TextRun {
        text: text.to_string(),
        anchor: (8.0, 8.0),
        size_px: 12.0,
        color: Rgba8::WHITE,
        shadow: None,
    }
}

#[test]
fn fresh_canvas_needs_first_upload() {
    let mut canvas = Canvas2D::new(16, 16);
    assert!(canvas.needs_upload());
    canvas.mark_uploaded(canvas.revision());
    assert!(!canvas.needs_upload());
}

#[test]
fn clear_drops_previous_commands_and_flags_upload() {
    let mut canvas = Canvas2D::new(16, 16);
    canvas.fill_text(run("a long previous label"));
    canvas.mark_uploaded(canvas.revision());

    canvas.clear();
    canvas.fill_text(run(""));
    assert!(canvas.needs_upload());
    assert_eq!(canvas.texts().collect::<Vec<_>>(), vec![""]);
    assert_eq!(canvas.commands().len(), 1);
}
