use std::path::Path;

use glam::DVec2;
use moircs_mask::canvas::{Canvas, MemoryCanvas};
use moircs_mask::codec::mdp::read_mdp;
use moircs_mask::settings::Settings;
use moircs_mask::{MaskSession, ShapeEdit, ShapeKind, ShapeState};
use tempfile::TempDir;

fn session() -> MaskSession<MemoryCanvas> {
    let mut session = MaskSession::new(MemoryCanvas::new(), &Settings::default());
    session.start();
    session.set_image("frame.fits", 2048, 3600);
    session.show_fov(true, true);
    session
        .load_mdp(Path::new("./test/sample.mdp"))
        .expect("fixture loads");
    session
}

#[test]
fn design_and_save_round_trip() {
    let dir = TempDir::new().unwrap();
    let mut session = session();

    assert_eq!(session.auto_detect_overlaps(), 1);
    session
        .add_shape(ShapeKind::default_hole(), DVec2::new(1600.0, 1500.0), "new star")
        .unwrap();
    let edit = ShapeEdit::parse_slit("1300", "1620", "90", "7", "0", "target C").unwrap();
    session.edit_shape(2, edit).unwrap();
    session.delete_shape(4).unwrap();

    let mdp = dir.path().join("mask.mdp");
    session.save_mdp(&mdp).unwrap();
    let text = std::fs::read_to_string(&mdp).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert_eq!(text.lines().filter(|l| l.starts_with('#')).count(), 2);

    let reread = read_mdp(&mdp).unwrap();
    let expected: Vec<_> = session.shapes().iter().filter(|s| s.is_active()).collect();
    assert_eq!(reread.len(), expected.len());
    assert_eq!(reread[1].position, DVec2::new(1300.0, 1620.0));
    assert_eq!(reread[3].comment, "new star");
    assert!(reread.iter().all(|s| s.state == ShapeState::Active));
}

#[test]
fn sbr_skips_unreachable_shapes() {
    let dir = TempDir::new().unwrap();
    let mut session = session();
    // Inside the field circle but beyond the slit x limit of the cutter
    session
        .add_shape(ShapeKind::default_slit(), DVec2::new(2100.0, 1950.0), "edge")
        .unwrap();

    let sbr = dir.path().join("mask.sbr");
    let report = session.save_sbr(&sbr, DVec2::new(1084.0, 1786.0)).unwrap();
    assert_eq!(report.written, 5);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].index, 5);

    let text = std::fs::read_to_string(&sbr).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("# mdp: "));
    assert_eq!(lines[1], "# Image: frame.fits");
    assert_eq!(lines.len(), 3 + 5);
    assert_eq!(lines.iter().filter(|l| l.starts_with("B,")).count(), 3);
    assert_eq!(lines.iter().filter(|l| l.starts_with("C,")).count(), 2);
}

#[test]
fn undo_walks_back_every_edit() {
    let mut session = session();
    let original = session.shapes().to_vec();
    session.set_included(0, false).unwrap();
    session.delete_shape(1).unwrap();
    session
        .add_shape(ShapeKind::default_hole(), DVec2::new(1200.0, 2000.0), "")
        .unwrap();
    assert_eq!(session.undo_depth(), 3);
    while session.undo() {}
    assert_eq!(session.shapes(), &original[..]);
    assert!(session.canvas().redraws() > 0);
    assert!(session.canvas().get("slit0").is_some());
}

#[test]
fn sbr_cuts_overlap_excluded_shapes() {
    let dir = TempDir::new().unwrap();
    let mut session = session();
    assert_eq!(session.auto_detect_overlaps(), 1);
    session.delete_shape(4).unwrap();

    let sbr = dir.path().join("mask.sbr");
    let report = session.save_sbr(&sbr, DVec2::new(1084.0, 1786.0)).unwrap();
    assert_eq!(report.written, 4);
    assert!(report.skipped.is_empty());

    let text = std::fs::read_to_string(&sbr).unwrap();
    let cuts: Vec<&str> = text.lines().skip(3).collect();
    assert_eq!(cuts.len(), 4);
    assert_eq!(cuts.iter().filter(|l| l.starts_with("B,")).count(), 3);
    assert_eq!(cuts.iter().filter(|l| l.starts_with("C,")).count(), 1);
}
