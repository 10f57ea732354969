//! End-to-end viewer flows without a browser
//!
//! Drives `ViewerShell` the way the wasm layer does: load a payload, report
//! page renders, zoom, and read back overlays.
//!
//! Run with: cargo test -p citeview-core --test viewer_scenarios

use base64::{engine::general_purpose::STANDARD, Engine};
use citeview_core::{
    classify_json, BoundingBox, CanvasMeasurement, DocumentState, PageRenderListener,
    PageRendered, PageSize, PixelRect, RenderEpoch, TrackerUpdate, ViewerConfig, ViewerError,
    ViewerShell,
};
use lopdf::{dictionary, Document, Object};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

// ============================================================
// Fixtures
// ============================================================

/// Build a PDF with `num_pages` US Letter pages
fn create_test_pdf(num_pages: u32) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..num_pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            })
            .into()
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => num_pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

fn data_url(bytes: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(bytes))
}

/// Load a document of `num_pages` and return the shell with the first render epoch
fn open(num_pages: u32, citations: Vec<BoundingBox>) -> (ViewerShell, RenderEpoch) {
    let mut shell = ViewerShell::new(ViewerConfig::default()).unwrap();
    shell.set_citations(citations);

    let request = shell
        .load_document(&data_url(&create_test_pdf(num_pages)))
        .unwrap()
        .unwrap();
    let plan = shell
        .document_loaded(&request.digest, num_pages)
        .unwrap()
        .unwrap();
    (shell, plan.epoch)
}

fn render(shell: &mut ViewerShell, page_number: u32, epoch: RenderEpoch, w: u32, h: u32) {
    let update = shell.on_page_rendered(PageRendered {
        page_number,
        epoch,
        original: PageSize::new(612.0, 792.0),
        canvas: Some(CanvasMeasurement::new(w, h, 1.0)),
    });
    assert!(matches!(update, TrackerUpdate::Measured { .. }));
}

fn rects(shell: &ViewerShell, page_number: u32) -> Vec<PixelRect> {
    shell
        .overlay(page_number)
        .map(|overlay| overlay.regions.into_iter().map(|r| r.rect).collect())
        .unwrap_or_default()
}

fn assert_rect(rect: &PixelRect, left: f64, top: f64, width: f64, height: f64) {
    let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
    assert!(
        close(rect.left, left)
            && close(rect.top, top)
            && close(rect.width, width)
            && close(rect.height, height),
        "unexpected rect {:?}",
        rect
    );
}

fn red_citation() -> BoundingBox {
    BoundingBox::new(1, 0.1, 0.2, 0.3, 0.05)
        .with_id("a")
        .with_color("border-red-500")
}

// ============================================================
// Mapping
// ============================================================

#[test]
fn maps_citation_onto_measured_page() {
    let (mut shell, epoch) = open(1, vec![red_citation()]);
    render(&mut shell, 1, epoch, 800, 1000);

    let overlay = shell.overlay(1).unwrap();
    assert_eq!(overlay.len(), 1);
    assert_eq!(overlay.regions[0].class_name(), "border-red-500");
    assert_rect(&overlay.regions[0].rect, 80.0, 200.0, 240.0, 50.0);
}

#[test]
fn each_page_gets_only_its_own_citations() {
    let (mut shell, epoch) = open(
        2,
        vec![
            BoundingBox::new(1, 0.1, 0.1, 0.2, 0.2).with_id("first"),
            BoundingBox::new(2, 0.5, 0.5, 0.2, 0.2).with_id("second"),
        ],
    );
    render(&mut shell, 1, epoch, 800, 1000);
    render(&mut shell, 2, epoch, 800, 1000);

    let first = shell.overlay(1).unwrap();
    let second = shell.overlay(2).unwrap();
    assert_eq!(first.len(), 1);
    assert_eq!(second.len(), 1);
    assert_eq!(first.regions[0].citation.id.as_deref(), Some("first"));
    assert_eq!(second.regions[0].citation.id.as_deref(), Some("second"));
}

// ============================================================
// Zoom and staleness
// ============================================================

#[test]
fn zoom_remaps_after_fresh_render() {
    let config = ViewerConfig {
        scale_step: 0.5,
        ..ViewerConfig::default()
    };
    let mut shell = ViewerShell::new(config).unwrap();
    shell.set_citations(vec![red_citation()]);
    let request = shell
        .load_document(&data_url(&create_test_pdf(1)))
        .unwrap()
        .unwrap();
    let first = shell
        .document_loaded(&request.digest, 1)
        .unwrap()
        .unwrap();
    render(&mut shell, 1, first.epoch, 800, 1000);
    assert_rect(&rects(&shell, 1)[0], 80.0, 200.0, 240.0, 50.0);

    let second = shell.zoom_in().unwrap();
    assert_eq!(second.scale, 1.5);

    // Between the scale change and the new render nothing is drawn
    assert!(rects(&shell, 1).is_empty());

    // The render requested at 1.0 finishing late must not resurrect old dimensions
    let late = shell.on_page_rendered(PageRendered {
        page_number: 1,
        epoch: first.epoch,
        original: PageSize::new(612.0, 792.0),
        canvas: Some(CanvasMeasurement::new(800, 1000, 1.0)),
    });
    assert!(matches!(late, TrackerUpdate::Stale { .. }));
    assert!(rects(&shell, 1).is_empty());

    render(&mut shell, 1, second.epoch, 1200, 1500);
    assert_rect(&rects(&shell, 1)[0], 120.0, 300.0, 360.0, 75.0);
}

#[test]
fn unmeasured_pages_draw_nothing() {
    let (mut shell, epoch) = open(
        2,
        vec![
            BoundingBox::new(1, 0.1, 0.1, 0.2, 0.2),
            BoundingBox::new(2, 0.1, 0.1, 0.2, 0.2),
        ],
    );
    assert!(shell.overlay(1).is_none());
    assert!(shell.overlay(2).is_none());

    render(&mut shell, 2, epoch, 800, 1000);
    assert!(shell.overlay(1).is_none());
    assert_eq!(rects(&shell, 2).len(), 1);
}

#[test]
fn missing_canvas_defers_overlay() {
    let (mut shell, epoch) = open(1, vec![red_citation()]);
    let update = shell.on_page_rendered(PageRendered {
        page_number: 1,
        epoch,
        original: PageSize::new(612.0, 792.0),
        canvas: None,
    });
    assert_eq!(update, TrackerUpdate::CanvasMissing { page_number: 1 });
    assert!(shell.overlay(1).is_none());

    render(&mut shell, 1, epoch, 800, 1000);
    assert_eq!(rects(&shell, 1).len(), 1);
}

// ============================================================
// Out-of-range citations
// ============================================================

#[test]
fn citation_beyond_last_page_is_dropped() {
    let (mut shell, epoch) = open(
        3,
        vec![BoundingBox::new(5, 0.1, 0.1, 0.2, 0.2).with_id("ghost")],
    );
    for page in 1..=3 {
        render(&mut shell, page, epoch, 800, 1000);
    }

    assert!(shell.page_numbers().all(|page| rects(&shell, page).is_empty()));
    assert!(shell.overlay(5).is_none());
    assert_eq!(shell.annotation_count(), 0);
    assert_eq!(
        shell.dropped_citations()[0].citation.id.as_deref(),
        Some("ghost")
    );
}

// ============================================================
// Hit testing
// ============================================================

#[test]
fn click_resolves_to_the_citation_under_the_pointer() {
    let (mut shell, epoch) = open(1, vec![red_citation()]);
    render(&mut shell, 1, epoch, 800, 1000);

    let hit = shell.citation_at(1, 100.0, 220.0).unwrap();
    assert_eq!(hit.id.as_deref(), Some("a"));

    // Just outside on each side
    assert!(shell.citation_at(1, 79.9, 220.0).is_none());
    assert!(shell.citation_at(1, 320.0, 220.0).is_none());
    assert!(shell.citation_at(1, 100.0, 199.9).is_none());
    assert!(shell.citation_at(1, 100.0, 250.0).is_none());
    assert!(shell.citation_at(2, 100.0, 220.0).is_none());
}

// ============================================================
// Document lifecycle
// ============================================================

#[test]
fn local_inspection_supplies_placeholder_sizes() {
    let mut shell = ViewerShell::new(ViewerConfig::default()).unwrap();
    let request = shell
        .load_document(&data_url(&create_test_pdf(2)))
        .unwrap()
        .unwrap();
    assert_eq!(
        request.page_sizes,
        Some(vec![PageSize::new(612.0, 792.0), PageSize::new(612.0, 792.0)])
    );
}

#[test]
fn oversized_document_is_refused_before_rendering() {
    let mut shell = ViewerShell::new(ViewerConfig::default()).unwrap();
    let result = shell.load_document(&data_url(&create_test_pdf(31)));
    assert!(matches!(
        result,
        Err(ViewerError::PageLimitExceeded { pages: 31, max: 30 })
    ));
    assert_eq!(shell.state().as_str(), "failed");
}

#[test]
fn thirty_pages_is_accepted() {
    let (shell, _) = open(30, Vec::new());
    assert_eq!(shell.page_numbers().count(), 30);
}

#[test]
fn reloading_same_document_keeps_measurements() {
    let pdf = create_test_pdf(1);
    let (mut shell, epoch) = open(1, vec![red_citation()]);
    render(&mut shell, 1, epoch, 800, 1000);

    assert!(shell.load_document(&data_url(&pdf)).unwrap().is_none());
    assert!(matches!(shell.state(), DocumentState::Ready { num_pages: 1, .. }));
    assert_eq!(rects(&shell, 1).len(), 1);
}

#[test]
fn classified_summary_feeds_the_viewer() {
    let json = serde_json::json!({
        "risk_assessment": {
            "high_risk_items": [{
                "title": "Indemnity",
                "severity": "high",
                "source_citation": {
                    "bounding_box": {"x": 0.1, "y": 0.2, "width": 0.3, "height": 0.05},
                    "page_number": 1
                }
            }]
        }
    })
    .to_string();

    let (mut shell, epoch) = open(1, classify_json(&json).unwrap());
    render(&mut shell, 1, epoch, 800, 1000);

    let overlay = shell.overlay(1).unwrap();
    assert_eq!(overlay.regions[0].key, "high-0");
    assert_eq!(overlay.regions[0].class_name(), "border-red-500");
    assert_rect(&overlay.regions[0].rect, 80.0, 200.0, 240.0, 50.0);
}

// ============================================================
// Properties
// ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// After any sequence of zooms, overlays only ever use the latest render
    #[test]
    fn overlays_follow_latest_render(steps in prop::collection::vec(any::<bool>(), 1..8)) {
        let (mut shell, mut epoch) = open(1, vec![red_citation()]);
        render(&mut shell, 1, epoch, 800, 1000);

        for zoom_in in steps {
            let plan = if zoom_in { shell.zoom_in() } else { shell.zoom_out() };
            let Some(plan) = plan else { continue };

            prop_assert!(shell.overlay(1).is_none());

            let stale = shell.on_page_rendered(PageRendered {
                page_number: 1,
                epoch,
                original: PageSize::new(612.0, 792.0),
                canvas: Some(CanvasMeasurement::new(1, 1, 1.0)),
            });
            let is_stale = matches!(stale, TrackerUpdate::Stale { .. });
            prop_assert!(is_stale);

            let w = (800.0 * plan.scale).round() as u32;
            let h = (1000.0 * plan.scale).round() as u32;
            render(&mut shell, 1, plan.epoch, w, h);
            epoch = plan.epoch;

            let overlay = shell.overlay(1).unwrap();
            prop_assert_eq!(overlay.dimensions.rendered_width, w as f64);
            let rect = overlay.regions[0].rect;
            prop_assert!((rect.left - 0.1 * w as f64).abs() < 1e-9);
            prop_assert!((rect.height - 0.05 * h as f64).abs() < 1e-9);
        }
    }
}
