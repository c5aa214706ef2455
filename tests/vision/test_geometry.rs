// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Detector output normalization

use ocr_translate_node::vision::geometry::{to_boxes, GeometryConfig, Point};
use ocr_translate_node::vision::{to_box, Detection, PixelBox};

fn config() -> GeometryConfig {
    GeometryConfig::default()
}

#[test]
fn test_degenerate_polygons_are_dropped() {
    let single = Detection::polygon(vec![Point::new(10.0, 10.0)]);
    assert!(to_box(&single, 640, 480, &config()).is_none());

    let empty = Detection::polygon(Vec::new());
    assert!(to_box(&empty, 640, 480, &config()).is_none());

    // Collinear points collapse to zero height
    let flat = Detection::polygon(vec![
        Point::new(10.0, 50.0),
        Point::new(90.0, 50.0),
        Point::new(200.0, 50.0),
    ]);
    assert!(to_box(&flat, 640, 480, &config()).is_none());
}

#[test]
fn test_two_point_detection() {
    let diagonal = Detection::polygon(vec![Point::new(120.0, 80.0), Point::new(20.0, 40.0)]);
    let tb = to_box(&diagonal, 640, 480, &config()).unwrap();
    assert_eq!(tb.bbox, PixelBox::new(20, 40, 120, 80).unwrap());
}

#[test]
fn test_rotated_quad_takes_extent() {
    let quad = Detection::polygon(vec![
        Point::new(30.0, 60.0),
        Point::new(200.0, 40.0),
        Point::new(205.0, 90.0),
        Point::new(35.0, 110.0),
    ]);
    let tb = to_box(&quad, 640, 480, &config()).unwrap();
    assert_eq!(tb.bbox, PixelBox::new(30, 40, 205, 110).unwrap());
}

#[test]
fn test_ratio_coordinates_scaled_to_image() {
    let d = Detection::rect(0.1, 0.25, 0.5, 0.5).in_ratio_space();
    let tb = to_box(&d, 800, 400, &config()).unwrap();
    assert_eq!(tb.bbox, PixelBox::new(80, 100, 400, 200).unwrap());
}

#[test]
fn test_out_of_bounds_clamped() {
    let d = Detection::rect(-25.0, -10.0, 700.0, 60.0);
    let tb = to_box(&d, 640, 480, &config()).unwrap();
    assert_eq!(tb.bbox, PixelBox::new(0, 0, 640, 60).unwrap());
}

#[test]
fn test_nan_skipped_without_failing_batch() {
    let detections = vec![
        Detection::rect(f32::NAN, 10.0, 100.0, 50.0),
        Detection::rect(10.0, 10.0, 100.0, 50.0).with_text("kept"),
    ];
    let boxes = to_boxes(&detections, 640, 480, &config());
    assert_eq!(boxes.len(), 1);
    assert_eq!(boxes[0].text.as_deref(), Some("kept"));
}

#[test]
fn test_small_area_filtered() {
    // 8x8 = 64 px² is below the 100 px² default
    let tiny = Detection::rect(10.0, 10.0, 18.0, 18.0);
    assert!(to_box(&tiny, 640, 480, &config()).is_none());

    let custom = GeometryConfig {
        min_area: 50,
        min_side: 1,
    };
    assert!(to_box(&tiny, 640, 480, &custom).is_some());
}

#[test]
fn test_confidence_carried() {
    let d = Detection::rect(10.0, 10.0, 100.0, 50.0).with_confidence(0.87);
    let tb = to_box(&d, 640, 480, &config()).unwrap();
    assert_eq!(tb.confidence, Some(0.87));
}
