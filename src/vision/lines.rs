// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text-line grouping
//!
//! Boxes are assigned to lines with a single top-to-bottom sweep over their
//! vertical centers. Lines come out top-to-bottom, boxes inside a line
//! left-to-right.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::geometry::{PixelBox, TextBox};

/// Whether detections are grouped into lines before cropping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineSeparation {
    /// Group boxes by vertical-center proximity
    #[default]
    Auto,
    /// Treat all boxes as one line
    No,
}

impl FromStr for LineSeparation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "auto" | "yes" => Ok(Self::Auto),
            "no" | "off" => Ok(Self::No),
            other => Err(format!(
                "Invalid line_separation '{}': expected auto or no",
                other
            )),
        }
    }
}

/// An ordered run of boxes on one visual text line
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub boxes: Vec<TextBox>,
    /// Union of the member boxes
    pub bbox: PixelBox,
}

impl Line {
    fn from_boxes(mut boxes: Vec<TextBox>) -> Option<Self> {
        boxes.sort_by_key(|b| b.bbox.x_min);
        let first = boxes.first()?.bbox;
        let bbox = boxes.iter().fold(first, |acc, b| acc.union(&b.bbox));
        Some(Self { boxes, bbox })
    }

    /// Member texts joined left-to-right with single spaces
    pub fn text(&self) -> String {
        self.boxes
            .iter()
            .filter_map(|b| b.text.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Mean detector/recognizer confidence over members that carry one
    pub fn mean_confidence(&self) -> Option<f32> {
        let scores: Vec<f32> = self.boxes.iter().filter_map(|b| b.confidence).collect();
        if scores.is_empty() {
            None
        } else {
            Some(scores.iter().sum::<f32>() / scores.len() as f32)
        }
    }
}

/// Group boxes into lines
///
/// A box joins the current line when
/// `|y_c - last.y_c| < overlap_ratio * max(h, last.h)`, where `last` is the
/// most recently added box. Ties in `y_c` keep their input order.
pub fn group_lines(boxes: &[TextBox], overlap_ratio: f32) -> Vec<Line> {
    let mut sorted: Vec<&TextBox> = boxes.iter().collect();
    // sort_by is stable
    sorted.sort_by(|a, b| a.bbox.center_y().total_cmp(&b.bbox.center_y()));

    let mut groups: Vec<Vec<TextBox>> = Vec::new();
    let mut current: Vec<TextBox> = Vec::new();

    for tb in sorted {
        if let Some(last) = current.last() {
            let dy = (tb.bbox.center_y() - last.bbox.center_y()).abs();
            let h = tb.bbox.height().max(last.bbox.height()) as f32;
            if dy >= overlap_ratio * h {
                groups.push(std::mem::take(&mut current));
            }
        }
        current.push(tb.clone());
    }
    if !current.is_empty() {
        groups.push(current);
    }

    groups.into_iter().filter_map(Line::from_boxes).collect()
}

/// Every box on one line, ordered by `x_min`
pub fn single_line(boxes: &[TextBox]) -> Vec<Line> {
    Line::from_boxes(boxes.to_vec()).into_iter().collect()
}

/// Group according to the requested mode
pub fn arrange(boxes: &[TextBox], mode: LineSeparation, overlap_ratio: f32) -> Vec<Line> {
    match mode {
        LineSeparation::Auto => group_lines(boxes, overlap_ratio),
        LineSeparation::No => single_line(boxes),
    }
}
