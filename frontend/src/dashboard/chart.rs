use dioxus::prelude::*;
use satview_shared::SeriesBuffer;

const VIEW_W: f64 = 1200.0;
const LEFT: f64 = 60.0;
const RIGHT_PAD: f64 = 20.0;
const TOP: f64 = 20.0;
const BOTTOM_PAD: f64 = 20.0;

/// Past this many points the series is bucketed, keeping each bucket's min and max.
const MAX_BUCKETS: usize = 1200;

const LINE_COLOR: &str = "#f97316";

/// Polyline for the whole series plus the ranges the axis labels show.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    /// `"x,y x,y ..."`, ready for `<polyline points=...>`.
    pub points: String,
    pub y_min: f64,
    pub y_max: f64,
    pub first_index: u64,
    pub last_index: u64,
}

impl Polyline {
    fn empty() -> Self {
        Self {
            points: String::new(),
            y_min: 0.0,
            y_max: 1.0,
            first_index: 0,
            last_index: 0,
        }
    }
}

pub fn series_chart(series: &SeriesBuffer, height: f64) -> Element {
    let view_h = height.max(220.0);
    let right = VIEW_W - RIGHT_PAD;
    let inner_w = right - LEFT;
    let inner_h = view_h - TOP - BOTTOM_PAD;
    let grid_x_step = inner_w / 6.0;
    let grid_y_step = inner_h / 6.0;

    let plot = build_polyline(series, VIEW_W, view_h);
    let y_mid = (plot.y_min + plot.y_max) * 0.5;
    let mid_index = plot.first_index + (plot.last_index - plot.first_index) / 2;

    rsx! {
        svg {
            style: "width:100%; height:auto; display:block;",
            view_box: "0 0 {VIEW_W} {view_h}",

            // gridlines
            for i in 1..=5 {
                line {
                    x1:"{LEFT}", y1:"{TOP + grid_y_step * (i as f64)}",
                    x2:"{right}", y2:"{TOP + grid_y_step * (i as f64)}",
                    stroke:"#1f2937", "stroke-width":"1"
                }
            }
            for i in 1..=5 {
                line {
                    x1:"{LEFT + grid_x_step * (i as f64)}", y1:"{TOP}",
                    x2:"{LEFT + grid_x_step * (i as f64)}", y2:"{view_h - BOTTOM_PAD}",
                    stroke:"#1f2937", "stroke-width":"1"
                }
            }

            // axes
            line { x1:"{LEFT}", y1:"{TOP}", x2:"{LEFT}", y2:"{view_h - BOTTOM_PAD}", stroke:"#334155", stroke_width:"1" }
            line { x1:"{LEFT}", y1:"{view_h - BOTTOM_PAD}", x2:"{right}", y2:"{view_h - BOTTOM_PAD}", stroke:"#334155", stroke_width:"1" }

            // y labels
            text { x:"10", y:"{TOP + 6.0}", fill:"#94a3b8", "font-size":"10", {format!("{:.0}", plot.y_max)} }
            text { x:"10", y:"{TOP + inner_h / 2.0 + 4.0}", fill:"#94a3b8", "font-size":"10", {format!("{:.0}", y_mid)} }
            text { x:"10", y:"{view_h - BOTTOM_PAD + 4.0}", fill:"#94a3b8", "font-size":"10", {format!("{:.0}", plot.y_min)} }

            // x labels (step index)
            text { x:"{LEFT + 4.0}", y:"{view_h - 5.0}", fill:"#94a3b8", "font-size":"10", "{plot.first_index}" }
            text { x:"{VIEW_W * 0.5}", y:"{view_h - 5.0}", fill:"#94a3b8", "font-size":"10", "{mid_index}" }
            text { x:"{right - 40.0}", y:"{view_h - 5.0}", fill:"#94a3b8", "font-size":"10", "{plot.last_index}" }

            if !plot.points.is_empty() {
                polyline {
                    points: "{plot.points}",
                    fill: "none",
                    stroke: LINE_COLOR,
                    stroke_width: "2",
                    stroke_linejoin: "round",
                    stroke_linecap: "round",
                }
            }
        }
    }
}

/// Map the series onto the plot area: x by index from first to last point, y auto-scaled
/// to the value range (a flat series gets a unit range so it draws along the bottom).
pub fn build_polyline(series: &SeriesBuffer, width: f64, height: f64) -> Polyline {
    let points = series.points();
    let (Some(first), Some(last), Some((y_min, mut y_max))) =
        (points.first(), points.last(), series.value_range())
    else {
        return Polyline::empty();
    };
    if (y_max - y_min).abs() < 1e-9 {
        y_max = y_min + 1.0;
    }

    let right = width - RIGHT_PAD;
    let bottom = height - BOTTOM_PAD;
    let plot_w = right - LEFT;
    let plot_h = bottom - TOP;

    let span = last.index.saturating_sub(first.index).max(1) as f64;
    let map_x = |index: u64| LEFT + plot_w * ((index - first.index) as f64 / span);
    let map_y = |v: f64| bottom - ((v - y_min) / (y_max - y_min)) * plot_h;

    let mut out = String::new();
    let mut push_point = |x: f64, y: f64| {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("{x:.2},{y:.2}"));
    };

    if points.len() <= MAX_BUCKETS {
        for p in points {
            push_point(map_x(p.index), map_y(p.value));
        }
    } else {
        // chunk boundaries by position; the x of a bucket is its first point's index
        let total = points.len();
        let mut start = 0;
        for b in 0..MAX_BUCKETS {
            let end = ((b + 1) * total) / MAX_BUCKETS;
            let bucket = &points[start..end];
            start = end;
            let Some(head) = bucket.first() else { continue };

            let (lo, hi) = bucket.iter().fold((f64::MAX, f64::MIN), |(lo, hi), p| {
                (lo.min(p.value), hi.max(p.value))
            });
            let x = map_x(head.index);
            push_point(x, map_y(lo));
            if hi > lo {
                push_point(x, map_y(hi));
            }
        }
    }

    Polyline {
        points: out,
        y_min,
        y_max,
        first_index: first.index,
        last_index: last.index,
    }
}
