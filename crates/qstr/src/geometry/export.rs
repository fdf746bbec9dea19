//! Shape export for visualization (no consistency role).

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use geo::BoundingRect;
use geo_types::{LineString, MultiPolygon};

use crate::error::{EngineError, Result};

/// Receives every non-empty shape set requested by a `draw` term.
pub trait ShapeSink: Send + Sync {
    fn export(&self, name: &str, shapes: &[&MultiPolygon<f64>]) -> Result<()>;
}

/// Drops all exports.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl ShapeSink for NullSink {
    fn export(&self, _name: &str, _shapes: &[&MultiPolygon<f64>]) -> Result<()> {
        Ok(())
    }
}

/// Writes `<dir>/<name>.svg`, one path per shape, later shapes on top.
#[derive(Clone, Debug)]
pub struct SvgSink {
    dir: PathBuf,
}

const PALETTE: [&str; 6] = [
    "#4e79a7", "#f28e2b", "#59a14f", "#e15759", "#b07aa1", "#76b7b2",
];

impl SvgSink {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// File the export of `name` lands in. Bytes outside `[A-Za-z0-9_+-]`
    /// are percent-encoded, so distinct names never share a file.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let mut stem = String::with_capacity(name.len());
        for b in name.bytes() {
            if b.is_ascii_alphanumeric() || matches!(b, b'_' | b'+' | b'-') {
                stem.push(char::from(b));
            } else {
                let _ = write!(stem, "%{b:02X}");
            }
        }
        self.dir.join(format!("{stem}.svg"))
    }

    pub fn render(shapes: &[&MultiPolygon<f64>]) -> String {
        let (mut x0, mut y0) = (f64::INFINITY, f64::INFINITY);
        let (mut x1, mut y1) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for r in shapes.iter().filter_map(|mp| mp.bounding_rect()) {
            x0 = x0.min(r.min().x);
            y0 = y0.min(r.min().y);
            x1 = x1.max(r.max().x);
            y1 = y1.max(r.max().y);
        }
        if !x0.is_finite() {
            (x0, y0, x1, y1) = (0.0, 0.0, 1.0, 1.0);
        }
        let pad = 0.05 * (x1 - x0).max(y1 - y0).max(1e-9);
        let (w, h) = (x1 - x0 + 2.0 * pad, y1 - y0 + 2.0 * pad);
        let mut out = String::new();
        let _ = writeln!(
            out,
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
            x0 - pad,
            -(y1 + pad),
            w,
            h
        );
        // y axis points up in the plane, down in SVG
        let _ = writeln!(out, r#"<g transform="scale(1,-1)">"#);
        for (k, mp) in shapes.iter().enumerate() {
            let mut d = String::new();
            for poly in mp.iter() {
                push_ring(&mut d, poly.exterior());
                for hole in poly.interiors() {
                    push_ring(&mut d, hole);
                }
            }
            let _ = writeln!(
                out,
                r#"<path d="{}" fill="{}" fill-opacity="0.5" fill-rule="evenodd" stroke="black" stroke-width="{}"/>"#,
                d.trim_end(),
                PALETTE[k % PALETTE.len()],
                pad * 0.05
            );
        }
        out.push_str("</g>\n</svg>\n");
        out
    }
}

fn push_ring(d: &mut String, ring: &LineString<f64>) {
    for (k, c) in ring.coords().enumerate() {
        let cmd = if k == 0 { 'M' } else { 'L' };
        let _ = write!(d, "{cmd}{} {} ", c.x, c.y);
    }
    d.push_str("Z ");
}

impl ShapeSink for SvgSink {
    fn export(&self, name: &str, shapes: &[&MultiPolygon<f64>]) -> Result<()> {
        let path = self.path_for(name);
        let io = |source| EngineError::Export {
            name: name.to_string(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(io)?;
        fs::write(&path, Self::render(shapes)).map_err(io)?;
        tracing::debug!(name, path = %path.display(), shapes = shapes.len(), "exported shapes");
        Ok(())
    }
}
