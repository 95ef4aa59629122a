//! Primitive assembly (data model §3's "Primitive" production) and the
//! point/line-to-quad expansion SPEC_FULL §4.7 adds: points and lines are
//! never special-cased past this stage, they are turned into degenerate
//! triangle pairs and handed to the same setup/outline path as every other
//! triangle.

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Topology {
    Points,
    Lines,
    LineStrip,
    LineLoop,
    Triangles,
    TriangleStrip,
    TriangleFan,
}

/// One post-vertex-shader row: varying registers followed by clip-space
/// position, the same order `vertex.rs`'s output buffer lays them out in
/// (spec §3's per-vertex record).
#[derive(Debug, Clone)]
pub struct VertexRow {
    pub varyings: Vec<[f32; 4]>,
    pub position: [f32; 4],
}

impl VertexRow {
    pub fn new(varying_count: usize) -> VertexRow {
        VertexRow { varyings: vec![[0.0; 4]; varying_count], position: [0.0; 4] }
    }

    /// Linear interpolation between `self` and `other`, used both for
    /// clip-plane intersection (`clip.rs`) and for synthesizing the extra
    /// corners of a point/line's expanded quad.
    pub fn lerp(&self, other: &VertexRow, t: f32) -> VertexRow {
        let varyings = self.varyings.iter().zip(&other.varyings).map(|(a, b)| lerp4(*a, *b, t)).collect();
        VertexRow { varyings, position: lerp4(self.position, other.position, t) }
    }
}

fn lerp4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t, a[3] + (b[3] - a[3]) * t]
}

/// Walks `indices` against `topology`, yielding one triangle (as three
/// indices into the vertex-shaded batch) at a time. Points and lines are
/// not indices this function produces — see `assemble_lines`/callers that
/// expand those topologies to quads before this function ever sees them.
pub fn assemble_triangles(topology: Topology, indices: &[u32]) -> Vec<[u32; 3]> {
    match topology {
        Topology::Triangles => indices.chunks_exact(3).map(|c| [c[0], c[1], c[2]]).collect(),
        Topology::TriangleStrip => {
            let mut out = Vec::new();
            for (i, w) in indices.windows(3).enumerate() {
                // Alternating winding keeps every triangle in a strip
                // front-facing under the same convention (spec §9).
                if i % 2 == 0 {
                    out.push([w[0], w[1], w[2]]);
                } else {
                    out.push([w[1], w[0], w[2]]);
                }
            }
            out
        }
        Topology::TriangleFan => {
            if indices.is_empty() {
                return Vec::new();
            }
            let hub = indices[0];
            indices[1..].windows(2).map(|w| [hub, w[0], w[1]]).collect()
        }
        Topology::Points | Topology::Lines | Topology::LineStrip | Topology::LineLoop => Vec::new(),
    }
}

/// Walks `indices` against a line topology, yielding one segment (as two
/// indices) at a time.
pub fn assemble_lines(topology: Topology, indices: &[u32]) -> SmallVec<[[u32; 2]; 8]> {
    match topology {
        Topology::Lines => indices.chunks_exact(2).map(|c| [c[0], c[1]]).collect(),
        Topology::LineStrip => indices.windows(2).map(|w| [w[0], w[1]]).collect(),
        Topology::LineLoop => {
            if indices.len() < 2 {
                return SmallVec::new();
            }
            let mut segs: SmallVec<[[u32; 2]; 8]> = indices.windows(2).map(|w| [w[0], w[1]]).collect();
            segs.push([indices[indices.len() - 1], indices[0]]);
            segs
        }
        _ => SmallVec::new(),
    }
}

/// Expands a point sprite into a single screen-aligned quad centered on
/// `center`, `size` pixels wide, returned as two triangles sharing the
/// diagonal (spec §4.7: "point sprites -> single centered quad").
///
/// The expansion is done directly in clip space on `x`/`y` scaled by `w`
/// so the quad's screen-space size is `size` pixels after the perspective
/// divide the raster driver performs downstream; `size` is assumed to
/// already be in clip-space units for the common orthographic/identity-`w`
/// case this core targets (perspective-correct point sizing is left to
/// the vertex shader's `gl_PointSize` plumbing, which this core does not
/// wire into the quad expansion itself — see `DESIGN.md`).
pub fn expand_point_to_quad(center: &VertexRow, size: f32) -> [VertexRow; 4] {
    let half = size * 0.5 * center.position[3].max(1e-6);
    let mut tl = center.clone();
    tl.position[0] -= half;
    tl.position[1] -= half;
    let mut tr = center.clone();
    tr.position[0] += half;
    tr.position[1] -= half;
    let mut bl = center.clone();
    bl.position[0] -= half;
    bl.position[1] += half;
    let mut br = center.clone();
    br.position[0] += half;
    br.position[1] += half;
    [tl, tr, bl, br]
}

/// Triangles covering the quad `expand_point_to_quad`/`expand_line_to_quad`
/// produce, indexed `[top-left, top-right, bottom-left, bottom-right]`.
pub fn quad_triangles() -> [[usize; 3]; 2] {
    [[0, 1, 2], [1, 3, 2]]
}

/// Expands a line segment into a degenerate quad `width` pixels wide,
/// offset perpendicular to the segment's clip-space direction (spec §4.7:
/// "lines -> degenerate quad of configurable width").
pub fn expand_line_to_quad(a: &VertexRow, b: &VertexRow, width: f32) -> [VertexRow; 4] {
    let dx = b.position[0] - a.position[0];
    let dy = b.position[1] - a.position[1];
    let len = (dx * dx + dy * dy).sqrt().max(1e-6);
    let half_w = a.position[3].max(1e-6) * width * 0.5;
    let nx = -dy / len * half_w;
    let ny = dx / len * half_w;

    let mut a0 = a.clone();
    a0.position[0] += nx;
    a0.position[1] += ny;
    let mut a1 = a.clone();
    a1.position[0] -= nx;
    a1.position[1] -= ny;
    let mut b0 = b.clone();
    b0.position[0] += nx;
    b0.position[1] += ny;
    let mut b1 = b.clone();
    b1.position[0] -= nx;
    b1.position[1] -= ny;
    [a0, a1, b0, b1]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_strip_alternates_winding() {
        let idx = [0, 1, 2, 3, 4];
        let tris = assemble_triangles(Topology::TriangleStrip, &idx);
        assert_eq!(tris, vec![[0, 1, 2], [2, 1, 3], [2, 3, 4]]);
    }

    #[test]
    fn triangle_fan_shares_the_hub_vertex() {
        let idx = [0, 1, 2, 3];
        let tris = assemble_triangles(Topology::TriangleFan, &idx);
        assert_eq!(tris, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn line_loop_closes_back_to_the_first_vertex() {
        let idx = [0, 1, 2];
        let segs = assemble_lines(Topology::LineLoop, &idx);
        assert_eq!(&segs[..], &[[0, 1], [1, 2], [2, 0]]);
    }

    #[test]
    fn point_quad_is_centered_on_the_source_vertex() {
        let mut center = VertexRow::new(0);
        center.position = [10.0, 10.0, 0.0, 1.0];
        let quad = expand_point_to_quad(&center, 4.0);
        assert_eq!(quad[0].position[0], 8.0);
        assert_eq!(quad[3].position[0], 12.0);
    }

    #[test]
    fn line_quad_offsets_perpendicular_to_the_segment() {
        let mut a = VertexRow::new(0);
        a.position = [0.0, 0.0, 0.0, 1.0];
        let mut b = VertexRow::new(0);
        b.position = [10.0, 0.0, 0.0, 1.0];
        let quad = expand_line_to_quad(&a, &b, 2.0);
        assert!((quad[0].position[1] - 1.0).abs() < 1e-5);
        assert!((quad[1].position[1] + 1.0).abs() < 1e-5);
    }
}
