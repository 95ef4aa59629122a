//! Sutherland–Hodgman clipping of a triangle against the clip-space view
//! volume (`-w <= x,y,z <= w`), the SPEC_FULL §4.7 addition over the
//! distilled spec's primitive-assembly-only data model: a triangle that
//! straddles any of the six planes is clipped before it ever reaches
//! `sw_pipeline::setup`, which has no notion of a partially-visible
//! triangle.
//!
//! Clipping a triangle against all six planes in sequence can add up to
//! 7 vertices beyond the original 3 in the worst case (each planar pass
//! grows a convex polygon's vertex count by at most one); the resulting
//! polygon is triangulated as a fan off its first vertex before being
//! handed back to the caller, since `sw_pipeline::setup` only ever
//! consumes triangles.

use crate::topology::VertexRow;

type Plane = fn(&VertexRow) -> f32;

const PLANES: [Plane; 6] = [
    |v| v.position[3] - v.position[0], // x <=  w
    |v| v.position[3] + v.position[0], // x >= -w
    |v| v.position[3] - v.position[1], // y <=  w
    |v| v.position[3] + v.position[1], // y >= -w
    |v| v.position[3] - v.position[2], // z <=  w
    |v| v.position[3] + v.position[2], // z >= -w
];

/// Clips the triangle `[a, b, c]` against the view volume, returning the
/// resulting convex polygon's vertices in order (empty if the triangle is
/// entirely outside any one plane).
pub fn clip_triangle(a: &VertexRow, b: &VertexRow, c: &VertexRow) -> Vec<VertexRow> {
    let mut polygon = vec![a.clone(), b.clone(), c.clone()];
    for plane in PLANES {
        if polygon.is_empty() {
            break;
        }
        polygon = clip_against_plane(&polygon, plane);
    }
    polygon
}

fn clip_against_plane(polygon: &[VertexRow], plane: Plane) -> Vec<VertexRow> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for i in 0..polygon.len() {
        let current = &polygon[i];
        let previous = &polygon[(i + polygon.len() - 1) % polygon.len()];
        let current_dist = plane(current);
        let previous_dist = plane(previous);
        let current_inside = current_dist >= 0.0;
        let previous_inside = previous_dist >= 0.0;

        if current_inside != previous_inside {
            let t = previous_dist / (previous_dist - current_dist);
            out.push(previous.lerp(current, t));
        }
        if current_inside {
            out.push(current.clone());
        }
    }
    out
}

/// Fan-triangulates a clipped polygon (`clip_triangle`'s output) back into
/// triangles, since every downstream consumer (`setup`) only accepts
/// triangles.
pub fn triangulate_fan(polygon: &[VertexRow]) -> Vec<[VertexRow; 3]> {
    if polygon.len() < 3 {
        return Vec::new();
    }
    (1..polygon.len() - 1).map(|i| [polygon[0].clone(), polygon[i].clone(), polygon[i + 1].clone()]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f32, y: f32, z: f32, w: f32) -> VertexRow {
        let mut v = VertexRow::new(0);
        v.position = [x, y, z, w];
        v
    }

    #[test]
    fn a_fully_inside_triangle_is_returned_unchanged() {
        let a = vertex(-0.5, -0.5, 0.0, 1.0);
        let b = vertex(0.5, -0.5, 0.0, 1.0);
        let c = vertex(0.0, 0.5, 0.0, 1.0);
        let polygon = clip_triangle(&a, &b, &c);
        assert_eq!(polygon.len(), 3);
    }

    #[test]
    fn a_fully_outside_triangle_clips_to_nothing() {
        let a = vertex(2.0, 2.0, 0.0, 1.0);
        let b = vertex(3.0, 2.0, 0.0, 1.0);
        let c = vertex(2.5, 3.0, 0.0, 1.0);
        let polygon = clip_triangle(&a, &b, &c);
        assert!(polygon.is_empty());
    }

    #[test]
    fn a_straddling_triangle_gains_a_vertex_at_the_boundary() {
        let a = vertex(-0.5, 0.0, 0.0, 1.0);
        let b = vertex(0.5, 0.0, 0.0, 1.0);
        let c = vertex(2.0, 2.0, 0.0, 1.0);
        let polygon = clip_triangle(&a, &b, &c);
        assert!(polygon.len() >= 3);
        for v in &polygon {
            assert!(v.position[0] <= v.position[3] + 1e-5);
        }
    }

    #[test]
    fn triangulate_fan_covers_a_quad_with_two_triangles() {
        let polygon = vec![vertex(0.0, 0.0, 0.0, 1.0), vertex(1.0, 0.0, 0.0, 1.0), vertex(1.0, 1.0, 0.0, 1.0), vertex(0.0, 1.0, 0.0, 1.0)];
        let tris = triangulate_fan(&polygon);
        assert_eq!(tris.len(), 2);
    }
}
