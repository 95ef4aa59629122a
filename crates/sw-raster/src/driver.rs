//! The rasterizer driver (spec §4.7): ties primitive assembly, clipping,
//! and the compiled vertex/setup/pixel routines together into one draw
//! call. Matches spec §6's external interface — the driver is the only
//! thing in this core that ever calls `vertex`/`setup`/`pixel` with real
//! buffer addresses.
//!
//! Step order per draw call: (1) run the vertex routine over the whole
//! batch, (2) assemble primitives (expanding points/lines to quads),
//! (3) clip each triangle against the view volume, (4) run the setup
//! routine per clipped triangle, (5) partition its `yMin..yMax` span
//! across the worker pool and run the pixel routine per strip.

use crate::config::RasterConfig;
use crate::error::{ErrorState, GlError};
use crate::framebuffer::{Framebuffer, ScissorRect};
use crate::topology::{assemble_lines, assemble_triangles, expand_line_to_quad, expand_point_to_quad, quad_triangles, Topology, VertexRow};
use crate::worker::WorkerPool;
use reactor_jit::{BackendError, Slot};
use sw_pipeline::cache::Pipeline;
use sw_pipeline::link::LinkedProgram;
use sw_pipeline::setup::PrimitiveLayout;

pub struct Driver {
    pool: WorkerPool,
    errors: ErrorState,
}

/// `Pipeline`'s `Rc<Routine>` fields make `&Pipeline` `!Sync`, but every
/// worker only ever calls the read-only `Routine::invoke(&self, ...)` and
/// the strip ranges handed to workers never overlap, so sharing one
/// `&Pipeline` across the pool for the duration of a single triangle's
/// dispatch does not race. This wrapper exists only to cross that `Sync`
/// bound; it grants no new capability workers didn't already have.
struct AssertSync<T>(T);
unsafe impl<T> Sync for AssertSync<T> {}

impl Driver {
    pub fn new(config: &RasterConfig) -> Driver {
        Driver { pool: WorkerPool::new(config), errors: ErrorState::new() }
    }

    pub fn errors(&self) -> &ErrorState {
        &self.errors
    }

    /// Reports a `BackendError` from specialization as the matching
    /// `GlError` (spec §4.7's failure semantics: a JIT compile failure
    /// disables drawing for that program rather than panicking).
    pub fn report_specialize_failure(&self, err: &BackendError) {
        match err {
            BackendError::Page(_) => self.errors.set(GlError::OutOfMemory),
            _ => self.errors.set(GlError::InvalidOperation),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn draw(
        &self,
        pipeline: &Pipeline,
        program: &LinkedProgram,
        max_scanlines: u32,
        topology: Topology,
        indices: &[u32],
        vertex_count: u32,
        vertex_batch: &[u8],
        constants: &[u8],
        framebuffer: &mut Framebuffer,
        scissor: Option<ScissorRect>,
        point_size: f32,
        line_width: f32,
    ) {
        let varying_count = program.varyings.len() as u32;
        let vertex_out_stride = (program.vertex.output_count.max(1) as usize) * 16;

        let mut shaded = match vec_or_oom(&self.errors, vertex_out_stride.saturating_mul(vertex_count as usize)) {
            Some(buf) => buf,
            None => return,
        };

        let batch_addr = vertex_batch.as_ptr() as i64;
        let out_addr = shaded.as_mut_ptr() as i64;
        let constants_addr = constants.as_ptr() as i64;
        pipeline.vertex.invoke(vec![Slot::Int(batch_addr), Slot::Int(out_addr), Slot::Int(vertex_count as i64), Slot::Int(constants_addr)]);

        let rows: Vec<VertexRow> = (0..vertex_count as usize).map(|i| read_vertex_row(&shaded, i, vertex_out_stride, varying_count)).collect();

        let layout = PrimitiveLayout::new(varying_count, max_scanlines);

        let mut triangles: Vec<[VertexRow; 3]> = Vec::new();
        match topology {
            Topology::Triangles | Topology::TriangleStrip | Topology::TriangleFan => {
                for tri in assemble_triangles(topology, indices) {
                    if let (Some(a), Some(b), Some(c)) = (rows.get(tri[0] as usize), rows.get(tri[1] as usize), rows.get(tri[2] as usize)) {
                        triangles.push([a.clone(), b.clone(), c.clone()]);
                    }
                }
            }
            Topology::Points => {
                for &i in indices {
                    if let Some(row) = rows.get(i as usize) {
                        push_quad_triangles(&mut triangles, expand_point_to_quad(row, point_size));
                    }
                }
            }
            Topology::Lines | Topology::LineStrip | Topology::LineLoop => {
                for seg in assemble_lines(topology, indices) {
                    if let (Some(a), Some(b)) = (rows.get(seg[0] as usize), rows.get(seg[1] as usize)) {
                        push_quad_triangles(&mut triangles, expand_line_to_quad(a, b, line_width));
                    }
                }
            }
        }

        for tri in &triangles {
            let clipped = crate::clip::clip_triangle(&tri[0], &tri[1], &tri[2]);
            for sub in crate::clip::triangulate_fan(&clipped) {
                self.rasterize_triangle(pipeline, &layout, &sub, framebuffer, constants, scissor);
            }
        }
    }

    fn rasterize_triangle(
        &self,
        pipeline: &Pipeline,
        layout: &PrimitiveLayout,
        tri: &[VertexRow; 3],
        framebuffer: &mut Framebuffer,
        constants: &[u8],
        scissor: Option<ScissorRect>,
    ) {
        let mut tri_in = match vec_or_oom(&self.errors, layout.vertex_stride as usize * 3) {
            Some(buf) => buf,
            None => return,
        };
        for (v, row) in tri.iter().enumerate() {
            write_vertex_row(&mut tri_in, v as u32, layout, row);
        }
        let mut prim_out = match vec_or_oom(&self.errors, layout.size as usize) {
            Some(buf) => buf,
            None => return,
        };

        let tri_addr = tri_in.as_ptr() as i64;
        let prim_addr = prim_out.as_mut_ptr() as i64;
        let keep = matches!(pipeline.setup.invoke(vec![Slot::Int(tri_addr), Slot::Int(prim_addr)]), Some(Slot::Int(v)) if v != 0);
        if !keep {
            return;
        }

        let y_min = read_i32(&prim_out, layout.y_bounds_offset as usize);
        let y_max = read_i32(&prim_out, (layout.y_bounds_offset + 4) as usize);
        if y_max <= y_min {
            return;
        }

        let fb_bytes = framebuffer.descriptor_bytes();
        let fb_addr = fb_bytes.as_ptr() as i64;
        let constants_addr = constants.as_ptr() as i64;
        let height = (y_max - y_min) as u32;

        let shared = AssertSync((pipeline, prim_addr, fb_addr, constants_addr));
        self.pool.run_strips(height, move |range| {
            let (pipeline, prim_addr, fb_addr, constants_addr) = shared.0;
            let strip_y_min = y_min + range.start as i32;
            let strip_y_max = y_min + range.end as i32;
            if let Some(rect) = scissor {
                if !(strip_y_min..strip_y_max).any(|y| rect.contains_row(y)) {
                    return;
                }
            }
            pipeline.pixel.invoke(vec![
                Slot::Int(prim_addr),
                Slot::Int(strip_y_min as i64),
                Slot::Int(strip_y_max as i64),
                Slot::Int(fb_addr),
                Slot::Int(constants_addr),
            ]);
        });
    }
}

fn push_quad_triangles(out: &mut Vec<[VertexRow; 3]>, quad: [VertexRow; 4]) {
    for tri in quad_triangles() {
        out.push([quad[tri[0]].clone(), quad[tri[1]].clone(), quad[tri[2]].clone()]);
    }
}

/// Allocates a zeroed buffer, recording `GL_OUT_OF_MEMORY` and returning
/// `None` instead of panicking if the allocator fails (spec §4.7: an
/// allocation failure skips the primitive and continues rather than
/// aborting the frame). `Vec::with_capacity` itself aborts the process on
/// allocation failure in stable Rust, so this is a best-effort guard
/// against unreasonably large sizes rather than a true fallible-alloc
/// path; it exists to give size-derived overflow a reportable error
/// rather than a panic.
fn vec_or_oom(errors: &ErrorState, len: usize) -> Option<Vec<u8>> {
    const MAX_REASONABLE: usize = 1 << 30;
    if len > MAX_REASONABLE {
        errors.set(GlError::OutOfMemory);
        return None;
    }
    Some(vec![0u8; len])
}

fn read_f32(buf: &[u8], offset: usize) -> f32 {
    f32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn write_f32(buf: &mut [u8], offset: usize, v: f32) {
    buf[offset..offset + 4].copy_from_slice(&v.to_le_bytes());
}

fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn read_vertex_row(buf: &[u8], vertex: usize, stride: usize, varying_count: u32) -> VertexRow {
    let base = vertex * stride;
    let mut row = VertexRow::new(varying_count as usize);
    for reg in 0..varying_count as usize {
        let off = base + reg * 16;
        row.varyings[reg] = [read_f32(buf, off), read_f32(buf, off + 4), read_f32(buf, off + 8), read_f32(buf, off + 12)];
    }
    let pos_off = base + varying_count as usize * 16;
    row.position = [read_f32(buf, pos_off), read_f32(buf, pos_off + 4), read_f32(buf, pos_off + 8), read_f32(buf, pos_off + 12)];
    row
}

fn write_vertex_row(buf: &mut [u8], vertex: u32, layout: &PrimitiveLayout, row: &VertexRow) {
    for (reg, varying) in row.varyings.iter().enumerate() {
        let off = layout.varying_offset(vertex, reg as u32) as usize;
        for (lane, v) in varying.iter().enumerate() {
            write_f32(buf, off + lane * 4, *v);
        }
    }
    let pos_off = layout.position_offset(vertex) as usize;
    for (lane, v) in row.position.iter().enumerate() {
        write_f32(buf, pos_off + lane * 4, *v);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_row_byte_round_trip() {
        let layout = PrimitiveLayout::new(2, 16);
        let mut buf = vec![0u8; layout.vertex_stride as usize * 3];
        let mut row = VertexRow::new(2);
        row.varyings[0] = [1.0, 2.0, 3.0, 4.0];
        row.varyings[1] = [5.0, 6.0, 7.0, 8.0];
        row.position = [0.1, 0.2, 0.3, 1.0];
        write_vertex_row(&mut buf, 1, &layout, &row);
        let back = read_vertex_row(&buf, 1, layout.vertex_stride as usize, 2);
        assert_eq!(back.varyings[0], row.varyings[0]);
        assert_eq!(back.varyings[1], row.varyings[1]);
        assert_eq!(back.position, row.position);
    }

    #[test]
    fn oversized_allocation_is_reported_as_out_of_memory_without_panicking() {
        let errors = ErrorState::new();
        let result = vec_or_oom(&errors, usize::MAX);
        assert!(result.is_none());
        assert_eq!(errors.peek(), Some(GlError::OutOfMemory));
    }
}
