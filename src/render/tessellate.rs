//! Converts a recorded draw list into coloured triangles in clip space.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;

use super::canvas::{Canvas, Color, DrawCommand, DrawList, Rect, SurfaceSize};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 4],
}

impl Vertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x2,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Pixel position to normalized device coordinates (y flipped)
pub fn to_ndc(point: Vec2, size: SurfaceSize) -> [f32; 2] {
    [
        point.x / size.width * 2.0 - 1.0,
        1.0 - point.y / size.height * 2.0,
    ]
}

/// Append triangles for every command in `list` to `out`
pub fn tessellate(list: &DrawList, out: &mut Vec<Vertex>) {
    let size = list.size();

    for command in list.commands() {
        match command {
            DrawCommand::FillRect { rect, color } => push_rect(out, *rect, *color, size),
            DrawCommand::FillRotatedRect {
                center,
                size: extent,
                angle,
                color,
            } => {
                let half = *extent / 2.0;
                let rotation = Vec2::from_angle(*angle);
                let corners = [
                    Vec2::new(-half.x, -half.y),
                    Vec2::new(half.x, -half.y),
                    Vec2::new(half.x, half.y),
                    Vec2::new(-half.x, half.y),
                ]
                .map(|c| *center + rotation.rotate(c));
                push_quad(out, corners, *color, size);
            }
            DrawCommand::Line {
                from,
                to,
                width,
                color,
            } => push_segment(out, *from, *to, *width, *color, size),
            DrawCommand::Polyline {
                points,
                width,
                color,
            } => {
                for pair in points.windows(2) {
                    push_segment(out, pair[0], pair[1], *width, *color, size);
                }
            }
        }
    }
}

fn push_rect(out: &mut Vec<Vertex>, rect: Rect, color: Color, size: SurfaceSize) {
    let corners = [
        Vec2::new(rect.x, rect.y),
        Vec2::new(rect.x + rect.width, rect.y),
        Vec2::new(rect.x + rect.width, rect.y + rect.height),
        Vec2::new(rect.x, rect.y + rect.height),
    ];
    push_quad(out, corners, color, size);
}

/// Line segment as a quad of `width` pixels, centred on the segment
fn push_segment(
    out: &mut Vec<Vertex>,
    from: Vec2,
    to: Vec2,
    width: f32,
    color: Color,
    size: SurfaceSize,
) {
    let Some(direction) = (to - from).try_normalize() else {
        return;
    };
    let offset = direction.perp() * (width / 2.0);
    push_quad(
        out,
        [from + offset, to + offset, to - offset, from - offset],
        color,
        size,
    );
}

fn push_quad(out: &mut Vec<Vertex>, corners: [Vec2; 4], color: Color, size: SurfaceSize) {
    let color = color.to_array();
    for index in [0, 1, 2, 0, 2, 3] {
        out.push(Vertex {
            position: to_ndc(corners[index], size),
            color,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ndc_corners() {
        let size = SurfaceSize::new(800.0, 600.0);
        assert_eq!(to_ndc(Vec2::ZERO, size), [-1.0, 1.0]);
        assert_eq!(to_ndc(Vec2::new(800.0, 600.0), size), [1.0, -1.0]);
        assert_eq!(to_ndc(Vec2::new(400.0, 300.0), size), [0.0, 0.0]);
    }

    #[test]
    fn test_full_rect_covers_clip_space() {
        let size = SurfaceSize::new(640.0, 480.0);
        let mut list = DrawList::new(size);
        list.fill_rect(size.bounds(), Color::BLACK);

        let mut vertices = Vec::new();
        tessellate(&list, &mut vertices);
        assert_eq!(vertices.len(), 6);
        for v in &vertices {
            assert!(v.position[0].abs() == 1.0 && v.position[1].abs() == 1.0);
            assert_eq!(v.color, [0.0, 0.0, 0.0, 1.0]);
        }
    }

    #[test]
    fn test_polyline_emits_quad_per_segment() {
        let size = SurfaceSize::new(100.0, 100.0);
        let mut list = DrawList::new(size);
        let points = vec![
            Vec2::new(0.0, 50.0),
            Vec2::new(25.0, 50.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(75.0, 50.0),
        ];
        list.stroke_polyline(points, 2.0, Color::BLACK);

        let mut vertices = Vec::new();
        tessellate(&list, &mut vertices);
        assert_eq!(vertices.len(), 3 * 6);
    }

    #[test]
    fn test_degenerate_line_is_dropped() {
        let size = SurfaceSize::new(100.0, 100.0);
        let mut list = DrawList::new(size);
        list.stroke_line(Vec2::new(10.0, 10.0), Vec2::new(10.0, 10.0), 3.0, Color::BLACK);

        let mut vertices = Vec::new();
        tessellate(&list, &mut vertices);
        assert!(vertices.is_empty());
    }
}
