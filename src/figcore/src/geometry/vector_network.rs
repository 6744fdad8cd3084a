use std::io::Cursor;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::error::FigError;
use crate::schema::value::Value;

use super::path_commands::PathCommand;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub style: u32,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub style: u32,
    pub start_vertex: u32,
    pub start_dx: f32,
    pub start_dy: f32,
    pub end_vertex: u32,
    pub end_dx: f32,
    pub end_dy: f32,
}

/// The vertex/segment/region graph form of a vector node's geometry. Only
/// the region *count* is consumed (to keep the cursor aligned); region
/// contents don't feed centerline reconstruction.
#[derive(Debug, Clone)]
pub struct VectorNetwork {
    pub vertices: Vec<Vertex>,
    pub segments: Vec<Segment>,
    pub region_count: u32,
}

impl VectorNetwork {
    pub fn decode(bytes: &[u8]) -> Result<Self, FigError> {
        let mut cursor = Cursor::new(bytes);
        let vertex_count = cursor.read_u32::<LittleEndian>()?;
        let segment_count = cursor.read_u32::<LittleEndian>()?;
        let region_count = cursor.read_u32::<LittleEndian>()?;

        let mut vertices = Vec::with_capacity(vertex_count as usize);
        for _ in 0..vertex_count {
            vertices.push(Vertex {
                style: cursor.read_u32::<LittleEndian>()?,
                x: cursor.read_f32::<LittleEndian>()?,
                y: cursor.read_f32::<LittleEndian>()?,
            });
        }

        let mut segments = Vec::with_capacity(segment_count as usize);
        for _ in 0..segment_count {
            segments.push(Segment {
                style: cursor.read_u32::<LittleEndian>()?,
                start_vertex: cursor.read_u32::<LittleEndian>()?,
                start_dx: cursor.read_f32::<LittleEndian>()?,
                start_dy: cursor.read_f32::<LittleEndian>()?,
                end_vertex: cursor.read_u32::<LittleEndian>()?,
                end_dx: cursor.read_f32::<LittleEndian>()?,
                end_dy: cursor.read_f32::<LittleEndian>()?,
            });
        }

        Ok(Self { vertices, segments, region_count })
    }

    /// Reconstructs the stroked centerline by walking segments end-to-start.
    /// Returns `None` when any vertex lies outside the tolerance band around
    /// `normalized_size`, or the graph exceeds `ceiling` elements — callers
    /// fall back to a diagonal line in that case.
    pub fn reconstruct_centerline(
        &self,
        normalized_size: (f32, f32),
        tolerance: f32,
        ceiling: usize,
    ) -> Option<Vec<PathCommand>> {
        if self.vertices.len() > ceiling || self.segments.len() > ceiling {
            return None;
        }
        for v in &self.vertices {
            if v.x < -tolerance
                || v.y < -tolerance
                || v.x > normalized_size.0 + tolerance
                || v.y > normalized_size.1 + tolerance
            {
                return None;
            }
        }

        let segments: Vec<&Segment> =
            self.segments.iter().filter(|s| s.start_vertex != s.end_vertex).collect();
        if segments.is_empty() {
            return None;
        }

        let mut used = vec![false; segments.len()];
        let mut commands = Vec::new();

        loop {
            let start_idx = match used.iter().position(|u| !u) {
                Some(i) => i,
                None => break,
            };

            let mut current = segments[start_idx];
            used[start_idx] = true;
            let first_vertex = self.vertex(current.start_vertex);
            commands.push(PathCommand::MoveTo(first_vertex.x as f64, first_vertex.y as f64));
            emit_segment(&mut commands, self, current);

            loop {
                let next_idx = segments.iter().enumerate().position(|(i, s)| {
                    !used[i] && s.start_vertex == current.end_vertex
                });
                match next_idx {
                    Some(i) => {
                        used[i] = true;
                        current = segments[i];
                        emit_segment(&mut commands, self, current);
                    }
                    None => break,
                }
            }

            let end = self.vertex(current.end_vertex);
            if (first_vertex.x - end.x).abs() < 1e-2 && (first_vertex.y - end.y).abs() < 1e-2 {
                commands.push(PathCommand::Close);
            }
        }

        Some(commands)
    }

    fn vertex(&self, index: u32) -> Vertex {
        self.vertices.get(index as usize).copied().unwrap_or(Vertex { style: 0, x: 0.0, y: 0.0 })
    }

    /// Builds a network from its already-decoded structured form (as opposed
    /// to `decode`'s raw-bytes blob form) — the inline shape a node may carry
    /// directly alongside a blob reference.
    pub fn from_value(value: &Value) -> Option<Self> {
        let vertices = value
            .field_seq("vertices")
            .iter()
            .map(|v| Vertex {
                style: v.field_f64("style").unwrap_or(0.0) as u32,
                x: v.field_f64("x").unwrap_or(0.0) as f32,
                y: v.field_f64("y").unwrap_or(0.0) as f32,
            })
            .collect::<Vec<_>>();

        let segments = value
            .field_seq("segments")
            .iter()
            .map(|s| Segment {
                style: s.field_f64("style").unwrap_or(0.0) as u32,
                start_vertex: s.field_f64("startVertex").unwrap_or(0.0) as u32,
                start_dx: s.field_f64("startDx").unwrap_or(0.0) as f32,
                start_dy: s.field_f64("startDy").unwrap_or(0.0) as f32,
                end_vertex: s.field_f64("endVertex").unwrap_or(0.0) as u32,
                end_dx: s.field_f64("endDx").unwrap_or(0.0) as f32,
                end_dy: s.field_f64("endDy").unwrap_or(0.0) as f32,
            })
            .collect::<Vec<_>>();

        if vertices.is_empty() && segments.is_empty() {
            return None;
        }

        let region_count = value.field_seq("regions").len() as u32;
        Some(Self { vertices, segments, region_count })
    }
}

fn emit_segment(commands: &mut Vec<PathCommand>, network: &VectorNetwork, segment: &Segment) {
    let start = network.vertex(segment.start_vertex);
    let end = network.vertex(segment.end_vertex);

    if segment.start_dx != 0.0 || segment.start_dy != 0.0 || segment.end_dx != 0.0 || segment.end_dy != 0.0
    {
        commands.push(PathCommand::CubicTo(
            (start.x + segment.start_dx) as f64,
            (start.y + segment.start_dy) as f64,
            (end.x + segment.end_dx) as f64,
            (end.y + segment.end_dy) as f64,
            end.x as f64,
            end.y as f64,
        ));
    } else {
        commands.push(PathCommand::LineTo(end.x as f64, end.y as f64));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(vertices: &[Vertex], segments: &[Segment]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(vertices.len() as u32).to_le_bytes());
        out.extend_from_slice(&(segments.len() as u32).to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        for v in vertices {
            out.extend_from_slice(&v.style.to_le_bytes());
            out.extend_from_slice(&v.x.to_le_bytes());
            out.extend_from_slice(&v.y.to_le_bytes());
        }
        for s in segments {
            out.extend_from_slice(&s.style.to_le_bytes());
            out.extend_from_slice(&s.start_vertex.to_le_bytes());
            out.extend_from_slice(&s.start_dx.to_le_bytes());
            out.extend_from_slice(&s.start_dy.to_le_bytes());
            out.extend_from_slice(&s.end_vertex.to_le_bytes());
            out.extend_from_slice(&s.end_dx.to_le_bytes());
            out.extend_from_slice(&s.end_dy.to_le_bytes());
        }
        out
    }

    #[test]
    fn decodes_a_two_vertex_one_segment_network() {
        let vertices = [
            Vertex { style: 0, x: 0.0, y: 0.0 },
            Vertex { style: 0, x: 10.0, y: 0.0 },
        ];
        let segments = [Segment {
            style: 0,
            start_vertex: 0,
            start_dx: 0.0,
            start_dy: 0.0,
            end_vertex: 1,
            end_dx: 0.0,
            end_dy: 0.0,
        }];
        let bytes = encode(&vertices, &segments);
        let network = VectorNetwork::decode(&bytes).unwrap();
        assert_eq!(network.vertices.len(), 2);
        assert_eq!(network.segments.len(), 1);

        let centerline = network.reconstruct_centerline((10.0, 0.0), 2.0, 1000).unwrap();
        assert_eq!(
            centerline,
            vec![PathCommand::MoveTo(0.0, 0.0), PathCommand::LineTo(10.0, 0.0)]
        );
    }

    #[test]
    fn from_value_reads_an_inline_structured_network() {
        let value = Value::Record(vec![
            (
                "vertices".into(),
                Value::Seq(vec![
                    Value::Record(vec![("x".into(), Value::Float(0.0)), ("y".into(), Value::Float(0.0))]),
                    Value::Record(vec![("x".into(), Value::Float(10.0)), ("y".into(), Value::Float(0.0))]),
                ]),
            ),
            (
                "segments".into(),
                Value::Seq(vec![Value::Record(vec![
                    ("startVertex".into(), Value::Int(0)),
                    ("endVertex".into(), Value::Int(1)),
                ])]),
            ),
        ]);

        let network = VectorNetwork::from_value(&value).unwrap();
        assert_eq!(network.vertices.len(), 2);
        assert_eq!(network.segments.len(), 1);
        assert_eq!(network.segments[0].end_vertex, 1);
    }

    #[test]
    fn from_value_returns_none_when_nothing_present() {
        assert!(VectorNetwork::from_value(&Value::Record(Vec::new())).is_none());
    }

    #[test]
    fn rejects_vertex_outside_tolerance() {
        let vertices = [Vertex { style: 0, x: 1000.0, y: 0.0 }, Vertex { style: 0, x: 0.0, y: 0.0 }];
        let segments = [Segment {
            style: 0,
            start_vertex: 0,
            start_dx: 0.0,
            start_dy: 0.0,
            end_vertex: 1,
            end_dx: 0.0,
            end_dy: 0.0,
        }];
        let bytes = encode(&vertices, &segments);
        let network = VectorNetwork::decode(&bytes).unwrap();
        assert!(network.reconstruct_centerline((10.0, 0.0), 2.0, 1000).is_none());
    }
}
