//! # Wavefront OBJ parsing
//!
//! Reads the subset of OBJ the renderer consumes: `v`, `vt`, `vn` and
//! triangular `f` records whose corners carry all three indices
//! (`p/t/n`). Every other record tag is skipped.
//!
//! Parsing is all-or-nothing. The first malformed line aborts the load and no
//! partial model is returned.
//!
//! ```
//! use trellis::gfx::scene::obj::parse_obj;
//!
//! let model = parse_obj(
//!     "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n",
//! )
//! .unwrap();
//! assert_eq!(model.faces.len(), 1);
//! assert_eq!(model.faces[0].corners[2].position, 2);
//! ```

use crate::error::{MalformedModel, Stream};

/// One vertex reference of a face; indices are 0-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Corner {
    pub position: usize,
    pub texcoord: usize,
    pub normal: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Face {
    pub corners: [Corner; 3],
}

/// Independently indexed attribute streams plus triangle faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjModel {
    pub positions: Vec<[f32; 3]>,
    pub texcoords: Vec<[f32; 2]>,
    pub normals: Vec<[f32; 3]>,
    pub faces: Vec<Face>,
}

/// Parses OBJ text into attribute streams and faces.
///
/// Face indices are bounds-checked once the whole source has been read, so
/// faces may reference vertices declared further down the file.
pub fn parse_obj(source: &str) -> Result<ObjModel, MalformedModel> {
    let mut model = ObjModel::default();
    let mut face_lines = Vec::new();

    for (number, text) in source.lines().enumerate() {
        let line = number + 1;
        let mut tokens = text.split_ascii_whitespace();
        let Some(tag) = tokens.next() else {
            continue;
        };
        let rest: Vec<&str> = tokens.collect();

        match tag {
            "v" => model.positions.push(components(line, "v", &rest)?),
            "vt" => model.texcoords.push(components(line, "vt", &rest)?),
            "vn" => model.normals.push(components(line, "vn", &rest)?),
            "f" => {
                model.faces.push(parse_face(line, &rest)?);
                face_lines.push(line);
            }
            _ => log::trace!("obj: skipping `{tag}` record on line {line}"),
        }
    }

    check_bounds(&model, &face_lines)?;

    log::debug!(
        "parsed obj: {} positions, {} texcoords, {} normals, {} faces",
        model.positions.len(),
        model.texcoords.len(),
        model.normals.len(),
        model.faces.len()
    );
    Ok(model)
}

/// Reads the first `N` tokens as floats; any further tokens are ignored
fn components<const N: usize>(
    line: usize,
    tag: &'static str,
    tokens: &[&str],
) -> Result<[f32; N], MalformedModel> {
    if tokens.len() < N {
        return Err(MalformedModel::MissingComponents {
            line,
            tag,
            expected: N,
            found: tokens.len(),
        });
    }

    let mut values = [0.0; N];
    for (value, token) in values.iter_mut().zip(tokens) {
        *value = token
            .parse()
            .map_err(|_| MalformedModel::InvalidNumber {
                line,
                token: (*token).to_owned(),
            })?;
    }
    Ok(values)
}

fn parse_face(line: usize, tokens: &[&str]) -> Result<Face, MalformedModel> {
    let [a, b, c] = tokens else {
        return Err(MalformedModel::NonTriangularFace {
            line,
            found: tokens.len(),
        });
    };
    Ok(Face {
        corners: [
            parse_corner(line, a)?,
            parse_corner(line, b)?,
            parse_corner(line, c)?,
        ],
    })
}

fn parse_corner(line: usize, token: &str) -> Result<Corner, MalformedModel> {
    let parts: Vec<&str> = token.split('/').collect();
    let [position, texcoord, normal] = parts.as_slice() else {
        return Err(MalformedModel::IncompleteCorner {
            line,
            token: token.to_owned(),
        });
    };
    if position.is_empty() || texcoord.is_empty() || normal.is_empty() {
        return Err(MalformedModel::IncompleteCorner {
            line,
            token: token.to_owned(),
        });
    }

    Ok(Corner {
        position: parse_index(line, position)?,
        texcoord: parse_index(line, texcoord)?,
        normal: parse_index(line, normal)?,
    })
}

/// Converts a 1-based OBJ index to 0-based
fn parse_index(line: usize, token: &str) -> Result<usize, MalformedModel> {
    match token.parse::<usize>() {
        Ok(index) if index > 0 => Ok(index - 1),
        _ => Err(MalformedModel::InvalidIndex {
            line,
            token: token.to_owned(),
        }),
    }
}

fn check_bounds(model: &ObjModel, face_lines: &[usize]) -> Result<(), MalformedModel> {
    let streams = [
        (Stream::Position, model.positions.len()),
        (Stream::TexCoord, model.texcoords.len()),
        (Stream::Normal, model.normals.len()),
    ];

    for (face, &line) in model.faces.iter().zip(face_lines) {
        for corner in &face.corners {
            let indices = [corner.position, corner.texcoord, corner.normal];
            for ((stream, len), index) in streams.iter().zip(indices) {
                if index >= *len {
                    return Err(MalformedModel::IndexOutOfBounds {
                        line,
                        stream: *stream,
                        index,
                        len: *len,
                    });
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::BufReader;

    /// Unit quad in the XY plane split into two triangles
    pub(crate) const QUAD: &str = "\
# quad
o Quad
v -1.0 -1.0 0.0
v 1.0 -1.0 0.0
v 1.0 1.0 0.0
v -1.0 1.0 0.0
vt 0.0 0.0
vt 1.0 0.0
vt 1.0 1.0
vt 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 1.0
vn 0.0 0.0 1.0
s off
f 1/1/1 2/2/2 3/3/3
f 1/1/1 3/3/3 4/4/4
";

    fn corner(position: usize, texcoord: usize, normal: usize) -> Corner {
        Corner {
            position,
            texcoord,
            normal,
        }
    }

    #[test]
    fn test_quad_parses_to_two_faces() {
        let model = parse_obj(QUAD).unwrap();
        assert_eq!(model.positions.len(), 4);
        assert_eq!(model.texcoords.len(), 4);
        assert_eq!(model.normals.len(), 4);
        assert_eq!(model.faces.len(), 2);
        assert_eq!(
            model.faces[1].corners,
            [corner(0, 0, 0), corner(2, 2, 2), corner(3, 3, 3)]
        );
        assert_eq!(model.positions[2], [1.0, 1.0, 0.0]);
        assert_eq!(model.texcoords[3], [0.0, 1.0]);
    }

    #[test]
    fn test_repeated_whitespace_does_not_shift_components() {
        let source = "v  1.0   2.0\t3.0\r\nvt 0.5  0.25\r\nvn 0 1 0\r\nf  1/1/1   1/1/1  1/1/1 \r\n";
        let model = parse_obj(source).unwrap();
        assert_eq!(model.positions, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(model.texcoords, vec![[0.5, 0.25]]);
        assert_eq!(model.faces.len(), 1);
    }

    #[test]
    fn test_extra_components_are_ignored() {
        let model = parse_obj("v 1 2 3 1.0\nvt 0.5 0.5 0.0\n").unwrap();
        assert_eq!(model.positions, vec![[1.0, 2.0, 3.0]]);
        assert_eq!(model.texcoords, vec![[0.5, 0.5]]);
    }

    #[test]
    fn test_forward_references_are_allowed() {
        let source = "f 1/1/1 2/1/1 3/1/1\nv 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\n";
        assert_eq!(parse_obj(source).unwrap().faces.len(), 1);
    }

    #[test]
    fn test_missing_components() {
        assert_eq!(
            parse_obj("v 1.0 2.0\n"),
            Err(MalformedModel::MissingComponents {
                line: 1,
                tag: "v",
                expected: 3,
                found: 2
            })
        );
    }

    #[test]
    fn test_invalid_number() {
        assert_eq!(
            parse_obj("v 0 0 0\nvn 0 one 0\n"),
            Err(MalformedModel::InvalidNumber {
                line: 2,
                token: "one".to_owned()
            })
        );
    }

    #[test]
    fn test_invalid_indices() {
        for token in ["0", "-1", "x"] {
            let source = format!("f {token}/1/1 1/1/1 1/1/1\n");
            assert_eq!(
                parse_obj(&source),
                Err(MalformedModel::InvalidIndex {
                    line: 1,
                    token: token.to_owned()
                })
            );
        }
    }

    #[test]
    fn test_corners_need_all_three_indices() {
        for token in ["1", "1/1", "1//1", "1/1/", "1/1/1/1"] {
            let source = format!("f {token} 1/1/1 1/1/1\n");
            assert_eq!(
                parse_obj(&source),
                Err(MalformedModel::IncompleteCorner {
                    line: 1,
                    token: token.to_owned()
                })
            );
        }
    }

    #[test]
    fn test_only_triangles_are_supported() {
        let source = QUAD.replace(
            "f 1/1/1 2/2/2 3/3/3\nf 1/1/1 3/3/3 4/4/4",
            "f 1/1/1 2/2/2 3/3/3 4/4/4",
        );
        assert_eq!(
            parse_obj(&source),
            Err(MalformedModel::NonTriangularFace {
                line: 16,
                found: 4
            })
        );
    }

    #[test]
    fn test_out_of_bounds_index_names_stream_and_line() {
        let source = QUAD.replace("f 1/1/1 3/3/3 4/4/4", "f 1/1/1 3/3/3 4/4/5");
        assert_eq!(
            parse_obj(&source),
            Err(MalformedModel::IndexOutOfBounds {
                line: 17,
                stream: Stream::Normal,
                index: 4,
                len: 4
            })
        );

        let source = QUAD.replace("f 1/1/1 2/2/2 3/3/3", "f 1/1/1 2/2/2 5/3/3");
        assert!(matches!(
            parse_obj(&source),
            Err(MalformedModel::IndexOutOfBounds {
                line: 16,
                stream: Stream::Position,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_source() {
        assert_eq!(parse_obj("").unwrap(), ObjModel::default());
    }

    #[test]
    fn test_agrees_with_tobj() {
        let (models, _) = tobj::load_obj_buf(
            &mut BufReader::new(QUAD.as_bytes()),
            &tobj::LoadOptions::default(),
            |_| Err(tobj::LoadError::OpenFileFailed),
        )
        .unwrap();
        let reference = &models[0].mesh;
        let model = parse_obj(QUAD).unwrap();

        assert_eq!(reference.indices.len(), 3 * model.faces.len());
        let corners = model.faces.iter().flat_map(|face| face.corners);
        for (corner, &index) in corners.zip(&reference.indices) {
            let index = 3 * index as usize;
            assert_eq!(
                reference.positions[index..index + 3],
                model.positions[corner.position]
            );
        }
    }
}
