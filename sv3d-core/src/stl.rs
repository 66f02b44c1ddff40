/// STL file parser for binary and ASCII formats
use nalgebra::Point3;
use nom::{
    bytes::complete::{tag, take},
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::{count, many0},
    number::complete::{float, le_f32, le_u16, le_u32},
    sequence::{preceded, tuple},
    IResult,
};

use crate::geometry::Mesh;

const HEADER_LEN: usize = 80;

type Corners = [Point3<f32>; 3];

/// Parse a binary STL file
pub fn parse_binary_stl(data: &[u8]) -> Result<Mesh, String> {
    if data.len() < HEADER_LEN + 4 {
        return Err("File too small to be a valid STL".to_string());
    }

    match parse_binary_body(&data[HEADER_LEN..]) {
        Ok((_, triangles)) => Ok(mesh_from_triangles(None, triangles)),
        Err(_) => Err("Unexpected end of file".to_string()),
    }
}

fn parse_binary_body(input: &[u8]) -> IResult<&[u8], Vec<Corners>> {
    let (input, triangle_count) = le_u32(input)?;
    count(parse_binary_facet, triangle_count as usize)(input)
}

fn parse_binary_facet(input: &[u8]) -> IResult<&[u8], Corners> {
    // Stored normals are ignored, they are recomputed from the winding when needed
    let (input, _normal) = take(12usize)(input)?;
    let (input, v0) = parse_binary_point(input)?;
    let (input, v1) = parse_binary_point(input)?;
    let (input, v2) = parse_binary_point(input)?;
    let (input, _attribute_bytes) = le_u16(input)?;
    Ok((input, [v0, v1, v2]))
}

fn parse_binary_point(input: &[u8]) -> IResult<&[u8], Point3<f32>> {
    let (input, (x, y, z)) = tuple((le_f32, le_f32, le_f32))(input)?;
    Ok((input, Point3::new(x, y, z)))
}

/// Parse an ASCII STL file
pub fn parse_ascii_stl(input: &str) -> Result<Mesh, String> {
    match parse_ascii_stl_impl(input) {
        Ok((_, mesh)) => Ok(mesh),
        Err(e) => Err(format!("Failed to parse ASCII STL: {:?}", e)),
    }
}

fn parse_ascii_stl_impl(input: &str) -> IResult<&str, Mesh> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, name) = not_line_ending(input)?;
    let (input, triangles) = many0(parse_facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;

    let name = Some(name.trim()).filter(|name| !name.is_empty());
    Ok((input, mesh_from_triangles(name, triangles)))
}

fn parse_facet(input: &str) -> IResult<&str, Corners> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _normal) = parse_vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = parse_vertex(input)?;
    let (input, v2) = parse_vertex(input)?;
    let (input, v3) = parse_vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn parse_vertex(input: &str) -> IResult<&str, Point3<f32>> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = parse_vector3(input)?;
    Ok((input, Point3::new(x, y, z)))
}

fn parse_vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

fn mesh_from_triangles(name: Option<&str>, triangles: Vec<Corners>) -> Mesh {
    let mut mesh = Mesh::with_capacity(triangles.len() * 3, triangles.len());
    mesh.name = name.map(str::to_string);
    for [v0, v1, v2] in triangles {
        mesh.add_triangle(v0, v1, v2);
    }
    mesh
}

/// Detect and parse STL file (binary or ASCII)
pub fn parse_stl(data: &[u8]) -> Result<Mesh, String> {
    // Binary files may also start with "solid", so fall back on failure
    if data.len() > 5 && &data[0..5] == b"solid" {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(mesh) = parse_ascii_stl(text) {
                return Ok(mesh);
            }
        }
    }

    parse_binary_stl(data)
}
