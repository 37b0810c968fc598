use lopdf::content::{Content, Operation};

/// 6-element affine transform matrix [a, b, c, d, e, f].
/// PDF convention: [ a b 0 ]
///                 [ c d 0 ]
///                 [ e f 1 ]
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Matrix {
    pub fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            e: 0.0,
            f: 0.0,
        }
    }

    /// self * other (right multiplication).
    pub fn multiply(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }
}

/// Axis-aligned rectangle. Used both for XObject placements in PDF points
/// and for match locations in rendered-pixel space.
#[derive(Debug, Clone, PartialEq)]
pub struct BBox {
    pub x_min: f64,
    pub y_min: f64,
    pub x_max: f64,
    pub y_max: f64,
}

impl BBox {
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }
}

/// Placement of one XObject draw (`Do`) within a page.
#[derive(Debug, Clone)]
pub struct XObjectPlacement {
    /// XObject resource name (e.g. "Im1").
    pub name: String,
    /// CTM in effect at the draw.
    pub ctm: Matrix,
    /// BBox computed from the CTM.
    pub bbox: BBox,
}

/// Parse a content stream and report where each XObject is drawn.
///
/// Tracks the CTM stack (q/Q) and updates it on `cm`. Each `Do` records the
/// XObject name with the CTM and its BBox at that point. Both Image and Form
/// XObjects are reported; the caller filters by resource subtype.
pub fn extract_xobject_placements(content_bytes: &[u8]) -> crate::error::Result<Vec<XObjectPlacement>> {
    // lopdf's parser can reject an empty stream; an empty page has no placements.
    if content_bytes.is_empty() {
        return Ok(Vec::new());
    }

    let content = Content::decode(content_bytes)
        .map_err(|e| crate::error::DelogoError::content_stream(e.to_string()))?;

    let mut ctm_stack: Vec<Matrix> = vec![Matrix::identity()];
    let mut placements: Vec<XObjectPlacement> = Vec::new();

    for op in &content.operations {
        match op.operator.as_str() {
            "q" => {
                let current = ctm_stack.last().cloned().unwrap_or_else(Matrix::identity);
                ctm_stack.push(current);
            }
            "Q" => {
                if ctm_stack.len() > 1 {
                    ctm_stack.pop();
                }
            }
            "cm" => {
                if op.operands.len() == 6 {
                    let vals: Vec<f64> = op
                        .operands
                        .iter()
                        .map(operand_to_f64)
                        .collect::<Result<Vec<_>, _>>()?;
                    let cm_matrix = Matrix {
                        a: vals[0],
                        b: vals[1],
                        c: vals[2],
                        d: vals[3],
                        e: vals[4],
                        f: vals[5],
                    };
                    if let Some(current) = ctm_stack.last_mut() {
                        *current = current.multiply(&cm_matrix);
                    }
                }
            }
            "Do" => {
                if let Some(operand) = op.operands.first() {
                    let name_bytes: &[u8] = operand
                        .as_name()
                        .map_err(|e| crate::error::DelogoError::content_stream(e.to_string()))?;
                    let name = String::from_utf8_lossy(name_bytes).into_owned();
                    let current_ctm = ctm_stack.last().cloned().unwrap_or_else(Matrix::identity);
                    let bbox = ctm_to_bbox(&current_ctm);
                    placements.push(XObjectPlacement {
                        name,
                        ctm: current_ctm,
                        bbox,
                    });
                }
            }
            _ => {}
        }
    }

    Ok(placements)
}

/// Remove every `Do` invocation of the named XObject from a content stream.
///
/// Returns the re-encoded stream and the number of removed invocations.
/// All other operations are preserved in order.
pub fn strip_xobject_ops(content_bytes: &[u8], name: &str) -> crate::error::Result<(Vec<u8>, usize)> {
    if content_bytes.is_empty() {
        return Ok((Vec::new(), 0));
    }

    let content = Content::decode(content_bytes)
        .map_err(|e| crate::error::DelogoError::content_stream(e.to_string()))?;

    let before = content.operations.len();
    let kept: Vec<Operation> = content
        .operations
        .into_iter()
        .filter(|op| {
            !(op.operator == "Do"
                && op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .is_some_and(|n| n == name.as_bytes()))
        })
        .collect();
    let removed = before - kept.len();

    let encoded = Content { operations: kept }
        .encode()
        .map_err(|e| crate::error::DelogoError::content_stream(e.to_string()))?;
    Ok((encoded, removed))
}

/// Read a numeric lopdf operand as f64.
fn operand_to_f64(obj: &lopdf::Object) -> crate::error::Result<f64> {
    match obj {
        lopdf::Object::Integer(i) => Ok(*i as f64),
        lopdf::Object::Real(r) => Ok(*r as f64),
        _ => Err(crate::error::DelogoError::content_stream(format!(
            "expected numeric operand, got {:?}",
            obj
        ))),
    }
}

/// Compute the BBox of the CTM-transformed unit square [0,0]-[1,1].
fn ctm_to_bbox(ctm: &Matrix) -> BBox {
    let corners = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];
    let transformed: Vec<(f64, f64)> = corners
        .iter()
        .map(|&(x, y)| {
            let x_prime = ctm.a * x + ctm.c * y + ctm.e;
            let y_prime = ctm.b * x + ctm.d * y + ctm.f;
            (x_prime, y_prime)
        })
        .collect();

    let x_min = transformed.iter().map(|p| p.0).fold(f64::INFINITY, f64::min);
    let y_min = transformed.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
    let x_max = transformed
        .iter()
        .map(|p| p.0)
        .fold(f64::NEG_INFINITY, f64::max);
    let y_max = transformed
        .iter()
        .map(|p| p.1)
        .fold(f64::NEG_INFINITY, f64::max);

    BBox {
        x_min,
        y_min,
        x_max,
        y_max,
    }
}
