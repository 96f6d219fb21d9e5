//! Decoding of `Runtime[In]VisibleAnnotations` attribute bodies.
//!
//! Only decoding is needed: annotations are inspected, never rewritten.

use super::errors::ClassFileError;
use super::reader::ByteReader;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    /// Utf8 index of the field descriptor, e.g. `Lcom/example/Marker;`.
    pub type_index: u16,
    /// `(element name Utf8 index, value)` pairs in declaration order.
    pub elements: Vec<(u16, ElementValue)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementValue {
    /// Primitive or string constant. `tag` is one of `BCDFIJSZs`.
    Const { tag: u8, const_index: u16 },
    Enum {
        type_name_index: u16,
        const_name_index: u16,
    },
    Class { class_info_index: u16 },
    Annotation(Annotation),
    Array(Vec<ElementValue>),
}

impl ElementValue {
    /// Utf8 index of a string constant element.
    pub fn as_string_index(&self) -> Option<u16> {
        match self {
            ElementValue::Const {
                tag: b's',
                const_index,
            } => Some(*const_index),
            _ => None,
        }
    }
}

/// Decode the body of an annotations attribute.
pub fn parse_annotations(
    attribute: &'static str,
    info: &[u8],
) -> Result<Vec<Annotation>, ClassFileError> {
    let malformed = |e: ClassFileError| ClassFileError::MalformedAttribute {
        attribute,
        reason: e.to_string(),
    };
    let mut reader = ByteReader::new(info);
    let count = reader.u16().map_err(malformed)?;
    let annotations = (0..count)
        .map(|_| read_annotation(&mut reader, 0))
        .collect::<Result<Vec<_>, _>>()
        .map_err(malformed)?;
    if reader.remaining() > 0 {
        return Err(ClassFileError::MalformedAttribute {
            attribute,
            reason: format!("{} trailing bytes", reader.remaining()),
        });
    }
    Ok(annotations)
}

/// Deepest nesting of element values accepted.
const MAX_DEPTH: usize = 64;

fn read_annotation(reader: &mut ByteReader<'_>, depth: usize) -> Result<Annotation, ClassFileError> {
    let type_index = reader.u16()?;
    let count = reader.u16()?;
    let mut elements = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let name_index = reader.u16()?;
        elements.push((name_index, read_element_value(reader, depth)?));
    }
    Ok(Annotation {
        type_index,
        elements,
    })
}

fn read_element_value(
    reader: &mut ByteReader<'_>,
    depth: usize,
) -> Result<ElementValue, ClassFileError> {
    if depth > MAX_DEPTH {
        return Err(ClassFileError::MalformedAttribute {
            attribute: "annotation",
            reason: "element values nested too deeply".to_string(),
        });
    }
    let tag = reader.u8()?;
    let value = match tag {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b's' => ElementValue::Const {
            tag,
            const_index: reader.u16()?,
        },
        b'e' => ElementValue::Enum {
            type_name_index: reader.u16()?,
            const_name_index: reader.u16()?,
        },
        b'c' => ElementValue::Class {
            class_info_index: reader.u16()?,
        },
        b'@' => ElementValue::Annotation(read_annotation(reader, depth + 1)?),
        b'[' => {
            let count = reader.u16()?;
            let values = (0..count)
                .map(|_| read_element_value(reader, depth + 1))
                .collect::<Result<Vec<_>, _>>()?;
            ElementValue::Array(values)
        }
        other => {
            return Err(ClassFileError::MalformedAttribute {
                attribute: "annotation",
                reason: format!("unknown element value tag '{}'", other as char),
            })
        }
    };
    Ok(value)
}
