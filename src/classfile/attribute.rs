//! Attribute containers and the `Code` / `LocalVariableTable` bodies.

use super::errors::ClassFileError;
use super::reader::ByteReader;
use super::writer::write_attributes;

pub const CODE: &str = "Code";
pub const LOCAL_VARIABLE_TABLE: &str = "LocalVariableTable";
pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_INVISIBLE_ANNOTATIONS: &str = "RuntimeInvisibleAnnotations";

/// An attribute whose body is kept undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name_index: u16,
    pub info: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionTableEntry {
    pub start_pc: u16,
    pub end_pc: u16,
    pub handler_pc: u16,
    pub catch_type: u16,
}

/// Decoded body of a `Code` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAttribute {
    pub max_stack: u16,
    pub max_locals: u16,
    pub code: Vec<u8>,
    pub exception_table: Vec<ExceptionTableEntry>,
    pub attributes: Vec<Attribute>,
}

impl CodeAttribute {
    pub fn new(max_stack: u16, max_locals: u16, code: Vec<u8>) -> Self {
        Self {
            max_stack,
            max_locals,
            code,
            exception_table: Vec::new(),
            attributes: Vec::new(),
        }
    }

    pub fn parse(info: &[u8]) -> Result<Self, ClassFileError> {
        let malformed = |e: ClassFileError| ClassFileError::MalformedAttribute {
            attribute: CODE,
            reason: e.to_string(),
        };
        let mut reader = ByteReader::new(info);
        let max_stack = reader.u16().map_err(malformed)?;
        let max_locals = reader.u16().map_err(malformed)?;
        let code_len = reader.u32().map_err(malformed)? as usize;
        let code = reader.take(code_len).map_err(malformed)?.to_vec();
        let handler_count = reader.u16().map_err(malformed)?;
        let mut exception_table = Vec::with_capacity(handler_count as usize);
        for _ in 0..handler_count {
            exception_table.push(ExceptionTableEntry {
                start_pc: reader.u16().map_err(malformed)?,
                end_pc: reader.u16().map_err(malformed)?,
                handler_pc: reader.u16().map_err(malformed)?,
                catch_type: reader.u16().map_err(malformed)?,
            });
        }
        let attributes = reader.attributes().map_err(malformed)?;
        if reader.remaining() > 0 {
            return Err(ClassFileError::MalformedAttribute {
                attribute: CODE,
                reason: format!("{} trailing bytes", reader.remaining()),
            });
        }
        Ok(Self {
            max_stack,
            max_locals,
            code,
            exception_table,
            attributes,
        })
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        let code_len = u32::try_from(self.code.len()).map_err(|_| ClassFileError::TooLarge {
            what: "code",
            len: self.code.len(),
        })?;
        let handler_count =
            u16::try_from(self.exception_table.len()).map_err(|_| ClassFileError::TooLarge {
                what: "exception table",
                len: self.exception_table.len(),
            })?;

        let mut out = Vec::with_capacity(12 + self.code.len());
        out.extend_from_slice(&self.max_stack.to_be_bytes());
        out.extend_from_slice(&self.max_locals.to_be_bytes());
        out.extend_from_slice(&code_len.to_be_bytes());
        out.extend_from_slice(&self.code);
        out.extend_from_slice(&handler_count.to_be_bytes());
        for entry in &self.exception_table {
            out.extend_from_slice(&entry.start_pc.to_be_bytes());
            out.extend_from_slice(&entry.end_pc.to_be_bytes());
            out.extend_from_slice(&entry.handler_pc.to_be_bytes());
            out.extend_from_slice(&entry.catch_type.to_be_bytes());
        }
        write_attributes(&mut out, &self.attributes)?;
        Ok(out)
    }
}

/// One `LocalVariableTable` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalVariable {
    pub start_pc: u16,
    pub length: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub index: u16,
}

pub fn parse_local_variable_table(info: &[u8]) -> Result<Vec<LocalVariable>, ClassFileError> {
    let malformed = |e: ClassFileError| ClassFileError::MalformedAttribute {
        attribute: LOCAL_VARIABLE_TABLE,
        reason: e.to_string(),
    };
    let mut reader = ByteReader::new(info);
    let count = reader.u16().map_err(malformed)?;
    let variables = (0..count)
        .map(|_| -> Result<LocalVariable, ClassFileError> {
            Ok(LocalVariable {
                start_pc: reader.u16().map_err(malformed)?,
                length: reader.u16().map_err(malformed)?,
                name_index: reader.u16().map_err(malformed)?,
                descriptor_index: reader.u16().map_err(malformed)?,
                index: reader.u16().map_err(malformed)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if reader.remaining() > 0 {
        return Err(ClassFileError::MalformedAttribute {
            attribute: LOCAL_VARIABLE_TABLE,
            reason: format!("{} trailing bytes", reader.remaining()),
        });
    }
    Ok(variables)
}

pub fn local_variable_table_bytes(
    variables: &[LocalVariable],
) -> Result<Vec<u8>, ClassFileError> {
    let count = u16::try_from(variables.len()).map_err(|_| ClassFileError::TooLarge {
        what: "local variable table",
        len: variables.len(),
    })?;
    let mut out = Vec::with_capacity(2 + variables.len() * 10);
    out.extend_from_slice(&count.to_be_bytes());
    for var in variables {
        out.extend_from_slice(&var.start_pc.to_be_bytes());
        out.extend_from_slice(&var.length.to_be_bytes());
        out.extend_from_slice(&var.name_index.to_be_bytes());
        out.extend_from_slice(&var.descriptor_index.to_be_bytes());
        out.extend_from_slice(&var.index.to_be_bytes());
    }
    Ok(out)
}
