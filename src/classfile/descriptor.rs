//! Method descriptor parsing, e.g. `(ILjava/lang/String;[J)V`.

use super::errors::ClassFileError;
use super::opcodes;

/// Computational category of a value, which selects load/return opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// `B C I S Z`
    Int,
    Long,
    Float,
    Double,
    /// Objects and arrays.
    Reference,
}

impl ValueKind {
    /// Local-variable and operand-stack slots occupied by one value.
    pub fn slots(self) -> u16 {
        match self {
            ValueKind::Long | ValueKind::Double => 2,
            _ => 1,
        }
    }

    pub fn return_opcode(self) -> u8 {
        match self {
            ValueKind::Int => opcodes::IRETURN,
            ValueKind::Long => opcodes::LRETURN,
            ValueKind::Float => opcodes::FRETURN,
            ValueKind::Double => opcodes::DRETURN,
            ValueKind::Reference => opcodes::ARETURN,
        }
    }

    /// Emit the load of local `slot` onto the operand stack.
    pub fn emit_load(self, slot: u16, code: &mut Vec<u8>) {
        let (base, short_base) = match self {
            ValueKind::Int => (opcodes::ILOAD, opcodes::ILOAD_0),
            ValueKind::Long => (opcodes::LLOAD, opcodes::LLOAD_0),
            ValueKind::Float => (opcodes::FLOAD, opcodes::FLOAD_0),
            ValueKind::Double => (opcodes::DLOAD, opcodes::DLOAD_0),
            ValueKind::Reference => (opcodes::ALOAD, opcodes::ALOAD_0),
        };
        match slot {
            0..=3 => code.push(short_base + slot as u8),
            4..=255 => code.extend_from_slice(&[base, slot as u8]),
            _ => {
                code.extend_from_slice(&[opcodes::WIDE, base]);
                code.extend_from_slice(&slot.to_be_bytes());
            }
        }
    }
}

/// One parameter or return type: its descriptor text and category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldType {
    pub descriptor: String,
    pub kind: ValueKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    /// `None` for `V`.
    pub return_type: Option<FieldType>,
}

impl MethodDescriptor {
    pub fn parse(descriptor: &str) -> Result<Self, ClassFileError> {
        let invalid = |reason| ClassFileError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            reason,
        };

        let rest = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid("missing '('"))?;
        let (params, ret) = rest.split_once(')').ok_or_else(|| invalid("missing ')'"))?;

        let mut parameters = Vec::new();
        let mut remaining = params;
        while !remaining.is_empty() {
            let (field, tail) = split_field_type(remaining).map_err(invalid)?;
            parameters.push(field);
            remaining = tail;
        }

        let return_type = if ret == "V" {
            None
        } else {
            let (field, tail) = split_field_type(ret).map_err(invalid)?;
            if !tail.is_empty() {
                return Err(invalid("trailing characters after return type"));
            }
            Some(field)
        };

        let parsed = Self {
            parameters,
            return_type,
        };
        if parsed.parameter_slots() > 255 {
            return Err(invalid("more than 255 parameter slots"));
        }
        Ok(parsed)
    }

    /// Slots taken by the parameters, excluding any receiver.
    pub fn parameter_slots(&self) -> u16 {
        self.parameters.iter().map(|p| p.kind.slots()).sum()
    }

    pub fn return_slots(&self) -> u16 {
        self.return_type.as_ref().map_or(0, |r| r.kind.slots())
    }
}

fn split_field_type(input: &str) -> Result<(FieldType, &str), &'static str> {
    let dims = input.bytes().take_while(|&b| b == b'[').count();
    if dims > 255 {
        return Err("array type has more than 255 dimensions");
    }
    let element = &input[dims..];
    let first = element.bytes().next().ok_or("truncated field type")?;
    let element_len = match first {
        b'B' | b'C' | b'I' | b'S' | b'Z' | b'J' | b'F' | b'D' => 1,
        b'L' => {
            let end = element.find(';').ok_or("unterminated class type")?;
            if end == 1 {
                return Err("empty class name");
            }
            end + 1
        }
        _ => return Err("unknown type character"),
    };
    let kind = if dims > 0 {
        ValueKind::Reference
    } else {
        match first {
            b'J' => ValueKind::Long,
            b'F' => ValueKind::Float,
            b'D' => ValueKind::Double,
            b'L' => ValueKind::Reference,
            _ => ValueKind::Int,
        }
    };
    let len = dims + element_len;
    Ok((
        FieldType {
            descriptor: input[..len].to_string(),
            kind,
        },
        &input[len..],
    ))
}
