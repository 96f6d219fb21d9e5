//! Constant pool for class files.
//!
//! Entries are kept exactly as decoded so that an untouched pool serializes
//! back to the same bytes. New constants are only ever appended, which keeps
//! every index already referenced by existing code and attributes valid.

use super::errors::ClassFileError;
use super::mutf8;
use super::reader::ByteReader;
use std::borrow::Cow;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Constant {
    /// Raw modified UTF-8 bytes.
    Utf8(Vec<u8>),
    Integer(i32),
    /// IEEE 754 bits, kept raw so NaN payloads survive.
    Float(u32),
    Long(i64),
    /// IEEE 754 bits, kept raw so NaN payloads survive.
    Double(u64),
    Class(u16),
    String(u16),
    FieldRef(u16, u16),
    MethodRef(u16, u16),
    InterfaceMethodRef(u16, u16),
    NameAndType(u16, u16),
    MethodHandle(u8, u16),
    MethodType(u16),
    Dynamic(u16, u16),
    InvokeDynamic(u16, u16),
    Module(u16),
    Package(u16),
}

mod tags {
    pub const UTF8: u8 = 1;
    pub const INTEGER: u8 = 3;
    pub const FLOAT: u8 = 4;
    pub const LONG: u8 = 5;
    pub const DOUBLE: u8 = 6;
    pub const CLASS: u8 = 7;
    pub const STRING: u8 = 8;
    pub const FIELDREF: u8 = 9;
    pub const METHODREF: u8 = 10;
    pub const INTERFACE_METHODREF: u8 = 11;
    pub const NAME_AND_TYPE: u8 = 12;
    pub const METHOD_HANDLE: u8 = 15;
    pub const METHOD_TYPE: u8 = 16;
    pub const DYNAMIC: u8 = 17;
    pub const INVOKE_DYNAMIC: u8 = 18;
    pub const MODULE: u8 = 19;
    pub const PACKAGE: u8 = 20;
}

impl Constant {
    /// Long and double constants occupy two pool slots.
    pub fn is_wide(&self) -> bool {
        matches!(self, Constant::Long(_) | Constant::Double(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Constant::Utf8(_) => "Utf8",
            Constant::Integer(_) => "Integer",
            Constant::Float(_) => "Float",
            Constant::Long(_) => "Long",
            Constant::Double(_) => "Double",
            Constant::Class(_) => "Class",
            Constant::String(_) => "String",
            Constant::FieldRef(..) => "Fieldref",
            Constant::MethodRef(..) => "Methodref",
            Constant::InterfaceMethodRef(..) => "InterfaceMethodref",
            Constant::NameAndType(..) => "NameAndType",
            Constant::MethodHandle(..) => "MethodHandle",
            Constant::MethodType(_) => "MethodType",
            Constant::Dynamic(..) => "Dynamic",
            Constant::InvokeDynamic(..) => "InvokeDynamic",
            Constant::Module(_) => "Module",
            Constant::Package(_) => "Package",
        }
    }

    fn read(reader: &mut ByteReader<'_>, index: u16) -> Result<Self, ClassFileError> {
        let tag = reader.u8()?;
        let constant = match tag {
            tags::UTF8 => {
                let len = reader.u16()? as usize;
                Constant::Utf8(reader.take(len)?.to_vec())
            }
            tags::INTEGER => Constant::Integer(reader.u32()? as i32),
            tags::FLOAT => Constant::Float(reader.u32()?),
            tags::LONG => Constant::Long(reader.u64()? as i64),
            tags::DOUBLE => Constant::Double(reader.u64()?),
            tags::CLASS => Constant::Class(reader.u16()?),
            tags::STRING => Constant::String(reader.u16()?),
            tags::FIELDREF => Constant::FieldRef(reader.u16()?, reader.u16()?),
            tags::METHODREF => Constant::MethodRef(reader.u16()?, reader.u16()?),
            tags::INTERFACE_METHODREF => {
                Constant::InterfaceMethodRef(reader.u16()?, reader.u16()?)
            }
            tags::NAME_AND_TYPE => Constant::NameAndType(reader.u16()?, reader.u16()?),
            tags::METHOD_HANDLE => Constant::MethodHandle(reader.u8()?, reader.u16()?),
            tags::METHOD_TYPE => Constant::MethodType(reader.u16()?),
            tags::DYNAMIC => Constant::Dynamic(reader.u16()?, reader.u16()?),
            tags::INVOKE_DYNAMIC => Constant::InvokeDynamic(reader.u16()?, reader.u16()?),
            tags::MODULE => Constant::Module(reader.u16()?),
            tags::PACKAGE => Constant::Package(reader.u16()?),
            tag => return Err(ClassFileError::UnknownConstantTag { tag, index }),
        };
        Ok(constant)
    }

    fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        match self {
            Constant::Utf8(bytes) => {
                let len = u16::try_from(bytes.len()).map_err(|_| ClassFileError::TooLarge {
                    what: "Utf8 constant",
                    len: bytes.len(),
                })?;
                out.push(tags::UTF8);
                out.extend_from_slice(&len.to_be_bytes());
                out.extend_from_slice(bytes);
            }
            Constant::Integer(value) => {
                out.push(tags::INTEGER);
                out.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Float(bits) => {
                out.push(tags::FLOAT);
                out.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Long(value) => {
                out.push(tags::LONG);
                out.extend_from_slice(&value.to_be_bytes());
            }
            Constant::Double(bits) => {
                out.push(tags::DOUBLE);
                out.extend_from_slice(&bits.to_be_bytes());
            }
            Constant::Class(index) => push_u16(out, tags::CLASS, *index),
            Constant::String(index) => push_u16(out, tags::STRING, *index),
            Constant::MethodType(index) => push_u16(out, tags::METHOD_TYPE, *index),
            Constant::Module(index) => push_u16(out, tags::MODULE, *index),
            Constant::Package(index) => push_u16(out, tags::PACKAGE, *index),
            Constant::FieldRef(a, b) => push_pair(out, tags::FIELDREF, *a, *b),
            Constant::MethodRef(a, b) => push_pair(out, tags::METHODREF, *a, *b),
            Constant::InterfaceMethodRef(a, b) => {
                push_pair(out, tags::INTERFACE_METHODREF, *a, *b)
            }
            Constant::NameAndType(a, b) => push_pair(out, tags::NAME_AND_TYPE, *a, *b),
            Constant::Dynamic(a, b) => push_pair(out, tags::DYNAMIC, *a, *b),
            Constant::InvokeDynamic(a, b) => push_pair(out, tags::INVOKE_DYNAMIC, *a, *b),
            Constant::MethodHandle(kind, index) => {
                out.push(tags::METHOD_HANDLE);
                out.push(*kind);
                out.extend_from_slice(&index.to_be_bytes());
            }
        }
        Ok(())
    }
}

fn push_u16(out: &mut Vec<u8>, tag: u8, value: u16) {
    out.push(tag);
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_pair(out: &mut Vec<u8>, tag: u8, a: u16, b: u16) {
    out.push(tag);
    out.extend_from_slice(&a.to_be_bytes());
    out.extend_from_slice(&b.to_be_bytes());
}

/// Indexed constant pool. Slot 0 and the slot following a long/double are
/// unusable and hold `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
    entries: Vec<Option<Constant>>,
}

impl Default for ConstantPool {
    fn default() -> Self {
        Self::new()
    }
}

impl ConstantPool {
    pub fn new() -> Self {
        Self {
            entries: vec![None],
        }
    }

    /// The `constant_pool_count` value: one more than the highest index.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn read(reader: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = reader.u16()?;
        let mut entries = Vec::with_capacity(count as usize);
        entries.push(None);
        // Wider than u16: a long/double in the last slot steps past 65535.
        let mut index: u32 = 1;
        while index < u32::from(count) {
            let constant = Constant::read(reader, index as u16)?;
            let wide = constant.is_wide();
            entries.push(Some(constant));
            index += 1;
            if wide {
                entries.push(None);
                index += 1;
            }
        }
        // A trailing long/double may claim a slot past the declared count.
        if entries.len() > count as usize {
            return Err(ClassFileError::InvalidConstantIndex { index: count });
        }
        Ok(Self { entries })
    }

    pub(crate) fn write(&self, out: &mut Vec<u8>) -> Result<(), ClassFileError> {
        let count =
            u16::try_from(self.entries.len()).map_err(|_| ClassFileError::ConstantPoolOverflow)?;
        out.extend_from_slice(&count.to_be_bytes());
        for constant in self.entries.iter().flatten() {
            constant.write(out)?;
        }
        Ok(())
    }

    pub fn get(&self, index: u16) -> Result<&Constant, ClassFileError> {
        self.entries
            .get(index as usize)
            .and_then(Option::as_ref)
            .ok_or(ClassFileError::InvalidConstantIndex { index })
    }

    /// Iterate over `(index, constant)` pairs of usable slots.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &Constant)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.as_ref().map(|c| (i as u16, c)))
    }

    pub fn utf8(&self, index: u16) -> Result<&[u8], ClassFileError> {
        match self.get(index)? {
            Constant::Utf8(bytes) => Ok(bytes),
            other => Err(mismatch(index, "Utf8", other)),
        }
    }

    /// Decode a Utf8 constant to a string.
    pub fn utf8_str(&self, index: u16) -> Result<Cow<'_, str>, ClassFileError> {
        mutf8::decode(self.utf8(index)?).ok_or(ClassFileError::InvalidUtf8 { index })
    }

    /// Internal name (`a/b/C`) referenced by a Class constant.
    pub fn class_name(&self, index: u16) -> Result<Cow<'_, str>, ClassFileError> {
        match self.get(index)? {
            Constant::Class(name_index) => self.utf8_str(*name_index),
            other => Err(mismatch(index, "Class", other)),
        }
    }

    /// Owner, name and descriptor of a Methodref or InterfaceMethodref.
    pub fn member_ref(
        &self,
        index: u16,
    ) -> Result<(Cow<'_, str>, Cow<'_, str>, Cow<'_, str>), ClassFileError> {
        let (class_index, nat_index) = match self.get(index)? {
            Constant::MethodRef(c, n) | Constant::InterfaceMethodRef(c, n) => (*c, *n),
            other => return Err(mismatch(index, "Methodref", other)),
        };
        let (name_index, descriptor_index) = match self.get(nat_index)? {
            Constant::NameAndType(n, d) => (*n, *d),
            other => return Err(mismatch(nat_index, "NameAndType", other)),
        };
        Ok((
            self.class_name(class_index)?,
            self.utf8_str(name_index)?,
            self.utf8_str(descriptor_index)?,
        ))
    }

    /// Append a constant unconditionally.
    pub fn push(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        let slots = if constant.is_wide() { 2 } else { 1 };
        if self.entries.len() + slots > u16::MAX as usize {
            return Err(ClassFileError::ConstantPoolOverflow);
        }
        let index = self.entries.len() as u16;
        self.entries.push(Some(constant));
        if slots == 2 {
            self.entries.push(None);
        }
        Ok(index)
    }

    pub fn find(&self, constant: &Constant) -> Option<u16> {
        self.iter().find(|(_, c)| *c == constant).map(|(i, _)| i)
    }

    /// Reuse an equal constant if present, otherwise append it.
    pub fn intern(&mut self, constant: Constant) -> Result<u16, ClassFileError> {
        match self.find(&constant) {
            Some(index) => Ok(index),
            None => self.push(constant),
        }
    }

    pub fn intern_utf8(&mut self, value: &str) -> Result<u16, ClassFileError> {
        self.intern(Constant::Utf8(mutf8::encode(value).into_owned()))
    }

    pub fn intern_class(&mut self, internal_name: &str) -> Result<u16, ClassFileError> {
        let name_index = self.intern_utf8(internal_name)?;
        self.intern(Constant::Class(name_index))
    }

    pub fn intern_name_and_type(
        &mut self,
        name: &str,
        descriptor: &str,
    ) -> Result<u16, ClassFileError> {
        let name_index = self.intern_utf8(name)?;
        let descriptor_index = self.intern_utf8(descriptor)?;
        self.intern(Constant::NameAndType(name_index, descriptor_index))
    }

    /// Intern a method reference owned by the class at `class_index`.
    pub fn intern_method_ref(
        &mut self,
        class_index: u16,
        name: &str,
        descriptor: &str,
        interface: bool,
    ) -> Result<u16, ClassFileError> {
        let nat_index = self.intern_name_and_type(name, descriptor)?;
        if interface {
            self.intern(Constant::InterfaceMethodRef(class_index, nat_index))
        } else {
            self.intern(Constant::MethodRef(class_index, nat_index))
        }
    }
}

fn mismatch(index: u16, expected: &'static str, found: &Constant) -> ClassFileError {
    ClassFileError::ConstantTypeMismatch {
        index,
        expected,
        found: found.kind(),
    }
}
