//! Class file decoding.

use super::attribute::Attribute;
use super::class::{ClassFile, MemberInfo, MAGIC};
use super::constpool::ConstantPool;
use super::errors::ClassFileError;

/// Big-endian cursor over a byte slice.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        if self.remaining() < len {
            return Err(ClassFileError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ClassFileError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, ClassFileError> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> Result<u16, ClassFileError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    pub(crate) fn u32(&mut self) -> Result<u32, ClassFileError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    pub(crate) fn u64(&mut self) -> Result<u64, ClassFileError> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub(crate) fn attributes(&mut self) -> Result<Vec<Attribute>, ClassFileError> {
        let count = self.u16()?;
        (0..count)
            .map(|_| -> Result<Attribute, ClassFileError> {
                let name_index = self.u16()?;
                let len = self.u32()? as usize;
                Ok(Attribute {
                    name_index,
                    info: self.take(len)?.to_vec(),
                })
            })
            .collect()
    }

    fn members(&mut self) -> Result<Vec<MemberInfo>, ClassFileError> {
        let count = self.u16()?;
        (0..count)
            .map(|_| -> Result<MemberInfo, ClassFileError> {
                Ok(MemberInfo {
                    access_flags: self.u16()?,
                    name_index: self.u16()?,
                    descriptor_index: self.u16()?,
                    attributes: self.attributes()?,
                })
            })
            .collect()
    }
}

impl ClassFile {
    /// Decode a complete class file.
    ///
    /// Attribute bodies are kept as raw bytes; only the constant pool and the
    /// member tables are structurally decoded. The whole input must be
    /// consumed.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClassFileError> {
        let mut reader = ByteReader::new(bytes);

        let magic = reader.u32()?;
        if magic != MAGIC {
            return Err(ClassFileError::BadMagic { found: magic });
        }

        let minor_version = reader.u16()?;
        let major_version = reader.u16()?;
        let constant_pool = ConstantPool::read(&mut reader)?;
        let access_flags = reader.u16()?;
        let this_class = reader.u16()?;
        let super_class = reader.u16()?;

        let interface_count = reader.u16()?;
        let interfaces = (0..interface_count)
            .map(|_| reader.u16())
            .collect::<Result<Vec<_>, _>>()?;

        let fields = reader.members()?;
        let methods = reader.members()?;
        let attributes = reader.attributes()?;

        if reader.remaining() > 0 {
            return Err(ClassFileError::TrailingBytes {
                count: reader.remaining(),
            });
        }

        let class = ClassFile {
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        };

        // The class name is needed by every consumer; reject a dangling one here.
        class.constant_pool.class_name(this_class)?;

        Ok(class)
    }
}
