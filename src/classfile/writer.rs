//! Class file encoding.

use super::attribute::Attribute;
use super::class::{ClassFile, MemberInfo, MAGIC};
use super::errors::ClassFileError;

fn count_u16(what: &'static str, len: usize) -> Result<[u8; 2], ClassFileError> {
    u16::try_from(len)
        .map(u16::to_be_bytes)
        .map_err(|_| ClassFileError::TooLarge { what, len })
}

pub(crate) fn write_attributes(
    out: &mut Vec<u8>,
    attributes: &[Attribute],
) -> Result<(), ClassFileError> {
    out.extend_from_slice(&count_u16("attribute count", attributes.len())?);
    for attribute in attributes {
        let len = u32::try_from(attribute.info.len()).map_err(|_| ClassFileError::TooLarge {
            what: "attribute",
            len: attribute.info.len(),
        })?;
        out.extend_from_slice(&attribute.name_index.to_be_bytes());
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&attribute.info);
    }
    Ok(())
}

fn write_members(
    out: &mut Vec<u8>,
    what: &'static str,
    members: &[MemberInfo],
) -> Result<(), ClassFileError> {
    out.extend_from_slice(&count_u16(what, members.len())?);
    for member in members {
        out.extend_from_slice(&member.access_flags.to_be_bytes());
        out.extend_from_slice(&member.name_index.to_be_bytes());
        out.extend_from_slice(&member.descriptor_index.to_be_bytes());
        write_attributes(out, &member.attributes)?;
    }
    Ok(())
}

impl ClassFile {
    /// Encode the class file. An unmodified parse encodes to its input.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ClassFileError> {
        let mut out = Vec::with_capacity(1024);
        out.extend_from_slice(&MAGIC.to_be_bytes());
        out.extend_from_slice(&self.minor_version.to_be_bytes());
        out.extend_from_slice(&self.major_version.to_be_bytes());
        self.constant_pool.write(&mut out)?;
        out.extend_from_slice(&self.access_flags.to_be_bytes());
        out.extend_from_slice(&self.this_class.to_be_bytes());
        out.extend_from_slice(&self.super_class.to_be_bytes());
        out.extend_from_slice(&count_u16("interface count", self.interfaces.len())?);
        for interface in &self.interfaces {
            out.extend_from_slice(&interface.to_be_bytes());
        }
        write_members(&mut out, "field count", &self.fields)?;
        write_members(&mut out, "method count", &self.methods)?;
        write_attributes(&mut out, &self.attributes)?;
        Ok(out)
    }
}
