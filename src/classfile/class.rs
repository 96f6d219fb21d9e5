use super::attribute::Attribute;
use super::constpool::ConstantPool;
use super::errors::ClassFileError;
use std::borrow::Cow;

pub(crate) const MAGIC: u32 = 0xCAFE_BABE;

/// Access flags used by the rewriter and loader.
pub mod access {
    pub const ACC_PUBLIC: u16 = 0x0001;
    pub const ACC_STATIC: u16 = 0x0008;
    pub const ACC_SUPER: u16 = 0x0020;
    pub const ACC_INTERFACE: u16 = 0x0200;
    pub const ACC_ABSTRACT: u16 = 0x0400;
}

/// A field or method table entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub access_flags: u16,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<Attribute>,
}

pub type FieldInfo = MemberInfo;
pub type MethodInfo = MemberInfo;

impl MemberInfo {
    pub fn is_static(&self) -> bool {
        self.access_flags & access::ACC_STATIC != 0
    }
}

/// Mutable in-memory representation of one class file.
///
/// Produced by [`ClassFile::parse`], consumed by [`ClassFile::to_bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: u16,
    pub this_class: u16,
    /// Zero only for `java/lang/Object`.
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<Attribute>,
}

impl ClassFile {
    /// Create an empty class with the given internal names.
    pub fn new(
        major_version: u16,
        access_flags: u16,
        this_class: &str,
        super_class: Option<&str>,
    ) -> Result<Self, ClassFileError> {
        let mut constant_pool = ConstantPool::new();
        let this_index = constant_pool.intern_class(this_class)?;
        let super_index = match super_class {
            Some(name) => constant_pool.intern_class(name)?,
            None => 0,
        };
        Ok(Self {
            minor_version: 0,
            major_version,
            constant_pool,
            access_flags,
            this_class: this_index,
            super_class: super_index,
            interfaces: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
        })
    }

    /// Internal name of this class, e.g. `com/example/Util`.
    pub fn name(&self) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.class_name(self.this_class)
    }

    /// Binary name of this class, e.g. `com.example.Util`.
    pub fn binary_name(&self) -> Result<String, ClassFileError> {
        Ok(self.name()?.replace('/', "."))
    }

    pub fn super_name(&self) -> Result<Option<Cow<'_, str>>, ClassFileError> {
        if self.super_class == 0 {
            return Ok(None);
        }
        self.constant_pool.class_name(self.super_class).map(Some)
    }

    pub fn is_interface(&self) -> bool {
        self.access_flags & access::ACC_INTERFACE != 0
    }

    pub fn member_name(&self, member: &MemberInfo) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.utf8_str(member.name_index)
    }

    pub fn member_descriptor(&self, member: &MemberInfo) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.utf8_str(member.descriptor_index)
    }

    pub fn attribute_name(&self, attribute: &Attribute) -> Result<Cow<'_, str>, ClassFileError> {
        self.constant_pool.utf8_str(attribute.name_index)
    }

    /// Find a declared method by name and descriptor.
    pub fn find_method(&self, name: &str, descriptor: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| {
            self.member_name(m).is_ok_and(|n| n == name)
                && self.member_descriptor(m).is_ok_and(|d| d == descriptor)
        })
    }

    /// First attribute of `member` with the given name.
    pub fn member_attribute<'a>(
        &self,
        member: &'a MemberInfo,
        name: &str,
    ) -> Option<&'a Attribute> {
        member
            .attributes
            .iter()
            .find(|a| self.attribute_name(a).is_ok_and(|n| n == name))
    }
}
