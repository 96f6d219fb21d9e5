//! Lossless JVM class file codec.
//!
//! `ClassFile::parse` decodes the constant pool and member tables while
//! keeping attribute bodies raw; `ClassFile::to_bytes` re-encodes. A class
//! that is parsed and serialized without modification comes back
//! byte-identical, which is what lets the rewriter guarantee that untouched
//! methods are untouched.

pub mod annotation;
pub mod attribute;
pub mod class;
pub mod constpool;
pub mod descriptor;
pub mod errors;
pub mod mutf8;
pub mod opcodes;
mod reader;
mod writer;

pub use annotation::{parse_annotations, Annotation, ElementValue};
pub use attribute::{Attribute, CodeAttribute, ExceptionTableEntry, LocalVariable};
pub use class::{access, ClassFile, FieldInfo, MemberInfo, MethodInfo};
pub use constpool::{Constant, ConstantPool};
pub use descriptor::{FieldType, MethodDescriptor, ValueKind};
pub use errors::ClassFileError;
