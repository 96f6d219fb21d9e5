//! Bridge method synthesis.
//!
//! A bridge is a public method under the original name whose body forwards,
//! unchanged, to the renamed implementation on the same class:
//!
//! ```text
//! aload_0            // receiver (instance bridges only)
//! <typed load>*      // each parameter, in order
//! invokespecial #ref // or invokestatic; never virtual dispatch
//! <typed return>     // or `return` for void
//! ```

use super::marker::RemovedMarker;
use crate::classfile::attribute::{self, CODE, LOCAL_VARIABLE_TABLE};
use crate::classfile::{
    access, opcodes, Attribute, ClassFile, ClassFileError, CodeAttribute, LocalVariable,
    MethodDescriptor, MethodInfo,
};
use std::fmt;

/// Everything needed to emit one bridge, derived from one marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeMethodSpec {
    /// Public name the bridge answers to.
    pub name: String,
    /// Shared by the bridge and its target.
    pub descriptor_text: String,
    pub descriptor: MethodDescriptor,
    /// Renamed implementation the bridge forwards to.
    pub target_name: String,
    pub is_static: bool,
}

impl BridgeMethodSpec {
    pub fn from_marker(marker: &RemovedMarker) -> Result<Self, ClassFileError> {
        Ok(Self {
            name: marker.original_name.clone(),
            descriptor: MethodDescriptor::parse(&marker.implementation_descriptor)?,
            descriptor_text: marker.implementation_descriptor.clone(),
            target_name: marker.implementation_name.clone(),
            is_static: marker.is_static,
        })
    }

    pub fn access_flags(&self) -> u16 {
        if self.is_static {
            access::ACC_PUBLIC | access::ACC_STATIC
        } else {
            access::ACC_PUBLIC
        }
    }

    /// Local slots: receiver (if any) plus parameters.
    pub fn max_locals(&self) -> u16 {
        let receiver = if self.is_static { 0 } else { 1 };
        self.descriptor.parameter_slots() + receiver
    }

    /// Every local is pushed once before the call; the result replaces them.
    pub fn max_stack(&self) -> u16 {
        self.max_locals().max(self.descriptor.return_slots())
    }
}

impl fmt::Display for BridgeMethodSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let modifiers = if self.is_static {
            "public static"
        } else {
            "public"
        };
        write!(
            f,
            "{modifiers} {}{} -> {}",
            self.name, self.descriptor_text, self.target_name
        )
    }
}

/// A synthesized method plus the method reference its body invokes.
#[derive(Debug)]
pub struct SynthesizedBridge {
    pub method: MethodInfo,
    pub method_ref: u16,
}

/// Build the bridge for `spec`, interning the constants it needs into the
/// class's pool. The method is returned, not appended.
pub fn synthesize(
    class: &mut ClassFile,
    spec: &BridgeMethodSpec,
) -> Result<SynthesizedBridge, ClassFileError> {
    let owner = class.name()?.into_owned();
    let interface = class.is_interface();
    let this_class = class.this_class;
    let pool = &mut class.constant_pool;

    let method_ref =
        pool.intern_method_ref(this_class, &spec.target_name, &spec.descriptor_text, interface)?;

    let mut code = Vec::with_capacity(8 + spec.descriptor.parameters.len() * 2);
    let mut slot = 0u16;
    let mut locals = Vec::with_capacity(spec.descriptor.parameters.len() + 1);
    if !spec.is_static {
        code.push(opcodes::ALOAD_0);
        locals.push(("this".to_string(), format!("L{owner};"), slot));
        slot += 1;
    }
    for (i, parameter) in spec.descriptor.parameters.iter().enumerate() {
        parameter.kind.emit_load(slot, &mut code);
        locals.push((format!("arg{i}"), parameter.descriptor.clone(), slot));
        slot += parameter.kind.slots();
    }
    code.push(if spec.is_static {
        opcodes::INVOKESTATIC
    } else {
        opcodes::INVOKESPECIAL
    });
    code.extend_from_slice(&method_ref.to_be_bytes());
    code.push(match &spec.descriptor.return_type {
        Some(ret) => ret.kind.return_opcode(),
        None => opcodes::RETURN,
    });

    let code_len = u16::try_from(code.len()).map_err(|_| ClassFileError::TooLarge {
        what: "bridge body",
        len: code.len(),
    })?;
    let mut variables = Vec::with_capacity(locals.len());
    for (name, descriptor, index) in &locals {
        variables.push(LocalVariable {
            start_pc: 0,
            length: code_len,
            name_index: pool.intern_utf8(name)?,
            descriptor_index: pool.intern_utf8(descriptor)?,
            index: *index,
        });
    }

    let mut body = CodeAttribute::new(spec.max_stack(), spec.max_locals(), code);
    body.attributes.push(Attribute {
        name_index: pool.intern_utf8(LOCAL_VARIABLE_TABLE)?,
        info: attribute::local_variable_table_bytes(&variables)?,
    });

    let method = MethodInfo {
        access_flags: spec.access_flags(),
        name_index: pool.intern_utf8(&spec.name)?,
        descriptor_index: pool.intern_utf8(&spec.descriptor_text)?,
        attributes: vec![Attribute {
            name_index: pool.intern_utf8(CODE)?,
            info: body.to_bytes()?,
        }],
    };

    Ok(SynthesizedBridge { method, method_ref })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classfile::attribute::parse_local_variable_table;

    fn spec(descriptor: &str, is_static: bool) -> BridgeMethodSpec {
        BridgeMethodSpec::from_marker(&RemovedMarker {
            implementation_name: "impl$run".to_string(),
            implementation_descriptor: descriptor.to_string(),
            original_name: "run".to_string(),
            is_static,
        })
        .unwrap()
    }

    fn class() -> ClassFile {
        ClassFile::new(52, access::ACC_PUBLIC, "com/example/Util", Some("java/lang/Object"))
            .unwrap()
    }

    fn body(class: &ClassFile, method: &MethodInfo) -> CodeAttribute {
        let attr = class.member_attribute(method, CODE).unwrap();
        CodeAttribute::parse(&attr.info).unwrap()
    }

    #[test]
    fn test_instance_bridge_with_wide_parameters() {
        let mut class = class();
        let spec = spec("(JILjava/lang/Object;D)J", false);
        let bridge = synthesize(&mut class, &spec).unwrap();
        let code = body(&class, &bridge.method);

        let [hi, lo] = bridge.method_ref.to_be_bytes();
        assert_eq!(
            code.code,
            vec![
                opcodes::ALOAD_0,
                opcodes::LLOAD_0 + 1,
                opcodes::ILOAD_0 + 3,
                opcodes::ALOAD,
                4,
                opcodes::DLOAD,
                5,
                opcodes::INVOKESPECIAL,
                hi,
                lo,
                opcodes::LRETURN,
            ]
        );
        assert_eq!(code.max_locals, 7);
        assert_eq!(code.max_stack, 7);
        assert_eq!(bridge.method.access_flags, access::ACC_PUBLIC);
    }

    #[test]
    fn test_static_bridge_has_no_receiver() {
        let mut class = class();
        let spec = spec("()D", true);
        let bridge = synthesize(&mut class, &spec).unwrap();
        let code = body(&class, &bridge.method);

        let [hi, lo] = bridge.method_ref.to_be_bytes();
        assert_eq!(code.code, vec![opcodes::INVOKESTATIC, hi, lo, opcodes::DRETURN]);
        assert_eq!(code.max_locals, 0);
        assert_eq!(code.max_stack, 2);
        assert!(bridge.method.is_static());
    }

    #[test]
    fn test_local_variable_table_spans_body() {
        let mut class = class();
        let spec = spec("(Ljava/lang/String;I)V", false);
        let bridge = synthesize(&mut class, &spec).unwrap();
        let code = body(&class, &bridge.method);

        let lvt = code
            .attributes
            .iter()
            .find(|a| class.attribute_name(a).unwrap() == LOCAL_VARIABLE_TABLE)
            .unwrap();
        let vars = parse_local_variable_table(&lvt.info).unwrap();
        let pool = &class.constant_pool;
        let rows: Vec<_> = vars
            .iter()
            .map(|v| {
                (
                    pool.utf8_str(v.name_index).unwrap().into_owned(),
                    pool.utf8_str(v.descriptor_index).unwrap().into_owned(),
                    v.index,
                    v.length,
                )
            })
            .collect();
        let len = code.code.len() as u16;
        assert_eq!(
            rows,
            vec![
                ("this".to_string(), "Lcom/example/Util;".to_string(), 0, len),
                ("arg0".to_string(), "Ljava/lang/String;".to_string(), 1, len),
                ("arg1".to_string(), "I".to_string(), 2, len),
            ]
        );
    }

    #[test]
    fn test_interface_owner_uses_interface_method_ref() {
        let mut class = ClassFile::new(
            52,
            access::ACC_PUBLIC | access::ACC_INTERFACE | access::ACC_ABSTRACT,
            "com/example/Api",
            Some("java/lang/Object"),
        )
        .unwrap();
        let spec = spec("()V", false);
        let bridge = synthesize(&mut class, &spec).unwrap();
        assert!(matches!(
            class.constant_pool.get(bridge.method_ref).unwrap(),
            crate::classfile::Constant::InterfaceMethodRef(..)
        ));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            spec("(I)V", true).to_string(),
            "public static run(I)V -> impl$run"
        );
    }
}
