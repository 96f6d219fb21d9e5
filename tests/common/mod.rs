//! Hand-assembled class files for integration tests.
//!
//! Written independently of the crate's codec so tests check the codec
//! against bytes it did not produce.

#![allow(dead_code)]

pub const ACC_PUBLIC: u16 = 0x0001;
pub const ACC_STATIC: u16 = 0x0008;
pub const ACC_SUPER: u16 = 0x0020;
pub const ACC_INTERFACE: u16 = 0x0200;
pub const ACC_ABSTRACT: u16 = 0x0400;

pub const REMOVED: &str = "Lorg/gradle/api/model/Removed;";

/// How a method is annotated with the removal marker.
#[derive(Clone)]
pub enum Marker {
    Visible(String),
    Invisible(String),
    /// Visible marker with arbitrary string elements, possibly none.
    Elements(Vec<(String, String)>),
}

struct Method {
    access: u16,
    name: String,
    descriptor: String,
    marker: Option<Marker>,
}

/// Builder for a minimal class: constant pool, methods with a `return`
/// body, optional markers, and an optional long constant to exercise
/// two-slot pool entries.
pub struct ClassBuilder {
    name: String,
    access: u16,
    pool: Vec<Vec<u8>>,
    slots: u16,
    methods: Vec<Method>,
    long_constant: Option<i64>,
}

impl ClassBuilder {
    /// `name` is the internal name, e.g. `com/example/Util`.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            access: ACC_PUBLIC | ACC_SUPER,
            pool: Vec::new(),
            slots: 1,
            methods: Vec::new(),
            long_constant: None,
        }
    }

    pub fn interface(mut self) -> Self {
        self.access = ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT;
        self
    }

    pub fn long_constant(mut self, value: i64) -> Self {
        self.long_constant = Some(value);
        self
    }

    pub fn method(mut self, access: u16, name: &str, descriptor: &str) -> Self {
        self.methods.push(Method {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            marker: None,
        });
        self
    }

    pub fn marked(mut self, access: u16, name: &str, descriptor: &str, marker: Marker) -> Self {
        self.methods.push(Method {
            access,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            marker: Some(marker),
        });
        self
    }

    fn push(&mut self, entry: Vec<u8>, wide: bool) -> u16 {
        let index = self.slots;
        self.pool.push(entry);
        self.slots += if wide { 2 } else { 1 };
        index
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut entry = vec![1];
        entry.extend_from_slice(&(s.len() as u16).to_be_bytes());
        entry.extend_from_slice(s.as_bytes());
        self.push(entry, false)
    }

    fn class(&mut self, name: &str) -> u16 {
        let name_index = self.utf8(name);
        let mut entry = vec![7];
        entry.extend_from_slice(&name_index.to_be_bytes());
        self.push(entry, false)
    }

    pub fn build(mut self) -> Vec<u8> {
        let this_name = self.name.clone();
        let this_class = self.class(&this_name);
        let super_class = self.class("java/lang/Object");
        if let Some(value) = self.long_constant {
            let mut entry = vec![5];
            entry.extend_from_slice(&value.to_be_bytes());
            self.push(entry, true);
        }
        let code_name = self.utf8("Code");

        let methods = std::mem::take(&mut self.methods);
        let mut method_bytes = Vec::new();
        for method in &methods {
            let name = self.utf8(&method.name);
            let descriptor = self.utf8(&method.descriptor);
            method_bytes.extend_from_slice(&method.access.to_be_bytes());
            method_bytes.extend_from_slice(&name.to_be_bytes());
            method_bytes.extend_from_slice(&descriptor.to_be_bytes());

            let mut attributes: Vec<(u16, Vec<u8>)> = Vec::new();
            // max_stack 0, max_locals 8, code [return], no handlers or attributes
            let code = vec![0, 0, 0, 8, 0, 0, 0, 1, 0xb1, 0, 0, 0, 0];
            attributes.push((code_name, code));

            if let Some(marker) = &method.marker {
                let (kind, elements) = match marker {
                    Marker::Visible(o) => (
                        "RuntimeVisibleAnnotations",
                        vec![("original".to_string(), o.clone())],
                    ),
                    Marker::Invisible(o) => (
                        "RuntimeInvisibleAnnotations",
                        vec![("original".to_string(), o.clone())],
                    ),
                    Marker::Elements(elements) => ("RuntimeVisibleAnnotations", elements.clone()),
                };
                let kind = self.utf8(kind);
                let type_index = self.utf8(REMOVED);
                let mut info = Vec::new();
                info.extend_from_slice(&1u16.to_be_bytes());
                info.extend_from_slice(&type_index.to_be_bytes());
                info.extend_from_slice(&(elements.len() as u16).to_be_bytes());
                for (name, value) in &elements {
                    let name = self.utf8(name);
                    let value = self.utf8(value);
                    info.extend_from_slice(&name.to_be_bytes());
                    info.push(b's');
                    info.extend_from_slice(&value.to_be_bytes());
                }
                attributes.push((kind, info));
            }

            method_bytes.extend_from_slice(&(attributes.len() as u16).to_be_bytes());
            for (name, info) in attributes {
                method_bytes.extend_from_slice(&name.to_be_bytes());
                method_bytes.extend_from_slice(&(info.len() as u32).to_be_bytes());
                method_bytes.extend_from_slice(&info);
            }
        }

        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFE_BABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&52u16.to_be_bytes());
        out.extend_from_slice(&self.slots.to_be_bytes());
        for entry in &self.pool {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&self.access.to_be_bytes());
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces
        out.extend_from_slice(&0u16.to_be_bytes()); // fields
        out.extend_from_slice(&(methods.len() as u16).to_be_bytes());
        out.extend_from_slice(&method_bytes);
        out.extend_from_slice(&0u16.to_be_bytes()); // class attributes
        out
    }
}

/// The running example: `Util` with `impl$compress` marked as `compress`.
pub fn util_class() -> Vec<u8> {
    ClassBuilder::new("com/example/Util")
        .method(ACC_PUBLIC, "<init>", "()V")
        .marked(
            ACC_PUBLIC,
            "impl$compress",
            "(Ljava/lang/String;)[B",
            Marker::Visible("compress".to_string()),
        )
        .method(ACC_PUBLIC, "size", "()I")
        .build()
}

/// Internal name to the dotted binary name.
pub fn dotted(internal: &str) -> String {
    internal.replace('/', ".")
}
