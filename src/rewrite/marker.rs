//! Detection of methods tagged as renamed-from-removed.

use crate::classfile::attribute::{RUNTIME_INVISIBLE_ANNOTATIONS, RUNTIME_VISIBLE_ANNOTATIONS};
use crate::classfile::{parse_annotations, ClassFile, ClassFileError, MethodInfo};
use serde::Serialize;

/// Field descriptor of the marker annotation.
pub const REMOVED_MARKER_DESCRIPTOR: &str = "Lorg/gradle/api/model/Removed;";

/// Marker element naming the public method the annotated one replaced.
pub const ORIGINAL_ELEMENT: &str = "original";

/// A marked method: the implementation that now lives under a new name and
/// the public name it used to answer to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemovedMarker {
    pub implementation_name: String,
    pub implementation_descriptor: String,
    pub original_name: String,
    pub is_static: bool,
}

/// Scan every declared method, in declaration order, for the marker.
pub fn scan_markers(class: &ClassFile) -> Result<Vec<RemovedMarker>, ClassFileError> {
    let mut markers = Vec::new();
    for method in &class.methods {
        scan_method(class, method, &mut markers)?;
    }
    Ok(markers)
}

fn scan_method(
    class: &ClassFile,
    method: &MethodInfo,
    markers: &mut Vec<RemovedMarker>,
) -> Result<(), ClassFileError> {
    let pool = &class.constant_pool;

    for attribute in &method.attributes {
        let attribute_name = class.attribute_name(attribute)?;
        let kind = match attribute_name.as_ref() {
            RUNTIME_VISIBLE_ANNOTATIONS => RUNTIME_VISIBLE_ANNOTATIONS,
            RUNTIME_INVISIBLE_ANNOTATIONS => RUNTIME_INVISIBLE_ANNOTATIONS,
            _ => continue,
        };

        for annotation in parse_annotations(kind, &attribute.info)? {
            if pool.utf8_str(annotation.type_index)? != REMOVED_MARKER_DESCRIPTOR {
                continue;
            }
            for (name_index, value) in &annotation.elements {
                if pool.utf8_str(*name_index)? != ORIGINAL_ELEMENT {
                    continue;
                }
                let value_index =
                    value
                        .as_string_index()
                        .ok_or_else(|| ClassFileError::MalformedAttribute {
                            attribute: kind,
                            reason: format!(
                                "marker element '{ORIGINAL_ELEMENT}' is not a string"
                            ),
                        })?;
                markers.push(RemovedMarker {
                    implementation_name: class.member_name(method)?.into_owned(),
                    implementation_descriptor: class.member_descriptor(method)?.into_owned(),
                    original_name: pool.utf8_str(value_index)?.into_owned(),
                    is_static: method.is_static(),
                });
            }
        }
    }
    Ok(())
}
