//! NeXus class name transforms used to build template path segments

/// NeXus base class prefix
const NX_PREFIX: &str = "NX";

/// Units value that means "no unit attribute"
pub const UNITLESS: &str = "NX_UNITLESS";

fn strip_nx(nexus_class: &str) -> &str {
    nexus_class.strip_prefix(NX_PREFIX).unwrap_or(nexus_class)
}

/// Caps form of a class name: `NXentry` → `ENTRY`
pub fn convert_nexus_to_caps(nexus_class: &str) -> String {
    strip_nx(nexus_class).to_uppercase()
}

/// Suggested instance name of a class: `NXentry` → `entry`
pub fn convert_nexus_to_suggested_name(nexus_class: &str) -> String {
    strip_nx(nexus_class).to_string()
}

/// Template segment for an unnamed node of the given class: `NXentry` → `ENTRY[entry]`
pub fn class_segment(nexus_class: &str) -> String {
    format!(
        "{}[{}]",
        convert_nexus_to_caps(nexus_class),
        convert_nexus_to_suggested_name(nexus_class)
    )
}

/// Split a `CLASS[instance]` segment into its class and instance parts
pub fn split_class_segment(segment: &str) -> Option<(&str, &str)> {
    let inner = segment.strip_suffix(']')?;
    let idx = inner.find('[')?;
    Some((&inner[..idx], &inner[idx + 1..]))
}

/// Strip `CLASS[instance]` segments down to their class part, so a
/// concrete path can be compared to schema paths.
///
/// `/ENTRY[entry]/DETECTOR[detector1]/type` → `/ENTRY/DETECTOR/type`
pub fn generic_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match split_class_segment(segment) {
            Some((class, _)) => class,
            None => segment,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_caps_and_suggested_name() {
        assert_eq!(convert_nexus_to_caps("NXentry"), "ENTRY");
        assert_eq!(convert_nexus_to_suggested_name("NXentry"), "entry");
        assert_eq!(convert_nexus_to_caps("NXsample_component"), "SAMPLE_COMPONENT");
        assert_eq!(class_segment("NXdetector"), "DETECTOR[detector]");
    }

    #[test]
    fn test_non_nx_type_is_kept() {
        assert_eq!(convert_nexus_to_caps("custom"), "CUSTOM");
        assert_eq!(convert_nexus_to_suggested_name("custom"), "custom");
    }

    #[test]
    fn test_split_class_segment() {
        assert_eq!(split_class_segment("DETECTOR[detector1]"), Some(("DETECTOR", "detector1")));
        assert_eq!(split_class_segment("data"), None);
        assert_eq!(split_class_segment("odd]"), None);
    }

    #[test]
    fn test_generic_path() {
        assert_eq!(
            generic_path("/ENTRY[entry]/instrument/DETECTOR[detector1]/type"),
            "/ENTRY/instrument/DETECTOR/type"
        );
        assert_eq!(generic_path("/ENTRY[entry]/data/@signal"), "/ENTRY/data/@signal");
    }
}
