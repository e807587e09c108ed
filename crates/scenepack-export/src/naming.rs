//! Asset file names derived from datablock names

use std::path::{Component, Path};

/// Accept `name` only if it is one plain path component.
///
/// Asset files are written to `<output root>/<name>`, and a name with a
/// separator or a `..` would land somewhere else.
pub fn check_file_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("empty name".to_string());
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(format!("name '{name}' contains a path separator"));
    }

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(format!("name '{name}' is not a plain file name")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_pass() {
        for name in ["Cube", "tex.png", "Cube.001", "my mesh", "...bin"] {
            assert!(check_file_name(name).is_ok(), "{name}");
        }
    }

    #[test]
    fn test_escaping_names_are_refused() {
        for name in ["", ".", "..", "../escaped", "a/b", "a\\b", "/abs", "nul\0"] {
            assert!(check_file_name(name).is_err(), "{name:?}");
        }
    }
}
