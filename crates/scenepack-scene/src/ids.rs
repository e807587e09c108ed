//! Typed handles into the scene arenas

use serde::{Deserialize, Serialize};

macro_rules! arena_handle {
    ($(#[$doc:meta])* $name:ident, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Handle kind, used in error messages
            pub const KIND: &'static str = $kind;

            pub fn new(index: u32) -> Self {
                Self(index)
            }

            /// Index into the owning arena
            pub fn index(&self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}#{}", Self::KIND, self.0)
            }
        }

        impl From<u32> for $name {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}

arena_handle!(
    /// Identity of a mesh data block
    MeshId,
    "mesh"
);

arena_handle!(
    /// Identity of a material
    MaterialId,
    "material"
);

arena_handle!(
    /// Identity of an image datablock
    ImageId,
    "image"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(MeshId::new(3).to_string(), "mesh#3");
        assert_eq!(ImageId::from(0).to_string(), "image#0");
    }

    #[test]
    fn test_serializes_as_plain_index() {
        let json = serde_json::to_string(&MaterialId::new(5)).unwrap();
        assert_eq!(json, "5");
        let back: MaterialId = serde_json::from_str(&json).unwrap();
        assert_eq!(back.index(), 5);
    }
}
