//! Materials and their shader node graphs
//!
//! A [`NodeTree`] is a flat list of nodes plus a list of links. Sockets are
//! addressed by position because socket names are not unique on every node
//! (a mix shader has two inputs called "Shader").

use scenepack_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::ids::ImageId;

/// Index of a node inside its tree
pub type NodeIndex = usize;

/// What a node does, as far as the exporter cares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeKind {
    /// Material output (the surface sink)
    OutputMaterial,
    /// Diffuse-only shading
    BsdfDiffuse,
    /// Physically based shading
    BsdfPrincipled,
    /// Image texture lookup
    TexImage {
        #[serde(default)]
        image: Option<ImageId>,
    },
    /// Anything else (mixers, math, coordinate nodes, ...)
    Other { id: String },
}

/// A node with its sockets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(flatten)]
    pub kind: NodeKind,
    /// Input socket names, in declaration order
    #[serde(default)]
    pub inputs: Vec<String>,
    /// Output socket names, in declaration order
    #[serde(default)]
    pub outputs: Vec<String>,
    /// Set on the output node the host renders with
    #[serde(default)]
    pub is_active_output: bool,
}

const PRINCIPLED_INPUTS: &[&str] = &[
    "Base Color",
    "Subsurface",
    "Metallic",
    "Specular",
    "Specular Tint",
    "Roughness",
    "Anisotropic",
    "Sheen",
    "Clearcoat",
    "IOR",
    "Transmission",
    "Emission",
    "Emission Strength",
    "Alpha",
    "Normal",
    "Clearcoat Normal",
    "Tangent",
];

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl Node {
    /// Node with explicit sockets
    pub fn new(name: impl Into<String>, kind: NodeKind, inputs: &[&str], outputs: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: names(inputs),
            outputs: names(outputs),
            is_active_output: false,
        }
    }

    /// Material output with the host's default sockets
    pub fn output_material() -> Self {
        let mut node = Self::new(
            "Material Output",
            NodeKind::OutputMaterial,
            &["Surface", "Volume", "Displacement"],
            &[],
        );
        node.is_active_output = true;
        node
    }

    pub fn bsdf_principled() -> Self {
        Self::new("Principled BSDF", NodeKind::BsdfPrincipled, PRINCIPLED_INPUTS, &["BSDF"])
    }

    pub fn bsdf_diffuse() -> Self {
        Self::new(
            "Diffuse BSDF",
            NodeKind::BsdfDiffuse,
            &["Color", "Roughness", "Normal"],
            &["BSDF"],
        )
    }

    pub fn tex_image(image: Option<ImageId>) -> Self {
        Self::new(
            "Image Texture",
            NodeKind::TexImage { image },
            &["Vector"],
            &["Color", "Alpha"],
        )
    }

    /// Generic utility node
    pub fn other(id: impl Into<String>, inputs: &[&str], outputs: &[&str]) -> Self {
        let id = id.into();
        Self::new(id.clone(), NodeKind::Other { id }, inputs, outputs)
    }

    /// Position of the first input named `name`
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|s| s == name)
    }

    /// Position of the first output named `name`
    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|s| s == name)
    }
}

/// A socket on a specific node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketRef {
    pub node: NodeIndex,
    pub socket: usize,
}

impl SocketRef {
    pub fn new(node: NodeIndex, socket: usize) -> Self {
        Self { node, socket }
    }
}

/// Directed link from an output socket to an input socket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub from: SocketRef,
    pub to: SocketRef,
}

/// A material's shader graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeTree {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl NodeTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its index
    pub fn add_node(&mut self, node: Node) -> NodeIndex {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    /// Link `from_node.from_output` to `to_node.to_input`, resolving socket names
    pub fn link(
        &mut self,
        from_node: NodeIndex,
        from_output: &str,
        to_node: NodeIndex,
        to_input: &str,
    ) -> Result<()> {
        let from_socket = self
            .node(from_node)
            .and_then(|n| n.output_index(from_output))
            .ok_or_else(|| Error::invalid_data(format!("node {from_node} has no output '{from_output}'")))?;
        let to_socket = self
            .node(to_node)
            .and_then(|n| n.input_index(to_input))
            .ok_or_else(|| Error::invalid_data(format!("node {to_node} has no input '{to_input}'")))?;

        self.links.push(Link {
            from: SocketRef::new(from_node, from_socket),
            to: SocketRef::new(to_node, to_socket),
        });
        Ok(())
    }

    /// Links feeding into an input socket, in declaration order
    pub fn links_into(&self, input: SocketRef) -> impl Iterator<Item = &Link> + '_ {
        self.links.iter().filter(move |l| l.to == input)
    }

    /// The output node the host renders with: the active one, else the first
    pub fn surface_output(&self) -> Option<NodeIndex> {
        let is_output = |n: &Node| n.kind == NodeKind::OutputMaterial;

        self.nodes
            .iter()
            .position(|n| is_output(n) && n.is_active_output)
            .or_else(|| self.nodes.iter().position(is_output))
    }

    /// Check that every link points at existing sockets
    pub fn validate(&self) -> Result<()> {
        for (i, link) in self.links.iter().enumerate() {
            let from_ok = self
                .node(link.from.node)
                .is_some_and(|n| link.from.socket < n.outputs.len());
            let to_ok = self
                .node(link.to.node)
                .is_some_and(|n| link.to.socket < n.inputs.len());
            if !from_ok || !to_ok {
                return Err(Error::invalid_data(format!("link {i} references a missing socket")));
            }
        }
        Ok(())
    }
}

/// A material datablock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    /// Materials without nodes have no texture dependencies
    #[serde(default)]
    pub node_tree: Option<NodeTree>,
}

impl Material {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            node_tree: None,
        }
    }

    pub fn with_nodes(name: impl Into<String>, tree: NodeTree) -> Self {
        Self {
            name: name.into(),
            node_tree: Some(tree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_resolves_socket_names() {
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_principled());
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();

        let links: Vec<_> = tree.links_into(SocketRef::new(out, 0)).collect();
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].from, SocketRef::new(bsdf, 0));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn test_link_unknown_socket_fails() {
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        assert!(tree.link(bsdf, "Emission", out, "Surface").is_err());
    }

    #[test]
    fn test_surface_output_prefers_active() {
        let mut tree = NodeTree::new();
        let mut inactive = Node::output_material();
        inactive.is_active_output = false;
        tree.add_node(inactive);
        let active = tree.add_node(Node::output_material());
        assert_eq!(tree.surface_output(), Some(active));

        tree.nodes[active].is_active_output = false;
        assert_eq!(tree.surface_output(), Some(0));
    }

    #[test]
    fn test_node_kind_json_shape() {
        let json = r#"{"name":"Image Texture","type":"TEX_IMAGE","image":2,"inputs":["Vector"],"outputs":["Color"]}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.kind, NodeKind::TexImage { image: Some(ImageId::new(2)) });
        assert!(!node.is_active_output);
    }
}
