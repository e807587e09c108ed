//! Shader graph resolution
//!
//! Finds the shading node that feeds a material's surface output, then walks
//! upstream from each of its mapped input sockets collecting every image
//! texture found along the way. A texture plugged in behind a mix or a normal
//! map node still lands in the channel of the socket it ultimately feeds.

use std::collections::HashMap;

use indexmap::IndexSet;
use scenepack_scene::{ImageId, Material, MaterialId, NodeIndex, NodeKind, NodeTree, Scene, SocketRef};
use tracing::{debug, warn};

/// Semantic texture channel of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Alpha,
    Diffuse,
    Emissive,
    Metallic,
    Normal,
    Roughness,
    Specular,
}

impl Channel {
    /// Every channel, in manifest key order
    pub const ALL: [Channel; 7] = [
        Channel::Alpha,
        Channel::Diffuse,
        Channel::Emissive,
        Channel::Metallic,
        Channel::Normal,
        Channel::Roughness,
        Channel::Specular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Alpha => "alpha",
            Channel::Diffuse => "diffuse",
            Channel::Emissive => "emissive",
            Channel::Metallic => "metallic",
            Channel::Normal => "normal",
            Channel::Roughness => "roughness",
            Channel::Specular => "specular",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Texture names per channel, in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelTextures {
    lists: [Vec<String>; 7],
}

impl ChannelTextures {
    pub fn get(&self, channel: Channel) -> &[String] {
        &self.lists[channel.slot()]
    }

    /// Append unless the channel already lists `name`
    pub fn push_unique(&mut self, channel: Channel, name: &str) -> bool {
        let list = &mut self.lists[channel.slot()];
        if list.iter().any(|n| n == name) {
            return false;
        }
        list.push(name.to_string());
        true
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &[String])> + '_ {
        Channel::ALL.into_iter().map(move |c| (c, self.get(c)))
    }
}

/// Shading nodes the resolver understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingKind {
    Diffuse,
    Principled,
}

const DIFFUSE_SOCKETS: &[(&str, Channel)] = &[("Color", Channel::Diffuse), ("Normal", Channel::Normal)];

const PRINCIPLED_SOCKETS: &[(&str, Channel)] = &[
    ("Base Color", Channel::Diffuse),
    ("Metallic", Channel::Metallic),
    ("Specular", Channel::Specular),
    ("Roughness", Channel::Roughness),
    ("Emission", Channel::Emissive),
    ("Alpha", Channel::Alpha),
    ("Normal", Channel::Normal),
];

impl ShadingKind {
    pub fn from_node(kind: &NodeKind) -> Option<Self> {
        match kind {
            NodeKind::BsdfDiffuse => Some(ShadingKind::Diffuse),
            NodeKind::BsdfPrincipled => Some(ShadingKind::Principled),
            _ => None,
        }
    }

    /// Input socket name to channel
    pub fn sockets(&self) -> &'static [(&'static str, Channel)] {
        match self {
            ShadingKind::Diffuse => DIFFUSE_SOCKETS,
            ShadingKind::Principled => PRINCIPLED_SOCKETS,
        }
    }
}

/// Resolved textures of one material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialTextures {
    pub material: MaterialId,
    pub name: String,
    pub shading: Option<ShadingKind>,
    pub channels: ChannelTextures,
}

/// Resolves materials and accumulates the distinct images they use
pub struct ShaderGraphResolver<'a> {
    scene: &'a Scene,
    max_depth: usize,
    images: IndexSet<ImageId>,
}

impl<'a> ShaderGraphResolver<'a> {
    pub fn new(scene: &'a Scene, max_depth: usize) -> Self {
        Self {
            scene,
            max_depth,
            images: IndexSet::new(),
        }
    }

    /// Distinct images seen so far, first-seen order
    pub fn images(&self) -> &IndexSet<ImageId> {
        &self.images
    }

    pub fn into_images(self) -> IndexSet<ImageId> {
        self.images
    }

    pub fn resolve(&mut self, id: MaterialId, material: &Material) -> MaterialTextures {
        let mut result = MaterialTextures {
            material: id,
            name: material.name.clone(),
            shading: None,
            channels: ChannelTextures::default(),
        };

        let Some(tree) = material.node_tree.as_ref() else {
            return result;
        };
        let Some(output) = tree.surface_output() else {
            debug!(material = %material.name, "No output node");
            return result;
        };
        let Some((shader, kind)) = self.find_shading_node(tree, output) else {
            debug!(material = %material.name, "No recognized shading node");
            return result;
        };
        result.shading = Some(kind);

        let node = &tree.nodes[shader];
        for &(socket_name, channel) in kind.sockets() {
            let Some(input) = node.input_index(socket_name) else {
                continue;
            };
            let mut seen = HashMap::new();
            self.walk_socket(
                tree,
                SocketRef::new(shader, input),
                channel,
                &mut result.channels,
                &mut seen,
                0,
            );
        }

        debug!(
            material = %material.name,
            empty = result.channels.is_empty(),
            "Material resolved"
        );
        result
    }

    /// Depth-first upstream search for the first recognized shading node
    fn find_shading_node(&self, tree: &NodeTree, output: NodeIndex) -> Option<(NodeIndex, ShadingKind)> {
        let mut seen = HashMap::new();
        self.search(tree, output, &mut seen, 0)
    }

    fn search(
        &self,
        tree: &NodeTree,
        node: NodeIndex,
        seen: &mut HashMap<NodeIndex, usize>,
        depth: usize,
    ) -> Option<(NodeIndex, ShadingKind)> {
        if depth >= self.max_depth || !first_or_shallower(seen, node, depth) {
            return None;
        }

        let inputs = tree.node(node).map_or(0, |n| n.inputs.len());
        let mut found = None;
        'inputs: for input in 0..inputs {
            for link in tree.links_into(SocketRef::new(node, input)) {
                let source = link.from.node;
                let Some(src) = tree.node(source) else {
                    continue;
                };
                if let Some(kind) = ShadingKind::from_node(&src.kind) {
                    found = Some((source, kind));
                    break 'inputs;
                }
                if let Some(hit) = self.search(tree, source, seen, depth + 1) {
                    found = Some(hit);
                    break 'inputs;
                }
            }
        }

        found
    }

    fn walk_socket(
        &mut self,
        tree: &NodeTree,
        socket: SocketRef,
        channel: Channel,
        out: &mut ChannelTextures,
        seen: &mut HashMap<SocketRef, usize>,
        depth: usize,
    ) {
        if depth >= self.max_depth {
            warn!(
                channel = %channel,
                depth,
                "Shader graph too deep, truncating branch"
            );
            return;
        }
        if !first_or_shallower(seen, socket, depth) {
            return;
        }

        for link in tree.links_into(socket) {
            let source = link.from.node;
            let Some(src) = tree.node(source) else {
                continue;
            };

            if let NodeKind::TexImage { image: Some(image) } = src.kind {
                self.record(image, channel, out);
            }

            for input in 0..src.inputs.len() {
                self.walk_socket(tree, SocketRef::new(source, input), channel, out, seen, depth + 1);
            }
        }
    }

    fn record(&mut self, image: ImageId, channel: Channel, out: &mut ChannelTextures) {
        match self.scene.image(image) {
            Some(img) => {
                out.push_unique(channel, &img.name);
                self.images.insert(image);
            }
            None => warn!(image = %image, channel = %channel, "Image node points at a missing image"),
        }
    }
}

/// Marks `key` as reached at `depth`.
///
/// Returns false when it was already reached at the same depth or closer to
/// the start. Everything upstream of it was then explored with at least as
/// much depth budget, and a link back onto the current path always arrives
/// deeper than before.
fn first_or_shallower<K: std::hash::Hash + Eq>(seen: &mut HashMap<K, usize>, key: K, depth: usize) -> bool {
    match seen.get(&key) {
        Some(&previous) if previous <= depth => false,
        _ => {
            seen.insert(key, depth);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scenepack_scene::{Image, Node};

    fn scene_with_images(names: &[&str]) -> (Scene, Vec<ImageId>) {
        let mut scene = Scene::new("test");
        let ids = names
            .iter()
            .map(|n| scene.add_image(Image::from_file(*n, format!("/textures/{n}"))))
            .collect();
        (scene, ids)
    }

    #[test]
    fn test_principled_base_color_only() {
        let (scene, ids) = scene_with_images(&["tex.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_principled());
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();
        tree.link(tex, "Color", bsdf, "Base Color").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("M1", tree));

        assert_eq!(result.shading, Some(ShadingKind::Principled));
        assert_eq!(result.channels.get(Channel::Diffuse), ["tex.png".to_string()]);
        for channel in Channel::ALL.into_iter().filter(|c| *c != Channel::Diffuse) {
            assert!(result.channels.get(channel).is_empty(), "{channel} not empty");
        }
        assert_eq!(resolver.images().iter().copied().collect::<Vec<_>>(), vec![ids[0]]);
    }

    #[test]
    fn test_texture_behind_utility_node() {
        let (scene, ids) = scene_with_images(&["n.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        let normal_map = tree.add_node(Node::other("NORMAL_MAP", &["Strength", "Color"], &["Normal"]));
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();
        tree.link(normal_map, "Normal", bsdf, "Normal").unwrap();
        tree.link(tex, "Color", normal_map, "Color").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("M", tree));
        assert_eq!(result.channels.get(Channel::Normal), ["n.png".to_string()]);
        assert!(result.channels.get(Channel::Diffuse).is_empty());
    }

    #[test]
    fn test_shading_node_behind_mixer() {
        let (scene, ids) = scene_with_images(&["a.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let mix = tree.add_node(Node::other("MIX_SHADER", &["Fac", "Shader", "Shader"], &["Shader"]));
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(mix, "Shader", out, "Surface").unwrap();
        tree.link(bsdf, "BSDF", mix, "Shader").unwrap();
        tree.link(tex, "Color", bsdf, "Color").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("M", tree));
        assert_eq!(result.shading, Some(ShadingKind::Diffuse));
        assert_eq!(result.channels.get(Channel::Diffuse), ["a.png".to_string()]);
    }

    #[test]
    fn test_cycle_terminates() {
        let (scene, ids) = scene_with_images(&["loop.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_principled());
        let a = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
        let b = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();
        tree.link(a, "Color", bsdf, "Roughness").unwrap();
        tree.link(b, "Color", a, "Color1").unwrap();
        tree.link(a, "Color", b, "Color1").unwrap();
        tree.link(tex, "Color", b, "Color2").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("M", tree));
        assert_eq!(result.channels.get(Channel::Roughness), ["loop.png".to_string()]);
    }

    #[test]
    fn test_same_image_twice_in_channel_listed_once() {
        let (scene, ids) = scene_with_images(&["x.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_principled());
        let mix = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
        let t1 = tree.add_node(Node::tex_image(Some(ids[0])));
        let t2 = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();
        tree.link(mix, "Color", bsdf, "Base Color").unwrap();
        tree.link(t1, "Color", mix, "Color1").unwrap();
        tree.link(t2, "Color", mix, "Color2").unwrap();
        tree.link(t1, "Alpha", bsdf, "Alpha").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("M", tree));
        assert_eq!(result.channels.get(Channel::Diffuse).len(), 1);
        assert_eq!(result.channels.get(Channel::Alpha), ["x.png".to_string()]);
        assert_eq!(resolver.images().len(), 1);
    }

    #[test]
    fn test_no_tree_no_output_and_empty_image_node() {
        let (scene, _) = scene_with_images(&[]);
        let mut resolver = ShaderGraphResolver::new(&scene, 64);

        let plain = resolver.resolve(MaterialId::new(0), &Material::new("Plain"));
        assert!(plain.channels.is_empty());
        assert!(plain.shading.is_none());

        let mut tree = NodeTree::new();
        tree.add_node(Node::bsdf_diffuse());
        let orphan = resolver.resolve(MaterialId::new(1), &Material::with_nodes("Orphan", tree));
        assert!(orphan.channels.is_empty());

        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        let tex = tree.add_node(Node::tex_image(None));
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();
        tree.link(tex, "Color", bsdf, "Color").unwrap();
        let unassigned = resolver.resolve(MaterialId::new(2), &Material::with_nodes("Unassigned", tree));
        assert!(unassigned.channels.is_empty());
        assert!(resolver.images().is_empty());
    }

    #[test]
    fn test_rejoining_branches_are_walked_once() {
        let (scene, ids) = scene_with_images(&["bottom.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_principled());
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();

        // Every level feeds both inputs of the level above it, so the number
        // of distinct paths to the image doubles per level.
        let mut above = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
        tree.link(above, "Color", bsdf, "Base Color").unwrap();
        for _ in 0..40 {
            let next = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
            tree.link(next, "Color", above, "Color1").unwrap();
            tree.link(next, "Color", above, "Color2").unwrap();
            above = next;
        }
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(tex, "Color", above, "Color1").unwrap();

        let mut resolver = ShaderGraphResolver::new(&scene, 64);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("Ladder", tree));
        assert_eq!(result.channels.get(Channel::Diffuse), ["bottom.png".to_string()]);
        assert_eq!(resolver.images().len(), 1);
    }

    #[test]
    fn test_shallower_revisit_reaches_past_depth_cap() {
        let (scene, ids) = scene_with_images(&["far.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();

        // Long detour first, then a direct link into the same gamma node.
        let mix = tree.add_node(Node::other("MIX_RGB", &["Fac", "Color1", "Color2"], &["Color"]));
        tree.link(mix, "Color", bsdf, "Color").unwrap();
        let mut detour = (mix, "Color1");
        for _ in 0..2 {
            let n = tree.add_node(Node::other("GAMMA", &["Color"], &["Color"]));
            tree.link(n, "Color", detour.0, detour.1).unwrap();
            detour = (n, "Color");
        }
        let shared = tree.add_node(Node::other("GAMMA", &["Color"], &["Color"]));
        tree.link(shared, "Color", detour.0, detour.1).unwrap();
        tree.link(shared, "Color", mix, "Color2").unwrap();
        let inner = tree.add_node(Node::other("INVERT", &["Color"], &["Color"]));
        tree.link(inner, "Color", shared, "Color").unwrap();
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(tex, "Color", inner, "Color").unwrap();

        // The detour reaches `shared` first but hits the cap before the image.
        // Color2 reaches it again two levels closer.
        let mut resolver = ShaderGraphResolver::new(&scene, 5);
        let result = resolver.resolve(MaterialId::new(0), &Material::with_nodes("Detour", tree));
        assert_eq!(result.channels.get(Channel::Diffuse), ["far.png".to_string()]);
    }

    #[test]
    fn test_depth_cap_truncates() {
        let (scene, ids) = scene_with_images(&["deep.png"]);
        let mut tree = NodeTree::new();
        let out = tree.add_node(Node::output_material());
        let bsdf = tree.add_node(Node::bsdf_diffuse());
        tree.link(bsdf, "BSDF", out, "Surface").unwrap();

        let mut prev = (bsdf, "Color");
        for _ in 0..10 {
            let n = tree.add_node(Node::other("GAMMA", &["Color"], &["Color"]));
            tree.link(n, "Color", prev.0, prev.1).unwrap();
            prev = (n, "Color");
        }
        let tex = tree.add_node(Node::tex_image(Some(ids[0])));
        tree.link(tex, "Color", prev.0, prev.1).unwrap();
        let material = Material::with_nodes("Deep", tree);

        let mut shallow = ShaderGraphResolver::new(&scene, 4);
        assert!(shallow.resolve(MaterialId::new(0), &material).channels.is_empty());

        let mut deep = ShaderGraphResolver::new(&scene, 64);
        assert_eq!(
            deep.resolve(MaterialId::new(0), &material).channels.get(Channel::Diffuse),
            ["deep.png".to_string()]
        );
    }
}
