//! Construction of the vignette's static scene

use crate::resources::{Material, Mesh};
use crate::scene::{NodeId, SceneError, SceneGraph, Transform};
use glam::Vec3;
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

pub const STAR_COUNT: usize = 200;

const DARK_BLUE: u32 = 0x00008B;
const RED: u32 = 0xFF0000;
const COCOA: u32 = 0x6F4E37;
const GREEN: u32 = 0x00FF00;
const BROWN: u32 = 0x8B4513;
const WHITE: u32 = 0xFFFFFF;

/// A star node and the position it was placed at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    pub node: NodeId,
    pub base: Vec3,
}

/// Handles to the nodes the animation writes to
#[derive(Debug, Clone)]
pub struct Rig {
    pub figure: NodeId,
    pub left_arm: NodeId,
    pub right_arm: NodeId,
    pub left_leg: NodeId,
    pub right_leg: NodeId,
    pub ground: NodeId,
    pub tree: NodeId,
    pub stars: Vec<Star>,
}

/// Build the figure, ground, tree and star field
///
/// Only the star field draws from `rng`; everything else is fixed.
pub fn build_scene(rng: &mut impl Rng) -> Result<(SceneGraph, Rig), SceneError> {
    let mut scene = SceneGraph::new();

    let figure = build_figure(&mut scene)?;
    scene.add_root(figure.group)?;

    let plane = scene.add_mesh(Mesh::plane(100.0, 100.0, 1));
    let green = scene.add_material(Material::from_hex("ground", GREEN));
    let ground = scene.add_mesh_node(
        "ground",
        Transform::new().with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        plane,
        green,
    );
    scene.add_root(ground)?;

    let tree = build_tree(&mut scene)?;
    scene.add_root(tree)?;

    let stars = build_stars(&mut scene, rng)?;

    log::debug!(
        "Built scene: {} nodes, {} meshes, {} materials",
        scene.node_count(),
        scene.meshes().len(),
        scene.materials().len()
    );

    let rig = Rig {
        figure: figure.group,
        left_arm: figure.left_arm,
        right_arm: figure.right_arm,
        left_leg: figure.left_leg,
        right_leg: figure.right_leg,
        ground,
        tree,
        stars,
    };
    Ok((scene, rig))
}

struct Figure {
    group: NodeId,
    left_arm: NodeId,
    right_arm: NodeId,
    left_leg: NodeId,
    right_leg: NodeId,
}

fn build_figure(scene: &mut SceneGraph) -> Result<Figure, SceneError> {
    let torso_mesh = scene.add_mesh(Mesh::cuboid(1.0, 2.0, 0.5));
    let head_mesh = scene.add_mesh(Mesh::cuboid(0.8, 0.8, 0.8));
    let arm_mesh = scene.add_mesh(Mesh::cuboid(0.2, 1.5, 0.2));
    let leg_mesh = scene.add_mesh(Mesh::cuboid(0.5, 1.5, 0.5));
    let eye_mesh = scene.add_mesh(Mesh::sphere(0.1, 32, 32));
    let nose_mesh = scene.add_mesh(Mesh::cone(0.1, 0.3, 32));

    let body = scene.add_material(Material::from_hex("body", DARK_BLUE));
    let head = scene.add_material(Material::from_hex("head", RED));
    // Limbs and face details share one material
    let cocoa = scene.add_material(Material::from_hex("cocoa", COCOA));

    let group = scene.add_group("figure", Transform::default());

    let parts = [
        ("torso", torso_mesh, body, Vec3::new(0.0, 1.75, 0.0)),
        ("head", head_mesh, head, Vec3::new(0.0, 3.25, 0.0)),
        ("left_arm", arm_mesh, cocoa, Vec3::new(-0.7, 2.25, 0.0)),
        ("right_arm", arm_mesh, cocoa, Vec3::new(0.7, 2.25, 0.0)),
        ("left_leg", leg_mesh, cocoa, Vec3::new(-0.3, 0.25, 0.0)),
        ("right_leg", leg_mesh, cocoa, Vec3::new(0.3, 0.25, 0.0)),
        ("left_eye", eye_mesh, cocoa, Vec3::new(-0.3, 3.5, 0.5)),
        ("right_eye", eye_mesh, cocoa, Vec3::new(0.3, 3.5, 0.5)),
        ("nose", nose_mesh, cocoa, Vec3::new(0.0, 3.0, 0.7)),
    ];

    let mut nodes = Vec::with_capacity(parts.len());
    for (name, mesh, material, position) in parts {
        let node = scene.add_mesh_node(name, Transform::from_position(position), mesh, material);
        scene.add_child(group, node)?;
        nodes.push(node);
    }

    Ok(Figure {
        group,
        left_arm: nodes[2],
        right_arm: nodes[3],
        left_leg: nodes[4],
        right_leg: nodes[5],
    })
}

fn build_tree(scene: &mut SceneGraph) -> Result<NodeId, SceneError> {
    let trunk_mesh = scene.add_mesh(Mesh::cylinder(0.1, 0.1, 2.0, 32));
    let leaves_mesh = scene.add_mesh(Mesh::sphere(0.5, 8, 6));
    let bark = scene.add_material(Material::from_hex("trunk", BROWN));
    let leaves_color = scene.add_material(Material::from_hex("leaves", RED));

    let tree = scene.add_group("tree", Transform::from_position(Vec3::new(-5.0, 0.0, 5.0)));
    let trunk = scene.add_mesh_node("trunk", Transform::default(), trunk_mesh, bark);
    let leaves = scene.add_mesh_node(
        "leaves",
        Transform::from_position(Vec3::new(0.0, 1.5, 0.0)),
        leaves_mesh,
        leaves_color,
    );
    scene.add_child(tree, trunk)?;
    scene.add_child(tree, leaves)?;
    Ok(tree)
}

fn build_stars(scene: &mut SceneGraph, rng: &mut impl Rng) -> Result<Vec<Star>, SceneError> {
    let star_mesh = scene.add_mesh(Mesh::sphere(0.05, 32, 32));
    let white = scene.add_material(Material::from_hex("star", WHITE));

    let mut stars = Vec::with_capacity(STAR_COUNT);
    for _ in 0..STAR_COUNT {
        let size: f32 = rng.gen_range(0.5..1.5);
        let base = Vec3::new(
            rng.gen_range(-50.0..50.0),
            rng.gen_range(25.0..75.0),
            rng.gen_range(-50.0..50.0),
        );
        let node = scene.add_mesh_node(
            "star",
            Transform::from_position_scale(base, Vec3::splat(size)),
            star_mesh,
            white,
        );
        scene.add_root(node)?;
        stars.push(Star { node, base });
    }
    Ok(stars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn build(seed: u64) -> (SceneGraph, Rig) {
        build_scene(&mut StdRng::seed_from_u64(seed)).unwrap()
    }

    fn child_names(scene: &SceneGraph, id: NodeId) -> Vec<String> {
        scene
            .node(id)
            .unwrap()
            .children()
            .iter()
            .map(|&child| scene.node(child).unwrap().name.clone())
            .collect()
    }

    #[test]
    fn top_level_order() {
        let (scene, rig) = build(1);
        let roots = scene.roots();
        assert_eq!(roots.len(), 3 + STAR_COUNT);
        assert_eq!(roots[0], rig.figure);
        assert_eq!(roots[1], rig.ground);
        assert_eq!(roots[2], rig.tree);
        let star_nodes: Vec<NodeId> = rig.stars.iter().map(|s| s.node).collect();
        assert_eq!(&roots[3..], star_nodes.as_slice());
    }

    #[test]
    fn figure_parts_in_order() {
        let (scene, rig) = build(1);
        assert_eq!(
            child_names(&scene, rig.figure),
            [
                "torso", "head", "left_arm", "right_arm", "left_leg", "right_leg", "left_eye",
                "right_eye", "nose"
            ]
        );
        assert!(scene.node(rig.figure).unwrap().is_group());
        assert_eq!(scene.node(rig.left_arm).unwrap().name, "left_arm");
        assert_eq!(scene.node(rig.right_leg).unwrap().name, "right_leg");

        let head = scene.find("head").unwrap();
        assert_eq!(scene.transform(head).unwrap().position, Vec3::new(0.0, 3.25, 0.0));
        let torso = scene.find("torso").unwrap();
        assert_eq!(scene.transform(torso).unwrap().position, Vec3::new(0.0, 1.75, 0.0));
    }

    #[test]
    fn limbs_and_face_share_one_material() {
        let (scene, _) = build(1);
        let material_of = |name: &str| {
            let id = scene.find(name).unwrap();
            scene.node(id).unwrap().renderable.unwrap().material
        };
        let cocoa = material_of("left_arm");
        for part in ["right_arm", "left_leg", "right_leg", "left_eye", "right_eye", "nose"] {
            assert_eq!(material_of(part), cocoa, "{part}");
        }
        assert_ne!(material_of("torso"), cocoa);
        assert_eq!(scene.material(cocoa).unwrap().name, "cocoa");
    }

    #[test]
    fn tree_has_trunk_and_leaves() {
        let (scene, rig) = build(1);
        assert_eq!(child_names(&scene, rig.tree), ["trunk", "leaves"]);
        assert_eq!(
            scene.transform(rig.tree).unwrap().position,
            Vec3::new(-5.0, 0.0, 5.0)
        );
        let leaves = scene.find("leaves").unwrap();
        let world = scene.world_matrix(leaves).unwrap().transform_point3(Vec3::ZERO);
        assert!((world - Vec3::new(-5.0, 1.5, 5.0)).length() < 1e-6);
    }

    #[test]
    fn ground_faces_up() {
        let (scene, rig) = build(1);
        let world = scene.world_matrix(rig.ground).unwrap();
        assert!((world.transform_vector3(Vec3::Z) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn stars_within_bounds_and_share_geometry() {
        let (scene, rig) = build(7);
        assert_eq!(rig.stars.len(), STAR_COUNT);

        let first = scene.node(rig.stars[0].node).unwrap().renderable.unwrap();
        for star in &rig.stars {
            let b = star.base;
            assert!((-50.0..50.0).contains(&b.x));
            assert!((25.0..75.0).contains(&b.y));
            assert!((-50.0..50.0).contains(&b.z));

            let transform = scene.transform(star.node).unwrap();
            assert_eq!(transform.position, b);
            assert!((0.5..1.5).contains(&transform.scale.x));
            assert_eq!(transform.scale, Vec3::splat(transform.scale.x));

            assert_eq!(scene.node(star.node).unwrap().renderable.unwrap(), first);
        }

        let base_sphere = scene.mesh(first.mesh).unwrap();
        let (_, max) = base_sphere.bounds();
        assert!((max.y - 0.05).abs() < 1e-6);
    }

    #[test]
    fn same_seed_same_sky() {
        let (_, a) = build(42);
        let (_, b) = build(42);
        let (_, c) = build(43);
        assert_eq!(a.stars, b.stars);
        assert_ne!(a.stars, c.stars);
    }

    #[test]
    fn renderable_totals() {
        let (scene, _) = build(3);
        // 9 figure parts, ground, trunk, leaves, stars
        assert_eq!(scene.renderable_count(), 9 + 1 + 2 + STAR_COUNT);
        assert_eq!(scene.draw_list().len(), scene.renderable_count());
        assert_eq!(scene.meshes().len(), 10);
    }
}
