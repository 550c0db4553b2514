#![warn(missing_docs)]

//! Arena-based B-rep topology for the kestrel kernel.
//!
//! Vertices, edges, loops, faces and shells live in per-kind slotmap
//! arenas; adjacency is stored as id lists, never raw pointers. The
//! structure is built once (pre-validated by the caller) and read-only
//! during ray evaluation, so it can be shared freely across concurrent
//! ray contexts.

use kestrel_geom::{Aabb3, PatchGrid, Plane};
use kestrel_math::{Dir3, Point2, Point3, Vec3};
use slotmap::{new_key_type, SecondaryMap, SlotMap};

new_key_type! {
    /// Stable identity of a vertex.
    pub struct VertexId;
    /// Stable identity of an edge.
    pub struct EdgeId;
    /// Stable identity of a loop.
    pub struct LoopId;
    /// Stable identity of a face.
    pub struct FaceId;
    /// Stable identity of a shell.
    pub struct ShellId;
}

/// Whether a face's surface normal is its outward normal or points into
/// the solid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// The carrier normal is the outward normal.
    Forward,
    /// The outward normal is the reversed carrier normal.
    Reversed,
}

/// A vertex: a point plus its incident edges.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Position in model space.
    pub point: Point3,
    /// Edges incident to this vertex.
    pub edges: Vec<EdgeId>,
}

/// One use of an edge by a face loop; the collection of uses on an edge is
/// the radial fan the in/out state machine walks.
#[derive(Debug, Clone, Copy)]
pub struct EdgeUse {
    /// The face using the edge.
    pub face: FaceId,
    /// The loop within that face.
    pub loop_id: LoopId,
    /// True when the loop traverses the edge start→end.
    pub forward: bool,
}

/// An edge between two vertices.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Start vertex.
    pub start: VertexId,
    /// End vertex.
    pub end: VertexId,
    /// Every face-loop use of this edge.
    pub uses: Vec<EdgeUse>,
}

/// An edge traversed in a specific direction within a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectedEdge {
    /// The underlying edge.
    pub edge: EdgeId,
    /// True when traversed start→end.
    pub forward: bool,
}

/// A closed cycle of directed edges: a face boundary (outer or inner) or a
/// wire loop owned directly by a shell.
#[derive(Debug, Clone)]
pub struct Loop {
    /// Owning face; `None` for wire loops.
    pub face: Option<FaceId>,
    /// Directed edges in traversal order.
    pub edges: Vec<DirectedEdge>,
    /// UV coordinates of each directed edge's start vertex in the owning
    /// face's parameter space. Empty for wire loops.
    pub uvs: Vec<Point2>,
}

/// The geometric carrier of a face.
#[derive(Debug, Clone)]
pub enum FaceSurface {
    /// A planar face.
    Plane(Plane),
    /// A curved face sampled into bilinear cells.
    Patch(PatchGrid),
}

/// A face: surface carrier, orientation, and trimming loops.
#[derive(Debug, Clone)]
pub struct Face {
    /// Owning shell.
    pub shell: ShellId,
    /// Geometric carrier.
    pub surface: FaceSurface,
    /// Whether the carrier normal points outward.
    pub orientation: Orientation,
    /// Outer trimming loop.
    pub outer_loop: LoopId,
    /// Inner trimming loops (holes).
    pub inner_loops: Vec<LoopId>,
    /// Cached bounding box.
    pub aabb: Aabb3,
}

/// A shell: one boundary component, possibly with wire geometry alongside
/// its faces.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Faces of this shell.
    pub faces: Vec<FaceId>,
    /// Wire loops not bounded by any face.
    pub wire_loops: Vec<LoopId>,
    /// Wire edges not part of any loop.
    pub wire_edges: Vec<EdgeId>,
    /// Vertices with no incident edges.
    pub isolated_vertices: Vec<VertexId>,
    /// Cached bounding box.
    pub aabb: Aabb3,
}

/// One passage of a face loop through a vertex: the corner the
/// degenerate-case resolver probes.
#[derive(Debug, Clone, Copy)]
pub struct VertexCorner {
    /// The face whose loop passes through the vertex.
    pub face: FaceId,
    /// The loop in question.
    pub loop_id: LoopId,
    /// Directed edge leaving the vertex along the loop.
    pub outgoing: DirectedEdge,
    /// Directed edge arriving at the vertex along the loop.
    pub incoming: DirectedEdge,
}

/// The complete topological structure of a model.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    /// Vertex arena.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Edge arena.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Loop arena.
    pub loops: SlotMap<LoopId, Loop>,
    /// Face arena.
    pub faces: SlotMap<FaceId, Face>,
    /// Shell arena.
    pub shells: SlotMap<ShellId, Shell>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex at `point`.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        self.vertices.insert(Vertex {
            point,
            edges: Vec::new(),
        })
    }

    /// Add an empty shell.
    pub fn add_shell(&mut self) -> ShellId {
        self.shells.insert(Shell {
            faces: Vec::new(),
            wire_loops: Vec::new(),
            wire_edges: Vec::new(),
            isolated_vertices: Vec::new(),
            aabb: Aabb3::empty(),
        })
    }

    /// Find the edge joining `a` and `b`, creating it if absent.
    pub fn find_or_add_edge(&mut self, a: VertexId, b: VertexId) -> EdgeId {
        for &e in &self.vertices[a].edges {
            let edge = &self.edges[e];
            if (edge.start == a && edge.end == b) || (edge.start == b && edge.end == a) {
                return e;
            }
        }
        let id = self.edges.insert(Edge {
            start: a,
            end: b,
            uses: Vec::new(),
        });
        self.vertices[a].edges.push(id);
        if b != a {
            self.vertices[b].edges.push(id);
        }
        id
    }

    fn build_loop(
        &mut self,
        face: Option<FaceId>,
        verts: &[VertexId],
        uvs: Vec<Point2>,
    ) -> LoopId {
        let mut edges = Vec::with_capacity(verts.len());
        for i in 0..verts.len() {
            let a = verts[i];
            let b = verts[(i + 1) % verts.len()];
            let edge = self.find_or_add_edge(a, b);
            let forward = self.edges[edge].start == a;
            edges.push(DirectedEdge { edge, forward });
        }
        let loop_id = self.loops.insert(Loop { face, edges, uvs });
        if let Some(face_id) = face {
            for de in self.loops[loop_id].edges.clone() {
                self.edges[de.edge].uses.push(EdgeUse {
                    face: face_id,
                    loop_id,
                    forward: de.forward,
                });
            }
        }
        loop_id
    }

    /// Add a planar face to `shell` from vertices in outward-CCW order.
    ///
    /// Loop UVs are projected onto the plane's frame.
    pub fn add_planar_face(
        &mut self,
        shell: ShellId,
        verts: &[VertexId],
        plane: Plane,
        orientation: Orientation,
    ) -> FaceId {
        let uvs: Vec<Point2> = verts
            .iter()
            .map(|&v| plane.project(&self.vertices[v].point))
            .collect();
        let mut aabb = Aabb3::empty();
        for &v in verts {
            aabb.include_point(&self.vertices[v].point);
        }

        let face_id = self.faces.insert(Face {
            shell,
            surface: FaceSurface::Plane(plane),
            orientation,
            outer_loop: LoopId::default(),
            inner_loops: Vec::new(),
            aabb,
        });
        let loop_id = self.build_loop(Some(face_id), verts, uvs);
        self.faces[face_id].outer_loop = loop_id;
        self.shells[shell].faces.push(face_id);
        self.shells[shell].aabb.include(&aabb);
        face_id
    }

    /// Add an inner (hole) loop to an existing planar face.
    pub fn add_inner_loop(&mut self, face: FaceId, verts: &[VertexId]) -> LoopId {
        let plane = match &self.faces[face].surface {
            FaceSurface::Plane(p) => p.clone(),
            FaceSurface::Patch(_) => panic!("inner loops on patch faces need explicit UVs"),
        };
        let uvs: Vec<Point2> = verts
            .iter()
            .map(|&v| plane.project(&self.vertices[v].point))
            .collect();
        let loop_id = self.build_loop(Some(face), verts, uvs);
        for &v in verts {
            let p = self.vertices[v].point;
            self.faces[face].aabb.include_point(&p);
        }
        self.faces[face].inner_loops.push(loop_id);
        loop_id
    }

    /// Add a curved face backed by a patch grid. `uvs` gives each vertex's
    /// position in the grid's parameter domain.
    pub fn add_patch_face(
        &mut self,
        shell: ShellId,
        verts: &[VertexId],
        uvs: &[Point2],
        grid: PatchGrid,
        orientation: Orientation,
    ) -> FaceId {
        assert_eq!(verts.len(), uvs.len());
        let mut aabb = grid.aabb();
        for &v in verts {
            aabb.include_point(&self.vertices[v].point);
        }
        let face_id = self.faces.insert(Face {
            shell,
            surface: FaceSurface::Patch(grid),
            orientation,
            outer_loop: LoopId::default(),
            inner_loops: Vec::new(),
            aabb,
        });
        let loop_id = self.build_loop(Some(face_id), verts, uvs.to_vec());
        self.faces[face_id].outer_loop = loop_id;
        self.shells[shell].faces.push(face_id);
        self.shells[shell].aabb.include(&aabb);
        face_id
    }

    /// Add a wire loop (a closed edge cycle with no face) to a shell.
    pub fn add_wire_loop(&mut self, shell: ShellId, verts: &[VertexId]) -> LoopId {
        let loop_id = self.build_loop(None, verts, Vec::new());
        for &v in verts {
            let p = self.vertices[v].point;
            self.shells[shell].aabb.include_point(&p);
        }
        self.shells[shell].wire_loops.push(loop_id);
        loop_id
    }

    /// Add a lone wire edge to a shell.
    pub fn add_wire_edge(&mut self, shell: ShellId, a: VertexId, b: VertexId) -> EdgeId {
        let edge = self.find_or_add_edge(a, b);
        let (pa, pb) = (self.vertices[a].point, self.vertices[b].point);
        self.shells[shell].aabb.include_point(&pa);
        self.shells[shell].aabb.include_point(&pb);
        self.shells[shell].wire_edges.push(edge);
        edge
    }

    /// Add an isolated vertex to a shell.
    pub fn add_isolated_vertex(&mut self, shell: ShellId, v: VertexId) {
        let p = self.vertices[v].point;
        self.shells[shell].aabb.include_point(&p);
        self.shells[shell].isolated_vertices.push(v);
    }

    /// Endpoints of an edge as points.
    pub fn edge_points(&self, e: EdgeId) -> (Point3, Point3) {
        let edge = &self.edges[e];
        (
            self.vertices[edge.start].point,
            self.vertices[edge.end].point,
        )
    }

    /// Start vertex of a directed edge (in traversal order).
    pub fn directed_start(&self, de: &DirectedEdge) -> VertexId {
        let edge = &self.edges[de.edge];
        if de.forward {
            edge.start
        } else {
            edge.end
        }
    }

    /// End vertex of a directed edge (in traversal order).
    pub fn directed_end(&self, de: &DirectedEdge) -> VertexId {
        let edge = &self.edges[de.edge];
        if de.forward {
            edge.end
        } else {
            edge.start
        }
    }

    /// Direction vector of a directed edge (not normalized).
    pub fn directed_vector(&self, de: &DirectedEdge) -> Vec3 {
        self.vertices[self.directed_end(de)].point - self.vertices[self.directed_start(de)].point
    }

    /// Vertices of a loop in traversal order.
    pub fn loop_vertices(&self, l: LoopId) -> Vec<VertexId> {
        self.loops[l]
            .edges
            .iter()
            .map(|de| self.directed_start(de))
            .collect()
    }

    /// Outward normal of a face at parameter `uv`, or `None` when the
    /// carrier degenerates there.
    pub fn face_outward_normal(&self, f: FaceId, uv: Point2) -> Option<Dir3> {
        let face = &self.faces[f];
        let n = match &face.surface {
            FaceSurface::Plane(p) => p.normal_dir,
            FaceSurface::Patch(g) => g.normal(uv)?,
        };
        Some(match face.orientation {
            Orientation::Forward => n,
            Orientation::Reversed => Dir3::new_normalize(-n.into_inner()),
        })
    }

    /// The "left" vector of an edge-use: outward face normal crossed with
    /// the loop traversal direction, pointing across the edge into the
    /// face interior. `uv` locates the normal on curved carriers.
    pub fn edge_use_left(&self, face: FaceId, de: &DirectedEdge, uv: Point2) -> Option<Vec3> {
        let n = self.face_outward_normal(face, uv)?;
        let dir = self.directed_vector(de);
        let len = dir.norm();
        if len < 1e-12 {
            return None;
        }
        Some(n.as_ref().cross(&(dir / len)))
    }

    /// UV of a directed edge's start vertex within its loop, for loops
    /// that carry parameter data.
    pub fn loop_uv_at(&self, loop_id: LoopId, index: usize) -> Option<Point2> {
        self.loops[loop_id].uvs.get(index).copied()
    }

    /// Every face-loop corner passing through `v`.
    pub fn vertex_corners(&self, v: VertexId) -> Vec<VertexCorner> {
        let mut seen: Vec<LoopId> = Vec::new();
        let mut corners = Vec::new();
        for &e in &self.vertices[v].edges {
            for use_ in &self.edges[e].uses {
                if seen.contains(&use_.loop_id) {
                    continue;
                }
                seen.push(use_.loop_id);
                let lp = &self.loops[use_.loop_id];
                let n = lp.edges.len();
                for k in 0..n {
                    if self.directed_start(&lp.edges[k]) == v {
                        corners.push(VertexCorner {
                            face: use_.face,
                            loop_id: use_.loop_id,
                            outgoing: lp.edges[k],
                            incoming: lp.edges[(k + n - 1) % n],
                        });
                    }
                }
            }
        }
        corners
    }

    /// Union of all shell bounding boxes.
    pub fn model_aabb(&self) -> Aabb3 {
        let mut aabb = Aabb3::empty();
        for (_, shell) in &self.shells {
            aabb.include(&shell.aabb);
        }
        for (_, v) in &self.vertices {
            aabb.include_point(&v.point);
        }
        aabb
    }
}

/// Per-face 2-manifold annotation: true when every edge of the face is
/// shared by exactly two face-uses within the owning shell.
///
/// Computed once per model and shared read-only across concurrent ray
/// evaluations.
#[derive(Debug, Clone)]
pub struct Manifolds {
    flags: SecondaryMap<FaceId, bool>,
}

impl Manifolds {
    /// Compute the annotation for every face in the topology.
    pub fn compute(topo: &Topology) -> Self {
        let mut flags = SecondaryMap::new();
        for (face_id, face) in &topo.faces {
            flags.insert(face_id, face_is_two_manifold(topo, face));
        }
        Self { flags }
    }

    /// Whether `face` is part of a clean 2-manifold.
    pub fn is_two_manifold(&self, face: FaceId) -> bool {
        self.flags.get(face).copied().unwrap_or(false)
    }
}

fn face_is_two_manifold(topo: &Topology, face: &Face) -> bool {
    let shell = face.shell;
    let mut loops = vec![face.outer_loop];
    loops.extend_from_slice(&face.inner_loops);
    for loop_id in loops {
        for de in &topo.loops[loop_id].edges {
            let shared = topo.edges[de.edge]
                .uses
                .iter()
                .filter(|u| topo.faces[u.face].shell == shell)
                .count();
            if shared != 2 {
                return false;
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use kestrel_math::Vec3;

    fn square_face(topo: &mut Topology) -> (ShellId, FaceId, [VertexId; 4]) {
        let shell = topo.add_shell();
        let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let v1 = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let v2 = topo.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let v3 = topo.add_vertex(Point3::new(0.0, 1.0, 0.0));
        let face = topo.add_planar_face(
            shell,
            &[v0, v1, v2, v3],
            Plane::xy(),
            Orientation::Forward,
        );
        (shell, face, [v0, v1, v2, v3])
    }

    #[test]
    fn test_edge_dedup() {
        let mut topo = Topology::new();
        let a = topo.add_vertex(Point3::origin());
        let b = topo.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let e1 = topo.find_or_add_edge(a, b);
        let e2 = topo.find_or_add_edge(b, a);
        assert_eq!(e1, e2);
        assert_eq!(topo.edges.len(), 1);
    }

    #[test]
    fn test_planar_face_wiring() {
        let mut topo = Topology::new();
        let (shell, face, verts) = square_face(&mut topo);
        assert_eq!(topo.shells[shell].faces, vec![face]);
        assert_eq!(topo.edges.len(), 4);

        let loop_id = topo.faces[face].outer_loop;
        assert_eq!(topo.loop_vertices(loop_id), verts.to_vec());
        // Every edge carries exactly one use of this face.
        for (_, edge) in &topo.edges {
            assert_eq!(edge.uses.len(), 1);
            assert_eq!(edge.uses[0].face, face);
        }
        // Loop UVs match the XY plane projection.
        let uvs = &topo.loops[loop_id].uvs;
        assert_relative_eq!(uvs[2].x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(uvs[2].y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_corners() {
        let mut topo = Topology::new();
        let (_, face, verts) = square_face(&mut topo);
        let corners = topo.vertex_corners(verts[0]);
        assert_eq!(corners.len(), 1);
        let corner = corners[0];
        assert_eq!(corner.face, face);
        assert_eq!(topo.directed_start(&corner.outgoing), verts[0]);
        assert_eq!(topo.directed_end(&corner.incoming), verts[0]);
        assert_eq!(topo.directed_start(&corner.incoming), verts[3]);
    }

    #[test]
    fn test_left_vector_points_into_face() {
        let mut topo = Topology::new();
        let (_, face, _) = square_face(&mut topo);
        let loop_id = topo.faces[face].outer_loop;
        // First directed edge runs along +X at y=0; interior is +Y.
        let de = topo.loops[loop_id].edges[0];
        let left = topo
            .edge_use_left(face, &de, Point2::new(0.5, 0.0))
            .unwrap();
        assert_relative_eq!(left.dot(&Vec3::y()), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_single_face_is_not_two_manifold() {
        let mut topo = Topology::new();
        let (_, face, _) = square_face(&mut topo);
        let manifolds = Manifolds::compute(&topo);
        assert!(!manifolds.is_two_manifold(face));
    }

    #[test]
    fn test_orientation_flips_outward_normal() {
        let mut topo = Topology::new();
        let (shell, _, _) = square_face(&mut topo);
        let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 1.0));
        let v1 = topo.add_vertex(Point3::new(1.0, 0.0, 1.0));
        let v2 = topo.add_vertex(Point3::new(1.0, 1.0, 1.0));
        let plane = Plane::new(Point3::new(0.0, 0.0, 1.0), Vec3::x(), Vec3::y());
        let face = topo.add_planar_face(shell, &[v0, v1, v2], plane, Orientation::Reversed);
        let n = topo
            .face_outward_normal(face, Point2::new(0.0, 0.0))
            .unwrap();
        assert_relative_eq!(n.as_ref().z, -1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wire_and_isolated_extend_shell_box() {
        let mut topo = Topology::new();
        let shell = topo.add_shell();
        let a = topo.add_vertex(Point3::new(-5.0, 0.0, 0.0));
        let b = topo.add_vertex(Point3::new(5.0, 0.0, 0.0));
        topo.add_wire_edge(shell, a, b);
        let lone = topo.add_vertex(Point3::new(0.0, 9.0, 0.0));
        topo.add_isolated_vertex(shell, lone);
        let aabb = topo.shells[shell].aabb;
        assert_relative_eq!(aabb.min.x, -5.0, epsilon = 1e-12);
        assert_relative_eq!(aabb.max.y, 9.0, epsilon = 1e-12);
    }
}
