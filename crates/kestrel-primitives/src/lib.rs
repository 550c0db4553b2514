#![warn(missing_docs)]

//! B-rep fixture construction for the kestrel kernel.
//!
//! Builds small, valid shells (boxes, a plate with a through-hole, an open
//! patch sheet) used throughout the workspace's tests and benches.

use kestrel_geom::{PatchGrid, Plane};
use kestrel_math::{Point2, Point3, Vec3};
use kestrel_topo::{Orientation, ShellId, Topology, VertexId};

/// A constructed fixture: the topology plus the shell of interest.
#[derive(Debug, Clone)]
pub struct Solid {
    /// The topological structure.
    pub topology: Topology,
    /// The shell holding the fixture's geometry.
    pub shell: ShellId,
}

/// Build a box with one corner at the origin and dimensions `(sx, sy, sz)`.
///
/// Six planar faces, twelve edges, eight vertices; outward normals,
/// CCW vertex order when viewed from outside.
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
pub fn make_cube(sx: f64, sy: f64, sz: f64) -> Solid {
    let mut topo = Topology::new();
    let shell = topo.add_shell();

    let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let v1 = topo.add_vertex(Point3::new(sx, 0.0, 0.0));
    let v2 = topo.add_vertex(Point3::new(sx, sy, 0.0));
    let v3 = topo.add_vertex(Point3::new(0.0, sy, 0.0));
    let v4 = topo.add_vertex(Point3::new(0.0, 0.0, sz));
    let v5 = topo.add_vertex(Point3::new(sx, 0.0, sz));
    let v6 = topo.add_vertex(Point3::new(sx, sy, sz));
    let v7 = topo.add_vertex(Point3::new(0.0, sy, sz));

    // Plane normal = x_dir × y_dir; the frames below all produce outward
    // normals.
    let face_defs: [([VertexId; 4], Point3, Vec3, Vec3); 6] = [
        // Bottom (z=0): normal -Z
        (
            [v0, v3, v2, v1],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        // Top (z=sz): normal +Z
        (
            [v4, v5, v6, v7],
            Point3::new(0.0, 0.0, sz),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        // Front (y=0): normal -Y
        (
            [v0, v1, v5, v4],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        // Back (y=sy): normal +Y
        (
            [v2, v3, v7, v6],
            Point3::new(0.0, sy, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
        // Left (x=0): normal -X
        (
            [v0, v4, v7, v3],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        // Right (x=sx): normal +X
        (
            [v1, v2, v6, v5],
            Point3::new(sx, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
    ];

    for (verts, origin, x_dir, y_dir) in face_defs {
        topo.add_planar_face(
            shell,
            &verts,
            Plane::new(origin, x_dir, y_dir),
            Orientation::Forward,
        );
    }

    Solid {
        topology: topo,
        shell,
    }
}

/// Build a plate `(sx, sy, sz)` with a rectangular through-hole running in
/// Z from `(hx0, hy0)` to `(hx1, hy1)`.
///
/// The top and bottom faces carry inner loops; four interior walls line
/// the hole, their outward normals facing into it.
pub fn make_plate_with_hole(
    sx: f64,
    sy: f64,
    sz: f64,
    hx0: f64,
    hy0: f64,
    hx1: f64,
    hy1: f64,
) -> Solid {
    assert!(hx0 > 0.0 && hy0 > 0.0 && hx1 < sx && hy1 < sy && hx0 < hx1 && hy0 < hy1);

    let mut topo = Topology::new();
    let shell = topo.add_shell();

    let v0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let v1 = topo.add_vertex(Point3::new(sx, 0.0, 0.0));
    let v2 = topo.add_vertex(Point3::new(sx, sy, 0.0));
    let v3 = topo.add_vertex(Point3::new(0.0, sy, 0.0));
    let v4 = topo.add_vertex(Point3::new(0.0, 0.0, sz));
    let v5 = topo.add_vertex(Point3::new(sx, 0.0, sz));
    let v6 = topo.add_vertex(Point3::new(sx, sy, sz));
    let v7 = topo.add_vertex(Point3::new(0.0, sy, sz));

    // Hole rim, bottom then top.
    let hb0 = topo.add_vertex(Point3::new(hx0, hy0, 0.0));
    let hb1 = topo.add_vertex(Point3::new(hx1, hy0, 0.0));
    let hb2 = topo.add_vertex(Point3::new(hx1, hy1, 0.0));
    let hb3 = topo.add_vertex(Point3::new(hx0, hy1, 0.0));
    let ht0 = topo.add_vertex(Point3::new(hx0, hy0, sz));
    let ht1 = topo.add_vertex(Point3::new(hx1, hy0, sz));
    let ht2 = topo.add_vertex(Point3::new(hx1, hy1, sz));
    let ht3 = topo.add_vertex(Point3::new(hx0, hy1, sz));

    // Bottom face with hole.
    let bottom = topo.add_planar_face(
        shell,
        &[v0, v3, v2, v1],
        Plane::new(
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        Orientation::Forward,
    );
    topo.add_inner_loop(bottom, &[hb0, hb1, hb2, hb3]);

    // Top face with hole.
    let top = topo.add_planar_face(
        shell,
        &[v4, v5, v6, v7],
        Plane::new(
            Point3::new(0.0, 0.0, sz),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        Orientation::Forward,
    );
    topo.add_inner_loop(top, &[ht0, ht3, ht2, ht1]);

    // Outer walls, as in make_cube.
    let walls: [([VertexId; 4], Point3, Vec3, Vec3); 4] = [
        (
            [v0, v1, v5, v4],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        (
            [v2, v3, v7, v6],
            Point3::new(0.0, sy, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
        (
            [v0, v4, v7, v3],
            Point3::new(0.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        (
            [v1, v2, v6, v5],
            Point3::new(sx, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
    ];
    for (verts, origin, x_dir, y_dir) in walls {
        topo.add_planar_face(
            shell,
            &verts,
            Plane::new(origin, x_dir, y_dir),
            Orientation::Forward,
        );
    }

    // Hole walls; outward normals face into the hole cavity.
    let hole_walls: [([VertexId; 4], Point3, Vec3, Vec3); 4] = [
        // x = hx0, normal +X
        (
            [hb0, hb3, ht3, ht0],
            Point3::new(hx0, hy0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
        // x = hx1, normal -X
        (
            [hb1, ht1, ht2, hb2],
            Point3::new(hx1, hy0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
        ),
        // y = hy0, normal +Y
        (
            [hb0, ht0, ht1, hb1],
            Point3::new(hx0, hy0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 0.0),
        ),
        // y = hy1, normal -Y
        (
            [hb3, hb2, ht2, ht3],
            Point3::new(hx0, hy1, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        ),
    ];
    for (verts, origin, x_dir, y_dir) in hole_walls {
        topo.add_planar_face(
            shell,
            &verts,
            Plane::new(origin, x_dir, y_dir),
            Orientation::Forward,
        );
    }

    Solid {
        topology: topo,
        shell,
    }
}

/// Build an open shell holding a single curved patch-grid face: a 2×2 cell
/// sheet over `[0, size]²` in XY with the central control point lifted by
/// `bump`.
///
/// The sheet's boundary is straight (only the center control point moves),
/// so the trim loop's straight edges coincide with the surface boundary.
pub fn make_patch_sheet(size: f64, bump: f64) -> Solid {
    let mut topo = Topology::new();
    let shell = topo.add_shell();

    let h = size / 2.0;
    let grid = PatchGrid::new(
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(h, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(0.0, h, 0.0),
            Point3::new(h, h, bump),
            Point3::new(size, h, 0.0),
            Point3::new(0.0, size, 0.0),
            Point3::new(h, size, 0.0),
            Point3::new(size, size, 0.0),
        ],
        2,
        2,
    );

    let c0 = topo.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let c1 = topo.add_vertex(Point3::new(size, 0.0, 0.0));
    let c2 = topo.add_vertex(Point3::new(size, size, 0.0));
    let c3 = topo.add_vertex(Point3::new(0.0, size, 0.0));

    topo.add_patch_face(
        shell,
        &[c0, c1, c2, c3],
        &[
            Point2::new(0.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(2.0, 2.0),
            Point2::new(0.0, 2.0),
        ],
        grid,
        Orientation::Forward,
    );

    Solid {
        topology: topo,
        shell,
    }
}
