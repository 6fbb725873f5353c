/// Mesh data, loaders and procedural generators
pub mod mesh;
pub mod obj;
pub mod primitives;

pub use mesh::{Mesh, MeshTransform, Vertex};
pub use obj::{load_obj, parse_obj, ObjOptions};
