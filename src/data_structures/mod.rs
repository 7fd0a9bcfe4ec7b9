//! Engine data structures: geometry, materials, textures, scene graphs, and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `path` and `triangulate` turn 2D outlines into polygons and triangles
//! - `geometry` builds procedural vertex/index data with material groups
//! - `material` describes surface shading
//! - `texture` contains the GPU texture wrapper and sampling settings
//! - `instance` holds per-instance transformation data
//! - `scene_graph` enables hierarchical scene organization
//! - `scene` bundles the graph with its resource tables, lights and camera
//! - `batch` groups mesh nodes for instanced drawing
//! - `model` contains the GPU resources of an uploaded scene

pub mod batch;
pub mod geometry;
pub mod instance;
pub mod material;
pub mod model;
pub mod path;
pub mod scene;
pub mod scene_graph;
pub mod texture;
pub mod triangulate;
