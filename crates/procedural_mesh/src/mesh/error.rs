//! Invalid-input errors for section and hull mutation
//!
//! The public mutation API logs these and becomes a no-op; the `try_*`
//! variants on the component hand them back to the caller instead.

use thiserror::Error;

/// Result type for mesh mutations
pub type MeshResult<T> = Result<T, MeshError>;

/// Reasons a mutation was rejected before touching the section store
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MeshError {
    /// Vertex or index list was empty
    #[error("Section {section} rejected: empty geometry ({vertices} vertices, {indices} indices)")]
    EmptyGeometry {
        /// Target section index
        section: usize,
        /// Vertex count supplied
        vertices: usize,
        /// Index count supplied
        indices: usize,
    },

    /// A triangle index was negative
    #[error("Section {section} rejected: negative triangle index {value} at position {position}")]
    NegativeIndex {
        /// Target section index
        section: usize,
        /// Position in the index list
        position: usize,
        /// The offending value
        value: i32,
    },

    /// A triangle index referenced a vertex that does not exist
    #[error("Section {section} rejected: index {value} at position {position} exceeds vertex count {vertex_count}")]
    IndexOutOfRange {
        /// Target section index
        section: usize,
        /// Position in the index list
        position: usize,
        /// The offending value
        value: u32,
        /// Number of vertices supplied
        vertex_count: usize,
    },

    /// Section index beyond the addressable range
    #[error("Section index {index} exceeds the maximum of {max}")]
    SectionIndexTooLarge {
        /// Requested section index
        index: usize,
        /// Largest accepted index
        max: usize,
    },

    /// No section exists at the given index
    #[error("Section {0} does not exist")]
    SectionNotFound(usize),

    /// A convex hull needs at least four points
    #[error("Convex hull rejected: {0} points supplied, at least 4 required")]
    TooFewHullPoints(usize),
}
