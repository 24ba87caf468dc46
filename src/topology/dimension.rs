//! `Dimension`: the element-rank vocabulary of a cell complex.
//!
//! Every mesh element belongs to exactly one rank: vertex, edge, triangle
//! or tetrahedron. The numeric value of each variant is its topological
//! dimension, so `Dimension` doubles as an index into per-dimension tables
//! (attribute columns, capacities, generation ledgers).

use std::fmt;

/// Rank of a mesh element. The discriminant is the topological dimension.
#[derive(
    Copy,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Debug,
    serde::Serialize,
    serde::Deserialize,
)]
#[repr(u8)]
pub enum Dimension {
    /// 0-dimensional element (point).
    Vertex = 0,
    /// 1-dimensional element.
    Edge = 1,
    /// 2-dimensional element.
    Triangle = 2,
    /// 3-dimensional element.
    Tetrahedron = 3,
}

impl Dimension {
    /// All ranks in ascending order.
    pub const ALL: [Dimension; 4] = [
        Dimension::Vertex,
        Dimension::Edge,
        Dimension::Triangle,
        Dimension::Tetrahedron,
    ];

    /// Topological dimension as an index (`Vertex == 0`, … `Tetrahedron == 3`).
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Rank for a raw dimension index, if in range.
    #[inline]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Dimension::Vertex),
            1 => Some(Dimension::Edge),
            2 => Some(Dimension::Triangle),
            3 => Some(Dimension::Tetrahedron),
            _ => None,
        }
    }

    /// Iterator over all ranks up to and including `top`.
    pub fn up_to(top: Dimension) -> impl Iterator<Item = Dimension> {
        Self::ALL.into_iter().filter(move |d| *d <= top)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Vertex => "vertex",
            Dimension::Edge => "edge",
            Dimension::Triangle => "triangle",
            Dimension::Tetrahedron => "tetrahedron",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_roundtrip() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_index(d.index()), Some(d));
        }
        assert_eq!(Dimension::from_index(4), None);
    }

    #[test]
    fn up_to_triangle() {
        let ranks: Vec<_> = Dimension::up_to(Dimension::Triangle).collect();
        assert_eq!(
            ranks,
            vec![Dimension::Vertex, Dimension::Edge, Dimension::Triangle]
        );
    }

    #[test]
    fn ordering_matches_rank() {
        assert!(Dimension::Vertex < Dimension::Edge);
        assert!(Dimension::Triangle < Dimension::Tetrahedron);
    }

    #[test]
    fn serde_roundtrip() {
        let s = serde_json::to_string(&Dimension::Edge).unwrap();
        let d: Dimension = serde_json::from_str(&s).unwrap();
        assert_eq!(d, Dimension::Edge);
    }
}
