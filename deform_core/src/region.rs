//! Region masks.
//!
//! Every training mode partitions its samples with its own closed set of
//! tags. Each set is a distinct enum so a batch can never carry a tag from
//! the wrong mode.

use core::fmt::Debug;

use crate::error::CoreError;

/// A closed enumeration of region tags for one training mode.
pub trait RegionMask: Copy + Eq + Debug + Send + Sync + 'static {
    /// Name of the training mode this enumeration belongs to.
    const MODE: &'static str;

    /// Every member of the enumeration, in tag order.
    const ALL: &'static [Self];

    /// Integer tag used by external data.
    fn tag(self) -> u8;

    /// Human readable region name.
    fn name(self) -> &'static str;

    /// Convert an external integer tag.
    fn from_tag(tag: u8) -> Result<Self, CoreError>;
}

/// Regions used when fitting a surface-only deformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceRegion {
    /// Points with a parametric face-model correspondence.
    Flame,
    /// Points on the boundary of the fitted surface.
    Boundary,
}

impl RegionMask for SurfaceRegion {
    const MODE: &'static str = "surface";
    const ALL: &'static [Self] = &[SurfaceRegion::Flame, SurfaceRegion::Boundary];

    fn tag(self) -> u8 {
        match self {
            SurfaceRegion::Flame => 0,
            SurfaceRegion::Boundary => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SurfaceRegion::Flame => "flame",
            SurfaceRegion::Boundary => "boundary",
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CoreError> {
        match tag {
            0 => Ok(SurfaceRegion::Flame),
            1 => Ok(SurfaceRegion::Boundary),
            _ => Err(CoreError::InvalidRegionTag {
                tag,
                mode: Self::MODE,
            }),
        }
    }
}

/// Regions used when fitting a full-head volumetric deformation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HeadRegion {
    /// Points on the skull, which follow a known displacement.
    Skull,
    /// Points on the jaw, which move rigidly.
    Jaw,
    /// Points on the skin surface.
    Surface,
}

impl RegionMask for HeadRegion {
    const MODE: &'static str = "full_head";
    const ALL: &'static [Self] = &[HeadRegion::Skull, HeadRegion::Jaw, HeadRegion::Surface];

    fn tag(self) -> u8 {
        match self {
            HeadRegion::Skull => 0,
            HeadRegion::Jaw => 1,
            HeadRegion::Surface => 2,
        }
    }

    fn name(self) -> &'static str {
        match self {
            HeadRegion::Skull => "skull",
            HeadRegion::Jaw => "jaw",
            HeadRegion::Surface => "surface",
        }
    }

    fn from_tag(tag: u8) -> Result<Self, CoreError> {
        match tag {
            0 => Ok(HeadRegion::Skull),
            1 => Ok(HeadRegion::Jaw),
            2 => Ok(HeadRegion::Surface),
            _ => Err(CoreError::InvalidRegionTag {
                tag,
                mode: Self::MODE,
            }),
        }
    }
}

/// Regions used when training against simulator actuations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimRegion {
    /// Points held in place.
    Fixed,
    /// Every other point.
    Free,
}

impl RegionMask for SimRegion {
    const MODE: &'static str = "simulator";
    const ALL: &'static [Self] = &[SimRegion::Fixed, SimRegion::Free];

    fn tag(self) -> u8 {
        match self {
            SimRegion::Fixed => 0,
            SimRegion::Free => 1,
        }
    }

    fn name(self) -> &'static str {
        match self {
            SimRegion::Fixed => "fixed",
            SimRegion::Free => "free",
        }
    }

    /// Any tag other than the fixed tag is free.
    fn from_tag(tag: u8) -> Result<Self, CoreError> {
        Ok(if tag == 0 {
            SimRegion::Fixed
        } else {
            SimRegion::Free
        })
    }
}

/// Convert a slice of external tags, failing on the first invalid one.
pub fn regions_from_tags<R: RegionMask>(tags: &[u8]) -> Result<Vec<R>, CoreError> {
    tags.iter().map(|&t| R::from_tag(t)).collect()
}
