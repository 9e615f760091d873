//! Spatial operations on the 2-D simulation plane.
//!
//! This module provides:
//!
//! - **Point**: a position in meters on the continuous arena plane
//! - **GeoProjection**: latitude/longitude → plane coordinates, using h3o's geodesic distance
//! - **Arena**: the bounded rectangle agents live in
//! - **SpatialGrid**: bucketed agent index for radius neighbor queries
//!
//! Grid buckets are `2 × radius` wide so a radius query touches at most a
//! 3×3 block of buckets.

use std::collections::{BTreeMap, HashMap};

use bevy_ecs::prelude::Resource;
use h3o::LatLng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::agents::AgentId;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Width and height of the simulation plane, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f64,
    pub height: f64,
}

impl Default for Arena {
    /// San Francisco peninsula, sized for the Cabspotting taxi traces.
    fn default() -> Self {
        Self {
            width: 26_300.0,
            height: 33_360.0,
        }
    }
}

impl Arena {
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        let x = rng.gen::<f64>() * self.width;
        let y = rng.gen::<f64>() * self.height;
        Point::new(x, y)
    }

    pub fn contains(&self, point: &Point) -> bool {
        (0.0..=self.width).contains(&point.x) && (0.0..=self.height).contains(&point.y)
    }
}

/// Maps geographic coordinates onto the arena plane.
///
/// `x` is the geodesic distance east of the origin longitude along the origin
/// latitude; `y` is the arena height minus the distance north of the origin
/// latitude, so north is "up" in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoProjection {
    pub origin_lat: f64,
    pub origin_lng: f64,
    pub height: f64,
}

impl Default for GeoProjection {
    fn default() -> Self {
        Self {
            origin_lat: 37.65,
            origin_lng: -122.55,
            height: Arena::default().height,
        }
    }
}

impl GeoProjection {
    /// Returns `None` for coordinates h3o rejects (non-finite values).
    pub fn project(&self, lat: f64, lng: f64) -> Option<Point> {
        let origin = LatLng::new(self.origin_lat, self.origin_lng).ok()?;
        let along_lat = LatLng::new(self.origin_lat, lng).ok()?;
        let along_lng = LatLng::new(lat, self.origin_lng).ok()?;
        let x = origin.distance_m(along_lat);
        let y = self.height - origin.distance_m(along_lng);
        Some(Point::new(x, y))
    }
}

type Bucket = (i64, i64);

/// Agent positions bucketed on a square grid.
#[derive(Debug, Clone, Resource)]
pub struct SpatialGrid {
    cell_size: f64,
    buckets: BTreeMap<Bucket, Vec<AgentId>>,
    positions: HashMap<AgentId, (Bucket, Point)>,
}

impl SpatialGrid {
    /// # Panics
    ///
    /// Panics if `cell_size` is not a positive finite number.
    pub fn new(cell_size: f64) -> Self {
        assert!(
            cell_size.is_finite() && cell_size > 0.0,
            "grid cell size must be positive"
        );
        Self {
            cell_size,
            buckets: BTreeMap::new(),
            positions: HashMap::new(),
        }
    }

    /// Grid sized for neighbor queries of `radius`.
    pub fn for_radius(radius: f64) -> Self {
        Self::new(2.0 * radius)
    }

    pub fn cell_size(&self) -> f64 {
        self.cell_size
    }

    fn bucket_of(&self, point: &Point) -> Bucket {
        (
            (point.x / self.cell_size).floor() as i64,
            (point.y / self.cell_size).floor() as i64,
        )
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn position(&self, id: AgentId) -> Option<Point> {
        self.positions.get(&id).map(|(_, p)| *p)
    }

    /// Inserts or moves an agent.
    pub fn update(&mut self, id: AgentId, point: Point) {
        let bucket = self.bucket_of(&point);
        if let Some((old_bucket, old_point)) = self.positions.get_mut(&id) {
            *old_point = point;
            if *old_bucket == bucket {
                return;
            }
            let previous = *old_bucket;
            *old_bucket = bucket;
            self.detach(id, previous);
        } else {
            self.positions.insert(id, (bucket, point));
        }
        self.buckets.entry(bucket).or_default().push(id);
    }

    pub fn remove(&mut self, id: AgentId) -> bool {
        match self.positions.remove(&id) {
            Some((bucket, _)) => {
                self.detach(id, bucket);
                true
            }
            None => false,
        }
    }

    fn detach(&mut self, id: AgentId, bucket: Bucket) {
        if let Some(ids) = self.buckets.get_mut(&bucket) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.buckets.remove(&bucket);
            }
        }
    }

    /// Agents whose distance to `center` is at most `radius`, in ascending id
    /// order. An agent located exactly at `center` is included.
    pub fn neighbors_within(&self, center: &Point, radius: f64) -> Vec<AgentId> {
        let reach = (radius / self.cell_size).ceil() as i64;
        let (cx, cy) = self.bucket_of(center);
        let mut found = Vec::new();
        for bx in (cx - reach)..=(cx + reach) {
            for by in (cy - reach)..=(cy + reach) {
                let Some(ids) = self.buckets.get(&(bx, by)) else {
                    continue;
                };
                for id in ids {
                    if let Some((_, point)) = self.positions.get(id) {
                        if point.distance(center) <= radius {
                            found.push(*id);
                        }
                    }
                }
            }
        }
        found.sort_unstable();
        found
    }

    /// True if any agent in `ids` lies within `radius` of `center`.
    pub fn any_within<'a>(
        &self,
        center: &Point,
        radius: f64,
        mut ids: impl Iterator<Item = &'a AgentId>,
    ) -> bool {
        ids.any(|id| {
            self.position(*id)
                .is_some_and(|p| p.distance(center) <= radius)
        })
    }
}
