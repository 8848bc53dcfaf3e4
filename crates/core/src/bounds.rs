use crate::{CoreError, CoreResult, Vec3};

/// Axis-aligned bounding box in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    #[inline]
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box enclosing every point. Fails on an empty set or on NaN/inf input.
    pub fn from_points<I>(points: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = [f32; 3]>,
    {
        let mut acc: Option<Self> = None;
        for p in points {
            if !p.iter().all(|c| c.is_finite()) {
                return Err(CoreError::NonFinite(p));
            }
            let v = Vec3::from_array(p);
            acc = Some(match acc {
                Some(b) => Self::new(b.min.min(v), b.max.max(v)),
                None => Self::new(v, v),
            });
        }
        acc.ok_or(CoreError::EmptyBounds)
    }

    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    #[inline]
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Grow to enclose `other` as well.
    #[inline]
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }
}
