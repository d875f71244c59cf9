//! Steering Lookup Table
//!
//! Maps a reflectance reading to a steering correction for line following.
//! The table is asymmetric: fine steps close to the line edge
//! (around 40), coarse corrections far from it. There is no integral or
//! derivative term; the table alone shapes the response.

use heapless::Vec;

use crate::system::error::Error;

/// Most ranges a table can hold
pub const MAX_RANGES: usize = 16;

/// Half-open key range `[min, max)` with its steering value
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteeringRange {
    pub min: f32,
    pub max: f32,
    pub value: f32,
}

impl SteeringRange {
    pub const fn new(min: f32, max: f32, value: f32) -> Self {
        Self { min, max, value }
    }

    fn contains(&self, key: f32) -> bool {
        key >= self.min && key < self.max
    }
}

/// Default calibration for a 0..100 reflectance reading, line edge near 40
const DEFAULT_RANGES: [SteeringRange; 10] = [
    SteeringRange::new(0.0, 11.0, 60.0),
    SteeringRange::new(11.0, 21.0, 40.0),
    SteeringRange::new(21.0, 31.0, 20.0),
    SteeringRange::new(31.0, 36.0, 10.0),
    SteeringRange::new(36.0, 41.0, 5.0),
    SteeringRange::new(41.0, 46.0, -5.0),
    SteeringRange::new(46.0, 51.0, -10.0),
    SteeringRange::new(51.0, 61.0, -20.0),
    SteeringRange::new(61.0, 71.0, -40.0),
    SteeringRange::new(71.0, 100.0, -80.0),
];

/// Ordered, non-overlapping range table
#[derive(Debug, Clone, PartialEq)]
pub struct SteeringLookupTable {
    ranges: Vec<SteeringRange, MAX_RANGES>,
}

impl SteeringLookupTable {
    /// Build a table from ranges in ascending order
    ///
    /// Rejects empty tables, empty or inverted ranges and ranges that overlap
    /// or are out of order.
    pub fn from_ranges(ranges: &[SteeringRange]) -> Result<Self, Error> {
        if ranges.is_empty() {
            return Err(Error::InvalidSteeringTable);
        }

        let mut table = Vec::new();
        let mut previous_max = f32::NEG_INFINITY;
        for range in ranges {
            if range.min >= range.max || range.min < previous_max {
                return Err(Error::InvalidSteeringTable);
            }
            previous_max = range.max;
            table
                .push(*range)
                .map_err(|_| Error::InvalidSteeringTable)?;
        }

        Ok(Self { ranges: table })
    }

    /// Steering correction for `key`, 0 if no range contains it
    pub fn get_value(&self, key: f32) -> f32 {
        self.ranges
            .iter()
            .find(|range| range.contains(key))
            .map_or(0.0, |range| range.value)
    }

    /// The ranges in evaluation order
    pub fn ranges(&self) -> &[SteeringRange] {
        &self.ranges
    }
}

impl Default for SteeringLookupTable {
    fn default() -> Self {
        Self {
            ranges: Vec::from_slice(&DEFAULT_RANGES).unwrap_or_default(),
        }
    }
}
