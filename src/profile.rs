//! Vehicle profile registry.
//!
//! Each broadcast layout puts the speed, altitude and mission-clock readouts
//! at fixed pixel positions of a 1920x1080 frame. Profiles are immutable and
//! looked up once before the sampling loop starts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TelemetryError;

/// A rectangle in absolute pixel coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    /// X position of top-left corner
    pub x: u32,
    /// Y position of top-left corner
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Builds a rectangle from its two corners (`x2`/`y2` exclusive).
    pub const fn from_corners(x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2.saturating_sub(x1),
            height: y2.saturating_sub(y1),
        }
    }

    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    /// True if the whole rectangle lies inside a `width` x `height` frame.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        self.right() <= width && self.bottom() <= height
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }
}

impl fmt::Display for PixelRect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}+{}+{}", self.width, self.height, self.x, self.y)
    }
}

/// A horizontal sampling path across a propellant gauge bar.
///
/// Construction rejects anything that is not a horizontal segment, so a
/// `GaugeLine` held by a profile is always usable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GaugeLine {
    pub x1: u32,
    pub x2: u32,
    pub y: u32,
}

impl GaugeLine {
    pub fn new(x1: u32, y1: u32, x2: u32, y2: u32) -> Result<Self, TelemetryError> {
        if y1 != y2 {
            return Err(TelemetryError::InvalidGaugeLine(format!(
                "line ({x1}, {y1}) -> ({x2}, {y2}) is not horizontal"
            )));
        }
        Ok(Self { x1, x2, y: y1 })
    }

    /// Accepts raw coordinates as they come from a config file or caller.
    ///
    /// Anything other than four non-negative values is rejected.
    pub fn from_coords(coords: &[i64]) -> Result<Self, TelemetryError> {
        let [x1, y1, x2, y2] = coords else {
            return Err(TelemetryError::InvalidGaugeLine(format!(
                "expected 4 coordinates, got {}",
                coords.len()
            )));
        };
        let to_u32 = |v: i64| {
            u32::try_from(v).map_err(|_| {
                TelemetryError::InvalidGaugeLine(format!("coordinate {v} is out of range"))
            })
        };
        Self::new(to_u32(*x1)?, to_u32(*y1)?, to_u32(*x2)?, to_u32(*y2)?)
    }
}

/// Known vehicle layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleId {
    SuperHeavy,
    StarShip,
    Falcon9,
}

impl VehicleId {
    pub const ALL: [VehicleId; 3] = [VehicleId::SuperHeavy, VehicleId::StarShip, VehicleId::Falcon9];

    pub fn name(&self) -> &'static str {
        match self {
            VehicleId::SuperHeavy => "SuperHeavy",
            VehicleId::StarShip => "StarShip",
            VehicleId::Falcon9 => "Falcon9",
        }
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VehicleId {
    type Err = TelemetryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        VehicleId::ALL
            .into_iter()
            .find(|id| id.name() == s.trim())
            .ok_or_else(|| {
                TelemetryError::Configuration(format!(
                    "unknown vehicle profile '{s}' (choose from: SuperHeavy, StarShip, Falcon9)"
                ))
            })
    }
}

/// Gauge lines for the two propellant tanks of a stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct PropellantGauges {
    pub lox: GaugeLine,
    pub ch4: GaugeLine,
}

/// ROI layout for one vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct VehicleProfile {
    pub id: VehicleId,
    pub speed: PixelRect,
    pub altitude: PixelRect,
    pub mission_clock: PixelRect,
    /// Present only for the Starship stack
    pub gauges: Option<PropellantGauges>,
}

// Broadcast readouts were tuned on a 0.8 scaled layout; the factor is kept
// visible so the constants can be traced back to the overlay.
const fn scaled(v: u32) -> u32 {
    v * 4 / 5
}

const STARSHIP_SPEED_W: u32 = 230;
const STARSHIP_SPEED_H: u32 = 35;
const STARSHIP_CLOCK: PixelRect = PixelRect::new(905, 950, 155, 45);

const fn horizontal(x1: u32, x2: u32, y: u32) -> GaugeLine {
    GaugeLine { x1, x2, y }
}

static SUPER_HEAVY: VehicleProfile = {
    let speed = PixelRect::new(scaled(270), scaled(1135), STARSHIP_SPEED_W, STARSHIP_SPEED_H);
    VehicleProfile {
        id: VehicleId::SuperHeavy,
        speed,
        // Stacked directly beneath the speed readout
        altitude: PixelRect::new(speed.x, speed.y + speed.height, speed.width, speed.height),
        mission_clock: STARSHIP_CLOCK,
        gauges: Some(PropellantGauges {
            lox: horizontal(270, 500, 1042),
            ch4: horizontal(270, 500, 1006),
        }),
    }
};

static STAR_SHIP: VehicleProfile = {
    let speed = PixelRect::new(scaled(1750), scaled(1135), STARSHIP_SPEED_W, STARSHIP_SPEED_H);
    VehicleProfile {
        id: VehicleId::StarShip,
        speed,
        altitude: PixelRect::new(speed.x, speed.y + speed.height, speed.width, speed.height),
        mission_clock: STARSHIP_CLOCK,
        gauges: Some(PropellantGauges {
            lox: horizontal(1460, 1690, 1040),
            ch4: horizontal(1460, 1690, 1050),
        }),
    }
};

static FALCON_9: VehicleProfile = VehicleProfile {
    id: VehicleId::Falcon9,
    speed: PixelRect::new(scaled(145), scaled(1205), 100, 40),
    // Side by side with the speed readout rather than stacked
    altitude: PixelRect::new(scaled(345), scaled(1205), 100, 40),
    mission_clock: PixelRect::new(890, 970, 200, 60),
    gauges: None,
};

/// Returns the immutable profile for `id`.
pub fn profile(id: VehicleId) -> &'static VehicleProfile {
    match id {
        VehicleId::SuperHeavy => &SUPER_HEAVY,
        VehicleId::StarShip => &STAR_SHIP,
        VehicleId::Falcon9 => &FALCON_9,
    }
}

/// Looks a profile up by its name.
///
/// Fails with [`TelemetryError::Configuration`] for unknown names.
pub fn lookup(name: &str) -> Result<&'static VehicleProfile, TelemetryError> {
    let id: VehicleId = name.parse()?;
    Ok(profile(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_all_known_profiles() {
        for id in VehicleId::ALL {
            let p = lookup(id.name()).unwrap();
            assert_eq!(p.id, id);
            for rect in [p.speed, p.altitude, p.mission_clock] {
                assert!(rect.width > 0 && rect.height > 0, "{id}: empty rect {rect}");
                assert!(rect.fits_within(1920, 1080), "{id}: {rect} outside 1080p");
            }
        }
    }

    #[test]
    fn test_lookup_unknown_profile() {
        let err = lookup("Saturn V").unwrap_err();
        assert!(matches!(err, TelemetryError::Configuration(_)));
        assert!(lookup("falcon9").is_err());
        assert!(lookup("").is_err());
    }

    #[test]
    fn test_altitude_layout_differs_for_falcon9() {
        let sh = profile(VehicleId::SuperHeavy);
        assert_eq!(sh.altitude.x, sh.speed.x);
        assert_eq!(sh.altitude.y, sh.speed.bottom());

        let f9 = profile(VehicleId::Falcon9);
        assert_eq!(f9.altitude.y, f9.speed.y);
        assert!(f9.altitude.x > f9.speed.right());
    }

    #[test]
    fn test_gauges_only_for_starship_stack() {
        assert!(profile(VehicleId::SuperHeavy).gauges.is_some());
        assert!(profile(VehicleId::StarShip).gauges.is_some());
        assert!(profile(VehicleId::Falcon9).gauges.is_none());
    }

    #[test]
    fn test_scaled_constants() {
        let sh = profile(VehicleId::SuperHeavy);
        assert_eq!((sh.speed.x, sh.speed.y), (216, 908));
        let ss = profile(VehicleId::StarShip);
        assert_eq!((ss.speed.x, ss.speed.y), (1400, 908));
    }

    #[test]
    fn test_gauge_line_validation() {
        assert!(GaugeLine::new(0, 5, 10, 5).is_ok());
        assert!(matches!(
            GaugeLine::new(0, 5, 10, 6),
            Err(TelemetryError::InvalidGaugeLine(_))
        ));
        assert!(GaugeLine::from_coords(&[0, 5, 10]).is_err());
        assert!(GaugeLine::from_coords(&[0, 5, 10, 5, 1]).is_err());
        assert!(GaugeLine::from_coords(&[-1, 5, 10, 5]).is_err());
        assert_eq!(
            GaugeLine::from_coords(&[3, 7, 9, 7]).unwrap(),
            GaugeLine { x1: 3, x2: 9, y: 7 }
        );
    }

    #[test]
    fn test_rect_helpers() {
        let r = PixelRect::from_corners(10, 20, 30, 25);
        assert_eq!(r, PixelRect::new(10, 20, 20, 5));
        assert!(r.contains(10, 20));
        assert!(!r.contains(30, 20));
        assert!(r.fits_within(30, 25));
        assert!(!r.fits_within(29, 25));
        assert_eq!(r.to_string(), "20x5+10+20");
    }
}
