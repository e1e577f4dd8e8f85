use crate::error::ShapeError;

// ============================================================================
// Defaults
// ============================================================================

/// Side length of one grid cell in pixels.
pub const BLOCK_SIZE: i32 = 40;
/// Granularity of every resolved motion step in pixels.
pub const MOVE_UNIT: i32 = 4;
/// Largest distance a piece travels on one axis during a single tick.
pub const MAX_SPEED: i32 = 20;

// ============================================================================
// Config
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Config {
    pub block_size: i32,
    pub move_unit: i32,
    pub max_speed: i32,
}

impl Config {
    pub fn new(block_size: i32, move_unit: i32, max_speed: i32) -> Result<Self, ShapeError> {
        let config = Self {
            block_size,
            move_unit,
            max_speed,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ShapeError> {
        for (name, value) in [
            ("block size", self.block_size),
            ("move unit", self.move_unit),
            ("max speed", self.max_speed),
        ] {
            if value <= 0 {
                return Err(ShapeError::NonPositive { name, value });
            }
        }
        if self.block_size % self.move_unit != 0 {
            return Err(ShapeError::UnitMismatch {
                block_size: self.block_size,
                move_unit: self.move_unit,
            });
        }
        if self.max_speed < self.move_unit {
            return Err(ShapeError::SpeedBelowUnit {
                max_speed: self.max_speed,
                move_unit: self.move_unit,
            });
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            block_size: BLOCK_SIZE,
            move_unit: MOVE_UNIT,
            max_speed: MAX_SPEED,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn block_size_must_be_multiple_of_unit() {
        assert_eq!(
            Config::new(40, 3, 20),
            Err(ShapeError::UnitMismatch {
                block_size: 40,
                move_unit: 3
            })
        );
    }

    #[test]
    fn zero_speed_is_rejected() {
        assert!(matches!(
            Config::new(40, 4, 0),
            Err(ShapeError::NonPositive { name: "max speed", .. })
        ));
    }

    #[test]
    fn speed_below_unit_is_rejected() {
        assert_eq!(
            Config::new(40, 8, 4),
            Err(ShapeError::SpeedBelowUnit {
                max_speed: 4,
                move_unit: 8
            })
        );
        assert!(Config::new(40, 8, 8).is_ok());
    }
}
