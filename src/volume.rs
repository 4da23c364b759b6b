use crate::types::NativeVolume;

/// Offset between decibels and the TCP device scale
const DEVICE_SCALE_DB_OFFSET: i32 = 90;

/// Highest value on the TCP device scale
pub const DEVICE_SCALE_MAX: NativeVolume = 200;

/// Convert decibels to the TCP device scale
///
/// Saturates at the `i32` limits.
pub fn db_to_device_scale(db: i32) -> NativeVolume {
    db.saturating_add(DEVICE_SCALE_DB_OFFSET).saturating_mul(2)
}

/// Volume bounds in native units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeRange {
    pub min: NativeVolume,
    pub max: NativeVolume,
}

impl VolumeRange {
    pub fn new(min: NativeVolume, max: NativeVolume) -> Self {
        Self { min, max }
    }

    /// Range for a decibel receiver; native units are dB
    pub fn decibels(min_db: i32, max_db: i32) -> Self {
        Self::new(min_db, max_db)
    }

    /// Range on the TCP device scale, derived from dB bounds
    pub fn device_scale(min_db: i32, max_db: i32) -> Self {
        Self::new(db_to_device_scale(min_db), db_to_device_scale(max_db))
    }

    fn span(&self) -> f64 {
        f64::from(self.max) - f64::from(self.min)
    }
}

/// Maps between native units and `[0.0, 1.0]`
///
/// Line receivers work in decibels. TCP receivers use an integer scale 0-200
/// where `native = (dB + 90) * 2`. Both mappings are linear over the
/// configured range; only the TCP one clamps.
pub trait VolumeConverter {
    /// The native range this converter maps onto
    fn range(&self) -> VolumeRange;

    /// Native value to normalized volume
    fn normalize(&self, native: f64) -> f64;

    /// Normalized volume to the nearest native unit
    ///
    /// Callers clamp `fraction` themselves if they need an in-range result.
    fn denormalize(&self, fraction: f64) -> NativeVolume;
}

/// Converter for decibel receivers
///
/// Does not clamp: a reading outside the configured range maps outside
/// `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecibelConverter {
    range: VolumeRange,
}

impl DecibelConverter {
    pub fn new(range: VolumeRange) -> Self {
        Self { range }
    }
}

impl VolumeConverter for DecibelConverter {
    fn range(&self) -> VolumeRange {
        self.range
    }

    fn normalize(&self, native: f64) -> f64 {
        (f64::from(self.range.min) - native).abs() / self.range.span().abs()
    }

    fn denormalize(&self, fraction: f64) -> NativeVolume {
        (f64::from(self.range.min) + (self.range.span().abs() * fraction).round_ties_even())
            as NativeVolume
    }
}

/// Converter for the TCP 0-200 device scale, clamped to the configured range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceScaleConverter {
    range: VolumeRange,
}

impl DeviceScaleConverter {
    pub fn new(range: VolumeRange) -> Self {
        Self { range }
    }
}

impl VolumeConverter for DeviceScaleConverter {
    fn range(&self) -> VolumeRange {
        self.range
    }

    fn normalize(&self, native: f64) -> f64 {
        if native < f64::from(self.range.min) {
            0.0
        } else if native > f64::from(self.range.max) {
            1.0
        } else {
            (native - f64::from(self.range.min)) / self.range.span()
        }
    }

    fn denormalize(&self, fraction: f64) -> NativeVolume {
        (fraction * self.range.span() + f64::from(self.range.min)).round_ties_even() as NativeVolume
    }
}
