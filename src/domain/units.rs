// Pressure units
//
// Measured shear-test data, fits and reports are in kilopascals. Formulas
// that divide by bulk density and gravity need pascals. `Kilopascals::to_pascals`
// is the only crossing between the two.
use serde::{Deserialize, Serialize};

pub const PASCALS_PER_KILOPASCAL: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kilopascals(pub f64);

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pascals(pub f64);

impl Kilopascals {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_pascals(self) -> Pascals {
        Pascals(self.0 * PASCALS_PER_KILOPASCAL)
    }
}

impl Pascals {
    pub fn value(self) -> f64 {
        self.0
    }

    pub fn to_kilopascals(self) -> Kilopascals {
        Kilopascals(self.0 / PASCALS_PER_KILOPASCAL)
    }
}
