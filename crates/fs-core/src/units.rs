// fs-core/src/units.rs

use uom::si::f64::{
    Pressure as UomPressure, ThermodynamicTemperature as UomThermodynamicTemperature,
};

// Public canonical unit types (SI, f64)
pub type Pressure = UomPressure;
pub type Temperature = UomThermodynamicTemperature;

#[inline]
pub fn pa(v: f64) -> Pressure {
    use uom::si::pressure::pascal;
    Pressure::new::<pascal>(v)
}

#[inline]
pub fn atm(v: f64) -> Pressure {
    pa(v * constants::ONE_ATM_PA)
}

#[inline]
pub fn k(v: f64) -> Temperature {
    use uom::si::thermodynamic_temperature::kelvin;
    Temperature::new::<kelvin>(v)
}

pub mod constants {
    /// Standard atmosphere [Pa].
    pub const ONE_ATM_PA: f64 = 101_325.0;

    /// Universal gas constant [J/(kmol·K)].
    pub const GAS_CONSTANT: f64 = 8_314.462_618;
}
