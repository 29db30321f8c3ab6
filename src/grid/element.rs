//! Numeric element kinds a grid variable may be stored as.

use netcdf::types::{FloatType, IntType, NcVariableType};
use std::fmt;

/// Storage type of the cells of a grid variable.
#[derive(Clone, Copy, PartialEq, Eq, Debug, EnumString, AsStaticStr, EnumIter, Hash)]
pub enum ElementKind {
    /// Signed 8 bit integer, numpy `i1`.
    #[strum(to_string = "byte", serialize = "i1", serialize = "BYTE")]
    Byte,
    /// Unsigned 8 bit integer.
    #[strum(to_string = "ubyte", serialize = "u1", serialize = "UBYTE")]
    UByte,
    /// Signed 16 bit integer, `i2` in the WRF-Hydro routing grids.
    #[strum(to_string = "short", serialize = "i2", serialize = "SHORT")]
    Short,
    /// Unsigned 16 bit integer.
    #[strum(to_string = "ushort", serialize = "u2", serialize = "USHORT")]
    UShort,
    /// Signed 32 bit integer.
    #[strum(to_string = "int", serialize = "i4", serialize = "INT")]
    Int,
    /// Unsigned 32 bit integer.
    #[strum(to_string = "uint", serialize = "u4", serialize = "UINT")]
    UInt,
    /// Signed 64 bit integer.
    #[strum(to_string = "int64", serialize = "i8", serialize = "INT64")]
    Int64,
    /// Unsigned 64 bit integer.
    #[strum(to_string = "uint64", serialize = "u8", serialize = "UINT64")]
    UInt64,
    /// 32 bit float, `f4`.
    #[strum(to_string = "float", serialize = "f4", serialize = "FLOAT")]
    Float,
    /// 64 bit float, `f8`.
    #[strum(to_string = "double", serialize = "f8", serialize = "DOUBLE")]
    Double,
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ElementKind::*;

        match *self {
            Byte => write!(f, "byte"),
            UByte => write!(f, "ubyte"),
            Short => write!(f, "short"),
            UShort => write!(f, "ushort"),
            Int => write!(f, "int"),
            UInt => write!(f, "uint"),
            Int64 => write!(f, "int64"),
            UInt64 => write!(f, "uint64"),
            Float => write!(f, "float"),
            Double => write!(f, "double"),
        }
    }
}

impl ElementKind {
    /// Map a NetCDF variable type onto a kind, `None` for anything that is not a plain number.
    pub fn from_nc_type(vartype: &NcVariableType) -> Option<Self> {
        use ElementKind::*;

        match vartype {
            NcVariableType::Int(IntType::I8) => Some(Byte),
            NcVariableType::Int(IntType::U8) => Some(UByte),
            NcVariableType::Int(IntType::I16) => Some(Short),
            NcVariableType::Int(IntType::U16) => Some(UShort),
            NcVariableType::Int(IntType::I32) => Some(Int),
            NcVariableType::Int(IntType::U32) => Some(UInt),
            NcVariableType::Int(IntType::I64) => Some(Int64),
            NcVariableType::Int(IntType::U64) => Some(UInt64),
            NcVariableType::Float(FloatType::F32) => Some(Float),
            NcVariableType::Float(FloatType::F64) => Some(Double),
            _ => None,
        }
    }

    /// True for the integer kinds.
    pub fn is_integral(self) -> bool {
        !matches!(self, ElementKind::Float | ElementKind::Double)
    }

    // Lower bound (inclusive) and upper bound (exclusive) of the integer kinds.
    fn integer_range(self) -> (f64, f64) {
        use ElementKind::*;

        match self {
            Byte => (-128.0, 128.0),
            UByte => (0.0, 256.0),
            Short => (-32_768.0, 32_768.0),
            UShort => (0.0, 65_536.0),
            Int => (-2_147_483_648.0, 2_147_483_648.0),
            UInt => (0.0, 4_294_967_296.0),
            Int64 => (-9_223_372_036_854_775_808.0, 9_223_372_036_854_775_808.0),
            UInt64 => (0.0, 18_446_744_073_709_551_616.0),
            Float | Double => (std::f64::NEG_INFINITY, std::f64::INFINITY),
        }
    }

    /// Convert a value into what this kind would store for it.
    ///
    /// Integer kinds truncate toward zero, `Float` rounds to the nearest `f32`. Returns `None`
    /// when the value cannot be represented at all.
    pub fn coerce(self, value: f64) -> Option<f64> {
        match self {
            ElementKind::Double => Some(value),
            ElementKind::Float => {
                let narrowed = value as f32;
                if value.is_finite() && narrowed.is_infinite() {
                    None
                } else {
                    Some(f64::from(narrowed))
                }
            }
            _ => {
                if !value.is_finite() {
                    return None;
                }

                let truncated = value.trunc();
                let (low, high) = self.integer_range();
                if truncated >= low && truncated < high {
                    Some(truncated)
                } else {
                    None
                }
            }
        }
    }
}

/// An integer as a float, `None` unless the float holds exactly the same number.
pub(crate) fn exact_f64(value: i128) -> Option<f64> {
    let converted = value as f64;
    if converted as i128 == value {
        Some(converted)
    } else {
        None
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
