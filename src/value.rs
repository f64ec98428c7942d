use crate::err::DecodeResult;
use crate::string_pool::StringPool;
use crate::utils::ByteCursor;

use serde::Serialize;
use std::fmt;

/// Size in bytes of a serialized `Res_value`.
pub const TYPED_VALUE_SIZE: usize = 8;

/// The `dataType` byte of a `Res_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DataType {
    Null,
    Reference,
    Attribute,
    String,
    Float,
    Dimension,
    Fraction,
    DynamicReference,
    DynamicAttribute,
    IntDec,
    IntHex,
    IntBoolean,
    IntColorArgb8,
    IntColorRgb8,
    IntColorArgb4,
    IntColorRgb4,
    Unknown(u8),
}

impl From<u8> for DataType {
    fn from(value: u8) -> Self {
        match value {
            0x00 => DataType::Null,
            0x01 => DataType::Reference,
            0x02 => DataType::Attribute,
            0x03 => DataType::String,
            0x04 => DataType::Float,
            0x05 => DataType::Dimension,
            0x06 => DataType::Fraction,
            0x07 => DataType::DynamicReference,
            0x08 => DataType::DynamicAttribute,
            0x10 => DataType::IntDec,
            0x11 => DataType::IntHex,
            0x12 => DataType::IntBoolean,
            0x1c => DataType::IntColorArgb8,
            0x1d => DataType::IntColorRgb8,
            0x1e => DataType::IntColorArgb4,
            0x1f => DataType::IntColorRgb4,
            other => DataType::Unknown(other),
        }
    }
}

impl DataType {
    pub fn as_u8(self) -> u8 {
        match self {
            DataType::Null => 0x00,
            DataType::Reference => 0x01,
            DataType::Attribute => 0x02,
            DataType::String => 0x03,
            DataType::Float => 0x04,
            DataType::Dimension => 0x05,
            DataType::Fraction => 0x06,
            DataType::DynamicReference => 0x07,
            DataType::DynamicAttribute => 0x08,
            DataType::IntDec => 0x10,
            DataType::IntHex => 0x11,
            DataType::IntBoolean => 0x12,
            DataType::IntColorArgb8 => 0x1c,
            DataType::IntColorRgb8 => 0x1d,
            DataType::IntColorArgb4 => 0x1e,
            DataType::IntColorRgb4 => 0x1f,
            DataType::Unknown(raw) => raw,
        }
    }
}

/// A raw `Res_value` as stored in attributes and CDATA nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct TypedValue {
    pub size: u16,
    pub res0: u8,
    pub data_type: DataType,
    pub data: u32,
}

impl TypedValue {
    pub(crate) fn read(cursor: &mut ByteCursor<'_>) -> DecodeResult<Self> {
        let size = cursor.u16_named("typed value size")?;
        let res0 = cursor.u8_named("typed value res0")?;
        let data_type = DataType::from(cursor.u8_named("typed value type")?);
        let data = cursor.u32_named("typed value data")?;
        Ok(TypedValue {
            size,
            res0,
            data_type,
            data,
        })
    }

    /// Interpret the value, using `raw` (the attribute's raw string) for string values.
    pub fn resolve(&self, raw: Option<&str>, pool: &StringPool) -> ResourceValue {
        let data = self.data;
        match self.data_type {
            DataType::String => match raw.or_else(|| pool.get(data)) {
                Some(text) => ResourceValue::String(text.to_owned()),
                None => ResourceValue::Null,
            },
            DataType::Null => match raw {
                Some(text) => ResourceValue::String(text.to_owned()),
                // `data == 1` is `DATA_NULL_EMPTY`: an explicitly empty value.
                None if data == 1 => ResourceValue::String(String::new()),
                None => ResourceValue::Null,
            },
            DataType::Reference => ResourceValue::Reference(data),
            DataType::Attribute => ResourceValue::Attribute(data),
            DataType::DynamicReference => ResourceValue::DynamicReference(data),
            DataType::DynamicAttribute => ResourceValue::DynamicAttribute(data),
            DataType::Float => ResourceValue::Float(f32::from_bits(data)),
            DataType::Dimension => ResourceValue::Dimension {
                value: complex_to_float(data),
                unit: DimensionUnit::from(data & COMPLEX_UNIT_MASK),
            },
            DataType::Fraction => ResourceValue::Fraction {
                value: complex_to_float(data),
                unit: FractionUnit::from(data & COMPLEX_UNIT_MASK),
            },
            DataType::IntDec => ResourceValue::Integer(data as i32),
            DataType::IntHex => ResourceValue::Hex(data),
            DataType::IntBoolean => ResourceValue::Boolean(data != 0),
            DataType::IntColorArgb8
            | DataType::IntColorRgb8
            | DataType::IntColorArgb4
            | DataType::IntColorRgb4 => ResourceValue::Color(data),
            DataType::Unknown(data_type) => ResourceValue::Unknown { data_type, data },
        }
    }
}

const COMPLEX_UNIT_MASK: u32 = 0xf;
const COMPLEX_RADIX_SHIFT: u32 = 4;
const COMPLEX_RADIX_MASK: u32 = 0x3;
const COMPLEX_MANTISSA_MASK: u32 = 0xff_ff_ff_00;
const RADIX_MULTS: [f32; 4] = [
    1.0 / (1 << 8) as f32,
    1.0 / (1 << 15) as f32,
    1.0 / (1 << 23) as f32,
    1.0 / (1_u64 << 31) as f32,
];

/// Decode the fixed point "complex" encoding used by dimensions and fractions.
fn complex_to_float(data: u32) -> f32 {
    let mantissa = (data & COMPLEX_MANTISSA_MASK) as i32;
    let radix = ((data >> COMPLEX_RADIX_SHIFT) & COMPLEX_RADIX_MASK) as usize;
    mantissa as f32 * RADIX_MULTS[radix]
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DimensionUnit {
    Px,
    Dip,
    Sp,
    Pt,
    In,
    Mm,
    Unknown(u32),
}

impl From<u32> for DimensionUnit {
    fn from(value: u32) -> Self {
        match value {
            0 => DimensionUnit::Px,
            1 => DimensionUnit::Dip,
            2 => DimensionUnit::Sp,
            3 => DimensionUnit::Pt,
            4 => DimensionUnit::In,
            5 => DimensionUnit::Mm,
            other => DimensionUnit::Unknown(other),
        }
    }
}

impl fmt::Display for DimensionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DimensionUnit::Px => f.write_str("px"),
            DimensionUnit::Dip => f.write_str("dp"),
            DimensionUnit::Sp => f.write_str("sp"),
            DimensionUnit::Pt => f.write_str("pt"),
            DimensionUnit::In => f.write_str("in"),
            DimensionUnit::Mm => f.write_str("mm"),
            DimensionUnit::Unknown(unit) => write!(f, "(unit {unit})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FractionUnit {
    /// Fraction of the element's own size.
    Fraction,
    /// Fraction of the parent's size.
    FractionParent,
    Unknown(u32),
}

impl From<u32> for FractionUnit {
    fn from(value: u32) -> Self {
        match value {
            0 => FractionUnit::Fraction,
            1 => FractionUnit::FractionParent,
            other => FractionUnit::Unknown(other),
        }
    }
}

impl fmt::Display for FractionUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FractionUnit::Fraction => f.write_str("%"),
            FractionUnit::FractionParent => f.write_str("%p"),
            FractionUnit::Unknown(unit) => write!(f, "(unit {unit})"),
        }
    }
}

/// A typed attribute or CDATA value, interpreted according to its `DataType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ResourceValue {
    Null,
    String(String),
    Reference(u32),
    Attribute(u32),
    DynamicReference(u32),
    DynamicAttribute(u32),
    Float(f32),
    Dimension { value: f32, unit: DimensionUnit },
    Fraction { value: f32, unit: FractionUnit },
    Integer(i32),
    Hex(u32),
    Boolean(bool),
    /// `0xAARRGGBB`.
    Color(u32),
    Unknown { data_type: u8, data: u32 },
}

impl ResourceValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResourceValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_reference_id(&self) -> Option<u32> {
        match self {
            ResourceValue::Reference(id) | ResourceValue::DynamicReference(id) => Some(*id),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResourceValue::Boolean(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ResourceValue::Integer(value) => Some(i64::from(*value)),
            ResourceValue::Hex(value) => Some(i64::from(*value)),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceValue::Null => Ok(()),
            ResourceValue::String(text) => f.write_str(text),
            ResourceValue::Reference(id) | ResourceValue::DynamicReference(id) => {
                write!(f, "@0x{id:08x}")
            }
            ResourceValue::Attribute(id) | ResourceValue::DynamicAttribute(id) => {
                write!(f, "?0x{id:08x}")
            }
            ResourceValue::Float(value) => write!(f, "{value}"),
            ResourceValue::Dimension { value, unit } => write!(f, "{value}{unit}"),
            ResourceValue::Fraction { value, unit } => write!(f, "{}{unit}", value * 100.0),
            ResourceValue::Integer(value) => write!(f, "{value}"),
            ResourceValue::Hex(value) => write!(f, "0x{value:x}"),
            ResourceValue::Boolean(flag) => write!(f, "{flag}"),
            ResourceValue::Color(argb) => write!(f, "#{argb:08x}"),
            ResourceValue::Unknown { data_type, data } => {
                write!(f, "(type 0x{data_type:02x}) 0x{data:08x}")
            }
        }
    }
}
