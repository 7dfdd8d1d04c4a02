//! Row decoding into [`CellValue`]s.
//!
//! # Architecture
//!
//! Each backend classifies a column by type name and decodes it with the
//! matching Rust type. Anything without a JSON counterpart (timestamps,
//! numerics, uuids, json, ...) is rendered as text through [`RawText`].
//!
//! Raw queries run as unnamed prepared statements, so PostgreSQL returns
//! columns in binary format. `RawText` knows the binary layout of the common
//! fallback types and still accepts text-format values.

use crate::error::DbResult;
use crate::models::{CellValue, Row};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use sqlx::postgres::{PgRow, PgTypeInfo, PgValueFormat, PgValueRef};
use sqlx::sqlite::SqliteRow;
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Json, Uuid};
use sqlx::{Column, Decode, Postgres, Row as _, Type, TypeInfo, ValueRef};

/// Rendering of `timestamptz` values: `2024-01-01 12:00:00+00:00`.
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%:z";

/// Text rendering of a PostgreSQL value of any type.
///
/// Binary values of unknown types fall back to their bytes as UTF-8, or
/// base64 when they are not valid UTF-8.
#[derive(Debug)]
pub struct RawText(pub String);

impl Type<Postgres> for RawText {
    fn type_info() -> PgTypeInfo {
        <String as Type<Postgres>>::type_info()
    }

    fn compatible(_ty: &PgTypeInfo) -> bool {
        true
    }
}

impl<'r> Decode<'r, Postgres> for RawText {
    fn decode(value: PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        if value.format() == PgValueFormat::Text {
            return Ok(RawText(value.as_str()?.to_string()));
        }

        let type_name = value.type_info().name().to_string();
        let text = match type_name.as_str() {
            "NUMERIC" => decode_numeric(value.as_bytes()?)?,
            "TIMESTAMP" => <NaiveDateTime as Decode<Postgres>>::decode(value)?.to_string(),
            "TIMESTAMPTZ" => <DateTime<Utc> as Decode<Postgres>>::decode(value)?
                .format(TIMESTAMPTZ_FORMAT)
                .to_string(),
            "DATE" => <NaiveDate as Decode<Postgres>>::decode(value)?.to_string(),
            "TIME" => <NaiveTime as Decode<Postgres>>::decode(value)?.to_string(),
            "JSON" | "JSONB" => {
                <Json<serde_json::Value> as Decode<Postgres>>::decode(value)?
                    .0
                    .to_string()
            }
            "UUID" => <Uuid as Decode<Postgres>>::decode(value)?.to_string(),
            _ => {
                let bytes = value.as_bytes()?;
                match std::str::from_utf8(bytes) {
                    Ok(s) => s.to_string(),
                    Err(_) => STANDARD.encode(bytes),
                }
            }
        };
        Ok(RawText(text))
    }
}

const NUMERIC_POS: u16 = 0x0000;
const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// Render a binary `numeric` the way PostgreSQL prints it, keeping the
/// display scale (`12.50` stays `12.50`).
///
/// Layout: `ndigits`, `weight`, `sign`, `dscale` (16 bits each), then
/// `ndigits` base-10000 digits. Digit `i` is worth `10000^(weight - i)`.
fn decode_numeric(buf: &[u8]) -> Result<String, sqlx::error::BoxDynError> {
    let word = |i: usize| -> Result<u16, sqlx::error::BoxDynError> {
        buf.get(i * 2..i * 2 + 2)
            .map(|b| u16::from_be_bytes([b[0], b[1]]))
            .ok_or_else(|| "truncated numeric value".into())
    };

    let ndigits = usize::from(word(0)?);
    let weight = i64::from(word(1)? as i16);
    let sign = word(2)?;
    let dscale = usize::from(word(3)?);
    let digits = (0..ndigits)
        .map(|i| word(4 + i))
        .collect::<Result<Vec<u16>, _>>()?;

    let negative = match sign {
        NUMERIC_POS => false,
        NUMERIC_NEG => true,
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        other => return Err(format!("invalid numeric sign 0x{other:04x}").into()),
    };
    let digit_at = |i: i64| -> u16 {
        usize::try_from(i)
            .ok()
            .and_then(|i| digits.get(i).copied())
            .unwrap_or(0)
    };

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if weight < 0 {
        out.push('0');
    } else {
        out.push_str(&digit_at(0).to_string());
        for i in 1..=weight {
            out.push_str(&format!("{:04}", digit_at(i)));
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut i = weight + 1;
        while frac.len() < dscale {
            frac.push_str(&format!("{:04}", digit_at(i)));
            i += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }
    Ok(out)
}

/// Encode binary data as base64 text.
pub fn encode_binary_value(bytes: &[u8]) -> CellValue {
    CellValue::Raw(STANDARD.encode(bytes))
}

/// Trait for converting database rows to ordered [`Row`]s.
pub trait RowToCells {
    fn to_row(&self) -> DbResult<Row>;
}

impl RowToCells for PgRow {
    fn to_row(&self) -> DbResult<Row> {
        self.columns()
            .iter()
            .map(|col| -> DbResult<(String, CellValue)> {
                let value = postgres::decode_column(self, col.ordinal(), col.type_info().name())?;
                Ok((col.name().to_string(), value))
            })
            .collect()
    }
}

impl RowToCells for SqliteRow {
    fn to_row(&self) -> DbResult<Row> {
        self.columns()
            .iter()
            .map(|col| -> DbResult<(String, CellValue)> {
                let value = sqlite::decode_column(self, col.ordinal(), col.type_info().name())?;
                Ok((col.name().to_string(), value))
            })
            .collect()
    }
}

mod postgres {
    use super::*;
    use sqlx::Row as _;

    pub fn decode_column(row: &PgRow, idx: usize, type_name: &str) -> DbResult<CellValue> {
        if row.try_get_raw(idx)?.is_null() {
            return Ok(CellValue::Null);
        }

        let value = match type_name {
            "INT2" => CellValue::Integer(row.try_get::<i16, _>(idx)?.into()),
            "INT4" => CellValue::Integer(row.try_get::<i32, _>(idx)?.into()),
            "INT8" => CellValue::Integer(row.try_get::<i64, _>(idx)?),
            "FLOAT4" => CellValue::Float(row.try_get::<f32, _>(idx)?.into()),
            "FLOAT8" => CellValue::Float(row.try_get::<f64, _>(idx)?),
            "BOOL" => CellValue::Boolean(row.try_get::<bool, _>(idx)?),
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => {
                CellValue::Text(row.try_get::<String, _>(idx)?)
            }
            "BYTEA" => encode_binary_value(&row.try_get::<Vec<u8>, _>(idx)?),
            _ => CellValue::Raw(row.try_get::<RawText, _>(idx)?.0),
        };
        Ok(value)
    }
}

mod sqlite {
    use super::*;
    use sqlx::Row as _;

    /// SQLite is dynamically typed: the storage class of the value decides,
    /// the declared column type only distinguishes booleans.
    pub fn decode_column(row: &SqliteRow, idx: usize, declared: &str) -> DbResult<CellValue> {
        let storage = {
            let raw = row.try_get_raw(idx)?;
            if raw.is_null() {
                return Ok(CellValue::Null);
            }
            raw.type_info().name().to_string()
        };

        let value = match storage.as_str() {
            "INTEGER" if declared.eq_ignore_ascii_case("BOOLEAN") => {
                CellValue::Boolean(row.try_get_unchecked::<bool, _>(idx)?)
            }
            "INTEGER" => CellValue::Integer(row.try_get_unchecked::<i64, _>(idx)?),
            "REAL" => CellValue::Float(row.try_get_unchecked::<f64, _>(idx)?),
            "BLOB" => encode_binary_value(&row.try_get_unchecked::<Vec<u8>, _>(idx)?),
            _ => CellValue::Text(row.try_get_unchecked::<String, _>(idx)?),
        };
        Ok(value)
    }
}
