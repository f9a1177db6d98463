//! Data Processor Module
//! Coerces the raw CSV frame into typed earthquake records.

use polars::prelude::*;

use super::{parse_full_date, EarthquakeRecord, LoaderError};

/// Columns every input file must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    "Year",
    "EarthquakeName",
    "Fatalities",
    "MaxMagnitude",
    "Location",
    "Date",
    "Depth_km",
    "FlagCode",
];

/// Handles type coercion and derived fields.
pub struct DataProcessor;

impl DataProcessor {
    /// Fail on the first required column the frame does not have.
    pub fn check_schema(df: &DataFrame) -> Result<(), LoaderError> {
        match REQUIRED_COLUMNS
            .iter()
            .find(|name| df.column(name).is_err())
        {
            Some(name) => Err(LoaderError::MissingColumn(name.to_string())),
            None => Ok(()),
        }
    }

    /// Convert every row of `df` into an [`EarthquakeRecord`], in file order.
    pub fn to_records(df: &DataFrame) -> Result<Vec<EarthquakeRecord>, LoaderError> {
        Self::check_schema(df)?;

        let years = Self::integer_column(df, "Year")?;
        let names = Self::text_column(df, "EarthquakeName")?;
        let fatalities = Self::integer_column(df, "Fatalities")?;
        let magnitudes = Self::float_column(df, "MaxMagnitude")?;
        let locations = Self::text_column(df, "Location")?;
        let dates = Self::text_column(df, "Date")?;
        let depths = Self::float_column(df, "Depth_km")?;
        let flag_codes = Self::text_column(df, "FlagCode")?;

        (0..df.height())
            .map(|row| {
                let year = i32::try_from(years[row]).map_err(|_| LoaderError::InvalidValue {
                    column: "Year",
                    row,
                    reason: format!("{} is out of range", years[row]),
                })?;
                let fatality_count =
                    u64::try_from(fatalities[row]).map_err(|_| LoaderError::InvalidValue {
                        column: "Fatalities",
                        row,
                        reason: format!("{} is negative", fatalities[row]),
                    })?;
                if depths[row] < 0.0 {
                    return Err(LoaderError::InvalidValue {
                        column: "Depth_km",
                        row,
                        reason: format!("{} is negative", depths[row]),
                    });
                }

                Ok(EarthquakeRecord {
                    year,
                    earthquake_name: names[row].clone(),
                    fatalities: fatality_count,
                    max_magnitude: magnitudes[row],
                    location: locations[row].clone(),
                    date: dates[row].clone(),
                    depth_km: depths[row],
                    flag_code: flag_codes[row].clone(),
                    full_date: parse_full_date(&dates[row], year)?,
                })
            })
            .collect()
    }

    fn integer_column(df: &DataFrame, name: &'static str) -> Result<Vec<i64>, LoaderError> {
        let (raw, cast) = Self::cast_column(df, name, &DataType::Int64)?;
        cast.i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| v.ok_or_else(|| Self::invalid(&raw, name, row)))
            .collect()
    }

    fn float_column(df: &DataFrame, name: &'static str) -> Result<Vec<f64>, LoaderError> {
        let (raw, cast) = Self::cast_column(df, name, &DataType::Float64)?;
        cast.f64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.filter(|v| !v.is_nan())
                    .ok_or_else(|| Self::invalid(&raw, name, row))
            })
            .collect()
    }

    /// Null text becomes the empty string.
    fn text_column(df: &DataFrame, name: &'static str) -> Result<Vec<String>, LoaderError> {
        let (_, cast) = Self::cast_column(df, name, &DataType::String)?;
        Ok(cast
            .str()?
            .into_iter()
            .map(|v| v.unwrap_or_default().trim().to_string())
            .collect())
    }

    /// Non-strict cast: unparseable values come back as nulls, reported per row.
    fn cast_column(
        df: &DataFrame,
        name: &'static str,
        dtype: &DataType,
    ) -> Result<(Series, Series), LoaderError> {
        let raw = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?
            .as_materialized_series()
            .clone();
        let cast = raw.cast(dtype)?;
        Ok((raw, cast))
    }

    fn invalid(raw: &Series, column: &'static str, row: usize) -> LoaderError {
        let reason = match raw.get(row) {
            Ok(AnyValue::Null) | Err(_) => "missing value".to_string(),
            Ok(value) => format!("cannot read {value} as a number"),
        };
        LoaderError::InvalidValue {
            column,
            row,
            reason,
        }
    }
}
