#[cfg(test)]
#[path = "polyline_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;

use crate::domain::models::Coordinate;

/// Decodes the standard encoded-polyline format: 5-bit groups offset by 63,
/// zigzag-signed deltas at 1e5 precision, latitude first. Returns coordinates
/// in the crate's lon-first order.
pub fn decode(encoded: &str) -> Result<Vec<Coordinate>> {
    let bytes = encoded.as_bytes();
    let mut coordinates = vec![];
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, index)?;
        lat += delta_lat;
        let (delta_lon, next) = decode_value(bytes, next)?;
        lon += delta_lon;
        index = next;

        coordinates.push(Coordinate::new(lon as f64 / 1e5, lat as f64 / 1e5)?);
    }

    return Ok(coordinates);
}

fn decode_value(bytes: &[u8], mut index: usize) -> Result<(i64, usize)> {
    let mut shift = 0;
    let mut result: i64 = 0;

    loop {
        if index >= bytes.len() {
            bail!("polyline truncated mid-value");
        }

        let byte = bytes[index];
        if byte < 63 {
            bail!(format!("invalid polyline byte {byte}"));
        }

        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        index += 1;

        if chunk < 0x20 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    };

    return Ok((value, index));
}
