//! Geographic coordinates to grid map coordinates
//!
//! A grid's CRS is either an `EPSG:<code>` identifier or a proj string
//! starting with `+`. Recognized EPSG codes are WGS84 (4326), Web Mercator
//! (3857) and the WGS84 UTM zones (32601-32660 north, 32701-32760 south).

use glacierviz_core::{Error, Result};
use proj4rs::proj::Proj;
use proj4rs::transform::transform;

const WGS84_LONGLAT: &str = "+proj=longlat +ellps=WGS84 +datum=WGS84 +no_defs";
const WEB_MERCATOR: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

/// Proj definition for a CRS identifier
pub fn proj_definition(crs: &str) -> Result<String> {
    let crs = crs.trim();
    if crs.starts_with('+') {
        return Ok(crs.to_string());
    }

    let code = crs
        .get(..5)
        .filter(|prefix| prefix.eq_ignore_ascii_case("EPSG:"))
        .and_then(|_| crs[5..].trim().parse::<u32>().ok())
        .ok_or_else(|| Error::InvalidData(format!("Unrecognized CRS '{}'", crs)))?;

    match code {
        4326 => Ok(WGS84_LONGLAT.to_string()),
        3857 => Ok(WEB_MERCATOR.to_string()),
        32601..=32660 => Ok(format!("+proj=utm +zone={} +datum=WGS84 +units=m +no_defs", code - 32600)),
        32701..=32760 => Ok(format!(
            "+proj=utm +zone={} +south +datum=WGS84 +units=m +no_defs",
            code - 32700
        )),
        _ => Err(Error::InvalidData(format!("Unsupported EPSG code {}", code))),
    }
}

/// Convert WGS84 latitude/longitude in degrees into `crs` map coordinates
pub fn lat_lon_to_map(crs: &str, lat: f64, lon: f64) -> Result<(f64, f64)> {
    if !(lat.is_finite() && (-90.0..=90.0).contains(&lat)) || !(lon.is_finite() && (-180.0..=180.0).contains(&lon)) {
        return Err(Error::InvalidData(format!(
            "Geographic position ({}, {}) is out of range",
            lat, lon
        )));
    }

    let definition = proj_definition(crs)?;
    if definition.contains("+proj=longlat") || definition.contains("+proj=latlong") {
        return Ok((lon, lat));
    }

    let parse = |text: &str| {
        Proj::from_proj_string(text)
            .map_err(|e| Error::InvalidData(format!("Invalid CRS '{}': {}", text, e)))
    };
    let src = parse(WGS84_LONGLAT)?;
    let dst = parse(&definition)?;

    let mut point = (lon.to_radians(), lat.to_radians(), 0.0);
    transform(&src, &dst, &mut point)
        .map_err(|e| Error::InvalidData(format!("Cannot project ({}, {}) into {}: {}", lat, lon, crs, e)))?;

    tracing::trace!("Projected ({}, {}) to ({}, {}) in {}", lat, lon, point.0, point.1, crs);
    Ok((point.0, point.1))
}
