// File helpers shared by the commands.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::campaign::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or(path)
        .to_string()
}

pub fn read_text(path: &str) -> CampaignResult<String> {
    fs::read_to_string(path).context(OpeningFileSnafu {
        path: path.to_string(),
    })
}

pub fn read_json<T: DeserializeOwned>(path: &str) -> CampaignResult<T> {
    let contents = read_text(path)?;
    serde_json::from_str(&contents).context(ParsingJsonSnafu {
        what: path.to_string(),
    })
}

/// Writes `text` to a file, or to the standard output for `stdout`.
pub fn write_output(out: &str, text: &str) -> CampaignResult<()> {
    if out == "stdout" {
        println!("{}", text);
        return Ok(());
    }
    fs::write(out, text).context(OpeningFileSnafu {
        path: out.to_string(),
    })?;
    info!("wrote {} bytes to {}", text.len(), out);
    Ok(())
}

/// Reads a turf polygon given on the command line.
///
/// Either a path to a JSON file holding `[[lat, lng], ...]`, or the points inline as
/// `lat,lng;lat,lng;...`.
pub fn read_boundary(input: &str) -> CampaignResult<Vec<GeoPoint>> {
    if Path::new(input).is_file() {
        let pairs: Vec<[f64; 2]> = read_json(input)?;
        return Ok(pairs.iter().map(|p| GeoPoint::new(p[0], p[1])).collect());
    }
    let mut points: Vec<GeoPoint> = Vec::new();
    for (idx, pair) in input
        .split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .enumerate()
    {
        let coords: Vec<f64> = match pair
            .split(',')
            .map(|c| c.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
        {
            Ok(c) => c,
            Err(e) => whatever!("Point {} of the boundary ({:?}): {}", idx + 1, pair, e),
        };
        if coords.len() != 2 {
            whatever!(
                "Point {} of the boundary ({:?}) must be 'lat,lng'",
                idx + 1,
                pair
            );
        }
        points.push(GeoPoint::new(coords[0], coords[1]));
    }
    debug!("read_boundary: {} points", points.len());
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("/tmp/a/people.CSV"), "people.CSV");
        assert_eq!(simplify_file_name("people.csv"), "people.csv");
    }

    #[test]
    fn inline_boundary() {
        let pts = read_boundary("44.98,-93.27; 44.99,-93.27;44.99,-93.26;").unwrap();
        assert_eq!(pts.len(), 3);
        assert_eq!(pts[1], GeoPoint::new(44.99, -93.27));
        assert!(read_boundary("44.98,-93.27;44.99").is_err());
        assert!(read_boundary("a,b").is_err());
    }

    #[test]
    fn boundary_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "[[0.0, 0.0], [0.0, 10.0], [10.0, 10.0], [10.0, 0.0]]").unwrap();
        let pts = read_boundary(f.path().to_str().unwrap()).unwrap();
        assert_eq!(pts.len(), 4);
        assert_eq!(pts[3], GeoPoint::new(10.0, 0.0));
    }

    #[test]
    fn output_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("out.csv");
        let p = p.to_str().unwrap();
        write_output(p, "first_name\nAda").unwrap();
        assert_eq!(read_text(p).unwrap(), "first_name\nAda");
    }
}
