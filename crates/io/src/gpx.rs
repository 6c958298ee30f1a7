//! GPX 1.1 serialization of a [`TrackDocument`].

use model::{TrackDocument, TrackPoint, Waypoint};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

use crate::ExportError;

const NS_GPX: &str = "http://www.topografix.com/GPX/1/1";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";
const SCHEMA_LOCATION: &str =
    "http://www.topografix.com/GPX/1/1 http://www.topografix.com/GPX/1/1/gpx.xsd";
const CREATOR: &str = "rideology2gpx";

/// Renders the document as an indented GPX 1.1 string.
///
/// Elements follow the schema order: metadata, waypoints, then the track.
pub fn to_gpx_string(doc: &TrackDocument) -> Result<String, ExportError> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("xmlns", NS_GPX));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("xmlns:xsi", NS_XSI));
    root.push_attribute(("xsi:schemaLocation", SCHEMA_LOCATION));
    writer.write_event(Event::Start(root))?;

    writer.write_event(Event::Start(BytesStart::new("metadata")))?;
    write_element(&mut writer, "name", &doc.name)?;
    write_element(&mut writer, "desc", &doc.desc)?;
    writer.write_event(Event::End(BytesEnd::new("metadata")))?;

    for wpt in &doc.waypoints {
        write_waypoint(&mut writer, wpt)?;
    }

    writer.write_event(Event::Start(BytesStart::new("trk")))?;
    write_element(&mut writer, "name", &doc.name)?;
    write_element(&mut writer, "desc", &doc.desc)?;
    writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
    for pt in &doc.points {
        write_track_point(&mut writer, doc, pt)?;
    }
    writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
    writer.write_event(Event::End(BytesEnd::new("trk")))?;

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    let mut out = String::from_utf8(writer.into_inner().into_inner())?;
    out.push('\n');
    Ok(out)
}

fn point_start(tag: &str, latitude: f64, longitude: f64) -> BytesStart<'_> {
    let mut start = BytesStart::new(tag);
    start.push_attribute(("lat", latitude.to_string().as_str()));
    start.push_attribute(("lon", longitude.to_string().as_str()));
    start
}

fn write_track_point<W: std::io::Write>(
    writer: &mut Writer<W>,
    doc: &TrackDocument,
    pt: &TrackPoint,
) -> Result<(), ExportError> {
    writer.write_event(Event::Start(point_start("trkpt", pt.latitude, pt.longitude)))?;
    if let Some(ele) = pt.elevation {
        write_element(writer, "ele", &ele.to_string())?;
    }
    if let Some(time) = pt.time {
        let at = time.resolve(doc.start_time).ok_or(ExportError::TimeOutOfRange(time))?;
        write_element(writer, "time", &format!("{}Z", at.format("%Y-%m-%dT%H:%M:%S%.f")))?;
    }
    writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
    Ok(())
}

fn write_waypoint<W: std::io::Write>(writer: &mut Writer<W>, wpt: &Waypoint) -> Result<(), ExportError> {
    writer.write_event(Event::Start(point_start("wpt", wpt.latitude, wpt.longitude)))?;
    write_element(writer, "name", &wpt.name)?;
    if let Some(desc) = &wpt.desc {
        write_element(writer, "desc", desc)?;
    }
    writer.write_event(Event::End(BytesEnd::new("wpt")))?;
    Ok(())
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), ExportError> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use model::TrackTime;
    use std::time::Duration;

    fn doc() -> TrackDocument {
        let start = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap().and_hms_opt(9, 30, 0).unwrap();
        let mut doc = TrackDocument::new("Ride <A & B>", start);
        doc.add_track_point(-34.6, -58.4, Some(TrackTime::Elapsed(Duration::from_millis(1500))));
        doc.add_track_point(-34.601, -58.4, None);
        doc.add_waypoint(-34.6, -58.4, "Start", None);
        doc.add_waypoint(-34.601, -58.4, "Max speed 90 km/h", Some("9000rpm @ 4 gear".into()));
        doc
    }

    #[test]
    fn test_gpx_shape() {
        let gpx = to_gpx_string(&doc()).unwrap();
        assert!(gpx.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(gpx.contains("version=\"1.1\""));
        assert!(gpx.contains("<name>Ride &lt;A &amp; B&gt;</name>"));
        assert!(gpx.contains("<trkpt lat=\"-34.6\" lon=\"-58.4\">"));
        assert!(gpx.contains("<time>2024-03-10T09:30:01.500Z</time>"));
        assert!(gpx.contains("<desc>9000rpm @ 4 gear</desc>"));
        assert_eq!(gpx.matches("<time>").count(), 1);
        assert_eq!(gpx.matches("<wpt ").count(), 2);
    }

    #[test]
    fn test_waypoints_precede_track() {
        let gpx = to_gpx_string(&doc()).unwrap();
        let wpt = gpx.find("<wpt ").unwrap();
        let trk = gpx.find("<trk>").unwrap();
        assert!(wpt < trk);
        assert!(gpx.find("</metadata>").unwrap() < wpt);
    }

    #[test]
    fn test_whole_second_has_no_fraction() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut doc = TrackDocument::new("x", start);
        doc.add_track_point(0.0, 0.0, Some(TrackTime::Elapsed(Duration::from_secs(61))));
        let gpx = to_gpx_string(&doc).unwrap();
        assert!(gpx.contains("<time>2024-01-01T00:01:01Z</time>"));
    }

    #[test]
    fn test_time_past_calendar_end_is_an_error() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let mut doc = TrackDocument::new("x", start);
        doc.add_track_point(0.0, 0.0, Some(TrackTime::Elapsed(Duration::from_secs(1))));
        let far = Duration::from_millis(9_000_000_000_000_000);
        doc.add_track_point(0.0, 0.0, Some(TrackTime::Elapsed(far)));
        match to_gpx_string(&doc) {
            Err(ExportError::TimeOutOfRange(time)) => assert_eq!(time, TrackTime::Elapsed(far)),
            other => panic!("expected TimeOutOfRange, got {other:?}"),
        }
    }
}
