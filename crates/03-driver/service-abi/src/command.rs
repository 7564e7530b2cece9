//! Typed views over the string parameters of draw and clear events.

use std::str::FromStr;

use transport::{Event, EventKind};

use crate::buffer::Rgb;
use crate::Failure;

fn expect_kind(event: &Event, kind: EventKind) -> Result<(), Failure> {
    if event.kind() != kind {
        return Err(Failure::command(format!(
            "expected {kind:?} event, got {:?}",
            event.kind()
        )));
    }
    Ok(())
}

fn parse_param<T: FromStr>(event: &Event, index: usize, what: &str) -> Result<T, Failure> {
    let raw = &event.params()[index];
    raw.parse()
        .map_err(|_| Failure::command(format!("{what} `{raw}` is not a valid number")))
}

/// `CLEAR_RASTER` parameters: red, green and blue in `0..=255`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearRaster(pub Rgb);

impl ClearRaster {
    pub fn parse(event: &Event) -> Result<Self, Failure> {
        expect_kind(event, EventKind::ClearRaster)?;
        Ok(Self(Rgb {
            r: parse_param(event, 0, "red channel")?,
            g: parse_param(event, 1, "green channel")?,
            b: parse_param(event, 2, "blue channel")?,
        }))
    }

    pub fn to_event(self) -> Event {
        Event::clear_raster(self.0.r, self.0.g, self.0.b)
    }
}

/// `CLEAR_DEPTH` parameter: one signed 32-bit depth.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClearDepth(pub i32);

impl ClearDepth {
    pub fn parse(event: &Event) -> Result<Self, Failure> {
        expect_kind(event, EventKind::ClearDepth)?;
        Ok(Self(parse_param(event, 0, "depth")?))
    }

    pub fn to_event(self) -> Event {
        Event::clear_depth(self.0)
    }
}

/// One triangle plus its material parameters, as carried by `DRAW`.
///
/// Wire order: `x0 x1 x2 y0 y1 y2 z0 z1 z2 u0 u1 u2 v0 v1 v2 texture
/// normal_map specular emissive`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawCommand {
    pub xs: [i32; 3],
    pub ys: [i32; 3],
    pub zs: [i32; 3],
    pub us: [i32; 3],
    pub vs: [i32; 3],
    /// Texture name; sampling is not performed, the name is passed through.
    pub texture: String,
    pub normal_map: String,
    pub specular: i32,
    pub emissive: bool,
}

const AXES: [&str; 5] = ["x", "y", "z", "u", "v"];

impl DrawCommand {
    pub fn parse(event: &Event) -> Result<Self, Failure> {
        expect_kind(event, EventKind::Draw)?;
        let mut coords = [[0i32; 3]; 5];
        for (axis, values) in coords.iter_mut().enumerate() {
            for (vertex, value) in values.iter_mut().enumerate() {
                let what = format!("{}{vertex}", AXES[axis]);
                *value = parse_param(event, axis * 3 + vertex, &what)?;
            }
        }
        let [xs, ys, zs, us, vs] = coords;
        let params = event.params();
        Ok(Self {
            xs,
            ys,
            zs,
            us,
            vs,
            texture: params[15].clone(),
            normal_map: params[16].clone(),
            specular: parse_param(event, 17, "specular")?,
            emissive: parse_flag(&params[18])?,
        })
    }

    /// Builds the `DRAW` event for this command. Fails when a name contains
    /// the parameter delimiter.
    pub fn to_event(&self) -> Result<Event, Failure> {
        let coords = [self.xs, self.ys, self.zs, self.us, self.vs];
        let mut params: Vec<String> = coords
            .iter()
            .flat_map(|axis| axis.iter().map(i32::to_string))
            .collect();
        params.push(self.texture.clone());
        params.push(self.normal_map.clone());
        params.push(self.specular.to_string());
        params.push(self.emissive.to_string());
        if params.iter().any(|p| p.contains(' ')) {
            return Err(Failure::command("draw parameters cannot contain spaces"));
        }
        Event::new(EventKind::Draw, params).map_err(Failure::command)
    }
}

fn parse_flag(raw: &str) -> Result<bool, Failure> {
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Ok(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Ok(false)
    } else {
        Err(Failure::command(format!("emissive flag `{raw}` is not a boolean")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FailureKind;

    fn sample() -> DrawCommand {
        DrawCommand {
            xs: [0, 20, 0],
            ys: [0, 0, 20],
            zs: [0, 0, 0],
            us: [0, 100, -1],
            vs: [5, 5, 250],
            texture: "brick".into(),
            normal_map: "brick_n".into(),
            specular: 8,
            emissive: false,
        }
    }

    #[test]
    fn draw_parameters_follow_axis_major_order() {
        let event = sample().to_event().unwrap();
        assert_eq!(event.params()[..3], ["0", "20", "0"]);
        assert_eq!(event.params()[9..12], ["0", "100", "-1"]);
        assert_eq!(event.params()[15], "brick");
        assert_eq!(DrawCommand::parse(&event).unwrap(), sample());
    }

    #[test]
    fn emissive_flag_accepts_words_and_digits() {
        for (raw, expected) in [("TRUE", true), ("1", true), ("False", false), ("0", false)] {
            assert_eq!(parse_flag(raw).unwrap(), expected);
        }
        assert_eq!(parse_flag("yes").unwrap_err().kind, FailureKind::Command);
    }

    #[test]
    fn clear_raster_rejects_non_numeric_and_out_of_range_channels() {
        let bad = Event::new(EventKind::ClearRaster, ["0", "abc", "255"]).unwrap();
        let err = ClearRaster::parse(&bad).unwrap_err();
        assert_eq!(err.kind, FailureKind::Command);
        assert!(err.detail.contains("green"), "{}", err.detail);

        let wide = Event::new(EventKind::ClearRaster, ["0", "256", "255"]).unwrap();
        assert!(ClearRaster::parse(&wide).is_err());

        let ok = ClearRaster::parse(&Event::clear_raster(0, 127, 255)).unwrap();
        assert_eq!(ok, ClearRaster(Rgb::new(0, 127, 255)));
    }

    #[test]
    fn clear_depth_round_trips_negative_values() {
        let parsed = ClearDepth::parse(&Event::clear_depth(-1000)).unwrap();
        assert_eq!(parsed, ClearDepth(-1000));
        assert_eq!(parsed.to_event(), Event::clear_depth(-1000));
        assert!(ClearDepth::parse(&Event::none()).is_err());
    }
}
